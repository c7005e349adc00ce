use crate::http::make_boxed_error_response;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::service::Service;
use hyper::{Method, Request, Response, StatusCode};
use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Readiness flag shared between the service doing the work and the admin listener.
/// Starts out not ready.
#[derive(Clone, Debug, Default)]
pub struct Readiness(Arc<AtomicBool>);

impl Readiness {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_ready(&self, ready: bool) {
        self.0.store(ready, Ordering::Relaxed);
    }

    pub fn is_ready(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Liveness and readiness probes.
///
/// `/health` answers as long as the process serves requests. `/ready` answers with a
/// 503 until the readiness flag is set.
pub struct AdminService {
    readiness: Readiness,
}

impl AdminService {
    pub fn new(readiness: Readiness) -> Self {
        Self { readiness }
    }
}

impl Service<Request<Incoming>> for AdminService {
    type Response = Response<BoxBody<Bytes, Infallible>>;
    type Error = Infallible;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let res = respond(req.method(), req.uri().path(), self.readiness.is_ready());
        Box::pin(async move { Ok(res) })
    }
}

fn respond(method: &Method, path: &str, is_ready: bool) -> Response<BoxBody<Bytes, Infallible>> {
    let ok_body = || Full::new(Bytes::from("ok\n")).boxed();

    if method != Method::GET {
        return make_boxed_error_response(StatusCode::METHOD_NOT_ALLOWED);
    }

    match path {
        "/health" => Response::new(ok_body()),
        "/ready" => match is_ready {
            true => Response::new(ok_body()),
            false => make_boxed_error_response(StatusCode::SERVICE_UNAVAILABLE),
        },
        _ => make_boxed_error_response(StatusCode::NOT_FOUND),
    }
}
