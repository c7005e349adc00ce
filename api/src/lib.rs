//! HTTP surface of the campaign dashboard.
//!
//! Routes:
//! - `GET /api/campaigns`: lifetime summary of every campaign
//! - `GET /api/campaigns/details`: the same with campaign status and mailboxes
//! - `GET /api/campaigns/analytics?id=&start_date=&end_date=`: detail report for one campaign
//! - `POST /api/login`: issues a token, only when tokens are self-issued
//!
//! Campaign routes sit behind the configured [`auth::CredentialVerifier`].

pub mod auth;
pub mod config;
mod errors;
mod handlers;
pub mod metrics_defs;
mod state;

pub use errors::ApiError;
pub use state::AppState;

use crate::auth::{CredentialVerifier, DisabledVerifier, RemoteVerifier, SelfIssuedAuth};
use crate::config::{AuthConfig, CorsConfig, Listener};
use crate::metrics_defs::{REQUEST_DURATION, REQUESTS_INFLIGHT};
use analytics::source::{AnalyticsSource, CampaignDetailLookup};
use axum::{
    Router,
    extract::{MatchedPath, Request},
    http::{HeaderValue, Method, header},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use shared::admin_service::Readiness;
use shared::{gauge, histogram};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};

#[derive(thiserror::Error, Debug)]
pub enum ApiServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

pub struct Api {
    state: AppState,
    // Present only when tokens are self-issued
    login: Option<Arc<SelfIssuedAuth>>,
    cors: CorsConfig,
}

impl Api {
    /// Wires the analytics collaborators to the credential verifier selected by `auth`.
    pub fn new(
        auth: &AuthConfig,
        cors: CorsConfig,
        source: Arc<dyn AnalyticsSource>,
        details: Arc<dyn CampaignDetailLookup>,
    ) -> Result<Self, ApiServerError> {
        let mut login = None;
        let verifier: Arc<dyn CredentialVerifier> = match auth {
            AuthConfig::Disabled => {
                tracing::warn!("Authentication is disabled, campaign data is served to anyone");
                Arc::new(DisabledVerifier)
            }
            AuthConfig::Remote(config) => Arc::new(RemoteVerifier::new(config)?),
            AuthConfig::SelfIssued(config) => {
                let auth = Arc::new(SelfIssuedAuth::new(config));
                login = Some(auth.clone());
                auth
            }
        };

        Ok(Api {
            state: AppState {
                source,
                details,
                verifier,
            },
            login,
            cors,
        })
    }

    pub fn router(&self) -> Router {
        let mut app = Router::new()
            .route("/api/campaigns", get(handlers::list_campaigns))
            .route(
                "/api/campaigns/details",
                get(handlers::list_campaigns_with_details),
            )
            .route("/api/campaigns/analytics", get(handlers::campaign_analytics))
            .route_layer(middleware::from_fn_with_state(
                self.state.clone(),
                auth::require_identity,
            ))
            .with_state(self.state.clone());

        if let Some(login) = &self.login {
            app = app.merge(
                Router::new()
                    .route("/api/login", post(handlers::login))
                    .with_state(login.clone()),
            );
        }

        app.layer(middleware::from_fn(track_metrics))
            .layer(cors_layer(&self.cors))
    }

    /// Serves the API until `shutdown` resolves. `readiness` is set once the listener is bound.
    pub async fn serve<F>(
        self,
        listener: &Listener,
        readiness: Readiness,
        shutdown: F,
    ) -> Result<(), ApiServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        let addr = format!("{}:{}", listener.host, listener.port);

        let tcp_listener = TcpListener::bind(&addr).await?;
        tracing::info!(%addr, "Dashboard API listening");
        readiness.set_ready(true);

        axum::serve(tcp_listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        readiness.set_ready(false);
        Ok(())
    }
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origin = if config.allows_any_origin() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            config
                .allowed_origins
                .iter()
                .filter_map(|origin| HeaderValue::from_str(origin).ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

async fn track_metrics(request: Request, next: Next) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());

    let start = Instant::now();
    gauge!(REQUESTS_INFLIGHT).increment(1.0);
    let response = next.run(request).await;
    gauge!(REQUESTS_INFLIGHT).decrement(1.0);

    histogram!(
        REQUEST_DURATION,
        "route" => route,
        "status" => response.status().as_u16().to_string()
    )
    .record(start.elapsed().as_secs_f64());

    response
}
