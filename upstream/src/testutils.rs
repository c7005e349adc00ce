use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use url::Url;

const API_KEY: &str = "test-key";

#[derive(Default)]
struct ProviderState {
    analytics_hits: AtomicUsize,
    failures_left: AtomicUsize,
    last_query: Mutex<Option<String>>,
}

/// In-process stand-in for the analytics provider, bound to an ephemeral port
pub struct TestProviderServer {
    url: Url,
    state: Arc<ProviderState>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestProviderServer {
    pub async fn spawn() -> Self {
        let state = Arc::new(ProviderState::default());
        let app = Router::new()
            .route("/api/v2/campaigns/analytics", get(analytics))
            .route("/api/v2/campaigns/{id}", get(campaign))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to address");
        let port = listener.local_addr().unwrap().port();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        TestProviderServer {
            url: Url::parse(&format!("http://127.0.0.1:{port}/")).unwrap(),
            state,
            handle,
        }
    }

    pub fn url(&self) -> Url {
        self.url.clone()
    }

    /// Makes the next `count` analytics requests fail with a 503
    pub fn fail_next(&self, count: usize) {
        self.state.failures_left.store(count, Ordering::SeqCst);
    }

    pub fn analytics_hits(&self) -> usize {
        self.state.analytics_hits.load(Ordering::SeqCst)
    }

    pub fn last_query(&self) -> Option<String> {
        self.state.last_query.lock().unwrap().clone()
    }
}

impl Drop for TestProviderServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .is_some_and(|h| h == format!("Bearer {API_KEY}"))
}

async fn analytics(
    State(state): State<Arc<ProviderState>>,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    state.analytics_hits.fetch_add(1, Ordering::SeqCst);
    *state.last_query.lock().unwrap() = Some(uri.query().unwrap_or("").to_string());

    if state
        .failures_left
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
    {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }

    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let records = json!([
        {
            "campaign_id": "c1",
            "campaign_name": "Spring outreach",
            "leads_count": 120,
            "contacted_count": 80,
            "open_count": 40,
            "reply_count": 6,
            "bounced_count": 4,
            "unsubscribed_count": 1,
            "completed_count": 10,
            "emails_sent_count": 100,
            "new_leads_contacted_count": 20,
            "total_opportunities": 2,
            "total_opportunity_value": 5000.0
        },
        {
            "campaign_id": "c2",
            "campaign_name": "Renewals",
            "leads_count": 10
        }
    ]);

    let records = match uri.query().filter(|q| q.contains("id=c1")) {
        Some(_) => json!([records[0].clone()]),
        None => records,
    };

    Json(records).into_response()
}

async fn campaign(headers: HeaderMap, Path(id): Path<String>) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    match id.as_str() {
        "c1" => Json(json!({
            "id": "c1",
            "name": "Spring outreach",
            "status": 1,
            "email_list": ["sales@example.com"]
        }))
        .into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}
