use crate::auth::{Identity, IssuedToken, SelfIssuedAuth};
use crate::errors::ApiError;
use crate::state::AppState;
use analytics::source::AnalyticsFilter;
use analytics::types::{DateRange, DetailRow, DetailedSummaryRow, SummaryRow};
use analytics::{build_detail_report, summarize, summarize_with_details};
use axum::{
    Extension, Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize, Debug)]
pub struct AnalyticsParams {
    id: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}

/// Lifetime analytics of every campaign
pub async fn list_campaigns(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<SummaryRow>>, ApiError> {
    let records = state.source.fetch_analytics(&AnalyticsFilter::all()).await?;
    let rows = summarize(&records);

    tracing::debug!(
        subject = %identity.subject,
        campaigns = rows.len(),
        "Serving campaign summaries"
    );
    Ok(Json(rows))
}

/// Lifetime analytics of every campaign with status and mailboxes merged in
pub async fn list_campaigns_with_details(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<DetailedSummaryRow>>, ApiError> {
    let records = state.source.fetch_analytics(&AnalyticsFilter::all()).await?;
    let rows = summarize_with_details(&records, state.details.clone()).await?;

    tracing::debug!(
        subject = %identity.subject,
        campaigns = rows.len(),
        "Serving detailed campaign summaries"
    );
    Ok(Json(rows))
}

/// Detail report for one campaign over a date window
pub async fn campaign_analytics(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    params: Result<Query<AnalyticsParams>, QueryRejection>,
) -> Result<Json<DetailRow>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let Some(id) = params.id.filter(|id| !id.is_empty()) else {
        return Err(ApiError::BadRequest("missing campaign id".into()));
    };

    tracing::info!(
        subject = %identity.subject,
        campaign_id = %id,
        start_date = ?params.start_date,
        end_date = ?params.end_date,
        "Fetching campaign analytics"
    );

    let date_scoped = AnalyticsFilter::campaign(&id)
        .with_dates(params.start_date.clone(), params.end_date.clone());
    let unscoped = AnalyticsFilter::campaign(&id);

    let (date_scoped, unscoped) = tokio::try_join!(
        state.source.fetch_analytics(&date_scoped),
        state.source.fetch_analytics(&unscoped),
    )?;

    let report = build_detail_report(
        &date_scoped,
        &unscoped,
        DateRange {
            start: params.start_date,
            end: params.end_date,
        },
    )?;

    Ok(Json(report))
}

pub async fn login(
    State(auth): State<Arc<SelfIssuedAuth>>,
    request: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<IssuedToken>, ApiError> {
    let Json(request) = request.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    match auth.login(&request.email, &request.password) {
        Ok(token) => {
            tracing::info!(email = %request.email, "User logged in");
            Ok(Json(token))
        }
        Err(e) => {
            tracing::info!(email = %request.email, error = %e, "Login rejected");
            Err(e.into())
        }
    }
}
