const BASE_DELAY: u64 = 500;

const ANALYTICS_PATH: &str = "api/v2/campaigns/analytics";
const CAMPAIGNS_PATH: &str = "api/v2/campaigns";

use crate::config::Config;
use crate::metrics_defs::{UPSTREAM_FAILURES, UPSTREAM_REQUEST_DURATION, UPSTREAM_RETRIES};
use analytics::AnalyticsError;
use analytics::source::{AnalyticsFilter, AnalyticsSource, CampaignDetailLookup};
use analytics::types::{CampaignDetail, RawCampaignRecord};
use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode, Url};
use shared::{counter, histogram};
use std::time::Instant;
use tokio::time::{Duration, sleep};

#[derive(thiserror::Error, Debug)]
pub enum UpstreamError {
    #[error("HTTP client error: {0}")]
    ReqwestError(#[from] reqwest::Error),
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("provider returned status {0}")]
    BadStatus(StatusCode),
    #[error("request cannot be cloned for retries")]
    NotRetriable,
    #[error("provider unavailable after {0} attempts")]
    RetriesExceeded(u32),
}

impl From<UpstreamError> for AnalyticsError {
    fn from(e: UpstreamError) -> Self {
        AnalyticsError::Unavailable(e.to_string())
    }
}

/// HTTP client for the analytics provider
#[derive(Clone)]
pub struct AnalyticsClient {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
    max_retries: u32,
}

impl AnalyticsClient {
    pub fn new(config: &Config) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(AnalyticsClient {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            max_retries: config.max_retries,
        })
    }

    /// Fetches campaign analytics, optionally narrowed to one campaign and a date window.
    pub async fn request_analytics(
        &self,
        filter: &AnalyticsFilter,
    ) -> Result<Vec<RawCampaignRecord>, UpstreamError> {
        let url = self
            .base_url
            .join(ANALYTICS_PATH)
            .map_err(|e| UpstreamError::InvalidUrl(e.to_string()))?;

        let request = self.client.get(url).query(filter);
        let response = self.send("analytics", request).await?;
        if !response.status().is_success() {
            counter!(UPSTREAM_FAILURES, "endpoint" => "analytics").increment(1);
            return Err(UpstreamError::BadStatus(response.status()));
        }

        let records = response.json::<Vec<RawCampaignRecord>>().await?;
        tracing::debug!(
            campaign_id = ?filter.id,
            start_date = ?filter.start_date,
            end_date = ?filter.end_date,
            records = records.len(),
            "Fetched campaign analytics"
        );

        Ok(records)
    }

    /// Fetches a campaign's status and mailbox list. `None` when the provider
    /// does not know the campaign.
    pub async fn request_campaign_detail(
        &self,
        campaign_id: &str,
    ) -> Result<Option<CampaignDetail>, UpstreamError> {
        let mut url = self
            .base_url
            .join(CAMPAIGNS_PATH)
            .map_err(|e| UpstreamError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| UpstreamError::InvalidUrl(self.base_url.to_string()))?
            .push(campaign_id);

        let response = self.send("campaign", self.client.get(url)).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json::<CampaignDetail>().await?)),
            status => {
                counter!(UPSTREAM_FAILURES, "endpoint" => "campaign").increment(1);
                Err(UpstreamError::BadStatus(status))
            }
        }
    }

    // Retries retriable statuses with exponential backoff. Any other response,
    // successful or not, is returned to the caller to interpret.
    async fn send(
        &self,
        endpoint: &'static str,
        request: RequestBuilder,
    ) -> Result<reqwest::Response, UpstreamError> {
        const RETRIABLE_STATUS_CODES: &[StatusCode] = &[
            StatusCode::TOO_MANY_REQUESTS,     // 429
            StatusCode::INTERNAL_SERVER_ERROR, // 500
            StatusCode::BAD_GATEWAY,           // 502
            StatusCode::SERVICE_UNAVAILABLE,   // 503
            StatusCode::GATEWAY_TIMEOUT,       // 504
        ];

        let mut retries = 0;

        loop {
            // GET requests carry no body, so the builder can always be cloned
            let Some(attempt) = request.try_clone() else {
                return Err(UpstreamError::NotRetriable);
            };

            let start = Instant::now();
            let result = attempt.bearer_auth(&self.api_key).send().await;
            histogram!(UPSTREAM_REQUEST_DURATION, "endpoint" => endpoint)
                .record(start.elapsed().as_secs_f64());

            let response = match result {
                Ok(response) => response,
                Err(e) => {
                    counter!(UPSTREAM_FAILURES, "endpoint" => endpoint).increment(1);
                    tracing::error!(endpoint, error = %e, "Provider request failed");
                    return Err(e.into());
                }
            };

            if !RETRIABLE_STATUS_CODES.contains(&response.status()) {
                return Ok(response);
            }

            if retries >= self.max_retries {
                counter!(UPSTREAM_FAILURES, "endpoint" => endpoint).increment(1);
                tracing::error!(
                    endpoint,
                    status = %response.status(),
                    attempts = retries + 1,
                    "Provider unavailable, giving up"
                );
                return Err(UpstreamError::RetriesExceeded(retries + 1));
            }

            tracing::warn!(
                endpoint,
                status = %response.status(),
                retry = retries + 1,
                "Retriable status from provider"
            );
            counter!(UPSTREAM_RETRIES).increment(1);

            // Backoff between retries
            let retry_millis = BASE_DELAY * 2_u64.pow(retries);
            sleep(Duration::from_millis(retry_millis)).await;
            retries += 1;
        }
    }
}

#[async_trait]
impl AnalyticsSource for AnalyticsClient {
    async fn fetch_analytics(
        &self,
        filter: &AnalyticsFilter,
    ) -> Result<Vec<RawCampaignRecord>, AnalyticsError> {
        Ok(self.request_analytics(filter).await?)
    }
}

#[async_trait]
impl CampaignDetailLookup for AnalyticsClient {
    async fn campaign_detail(
        &self,
        campaign_id: &str,
    ) -> Result<Option<CampaignDetail>, AnalyticsError> {
        Ok(self.request_campaign_detail(campaign_id).await?)
    }
}
