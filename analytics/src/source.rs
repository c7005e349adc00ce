//! Collaborators the transformer is fed by.
//!
//! The analytics provider client implements these traits. Tests implement them
//! with in-memory fakes.

use crate::errors::AnalyticsError;
use crate::types::{CampaignDetail, RawCampaignRecord};
use async_trait::async_trait;
use serde::Serialize;

/// Query parameters for an analytics fetch. Unset fields are not sent.
#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct AnalyticsFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

impl AnalyticsFilter {
    /// Lifetime analytics for every campaign
    pub fn all() -> Self {
        AnalyticsFilter::default()
    }

    /// Lifetime analytics for one campaign
    pub fn campaign<I: Into<String>>(id: I) -> Self {
        AnalyticsFilter {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn with_dates(mut self, start_date: Option<String>, end_date: Option<String>) -> Self {
        self.start_date = start_date;
        self.end_date = end_date;
        self
    }
}

#[async_trait]
pub trait AnalyticsSource: Send + Sync {
    /// Fetches the ordered list of campaign analytics records matching `filter`.
    async fn fetch_analytics(
        &self,
        filter: &AnalyticsFilter,
    ) -> Result<Vec<RawCampaignRecord>, AnalyticsError>;
}

#[async_trait]
pub trait CampaignDetailLookup: Send + Sync {
    /// Fetches status and mailbox metadata for a campaign.
    /// Returns `Ok(None)` when the provider does not know the campaign.
    async fn campaign_detail(
        &self,
        campaign_id: &str,
    ) -> Result<Option<CampaignDetail>, AnalyticsError>;
}
