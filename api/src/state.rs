use crate::auth::CredentialVerifier;
use analytics::source::{AnalyticsSource, CampaignDetailLookup};
use std::sync::Arc;

/// Collaborators shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn AnalyticsSource>,
    pub details: Arc<dyn CampaignDetailLookup>,
    pub verifier: Arc<dyn CredentialVerifier>,
}
