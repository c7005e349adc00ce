use crate::errors::AnalyticsError;
use crate::source::CampaignDetailLookup;
use crate::types::{CampaignDetail, DetailedSummaryRow, RawCampaignRecord, SummaryRow};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Upper bound on detail lookups in flight at once
pub const MAX_CONCURRENT_LOOKUPS: usize = 8;

/// Summarizes `records` and merges in each campaign's status and mailboxes.
///
/// One lookup per record is spawned, with at most [`MAX_CONCURRENT_LOOKUPS`] of them
/// running at a time. The rows are
/// returned in the order of `records` regardless of the order lookups resolve in.
/// A lookup resolving to `None` leaves `status` and `email_list` absent. Any failed
/// lookup fails the whole call and the outstanding lookups are cancelled.
pub async fn summarize_with_details(
    records: &[RawCampaignRecord],
    lookup: Arc<dyn CampaignDetailLookup>,
) -> Result<Vec<DetailedSummaryRow>, AnalyticsError> {
    let mut join_set = JoinSet::new();
    let permits = Arc::new(Semaphore::new(MAX_CONCURRENT_LOOKUPS));

    for (index, record) in records.iter().enumerate() {
        let lookup = lookup.clone();
        let permits = permits.clone();
        let campaign_id = record.campaign_id.clone();
        join_set.spawn(async move {
            let result = match permits.acquire_owned().await {
                Ok(_permit) => lookup.campaign_detail(&campaign_id).await,
                Err(e) => Err(AnalyticsError::Unavailable(format!(
                    "detail lookup not started: {e}"
                ))),
            };
            (index, result)
        });
    }

    let mut details: Vec<Option<CampaignDetail>> = vec![None; records.len()];

    while let Some(join_result) = join_set.join_next().await {
        let (index, result) = join_result.map_err(|e| {
            tracing::error!("Detail lookup task panicked: {}", e);
            AnalyticsError::Unavailable(format!("detail lookup task failed: {e}"))
        })?;

        match result {
            Ok(detail) => details[index] = detail,
            Err(e) => {
                tracing::error!(
                    campaign_id = %records[index].campaign_id,
                    error = %e,
                    "Campaign detail lookup failed"
                );
                return Err(e);
            }
        }
    }

    Ok(records
        .iter()
        .zip(details)
        .map(|(record, detail)| DetailedSummaryRow::new(SummaryRow::from(record), detail))
        .collect())
}
