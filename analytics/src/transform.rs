use crate::errors::AnalyticsError;
use crate::rates::safe_ratio_of;
use crate::types::{DateRange, DetailRow, RawCampaignRecord, SummaryRow};

/// Projects every record into a [`SummaryRow`], keeping order and length.
pub fn summarize(records: &[RawCampaignRecord]) -> Vec<SummaryRow> {
    records.iter().map(SummaryRow::from).collect()
}

/// Builds the detail report for one campaign.
///
/// `date_scoped` holds the campaign's records filtered to the requested window and
/// `unscoped` the same campaign's lifetime records. The first date-scoped record is
/// paired with the first unscoped record carrying the same campaign id.
///
/// Reply and bounce rates are computed over the window. The open rate is computed
/// over the lifetime counts, so it reflects the health of the sending channel rather
/// than a possibly tiny windowed sample.
pub fn build_detail_report(
    date_scoped: &[RawCampaignRecord],
    unscoped: &[RawCampaignRecord],
    date_range: DateRange,
) -> Result<DetailRow, AnalyticsError> {
    if unscoped.is_empty() {
        return Err(AnalyticsError::NotFound);
    }
    let window = date_scoped.first().ok_or(AnalyticsError::NotFound)?;

    let baseline = unscoped
        .iter()
        .find(|record| record.campaign_id == window.campaign_id)
        .ok_or_else(|| AnalyticsError::PairingMismatch {
            campaign_id: window.campaign_id.clone(),
        })?;

    let delivered = delivered(window);
    if let Some(delivered) = delivered
        && delivered < 0
    {
        tracing::warn!(
            campaign_id = %window.campaign_id,
            delivered,
            "Provider reported more bounces than emails sent"
        );
    }

    Ok(DetailRow {
        campaign_name: window.campaign_name.clone(),
        campaign_id: window.campaign_id.clone(),
        leads_count: window.leads_count,
        contacted_count: window.contacted_count,
        open_count: window.open_count,
        reply_count: window.reply_count,
        bounced_count: window.bounced_count,
        unsubscribed_count: window.unsubscribed_count,
        completed_count: window.completed_count,
        emails_sent_count: window.emails_sent_count,
        new_leads_contacted_count: window.new_leads_contacted_count,
        open_rate: safe_ratio_of(baseline.open_count, baseline.contacted_count),
        reply_rate: safe_ratio_of(window.reply_count, window.emails_sent_count),
        bounce_rate: safe_ratio_of(window.bounced_count, window.emails_sent_count),
        delivered,
        status: baseline.campaign_status.clone(),
        email_list: baseline.email_list.clone(),
        date_range,
    })
}

// Not floored at zero: a negative value is the provider's inconsistency, passed on as is.
fn delivered(record: &RawCampaignRecord) -> Option<i64> {
    let sent = i64::try_from(record.emails_sent_count?).ok()?;
    let bounced = i64::try_from(record.bounced_count?).ok()?;
    sent.checked_sub(bounced)
}
