use crate::rates::Percentage;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One campaign's analytics as returned by the provider for a single query.
///
/// Counts are optional on the wire. A count the provider leaves out stays absent
/// all the way to the dashboard instead of being reported as `0`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct RawCampaignRecord {
    pub campaign_id: String,
    pub campaign_name: Option<String>,
    /// Passed through untouched; the provider decides its representation.
    pub campaign_status: Option<Value>,
    pub email_list: Option<Vec<String>>,
    pub leads_count: Option<u64>,
    pub contacted_count: Option<u64>,
    pub open_count: Option<u64>,
    pub reply_count: Option<u64>,
    pub bounced_count: Option<u64>,
    pub unsubscribed_count: Option<u64>,
    pub completed_count: Option<u64>,
    pub emails_sent_count: Option<u64>,
    pub new_leads_contacted_count: Option<u64>,
    pub total_opportunities: Option<u64>,
    pub total_opportunity_value: Option<f64>,
}

/// Campaign metadata returned by the campaign detail lookup
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct CampaignDetail {
    pub status: Option<Value>,
    pub email_list: Option<Vec<String>>,
}

/// Dashboard row for the campaign list
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct SummaryRow {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leads: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contacted: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounced: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unsubscribed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opportunities: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opportunity_value: Option<f64>,
}

impl From<&RawCampaignRecord> for SummaryRow {
    fn from(record: &RawCampaignRecord) -> Self {
        SummaryRow {
            id: record.campaign_id.clone(),
            name: record.campaign_name.clone(),
            leads: record.leads_count,
            contacted: record.contacted_count,
            open: record.open_count,
            reply: record.reply_count,
            bounced: record.bounced_count,
            unsubscribed: record.unsubscribed_count,
            completed: record.completed_count,
            sent: record.emails_sent_count,
            opportunities: record.total_opportunities,
            opportunity_value: record.total_opportunity_value,
        }
    }
}

/// A [`SummaryRow`] with the campaign's status and sending mailboxes merged in
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct DetailedSummaryRow {
    #[serde(flatten)]
    pub summary: SummaryRow,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_list: Option<Vec<String>>,
}

impl DetailedSummaryRow {
    pub fn new(summary: SummaryRow, detail: Option<CampaignDetail>) -> Self {
        let (status, email_list) = match detail {
            Some(detail) => (detail.status, detail.email_list),
            None => (None, None),
        };

        DetailedSummaryRow {
            summary,
            status,
            email_list,
        }
    }
}

/// The date window a detail report was requested for, echoed back verbatim
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct DateRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

/// Detailed report for a single campaign over a date window.
///
/// Raw counts come from the date-scoped record. Status and mailboxes, as well as the
/// open rate, come from the unscoped (lifetime) record.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct DetailRow {
    #[serde(rename = "Campaign Name", skip_serializing_if = "Option::is_none")]
    pub campaign_name: Option<String>,
    #[serde(rename = "Campaign ID")]
    pub campaign_id: String,
    #[serde(rename = "Leads Count", skip_serializing_if = "Option::is_none")]
    pub leads_count: Option<u64>,
    #[serde(rename = "Contacted Count", skip_serializing_if = "Option::is_none")]
    pub contacted_count: Option<u64>,
    #[serde(rename = "Open Count", skip_serializing_if = "Option::is_none")]
    pub open_count: Option<u64>,
    #[serde(rename = "Reply Count", skip_serializing_if = "Option::is_none")]
    pub reply_count: Option<u64>,
    #[serde(rename = "Bounced Count", skip_serializing_if = "Option::is_none")]
    pub bounced_count: Option<u64>,
    #[serde(rename = "Unsubscribed Count", skip_serializing_if = "Option::is_none")]
    pub unsubscribed_count: Option<u64>,
    #[serde(rename = "Completed Count", skip_serializing_if = "Option::is_none")]
    pub completed_count: Option<u64>,
    #[serde(rename = "Emails Sent Count", skip_serializing_if = "Option::is_none")]
    pub emails_sent_count: Option<u64>,
    #[serde(
        rename = "New Leads Contacted Count",
        skip_serializing_if = "Option::is_none"
    )]
    pub new_leads_contacted_count: Option<u64>,
    #[serde(rename = "Open Rate (%)")]
    pub open_rate: Percentage,
    #[serde(rename = "Reply Rate (%)")]
    pub reply_rate: Percentage,
    #[serde(rename = "Bounce Rate (%)")]
    pub bounce_rate: Percentage,
    /// Sent minus bounced. Negative when the provider's counts disagree.
    #[serde(rename = "Delivered", skip_serializing_if = "Option::is_none")]
    pub delivered: Option<i64>,
    #[serde(rename = "Status", skip_serializing_if = "Option::is_none")]
    pub status: Option<Value>,
    #[serde(rename = "Email List", skip_serializing_if = "Option::is_none")]
    pub email_list: Option<Vec<String>>,
    #[serde(rename = "Date Range")]
    pub date_range: DateRange,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_partial_record() {
        let record: RawCampaignRecord = serde_json::from_value(json!({
            "campaign_id": "c1",
            "campaign_name": "Spring outreach",
            "leads_count": 10,
            "emails_sent_count": 25,
            "some_new_field": "ignored"
        }))
        .unwrap();

        assert_eq!(record.campaign_id, "c1");
        assert_eq!(record.leads_count, Some(10));
        assert_eq!(record.emails_sent_count, Some(25));
        assert_eq!(record.open_count, None);
        assert_eq!(record.campaign_status, None);
    }

    #[test]
    fn test_summary_row_omits_absent_counts() {
        let record = RawCampaignRecord {
            campaign_id: "c1".into(),
            leads_count: Some(3),
            ..Default::default()
        };

        let json = serde_json::to_value(SummaryRow::from(&record)).unwrap();
        assert_eq!(json, json!({"id": "c1", "leads": 3}));
    }

    #[test]
    fn test_detailed_summary_row_flattens() {
        let record = RawCampaignRecord {
            campaign_id: "c1".into(),
            campaign_name: Some("Launch".into()),
            ..Default::default()
        };
        let detail = CampaignDetail {
            status: Some(json!(1)),
            email_list: Some(vec!["sales@example.com".into()]),
        };

        let row = DetailedSummaryRow::new(SummaryRow::from(&record), Some(detail));
        let json = serde_json::to_value(row).unwrap();
        assert_eq!(
            json,
            json!({
                "id": "c1",
                "name": "Launch",
                "status": 1,
                "email_list": ["sales@example.com"]
            })
        );

        let row = DetailedSummaryRow::new(SummaryRow::from(&record), None);
        let json = serde_json::to_value(row).unwrap();
        assert!(json.get("status").is_none());
        assert!(json.get("email_list").is_none());
    }
}
