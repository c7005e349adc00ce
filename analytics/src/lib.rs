//! Campaign analytics transformer.
//!
//! Turns raw campaign analytics records returned by the analytics provider into
//! the rows served to the dashboard:
//!
//! - [`summarize`] projects every record into a [`SummaryRow`].
//! - [`summarize_with_details`] does the same and merges in per-campaign
//!   metadata fetched through a [`CampaignDetailLookup`].
//! - [`build_detail_report`] pairs a date-scoped record with its unscoped
//!   (lifetime) counterpart and derives open, reply and bounce rates plus the
//!   delivered count.
//!
//! Everything here is a function of its arguments. Fetching, retries and
//! timeouts belong to the collaborators behind the [`source`] traits.

mod details;
pub mod errors;
pub mod rates;
pub mod source;
mod transform;
pub mod types;

pub use details::{MAX_CONCURRENT_LOOKUPS, summarize_with_details};
pub use errors::AnalyticsError;
pub use rates::{Percentage, safe_ratio};
pub use source::{AnalyticsFilter, AnalyticsSource, CampaignDetailLookup};
pub use transform::{build_detail_report, summarize};
pub use types::{
    CampaignDetail, DateRange, DetailRow, DetailedSummaryRow, RawCampaignRecord, SummaryRow,
};
