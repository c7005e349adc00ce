//! Client for the campaign analytics provider.
//!
//! [`AnalyticsClient`] implements the collaborator traits of the `analytics` crate
//! against the provider's REST API.

mod client;
pub mod config;
pub mod metrics_defs;

#[cfg(test)]
mod testutils;

pub use client::{AnalyticsClient, UpstreamError};
