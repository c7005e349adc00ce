//! Derived percentage metrics.
//!
//! Every rate served by the dashboard goes through [`safe_ratio`]. A rate with a
//! zero denominator is defined as `0`, not as an error: a campaign that has not
//! sent anything yet has a 0% bounce rate.

use serde::{Serialize, Serializer};
use std::fmt;

/// A percentage in the range the provider's counts allow (normally 0..=100).
///
/// Displayed and serialized with exactly two decimal places, e.g. `"25.00"`.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Percentage(f64);

impl Percentage {
    pub const ZERO: Percentage = Percentage(0.0);

    /// The percentage rounded to two decimal places.
    pub fn value(self) -> f64 {
        (self.0 * 100.0).round() / 100.0
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.value())
    }
}

impl Serialize for Percentage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// `numerator / denominator * 100`, or `0` when the denominator is `0` or the
/// division does not produce a finite number.
pub fn safe_ratio(numerator: u64, denominator: u64) -> Percentage {
    if denominator == 0 {
        return Percentage::ZERO;
    }

    let ratio = numerator as f64 / denominator as f64 * 100.0;
    if ratio.is_finite() {
        Percentage(ratio)
    } else {
        Percentage::ZERO
    }
}

/// [`safe_ratio`] over counts the provider may have left out. A missing operand
/// makes the ratio undefined, which is reported as `0` like any other undefined ratio.
pub(crate) fn safe_ratio_of(numerator: Option<u64>, denominator: Option<u64>) -> Percentage {
    match (numerator, denominator) {
        (Some(n), Some(d)) => safe_ratio(n, d),
        _ => Percentage::ZERO,
    }
}
