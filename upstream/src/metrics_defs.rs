//! Metrics definitions for the analytics provider client.

use shared::metrics_defs::{MetricDef, MetricType};

pub const UPSTREAM_REQUEST_DURATION: MetricDef = MetricDef {
    name: "upstream.request.duration",
    metric_type: MetricType::Histogram,
    description: "Duration of a single provider request attempt in seconds. Tagged with endpoint.",
};

pub const UPSTREAM_RETRIES: MetricDef = MetricDef {
    name: "upstream.retries",
    metric_type: MetricType::Counter,
    description: "Number of provider requests retried after a retriable status",
};

pub const UPSTREAM_FAILURES: MetricDef = MetricDef {
    name: "upstream.failures",
    metric_type: MetricType::Counter,
    description: "Number of provider requests that failed. Tagged with endpoint.",
};

pub const ALL_METRICS: &[MetricDef] = &[
    UPSTREAM_REQUEST_DURATION,
    UPSTREAM_RETRIES,
    UPSTREAM_FAILURES,
];
