use shared::metrics_defs::{MetricDef, MetricType};

pub const UPSERT_DURATION: MetricDef = MetricDef {
    name: "causes.upsert.duration",
    metric_type: MetricType::Histogram,
    description: "Upsert duration in seconds. Tagged with outcome.",
};

pub const UPSERT_OUTCOME: MetricDef = MetricDef {
    name: "causes.upsert.outcome",
    metric_type: MetricType::Counter,
    description: "Number of upserts. Tagged with outcome: inserted, updated, invalid_input, not_found, unexpected_fault.",
};

pub const REQUESTS_INFLIGHT: MetricDef = MetricDef {
    name: "causes.requests.inflight",
    metric_type: MetricType::Gauge,
    description: "Number of requests currently being processed",
};

pub const ALL_METRICS: &[MetricDef] = &[UPSERT_DURATION, UPSERT_OUTCOME, REQUESTS_INFLIGHT];
