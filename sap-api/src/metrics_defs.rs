use shared::metrics_defs::{MetricDef, MetricType};

pub const MESSAGES_PROCESSED: MetricDef = MetricDef {
    name: "messages.processed",
    metric_type: MetricType::Counter,
    description: "Inbound messages handled. Tagged with outcome (success, failure).",
};

pub const BRANCH_FAILURES: MetricDef = MetricDef {
    name: "branch.failures",
    metric_type: MetricType::Counter,
    description: "Accepter branches that stopped on an error. Tagged with accepter.",
};

pub const RECORDS_PUBLISHED: MetricDef = MetricDef {
    name: "records.published",
    metric_type: MetricType::Counter,
    description: "Records published to the outbound queue. Tagged with function.",
};

pub const SAP_REQUEST_DURATION: MetricDef = MetricDef {
    name: "sap.request.duration",
    metric_type: MetricType::Histogram,
    description: "SAP OData request duration in seconds. Tagged with entity.",
};

pub const ALL_METRICS: &[MetricDef] = &[
    MESSAGES_PROCESSED,
    BRANCH_FAILURES,
    RECORDS_PUBLISHED,
    SAP_REQUEST_DURATION,
];
