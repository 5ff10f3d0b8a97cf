//! Metrics definitions for the grouping configuration registry.

use shared::metrics_defs::{MetricDef, MetricType};

pub const CONFIG_REGISTERED: MetricDef = MetricDef {
    name: "grouping.config.registered",
    metric_type: MetricType::Counter,
    description: "Number of grouping configurations registered",
};

pub const CONFIG_RESOLVE_HIT: MetricDef = MetricDef {
    name: "grouping.config.resolve.hit",
    metric_type: MetricType::Counter,
    description: "Number of lookups that found a grouping configuration",
};

pub const CONFIG_RESOLVE_MISS: MetricDef = MetricDef {
    name: "grouping.config.resolve.miss",
    metric_type: MetricType::Counter,
    description: "Number of lookups for an unknown grouping configuration",
};

pub const REGISTRY_SIZE: MetricDef = MetricDef {
    name: "grouping.registry.size",
    metric_type: MetricType::Gauge,
    description: "Number of configurations in the most recently frozen registry",
};

pub const ALL_METRICS: &[MetricDef] = &[
    CONFIG_REGISTERED,
    CONFIG_RESOLVE_HIT,
    CONFIG_RESOLVE_MISS,
    REGISTRY_SIZE,
];
