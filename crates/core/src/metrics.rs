//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Pipeline starts
//! - Stage dispatches (by stage and result)
//! - Stage deferrals while waiting on the task service

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

/// Slate pipelines started.
pub static SLATES_STARTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "slateforge_slates_started_total",
        "Total slate pipelines started",
    )
    .unwrap()
});

/// Stage dispatch attempts by stage and result.
pub static STAGE_DISPATCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "slateforge_stage_dispatches_total",
            "Total stage dispatch attempts",
        ),
        &["stage", "result"], // "ok", "error"
    )
    .unwrap()
});

/// Stage dispatch duration in seconds (submission round trip only).
pub static STAGE_DISPATCH_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "slateforge_stage_dispatch_duration_seconds",
            "Duration of stage task submissions",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["stage"],
    )
    .unwrap()
});

/// Due stages deferred because the previous task still reported running.
pub static STAGE_DEFERRALS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "slateforge_stage_deferrals_total",
        "Due stages deferred waiting on the previous task",
    )
    .unwrap()
});

/// All core metrics as boxed collectors, for registration in the server's
/// registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(SLATES_STARTED.clone()),
        Box::new(STAGE_DISPATCHES.clone()),
        Box::new(STAGE_DISPATCH_DURATION.clone()),
        Box::new(STAGE_DEFERRALS.clone()),
    ]
}
