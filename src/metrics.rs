// Metrics and observability module
// Prometheus counters and histograms for swaps and executor dispatch, plus
// the text exposition used by the node API
//
// Numan Thabit 2025 Nov

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};

pub static SWAPS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "router_swaps_total",
        "top-level swaps by graph shape and outcome",
        &["variant", "outcome"]
    )
    .expect("register router_swaps_total")
});

pub static DISPATCH_LATENCY: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "router_dispatch_latency_seconds",
        "time spent inside executor modules",
        &["kind"]
    )
    .expect("register router_dispatch_latency_seconds")
});

pub static DISPATCH_ERRORS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "router_dispatch_errors_total",
        "failed executor swaps and callbacks",
        &["kind"]
    )
    .expect("register router_dispatch_errors_total")
});

/// Render every registered metric in the Prometheus text format.
pub fn render() -> anyhow::Result<String> {
    let mut buf = Vec::new();
    TextEncoder::new().encode(&prometheus::gather(), &mut buf)?;
    Ok(String::from_utf8(buf)?)
}
