//! Prometheus metrics collection for doddns
//!
//! A run is short-lived, so metrics are exported by writing the text format
//! to a file picked up by the node_exporter textfile collector.

use std::path::Path;

use anyhow::{Context as _, Result};
use chrono::Utc;
use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_gauge, register_histogram_vec, CounterVec, Gauge,
    HistogramVec,
};

//==============================================================================
// Metrics
//==============================================================================

lazy_static! {
    /// Record actions issued (or planned, in dry-run mode)
    pub static ref RECORD_ACTIONS_TOTAL: CounterVec = register_counter_vec!(
        "doddns_record_actions_total",
        "Record actions by domain and kind",
        &["domain", "action"]
    )
    .unwrap();

    /// Domains that failed to reconcile
    pub static ref DOMAIN_FAILURES_TOTAL: CounterVec = register_counter_vec!(
        "doddns_domain_failures_total",
        "Domains that failed to reconcile",
        &["domain"]
    )
    .unwrap();

    /// Provider API call duration histogram
    pub static ref PROVIDER_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "doddns_provider_request_duration_seconds",
        "Provider API request duration in seconds",
        &["operation"]
    )
    .unwrap();

    /// Unix time the last run finished
    pub static ref LAST_RUN_TIMESTAMP_SECONDS: Gauge = register_gauge!(
        "doddns_last_run_timestamp_seconds",
        "Unix timestamp of the last completed run"
    )
    .unwrap();

    /// 1 if every domain of the last run reconciled, else 0
    pub static ref LAST_RUN_SUCCESS: Gauge = register_gauge!(
        "doddns_last_run_success",
        "Whether every domain of the last run reconciled"
    )
    .unwrap();
}

//==============================================================================
// Public Functions
//==============================================================================

/// Records a create/update/delete/noop for `domain`
pub fn record_action(domain: &str, action: &str) {
    RECORD_ACTIONS_TOTAL
        .with_label_values(&[domain, action])
        .inc();
}

/// Records a failed domain
pub fn record_domain_failure(domain: &str) {
    DOMAIN_FAILURES_TOTAL.with_label_values(&[domain]).inc();
}

/// Starts a timer for a provider call (e.g., "list", "create")
pub fn start_request_timer(operation: &str) -> HistogramTimer {
    PROVIDER_REQUEST_DURATION_SECONDS
        .with_label_values(&[operation])
        .start_timer()
}

/// Stamps the run completion time and outcome
pub fn set_last_run(success: bool) {
    LAST_RUN_TIMESTAMP_SECONDS.set(Utc::now().timestamp() as f64);
    LAST_RUN_SUCCESS.set(if success { 1.0 } else { 0.0 });
}

/// Collects all metrics and returns them as text
pub fn gather_metrics() -> Result<String> {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .context("Failed to encode metrics")?;
    String::from_utf8(buffer).context("Metrics are not valid UTF-8")
}

/// Writes the metrics to `path`, replacing it atomically
///
/// The collector may read the file at any moment, so the text is written to
/// a sibling temp file first and renamed over the target.
pub fn write_textfile(path: &Path) -> Result<()> {
    let text = gather_metrics()?;
    let tmp = path.with_extension("prom.tmp");
    std::fs::write(&tmp, text)
        .with_context(|| format!("Failed to write metrics: {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("Failed to move metrics into place: {}", path.display()))?;
    Ok(())
}

//==============================================================================
// Types
//==============================================================================

/// Histogram timer for measuring duration
pub type HistogramTimer = prometheus::HistogramTimer;

//==============================================================================
// Tests
//==============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_action() {
        record_action("example.org", "create");
        let counter = RECORD_ACTIONS_TOTAL
            .get_metric_with_label_values(&["example.org", "create"])
            .unwrap();
        assert!(counter.get() >= 1.0);
    }

    #[test]
    fn test_record_domain_failure() {
        record_domain_failure("example.com");
        assert!(DOMAIN_FAILURES_TOTAL
            .get_metric_with_label_values(&["example.com"])
            .is_ok());
    }

    #[test]
    fn test_set_last_run() {
        set_last_run(false);
        assert_eq!(LAST_RUN_SUCCESS.get(), 0.0);
        set_last_run(true);
        assert_eq!(LAST_RUN_SUCCESS.get(), 1.0);
        assert!(LAST_RUN_TIMESTAMP_SECONDS.get() > 0.0);
    }

    #[test]
    fn test_write_textfile() {
        record_action("example.net", "update");
        let _timer = start_request_timer("list");
        set_last_run(true);

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("doddns.prom");
        write_textfile(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("doddns_record_actions_total"));
        assert!(text.contains("doddns_last_run_success"));
        assert!(!dir.path().join("doddns.prom.tmp").exists());
    }
}
