//! Metrics collection for `cybersim`.
//!
//! Prometheus-compatible counters and histograms for session activity, with
//! label values restricted to the known simulation names.

use std::sync::atomic::{AtomicBool, Ordering};

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::deck::SimulationKind;
use crate::error::CybersimError;

static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Sanitizes a simulation name for use as a metrics label.
///
/// Returns the name when it is one of the six simulations, or
/// `"__unknown__"` otherwise.
#[must_use]
pub fn sanitize_simulation_label(name: &str) -> &'static str {
    SimulationKind::from_name(name).map_or("__unknown__", SimulationKind::as_str)
}

/// Initializes the global metrics recorder.
///
/// When `port` is `Some`, a Prometheus HTTP listener is started on
/// `127.0.0.1:<port>`. When `None`, the recorder is installed without an
/// HTTP endpoint.
///
/// # Errors
///
/// Returns `CybersimError::Io` if the recorder or HTTP listener cannot be
/// installed (e.g. port already in use).
pub fn init_metrics(port: Option<u16>) -> Result<(), CybersimError> {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        tracing::debug!("metrics already initialized, skipping");
        return Ok(());
    }
    port.map_or_else(
        || PrometheusBuilder::new().install_recorder().map(|_| ()),
        |p| {
            PrometheusBuilder::new()
                .with_http_listener(([127, 0, 0, 1], p))
                .install()
        },
    )
    .map_err(|e| CybersimError::Io(std::io::Error::other(e.to_string())))?;

    describe_metrics();
    Ok(())
}

fn describe_metrics() {
    describe_counter!(
        "cybersim_sessions_started_total",
        "Total number of simulation sessions started"
    );
    describe_counter!(
        "cybersim_answers_total",
        "Total number of recorded answers by correctness"
    );
    describe_counter!(
        "cybersim_outcomes_total",
        "Total number of finished sessions by pass/fail"
    );
    describe_counter!(
        "cybersim_persist_failures_total",
        "Outcomes the backend did not accept"
    );
    describe_histogram!("cybersim_score", "Final session score in percent");
}

/// Records a started session.
pub fn record_session_started(simulation: SimulationKind) {
    counter!("cybersim_sessions_started_total", "simulation" => simulation.as_str()).increment(1);
}

/// Records an answer.
pub fn record_answer(simulation: SimulationKind, correct: bool) {
    counter!(
        "cybersim_answers_total",
        "simulation" => simulation.as_str(),
        "correct" => if correct { "true" } else { "false" },
    )
    .increment(1);
}

/// Records a finished session and its score.
pub fn record_outcome(simulation: SimulationKind, score_percent: u8, passed: bool) {
    counter!(
        "cybersim_outcomes_total",
        "simulation" => simulation.as_str(),
        "passed" => if passed { "true" } else { "false" },
    )
    .increment(1);
    histogram!("cybersim_score", "simulation" => simulation.as_str())
        .record(f64::from(score_percent));
}

/// Records an outcome the backend did not accept.
pub fn record_persist_failure(simulation: SimulationKind) {
    counter!("cybersim_persist_failures_total", "simulation" => simulation.as_str()).increment(1);
}
