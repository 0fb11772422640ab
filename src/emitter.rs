//! Result emitter.
//!
//! Takes the outcome out of a finished session exactly once and hands it to a
//! [`ResultSink`] for persistence. A sink failure is reported as a warning on
//! the returned [`EmitReport`]; the locally computed outcome stays valid and
//! nothing is retried.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::deck::SimulationKind;
use crate::error::{ApiError, SessionError};
use crate::observability::metrics;
use crate::observability::{Event, EventEmitter};
use crate::session::{AnswerMap, Session, SimulationOutcome};

// ============================================================================
// Sink
// ============================================================================

/// Attempt payload accepted by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultSubmission {
    /// Trainee the attempt belongs to.
    pub user_id: String,
    /// Simulation that was played.
    pub simulation_type: SimulationKind,
    /// Final score.
    pub score: u8,
    /// Whether the score reached the threshold.
    pub passed: bool,
    /// Wall-clock time spent in the session.
    pub duration_seconds: u64,
    /// Full answer trace keyed by scenario id.
    pub answers: AnswerMap,
}

impl ResultSubmission {
    /// Builds the payload for `outcome`.
    #[must_use]
    pub fn from_outcome(user_id: &str, outcome: &SimulationOutcome, duration: Duration) -> Self {
        Self {
            user_id: user_id.to_owned(),
            simulation_type: outcome.simulation,
            score: outcome.score_percent,
            passed: outcome.passed,
            duration_seconds: duration.as_secs(),
            answers: outcome.trace.clone(),
        }
    }
}

/// Persistence collaborator for finished outcomes.
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Persists one attempt.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] when the attempt could not be stored.
    async fn submit_result(&self, submission: &ResultSubmission) -> Result<(), ApiError>;
}

/// Sink that keeps submissions in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    submissions: Mutex<Vec<ResultSubmission>>,
}

impl MemorySink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Submissions received so far.
    #[must_use]
    pub fn submissions(&self) -> Vec<ResultSubmission> {
        self.submissions
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ResultSink for MemorySink {
    async fn submit_result(&self, submission: &ResultSubmission) -> Result<(), ApiError> {
        self.submissions
            .lock()
            .map_err(|e| ApiError::Transient(e.to_string()))?
            .push(submission.clone());
        Ok(())
    }
}

/// Sink for offline runs; there is nowhere to persist to.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

#[async_trait]
impl ResultSink for NullSink {
    async fn submit_result(&self, _submission: &ResultSubmission) -> Result<(), ApiError> {
        Err(ApiError::NotConfigured)
    }
}

// ============================================================================
// Emitter
// ============================================================================

/// What happened to one emitted outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitReport {
    /// The session's outcome, valid whether or not it was persisted.
    pub outcome: SimulationOutcome,
    /// Whether the sink accepted it.
    pub persisted: bool,
    /// Non-fatal message for the user when persistence failed.
    pub warning: Option<String>,
}

/// Hands finished outcomes to a [`ResultSink`].
pub struct ResultEmitter {
    sink: Arc<dyn ResultSink>,
    user_id: String,
    events: Option<Arc<EventEmitter>>,
}

impl std::fmt::Debug for ResultEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultEmitter")
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

impl ResultEmitter {
    /// Creates an emitter persisting on behalf of `user_id`.
    #[must_use]
    pub fn new(sink: Arc<dyn ResultSink>, user_id: impl Into<String>) -> Self {
        Self {
            sink,
            user_id: user_id.into(),
            events: None,
        }
    }

    /// Also reports persistence results on the event stream.
    #[must_use]
    pub fn with_events(mut self, events: Arc<EventEmitter>) -> Self {
        self.events = Some(events);
        self
    }

    /// Takes the outcome from `session` and submits it once.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::WrongPhase` if the session is not finished and
    /// `SessionError::OutcomeAlreadyTaken` if it was already emitted. Sink
    /// failures are not errors; they surface as [`EmitReport::warning`].
    pub async fn emit(
        &self,
        session: &mut Session,
        duration: Duration,
    ) -> Result<EmitReport, SessionError> {
        let outcome = session.take_outcome()?;
        let submission = ResultSubmission::from_outcome(&self.user_id, &outcome, duration);

        match self.sink.submit_result(&submission).await {
            Ok(()) => {
                info!(
                    simulation = %outcome.simulation,
                    score = outcome.score_percent,
                    "result persisted"
                );
                self.event(Event::ResultPersisted {
                    timestamp: Utc::now(),
                    simulation: outcome.simulation,
                });
                Ok(EmitReport {
                    outcome,
                    persisted: true,
                    warning: None,
                })
            }
            Err(e) => {
                warn!(
                    simulation = %outcome.simulation,
                    error = %e,
                    transient = e.is_transient(),
                    "result not persisted"
                );
                metrics::record_persist_failure(outcome.simulation);
                self.event(Event::ResultPersistFailed {
                    timestamp: Utc::now(),
                    simulation: outcome.simulation,
                    error: e.to_string(),
                });
                Ok(EmitReport {
                    outcome,
                    persisted: false,
                    warning: Some(format!("score not saved: {e}")),
                })
            }
        }
    }

    fn event(&self, event: Event) {
        if let Some(events) = &self.events {
            events.emit(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::{AnswerValue, load_builtin};

    fn finished_phishing() -> Session {
        let mut session = Session::new(load_builtin(SimulationKind::Phishing).unwrap());
        session.start().unwrap();
        for answer in [true, false, true] {
            session.submit_answer(AnswerValue::Binary(answer)).unwrap();
            session.advance().unwrap();
        }
        session
    }

    #[tokio::test]
    async fn emits_once_to_sink() {
        let sink = Arc::new(MemorySink::new());
        let emitter = ResultEmitter::new(sink.clone(), "u-1");
        let mut session = finished_phishing();

        let report = emitter
            .emit(&mut session, Duration::from_secs(42))
            .await
            .unwrap();
        assert!(report.persisted);
        assert_eq!(report.outcome.score_percent, 100);

        let submissions = sink.submissions();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].user_id, "u-1");
        assert_eq!(submissions[0].duration_seconds, 42);
        assert_eq!(submissions[0].answers.len(), 3);

        let again = emitter.emit(&mut session, Duration::ZERO).await;
        assert_eq!(again.unwrap_err(), SessionError::OutcomeAlreadyTaken);
        assert_eq!(sink.submissions().len(), 1);
    }

    #[tokio::test]
    async fn refuses_unfinished_session() {
        let sink = Arc::new(MemorySink::new());
        let emitter = ResultEmitter::new(sink.clone(), "u-1");
        let mut session = Session::new(load_builtin(SimulationKind::Phishing).unwrap());
        session.start().unwrap();

        let err = emitter.emit(&mut session, Duration::ZERO).await.unwrap_err();
        assert!(matches!(err, SessionError::WrongPhase { .. }));
        assert!(sink.submissions().is_empty());
    }

    #[tokio::test]
    async fn sink_failure_is_a_warning() {
        let emitter = ResultEmitter::new(Arc::new(NullSink), "u-1");
        let mut session = finished_phishing();

        let report = emitter.emit(&mut session, Duration::ZERO).await.unwrap();
        assert!(!report.persisted);
        assert!(report.warning.unwrap().contains("not configured"));
        assert!(report.outcome.passed);
    }

    #[test]
    fn submission_serializes_backend_fields() {
        let mut session = finished_phishing();
        let outcome = session.take_outcome().unwrap();
        let submission = ResultSubmission::from_outcome("u-9", &outcome, Duration::from_secs(5));
        let json = serde_json::to_value(&submission).unwrap();
        assert_eq!(json["simulation_type"], "phishing");
        assert_eq!(json["score"], 100);
        assert_eq!(json["passed"], true);
        assert_eq!(json["answers"]["1"]["chosen"], true);
    }
}
