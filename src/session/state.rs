//! Session state representation.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::deck::{AnswerValue, SimulationKind};

/// Stage of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Created, waiting for `start`.
    NotStarted,
    /// A scenario is on screen, waiting for an answer.
    Presenting,
    /// An answer was recorded, feedback is on screen.
    AwaitingFeedbackAck,
    /// Deck exhausted or session ended; outcome computed.
    Finished,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotStarted => "not started",
            Self::Presenting => "presenting",
            Self::AwaitingFeedbackAck => "awaiting feedback acknowledgement",
            Self::Finished => "finished",
        })
    }
}

/// The user's recorded answer to one scenario.
///
/// Correctness is decided once, when the answer is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerRecord {
    /// Scenario this answer belongs to.
    pub scenario_id: u32,
    /// What the user chose (free text may be redacted).
    pub chosen: AnswerValue,
    /// Whether `chosen` matched the ground truth.
    pub is_correct: bool,
    /// Attempts spent on this scenario, including the recording one.
    pub attempts: u32,
    /// Graded measure from a predicate (password strength), if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measure: Option<u8>,
}

/// Answers keyed by scenario id.
pub type AnswerMap = BTreeMap<u32, AnswerRecord>;

/// Mutable part of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub(crate) current_index: usize,
    pub(crate) phase: Phase,
    pub(crate) answers: AnswerMap,
}

impl SessionState {
    pub(crate) const fn new() -> Self {
        Self {
            current_index: 0,
            phase: Phase::NotStarted,
            answers: AnswerMap::new(),
        }
    }

    /// 0-based cursor into the deck.
    #[must_use]
    pub const fn current_index(&self) -> usize {
        self.current_index
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Answers recorded so far.
    #[must_use]
    pub const fn answers(&self) -> &AnswerMap {
        &self.answers
    }
}

/// Terminal result of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationOutcome {
    /// Simulation that produced the outcome.
    pub simulation: SimulationKind,
    /// Score in `0..=100`.
    pub score_percent: u8,
    /// `score_percent >= pass_threshold`.
    pub passed: bool,
    /// Every recorded answer.
    pub trace: AnswerMap,
}

impl SimulationOutcome {
    /// Number of correct answers in the trace.
    #[must_use]
    pub fn correct_count(&self) -> usize {
        self.trace.values().filter(|a| a.is_correct).count()
    }
}
