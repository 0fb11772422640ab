//! Session state machine.
//!
//! `Session` owns one pass through a deck. Transitions are synchronous and
//! run to completion; nothing here performs I/O. A rejected call returns a
//! [`SessionError`] and leaves the session exactly as it was.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::deck::{AnswerValue, Deck, GroundTruth, PredicateVerdict, ScenarioRecord};
use crate::error::SessionError;
use crate::scoring::Scorer;

use super::state::{AnswerMap, AnswerRecord, Phase, SessionState, SimulationOutcome};

/// Result of a successful [`Session::advance`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// Moved on to the scenario at `index`.
    Next {
        /// New cursor position.
        index: usize,
    },
    /// The deck is exhausted; the session is finished.
    Finished(SimulationOutcome),
}

/// Result of a free-text probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProbeReport {
    /// Predicate verdict for the probed input.
    pub verdict: PredicateVerdict,
    /// Attempts spent on the current scenario so far, this probe included.
    pub attempts: u32,
}

/// One user's pass through a deck.
#[derive(Debug)]
pub struct Session {
    deck: Arc<Deck>,
    scorer: Arc<dyn Scorer>,
    state: SessionState,
    /// Attempts already spent on the current scenario by probes.
    probes: u32,
    outcome: Option<SimulationOutcome>,
    outcome_taken: bool,
}

impl Session {
    /// Creates a session scored by the deck's own strategy.
    #[must_use]
    pub fn new(deck: impl Into<Arc<Deck>>) -> Self {
        let deck = deck.into();
        let scorer = Arc::from(deck.scorer());
        Self::with_scorer(deck, scorer)
    }

    /// Creates a session with an explicit scorer.
    #[must_use]
    pub fn with_scorer(deck: impl Into<Arc<Deck>>, scorer: Arc<dyn Scorer>) -> Self {
        Self {
            deck: deck.into(),
            scorer,
            state: SessionState::new(),
            probes: 0,
            outcome: None,
            outcome_taken: false,
        }
    }

    /// Starts a fresh session over the same deck and scorer, with an empty
    /// answer set.
    #[must_use]
    pub fn retry(&self) -> Self {
        Self::with_scorer(Arc::clone(&self.deck), Arc::clone(&self.scorer))
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// The deck being played.
    #[must_use]
    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.state.phase
    }

    /// Read-only view of the session state.
    #[must_use]
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    /// Answers recorded so far.
    #[must_use]
    pub const fn answers(&self) -> &AnswerMap {
        &self.state.answers
    }

    /// Scenario under the cursor, once started.
    #[must_use]
    pub fn current(&self) -> Option<&ScenarioRecord> {
        match self.state.phase {
            Phase::NotStarted => None,
            _ => self.deck.get(self.state.current_index),
        }
    }

    /// Answer recorded for the scenario under the cursor, if any.
    #[must_use]
    pub fn current_answer(&self) -> Option<&AnswerRecord> {
        self.current()
            .and_then(|s| self.state.answers.get(&s.id))
    }

    /// Outcome, once finished (available even after it was taken).
    #[must_use]
    pub const fn outcome(&self) -> Option<&SimulationOutcome> {
        self.outcome.as_ref()
    }

    // ------------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------------

    /// `NotStarted → Presenting` at the first scenario.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyStarted` if called twice.
    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.state.phase != Phase::NotStarted {
            return Err(SessionError::AlreadyStarted);
        }
        self.state.current_index = 0;
        self.state.answers.clear();
        self.probes = 0;
        self.state.phase = Phase::Presenting;
        info!(
            deck = %self.deck.kind(),
            scenarios = self.deck.len(),
            "session started"
        );
        Ok(())
    }

    /// Records an answer for the current scenario.
    ///
    /// `Presenting → AwaitingFeedbackAck`. Correctness is computed here
    /// and never again.
    ///
    /// # Errors
    ///
    /// - `SessionError::WrongPhase` unless presenting
    /// - `SessionError::AlreadyAnswered` if the scenario has an answer
    /// - `SessionError::AnswerShapeMismatch` / `UnknownOption` for answers
    ///   the ground truth cannot judge
    pub fn submit_answer(&mut self, value: AnswerValue) -> Result<&AnswerRecord, SessionError> {
        self.require_phase("submit_answer", Phase::Presenting)?;
        let scenario = self.current_scenario()?;
        let scenario_id = scenario.id;
        if self.state.answers.contains_key(&scenario_id) {
            return Err(SessionError::AlreadyAnswered { scenario_id });
        }

        let threshold = self.deck.pass_threshold();
        let is_correct = scenario.truth.evaluate(&value, threshold)?;
        let (chosen, measure) = match (&scenario.truth, value) {
            (GroundTruth::Predicate(predicate), AnswerValue::Text(input)) => {
                let measure = predicate.evaluate(&input, threshold).measure;
                let chosen = if predicate.redacts_input() {
                    AnswerValue::Redacted {
                        length: input.chars().count(),
                    }
                } else {
                    AnswerValue::Text(input)
                };
                (chosen, measure)
            }
            (_, value) => (value, None),
        };

        let record = AnswerRecord {
            scenario_id,
            chosen,
            is_correct,
            attempts: self.probes.saturating_add(1),
            measure,
        };
        debug!(
            deck = %self.deck.kind(),
            scenario_id,
            is_correct,
            attempts = record.attempts,
            "answer recorded"
        );

        self.state.phase = Phase::AwaitingFeedbackAck;
        Ok(self.state.answers.entry(scenario_id).or_insert(record))
    }

    /// Acknowledges feedback and moves on.
    ///
    /// `AwaitingFeedbackAck → Presenting` at the next scenario, or
    /// `→ Finished` after the last one, at which point the outcome is
    /// computed.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::WrongPhase` unless awaiting feedback.
    pub fn advance(&mut self) -> Result<Advance, SessionError> {
        self.require_phase("advance", Phase::AwaitingFeedbackAck)?;

        let next = self.state.current_index + 1;
        if next < self.deck.len() {
            self.state.current_index = next;
            self.probes = 0;
            self.state.phase = Phase::Presenting;
            debug!(deck = %self.deck.kind(), index = next, "advanced to next scenario");
            return Ok(Advance::Next { index: next });
        }

        Ok(Advance::Finished(self.finish()))
    }

    /// Ends the session before the deck is exhausted.
    ///
    /// Unreached scenarios contribute no answer; how they affect the score
    /// depends on the deck's denominator policy.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::WrongPhase` if the session has not started or
    /// is already finished.
    pub fn finish_early(&mut self) -> Result<SimulationOutcome, SessionError> {
        match self.state.phase {
            Phase::Presenting | Phase::AwaitingFeedbackAck => {
                info!(
                    deck = %self.deck.kind(),
                    answered = self.state.answers.len(),
                    "session ended early"
                );
                Ok(self.finish())
            }
            phase => Err(SessionError::WrongPhase {
                operation: "finish_early",
                phase,
            }),
        }
    }

    /// Evaluates free text against the current scenario without side effects.
    ///
    /// Used for live feedback while the user types.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::WrongPhase` unless presenting and
    /// `SessionError::ProbeNotSupported` for fixed-truth scenarios.
    pub fn preview(&self, input: &str) -> Result<PredicateVerdict, SessionError> {
        self.require_phase("preview", Phase::Presenting)?;
        let scenario = self.current_scenario()?;
        match scenario.truth {
            GroundTruth::Predicate(predicate) => {
                Ok(predicate.evaluate(input, self.deck.pass_threshold()))
            }
            _ => Err(SessionError::ProbeNotSupported {
                scenario_id: scenario.id,
            }),
        }
    }

    /// Tries free text against the current scenario, counting an attempt
    /// but recording no answer.
    ///
    /// # Errors
    ///
    /// Same as [`Session::preview`].
    pub fn probe(&mut self, input: &str) -> Result<ProbeReport, SessionError> {
        let verdict = self.preview(input)?;
        self.probes = self.probes.saturating_add(1);
        debug!(
            deck = %self.deck.kind(),
            attempts = self.probes,
            satisfied = verdict.satisfied,
            "probe evaluated"
        );
        Ok(ProbeReport {
            verdict,
            attempts: self.probes,
        })
    }

    /// Hands out the outcome. Succeeds exactly once per session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::WrongPhase` before the session is finished and
    /// `SessionError::OutcomeAlreadyTaken` on every call after the first.
    pub fn take_outcome(&mut self) -> Result<SimulationOutcome, SessionError> {
        self.require_phase("take_outcome", Phase::Finished)?;
        if self.outcome_taken {
            return Err(SessionError::OutcomeAlreadyTaken);
        }
        let outcome = self
            .outcome
            .clone()
            .ok_or(SessionError::OutcomeAlreadyTaken)?;
        self.outcome_taken = true;
        Ok(outcome)
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn require_phase(&self, operation: &'static str, expected: Phase) -> Result<(), SessionError> {
        if self.state.phase == expected {
            Ok(())
        } else {
            Err(SessionError::WrongPhase {
                operation,
                phase: self.state.phase,
            })
        }
    }

    fn current_scenario(&self) -> Result<&ScenarioRecord, SessionError> {
        self.deck
            .get(self.state.current_index)
            .ok_or(SessionError::WrongPhase {
                operation: "current",
                phase: self.state.phase,
            })
    }

    fn finish(&mut self) -> SimulationOutcome {
        let score_percent = self.scorer.score(&self.deck, &self.state.answers).min(100);
        let outcome = SimulationOutcome {
            simulation: self.deck.kind(),
            score_percent,
            passed: score_percent >= self.deck.pass_threshold(),
            trace: self.state.answers.clone(),
        };
        self.state.phase = Phase::Finished;
        self.outcome = Some(outcome.clone());
        info!(
            deck = %self.deck.kind(),
            score = score_percent,
            passed = outcome.passed,
            "session finished"
        );
        outcome
    }
}
