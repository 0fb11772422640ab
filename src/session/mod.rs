//! Simulation sessions
//!
//! Drives one pass through a deck. Every simulation, deck-driven or
//! free-text, goes through the same machine:
//!
//! ```text
//! NotStarted ──start──▶ Presenting ──submit_answer──▶ AwaitingFeedbackAck
//!                           ▲                                │
//!                           └────────advance (more left)─────┤
//!                                                            ▼
//!                                          Finished ◀──advance (last)
//! ```
//!
//! # Architecture
//!
//! - [`state`] — [`Phase`], [`AnswerRecord`], [`SessionState`], [`SimulationOutcome`]
//! - [`engine`] — [`Session`], the transitions and their contract checks

pub mod engine;
pub mod state;

pub use engine::{Advance, ProbeReport, Session};
pub use state::{AnswerMap, AnswerRecord, Phase, SessionState, SimulationOutcome};
