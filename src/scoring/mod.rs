//! Scoring strategies
//!
//! Reduces a session's recorded answers to a 0–100 score. Each deck selects
//! its strategy at authoring time:
//!
//! - [`RatioScorer`] — correct answers over a fixed denominator
//! - [`AchievementScorer`] — tiered reward for exploiting on the first try
//! - [`HeuristicFeatureScorer`] — password strength and attempt count
//!
//! The [`strength`] and [`sql`] submodules hold the free-text analyzers the
//! generative decks are judged by.

pub mod achievement;
pub mod ratio;
pub mod sql;
pub mod strength;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::deck::Deck;
use crate::session::AnswerMap;

pub use achievement::AchievementScorer;
pub use ratio::RatioScorer;
pub use strength::HeuristicFeatureScorer;

/// Reduces recorded answers to an integer score in `0..=100`.
pub trait Scorer: fmt::Debug + Send + Sync {
    /// Computes the score for `answers` recorded against `deck`.
    fn score(&self, deck: &Deck, answers: &AnswerMap) -> u8;
}

/// Which count divides the number of correct answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenominatorPolicy {
    /// Every scenario in the deck counts, answered or not.
    #[default]
    DeckLength,
    /// Only scenarios the user actually answered count.
    Answered,
}

/// Scoring strategy as authored in a deck file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ScoringStrategy {
    /// Correct-answer ratio.
    Ratio {
        /// Denominator used when the session ends early.
        #[serde(default)]
        denominator: DenominatorPolicy,
    },
    /// Tiered achievement for free-text exploits.
    Achievement {
        /// Score for success on the first attempt.
        #[serde(default = "default_first_attempt")]
        first_attempt: u8,
        /// Score for success after retries.
        #[serde(default = "default_retried")]
        retried: u8,
        /// Score when the exploit never succeeded.
        #[serde(default = "default_missed")]
        missed: u8,
    },
    /// Feature-weighted password strength.
    Strength,
}

const fn default_first_attempt() -> u8 {
    100
}

const fn default_retried() -> u8 {
    85
}

const fn default_missed() -> u8 {
    70
}

impl Default for ScoringStrategy {
    fn default() -> Self {
        Self::Ratio {
            denominator: DenominatorPolicy::default(),
        }
    }
}

impl fmt::Display for ScoringStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ratio { .. } => f.write_str("ratio"),
            Self::Achievement { .. } => f.write_str("achievement"),
            Self::Strength => f.write_str("strength"),
        }
    }
}

/// Builds the scorer for a strategy.
#[must_use]
pub fn build_scorer(strategy: &ScoringStrategy) -> Box<dyn Scorer> {
    match *strategy {
        ScoringStrategy::Ratio { denominator } => Box::new(RatioScorer::new(denominator)),
        ScoringStrategy::Achievement {
            first_attempt,
            retried,
            missed,
        } => Box::new(AchievementScorer::new(first_attempt, retried, missed)),
        ScoringStrategy::Strength => Box::new(HeuristicFeatureScorer),
    }
}

/// `round(100 * numerator / denominator)` with halves rounded up.
///
/// Returns 0 when `denominator` is 0. Clamped to 100.
#[must_use]
pub fn round_percent(numerator: usize, denominator: usize) -> u8 {
    if denominator == 0 {
        return 0;
    }
    let numerator = numerator.min(denominator);
    let scaled = (200 * numerator + denominator) / (2 * denominator);
    u8::try_from(scaled.min(100)).unwrap_or(100)
}
