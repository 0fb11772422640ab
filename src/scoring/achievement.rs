//! Achievement scoring for exploit exercises.
//!
//! Rewards how quickly the user pulled off the exploit rather than how
//! many answers were right.

use crate::deck::Deck;
use crate::session::AnswerMap;

use super::Scorer;

/// Tiered score: first-attempt success, success after retries, or a miss.
///
/// A session with no recorded attempt scores 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AchievementScorer {
    first_attempt: u8,
    retried: u8,
    missed: u8,
}

impl AchievementScorer {
    /// Creates a scorer with the three tier values (each clamped to 100).
    #[must_use]
    pub fn new(first_attempt: u8, retried: u8, missed: u8) -> Self {
        Self {
            first_attempt: first_attempt.min(100),
            retried: retried.min(100),
            missed: missed.min(100),
        }
    }
}

impl Default for AchievementScorer {
    fn default() -> Self {
        Self::new(100, 85, 70)
    }
}

impl Scorer for AchievementScorer {
    fn score(&self, deck: &Deck, answers: &AnswerMap) -> u8 {
        let record = deck
            .scenarios()
            .first()
            .and_then(|s| answers.get(&s.id));
        match record {
            Some(r) if r.is_correct && r.attempts <= 1 => self.first_attempt,
            Some(r) if r.is_correct => self.retried,
            Some(_) => self.missed,
            None => 0,
        }
    }
}
