//! Correct-answer ratio scoring.

use crate::deck::Deck;
use crate::session::AnswerMap;

use super::{DenominatorPolicy, Scorer, round_percent};

/// Scores `round(100 * correct / denominator)`.
///
/// With [`DenominatorPolicy::DeckLength`] unreached scenarios count as wrong;
/// with [`DenominatorPolicy::Answered`] they are left out entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatioScorer {
    denominator: DenominatorPolicy,
}

impl RatioScorer {
    /// Creates a ratio scorer with the given denominator policy.
    #[must_use]
    pub const fn new(denominator: DenominatorPolicy) -> Self {
        Self { denominator }
    }
}

impl Scorer for RatioScorer {
    fn score(&self, deck: &Deck, answers: &AnswerMap) -> u8 {
        let correct = answers.values().filter(|a| a.is_correct).count();
        let denominator = match self.denominator {
            DenominatorPolicy::DeckLength => deck.len(),
            DenominatorPolicy::Answered => answers.len(),
        };
        round_percent(correct, denominator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::{AnswerValue, GroundTruth, ScenarioRecord, SimulationKind};
    use crate::scoring::ScoringStrategy;
    use crate::session::AnswerRecord;
    use serde_json::json;

    fn deck(n: u32) -> Deck {
        let scenarios = (1..=n)
            .map(|id| ScenarioRecord {
                id,
                title: format!("s{id}"),
                prompt: json!({}),
                truth: GroundTruth::Binary(true),
                explanation: json!({}),
            })
            .collect();
        Deck::new(
            SimulationKind::Phishing,
            "ratio",
            70,
            ScoringStrategy::default(),
            scenarios,
        )
        .unwrap()
    }

    fn answers(results: &[bool]) -> AnswerMap {
        results
            .iter()
            .zip(1u32..)
            .map(|(&ok, id)| {
                (id, AnswerRecord {
                    scenario_id: id,
                    chosen: AnswerValue::Binary(ok),
                    is_correct: ok,
                    attempts: 1,
                    measure: None,
                })
            })
            .collect()
    }

    #[test]
    fn deck_length_counts_unanswered_as_wrong() {
        let scorer = RatioScorer::new(DenominatorPolicy::DeckLength);
        assert_eq!(scorer.score(&deck(4), &answers(&[true, true])), 50);
    }

    #[test]
    fn answered_ignores_unreached_scenarios() {
        let scorer = RatioScorer::new(DenominatorPolicy::Answered);
        assert_eq!(scorer.score(&deck(4), &answers(&[true, true])), 100);
        assert_eq!(scorer.score(&deck(4), &answers(&[true, false, false])), 33);
    }

    #[test]
    fn answered_with_nothing_recorded_is_zero() {
        let scorer = RatioScorer::new(DenominatorPolicy::Answered);
        assert_eq!(scorer.score(&deck(3), &AnswerMap::new()), 0);
    }

    #[test]
    fn one_of_three() {
        let scorer = RatioScorer::new(DenominatorPolicy::DeckLength);
        assert_eq!(scorer.score(&deck(3), &answers(&[false, true, false])), 33);
    }
}
