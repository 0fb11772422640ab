//! Password strength analysis and the strength-based scorer.
//!
//! Strength is a feature-weighted sum over length, case variety, digits and
//! symbols, minus a penalty for passwords that start with a well-known weak
//! word, clamped to `0..=100`.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::deck::Deck;
use crate::session::AnswerMap;

use super::Scorer;

static LOWER: LazyLock<Regex> = LazyLock::new(|| Regex::new("[a-z]").expect("valid regex"));
static UPPER: LazyLock<Regex> = LazyLock::new(|| Regex::new("[A-Z]").expect("valid regex"));
static DIGIT: LazyLock<Regex> = LazyLock::new(|| Regex::new("[0-9]").expect("valid regex"));
static SYMBOL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[!@#$%^&*()_+\-=\[\]{};':"\\|,.<>/?]"#).expect("valid regex")
});
static COMMON_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("(?i)^(password|123456|qwerty|admin)").expect("valid regex"));

const LONG_LENGTH: usize = 12;
const MIN_LENGTH: usize = 8;

// ============================================================================
// Crack Time
// ============================================================================

/// Qualitative brute-force time estimate, bucketed by strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CrackTime {
    /// Strength below 40.
    UnderAMinute,
    /// Strength 40–59.
    Minutes,
    /// Strength 60–79.
    Hours,
    /// Strength 80 and above.
    Years,
}

impl CrackTime {
    /// Buckets a strength value.
    #[must_use]
    pub const fn from_strength(strength: u8) -> Self {
        match strength {
            0..40 => Self::UnderAMinute,
            40..60 => Self::Minutes,
            60..80 => Self::Hours,
            _ => Self::Years,
        }
    }

    /// Display text for the estimate.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::UnderAMinute => "Less than 1 minute",
            Self::Minutes => "1-30 minutes",
            Self::Hours => "1-6 hours",
            Self::Years => "1+ years",
        }
    }
}

impl fmt::Display for CrackTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// Analysis
// ============================================================================

/// One line of feedback about a candidate password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Feedback {
    /// Message shown to the user.
    pub text: &'static str,
    /// Whether this is a strength (true) or a weakness (false).
    pub positive: bool,
}

/// Full analysis of a candidate password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrengthReport {
    /// Strength in `0..=100`.
    pub strength: u8,
    /// Brute-force estimate; `None` for empty input.
    pub crack_time: Option<CrackTime>,
    /// Per-feature feedback in evaluation order.
    pub feedback: Vec<Feedback>,
}

/// Computes the strength of `candidate` in `0..=100`.
#[must_use]
pub fn compute_strength(candidate: &str) -> u8 {
    analyze_password(candidate).strength
}

/// Analyzes `candidate`, returning strength, crack time and feedback.
#[must_use]
pub fn analyze_password(candidate: &str) -> StrengthReport {
    let mut score: i32 = 0;
    let mut feedback = Vec::new();

    // UTF-16 code units, so characters outside the BMP count twice.
    let length = candidate.encode_utf16().count();
    if length >= LONG_LENGTH {
        score += 25;
        feedback.push(Feedback {
            text: "Good length (12+ characters)",
            positive: true,
        });
    } else if length >= MIN_LENGTH {
        score += 15;
        feedback.push(Feedback {
            text: "Length acceptable (8+ characters)",
            positive: false,
        });
    } else {
        feedback.push(Feedback {
            text: "Too short (less than 8 characters)",
            positive: false,
        });
    }

    if LOWER.is_match(candidate) && UPPER.is_match(candidate) {
        score += 25;
        feedback.push(Feedback {
            text: "Mixed case letters",
            positive: true,
        });
    }
    if DIGIT.is_match(candidate) {
        score += 20;
        feedback.push(Feedback {
            text: "Contains numbers",
            positive: true,
        });
    }
    if SYMBOL.is_match(candidate) {
        score += 30;
        feedback.push(Feedback {
            text: "Contains special characters",
            positive: true,
        });
    }
    if COMMON_PREFIX.is_match(candidate) {
        score -= 30;
        feedback.push(Feedback {
            text: "Contains common password pattern",
            positive: false,
        });
    }

    let strength = u8::try_from(score.clamp(0, 100)).unwrap_or(0);
    StrengthReport {
        strength,
        crack_time: (!candidate.is_empty()).then(|| CrackTime::from_strength(strength)),
        feedback,
    }
}

/// Progress of the brute-force visualization after `tick` steps.
///
/// Advances 10 points per tick and saturates at 100. Presentation only.
#[must_use]
pub fn crack_progress(tick: u32) -> u8 {
    u8::try_from(tick.saturating_mul(10).min(100)).unwrap_or(100)
}

// ============================================================================
// Scorer
// ============================================================================

/// Strength tier above which a first-attempt password earns full marks.
pub const EXCELLENT_STRENGTH: u8 = 80;

/// Scores the password exercise from the final candidate's strength and
/// the number of attempts it took.
///
/// - accepted on the first attempt with strength ≥ 80 → 100
/// - accepted on the first attempt → 80
/// - accepted after retries → 70
/// - never accepted → the candidate's strength, kept below the pass threshold
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeuristicFeatureScorer;

impl Scorer for HeuristicFeatureScorer {
    fn score(&self, deck: &Deck, answers: &AnswerMap) -> u8 {
        let Some(record) = deck.scenarios().first().and_then(|s| answers.get(&s.id)) else {
            return 0;
        };
        let strength = record.measure.unwrap_or(0);
        match (record.is_correct, record.attempts <= 1) {
            (true, true) if strength >= EXCELLENT_STRENGTH => 100,
            (true, true) => 80,
            (true, false) => 70,
            (false, _) => strength.min(deck.pass_threshold().saturating_sub(1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::{AnswerValue, SimulationKind, load_builtin};
    use crate::session::AnswerRecord;

    #[test]
    fn common_password_is_weak() {
        let report = analyze_password("password");
        assert!(report.strength < 40);
        assert_eq!(report.strength, 0);
        assert_eq!(report.crack_time, Some(CrackTime::UnderAMinute));
        assert!(
            report
                .feedback
                .iter()
                .any(|f| f.text == "Contains common password pattern")
        );
    }

    #[test]
    fn complex_passphrase_is_strong() {
        let report = analyze_password("Tr0ub4dor&3XQ!");
        assert!(report.strength >= 80);
        assert_eq!(report.strength, 100);
        assert_eq!(report.crack_time, Some(CrackTime::Years));
    }

    #[test]
    fn feature_weights() {
        // 8 chars (15) + digits (20)
        assert_eq!(compute_strength("abcdefg1"), 35);
        // 8 chars (15) + mixed case (25) + digits (20)
        assert_eq!(compute_strength("Abcdefg1"), 60);
        // 12+ chars (25) + mixed case (25) + digits (20)
        assert_eq!(compute_strength("Abcdefghijk1"), 70);
        // short, symbols only
        assert_eq!(compute_strength("!!"), 30);
    }

    #[test]
    fn penalty_is_case_insensitive_prefix_only() {
        assert_eq!(compute_strength("QWERTY"), 0);
        assert_eq!(compute_strength("Admin2024!"), 15 + 25 + 20 + 30 - 30);
        // not a prefix
        assert_eq!(compute_strength("mypassword"), 15);
    }

    #[test]
    fn crack_time_buckets() {
        assert_eq!(CrackTime::from_strength(0), CrackTime::UnderAMinute);
        assert_eq!(CrackTime::from_strength(39), CrackTime::UnderAMinute);
        assert_eq!(CrackTime::from_strength(40), CrackTime::Minutes);
        assert_eq!(CrackTime::from_strength(59), CrackTime::Minutes);
        assert_eq!(CrackTime::from_strength(60), CrackTime::Hours);
        assert_eq!(CrackTime::from_strength(79), CrackTime::Hours);
        assert_eq!(CrackTime::from_strength(80), CrackTime::Years);
        assert_eq!(CrackTime::Years.label(), "1+ years");
    }

    #[test]
    fn empty_input_has_no_estimate() {
        let report = analyze_password("");
        assert_eq!(report.strength, 0);
        assert_eq!(report.crack_time, None);
    }

    #[test]
    fn crack_progress_saturates() {
        assert_eq!(crack_progress(0), 0);
        assert_eq!(crack_progress(3), 30);
        assert_eq!(crack_progress(10), 100);
        assert_eq!(crack_progress(u32::MAX), 100);
    }

    fn recorded(is_correct: bool, attempts: u32, strength: u8) -> AnswerMap {
        let mut map = AnswerMap::new();
        map.insert(1, AnswerRecord {
            scenario_id: 1,
            chosen: AnswerValue::Redacted { length: 12 },
            is_correct,
            attempts,
            measure: Some(strength),
        });
        map
    }

    #[test]
    fn length_counts_utf16_units() {
        let report = analyze_password("🔑🔑🔑🔑");
        assert!(report.feedback.iter().any(|f| f.text.starts_with("Length acceptable")));
        let report = analyze_password("ééééééé");
        assert!(report.feedback.iter().any(|f| f.text.starts_with("Too short")));
    }

    #[test]
    fn scorer_tiers() {
        let deck = load_builtin(SimulationKind::WeakPassword).unwrap();
        let scorer = HeuristicFeatureScorer;
        assert_eq!(scorer.score(&deck, &recorded(true, 1, 100)), 100);
        assert_eq!(scorer.score(&deck, &recorded(true, 1, 70)), 80);
        assert_eq!(scorer.score(&deck, &recorded(true, 2, 100)), 70);
        assert_eq!(scorer.score(&deck, &recorded(false, 1, 60)), 60);
        assert_eq!(scorer.score(&deck, &AnswerMap::new()), 0);
    }
}
