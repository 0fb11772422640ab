//! Deck and scenario record types.
//!
//! One evaluation rule serves every deck shape: a [`GroundTruth`] judges an
//! [`AnswerValue`] by equality (binary and choice scenarios) or by running
//! a predicate over free text (generative scenarios).

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

use crate::error::{DeckError, SessionError, ValidationIssue};
use crate::scoring::{self, Scorer, ScoringStrategy, sql, strength};

use super::SimulationKind;

// ============================================================================
// Ground Truth
// ============================================================================

/// Predicate applied to free-text input in generative scenarios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputPredicate {
    /// Input exploits the vulnerable login query.
    SqlInjection,
    /// Input is a password whose strength reaches the deck's pass threshold.
    StrongPassword,
}

/// Result of running an [`InputPredicate`] over one input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PredicateVerdict {
    /// Whether the input satisfies the predicate.
    pub satisfied: bool,
    /// Graded measure of the input, when the predicate has one (password strength).
    pub measure: Option<u8>,
}

impl InputPredicate {
    /// Evaluates `input` against this predicate.
    ///
    /// `threshold` is the deck's pass threshold; only password strength
    /// depends on it.
    #[must_use]
    pub fn evaluate(self, input: &str, threshold: u8) -> PredicateVerdict {
        match self {
            Self::SqlInjection => PredicateVerdict {
                satisfied: sql::detect_injection(input),
                measure: None,
            },
            Self::StrongPassword => {
                let value = strength::compute_strength(input);
                PredicateVerdict {
                    satisfied: value >= threshold,
                    measure: Some(value),
                }
            }
        }
    }

    /// Whether recorded answers must hide the raw input.
    #[must_use]
    pub const fn redacts_input(self) -> bool {
        matches!(self, Self::StrongPassword)
    }
}

/// The authored correct answer for one scenario.
///
/// Opaque to the engine apart from the comparison in [`GroundTruth::evaluate`].
/// Authored as a single-key map naming the shape, e.g. `{ binary: true }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GroundTruthMap", into = "GroundTruthMap")]
pub enum GroundTruth {
    /// Binary judgment (e.g. phishing = `true`, legitimate = `false`).
    Binary(bool),
    /// Single best action out of a scenario-specific option vocabulary.
    Choice {
        /// Tokens the user may pick from, in display order.
        options: Vec<String>,
        /// The correct token.
        best: String,
    },
    /// Free-text input judged by a predicate.
    Predicate(InputPredicate),
}

/// Choice body of a [`GroundTruthMap`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ChoiceTruth {
    options: Vec<String>,
    best: String,
}

/// Serde shape of [`GroundTruth`]: exactly one key must be present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct GroundTruthMap {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    binary: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    choice: Option<ChoiceTruth>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    predicate: Option<InputPredicate>,
}

impl TryFrom<GroundTruthMap> for GroundTruth {
    type Error = String;

    fn try_from(map: GroundTruthMap) -> Result<Self, Self::Error> {
        match (map.binary, map.choice, map.predicate) {
            (Some(value), None, None) => Ok(Self::Binary(value)),
            (None, Some(ChoiceTruth { options, best }), None) => Ok(Self::Choice { options, best }),
            (None, None, Some(predicate)) => Ok(Self::Predicate(predicate)),
            (None, None, None) => {
                Err("truth needs one of `binary`, `choice` or `predicate`".to_owned())
            }
            _ => Err(
                "truth must name exactly one of `binary`, `choice` or `predicate`".to_owned(),
            ),
        }
    }
}

impl From<GroundTruth> for GroundTruthMap {
    fn from(truth: GroundTruth) -> Self {
        match truth {
            GroundTruth::Binary(value) => Self {
                binary: Some(value),
                ..Self::default()
            },
            GroundTruth::Choice { options, best } => Self {
                choice: Some(ChoiceTruth { options, best }),
                ..Self::default()
            },
            GroundTruth::Predicate(predicate) => Self {
                predicate: Some(predicate),
                ..Self::default()
            },
        }
    }
}

impl GroundTruth {
    /// Short name of the answer shape this truth accepts.
    #[must_use]
    pub const fn shape(&self) -> &'static str {
        match self {
            Self::Binary(_) => "binary",
            Self::Choice { .. } => "choice",
            Self::Predicate(_) => "text",
        }
    }

    /// Judges a submitted answer.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AnswerShapeMismatch` when the answer's shape
    /// does not fit, and `SessionError::UnknownOption` when a choice token
    /// is outside the option set.
    pub fn evaluate(&self, answer: &AnswerValue, threshold: u8) -> Result<bool, SessionError> {
        match (self, answer) {
            (Self::Binary(truth), AnswerValue::Binary(chosen)) => Ok(truth == chosen),
            (Self::Choice { options, best }, AnswerValue::Choice(token)) => {
                if options.iter().any(|o| o == token) {
                    Ok(best == token)
                } else {
                    Err(SessionError::UnknownOption {
                        token: token.clone(),
                        options: options.clone(),
                    })
                }
            }
            (Self::Predicate(predicate), AnswerValue::Text(input)) => {
                Ok(predicate.evaluate(input, threshold).satisfied)
            }
            _ => Err(SessionError::AnswerShapeMismatch {
                expected: self.shape(),
                actual: answer.shape(),
            }),
        }
    }
}

// ============================================================================
// Answer Value
// ============================================================================

/// A value the user submitted for a scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerValue {
    /// Yes/no judgment.
    Binary(bool),
    /// Selected action token.
    Choice(String),
    /// Free-text input.
    Text(String),
    /// Free-text input that must not be kept, with its length.
    Redacted {
        /// Character count of the hidden input.
        length: usize,
    },
}

impl AnswerValue {
    /// Short name of this answer's shape.
    #[must_use]
    pub const fn shape(&self) -> &'static str {
        match self {
            Self::Binary(_) => "binary",
            Self::Choice(_) => "choice",
            Self::Text(_) | Self::Redacted { .. } => "text",
        }
    }

    /// Convenience constructor for choice answers.
    #[must_use]
    pub fn choice(token: impl Into<String>) -> Self {
        Self::Choice(token.into())
    }

    /// Convenience constructor for free-text answers.
    #[must_use]
    pub fn text(input: impl Into<String>) -> Self {
        Self::Text(input.into())
    }
}

impl Serialize for AnswerValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Binary(b) => serializer.serialize_bool(*b),
            Self::Choice(s) | Self::Text(s) => serializer.serialize_str(s),
            Self::Redacted { length } => {
                serializer.serialize_str(&format!("[redacted: {length} chars]"))
            }
        }
    }
}

impl fmt::Display for AnswerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Binary(true) => f.write_str("yes"),
            Self::Binary(false) => f.write_str("no"),
            Self::Choice(s) | Self::Text(s) => f.write_str(s),
            Self::Redacted { length } => write!(f, "{}", "*".repeat(*length)),
        }
    }
}

// ============================================================================
// Scenario Record
// ============================================================================

/// One immutable deck entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioRecord {
    /// Ordinal, unique and ascending within the deck.
    pub id: u32,
    /// Short heading shown above the prompt.
    pub title: String,
    /// Display payload (email fields, narrative, labels).
    pub prompt: serde_json::Value,
    /// Authored correct answer.
    pub truth: GroundTruth,
    /// Feedback shown after answering (red flags, tips).
    pub explanation: serde_json::Value,
}

// ============================================================================
// Deck
// ============================================================================

/// A validated, immutable scenario deck.
///
/// Guaranteed non-empty with strictly ascending scenario ids. Decks with
/// predicate ground truth hold exactly one scenario.
#[derive(Debug, Clone)]
pub struct Deck {
    kind: SimulationKind,
    title: String,
    pass_threshold: u8,
    scoring: ScoringStrategy,
    scenarios: Vec<ScenarioRecord>,
}

impl Deck {
    /// Builds a deck, validating it first.
    ///
    /// # Errors
    ///
    /// Returns `DeckError::ValidationError` listing every problem found.
    pub fn new(
        kind: SimulationKind,
        title: impl Into<String>,
        pass_threshold: u8,
        scoring: ScoringStrategy,
        scenarios: Vec<ScenarioRecord>,
    ) -> Result<Self, DeckError> {
        let mut issues = Vec::new();
        if pass_threshold > 100 {
            issues.push(ValidationIssue::error(
                "pass_threshold",
                format!("threshold {pass_threshold} exceeds 100"),
            ));
        }
        check_scenarios(&scenarios, &scoring, &mut issues);

        if issues
            .iter()
            .any(|i| i.severity == crate::error::Severity::Error)
        {
            return Err(DeckError::ValidationError {
                path: format!("<deck:{kind}>"),
                errors: issues,
            });
        }

        Ok(Self {
            kind,
            title: title.into(),
            pass_threshold,
            scoring,
            scenarios,
        })
    }

    /// Simulation this deck belongs to.
    #[must_use]
    pub const fn kind(&self) -> SimulationKind {
        self.kind
    }

    /// Display title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Minimum score that counts as a pass.
    #[must_use]
    pub const fn pass_threshold(&self) -> u8 {
        self.pass_threshold
    }

    /// Scoring strategy selected for this deck.
    #[must_use]
    pub const fn scoring(&self) -> &ScoringStrategy {
        &self.scoring
    }

    /// Builds the scorer for this deck's strategy.
    #[must_use]
    pub fn scorer(&self) -> Box<dyn Scorer> {
        scoring::build_scorer(&self.scoring)
    }

    /// All scenarios in order.
    #[must_use]
    pub fn scenarios(&self) -> &[ScenarioRecord] {
        &self.scenarios
    }

    /// Scenario at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ScenarioRecord> {
        self.scenarios.get(index)
    }

    /// Number of scenarios (always at least one).
    #[must_use]
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    /// Whether the deck has no scenarios; `false` for every loaded deck.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    /// Whether this deck is a single free-text scenario.
    #[must_use]
    pub fn is_generative(&self) -> bool {
        self.scenarios
            .iter()
            .any(|s| matches!(s.truth, GroundTruth::Predicate(_)))
    }
}

/// Appends every structural problem with `scenarios` to `issues`.
pub(crate) fn check_scenarios(
    scenarios: &[ScenarioRecord],
    scoring: &ScoringStrategy,
    issues: &mut Vec<ValidationIssue>,
) {
    if scenarios.is_empty() {
        issues.push(ValidationIssue::error("scenarios", "deck has no scenarios"));
        return;
    }

    let mut seen = HashSet::new();
    let mut previous: Option<u32> = None;
    for (i, scenario) in scenarios.iter().enumerate() {
        let path = format!("scenarios[{i}]");

        if !seen.insert(scenario.id) {
            issues.push(ValidationIssue::error(
                format!("{path}.id"),
                format!("duplicate scenario id {}", scenario.id),
            ));
        } else if previous.is_some_and(|p| scenario.id < p) {
            issues.push(ValidationIssue::error(
                format!("{path}.id"),
                format!("scenario id {} is out of order", scenario.id),
            ));
        }
        previous = Some(scenario.id);

        if scenario.title.trim().is_empty() {
            issues.push(ValidationIssue::warning(
                format!("{path}.title"),
                "scenario title is empty",
            ));
        }

        match &scenario.truth {
            GroundTruth::Choice { options, best } => {
                if options.is_empty() {
                    issues.push(ValidationIssue::error(
                        format!("{path}.truth.choice.options"),
                        "option set is empty",
                    ));
                } else if !options.iter().any(|o| o == best) {
                    issues.push(ValidationIssue::error(
                        format!("{path}.truth.choice.best"),
                        format!("best action '{best}' is not one of {options:?}"),
                    ));
                }
                let unique: HashSet<&String> = options.iter().collect();
                if unique.len() != options.len() {
                    issues.push(ValidationIssue::error(
                        format!("{path}.truth.choice.options"),
                        "option set contains duplicates",
                    ));
                }
            }
            GroundTruth::Predicate(_) if scenarios.len() > 1 => {
                issues.push(ValidationIssue::error(
                    format!("{path}.truth"),
                    "free-text scenarios must be the only scenario in their deck",
                ));
            }
            GroundTruth::Binary(_) | GroundTruth::Predicate(_) => {}
        }
    }

    let generative = scenarios
        .iter()
        .any(|s| matches!(s.truth, GroundTruth::Predicate(_)));
    match scoring {
        ScoringStrategy::Ratio { .. } if generative => issues.push(ValidationIssue::error(
            "scoring.strategy",
            "ratio scoring needs fixed ground truths, not a predicate",
        )),
        ScoringStrategy::Achievement { .. } | ScoringStrategy::Strength if !generative => {
            issues.push(ValidationIssue::error(
                "scoring.strategy",
                "achievement and strength scoring need a single free-text scenario",
            ));
        }
        _ => {}
    }
    if let ScoringStrategy::Achievement {
        first_attempt,
        retried,
        missed,
    } = scoring
    {
        for (field, value) in [
            ("first_attempt", first_attempt),
            ("retried", retried),
            ("missed", missed),
        ] {
            if *value > 100 {
                issues.push(ValidationIssue::error(
                    format!("scoring.{field}"),
                    format!("score {value} exceeds 100"),
                ));
            }
        }
    }
    if let ScoringStrategy::Strength = scoring {
        let is_password = scenarios
            .iter()
            .all(|s| s.truth == GroundTruth::Predicate(InputPredicate::StrongPassword));
        if !is_password {
            issues.push(ValidationIssue::error(
                "scoring.strategy",
                "strength scoring only applies to the strong_password predicate",
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::DenominatorPolicy;
    use serde_json::json;

    fn binary(id: u32, truth: bool) -> ScenarioRecord {
        ScenarioRecord {
            id,
            title: format!("email {id}"),
            prompt: json!({}),
            truth: GroundTruth::Binary(truth),
            explanation: json!({}),
        }
    }

    fn ratio() -> ScoringStrategy {
        ScoringStrategy::Ratio {
            denominator: DenominatorPolicy::DeckLength,
        }
    }

    #[test]
    fn binary_correctness_is_equality() {
        let truth = GroundTruth::Binary(true);
        assert!(truth.evaluate(&AnswerValue::Binary(true), 70).unwrap());
        assert!(!truth.evaluate(&AnswerValue::Binary(false), 70).unwrap());
    }

    #[test]
    fn choice_correctness_is_token_equality() {
        let truth = GroundTruth::Choice {
            options: vec!["comply".into(), "verify".into(), "refuse".into()],
            best: "refuse".into(),
        };
        assert!(truth.evaluate(&AnswerValue::choice("refuse"), 75).unwrap());
        assert!(!truth.evaluate(&AnswerValue::choice("comply"), 75).unwrap());
    }

    #[test]
    fn choice_rejects_token_outside_option_set() {
        let truth = GroundTruth::Choice {
            options: vec!["pay".into(), "report".into()],
            best: "report".into(),
        };
        let err = truth.evaluate(&AnswerValue::choice("scan"), 75).unwrap_err();
        assert!(matches!(err, SessionError::UnknownOption { .. }));
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let truth = GroundTruth::Binary(false);
        let err = truth.evaluate(&AnswerValue::choice("yes"), 70).unwrap_err();
        assert_eq!(
            err,
            SessionError::AnswerShapeMismatch {
                expected: "binary",
                actual: "choice"
            }
        );
    }

    #[test]
    fn predicate_truth_runs_over_text() {
        let truth = GroundTruth::Predicate(InputPredicate::SqlInjection);
        assert!(truth.evaluate(&AnswerValue::text("' OR '1'='1"), 70).unwrap());
        assert!(!truth.evaluate(&AnswerValue::text("hunter2"), 70).unwrap());
    }

    #[test]
    fn password_predicate_reports_strength() {
        let verdict = InputPredicate::StrongPassword.evaluate("Tr0ub4dor&3XQ!", 70);
        assert!(verdict.satisfied);
        assert_eq!(verdict.measure, Some(100));

        let verdict = InputPredicate::StrongPassword.evaluate("password", 70);
        assert!(!verdict.satisfied);
    }

    #[test]
    fn empty_deck_is_rejected() {
        let err = Deck::new(SimulationKind::Phishing, "empty", 70, ratio(), vec![]).unwrap_err();
        assert_eq!(err.issues()[0].path, "scenarios");
    }

    #[test]
    fn duplicate_and_unordered_ids_are_rejected() {
        let err = Deck::new(
            SimulationKind::Phishing,
            "dups",
            70,
            ratio(),
            vec![binary(2, true), binary(1, false), binary(1, true)],
        )
        .unwrap_err();
        let messages: Vec<String> = err.issues().iter().map(|i| i.message.clone()).collect();
        assert!(messages.iter().any(|m| m.contains("out of order")));
        assert!(messages.iter().any(|m| m.contains("duplicate")));
    }

    #[test]
    fn best_action_must_be_an_option() {
        let scenario = ScenarioRecord {
            id: 1,
            title: "call".into(),
            prompt: json!({}),
            truth: GroundTruth::Choice {
                options: vec!["comply".into(), "refuse".into()],
                best: "verify".into(),
            },
            explanation: json!({}),
        };
        let err = Deck::new(SimulationKind::SocialEngineering, "se", 75, ratio(), vec![
            scenario,
        ])
        .unwrap_err();
        assert_eq!(err.issues()[0].path, "scenarios[0].truth.choice.best");
    }

    #[test]
    fn empty_option_set_is_rejected() {
        let scenario = ScenarioRecord {
            id: 1,
            title: "step".into(),
            prompt: json!({}),
            truth: GroundTruth::Choice {
                options: vec![],
                best: "scan".into(),
            },
            explanation: json!({}),
        };
        let err =
            Deck::new(SimulationKind::Ransomware, "r", 75, ratio(), vec![scenario]).unwrap_err();
        assert_eq!(err.issues()[0].message, "option set is empty");
    }

    #[test]
    fn predicate_deck_must_have_one_scenario() {
        let make = |id| ScenarioRecord {
            id,
            title: "login".into(),
            prompt: json!({}),
            truth: GroundTruth::Predicate(InputPredicate::SqlInjection),
            explanation: json!({}),
        };
        let strategy = ScoringStrategy::Achievement {
            first_attempt: 100,
            retried: 85,
            missed: 70,
        };
        assert!(
            Deck::new(SimulationKind::SqlInjection, "sqli", 70, strategy.clone(), vec![
                make(1)
            ])
            .is_ok()
        );
        assert!(
            Deck::new(SimulationKind::SqlInjection, "sqli", 70, strategy, vec![
                make(1),
                make(2)
            ])
            .is_err()
        );
    }

    #[test]
    fn ratio_scoring_rejects_predicates() {
        let scenario = ScenarioRecord {
            id: 1,
            title: "pw".into(),
            prompt: json!({}),
            truth: GroundTruth::Predicate(InputPredicate::StrongPassword),
            explanation: json!({}),
        };
        let err = Deck::new(SimulationKind::WeakPassword, "pw", 70, ratio(), vec![scenario])
            .unwrap_err();
        assert_eq!(err.issues()[0].path, "scoring.strategy");
    }

    #[test]
    fn threshold_above_100_is_rejected() {
        assert!(Deck::new(SimulationKind::Phishing, "p", 101, ratio(), vec![binary(1, true)]).is_err());
    }

    #[test]
    fn redacted_answer_serializes_without_input() {
        let json = serde_json::to_string(&AnswerValue::Redacted { length: 8 }).unwrap();
        assert_eq!(json, "\"[redacted: 8 chars]\"");
        assert_eq!(serde_json::to_string(&AnswerValue::Binary(true)).unwrap(), "true");
    }
}
