//! Serde shape of a deck YAML file.
//!
//! Fields a deck cannot work without are still `Option` here so that the
//! loader can report them as validation issues with a path, instead of a
//! bare parse error.

use serde::{Deserialize, Serialize};

use crate::scoring::ScoringStrategy;

use super::SimulationKind;
use super::record::GroundTruth;

/// Top-level deck document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeckFile {
    /// Simulation the deck belongs to.
    pub simulation: SimulationKind,

    /// Display title; defaults to the simulation label.
    #[serde(default)]
    pub title: Option<String>,

    /// Minimum passing score, 0–100.
    #[serde(default)]
    pub pass_threshold: Option<u32>,

    /// Scoring strategy.
    #[serde(default)]
    pub scoring: Option<ScoringStrategy>,

    /// Ordered scenarios.
    #[serde(default)]
    pub scenarios: Vec<ScenarioFile>,
}

/// One scenario as authored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioFile {
    /// Ordinal within the deck.
    pub id: u32,

    /// Heading.
    #[serde(default)]
    pub title: String,

    /// Opaque display payload.
    #[serde(default)]
    pub prompt: serde_json::Value,

    /// Correct answer.
    #[serde(default)]
    pub truth: Option<GroundTruth>,

    /// Opaque feedback payload.
    #[serde(default)]
    pub explanation: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::record::InputPredicate;
    use crate::scoring::DenominatorPolicy;

    #[test]
    fn parses_binary_deck() {
        let yaml = r#"
simulation: phishing
pass_threshold: 70
scoring:
  strategy: ratio
scenarios:
  - id: 1
    title: Urgent
    prompt:
      from: security@paypa1-verify.com
    truth:
      binary: true
"#;
        let file: DeckFile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(file.simulation, SimulationKind::Phishing);
        assert_eq!(file.pass_threshold, Some(70));
        assert_eq!(
            file.scoring,
            Some(ScoringStrategy::Ratio {
                denominator: DenominatorPolicy::DeckLength
            })
        );
        assert_eq!(file.scenarios[0].truth, Some(GroundTruth::Binary(true)));
        assert_eq!(
            file.scenarios[0].prompt["from"],
            "security@paypa1-verify.com"
        );
    }

    #[test]
    fn parses_choice_and_predicate_truths() {
        let yaml = r"
- id: 1
  truth:
    choice:
      options: [open, scan, delete]
      best: scan
- id: 2
  truth:
    predicate: sql_injection
";
        let scenarios: Vec<ScenarioFile> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            scenarios[0].truth,
            Some(GroundTruth::Choice {
                options: vec!["open".into(), "scan".into(), "delete".into()],
                best: "scan".into(),
            })
        );
        assert_eq!(
            scenarios[1].truth,
            Some(GroundTruth::Predicate(InputPredicate::SqlInjection))
        );
    }

    #[test]
    fn missing_truth_parses_as_none() {
        let scenario: ScenarioFile = serde_yaml::from_str("id: 3\ntitle: x").unwrap();
        assert!(scenario.truth.is_none());
        assert!(scenario.prompt.is_null());
    }

    #[test]
    fn flow_map_truth_parses() {
        let scenario: ScenarioFile =
            serde_yaml::from_str("id: 1\ntruth: { binary: false }").unwrap();
        assert_eq!(scenario.truth, Some(GroundTruth::Binary(false)));
    }

    #[test]
    fn truth_with_two_shapes_is_rejected() {
        let yaml = "id: 1\ntruth:\n  binary: true\n  predicate: sql_injection\n";
        let err = serde_yaml::from_str::<ScenarioFile>(yaml).unwrap_err();
        assert!(err.to_string().contains("exactly one"), "{err}");
    }

    #[test]
    fn empty_truth_is_rejected() {
        let err = serde_yaml::from_str::<ScenarioFile>("id: 1\ntruth: {}").unwrap_err();
        assert!(err.to_string().contains("needs one of"), "{err}");
    }

    #[test]
    fn truth_serializes_as_single_key_map() {
        let truth = GroundTruth::Choice {
            options: vec!["scan".into(), "open".into()],
            best: "scan".into(),
        };
        let json = serde_json::to_value(&truth).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"choice": {"options": ["scan", "open"], "best": "scan"}})
        );
        let back: GroundTruth = serde_json::from_value(json).unwrap();
        assert_eq!(back, truth);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result: Result<ScenarioFile, _> = serde_yaml::from_str("id: 1\nanswer: true");
        assert!(result.is_err());
    }
}
