//! Deck loading pipeline.
//!
//! Reads a deck file, parses it as YAML, checks every field and returns a
//! frozen [`Deck`]. All problems surface here, before a session exists.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{DeckError, Severity, ValidationIssue};
use crate::scoring::ScoringStrategy;

use super::record::{Deck, ScenarioRecord, check_scenarios};
use super::schema::DeckFile;

/// Largest deck file accepted, in bytes.
pub const MAX_DECK_SIZE: u64 = 1024 * 1024;

/// A loaded deck plus the non-fatal issues found along the way.
#[derive(Debug)]
pub struct LoadResult {
    /// The validated deck.
    pub deck: Deck,
    /// Warning-severity issues.
    pub warnings: Vec<ValidationIssue>,
}

/// Loads and validates a deck file.
///
/// # Errors
///
/// Returns `DeckError::MissingFile` if the file cannot be read,
/// `DeckError::ParseError` on malformed YAML and
/// `DeckError::ValidationError` when the deck breaks a structural rule.
pub fn load_deck_file(path: &Path) -> Result<LoadResult, DeckError> {
    let metadata = std::fs::metadata(path).map_err(|_| DeckError::MissingFile {
        path: path.to_path_buf(),
    })?;
    if metadata.len() > MAX_DECK_SIZE {
        return Err(DeckError::ParseError {
            path: path.to_path_buf(),
            line: None,
            message: format!(
                "deck is {} bytes, limit is {MAX_DECK_SIZE}",
                metadata.len()
            ),
        });
    }

    let raw = std::fs::read_to_string(path).map_err(|_| DeckError::MissingFile {
        path: path.to_path_buf(),
    })?;
    debug!(path = %path.display(), bytes = raw.len(), "loading deck file");
    load_deck_str(&raw, path)
}

/// Parses and validates deck YAML. `origin` is used in error messages.
///
/// # Errors
///
/// Returns `DeckError::ParseError` on malformed YAML and
/// `DeckError::ValidationError` when the deck breaks a structural rule.
pub fn load_deck_str(yaml: &str, origin: &Path) -> Result<LoadResult, DeckError> {
    let yaml = yaml.strip_prefix('\u{feff}').unwrap_or(yaml);
    if yaml.trim().is_empty() {
        return Err(DeckError::ParseError {
            path: origin.to_path_buf(),
            line: None,
            message: "deck file is empty".to_string(),
        });
    }

    let file: DeckFile = serde_yaml::from_str(yaml).map_err(|e| DeckError::ParseError {
        path: origin.to_path_buf(),
        line: e.location().map(|l| l.line()),
        message: e.to_string(),
    })?;

    build_deck(file, origin)
}

/// Converts a parsed [`DeckFile`] into a [`Deck`], collecting every issue.
fn build_deck(file: DeckFile, origin: &Path) -> Result<LoadResult, DeckError> {
    let mut issues = Vec::new();

    let pass_threshold = match file.pass_threshold {
        Some(t) if t <= 100 => u8::try_from(t).unwrap_or(100),
        Some(t) => {
            issues.push(ValidationIssue::error(
                "pass_threshold",
                format!("threshold {t} exceeds 100"),
            ));
            0
        }
        None => {
            issues.push(ValidationIssue::error(
                "pass_threshold",
                "pass threshold is required",
            ));
            0
        }
    };

    let scoring = file.scoring.unwrap_or_else(|| {
        issues.push(ValidationIssue::error(
            "scoring",
            "scoring strategy is required",
        ));
        ScoringStrategy::default()
    });

    let title = match file.title {
        Some(t) if !t.trim().is_empty() => t,
        _ => {
            issues.push(ValidationIssue::warning(
                "title",
                "deck title missing, using the simulation label",
            ));
            file.simulation.label().to_string()
        }
    };

    let mut scenarios = Vec::with_capacity(file.scenarios.len());
    for (i, scenario) in file.scenarios.into_iter().enumerate() {
        let Some(truth) = scenario.truth else {
            issues.push(ValidationIssue::error(
                format!("scenarios[{i}].truth"),
                "ground truth is missing",
            ));
            continue;
        };
        scenarios.push(ScenarioRecord {
            id: scenario.id,
            title: scenario.title,
            prompt: scenario.prompt,
            truth,
            explanation: scenario.explanation,
        });
    }

    // Structural checks only make sense once every scenario has a truth.
    if !issues.iter().any(|i| i.path.ends_with(".truth")) {
        check_scenarios(&scenarios, &scoring, &mut issues);
    }

    let (errors, warnings): (Vec<_>, Vec<_>) = issues
        .into_iter()
        .partition(|i| i.severity == Severity::Error);
    if !errors.is_empty() {
        return Err(DeckError::ValidationError {
            path: origin.display().to_string(),
            errors,
        });
    }

    // Re-validates, which cannot fail after the checks above.
    let deck = Deck::new(file.simulation, title, pass_threshold, scoring, scenarios)?;
    debug!(
        deck = %deck.kind(),
        scenarios = deck.len(),
        warnings = warnings.len(),
        "deck loaded"
    );
    Ok(LoadResult { deck, warnings })
}

/// Origin path used for decks embedded in the binary.
#[must_use]
pub fn builtin_origin(name: &str) -> PathBuf {
    PathBuf::from(format!("<builtin:{name}>"))
}
