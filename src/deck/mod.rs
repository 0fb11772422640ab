//! Scenario decks
//!
//! A deck is the ordered, immutable list of scenarios one simulation walks
//! through. Decks are authored as YAML, validated when loaded, and never
//! change once a session holds them.
//!
//! # Architecture
//!
//! - [`record`] — Runtime types: [`Deck`], [`ScenarioRecord`], [`GroundTruth`], [`AnswerValue`]
//! - [`schema`] — Serde shape of a deck file
//! - [`loader`] — YAML parsing and validation into a [`Deck`]
//! - [`builtin`] — The six decks embedded in the binary

pub mod builtin;
pub mod loader;
pub mod record;
pub mod schema;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use builtin::{find_deck, list_decks, load_builtin, suggest_deck};
pub use loader::{load_deck_file, load_deck_str};
pub use record::{AnswerValue, Deck, GroundTruth, InputPredicate, PredicateVerdict, ScenarioRecord};

/// The six attack simulations offered by the trainer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum SimulationKind {
    /// Classify emails as phishing or legitimate.
    Phishing,
    /// Author a password strong enough to resist brute force.
    WeakPassword,
    /// Judge whether downloads and attachments are malicious.
    Malware,
    /// Bypass a vulnerable login form.
    SqlInjection,
    /// Respond to an unfolding ransomware infection.
    Ransomware,
    /// Handle pretexting calls and messages.
    SocialEngineering,
}

impl SimulationKind {
    /// Returns the wire name used by the backend and the CLI.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Phishing => "phishing",
            Self::WeakPassword => "weak_password",
            Self::Malware => "malware",
            Self::SqlInjection => "sql_injection",
            Self::Ransomware => "ransomware",
            Self::SocialEngineering => "social_engineering",
        }
    }

    /// Returns the human-readable category label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Phishing => "Phishing Detection",
            Self::WeakPassword => "Password Security",
            Self::Malware => "Malware Awareness",
            Self::SqlInjection => "SQL Injection",
            Self::Ransomware => "Ransomware Defense",
            Self::SocialEngineering => "Social Engineering",
        }
    }

    /// Returns all simulation kinds in dashboard order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Phishing,
            Self::WeakPassword,
            Self::Malware,
            Self::SqlInjection,
            Self::Ransomware,
            Self::SocialEngineering,
        ]
    }

    /// Parses a wire name back into a kind.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|k| k.as_str() == name)
    }
}

impl fmt::Display for SimulationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
