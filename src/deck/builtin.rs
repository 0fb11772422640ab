//! Built-in decks
//!
//! The six training decks embedded in the binary at compile time, so that
//! `cybersim run phishing` works without any files on disk.

use std::sync::LazyLock;

use crate::error::DeckError;

use super::SimulationKind;
use super::loader::{builtin_origin, load_deck_str};
use super::record::Deck;

// ============================================================================
// Types
// ============================================================================

/// A deck embedded in the binary.
#[derive(Debug)]
pub struct BuiltinDeck {
    /// Simulation the deck drives.
    pub kind: SimulationKind,

    /// Short human-readable description.
    pub description: &'static str,

    /// Tags for filtering.
    pub tags: &'static [&'static str],

    /// Raw YAML content (embedded at compile time).
    pub yaml: &'static str,
}

impl BuiltinDeck {
    /// Registry name (same as the simulation's wire name).
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.kind.as_str()
    }

    /// Parses and validates the embedded YAML.
    ///
    /// # Errors
    ///
    /// Returns a `DeckError` if the embedded deck is malformed.
    pub fn load(&self) -> Result<Deck, DeckError> {
        load_deck_str(self.yaml, &builtin_origin(self.name())).map(|r| r.deck)
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Global registry of all built-in decks, in dashboard order.
static BUILTIN_DECKS: LazyLock<Vec<BuiltinDeck>> = LazyLock::new(|| {
    vec![
        BuiltinDeck {
            kind: SimulationKind::Phishing,
            description: "Spot phishing emails among legitimate ones",
            tags: &["email", "binary"],
            yaml: include_str!("../../decks/phishing.yaml"),
        },
        BuiltinDeck {
            kind: SimulationKind::WeakPassword,
            description: "Build a password that survives a brute-force attack",
            tags: &["password", "free-text"],
            yaml: include_str!("../../decks/weak_password.yaml"),
        },
        BuiltinDeck {
            kind: SimulationKind::Malware,
            description: "Decide which downloads and devices are malicious",
            tags: &["endpoint", "binary"],
            yaml: include_str!("../../decks/malware.yaml"),
        },
        BuiltinDeck {
            kind: SimulationKind::SqlInjection,
            description: "Exploit a vulnerable login form, then learn the defenses",
            tags: &["web", "free-text", "exploit"],
            yaml: include_str!("../../decks/sql_injection.yaml"),
        },
        BuiltinDeck {
            kind: SimulationKind::Ransomware,
            description: "Choose the right response at each stage of an infection",
            tags: &["endpoint", "choice", "incident-response"],
            yaml: include_str!("../../decks/ransomware.yaml"),
        },
        BuiltinDeck {
            kind: SimulationKind::SocialEngineering,
            description: "Handle pretexting calls, emails and messages",
            tags: &["people", "choice"],
            yaml: include_str!("../../decks/social_engineering.yaml"),
        },
    ]
});

// ============================================================================
// Public API
// ============================================================================

/// Looks up a built-in deck by exact name.
#[must_use]
pub fn find_deck(name: &str) -> Option<&'static BuiltinDeck> {
    BUILTIN_DECKS.iter().find(|d| d.name() == name)
}

/// Loads the built-in deck for `kind`.
///
/// # Errors
///
/// Returns a `DeckError` if the embedded deck is malformed.
pub fn load_builtin(kind: SimulationKind) -> Result<Deck, DeckError> {
    BUILTIN_DECKS
        .iter()
        .find(|d| d.kind == kind)
        .ok_or_else(|| DeckError::UnknownSimulation {
            name: kind.to_string(),
            suggestion: None,
        })?
        .load()
}

/// Lists all built-in decks, optionally filtered by tag.
#[must_use]
pub fn list_decks(tag: Option<&str>) -> Vec<&'static BuiltinDeck> {
    BUILTIN_DECKS
        .iter()
        .filter(|d| tag.is_none_or(|t| d.tags.contains(&t)))
        .collect()
}

/// Suggests a similar deck name for typo correction.
///
/// Returns the closest match if its Damerau-Levenshtein distance is at most 3.
#[must_use]
pub fn suggest_deck(input: &str) -> Option<String> {
    BUILTIN_DECKS
        .iter()
        .map(|d| (d.name(), strsim::damerau_levenshtein(input, d.name())))
        .filter(|(_, dist)| *dist <= 3)
        .min_by_key(|(_, dist)| *dist)
        .map(|(name, _)| name.to_string())
}

/// Resolves a user-supplied name to a built-in deck, with a suggestion on miss.
///
/// # Errors
///
/// Returns `DeckError::UnknownSimulation` if no deck has this name.
pub fn resolve(name: &str) -> Result<&'static BuiltinDeck, DeckError> {
    find_deck(name).ok_or_else(|| DeckError::UnknownSimulation {
        name: name.to_string(),
        suggestion: suggest_deck(name),
    })
}

// ============================================================================
// Tests
// ============================================================================
