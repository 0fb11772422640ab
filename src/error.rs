//! Error types for `cybersim`
//!
//! Deck authoring errors, session contract violations and collaborator
//! failures, aggregated into [`CybersimError`] with a CLI exit-code mapping.

use std::path::PathBuf;
use thiserror::Error;

use crate::session::Phase;

// ============================================================================
// Exit Codes
// ============================================================================

/// Exit codes for `cybersim` CLI operations.
///
/// These codes follow Unix conventions.
pub struct ExitCode;

impl ExitCode {
    /// Successful execution
    pub const SUCCESS: i32 = 0;

    /// General error
    pub const ERROR: i32 = 1;

    /// Deck error (invalid YAML, validation failure)
    pub const DECK_ERROR: i32 = 2;

    /// I/O error (file not found, permission denied)
    pub const IO_ERROR: i32 = 3;

    /// Backend API error (connection failed, bad status)
    pub const API_ERROR: i32 = 4;

    /// Session contract violation (wrong phase, double submit)
    pub const SESSION_ERROR: i32 = 5;

    /// Usage error (invalid arguments, missing required options)
    pub const USAGE_ERROR: i32 = 64;

    /// Interrupted by SIGINT (Ctrl+C)
    pub const INTERRUPTED: i32 = 130;

    /// Terminated by SIGTERM
    pub const TERMINATED: i32 = 143;
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// Top-level error type for `cybersim` operations.
///
/// Aggregates the domain-specific errors and maps each to an exit code.
#[derive(Debug, Error)]
pub enum CybersimError {
    /// Deck loading or validation error
    #[error(transparent)]
    Deck(#[from] DeckError),

    /// Session contract violation
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Backend API error
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Invalid command-line usage that clap could not catch
    #[error("usage error: {0}")]
    Usage(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CybersimError {
    /// Returns the appropriate exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Deck(_) => ExitCode::DECK_ERROR,
            Self::Session(_) => ExitCode::SESSION_ERROR,
            Self::Api(_) => ExitCode::API_ERROR,
            Self::Usage(_) => ExitCode::USAGE_ERROR,
            Self::Io(_) => ExitCode::IO_ERROR,
            Self::Json(_) => ExitCode::ERROR,
        }
    }
}

// ============================================================================
// Deck Errors
// ============================================================================

/// Malformed deck data.
///
/// Always raised while a deck is built or loaded, before any session
/// can be created from it.
#[derive(Debug, Error)]
pub enum DeckError {
    /// YAML parsing failed
    #[error("parse error in {path}: {message}")]
    ParseError {
        /// Path to the deck file (`<builtin:name>` for embedded decks)
        path: PathBuf,
        /// Line number where the error occurred (if available)
        line: Option<usize>,
        /// Error message from the parser
        message: String,
    },

    /// Deck validation failed
    #[error("validation failed for {path}")]
    ValidationError {
        /// Path or name of the deck
        path: String,
        /// List of validation issues found
        errors: Vec<ValidationIssue>,
    },

    /// Deck file not found
    #[error("file not found: {path}")]
    MissingFile {
        /// Path to the missing file
        path: PathBuf,
    },

    /// No built-in deck exists under this name
    #[error("unknown simulation '{name}'{}", suggestion_suffix(.suggestion.as_deref()))]
    UnknownSimulation {
        /// Name the caller asked for
        name: String,
        /// Closest built-in name, if any is close enough
        suggestion: Option<String>,
    },
}

fn suggestion_suffix(suggestion: Option<&str>) -> String {
    suggestion.map_or_else(String::new, |s| format!(" (did you mean '{s}'?)"))
}

impl DeckError {
    /// Returns the validation issues carried by this error, if any.
    #[must_use]
    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            Self::ValidationError { errors, .. } => errors,
            _ => &[],
        }
    }
}

// ============================================================================
// Validation Types
// ============================================================================

/// A single validation issue found while checking a deck.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Path to the problematic field (e.g., "scenarios[2].truth.choice.best")
    pub path: String,
    /// Description of the validation issue
    pub message: String,
    /// Severity level of the issue
    pub severity: Severity,
}

impl ValidationIssue {
    /// Creates an error-severity issue.
    #[must_use]
    pub fn error(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            severity: Severity::Error,
        }
    }

    /// Creates a warning-severity issue.
    #[must_use]
    pub fn warning(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            severity: Severity::Warning,
        }
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {} at {}", prefix, self.message, self.path)
    }
}

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Prevents the deck from being used
    Error,
    /// Worth reporting, does not block loading
    Warning,
}

// ============================================================================
// Session Errors
// ============================================================================

/// Session state machine contract violations.
///
/// A rejected call never mutates the session: the answer map, cursor and
/// phase are exactly as they were before the call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    /// `start` was called on a session that already left `NotStarted`
    #[error("session already started")]
    AlreadyStarted,

    /// Operation is not valid in the current phase
    #[error("{operation} is not allowed while {phase}")]
    WrongPhase {
        /// Operation that was attempted
        operation: &'static str,
        /// Phase the session was in
        phase: Phase,
    },

    /// The current scenario already has a recorded answer
    #[error("scenario {scenario_id} already answered")]
    AlreadyAnswered {
        /// Id of the scenario
        scenario_id: u32,
    },

    /// Answer shape does not fit the scenario's ground truth
    #[error("expected a {expected} answer, got {actual}")]
    AnswerShapeMismatch {
        /// Shape the ground truth accepts
        expected: &'static str,
        /// Shape that was submitted
        actual: &'static str,
    },

    /// Choice token is not part of the scenario's option set
    #[error("'{token}' is not one of the options {options:?}")]
    UnknownOption {
        /// Submitted token
        token: String,
        /// Valid tokens for this scenario
        options: Vec<String>,
    },

    /// Probing is only meaningful for free-text scenarios
    #[error("scenario {scenario_id} does not accept free-text probes")]
    ProbeNotSupported {
        /// Id of the scenario
        scenario_id: u32,
    },

    /// The outcome has already been handed out
    #[error("simulation outcome already taken")]
    OutcomeAlreadyTaken,
}

// ============================================================================
// API Errors
// ============================================================================

/// Backend collaborator errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network failure, timeout or server-side error; worth retrying later
    #[error("transient failure: {0}")]
    Transient(String),

    /// Non-2xx status that is not a server-side error
    #[error("HTTP status {0}")]
    HttpStatus(u16),

    /// Response body could not be parsed
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// No backend URL was configured
    #[error("backend API not configured")]
    NotConfigured,
}

impl ApiError {
    /// Returns `true` for failures that may succeed on a later attempt.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

// ============================================================================
// Result Type Alias
// ============================================================================

/// Result type alias for `cybersim` operations.
pub type Result<T> = std::result::Result<T, CybersimError>;

// ============================================================================
// Tests
// ============================================================================
