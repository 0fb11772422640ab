//! SQL injection detection for the vulnerable-login exercise.

use serde::Serialize;

/// Inputs that bypass the exercise's string-concatenated login query.
pub const SQL_INJECTION_PATTERNS: [&str; 5] = [
    "' OR '1'='1",
    "' OR 1=1--",
    "admin'--",
    "' OR 'a'='a",
    "1' OR '1'='1",
];

/// Returns `true` if `input` contains any known injection pattern.
#[must_use]
pub fn detect_injection(input: &str) -> bool {
    SQL_INJECTION_PATTERNS.iter().any(|p| input.contains(p))
}

/// A single submission of the login form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoginAttempt {
    /// Username field.
    pub username: String,
    /// Password field.
    pub password: String,
}

impl LoginAttempt {
    /// Creates an attempt from the two form fields.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Whether either field exploits the query.
    #[must_use]
    pub fn exploit_succeeded(&self) -> bool {
        detect_injection(&self.username) || detect_injection(&self.password)
    }

    /// Joins both fields into the free-text input a session evaluates.
    ///
    /// Fields are separated by a newline, which no pattern contains, so a
    /// match can never straddle the two fields.
    #[must_use]
    pub fn as_input(&self) -> String {
        format!("{}\n{}", self.username, self.password)
    }

    /// Splits a session input back into its fields.
    #[must_use]
    pub fn from_input(input: &str) -> Self {
        let (username, password) = input.split_once('\n').unwrap_or((input, ""));
        Self::new(username, password)
    }

    /// The query the vulnerable backend would run for this attempt.
    #[must_use]
    pub fn vulnerable_query(&self) -> String {
        format!(
            "SELECT * FROM users WHERE username = '{}' AND password = '{}'",
            self.username, self.password
        )
    }
}
