//! User profile and vulnerability breakdown.
//!
//! Mirrors the records the backend keeps per user: a profile with the
//! simulations completed so far, and one score per simulation category
//! from which the overall score and status are derived.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::deck::SimulationKind;

// ============================================================================
// Profile
// ============================================================================

/// A trainee as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Backend-assigned identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Creation time, when the backend reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Sum of every recorded simulation score.
    #[serde(default)]
    pub total_score: u32,
    /// Wire names of completed simulations, each listed once.
    #[serde(default)]
    pub completed_simulations: Vec<String>,
}

impl Profile {
    /// Applies one finished simulation the way the backend does.
    pub fn record_completion(&mut self, kind: SimulationKind, score: u8) {
        self.total_score = self.total_score.saturating_add(u32::from(score));
        if !self.has_completed(kind) {
            self.completed_simulations.push(kind.as_str().to_owned());
        }
    }

    /// Whether `kind` appears among the completed simulations.
    #[must_use]
    pub fn has_completed(&self, kind: SimulationKind) -> bool {
        self.completed_simulations.iter().any(|s| s == kind.as_str())
    }

    /// Completed simulations that are known kinds, in dashboard order.
    #[must_use]
    pub fn completed_kinds(&self) -> Vec<SimulationKind> {
        SimulationKind::all()
            .iter()
            .copied()
            .filter(|k| self.has_completed(*k))
            .collect()
    }

    /// Whether every simulation has been completed.
    #[must_use]
    pub fn certificate_eligible(&self) -> bool {
        certificate_eligible(&self.completed_kinds())
    }
}

/// Whether `completed` covers all six simulations.
#[must_use]
pub fn certificate_eligible(completed: &[SimulationKind]) -> bool {
    SimulationKind::all().iter().all(|k| completed.contains(k))
}

// ============================================================================
// Certificate
// ============================================================================

/// Completion certificate issued once every simulation is done.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    /// Backend-assigned identifier.
    #[serde(default)]
    pub id: String,
    /// Owner of the certificate.
    pub user_id: String,
    /// Issue time.
    pub issued_date: DateTime<Utc>,
    /// Printed number, e.g. `CYBER-12345`.
    pub certificate_number: String,
}

// ============================================================================
// Score Breakdown
// ============================================================================

/// Latest score per simulation category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Owner of the scores.
    #[serde(default)]
    pub user_id: String,
    /// Mean of the non-zero category scores.
    #[serde(default)]
    pub overall_score: u8,
    /// Phishing category.
    #[serde(default)]
    pub phishing_score: u8,
    /// Password category.
    #[serde(default)]
    pub password_score: u8,
    /// Malware category.
    #[serde(default)]
    pub malware_score: u8,
    /// SQL injection category.
    #[serde(default)]
    pub sql_injection_score: u8,
    /// Ransomware category.
    #[serde(default)]
    pub ransomware_score: u8,
    /// Social engineering category.
    #[serde(default)]
    pub social_engineering_score: u8,
}

impl ScoreBreakdown {
    /// Empty breakdown for `user_id`.
    #[must_use]
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Self::default()
        }
    }

    /// Score recorded for `kind`.
    #[must_use]
    pub const fn score(&self, kind: SimulationKind) -> u8 {
        match kind {
            SimulationKind::Phishing => self.phishing_score,
            SimulationKind::WeakPassword => self.password_score,
            SimulationKind::Malware => self.malware_score,
            SimulationKind::SqlInjection => self.sql_injection_score,
            SimulationKind::Ransomware => self.ransomware_score,
            SimulationKind::SocialEngineering => self.social_engineering_score,
        }
    }

    const fn slot(&mut self, kind: SimulationKind) -> &mut u8 {
        match kind {
            SimulationKind::Phishing => &mut self.phishing_score,
            SimulationKind::WeakPassword => &mut self.password_score,
            SimulationKind::Malware => &mut self.malware_score,
            SimulationKind::SqlInjection => &mut self.sql_injection_score,
            SimulationKind::Ransomware => &mut self.ransomware_score,
            SimulationKind::SocialEngineering => &mut self.social_engineering_score,
        }
    }

    /// Replaces the score for `kind` and recomputes the overall score.
    pub fn record(&mut self, kind: SimulationKind, score: u8) {
        *self.slot(kind) = score.min(100);
        self.overall_score = self.compute_overall();
    }

    /// Sum of category scores divided by the number of non-zero ones.
    ///
    /// Integer division; 0 when no category has a score.
    #[must_use]
    pub fn compute_overall(&self) -> u8 {
        let scores: Vec<u32> = SimulationKind::all()
            .iter()
            .map(|k| u32::from(self.score(*k)))
            .collect();
        let scored = scores.iter().filter(|s| **s > 0).count();
        if scored == 0 {
            return 0;
        }
        let mean = scores.iter().sum::<u32>() / u32::try_from(scored).unwrap_or(1);
        u8::try_from(mean.min(100)).unwrap_or(100)
    }

    /// Status for the overall score.
    #[must_use]
    pub const fn status(&self) -> Status {
        Status::from_score(self.overall_score)
    }
}

// ============================================================================
// Status
// ============================================================================

/// Qualitative security posture derived from a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// 80 and above.
    Excellent,
    /// 60 to 79.
    Good,
    /// 40 to 59.
    Fair,
    /// Below 40.
    NeedsImprovement,
}

impl Status {
    /// Buckets a score.
    #[must_use]
    pub const fn from_score(score: u8) -> Self {
        match score {
            80.. => Self::Excellent,
            60..80 => Self::Good,
            40..60 => Self::Fair,
            _ => Self::NeedsImprovement,
        }
    }

    /// Display text.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::NeedsImprovement => "Needs Improvement",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
