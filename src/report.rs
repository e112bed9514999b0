//! Quality Report Types
//!
//! Issues, sub-scores, and the assessment report produced once per call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Overall score at or above this value counts as a passing assessment
pub const PASS_SCORE: f64 = 6.0;

/// Overall score below this value triggers a regeneration recommendation
pub const ACCEPTABLE_SCORE: f64 = 7.5;

/// Overall score at or above this value counts as excellent
pub const EXCELLENT_SCORE: f64 = 9.0;

// =============================================================================
// Issues
// =============================================================================

/// A discrete quality problem flagged by a check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityIssue {
    /// Resolution below the configured minimum
    LowResolution,
    /// Focus measure below the blur threshold
    BlurryContent,
    /// Color channels out of balance
    ColorImbalance,
    /// Measured duration deviates from the declared duration
    DurationMismatch,
    /// Compression artifacts or glitches detected
    TechnicalArtifact,
    /// Video does not appear to match the prompt
    PromptMismatch,
    /// Video bytes could not be decoded
    CorruptedFile,
    /// Content flagged as inappropriate
    ContentInappropriate,
}

impl QualityIssue {
    /// All issue kinds, for exhaustive table checks
    pub const ALL: [QualityIssue; 8] = [
        QualityIssue::LowResolution,
        QualityIssue::BlurryContent,
        QualityIssue::ColorImbalance,
        QualityIssue::DurationMismatch,
        QualityIssue::TechnicalArtifact,
        QualityIssue::PromptMismatch,
        QualityIssue::CorruptedFile,
        QualityIssue::ContentInappropriate,
    ];

    /// Stable snake_case identifier, matches the serde representation
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityIssue::LowResolution => "low_resolution",
            QualityIssue::BlurryContent => "blurry_content",
            QualityIssue::ColorImbalance => "color_imbalance",
            QualityIssue::DurationMismatch => "duration_mismatch",
            QualityIssue::TechnicalArtifact => "technical_artifact",
            QualityIssue::PromptMismatch => "prompt_mismatch",
            QualityIssue::CorruptedFile => "corrupted_file",
            QualityIssue::ContentInappropriate => "content_inappropriate",
        }
    }

    /// Whether this issue triggers the multiplicative overall-score penalty
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            QualityIssue::CorruptedFile | QualityIssue::DurationMismatch
        )
    }
}

impl std::fmt::Display for QualityIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Scores
// =============================================================================

/// The six named sub-scores, each in `[0, 10]`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
    pub resolution: f64,
    pub clarity: f64,
    pub color: f64,
    pub composition: f64,
    pub prompt_adherence: f64,
    pub technical: f64,
}

// =============================================================================
// Report
// =============================================================================

/// Result of one quality assessment, immutable once created
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    /// Unique report ID (ULID)
    pub id: String,
    /// Weighted, penalty-adjusted overall score in `[0, 10]`
    pub overall_score: f64,
    /// Per-check sub-scores
    pub scores: SubScores,
    /// Issues found, deduplicated, in detection order
    pub issues: Vec<QualityIssue>,
    /// Deduplicated improvement recommendations
    pub recommendations: Vec<String>,
    /// When the assessment ran
    pub assessed_at: DateTime<Utc>,
    /// Wall-clock processing time in milliseconds
    pub processing_ms: u64,
}

impl QualityReport {
    /// Whether a specific issue was flagged
    pub fn has_issue(&self, issue: QualityIssue) -> bool {
        self.issues.contains(&issue)
    }

    /// Whether the assessment passed the minimum score threshold
    pub fn is_passing(&self) -> bool {
        self.overall_score >= PASS_SCORE
    }

    /// Number of critical issues present
    pub fn critical_issue_count(&self) -> usize {
        self.issues.iter().filter(|i| i.is_critical()).count()
    }

    /// Generates a one-line summary string
    pub fn summary(&self) -> String {
        format!(
            "Quality: {} (score {:.2}, {} issues, {}ms)",
            if self.is_passing() { "PASSED" } else { "FAILED" },
            self.overall_score,
            self.issues.len(),
            self.processing_ms
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
