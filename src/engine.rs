//! Quality Assessment Engine
//!
//! Runs the metric checks over a candidate video, aggregates their
//! sub-scores into a weighted overall score with critical-issue
//! penalties, derives recommendations, and feeds the statistics
//! tracker. The engine always produces a report: decode and per-check
//! failures degrade the score instead of aborting.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::checks::{
    AdherenceModel, ArtifactCheck, AssessmentContext, Check, CheckKind, ClarityCheck,
    ColorBalanceCheck, DurationCheck, PromptAdherenceCheck, ResolutionCheck,
};
use crate::decode::{RawRgbDecoder, VideoDecoder};
use crate::error::QaResult;
use crate::report::{QualityIssue, QualityReport, SubScores, ACCEPTABLE_SCORE, PASS_SCORE};
use crate::rules::{RuleDefinition, RuleRegistry};
use crate::stats::{QualityStatistics, QualityTrends, StatisticsTracker};
use crate::types::{DecodedVideo, VideoMetadata};

// =============================================================================
// Aggregation constants
// =============================================================================

const WEIGHT_RESOLUTION: f64 = 0.15;
const WEIGHT_CLARITY: f64 = 0.25;
const WEIGHT_COLOR: f64 = 0.15;
const WEIGHT_COMPOSITION: f64 = 0.10;
const WEIGHT_PROMPT_ADHERENCE: f64 = 0.20;
const WEIGHT_TECHNICAL: f64 = 0.15;

/// Composition analysis is not implemented; a fixed reasonable score
/// keeps the weight table stable
const COMPOSITION_DEFAULT: f64 = 7.0;

/// Neutral technical score when neither duration nor artifact ran
const TECHNICAL_NEUTRAL: f64 = 5.0;

/// Multiplicative penalty applied once per critical issue present
const CRITICAL_PENALTY: f64 = 0.8;

/// Sub-score below which a clarity/color hint is added
const SUB_SCORE_HINT_THRESHOLD: f64 = 6.0;

// =============================================================================
// Validation requirements
// =============================================================================

/// Caller-specified acceptance requirements for a report
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QualityRequirements {
    /// Minimum overall score; defaults to the pass threshold when absent
    pub minimum_score: Option<f64>,
    /// Minimum resolution sub-score
    pub min_resolution_score: Option<f64>,
    /// Minimum clarity sub-score
    pub min_clarity_score: Option<f64>,
    /// Issues whose presence fails validation outright
    #[serde(default)]
    pub prohibited_issues: Vec<QualityIssue>,
    /// Maximum number of issues tolerated
    pub max_issues: Option<usize>,
}

/// Outcome of validating a report against requirements
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether every requirement held
    pub passed: bool,
    /// Human-readable description of each violated requirement
    pub violations: Vec<String>,
}

// =============================================================================
// Engine
// =============================================================================

/// Multi-check quality assessment pipeline
pub struct QualityEngine {
    /// Registered checks, run in order
    checks: Vec<Arc<dyn Check>>,
    /// Per-check thresholds and parameters
    rules: Arc<RwLock<RuleRegistry>>,
    /// Turns candidate bytes into frames
    decoder: Arc<dyn VideoDecoder>,
    /// Rolling counters and history ring
    stats: StatisticsTracker,
}

impl QualityEngine {
    /// Creates an engine with the built-in checks, default rule catalog,
    /// and the raw frame-stream reference decoder
    pub fn new() -> Self {
        Self::with_decoder(Arc::new(RawRgbDecoder::new()))
    }

    /// Creates an engine using a custom video decoder
    pub fn with_decoder(decoder: Arc<dyn VideoDecoder>) -> Self {
        let mut engine = Self {
            checks: Vec::new(),
            rules: Arc::new(RwLock::new(RuleRegistry::with_defaults())),
            decoder,
            stats: StatisticsTracker::new(),
        };
        engine.register_builtin_checks();
        engine
    }

    /// Swaps in a custom semantic adherence model
    pub fn with_adherence_model(mut self, model: Arc<dyn AdherenceModel>) -> Self {
        self.checks
            .retain(|c| c.kind() != CheckKind::PromptAdherence);
        self.checks
            .push(Arc::new(PromptAdherenceCheck::with_model(model)));
        self
    }

    fn register_builtin_checks(&mut self) {
        self.register_check(Arc::new(ResolutionCheck::new()));
        self.register_check(Arc::new(ClarityCheck::new()));
        self.register_check(Arc::new(ColorBalanceCheck::new()));
        self.register_check(Arc::new(DurationCheck::new()));
        self.register_check(Arc::new(ArtifactCheck::new()));
        self.register_check(Arc::new(PromptAdherenceCheck::new()));
    }

    /// Registers a check. A later check with the same kind overrides the
    /// slot result of an earlier one.
    pub fn register_check(&mut self, check: Arc<dyn Check>) {
        self.checks.push(check);
    }

    /// Kinds of all registered checks, in run order
    pub fn check_kinds(&self) -> Vec<CheckKind> {
        self.checks.iter().map(|c| c.kind()).collect()
    }

    // =========================================================================
    // Rule registry surface
    // =========================================================================

    /// Gets a copy of the rule for a check
    pub async fn rule(&self, check: CheckKind) -> Option<RuleDefinition> {
        self.rules.read().await.get(check).cloned()
    }

    /// Updates a single rule parameter at runtime
    pub async fn set_rule_param<T: Serialize>(
        &self,
        check: CheckKind,
        key: &str,
        value: T,
    ) -> QaResult<()> {
        self.rules.write().await.set_param(check, key, value)
    }

    /// Enables or disables a rule at runtime
    pub async fn set_rule_enabled(&self, check: CheckKind, enabled: bool) -> QaResult<()> {
        self.rules.write().await.set_enabled(check, enabled)
    }

    // =========================================================================
    // Assessment
    // =========================================================================

    /// Assesses a candidate video from raw bytes.
    ///
    /// Only invalid caller input (bad metadata) returns an error; an
    /// undecodable or empty video degrades into a corrupted-file report.
    pub async fn assess(
        &self,
        video: &[u8],
        metadata: &VideoMetadata,
        prompt: &str,
    ) -> QaResult<QualityReport> {
        let started = Instant::now();
        metadata.validate()?;

        let decoded = match self.decoder.decode(video) {
            Ok(v) => v,
            Err(e) => {
                error!("video decode failed: {e}");
                return Ok(self.corrupted_report(started));
            }
        };

        self.assess_frames(&decoded, metadata, prompt, started).await
    }

    /// Assesses an already decoded video, for embedders with their own
    /// decode pipeline.
    pub async fn assess_decoded(
        &self,
        video: &DecodedVideo,
        metadata: &VideoMetadata,
        prompt: &str,
    ) -> QaResult<QualityReport> {
        let started = Instant::now();
        metadata.validate()?;
        self.assess_frames(video, metadata, prompt, started).await
    }

    async fn assess_frames(
        &self,
        video: &DecodedVideo,
        metadata: &VideoMetadata,
        prompt: &str,
        started: Instant,
    ) -> QaResult<QualityReport> {
        if video.frame_count() == 0 {
            error!("decoded stream has no frames");
            return Ok(self.corrupted_report(started));
        }

        let ctx = AssessmentContext { metadata, prompt };
        let registry = self.rules.read().await;

        let mut issues: Vec<QualityIssue> = Vec::new();
        let push_issues = |issues: &mut Vec<QualityIssue>, new: &[QualityIssue]| {
            for issue in new {
                if !issues.contains(issue) {
                    issues.push(*issue);
                }
            }
        };

        let mut scores = SubScores::default();
        let mut duration_score: Option<f64> = None;
        let mut artifact_score: Option<f64> = None;

        for check in &self.checks {
            let kind = check.kind();
            if !registry.is_enabled(kind) {
                debug!(check = %kind, "check disabled, skipping");
                continue;
            }
            let Some(rule) = registry.get(kind) else {
                continue;
            };

            let (score, check_issues) = match check.run(video, &ctx, rule).await {
                Ok(outcome) => (outcome.score, outcome.issues),
                Err(e) => {
                    // Checks are isolated: degrade this slot and move on
                    warn!(check = %kind, "check failed: {e}");
                    (0.0, vec![Self::fallback_issue(kind)])
                }
            };
            push_issues(&mut issues, &check_issues);

            match kind {
                CheckKind::Resolution => scores.resolution = score,
                CheckKind::Clarity => scores.clarity = score,
                CheckKind::ColorBalance => scores.color = score,
                CheckKind::Duration => duration_score = Some(score),
                CheckKind::Artifact => artifact_score = Some(score),
                CheckKind::PromptAdherence => scores.prompt_adherence = score,
            }
        }
        drop(registry);

        scores.technical = match (duration_score, artifact_score) {
            (Some(d), Some(a)) => (d + a) / 2.0,
            (Some(d), None) => d,
            (None, Some(a)) => a,
            (None, None) => TECHNICAL_NEUTRAL,
        };
        scores.composition = COMPOSITION_DEFAULT;

        let overall = Self::aggregate(&scores, &issues);
        let recommendations = Self::build_recommendations(&scores, overall, &issues);

        let report = QualityReport {
            id: ulid::Ulid::new().to_string(),
            overall_score: overall,
            scores,
            issues,
            recommendations,
            assessed_at: Utc::now(),
            processing_ms: started.elapsed().as_millis() as u64,
        };

        self.stats.record(&report);
        info!(
            score = report.overall_score,
            issues = report.issues.len(),
            elapsed_ms = report.processing_ms,
            "quality assessment completed"
        );

        Ok(report)
    }

    /// Report for a video that never yielded frames: overall forced to
    /// zero with the corrupted-file issue
    fn corrupted_report(&self, started: Instant) -> QualityReport {
        let scores = SubScores::default();
        let issues = vec![QualityIssue::CorruptedFile];
        let recommendations = Self::build_recommendations(&scores, 0.0, &issues);

        let report = QualityReport {
            id: ulid::Ulid::new().to_string(),
            overall_score: 0.0,
            scores,
            issues,
            recommendations,
            assessed_at: Utc::now(),
            processing_ms: started.elapsed().as_millis() as u64,
        };
        self.stats.record(&report);
        report
    }

    /// Best-effort issue when a check fails internally
    fn fallback_issue(kind: CheckKind) -> QualityIssue {
        match kind {
            CheckKind::Resolution => QualityIssue::CorruptedFile,
            _ => QualityIssue::TechnicalArtifact,
        }
    }

    // =========================================================================
    // Aggregation
    // =========================================================================

    /// Weighted sum of sub-scores with one multiplicative penalty per
    /// critical issue present, clamped to `[0, 10]`
    fn aggregate(scores: &SubScores, issues: &[QualityIssue]) -> f64 {
        let weighted = WEIGHT_RESOLUTION * scores.resolution
            + WEIGHT_CLARITY * scores.clarity
            + WEIGHT_COLOR * scores.color
            + WEIGHT_COMPOSITION * scores.composition
            + WEIGHT_PROMPT_ADHERENCE * scores.prompt_adherence
            + WEIGHT_TECHNICAL * scores.technical;

        let penalized = issues
            .iter()
            .filter(|i| i.is_critical())
            .fold(weighted, |acc, _| acc * CRITICAL_PENALTY);

        penalized.clamp(0.0, 10.0)
    }

    /// Static issue-to-message table; total over every issue kind
    fn recommendations_for(issue: QualityIssue) -> &'static [&'static str] {
        match issue {
            QualityIssue::LowResolution => &[
                "Increase output resolution to at least 1280x720",
                "Consider using 'high quality' or 'HD' in prompt",
            ],
            QualityIssue::BlurryContent => &[
                "Add 'sharp focus', 'crisp details' to prompt",
                "Avoid motion blur keywords unless desired",
            ],
            QualityIssue::ColorImbalance => &[
                "Improve color balance with 'natural colors' in prompt",
                "Consider specifying lighting conditions",
            ],
            QualityIssue::DurationMismatch => &[
                "Verify the duration parameter sent to the generation service",
                "Check generation service configuration",
            ],
            QualityIssue::TechnicalArtifact => &[
                "Try higher quality generation settings",
                "Consider regenerating with different parameters",
            ],
            QualityIssue::PromptMismatch => &[
                "Simplify prompt for better adherence",
                "Use more specific, visual descriptors",
                "Avoid conflicting or abstract concepts",
            ],
            QualityIssue::CorruptedFile => &[
                "Video file could not be decoded - regenerate the output",
                "Verify the generation service produced a complete file",
            ],
            QualityIssue::ContentInappropriate => &[
                "Review content policy filters on the generation request",
                "Flag the output for manual review",
            ],
        }
    }

    /// Union of per-issue messages plus score-conditional hints,
    /// deduplicated in first-seen order
    fn build_recommendations(
        scores: &SubScores,
        overall: f64,
        issues: &[QualityIssue],
    ) -> Vec<String> {
        let mut recommendations: Vec<String> = Vec::new();
        let push = |msg: &str, recommendations: &mut Vec<String>| {
            if !recommendations.iter().any(|r| r == msg) {
                recommendations.push(msg.to_string());
            }
        };

        for issue in issues {
            for msg in Self::recommendations_for(*issue) {
                push(msg, &mut recommendations);
            }
        }

        if overall < ACCEPTABLE_SCORE {
            push(
                "Overall quality below acceptable threshold - consider regeneration",
                &mut recommendations,
            );
        }
        if scores.clarity < SUB_SCORE_HINT_THRESHOLD {
            push(
                "Focus on clarity-enhancing keywords in prompt",
                &mut recommendations,
            );
        }
        if scores.color < SUB_SCORE_HINT_THRESHOLD {
            push(
                "Specify desired color palette or lighting mood",
                &mut recommendations,
            );
        }

        recommendations
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Validates a report against caller-specified requirements
    pub fn validate(
        &self,
        report: &QualityReport,
        requirements: &QualityRequirements,
    ) -> ValidationResult {
        let mut violations = Vec::new();

        let min_score = requirements.minimum_score.unwrap_or(PASS_SCORE);
        if report.overall_score < min_score {
            violations.push(format!(
                "Overall score {:.1} below minimum {:.1}",
                report.overall_score, min_score
            ));
        }

        if let Some(min) = requirements.min_resolution_score {
            if report.scores.resolution < min {
                violations.push(format!(
                    "Resolution score {:.1} below minimum {:.1}",
                    report.scores.resolution, min
                ));
            }
        }

        if let Some(min) = requirements.min_clarity_score {
            if report.scores.clarity < min {
                violations.push(format!(
                    "Clarity score {:.1} below minimum {:.1}",
                    report.scores.clarity, min
                ));
            }
        }

        for issue in &requirements.prohibited_issues {
            if report.has_issue(*issue) {
                violations.push(format!("Prohibited issue detected: {}", issue));
            }
        }

        if let Some(max) = requirements.max_issues {
            if report.issues.len() > max {
                violations.push(format!(
                    "Too many quality issues: {} > {}",
                    report.issues.len(),
                    max
                ));
            }
        }

        ValidationResult {
            passed: violations.is_empty(),
            violations,
        }
    }

    // =========================================================================
    // Statistics surface
    // =========================================================================

    /// Snapshot of the rolling counters
    pub fn statistics(&self) -> QualityStatistics {
        self.stats.statistics()
    }

    /// Quality trends over the last `days` days
    pub fn trends(&self, days: i64) -> Option<QualityTrends> {
        self.stats.trends(days)
    }

    /// The tracker owning counters and the history ring
    pub fn stats_tracker(&self) -> &StatisticsTracker {
        &self.stats
    }
}

impl Default for QualityEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
