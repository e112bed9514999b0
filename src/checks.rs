//! Metric Checks
//!
//! Built-in quality checks for generated video assessment.
//! Each check implements the [`Check`] trait, consults its rule in the
//! registry for thresholds, and produces a bounded sub-score plus zero
//! or more issues. Checks are isolated from one another: an internal
//! failure never aborts the pipeline.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::QaResult;
use crate::report::QualityIssue;
use crate::rules::RuleDefinition;
use crate::sampler::sample_indices;
use crate::types::{DecodedVideo, Frame, VideoMetadata};

/// Identifies a metric check and keys its rule in the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    Resolution,
    Clarity,
    ColorBalance,
    Duration,
    Artifact,
    PromptAdherence,
}

impl CheckKind {
    /// All check kinds in pipeline order
    pub const ALL: [CheckKind; 6] = [
        CheckKind::Resolution,
        CheckKind::Clarity,
        CheckKind::ColorBalance,
        CheckKind::Duration,
        CheckKind::Artifact,
        CheckKind::PromptAdherence,
    ];

    /// The registry rule id for this check
    pub fn rule_id(&self) -> &'static str {
        match self {
            CheckKind::Resolution => "resolution_check",
            CheckKind::Clarity => "clarity_check",
            CheckKind::ColorBalance => "color_balance_check",
            CheckKind::Duration => "duration_check",
            CheckKind::Artifact => "technical_artifacts_check",
            CheckKind::PromptAdherence => "prompt_adherence_check",
        }
    }
}

impl std::fmt::Display for CheckKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.rule_id())
    }
}

/// What a single check produced: a bounded sub-score plus any issues
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutcome {
    /// Sub-score in `[0, 10]`
    pub score: f64,
    /// Issues flagged by this check
    pub issues: Vec<QualityIssue>,
}

impl CheckOutcome {
    /// Creates an outcome with no issues, clamping the score to `[0, 10]`
    pub fn new(score: f64) -> Self {
        Self {
            score: score.clamp(0.0, 10.0),
            issues: Vec::new(),
        }
    }

    /// Adds an issue to the outcome
    pub fn with_issue(mut self, issue: QualityIssue) -> Self {
        self.issues.push(issue);
        self
    }
}

/// Caller-supplied context shared by all checks in one assessment
#[derive(Debug, Clone, Copy)]
pub struct AssessmentContext<'a> {
    /// Metadata declared by the generation service
    pub metadata: &'a VideoMetadata,
    /// The prompt the video was generated from
    pub prompt: &'a str,
}

/// Trait for all metric checks
#[async_trait]
pub trait Check: Send + Sync {
    /// Which check this is; keys the rule registry and the score slot
    fn kind(&self) -> CheckKind;

    /// Returns a human-readable description
    fn description(&self) -> &str;

    /// Analyzes the video and produces a sub-score plus issues.
    ///
    /// An `Err` is treated as a partial check failure by the engine:
    /// the slot degrades to 0.0 with a best-effort issue and the
    /// remaining checks still run.
    async fn run(
        &self,
        video: &DecodedVideo,
        ctx: &AssessmentContext<'_>,
        rule: &RuleDefinition,
    ) -> QaResult<CheckOutcome>;
}

// ============================================================================
// Analysis helpers
// ============================================================================

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64
}

/// Discrete-Laplacian focus measure: variance of the 4-neighbor second
/// derivative over the grayscale plane. Low values mean soft or blurred
/// content. Frames smaller than 3x3 have no interior and measure 0.
fn focus_measure(frame: &Frame) -> f64 {
    let (w, h) = (frame.width as usize, frame.height as usize);
    if w < 3 || h < 3 {
        return 0.0;
    }
    let luma = frame.luma_plane();
    let mut laplacian = Vec::with_capacity((w - 2) * (h - 2));
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let c = luma[y * w + x];
            let lap = 4.0 * c
                - luma[(y - 1) * w + x]
                - luma[(y + 1) * w + x]
                - luma[y * w + x - 1]
                - luma[y * w + x + 1];
            laplacian.push(lap);
        }
    }
    variance(&laplacian)
}

/// Gradient-dispersion artifact measure in `[0, 1]`.
///
/// Two orthogonal 3x3 first-derivative (Sobel) kernels produce a
/// gradient-magnitude field; a high ratio of magnitude spread to mean
/// magnitude indicates blocking artifacts and glitches.
fn artifact_measure(frame: &Frame) -> f64 {
    let (w, h) = (frame.width as usize, frame.height as usize);
    if w < 3 || h < 3 {
        return 0.0;
    }
    let luma = frame.luma_plane();
    let px = |x: usize, y: usize| luma[y * w + x];

    let mut magnitudes = Vec::with_capacity((w - 2) * (h - 2));
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let gx = (px(x + 1, y - 1) + 2.0 * px(x + 1, y) + px(x + 1, y + 1))
                - (px(x - 1, y - 1) + 2.0 * px(x - 1, y) + px(x - 1, y + 1));
            let gy = (px(x - 1, y + 1) + 2.0 * px(x, y + 1) + px(x + 1, y + 1))
                - (px(x - 1, y - 1) + 2.0 * px(x, y - 1) + px(x + 1, y - 1));
            magnitudes.push((gx * gx + gy * gy).sqrt());
        }
    }

    let m = mean(&magnitudes);
    if m <= f64::EPSILON {
        // No gradient energy at all: nothing to misinterpret as blocking
        return 0.0;
    }
    let std_dev = variance(&magnitudes).sqrt();
    (std_dev / m / 2.0).clamp(0.0, 1.0)
}

// ============================================================================
// ResolutionCheck - Verifies resolution meets the configured minimum
// ============================================================================

/// Check that scores the stream resolution against a minimum
#[derive(Debug, Default)]
pub struct ResolutionCheck;

impl ResolutionCheck {
    /// Creates a new ResolutionCheck
    pub fn new() -> Self {
        Self
    }

    const DEFAULT_MIN_WIDTH: u32 = 1280;
    const DEFAULT_MIN_HEIGHT: u32 = 720;
}

#[async_trait]
impl Check for ResolutionCheck {
    fn kind(&self) -> CheckKind {
        CheckKind::Resolution
    }

    fn description(&self) -> &str {
        "Verifies video resolution meets minimum requirements"
    }

    async fn run(
        &self,
        video: &DecodedVideo,
        _ctx: &AssessmentContext<'_>,
        rule: &RuleDefinition,
    ) -> QaResult<CheckOutcome> {
        let min_width = rule
            .get_param::<u32>("min_width")
            .unwrap_or(Self::DEFAULT_MIN_WIDTH);
        let min_height = rule
            .get_param::<u32>("min_height")
            .unwrap_or(Self::DEFAULT_MIN_HEIGHT);

        let width_score = (video.width as f64 / min_width as f64).min(1.0);
        let height_score = (video.height as f64 / min_height as f64).min(1.0);
        let mut outcome = CheckOutcome::new((width_score + height_score) / 2.0 * 10.0);

        if video.width < min_width || video.height < min_height {
            warn!(
                width = video.width,
                height = video.height,
                "low resolution detected"
            );
            outcome = outcome.with_issue(QualityIssue::LowResolution);
        }

        Ok(outcome)
    }
}

// ============================================================================
// ClarityCheck - Focus measure over sampled frames
// ============================================================================

/// Check that scores sharpness via a Laplacian focus measure
#[derive(Debug, Default)]
pub struct ClarityCheck;

impl ClarityCheck {
    /// Creates a new ClarityCheck
    pub fn new() -> Self {
        Self
    }

    const DEFAULT_BLUR_THRESHOLD: f64 = 0.3;
    const DEFAULT_SAMPLE_FRAMES: usize = 5;

    /// Empirical scaling constant for the raw focus variance
    const FOCUS_NORMALIZER: f64 = 1000.0;
}

#[async_trait]
impl Check for ClarityCheck {
    fn kind(&self) -> CheckKind {
        CheckKind::Clarity
    }

    fn description(&self) -> &str {
        "Assesses video sharpness and clarity over sampled frames"
    }

    async fn run(
        &self,
        video: &DecodedVideo,
        _ctx: &AssessmentContext<'_>,
        rule: &RuleDefinition,
    ) -> QaResult<CheckOutcome> {
        let blur_threshold = rule
            .get_param::<f64>("blur_threshold")
            .unwrap_or(Self::DEFAULT_BLUR_THRESHOLD);
        let sample_frames = rule
            .get_param::<usize>("sample_frames")
            .unwrap_or(Self::DEFAULT_SAMPLE_FRAMES);

        let indices = sample_indices(video.frame_count(), sample_frames)?;
        let normalized: Vec<f64> = indices
            .iter()
            .filter_map(|&i| video.frames.get(i))
            .map(|frame| (focus_measure(frame) / Self::FOCUS_NORMALIZER).clamp(0.0, 1.0))
            .collect();

        let avg_clarity = mean(&normalized);
        let mut outcome = CheckOutcome::new(avg_clarity * 10.0);

        if avg_clarity < blur_threshold {
            warn!(clarity = avg_clarity, "blurry content detected");
            outcome = outcome.with_issue(QualityIssue::BlurryContent);
        }

        Ok(outcome)
    }
}

// ============================================================================
// ColorBalanceCheck - Channel balance on the middle frame
// ============================================================================

/// Check that scores how balanced the color channels are
#[derive(Debug, Default)]
pub struct ColorBalanceCheck;

impl ColorBalanceCheck {
    /// Creates a new ColorBalanceCheck
    pub fn new() -> Self {
        Self
    }

    const DEFAULT_BALANCE_TOLERANCE: f64 = 0.2;
}

#[async_trait]
impl Check for ColorBalanceCheck {
    fn kind(&self) -> CheckKind {
        CheckKind::ColorBalance
    }

    fn description(&self) -> &str {
        "Evaluates color balance on the middle frame"
    }

    async fn run(
        &self,
        video: &DecodedVideo,
        _ctx: &AssessmentContext<'_>,
        rule: &RuleDefinition,
    ) -> QaResult<CheckOutcome> {
        let tolerance = rule
            .get_param::<f64>("balance_tolerance")
            .unwrap_or(Self::DEFAULT_BALANCE_TOLERANCE);

        let frame = video.middle_frame().ok_or_else(|| {
            crate::error::QaError::CheckFailed {
                check: self.kind().rule_id().to_string(),
                reason: "no frames to analyze".to_string(),
            }
        })?;

        let (r, g, b) = frame.channel_means();
        let max_mean = r.max(g).max(b);
        let min_mean = r.min(g).min(b);
        let balance_ratio = if max_mean > 0.0 { min_mean / max_mean } else { 0.0 };

        let mut outcome = CheckOutcome::new(balance_ratio * 10.0);
        if balance_ratio < 1.0 - tolerance {
            warn!(ratio = balance_ratio, "color imbalance detected");
            outcome = outcome.with_issue(QualityIssue::ColorImbalance);
        }

        Ok(outcome)
    }
}

// ============================================================================
// DurationCheck - Measured vs declared duration
// ============================================================================

/// Check that compares measured duration against the declared duration
#[derive(Debug, Default)]
pub struct DurationCheck;

impl DurationCheck {
    /// Creates a new DurationCheck
    pub fn new() -> Self {
        Self
    }

    const DEFAULT_TOLERANCE_SECONDS: f64 = 2.0;
}

#[async_trait]
impl Check for DurationCheck {
    fn kind(&self) -> CheckKind {
        CheckKind::Duration
    }

    fn description(&self) -> &str {
        "Verifies measured duration matches the declared duration"
    }

    async fn run(
        &self,
        video: &DecodedVideo,
        ctx: &AssessmentContext<'_>,
        rule: &RuleDefinition,
    ) -> QaResult<CheckOutcome> {
        let tolerance = rule
            .get_param::<f64>("tolerance_seconds")
            .unwrap_or(Self::DEFAULT_TOLERANCE_SECONDS);

        let actual = video.duration_seconds();
        let expected = ctx.metadata.duration_seconds;
        let diff = (actual - expected).abs();

        let score = if diff <= tolerance {
            10.0
        } else {
            (10.0 - (diff / expected) * 10.0).max(0.0)
        };

        let mut outcome = CheckOutcome::new(score);
        if diff > tolerance {
            warn!(
                expected_sec = expected,
                actual_sec = actual,
                "duration mismatch"
            );
            outcome = outcome.with_issue(QualityIssue::DurationMismatch);
        }

        Ok(outcome)
    }
}

// ============================================================================
// ArtifactCheck - Gradient-based artifact detection
// ============================================================================

/// Check that scores frame cleanliness via gradient dispersion
#[derive(Debug, Default)]
pub struct ArtifactCheck;

impl ArtifactCheck {
    /// Creates a new ArtifactCheck
    pub fn new() -> Self {
        Self
    }

    const DEFAULT_ARTIFACT_THRESHOLD: f64 = 0.1;
}

#[async_trait]
impl Check for ArtifactCheck {
    fn kind(&self) -> CheckKind {
        CheckKind::Artifact
    }

    fn description(&self) -> &str {
        "Detects compression artifacts and glitches on sampled frames"
    }

    async fn run(
        &self,
        video: &DecodedVideo,
        _ctx: &AssessmentContext<'_>,
        rule: &RuleDefinition,
    ) -> QaResult<CheckOutcome> {
        let threshold = rule
            .get_param::<f64>("artifact_threshold")
            .unwrap_or(Self::DEFAULT_ARTIFACT_THRESHOLD);

        let total = video.frame_count();
        let mut sample = vec![total / 4, total / 2, 3 * total / 4];
        sample.dedup();

        let cleanliness: Vec<f64> = sample
            .iter()
            .filter_map(|&i| video.frames.get(i))
            .map(|frame| 1.0 - artifact_measure(frame))
            .collect();

        let avg_cleanliness = mean(&cleanliness);
        let mut outcome = CheckOutcome::new(avg_cleanliness * 10.0);

        if avg_cleanliness < 1.0 - threshold {
            warn!(cleanliness = avg_cleanliness, "technical artifacts detected");
            outcome = outcome.with_issue(QualityIssue::TechnicalArtifact);
        }

        Ok(outcome)
    }
}

// ============================================================================
// PromptAdherenceCheck - Pluggable semantic adherence capability
// ============================================================================

/// Scores how well generated content matches its prompt.
///
/// Real implementations would compare sampled frames against the prompt
/// with a vision-language model; the default is a documented heuristic.
pub trait AdherenceModel: Send + Sync {
    /// Returns an adherence score in `[0, 10]` for the prompt
    fn score(&self, prompt: &str) -> f64;
}

/// Heuristic adherence stand-in: word-count band plus a deterministic
/// perturbation seeded from a hash of the prompt text. It does not look
/// at the frames and must not be read as real prompt fidelity.
#[derive(Debug, Default)]
pub struct HeuristicAdherence;

impl AdherenceModel for HeuristicAdherence {
    fn score(&self, prompt: &str) -> f64 {
        let word_count = prompt.split_whitespace().count();
        // Longer prompts are harder to follow in full
        let base = if word_count > 20 {
            7.5
        } else if word_count > 10 {
            8.0
        } else {
            8.5
        };

        let mut hasher = DefaultHasher::new();
        prompt.hash(&mut hasher);
        let mut rng = StdRng::seed_from_u64(hasher.finish());
        let variation: f64 = rng.gen_range(-1.0..=1.0);

        (base + variation).clamp(0.0, 10.0)
    }
}

/// Check that delegates to the configured adherence model
pub struct PromptAdherenceCheck {
    model: Arc<dyn AdherenceModel>,
}

impl PromptAdherenceCheck {
    /// Creates the check with the default heuristic model
    pub fn new() -> Self {
        Self {
            model: Arc::new(HeuristicAdherence),
        }
    }

    /// Creates the check with a custom adherence model
    pub fn with_model(model: Arc<dyn AdherenceModel>) -> Self {
        Self { model }
    }

    const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.7;
}

impl Default for PromptAdherenceCheck {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Check for PromptAdherenceCheck {
    fn kind(&self) -> CheckKind {
        CheckKind::PromptAdherence
    }

    fn description(&self) -> &str {
        "Assesses how well the video matches the original prompt"
    }

    async fn run(
        &self,
        _video: &DecodedVideo,
        ctx: &AssessmentContext<'_>,
        rule: &RuleDefinition,
    ) -> QaResult<CheckOutcome> {
        let confidence_threshold = rule
            .get_param::<f64>("confidence_threshold")
            .unwrap_or(Self::DEFAULT_CONFIDENCE_THRESHOLD);

        let score = self.model.score(ctx.prompt).clamp(0.0, 10.0);
        let mut outcome = CheckOutcome::new(score);

        if score < confidence_threshold * 10.0 {
            warn!(score, "low prompt adherence");
            outcome = outcome.with_issue(QualityIssue::PromptMismatch);
        }

        Ok(outcome)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleRegistry;

    fn ctx_with<'a>(metadata: &'a VideoMetadata, prompt: &'a str) -> AssessmentContext<'a> {
        AssessmentContext { metadata, prompt }
    }

    fn video_of(width: u32, height: u32, fps: f64, frames: Vec<Frame>) -> DecodedVideo {
        DecodedVideo {
            width,
            height,
            fps,
            frames,
        }
    }

    fn flat_video(width: u32, height: u32, fps: f64, count: usize, rgb: [u8; 3]) -> DecodedVideo {
        video_of(
            width,
            height,
            fps,
            vec![Frame::filled(width, height, rgb); count],
        )
    }

    /// Frame with alternating black/white pixels; maximal focus measure
    fn checkerboard(width: u32, height: u32) -> Frame {
        let mut data = Vec::with_capacity(width as usize * height as usize * 3);
        for y in 0..height {
            for x in 0..width {
                let v = if (x + y) % 2 == 0 { 255 } else { 0 };
                data.extend_from_slice(&[v, v, v]);
            }
        }
        Frame::new(width, height, data).unwrap()
    }

    /// Frame split into a black left half and white right half
    fn split_frame(width: u32, height: u32) -> Frame {
        let mut data = Vec::with_capacity(width as usize * height as usize * 3);
        for _y in 0..height {
            for x in 0..width {
                let v = if x < width / 2 { 0 } else { 255 };
                data.extend_from_slice(&[v, v, v]);
            }
        }
        Frame::new(width, height, data).unwrap()
    }

    fn rule_for(kind: CheckKind) -> RuleDefinition {
        RuleRegistry::with_defaults().get(kind).unwrap().clone()
    }

    // ========================================================================
    // ResolutionCheck Tests
    // ========================================================================

    #[tokio::test]
    async fn test_resolution_full_hd_scores_ten() {
        let video = flat_video(1920, 1080, 30.0, 1, [128, 128, 128]);
        let meta = VideoMetadata::with_duration(30.0);
        let outcome = ResolutionCheck::new()
            .run(&video, &ctx_with(&meta, ""), &rule_for(CheckKind::Resolution))
            .await
            .unwrap();

        assert!((outcome.score - 10.0).abs() < 1e-9);
        assert!(outcome.issues.is_empty());
    }

    #[tokio::test]
    async fn test_resolution_low_flags_issue() {
        let video = flat_video(640, 360, 30.0, 1, [128, 128, 128]);
        let meta = VideoMetadata::with_duration(30.0);
        let outcome = ResolutionCheck::new()
            .run(&video, &ctx_with(&meta, ""), &rule_for(CheckKind::Resolution))
            .await
            .unwrap();

        // 640/1280 and 360/720 both halve the score
        assert!((outcome.score - 5.0).abs() < 1e-9);
        assert_eq!(outcome.issues, vec![QualityIssue::LowResolution]);
    }

    #[tokio::test]
    async fn test_resolution_monotonic_in_dimensions() {
        let meta = VideoMetadata::with_duration(30.0);
        let rule = rule_for(CheckKind::Resolution);
        let mut last = -1.0;
        for (w, h) in [(320, 180), (640, 360), (960, 540), (1280, 720), (1920, 1080)] {
            let video = flat_video(w, h, 30.0, 1, [0, 0, 0]);
            let outcome = ResolutionCheck::new()
                .run(&video, &ctx_with(&meta, ""), &rule)
                .await
                .unwrap();
            assert!(outcome.score >= last, "{}x{} decreased the score", w, h);
            last = outcome.score;
        }
    }

    // ========================================================================
    // ClarityCheck Tests
    // ========================================================================

    #[tokio::test]
    async fn test_clarity_flat_frames_are_blurry() {
        let video = flat_video(8, 8, 30.0, 10, [100, 100, 100]);
        let meta = VideoMetadata::with_duration(30.0);
        let outcome = ClarityCheck::new()
            .run(&video, &ctx_with(&meta, ""), &rule_for(CheckKind::Clarity))
            .await
            .unwrap();

        assert_eq!(outcome.score, 0.0);
        assert_eq!(outcome.issues, vec![QualityIssue::BlurryContent]);
    }

    #[tokio::test]
    async fn test_clarity_checkerboard_is_sharp() {
        let video = video_of(8, 8, 30.0, vec![checkerboard(8, 8); 10]);
        let meta = VideoMetadata::with_duration(30.0);
        let outcome = ClarityCheck::new()
            .run(&video, &ctx_with(&meta, ""), &rule_for(CheckKind::Clarity))
            .await
            .unwrap();

        assert!((outcome.score - 10.0).abs() < 1e-9);
        assert!(outcome.issues.is_empty());
    }

    // ========================================================================
    // ColorBalanceCheck Tests
    // ========================================================================

    #[tokio::test]
    async fn test_color_balance_gray_is_balanced() {
        let video = flat_video(8, 8, 30.0, 3, [120, 120, 120]);
        let meta = VideoMetadata::with_duration(30.0);
        let outcome = ColorBalanceCheck::new()
            .run(&video, &ctx_with(&meta, ""), &rule_for(CheckKind::ColorBalance))
            .await
            .unwrap();

        assert!((outcome.score - 10.0).abs() < 1e-9);
        assert!(outcome.issues.is_empty());
    }

    #[tokio::test]
    async fn test_color_balance_pure_red_is_imbalanced() {
        let video = flat_video(8, 8, 30.0, 3, [255, 0, 0]);
        let meta = VideoMetadata::with_duration(30.0);
        let outcome = ColorBalanceCheck::new()
            .run(&video, &ctx_with(&meta, ""), &rule_for(CheckKind::ColorBalance))
            .await
            .unwrap();

        assert_eq!(outcome.score, 0.0);
        assert_eq!(outcome.issues, vec![QualityIssue::ColorImbalance]);
    }

    #[tokio::test]
    async fn test_color_balance_partial_imbalance() {
        let video = flat_video(8, 8, 30.0, 3, [128, 64, 32]);
        let meta = VideoMetadata::with_duration(30.0);
        let outcome = ColorBalanceCheck::new()
            .run(&video, &ctx_with(&meta, ""), &rule_for(CheckKind::ColorBalance))
            .await
            .unwrap();

        // ratio = 32/128 = 0.25
        assert!((outcome.score - 2.5).abs() < 1e-9);
        assert_eq!(outcome.issues, vec![QualityIssue::ColorImbalance]);
    }

    // ========================================================================
    // DurationCheck Tests
    // ========================================================================

    #[tokio::test]
    async fn test_duration_within_tolerance_scores_ten() {
        // 900 frames at 30fps is exactly the declared 30s
        let video = flat_video(2, 2, 30.0, 900, [0, 0, 0]);
        let meta = VideoMetadata::with_duration(30.0);
        let outcome = DurationCheck::new()
            .run(&video, &ctx_with(&meta, ""), &rule_for(CheckKind::Duration))
            .await
            .unwrap();

        assert_eq!(outcome.score, 10.0);
        assert!(outcome.issues.is_empty());
    }

    #[tokio::test]
    async fn test_duration_mismatch_penalized() {
        // 200 frames at 10fps = 20s measured against 30s declared
        let video = flat_video(2, 2, 10.0, 200, [0, 0, 0]);
        let meta = VideoMetadata::with_duration(30.0);
        let outcome = DurationCheck::new()
            .run(&video, &ctx_with(&meta, ""), &rule_for(CheckKind::Duration))
            .await
            .unwrap();

        // 10 - (10/30)*10
        assert!((outcome.score - 6.666_666_666_666_667).abs() < 1e-9);
        assert_eq!(outcome.issues, vec![QualityIssue::DurationMismatch]);
    }

    #[tokio::test]
    async fn test_duration_invalid_fps_scores_zero() {
        let video = flat_video(2, 2, 0.0, 10, [0, 0, 0]);
        let meta = VideoMetadata::with_duration(30.0);
        let outcome = DurationCheck::new()
            .run(&video, &ctx_with(&meta, ""), &rule_for(CheckKind::Duration))
            .await
            .unwrap();

        assert_eq!(outcome.score, 0.0);
        assert_eq!(outcome.issues, vec![QualityIssue::DurationMismatch]);
    }

    // ========================================================================
    // ArtifactCheck Tests
    // ========================================================================

    #[tokio::test]
    async fn test_artifact_flat_frames_are_clean() {
        let video = flat_video(16, 16, 30.0, 12, [60, 60, 60]);
        let meta = VideoMetadata::with_duration(30.0);
        let outcome = ArtifactCheck::new()
            .run(&video, &ctx_with(&meta, ""), &rule_for(CheckKind::Artifact))
            .await
            .unwrap();

        assert!((outcome.score - 10.0).abs() < 1e-9);
        assert!(outcome.issues.is_empty());
    }

    #[tokio::test]
    async fn test_artifact_hard_edge_flags_issue() {
        // A single hard edge concentrates all gradient energy, which the
        // dispersion measure reads as blocking
        let video = video_of(16, 16, 30.0, vec![split_frame(16, 16); 12]);
        let meta = VideoMetadata::with_duration(30.0);
        let outcome = ArtifactCheck::new()
            .run(&video, &ctx_with(&meta, ""), &rule_for(CheckKind::Artifact))
            .await
            .unwrap();

        assert!(outcome.score < 9.0);
        assert_eq!(outcome.issues, vec![QualityIssue::TechnicalArtifact]);
    }

    // ========================================================================
    // PromptAdherenceCheck Tests
    // ========================================================================

    #[test]
    fn test_adherence_heuristic_deterministic() {
        let model = HeuristicAdherence;
        let prompt = "a calm lake at sunrise with mist";
        assert_eq!(model.score(prompt), model.score(prompt));
        // Different prompts get independently seeded perturbations
        assert!((0.0..=10.0).contains(&model.score("another prompt entirely")));
    }

    #[test]
    fn test_adherence_heuristic_word_count_bands() {
        let model = HeuristicAdherence;

        let short = "a cat";
        let medium = "a cat sitting on a red couch in a bright living room";
        let long = "a cat sitting on a red couch in a bright living room with \
                    plants on every windowsill and rain running down the glass \
                    behind closed curtains";

        // Perturbation is bounded by ±1.0 around the band base
        assert!((7.5..=9.5).contains(&model.score(short)));
        assert!((7.0..=9.0).contains(&model.score(medium)));
        assert!((6.5..=8.5).contains(&model.score(long)));
    }

    #[tokio::test]
    async fn test_prompt_adherence_short_prompt_never_flags() {
        // Short prompts bottom out at 7.5, above the 7.0 threshold
        let video = flat_video(2, 2, 30.0, 1, [0, 0, 0]);
        let meta = VideoMetadata::with_duration(30.0);
        let outcome = PromptAdherenceCheck::new()
            .run(
                &video,
                &ctx_with(&meta, "a quiet forest"),
                &rule_for(CheckKind::PromptAdherence),
            )
            .await
            .unwrap();

        assert!(outcome.score >= 7.5);
        assert!(outcome.issues.is_empty());
    }

    #[tokio::test]
    async fn test_prompt_adherence_pluggable_model() {
        struct FixedModel(f64);
        impl AdherenceModel for FixedModel {
            fn score(&self, _prompt: &str) -> f64 {
                self.0
            }
        }

        let video = flat_video(2, 2, 30.0, 1, [0, 0, 0]);
        let meta = VideoMetadata::with_duration(30.0);
        let check = PromptAdherenceCheck::with_model(Arc::new(FixedModel(4.0)));
        let outcome = check
            .run(
                &video,
                &ctx_with(&meta, "anything"),
                &rule_for(CheckKind::PromptAdherence),
            )
            .await
            .unwrap();

        assert_eq!(outcome.score, 4.0);
        assert_eq!(outcome.issues, vec![QualityIssue::PromptMismatch]);
    }

    // ========================================================================
    // Analysis helper Tests
    // ========================================================================

    #[test]
    fn test_focus_measure_flat_vs_checkerboard() {
        let flat = Frame::filled(8, 8, [100, 100, 100]);
        assert_eq!(focus_measure(&flat), 0.0);

        let sharp = checkerboard(8, 8);
        assert!(focus_measure(&sharp) > 1000.0);
    }

    #[test]
    fn test_focus_measure_tiny_frame_is_zero() {
        let tiny = Frame::filled(2, 2, [255, 255, 255]);
        assert_eq!(focus_measure(&tiny), 0.0);
    }

    #[test]
    fn test_artifact_measure_bounds() {
        let flat = Frame::filled(16, 16, [60, 60, 60]);
        assert_eq!(artifact_measure(&flat), 0.0);

        let edge = split_frame(16, 16);
        let measure = artifact_measure(&edge);
        assert!((0.0..=1.0).contains(&measure));
        assert!(measure > 0.5);
    }
}
