//! Reelcheck Quality Assessment Engine
//!
//! Multi-check quality assessment for AI-generated video. Samples frames
//! from a candidate video, runs independent numeric quality checks
//! parameterized by a runtime-mutable rule registry, combines sub-scores
//! into a weighted overall score with critical-issue penalties, and keeps
//! rolling statistics with a bounded history for trend queries.
//!
//! The engine is total-failure-tolerant: undecodable input and internal
//! check failures degrade into a low-scored report with issues and
//! recommendations instead of aborting. Only invalid caller input is
//! returned as an error.
//!
//! ```no_run
//! use reelcheck::{QualityEngine, VideoMetadata};
//!
//! # async fn demo(video_bytes: &[u8]) -> reelcheck::QaResult<()> {
//! let engine = QualityEngine::new();
//! let report = engine
//!     .assess(video_bytes, &VideoMetadata::with_duration(30.0), "a calm lake at sunrise")
//!     .await?;
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```

pub mod checks;
pub mod decode;
pub mod engine;
pub mod error;
pub mod report;
pub mod rules;
pub mod sampler;
pub mod stats;
pub mod types;

// Re-export main types
pub use checks::{
    AdherenceModel, ArtifactCheck, AssessmentContext, Check, CheckKind, CheckOutcome,
    ClarityCheck, ColorBalanceCheck, DurationCheck, HeuristicAdherence, PromptAdherenceCheck,
    ResolutionCheck,
};
pub use decode::{RawRgbDecoder, VideoDecoder};
pub use engine::{QualityEngine, QualityRequirements, ValidationResult};
pub use error::{QaError, QaResult};
pub use report::{QualityIssue, QualityReport, SubScores};
pub use rules::{RuleCategory, RuleDefinition, RuleRegistry, RuleSeverity};
pub use sampler::sample_indices;
pub use stats::{
    QualityStatistics, QualityTrends, ScoreDistribution, ScoreTrend, StatisticsTracker,
};
pub use types::{DecodedVideo, Frame, VideoMetadata};
