//! Statistics Tracker
//!
//! Rolling pass/fail counters, incremental average score, issue
//! frequencies, and a bounded history ring for trend queries.
//!
//! All mutation happens inside one short critical section per completed
//! assessment; the lock is never held across an assessment.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::report::{QualityReport, ACCEPTABLE_SCORE, EXCELLENT_SCORE, PASS_SCORE};

/// Maximum number of reports kept in the history ring
pub const HISTORY_CAPACITY: usize = 1000;

/// How many issue kinds a trend query reports
const TREND_TOP_ISSUES: usize = 5;

/// Minimum scores in the window before a direction other than `Stable`
/// is reported
const TREND_MIN_SAMPLES: usize = 4;

/// Mean-score shift between window halves that moves the trend off `Stable`
const TREND_SHIFT: f64 = 0.5;

// =============================================================================
// Aggregate Types
// =============================================================================

/// Process-lifetime quality counters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QualityStatistics {
    /// Total completed assessments
    pub total_assessments: u64,
    /// Assessments at or above the pass threshold
    pub passed_assessments: u64,
    /// Assessments below the pass threshold
    pub failed_assessments: u64,
    /// Incremental running average of overall scores
    pub average_score: f64,
    /// How often each issue kind has been flagged
    pub common_issues: HashMap<String, u64>,
}

/// Direction the overall score is moving within a trend window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreTrend {
    Improving,
    Declining,
    Stable,
}

impl std::fmt::Display for ScoreTrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScoreTrend::Improving => write!(f, "improving"),
            ScoreTrend::Declining => write!(f, "declining"),
            ScoreTrend::Stable => write!(f, "stable"),
        }
    }
}

/// Bucketed score counts within a trend window
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreDistribution {
    /// Scores >= 9.0
    pub excellent: usize,
    /// Scores in [7.5, 9.0)
    pub good: usize,
    /// Scores in [6.0, 7.5)
    pub acceptable: usize,
    /// Scores < 6.0
    pub poor: usize,
}

impl ScoreDistribution {
    fn add(&mut self, score: f64) {
        if score >= EXCELLENT_SCORE {
            self.excellent += 1;
        } else if score >= ACCEPTABLE_SCORE {
            self.good += 1;
        } else if score >= PASS_SCORE {
            self.acceptable += 1;
        } else {
            self.poor += 1;
        }
    }

    /// Total count across all buckets
    pub fn total(&self) -> usize {
        self.excellent + self.good + self.acceptable + self.poor
    }
}

/// Quality trends over a recent time window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityTrends {
    /// Window length in days
    pub period_days: i64,
    /// Assessments inside the window
    pub total_assessments: usize,
    /// Mean overall score inside the window
    pub average_score: f64,
    /// Direction the score is moving
    pub score_trend: ScoreTrend,
    /// Fraction of window assessments at or above the pass threshold
    pub pass_rate: f64,
    /// Most frequent issue kinds in the window, descending
    pub common_issues: Vec<(String, u64)>,
    /// Score bucket counts
    pub score_distribution: ScoreDistribution,
}

// =============================================================================
// Tracker
// =============================================================================

#[derive(Debug, Default)]
struct TrackerInner {
    stats: QualityStatistics,
    history: VecDeque<QualityReport>,
}

/// Owns the statistics critical section and the history ring.
///
/// History insertion order is the order assessments complete this
/// critical section.
#[derive(Debug, Default)]
pub struct StatisticsTracker {
    inner: Mutex<TrackerInner>,
}

impl StatisticsTracker {
    /// Creates an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one completed assessment: counters, running average,
    /// issue frequencies, and the history ring, all under a single lock.
    pub fn record(&self, report: &QualityReport) {
        let mut inner = self.lock();

        let stats = &mut inner.stats;
        stats.total_assessments += 1;
        if report.overall_score >= PASS_SCORE {
            stats.passed_assessments += 1;
        } else {
            stats.failed_assessments += 1;
        }

        let n = stats.total_assessments as f64;
        stats.average_score = (stats.average_score * (n - 1.0) + report.overall_score) / n;

        for issue in &report.issues {
            *stats.common_issues.entry(issue.as_str().to_string()).or_insert(0) += 1;
        }

        inner.history.push_back(report.clone());
        if inner.history.len() > HISTORY_CAPACITY {
            inner.history.pop_front();
        }
    }

    /// Snapshot of the running counters
    pub fn statistics(&self) -> QualityStatistics {
        self.lock().stats.clone()
    }

    /// Number of reports currently held in the history ring
    pub fn history_len(&self) -> usize {
        self.lock().history.len()
    }

    /// Snapshot of the history ring, oldest first
    pub fn history(&self) -> Vec<QualityReport> {
        self.lock().history.iter().cloned().collect()
    }

    /// Quality trends over the last `days` days, or `None` when no
    /// assessment falls inside the window.
    pub fn trends(&self, days: i64) -> Option<QualityTrends> {
        let cutoff = Utc::now() - Duration::days(days);
        let inner = self.lock();

        let recent: Vec<&QualityReport> = inner
            .history
            .iter()
            .filter(|r| r.assessed_at >= cutoff)
            .collect();
        if recent.is_empty() {
            return None;
        }

        let scores: Vec<f64> = recent.iter().map(|r| r.overall_score).collect();
        let average_score = scores.iter().sum::<f64>() / scores.len() as f64;

        let score_trend = if scores.len() >= TREND_MIN_SAMPLES {
            let half = scores.len() / 2;
            let first = scores[..half].iter().sum::<f64>() / half as f64;
            let second = scores[half..].iter().sum::<f64>() / (scores.len() - half) as f64;
            if second > first + TREND_SHIFT {
                ScoreTrend::Improving
            } else if second < first - TREND_SHIFT {
                ScoreTrend::Declining
            } else {
                ScoreTrend::Stable
            }
        } else {
            ScoreTrend::Stable
        };

        let passed = recent
            .iter()
            .filter(|r| r.overall_score >= PASS_SCORE)
            .count();

        let mut issue_counts: HashMap<&'static str, u64> = HashMap::new();
        for report in &recent {
            for issue in &report.issues {
                *issue_counts.entry(issue.as_str()).or_insert(0) += 1;
            }
        }
        let mut common_issues: Vec<(String, u64)> = issue_counts
            .into_iter()
            .map(|(name, count)| (name.to_string(), count))
            .collect();
        common_issues.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        common_issues.truncate(TREND_TOP_ISSUES);

        let mut score_distribution = ScoreDistribution::default();
        for score in &scores {
            score_distribution.add(*score);
        }

        Some(QualityTrends {
            period_days: days,
            total_assessments: recent.len(),
            average_score,
            score_trend,
            pass_rate: passed as f64 / recent.len() as f64,
            common_issues,
            score_distribution,
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TrackerInner> {
        // A poisoned lock only means another assessment panicked after
        // its update; the counters themselves are still consistent.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

// ============================================================================
// Tests
// ============================================================================
