//! Rule Registry
//!
//! Per-check thresholds and parameters. The registry is loaded once from
//! the static catalog at startup; parameters and the enabled flag may be
//! mutated at runtime, everything else is immutable.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::checks::CheckKind;
use crate::error::{QaError, QaResult};

/// Category a rule belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleCategory {
    /// Measured from the decoded frames or stream properties
    Technical,
    /// Judged against the generated content itself
    Content,
    /// Judged against the original prompt
    Adherence,
}

/// Severity of the quality aspect a rule guards
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleSeverity {
    Minor,
    Major,
    Critical,
}

/// A configured quality rule consulted by its check at run time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleDefinition {
    /// Stable rule identifier (e.g. "clarity_check")
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Category of the rule
    pub category: RuleCategory,
    /// Severity of the aspect the rule guards
    pub severity: RuleSeverity,
    /// The check this rule parameterizes
    pub check: CheckKind,
    /// Rule-specific parameters
    pub params: HashMap<String, serde_json::Value>,
    /// Whether the check runs at all
    pub enabled: bool,
}

impl RuleDefinition {
    /// Gets a parameter value as a specific type
    pub fn get_param<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.params
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Sets a parameter value
    pub fn set_param<T: Serialize>(&mut self, key: &str, value: T) {
        if let Ok(v) = serde_json::to_value(value) {
            self.params.insert(key.to_string(), v);
        }
    }
}

/// Builds a rule with its default parameters
fn rule(
    check: CheckKind,
    name: &str,
    description: &str,
    category: RuleCategory,
    severity: RuleSeverity,
    params: &[(&str, serde_json::Value)],
) -> RuleDefinition {
    RuleDefinition {
        id: check.rule_id().to_string(),
        name: name.to_string(),
        description: description.to_string(),
        category,
        severity,
        check,
        params: params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect(),
        enabled: true,
    }
}

/// Holds the rule catalog and serves lookups from the checks
#[derive(Debug, Clone)]
pub struct RuleRegistry {
    rules: HashMap<CheckKind, RuleDefinition>,
}

impl RuleRegistry {
    /// Creates the registry from the static default catalog
    pub fn with_defaults() -> Self {
        use serde_json::json;

        let catalog = [
            rule(
                CheckKind::Resolution,
                "Resolution Quality Check",
                "Verify video resolution meets minimum requirements",
                RuleCategory::Technical,
                RuleSeverity::Major,
                &[("min_width", json!(1280)), ("min_height", json!(720))],
            ),
            rule(
                CheckKind::Clarity,
                "Image Clarity Check",
                "Assess video sharpness and clarity",
                RuleCategory::Technical,
                RuleSeverity::Major,
                &[("blur_threshold", json!(0.3)), ("sample_frames", json!(5))],
            ),
            rule(
                CheckKind::ColorBalance,
                "Color Balance Check",
                "Evaluate color balance and saturation",
                RuleCategory::Technical,
                RuleSeverity::Minor,
                &[("balance_tolerance", json!(0.2))],
            ),
            rule(
                CheckKind::Duration,
                "Duration Validation",
                "Verify video duration matches requirements",
                RuleCategory::Technical,
                RuleSeverity::Critical,
                &[("tolerance_seconds", json!(2.0))],
            ),
            rule(
                CheckKind::PromptAdherence,
                "Prompt Adherence Check",
                "Assess how well video matches the prompt",
                RuleCategory::Content,
                RuleSeverity::Major,
                &[("confidence_threshold", json!(0.7))],
            ),
            rule(
                CheckKind::Artifact,
                "Technical Artifacts Check",
                "Detect compression artifacts and glitches",
                RuleCategory::Technical,
                RuleSeverity::Major,
                &[("artifact_threshold", json!(0.1))],
            ),
        ];

        Self {
            rules: catalog.into_iter().map(|r| (r.check, r)).collect(),
        }
    }

    /// Gets the rule for a check
    pub fn get(&self, check: CheckKind) -> Option<&RuleDefinition> {
        self.rules.get(&check)
    }

    /// Whether the rule for a check is enabled (missing rules count as disabled)
    pub fn is_enabled(&self, check: CheckKind) -> bool {
        self.rules.get(&check).map(|r| r.enabled).unwrap_or(false)
    }

    /// Enables or disables a rule
    pub fn set_enabled(&mut self, check: CheckKind, enabled: bool) -> QaResult<()> {
        let rule = self
            .rules
            .get_mut(&check)
            .ok_or_else(|| QaError::RuleNotFound(check.rule_id().to_string()))?;
        rule.enabled = enabled;
        Ok(())
    }

    /// Updates a single rule parameter
    pub fn set_param<T: Serialize>(&mut self, check: CheckKind, key: &str, value: T) -> QaResult<()> {
        let rule = self
            .rules
            .get_mut(&check)
            .ok_or_else(|| QaError::RuleNotFound(check.rule_id().to_string()))?;
        rule.set_param(key, value);
        Ok(())
    }

    /// Iterates over all rules
    pub fn iter(&self) -> impl Iterator<Item = &RuleDefinition> {
        self.rules.values()
    }

    /// Number of enabled rules
    pub fn enabled_count(&self) -> usize {
        self.rules.values().filter(|r| r.enabled).count()
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// ============================================================================
// Tests
// ============================================================================
