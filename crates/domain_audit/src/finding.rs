//! Findings produced by audit rules

use serde::{Deserialize, Serialize};
use std::fmt;

use core_kernel::{LineId, Money};

use crate::rules::RuleId;

/// Severity of a finding, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Warn,
    High,
    Critical,
}

impl Severity {
    /// High and critical findings survive aggregation even without savings
    pub fn is_high(&self) -> bool {
        *self >= Severity::High
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Low => "low",
            Severity::Warn => "warn",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A regulatory or contractual authority backing a finding
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Citation {
    pub authority: String,
    pub title: String,
}

impl Citation {
    pub fn new(authority: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            authority: authority.into(),
            title: title.into(),
        }
    }
}

/// Recomputed versus stated amount of an arithmetic finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmountComparison {
    #[serde(rename = "expectedCents")]
    pub expected: Money,
    #[serde(rename = "statedCents")]
    pub stated: Money,
}

impl AmountComparison {
    pub fn new(expected: Money, stated: Money) -> Self {
        Self { expected, stated }
    }

    /// `stated - expected`; positive when the patient was overcharged
    pub fn difference(&self) -> Money {
        self.stated - self.expected
    }
}

/// One detected issue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub rule_id: RuleId,
    pub rule_name: String,
    pub severity: Severity,
    /// 0.0 to 1.0
    pub confidence: f64,
    #[serde(rename = "savingsCents")]
    pub savings: Money,
    pub explanation: String,
    pub recommended_actions: Vec<String>,
    pub evidence_line_ids: Vec<LineId>,
    pub citations: Vec<Citation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<AmountComparison>,
}

impl Finding {
    /// Starts a finding for `rule`; confidence is clamped into `0.0..=1.0`
    pub fn new(rule: RuleId, severity: Severity, confidence: f64) -> Self {
        Self {
            rule_id: rule,
            rule_name: rule.name().to_string(),
            severity,
            confidence: confidence.clamp(0.0, 1.0),
            savings: Money::zero(),
            explanation: String::new(),
            recommended_actions: Vec::new(),
            evidence_line_ids: Vec::new(),
            citations: Vec::new(),
            comparison: None,
        }
    }

    pub fn explanation(mut self, text: impl Into<String>) -> Self {
        self.explanation = text.into();
        self
    }

    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.recommended_actions.push(action.into());
        self
    }

    pub fn evidence(mut self, line_id: &LineId) -> Self {
        if !self.evidence_line_ids.contains(line_id) {
            self.evidence_line_ids.push(line_id.clone());
        }
        self
    }

    pub fn evidence_all<'a>(mut self, line_ids: impl IntoIterator<Item = &'a LineId>) -> Self {
        for id in line_ids {
            self = self.evidence(id);
        }
        self
    }

    /// Savings are never negative
    pub fn savings(mut self, amount: Money) -> Self {
        self.savings = amount.non_negative();
        self
    }

    pub fn cite(mut self, citation: Citation) -> Self {
        self.citations.push(citation);
        self
    }

    pub fn comparison(mut self, expected: Money, stated: Money) -> Self {
        self.comparison = Some(AmountComparison::new(expected, stated));
        self
    }

    /// Returns true if this finding survives aggregation into the report
    pub fn is_reportable(&self) -> bool {
        self.savings.is_positive() || self.severity.is_high()
    }
}
