//! Bill to EOB line matching
//!
//! Every bill line is scored against every EOB line with a weighted
//! heuristic. The best candidate above the minimum score becomes the match;
//! ties keep the first EOB line in input order.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use core_kernel::LineId;

use crate::line::LineItem;
use crate::similarity::string_similarity;

/// Scoring weights and thresholds of the matcher
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchWeights {
    /// Added when both codes are present and equal
    pub code: f64,
    /// Added when both normalized dates are present and equal
    pub date: f64,
    /// Multiplied by the description similarity ratio
    pub description: f64,
    /// Multiplied by the charge proximity ratio
    pub amount: f64,
    /// A candidate must score strictly above this to be accepted
    pub min_score: f64,
    /// Scores strictly above this are high confidence
    pub high_tier: f64,
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self {
            code: 50.0,
            date: 30.0,
            description: 20.0,
            amount: 15.0,
            min_score: 40.0,
            high_tier: 70.0,
        }
    }
}

/// Confidence band of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchTier {
    High,
    Medium,
    Low,
    None,
}

/// The match record of one bill line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineMatch {
    pub bill_line_id: LineId,
    pub eob_line_id: Option<LineId>,
    /// Score of the accepted candidate; for unmatched lines the best rejected score
    pub confidence_score: f64,
    pub match_tier: MatchTier,
}

impl LineMatch {
    /// Returns true if an EOB line was accepted
    pub fn is_matched(&self) -> bool {
        self.eob_line_id.is_some()
    }
}

/// Scores and pairs bill lines with EOB lines
#[derive(Debug, Clone, Default)]
pub struct LineMatcher {
    weights: MatchWeights,
}

impl LineMatcher {
    /// Creates a matcher with the default weights
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a matcher with custom weights
    pub fn with_weights(weights: MatchWeights) -> Self {
        Self { weights }
    }

    /// Returns the weights in use
    pub fn weights(&self) -> &MatchWeights {
        &self.weights
    }

    /// Scores one bill/EOB pair
    pub fn score(&self, bill: &LineItem, eob: &LineItem) -> f64 {
        let w = &self.weights;
        let mut score = 0.0;

        if bill.code.is_some() && bill.code == eob.code {
            score += w.code;
        }

        if bill.date_of_service.is_some() && bill.date_of_service == eob.date_of_service {
            score += w.date;
        }

        if !bill.description.is_empty() && !eob.description.is_empty() {
            let similarity = string_similarity(
                &bill.description.to_lowercase(),
                &eob.description.to_lowercase(),
            );
            score += similarity * w.description;
        }

        let (a, b) = (bill.charge.cents(), eob.charge.cents());
        if a > 0 && b > 0 {
            let diff = (a - b).abs() as f64;
            let max = a.max(b) as f64;
            score += (1.0 - diff / max) * w.amount;
        }

        score
    }

    /// Classifies a score into a tier
    pub fn tier(&self, score: f64, matched: bool) -> MatchTier {
        if matched && score > self.weights.high_tier {
            MatchTier::High
        } else if matched && score > self.weights.min_score {
            MatchTier::Medium
        } else if score > 0.0 {
            MatchTier::Low
        } else {
            MatchTier::None
        }
    }

    /// Produces exactly one match record per bill line, in bill order
    pub fn match_lines(&self, bill_lines: &[LineItem], eob_lines: &[LineItem]) -> Vec<LineMatch> {
        let matches: Vec<LineMatch> = bill_lines
            .iter()
            .map(|bill| {
                let mut best: Option<(&LineItem, f64)> = None;
                let mut best_rejected = 0.0_f64;

                for eob in eob_lines {
                    let score = self.score(bill, eob);
                    let current = best.map(|(_, s)| s).unwrap_or(0.0);
                    if score > current && score > self.weights.min_score {
                        best = Some((eob, score));
                    } else if score > best_rejected {
                        best_rejected = score;
                    }
                }

                match best {
                    Some((eob, score)) => LineMatch {
                        bill_line_id: bill.line_id.clone(),
                        eob_line_id: Some(eob.line_id.clone()),
                        confidence_score: score,
                        match_tier: self.tier(score, true),
                    },
                    None => LineMatch {
                        bill_line_id: bill.line_id.clone(),
                        eob_line_id: None,
                        confidence_score: best_rejected,
                        match_tier: self.tier(best_rejected, false),
                    },
                }
            })
            .collect();

        debug!(
            bill_lines = bill_lines.len(),
            eob_lines = eob_lines.len(),
            matched = matches.iter().filter(|m| m.is_matched()).count(),
            "Matched bill lines to EOB lines"
        );

        matches
    }
}

/// Percentage of bill lines that found an EOB match, rounded to a whole number
pub fn match_rate_percent(matches: &[LineMatch]) -> u8 {
    if matches.is_empty() {
        return 0;
    }
    let matched = matches.iter().filter(|m| m.is_matched()).count();
    ((matched * 100 + matches.len() / 2) / matches.len()) as u8
}

/// Index from bill line id to matched EOB line id
pub fn match_index(matches: &[LineMatch]) -> HashMap<&LineId, &LineId> {
    matches
        .iter()
        .filter_map(|m| m.eob_line_id.as_ref().map(|eob| (&m.bill_line_id, eob)))
        .collect()
}
