//! Free teaser shown before purchase
//!
//! Carries no line-level detail: only the top findings' names, amounts and
//! shortened explanations.

use serde::{Deserialize, Serialize};

use core_kernel::Money;
use domain_audit::{Finding, RuleId, Severity};
use domain_pricing::PriceQuote;

/// Findings shown in the teaser
pub const TEASER_FINDINGS: usize = 2;

/// Longest teaser explanation, ellipsis included
pub const TEASER_DESCRIPTION_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeaserFinding {
    pub rule_id: RuleId,
    pub rule_name: String,
    #[serde(rename = "savingsCents")]
    pub savings: Money,
    pub description: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToAction {
    pub headline: String,
    pub subheadline: String,
    pub benefits: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preview {
    pub total_findings: usize,
    #[serde(rename = "totalSavingsCents")]
    pub total_savings: Money,
    pub price_dollars: i64,
    pub display_price: String,
    pub savings_ratio: f64,
    pub teaser_findings: Vec<TeaserFinding>,
    pub call_to_action: CallToAction,
}

/// Cuts `text` to at most `max` characters, ending in `...` when shortened
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept.trim_end())
}

/// Builds the teaser from findings already ranked by savings
pub fn build_preview(findings: &[Finding], total_savings: Money, quote: &PriceQuote) -> Preview {
    let teaser_findings = findings
        .iter()
        .take(TEASER_FINDINGS)
        .map(|f| TeaserFinding {
            rule_id: f.rule_id,
            rule_name: f.rule_name.clone(),
            savings: f.savings,
            description: truncate(&f.explanation, TEASER_DESCRIPTION_CHARS),
            severity: f.severity,
        })
        .collect();

    let issue_word = if findings.len() == 1 { "issue" } else { "issues" };

    Preview {
        total_findings: findings.len(),
        total_savings,
        price_dollars: quote.price_dollars,
        display_price: quote.display_price.clone(),
        savings_ratio: quote.savings_ratio,
        teaser_findings,
        call_to_action: CallToAction {
            headline: format!("Found {} {} worth {}", findings.len(), issue_word, total_savings),
            subheadline: format!(
                "Get your complete audit report for just {}",
                quote.display_price
            ),
            benefits: [
                "Detailed explanations for all findings",
                "Ready-to-send appeal letter",
                "Phone scripts for providers and insurance",
                "Regulatory citations for each issue",
                "30-day money-back guarantee",
            ]
            .iter()
            .map(|b| b.to_string())
            .collect(),
        },
    }
}
