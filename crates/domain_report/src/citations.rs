//! Regulatory citations referenced by the findings

use serde::{Deserialize, Serialize};

use domain_audit::{Citation, Finding};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationEntry {
    pub authority: String,
    pub title: String,
    /// Plain language description of the authority
    pub description: String,
}

fn describe(authority: &str) -> &'static str {
    if authority.contains("NCCI") {
        "Federal guidelines for proper medical coding and billing"
    } else if authority.contains("Fair Credit Billing") {
        "Federal law protecting consumers from unfair billing practices"
    } else if authority.contains("Fair and Accurate Credit") {
        "Federal law providing rights to dispute billing errors"
    } else if authority.contains("No Surprises") {
        "Federal law limiting surprise and balance billing"
    } else if authority.contains("Claims Processing") {
        "Medicare rules for how services are billed and paid"
    } else {
        "Healthcare billing regulation"
    }
}

/// Union of every finding's citations in order of first appearance
pub fn collect_citations(findings: &[Finding]) -> Vec<CitationEntry> {
    let mut seen: Vec<&Citation> = Vec::new();
    for citation in findings.iter().flat_map(|f| f.citations.iter()) {
        if !seen.contains(&citation) {
            seen.push(citation);
        }
    }

    seen.into_iter()
        .map(|c| CitationEntry {
            authority: c.authority.clone(),
            title: c.title.clone(),
            description: describe(&c.authority).to_string(),
        })
        .collect()
}
