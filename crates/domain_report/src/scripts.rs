//! Phone scripts for calling the provider and the insurer

use serde::{Deserialize, Serialize};

use core_kernel::Money;
use domain_audit::{Finding, InsuranceContext};

/// Findings named in a script
const SCRIPT_FINDINGS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneScripts {
    pub provider: String,
    pub payer: String,
}

/// Top findings by savings, one bullet each
fn issue_list(findings: &[Finding]) -> String {
    let mut ranked: Vec<&Finding> = findings.iter().filter(|f| f.savings.is_positive()).collect();
    ranked.sort_by(|a, b| b.savings.cmp(&a.savings));

    let bullets: Vec<String> = ranked
        .iter()
        .take(SCRIPT_FINDINGS)
        .map(|f| format!("- {} ({}): {} potential refund", f.rule_name, f.rule_id, f.savings))
        .collect();

    if bullets.is_empty() {
        "- Items flagged for verification (see the audit report)".to_string()
    } else {
        bullets.join("\n")
    }
}

/// Appeal deadline quoted to the insurer
fn appeal_deadline(state: Option<&str>) -> &'static str {
    match state {
        Some("CA") => "180 days",
        _ => "1 year",
    }
}

/// Renders both call scripts
pub fn phone_scripts(findings: &[Finding], total_savings: Money, context: &InsuranceContext) -> PhoneScripts {
    let issues = issue_list(findings);
    let state = context.state_code();

    let provider = format!(
        "PROVIDER BILLING DEPARTMENT CALL SCRIPT\n\
         \n\
         \"Hello, I'm calling about my account for services on [Date of Service]. My account number is [Account Number].\n\
         \n\
         I've audited my itemized bill and found {count} billing discrepancies that need correction:\n\
         \n\
         {issues}\n\
         \n\
         These appear to be coding and billing errors rather than coverage issues.\n\
         \n\
         Could you please:\n\
         1. Review these line items for accuracy\n\
         2. Send a corrected statement if the errors are confirmed\n\
         3. Give me a reference number for this call\n\
         \n\
         The total potential correction is {total}. When can I expect to hear back about the review?\"\n\
         \n\
         Reference for follow-up: [Reference number]",
        count = findings.len(),
        issues = issues,
        total = total_savings,
    );

    let payer = format!(
        "INSURANCE COMPANY CALL SCRIPT\n\
         \n\
         \"Hi, I'm calling about claim [Claim Number] for services on [Date of Service]. My member ID is [Member ID].\n\
         \n\
         A billing audit found {count} processing errors that changed my patient responsibility:\n\
         \n\
         {issues}\n\
         \n\
         These are billing and coding errors, not coverage disputes.\n\
         \n\
         I need to:\n\
         1. File a formal appeal for claim reprocessing\n\
         2. Get the appeals mailing address and fax number\n\
         3. Understand your timeline for billing error appeals\n\
         \n\
         The total incorrect patient responsibility is {total}. What is the reference number for this call?\"\n\
         \n\
         Appeal deadline: {deadline} from EOB date\n\
         Expected resolution: 30 days per {state} regulations",
        count = findings.len(),
        issues = issues,
        total = total_savings,
        deadline = appeal_deadline(state.as_deref()),
        state = state.as_deref().unwrap_or("state"),
    );

    PhoneScripts { provider, payer }
}
