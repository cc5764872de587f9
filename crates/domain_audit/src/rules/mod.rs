//! The audit rule registry
//!
//! Each rule is a pure function over the shared, read-only `AuditInput`.
//! Rules never see each other's output; the executor in `engine` runs them
//! in priority order and isolates their failures.

use serde::{Deserialize, Serialize};
use std::fmt;

use core_kernel::LineId;

use crate::context::InsuranceContext;
use crate::error::RuleError;
use crate::finding::{Citation, Finding};
use crate::line::LineItem;
use crate::matcher::LineMatch;
use crate::normalizer::DocumentFacts;

pub mod clinical;
pub mod coding;
pub mod coverage;
pub mod duplicates;
pub mod math;
pub mod packaging;

/// Stable identifier of each rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RuleId {
    R01,
    R02,
    R03,
    R04,
    R05,
    R06,
    R07,
    R08,
    R09,
    R10,
    R11,
    R12,
    R13,
    R14,
    R15,
    R16,
    R17,
    R18,
}

impl RuleId {
    /// Every rule in registration order
    pub const ALL: [RuleId; 18] = [
        RuleId::R01,
        RuleId::R02,
        RuleId::R03,
        RuleId::R04,
        RuleId::R05,
        RuleId::R06,
        RuleId::R07,
        RuleId::R08,
        RuleId::R09,
        RuleId::R10,
        RuleId::R11,
        RuleId::R12,
        RuleId::R13,
        RuleId::R14,
        RuleId::R15,
        RuleId::R16,
        RuleId::R17,
        RuleId::R18,
    ];

    /// Human readable rule name
    pub fn name(&self) -> &'static str {
        match self {
            RuleId::R01 => "Packaged Venipuncture",
            RuleId::R02 => "Packaged IV Fluids",
            RuleId::R03 => "Packaged OTC Medications",
            RuleId::R04 => "Duplicate Charges",
            RuleId::R05 => "Unlisted Drug Codes",
            RuleId::R06 => "J-Code Unit Errors",
            RuleId::R07 => "Modifier Misuse",
            RuleId::R08 => "Unbundling/PTP Edits",
            RuleId::R09 => "Global Surgical Package",
            RuleId::R10 => "Therapy Time Units",
            RuleId::R11 => "Observation vs Inpatient",
            RuleId::R12 => "Room & Board LOS",
            RuleId::R13 => "Timely Filing",
            RuleId::R14 => "COB/Primary Missing",
            RuleId::R15 => "EOB Zero Billed Amount",
            RuleId::R16 => "Math/Posting Errors",
            RuleId::R17 => "TiC Price Outliers",
            RuleId::R18 => "Missing Itemized Bill",
        }
    }

    /// Execution tier of the rule
    pub fn priority(&self) -> Priority {
        match self {
            RuleId::R01 | RuleId::R02 | RuleId::R03 | RuleId::R15 | RuleId::R16 | RuleId::R18 => {
                Priority::Objective
            }
            RuleId::R04 | RuleId::R05 | RuleId::R06 | RuleId::R07 | RuleId::R10 | RuleId::R12 => {
                Priority::Pattern
            }
            RuleId::R08 | RuleId::R09 | RuleId::R11 | RuleId::R13 | RuleId::R14 | RuleId::R17 => {
                Priority::Contextual
            }
        }
    }

    /// Rules whose firing raises the confidence of a run
    pub fn boosts_run_confidence(&self) -> bool {
        matches!(
            self,
            RuleId::R01 | RuleId::R02 | RuleId::R03 | RuleId::R04 | RuleId::R15 | RuleId::R16
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleId::R01 => "R01",
            RuleId::R02 => "R02",
            RuleId::R03 => "R03",
            RuleId::R04 => "R04",
            RuleId::R05 => "R05",
            RuleId::R06 => "R06",
            RuleId::R07 => "R07",
            RuleId::R08 => "R08",
            RuleId::R09 => "R09",
            RuleId::R10 => "R10",
            RuleId::R11 => "R11",
            RuleId::R12 => "R12",
            RuleId::R13 => "R13",
            RuleId::R14 => "R14",
            RuleId::R15 => "R15",
            RuleId::R16 => "R16",
            RuleId::R17 => "R17",
            RuleId::R18 => "R18",
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rule tiers; lower values run first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Objective, high-confidence checks
    Objective = 1,
    /// Pattern based checks
    Pattern = 2,
    /// Checks that depend on plan context
    Contextual = 3,
}

impl Priority {
    pub fn tier(&self) -> u8 {
        *self as u8
    }
}

/// Everything a rule may read
#[derive(Debug, Clone, Copy)]
pub struct AuditInput<'a> {
    pub bill_lines: &'a [LineItem],
    pub eob_lines: &'a [LineItem],
    pub matches: &'a [LineMatch],
    pub context: &'a InsuranceContext,
    pub bill_facts: &'a DocumentFacts,
}

impl<'a> AuditInput<'a> {
    /// The EOB line matched to a bill line, if any
    pub fn matched_eob(&self, bill_line: &LineItem) -> Option<&'a LineItem> {
        let eob_id = self
            .matches
            .iter()
            .find(|m| m.bill_line_id == bill_line.line_id)?
            .eob_line_id
            .as_ref()?;
        self.eob_lines.iter().find(|l| &l.line_id == eob_id)
    }

    /// Bill lines paired with their matched EOB line
    pub fn matched_pairs(&self) -> impl Iterator<Item = (&'a LineItem, &'a LineItem)> + 'a {
        let input = *self;
        self.bill_lines
            .iter()
            .filter_map(move |bill| input.matched_eob(bill).map(|eob| (bill, eob)))
    }

    /// Looks up any normalized line by id
    pub fn line(&self, id: &LineId) -> Option<&'a LineItem> {
        self.bill_lines
            .iter()
            .chain(self.eob_lines.iter())
            .find(|l| &l.line_id == id)
    }

    /// Returns true if the id belongs to a normalized line
    pub fn knows(&self, id: &LineId) -> bool {
        self.line(id).is_some()
    }
}

/// Signature shared by every rule
pub type RuleFn = fn(&AuditInput<'_>) -> Result<Vec<Finding>, RuleError>;

/// A registered rule
#[derive(Clone, Copy)]
pub struct RuleDefinition {
    pub id: RuleId,
    pub evaluate: RuleFn,
}

impl RuleDefinition {
    pub const fn new(id: RuleId, evaluate: RuleFn) -> Self {
        Self { id, evaluate }
    }
}

impl fmt::Debug for RuleDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleDefinition")
            .field("id", &self.id)
            .field("name", &self.id.name())
            .finish()
    }
}

/// The standard catalogue in registration order
pub static STANDARD_RULES: [RuleDefinition; 18] = [
    RuleDefinition::new(RuleId::R01, packaging::packaged_venipuncture),
    RuleDefinition::new(RuleId::R02, packaging::packaged_iv_fluids),
    RuleDefinition::new(RuleId::R03, packaging::packaged_otc_medications),
    RuleDefinition::new(RuleId::R04, duplicates::duplicate_charges),
    RuleDefinition::new(RuleId::R05, coding::unlisted_drug_codes),
    RuleDefinition::new(RuleId::R06, coding::jcode_unit_errors),
    RuleDefinition::new(RuleId::R07, coding::modifier_misuse),
    RuleDefinition::new(RuleId::R08, coding::unbundling_ptp),
    RuleDefinition::new(RuleId::R09, clinical::global_surgical_package),
    RuleDefinition::new(RuleId::R10, clinical::therapy_time_units),
    RuleDefinition::new(RuleId::R11, clinical::observation_vs_inpatient),
    RuleDefinition::new(RuleId::R12, clinical::room_and_board_los),
    RuleDefinition::new(RuleId::R13, coverage::timely_filing),
    RuleDefinition::new(RuleId::R14, coverage::cob_primary_missing),
    RuleDefinition::new(RuleId::R15, coverage::eob_zero_billed),
    RuleDefinition::new(RuleId::R16, math::math_posting_errors),
    RuleDefinition::new(RuleId::R17, coverage::tic_price_outliers),
    RuleDefinition::new(RuleId::R18, coverage::missing_itemized_bill),
];

/// Citations shared by several rules
pub(crate) mod citations {
    use super::Citation;

    pub fn ncci(title: &str) -> Citation {
        Citation::new("CMS National Correct Coding Initiative (NCCI)", title)
    }

    pub fn fcba(title: &str) -> Citation {
        Citation::new("Fair Credit Billing Act", title)
    }

    pub fn facta(title: &str) -> Citation {
        Citation::new("Fair and Accurate Credit Transactions Act", title)
    }

    pub fn claims_processing(title: &str) -> Citation {
        Citation::new("CMS Medicare Claims Processing Manual", title)
    }

    pub fn no_surprises(title: &str) -> Citation {
        Citation::new("No Surprises Act", title)
    }
}

/// Evaluation and management office visit codes
pub(crate) fn is_em_visit(line: &LineItem) -> bool {
    line.cpt_in_range(99202, 99499)
}

/// Surgical procedure codes
pub(crate) fn is_surgical(line: &LineItem) -> bool {
    line.cpt_in_range(10000, 69999)
}
