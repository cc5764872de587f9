//! Caller supplied insurance plan parameters
//!
//! Every field is optional. Rules that need a missing field simply do not
//! fire; nothing here is ever derived from the documents.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{Money, Rate};

/// Default timely filing window when the plan does not state one
pub const DEFAULT_TIMELY_FILING_DAYS: u32 = 365;

/// Plan parameters of the patient's coverage. Amounts travel as dollars.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsuranceContext {
    #[serde(default, with = "dollars")]
    pub deductible: Option<Money>,
    #[serde(default, with = "dollars")]
    pub deductible_met: Option<Money>,
    /// Coinsurance as a percentage, e.g. `20` for 20%
    #[serde(default, alias = "coinsurance")]
    pub coinsurance_percent: Option<Decimal>,
    #[serde(default, with = "dollars")]
    pub out_of_pocket_max: Option<Money>,
    #[serde(default, with = "dollars")]
    pub out_of_pocket_spent: Option<Money>,
    #[serde(default, with = "dollars")]
    pub copay: Option<Money>,
    #[serde(default)]
    pub payer: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub timely_filing_days: Option<u32>,
    #[serde(default)]
    pub has_secondary_coverage: Option<bool>,
}

impl InsuranceContext {
    /// Deductible still to be met, never negative
    pub fn remaining_deductible(&self) -> Option<Money> {
        let deductible = self.deductible?;
        let met = self.deductible_met?;
        Some((deductible - met).non_negative())
    }

    /// Coinsurance as a rate
    pub fn coinsurance_rate(&self) -> Option<Rate> {
        self.coinsurance_percent.map(Rate::from_percentage)
    }

    /// Out-of-pocket room left before the maximum is reached
    pub fn remaining_out_of_pocket(&self) -> Option<Money> {
        let max = self.out_of_pocket_max?;
        let spent = self.out_of_pocket_spent.unwrap_or_default();
        Some((max - spent).non_negative())
    }

    /// Timely filing window in days
    pub fn timely_filing_limit_days(&self) -> u32 {
        self.timely_filing_days.unwrap_or(DEFAULT_TIMELY_FILING_DAYS)
    }

    /// Upper-cased two letter state code, if given
    pub fn state_code(&self) -> Option<String> {
        self.state
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_uppercase)
    }

    pub fn has_secondary(&self) -> bool {
        self.has_secondary_coverage.unwrap_or(false)
    }
}

/// Optional money fields (de)serialized as decimal dollars.
/// Unparseable amounts are read as absent.
mod dollars {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use core_kernel::Money;

    use crate::line::RawValue;
    use crate::normalizer::dollars_to_cents;

    pub fn serialize<S: Serializer>(value: &Option<Money>, serializer: S) -> Result<S::Ok, S::Error> {
        value.map(|m| m.to_dollars()).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Money>, D::Error> {
        let raw = Option::<RawValue>::deserialize(deserializer)?;
        Ok(raw.map(|r| dollars_to_cents(&r)).and_then(|n| {
            if n.was_defaulted {
                None
            } else {
                Some(n.value)
            }
        }))
    }
}
