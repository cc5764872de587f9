//! Pay-what-you-save price calculation

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use core_kernel::Money;

/// Floor of the report price in whole dollars
pub const MIN_PRICE_DOLLARS: i64 = 29;

/// Ceiling of the report price in whole dollars
pub const MAX_PRICE_DOLLARS: i64 = 199;

/// Share of the savings charged for the report
pub const SAVINGS_SHARE_PERCENT: u8 = 10;

/// Which part of the pricing curve produced the price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PricingModel {
    /// Price sits at the floor
    Minimum,
    /// Ten percent of savings, rounded to the dollar
    Percentage,
    /// Price sits at the ceiling
    Maximum,
}

impl fmt::Display for PricingModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PricingModel::Minimum => "minimum",
            PricingModel::Percentage => "percentage",
            PricingModel::Maximum => "maximum",
        };
        f.write_str(label)
    }
}

/// Price offered to the payment collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    pub price_dollars: i64,
    pub model: PricingModel,
    /// e.g. `$100`
    pub display_price: String,
    #[serde(rename = "savingsCents")]
    pub savings: Money,
    pub percentage: u8,
    /// Savings divided by price, one decimal place; zero without savings
    pub savings_ratio: f64,
    pub justification: String,
}

/// Ten percent of savings before clamping, rounded half away from zero
fn unclamped_price(savings: Money) -> i64 {
    let share = Decimal::from(SAVINGS_SHARE_PERCENT) / dec!(100);
    (savings.to_dollars() * share)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or(MAX_PRICE_DOLLARS)
}

/// Report price in whole dollars: 10% of savings, clamped to `$29..=$199`
pub fn calculate_price(savings: Money) -> i64 {
    unclamped_price(savings).clamp(MIN_PRICE_DOLLARS, MAX_PRICE_DOLLARS)
}

fn savings_ratio(savings: Money, price_dollars: i64) -> Decimal {
    if !savings.is_positive() || price_dollars <= 0 {
        return Decimal::ZERO;
    }
    (savings.to_dollars() / Decimal::from(price_dollars))
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

fn justification(ratio: Decimal) -> String {
    if ratio >= dec!(10) {
        format!(
            "Save {}x what you pay!",
            ratio.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        )
    } else if ratio >= dec!(5) {
        format!("Get back {:.1}x your investment", ratio)
    } else if ratio >= dec!(2) {
        format!("Save {:.1}x the cost", ratio)
    } else {
        "Professional audit at minimum price".to_string()
    }
}

/// Full quote for the given savings
pub fn quote(savings: Money) -> PriceQuote {
    let price_dollars = unclamped_price(savings).clamp(MIN_PRICE_DOLLARS, MAX_PRICE_DOLLARS);
    let model = if price_dollars == MIN_PRICE_DOLLARS {
        PricingModel::Minimum
    } else if price_dollars == MAX_PRICE_DOLLARS {
        PricingModel::Maximum
    } else {
        PricingModel::Percentage
    };
    let ratio = savings_ratio(savings, price_dollars);

    debug!(
        savings_cents = savings.cents(),
        price_dollars,
        model = %model,
        "Priced audit report"
    );

    PriceQuote {
        price_dollars,
        model,
        display_price: format!("${}", price_dollars),
        savings,
        percentage: SAVINGS_SHARE_PERCENT,
        savings_ratio: ratio.to_f64().unwrap_or_default(),
        justification: justification(ratio),
    }
}
