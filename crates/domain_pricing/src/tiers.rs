//! Service tiers built on top of the basic report price, plus the refund
//! guarantee check

use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use core_kernel::{Money, MoneyError};

use crate::calculator::{quote, PriceQuote};

/// Premium support is capped at $299
const PREMIUM_CAP: Money = Money::from_cents(29_900);

/// Full service is capped at $499
const FULL_SERVICE_CAP: Money = Money::from_cents(49_900);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ServiceTier {
    Basic,
    Premium,
    FullService,
}

impl ServiceTier {
    pub fn name(&self) -> &'static str {
        match self {
            ServiceTier::Basic => "Basic Audit Report",
            ServiceTier::Premium => "Premium Support",
            ServiceTier::FullService => "Full Service",
        }
    }

    pub fn features(&self) -> &'static [&'static str] {
        match self {
            ServiceTier::Basic => &[
                "Full audit report",
                "All billing errors identified",
                "Appeal letter template",
                "Phone scripts",
            ],
            ServiceTier::Premium => &[
                "Everything in Basic",
                "30-day email support",
                "Personalized appeal review",
                "Follow-up assistance",
            ],
            ServiceTier::FullService => &[
                "Everything in Premium",
                "Appeals handled on your behalf",
                "90-day support",
                "Multiple bill reviews",
            ],
        }
    }
}

/// One purchasable offer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierOffer {
    pub tier: ServiceTier,
    pub name: String,
    #[serde(rename = "priceCents")]
    pub price: Money,
    /// e.g. `$43.50`
    pub display_price: String,
    pub features: Vec<String>,
}

impl TierOffer {
    fn new(tier: ServiceTier, price: Money) -> Self {
        Self {
            tier,
            name: tier.name().to_string(),
            price,
            display_price: price.to_string(),
            features: tier.features().iter().map(|f| f.to_string()).collect(),
        }
    }
}

/// The three offers for one audit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TieredPricing {
    pub quote: PriceQuote,
    pub basic: TierOffer,
    pub premium: TierOffer,
    pub full_service: TierOffer,
}

/// Basic is the quoted price; premium is 1.5x capped at $299 and full
/// service 2.5x capped at $499
pub fn tiered_pricing(savings: Money) -> Result<TieredPricing, MoneyError> {
    let quote = quote(savings);
    let basic = Money::from_cents(quote.price_dollars * 100);
    let premium = basic.multiply(dec!(1.5))?.min(PREMIUM_CAP);
    let full_service = basic.multiply(dec!(2.5))?.min(FULL_SERVICE_CAP);

    Ok(TieredPricing {
        basic: TierOffer::new(ServiceTier::Basic, basic),
        premium: TierOffer::new(ServiceTier::Premium, premium),
        full_service: TierOffer::new(ServiceTier::FullService, full_service),
        quote,
    })
}

/// The money-back guarantee applies when the savings actually recovered are
/// less than twice the price paid
pub fn is_refund_eligible(price_dollars: i64, actual_savings: Money) -> bool {
    actual_savings.cents() < price_dollars.saturating_mul(200)
}
