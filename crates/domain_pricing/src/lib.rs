//! Audit Pricing Domain
//!
//! Prices the full audit report as a share of the savings it found:
//!
//! ```text
//! price = clamp(round(savings * 10%), $29, $199)
//! ```
//!
//! Everything here is pure. The checkout flow that consumes a
//! [`PriceQuote`] lives outside this workspace.

pub mod calculator;
pub mod tiers;

pub use calculator::{
    calculate_price, quote, PriceQuote, PricingModel, MAX_PRICE_DOLLARS, MIN_PRICE_DOLLARS,
    SAVINGS_SHARE_PERCENT,
};
pub use tiers::{is_refund_eligible, tiered_pricing, ServiceTier, TierOffer, TieredPricing};
