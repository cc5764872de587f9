//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating random bill and EOB data
//! that respects the normalized line item invariants.

use core_kernel::{LineId, LineSource, Money};
use domain_audit::LineItem;
use proptest::collection::vec;
use proptest::prelude::*;

/// Codes that exercise several rules at once
const CODE_POOL: &[&str] = &[
    "36415", "82962", "85025", "99213", "99284", "96365", "J7030", "J1100", "97110", "G0378",
];

const DESCRIPTION_POOL: &[&str] = &[
    "Venipuncture",
    "Glucose test",
    "Complete blood count",
    "Office visit",
    "Emergency department visit",
    "IV infusion",
    "Normal saline",
    "Dexamethasone injection",
    "Therapeutic exercise",
    "Observation",
];

/// Strategy for non-negative cent amounts up to $100,000
pub fn cents_strategy() -> impl Strategy<Value = i64> {
    0i64..10_000_000i64
}

/// Strategy for non-negative Money values
pub fn money_strategy() -> impl Strategy<Value = Money> {
    cents_strategy().prop_map(Money::from_cents)
}

/// Strategy for a dollar string with up to two decimals, paired with its
/// exact cent value
pub fn dollar_text_strategy() -> impl Strategy<Value = (String, i64)> {
    (0i64..100_000_000i64, any::<bool>(), any::<bool>()).prop_map(|(cents, symbol, grouped)| {
        let whole = (cents / 100).to_string();
        let whole = if grouped {
            let mut out = String::new();
            for (i, ch) in whole.chars().enumerate() {
                if i > 0 && (whole.len() - i) % 3 == 0 {
                    out.push(',');
                }
                out.push(ch);
            }
            out
        } else {
            whole
        };
        let prefix = if symbol { "$" } else { "" };
        (format!("{}{}.{:02}", prefix, whole, cents % 100), cents)
    })
}

/// Strategy for canonical `MM/DD/YYYY` dates in January 2024
pub fn canonical_date_strategy() -> impl Strategy<Value = String> {
    (1u32..=28u32).prop_map(|day| format!("01/{:02}/2024", day))
}

/// Strategy for procedure codes drawn from a small pool, so collisions happen
pub fn code_strategy() -> impl Strategy<Value = String> {
    proptest::sample::select(CODE_POOL).prop_map(str::to_string)
}

pub fn description_strategy() -> impl Strategy<Value = String> {
    proptest::sample::select(DESCRIPTION_POOL).prop_map(str::to_string)
}

prop_compose! {
    /// A normalized line with an id placeholder; see [`line_set_strategy`]
    pub fn line_item_strategy(source: LineSource)(
        code in proptest::option::weighted(0.9, code_strategy()),
        description in description_strategy(),
        date in proptest::option::weighted(0.9, canonical_date_strategy()),
        units in 1u32..5u32,
        charge in 0i64..500_000i64,
        allowed in proptest::option::of(0i64..300_000i64),
        patient_resp in proptest::option::of(0i64..100_000i64),
    ) -> LineItem {
        let mut item = LineItem::new(LineId::new(source, 1), source);
        item.code = code;
        item.description = description;
        item.date_of_service = date;
        item.units = units;
        item.charge = Money::from_cents(charge);
        if source == LineSource::Eob {
            item.allowed = allowed.map(Money::from_cents);
        }
        item.patient_resp = patient_resp.map(Money::from_cents);
        item
    }
}

/// Strategy for a document's worth of lines with sequential ids
pub fn line_set_strategy(source: LineSource, max_lines: usize) -> impl Strategy<Value = Vec<LineItem>> {
    vec(line_item_strategy(source), 0..=max_lines).prop_map(move |mut lines| {
        for (index, line) in lines.iter_mut().enumerate() {
            line.line_id = LineId::new(source, index + 1);
        }
        lines
    })
}
