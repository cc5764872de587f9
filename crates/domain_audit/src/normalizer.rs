//! Line normalization
//!
//! Converts loosely typed extraction output into canonical `LineItem`s.
//! Malformed scalars never raise: they fall back to a default value and the
//! fallback is reported through `Normalized::was_defaulted`.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use core_kernel::{LineId, LineSource, Money};

use crate::error::AuditError;
use crate::line::{DocumentType, ExtractedDocument, LineItem, RawLine, RawValue};

/// A normalized value together with whether it had to be defaulted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Normalized<T> {
    pub value: T,
    pub was_defaulted: bool,
}

impl<T> Normalized<T> {
    /// A value taken from the input as-is
    pub fn parsed(value: T) -> Self {
        Self {
            value,
            was_defaulted: false,
        }
    }

    /// A fallback used because the input was unusable
    pub fn defaulted(value: T) -> Self {
        Self {
            value,
            was_defaulted: true,
        }
    }
}

/// Normalizes a service date to `MM/DD/YYYY`.
///
/// Characters other than digits, `/` and `-` are dropped, month and day are
/// zero padded. ISO `YYYY-MM-DD` input is reordered. Anything that does not
/// split into three numeric parts yields `None`.
pub fn normalize_date(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '/' || *c == '-')
        .collect();

    let parts: Vec<&str> = cleaned
        .split(['/', '-'])
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() != 3 {
        return None;
    }

    let (month, day, year) = if parts[0].len() == 4 {
        (parts[1], parts[2], parts[0])
    } else {
        (parts[0], parts[1], parts[2])
    };

    if month.len() > 2 || day.len() > 2 {
        return None;
    }

    Some(format!("{:0>2}/{:0>2}/{}", month, day, year))
}

/// Normalizes a procedure code: trimmed, uppercased, restricted to word
/// characters and hyphens. Empty results are `None`.
pub fn normalize_code(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .collect::<String>()
        .to_uppercase();

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Converts a dollar amount (number or `"$1,234.56"` string) to cents.
/// Unparseable and negative input defaults to zero.
pub fn dollars_to_cents(raw: &RawValue) -> Normalized<Money> {
    let parsed = match raw {
        RawValue::Number(n) if n.is_finite() => Decimal::from_f64(*n)
            .and_then(|dollars| Money::from_dollars(dollars).ok()),
        RawValue::Number(_) => None,
        RawValue::Text(text) => Money::parse_dollars(text).ok(),
    };

    match parsed {
        Some(money) if !money.is_negative() => Normalized::parsed(money),
        _ => Normalized::defaulted(Money::zero()),
    }
}

/// Like `dollars_to_cents` but keeps absence distinct from zero
pub fn optional_cents(raw: Option<&RawValue>) -> Option<Normalized<Money>> {
    raw.map(dollars_to_cents)
}

/// Units are whole and at least one; missing, zero or garbage input becomes 1
pub fn normalize_units(raw: Option<&RawValue>) -> Normalized<u32> {
    let number = match raw {
        Some(RawValue::Number(n)) => Some(*n),
        Some(RawValue::Text(text)) => text.trim().parse::<f64>().ok(),
        None => return Normalized::defaulted(1),
    };

    match number {
        Some(n) if n.is_finite() && n >= 1.0 && n <= f64::from(u32::MAX) => {
            Normalized::parsed(n.round() as u32)
        }
        _ => Normalized::defaulted(1),
    }
}

/// Document level facts that rules may consult
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentFacts {
    pub provider_name: Option<String>,
    pub patient_name: Option<String>,
    #[serde(rename = "totalChargesCents")]
    pub total_charges: Option<Money>,
    pub statement_date: Option<String>,
}

/// The normalized form of one extracted document
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedDocument {
    pub document_type: DocumentType,
    pub lines: Vec<LineItem>,
    pub facts: DocumentFacts,
    /// Count of scalar fields that fell back to a default
    pub defaulted_fields: usize,
    /// Raw lines dropped for carrying neither code nor description
    pub dropped_lines: usize,
}

/// Normalizes every line of a document.
///
/// Line ids follow the 1-based raw position, so dropped noise lines leave
/// gaps instead of renumbering the survivors.
pub fn normalize_document(document: &ExtractedDocument) -> NormalizedDocument {
    let source = document.document_type.line_source();
    let mut defaulted_fields = 0;
    let mut dropped_lines = 0;
    let mut lines = Vec::with_capacity(document.lines.len());

    for (index, raw) in document.lines.iter().enumerate() {
        match normalize_line(raw, source, index + 1, &mut defaulted_fields) {
            Some(item) => lines.push(item),
            None => dropped_lines += 1,
        }
    }

    let total_charges = document
        .total_charges
        .as_ref()
        .map(dollars_to_cents)
        .and_then(|n| {
            if n.was_defaulted {
                defaulted_fields += 1;
                None
            } else {
                Some(n.value)
            }
        });

    let facts = DocumentFacts {
        provider_name: clean_text(document.provider_name.as_deref()),
        patient_name: clean_text(document.patient_name.as_deref()),
        total_charges,
        statement_date: document.statement_date.as_deref().and_then(normalize_date),
    };

    debug!(
        document_type = %document.document_type,
        lines = lines.len(),
        dropped_lines,
        defaulted_fields,
        "Normalized document"
    );

    NormalizedDocument {
        document_type: document.document_type,
        lines,
        facts,
        defaulted_fields,
        dropped_lines,
    }
}

/// Normalizes a document that was supplied in the slot for `expected`,
/// rejecting an EOB handed over as a bill and vice versa
pub fn normalize_as(
    document: &ExtractedDocument,
    expected: DocumentType,
) -> Result<NormalizedDocument, AuditError> {
    if document.document_type != expected {
        return Err(AuditError::DocumentTypeMismatch {
            expected,
            found: document.document_type,
        });
    }
    Ok(normalize_document(document))
}

fn normalize_line(
    raw: &RawLine,
    source: LineSource,
    position: usize,
    defaulted: &mut usize,
) -> Option<LineItem> {
    let description = clean_text(raw.description.as_deref()).unwrap_or_default();

    let mut modifiers: Vec<String> = Vec::new();
    let code = raw
        .code
        .as_ref()
        .and_then(|value| normalize_code(&value.as_text()))
        .map(|code| split_modifier_suffix(&code, &mut modifiers));

    if code.is_none() && description.is_empty() {
        return None;
    }

    if let Some(raw_modifiers) = &raw.modifiers {
        for token in raw_modifiers.tokens() {
            if let Some(modifier) = normalize_code(&token) {
                if !modifiers.contains(&modifier) {
                    modifiers.push(modifier);
                }
            }
        }
    }

    let mut take = |value: Option<&RawValue>| -> Option<Money> {
        optional_cents(value).map(|n| {
            if n.was_defaulted {
                *defaulted += 1;
            }
            n.value
        })
    };

    let charge = take(raw.charge_amount.as_ref());
    let unit_price = take(raw.unit_price.as_ref());
    let allowed = take(raw.allowed_amount.as_ref());
    let plan_paid = take(raw.plan_paid.as_ref());
    let patient_resp = take(raw.patient_responsibility.as_ref());
    let adjustment = take(raw.adjustment.as_ref());
    let deductible = take(raw.deductible.as_ref());
    let coinsurance = take(raw.coinsurance.as_ref());

    let units = normalize_units(raw.units.as_ref());
    if units.was_defaulted && raw.units.is_some() {
        *defaulted += 1;
    }

    let date_of_service = raw.date_of_service.as_deref().and_then(normalize_date);
    if date_of_service.is_none() && raw.date_of_service.is_some() {
        *defaulted += 1;
    }

    let mut item = LineItem::new(LineId::new(source, position), source);
    item.date_of_service = date_of_service;
    item.code = code;
    item.description = description;
    item.units = units.value;
    item.charge = charge.unwrap_or_default();
    item.unit_price = unit_price;
    item.allowed = allowed;
    item.plan_paid = plan_paid;
    item.patient_resp = patient_resp;
    item.adjustment = adjustment;
    item.deductible = deductible;
    item.coinsurance = coinsurance;
    item.modifiers = modifiers;
    Some(item)
}

/// Splits `99213-25` into `99213` and pushes `25` as a modifier. Codes whose
/// suffix is not a two character modifier are kept whole.
fn split_modifier_suffix(code: &str, modifiers: &mut Vec<String>) -> String {
    if let Some((base, suffix)) = code.split_once('-') {
        if !base.is_empty() && suffix.len() == 2 && suffix.chars().all(char::is_alphanumeric) {
            modifiers.push(suffix.to_string());
            return base.to_string();
        }
    }
    code.to_string()
}

fn clean_text(raw: Option<&str>) -> Option<String> {
    let collapsed = raw?.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_date_pads_and_strips_noise() {
        assert_eq!(normalize_date("1/5/2024"), Some("01/05/2024".to_string()));
        assert_eq!(normalize_date("01-15-2024"), Some("01/15/2024".to_string()));
        assert_eq!(normalize_date("DOS: 3/4/24"), Some("03/04/24".to_string()));
        assert_eq!(normalize_date("2024-02-09"), Some("02/09/2024".to_string()));
    }

    #[test]
    fn test_normalize_date_unparseable_is_none() {
        assert_eq!(normalize_date(""), None);
        assert_eq!(normalize_date("January"), None);
        assert_eq!(normalize_date("01/2024"), None);
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code(" 36415 "), Some("36415".to_string()));
        assert_eq!(normalize_code("j7030."), Some("J7030".to_string()));
        assert_eq!(normalize_code("99213-25"), Some("99213-25".to_string()));
        assert_eq!(normalize_code(" .. "), None);
    }

    #[test]
    fn test_dollars_to_cents_defaults_are_explicit() {
        let ok = dollars_to_cents(&RawValue::Text("$1,234.56".into()));
        assert_eq!(ok, Normalized::parsed(Money::from_cents(123456)));

        let garbage = dollars_to_cents(&RawValue::Text("N/A".into()));
        assert_eq!(garbage, Normalized::defaulted(Money::zero()));

        let zero = dollars_to_cents(&RawValue::Number(0.0));
        assert_eq!(zero, Normalized::parsed(Money::zero()));

        let negative = dollars_to_cents(&RawValue::Number(-5.0));
        assert!(negative.was_defaulted);
    }

    #[test]
    fn test_units_default_to_one() {
        assert_eq!(normalize_units(None).value, 1);
        assert_eq!(normalize_units(Some(&RawValue::Number(0.0))).value, 1);
        assert_eq!(normalize_units(Some(&RawValue::Text("3".into()))).value, 3);
        assert!(normalize_units(Some(&RawValue::Text("two".into()))).was_defaulted);
    }

    #[test]
    fn test_split_modifier_suffix() {
        let mut mods = Vec::new();
        assert_eq!(split_modifier_suffix("99213-25", &mut mods), "99213");
        assert_eq!(mods, vec!["25".to_string()]);

        let mut none = Vec::new();
        assert_eq!(split_modifier_suffix("A-123", &mut none), "A-123");
        assert!(none.is_empty());
    }
}
