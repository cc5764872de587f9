//! Extracted documents and normalized line items
//!
//! The document-extraction collaborator hands over loosely typed documents
//! (`ExtractedDocument` / `RawLine`). The normalizer turns them into
//! `LineItem`s, which are never mutated afterwards: rules and the report
//! composer only read them and refer to them by `LineId`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use core_kernel::{LineId, LineSource, Money};

/// Kind of document produced by extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Bill,
    Eob,
}

impl DocumentType {
    /// Returns the line source for lines of this document
    pub fn line_source(&self) -> LineSource {
        match self {
            DocumentType::Bill => LineSource::Bill,
            DocumentType::Eob => LineSource::Eob,
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentType::Bill => write!(f, "bill"),
            DocumentType::Eob => write!(f, "eob"),
        }
    }
}

/// A loosely typed scalar as it arrives from extraction: a JSON number or a string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl RawValue {
    /// Renders the value as text, e.g. a numeric procedure code `36415.0` becomes `"36415"`
    pub fn as_text(&self) -> String {
        match self {
            RawValue::Number(n) if n.fract() == 0.0 && n.is_finite() => format!("{}", *n as i64),
            RawValue::Number(n) => n.to_string(),
            RawValue::Text(s) => s.clone(),
        }
    }
}

/// Modifiers arrive either as a list or as a comma separated string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawModifiers {
    List(Vec<String>),
    Text(String),
}

impl RawModifiers {
    /// Returns the individual modifier tokens
    pub fn tokens(&self) -> Vec<String> {
        match self {
            RawModifiers::List(items) => items.clone(),
            RawModifiers::Text(text) => text
                .split([',', ' ', ';'])
                .map(str::to_string)
                .collect(),
        }
    }
}

/// One extracted service line, exactly as the extraction collaborator produced it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawLine {
    #[serde(default)]
    pub date_of_service: Option<String>,
    #[serde(default)]
    pub code: Option<RawValue>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub units: Option<RawValue>,
    #[serde(default)]
    pub charge_amount: Option<RawValue>,
    #[serde(default)]
    pub unit_price: Option<RawValue>,
    #[serde(default)]
    pub allowed_amount: Option<RawValue>,
    #[serde(default)]
    pub plan_paid: Option<RawValue>,
    #[serde(default)]
    pub patient_responsibility: Option<RawValue>,
    #[serde(default)]
    pub adjustment: Option<RawValue>,
    #[serde(default)]
    pub deductible: Option<RawValue>,
    #[serde(default)]
    pub coinsurance: Option<RawValue>,
    #[serde(default)]
    pub modifiers: Option<RawModifiers>,
}

/// A whole extracted document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedDocument {
    #[serde(alias = "document_type")]
    pub document_type: DocumentType,
    #[serde(default, alias = "provider_name")]
    pub provider_name: Option<String>,
    #[serde(default, alias = "patient_name")]
    pub patient_name: Option<String>,
    #[serde(default, alias = "total_charges")]
    pub total_charges: Option<RawValue>,
    #[serde(default, alias = "statement_date")]
    pub statement_date: Option<String>,
    #[serde(default)]
    pub lines: Vec<RawLine>,
}

impl ExtractedDocument {
    /// Creates an empty document of the given type
    pub fn new(document_type: DocumentType) -> Self {
        Self {
            document_type,
            provider_name: None,
            patient_name: None,
            total_charges: None,
            statement_date: None,
            lines: Vec::new(),
        }
    }

    /// Adds a line
    pub fn with_line(mut self, line: RawLine) -> Self {
        self.lines.push(line);
        self
    }

    /// Sets the stated document total
    pub fn with_total_charges(mut self, total: impl Into<RawValue>) -> Self {
        self.total_charges = Some(total.into());
        self
    }

    /// Sets the statement date
    pub fn with_statement_date(mut self, date: impl Into<String>) -> Self {
        self.statement_date = Some(date.into());
        self
    }
}

/// A normalized bill or EOB line item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub line_id: LineId,
    pub source: LineSource,
    /// Canonical `MM/DD/YYYY`, or None when the extracted date was unusable
    pub date_of_service: Option<String>,
    /// Canonical procedure code without modifier suffix
    pub code: Option<String>,
    pub description: String,
    pub units: u32,
    #[serde(rename = "chargeCents")]
    pub charge: Money,
    #[serde(rename = "unitPriceCents", skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<Money>,
    #[serde(rename = "allowedCents", skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Money>,
    #[serde(rename = "planPaidCents", skip_serializing_if = "Option::is_none")]
    pub plan_paid: Option<Money>,
    #[serde(rename = "patientRespCents", skip_serializing_if = "Option::is_none")]
    pub patient_resp: Option<Money>,
    #[serde(rename = "adjustmentCents", skip_serializing_if = "Option::is_none")]
    pub adjustment: Option<Money>,
    #[serde(rename = "deductibleCents", skip_serializing_if = "Option::is_none")]
    pub deductible: Option<Money>,
    #[serde(rename = "coinsuranceCents", skip_serializing_if = "Option::is_none")]
    pub coinsurance: Option<Money>,
    pub modifiers: Vec<String>,
}

impl LineItem {
    /// Creates a line with only the mandatory fields set
    pub fn new(line_id: LineId, source: LineSource) -> Self {
        Self {
            line_id,
            source,
            date_of_service: None,
            code: None,
            description: String::new(),
            units: 1,
            charge: Money::zero(),
            unit_price: None,
            allowed: None,
            plan_paid: None,
            patient_resp: None,
            adjustment: None,
            deductible: None,
            coinsurance: None,
            modifiers: Vec::new(),
        }
    }

    /// Returns the code, or an empty string when absent
    pub fn code_str(&self) -> &str {
        self.code.as_deref().unwrap_or("")
    }

    /// Returns true if the line carries exactly this code
    pub fn has_code(&self, code: &str) -> bool {
        self.code.as_deref() == Some(code)
    }

    /// Returns the numeric value of a five digit CPT code
    pub fn cpt_number(&self) -> Option<u32> {
        let code = self.code.as_deref()?;
        if code.len() == 5 && code.bytes().all(|b| b.is_ascii_digit()) {
            code.parse().ok()
        } else {
            None
        }
    }

    /// Returns true if the code is a five digit CPT code within `low..=high`
    pub fn cpt_in_range(&self, low: u32, high: u32) -> bool {
        self.cpt_number().is_some_and(|n| (low..=high).contains(&n))
    }

    /// Returns true if the line carries the modifier
    pub fn has_modifier(&self, modifier: &str) -> bool {
        self.modifiers.iter().any(|m| m == modifier)
    }

    /// Returns true if the line carries any of the modifiers
    pub fn has_any_modifier(&self, modifiers: &[&str]) -> bool {
        modifiers.iter().any(|m| self.has_modifier(m))
    }

    /// Returns true if the lowercased description contains any keyword
    pub fn description_mentions(&self, keywords: &[&str]) -> bool {
        let lower = self.description.to_lowercase();
        keywords.iter().any(|k| lower.contains(k))
    }

    /// Parses the canonical service date
    pub fn service_date(&self) -> Option<NaiveDate> {
        parse_canonical_date(self.date_of_service.as_deref()?)
    }

    /// The amount the patient is asked to pay for this line: the stated
    /// patient responsibility when positive, otherwise the full charge
    pub fn patient_amount(&self) -> Money {
        match self.patient_resp {
            Some(resp) if resp.is_positive() => resp,
            _ => self.charge,
        }
    }

    /// Charge for a single unit
    pub fn per_unit_charge(&self) -> Money {
        self.charge.per_unit(self.units).unwrap_or(self.charge)
    }

    /// Returns true if both lines could describe the same day of service.
    /// A missing date is no evidence either way.
    pub fn same_day_as(&self, other: &LineItem) -> bool {
        match (&self.date_of_service, &other.date_of_service) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        }
    }

    /// Short label used in explanations, e.g. `36415 (Venipuncture)`
    pub fn label(&self) -> String {
        match (&self.code, self.description.is_empty()) {
            (Some(code), false) => format!("{} ({})", code, self.description),
            (Some(code), true) => code.clone(),
            (None, _) => self.description.clone(),
        }
    }
}

/// Parses a canonical `MM/DD/YYYY` date; two digit years are read as 20YY
pub fn parse_canonical_date(value: &str) -> Option<NaiveDate> {
    let mut parts = value.split('/');
    let month: u32 = parts.next()?.parse().ok()?;
    let day: u32 = parts.next()?.parse().ok()?;
    let year_part = parts.next()?;
    let mut year: i32 = year_part.parse().ok()?;
    if year_part.len() <= 2 {
        year += 2000;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(code: &str) -> LineItem {
        let mut item = LineItem::new(LineId::new(LineSource::Bill, 1), LineSource::Bill);
        item.code = Some(code.to_string());
        item
    }

    #[test]
    fn test_cpt_number_only_for_five_digits() {
        assert_eq!(line("82962").cpt_number(), Some(82962));
        assert_eq!(line("J7030").cpt_number(), None);
        assert_eq!(line("829").cpt_number(), None);
    }

    #[test]
    fn test_patient_amount_falls_back_to_charge() {
        let mut item = line("36415");
        item.charge = Money::from_cents(4500);
        assert_eq!(item.patient_amount().cents(), 4500);

        item.patient_resp = Some(Money::from_cents(900));
        assert_eq!(item.patient_amount().cents(), 900);

        item.patient_resp = Some(Money::zero());
        assert_eq!(item.patient_amount().cents(), 4500);
    }

    #[test]
    fn test_parse_canonical_date() {
        assert_eq!(
            parse_canonical_date("01/15/2024"),
            NaiveDate::from_ymd_opt(2024, 1, 15)
        );
        assert_eq!(
            parse_canonical_date("03/04/24"),
            NaiveDate::from_ymd_opt(2024, 3, 4)
        );
        assert_eq!(parse_canonical_date("13/40/2024"), None);
    }

    #[test]
    fn test_raw_value_text() {
        assert_eq!(RawValue::Number(36415.0).as_text(), "36415");
        assert_eq!(RawValue::Text("J7030".into()).as_text(), "J7030");
    }

    #[test]
    fn test_raw_modifiers_tokens() {
        let mods = RawModifiers::Text("RT, 59".to_string());
        let tokens: Vec<String> = mods.tokens().into_iter().filter(|t| !t.is_empty()).collect();
        assert_eq!(tokens, vec!["RT".to_string(), "59".to_string()]);
    }

    #[test]
    fn test_same_day_treats_missing_date_as_no_evidence() {
        let mut a = line("82962");
        let mut b = line("82962");
        assert!(a.same_day_as(&b));
        a.date_of_service = Some("01/01/2024".into());
        assert!(a.same_day_as(&b));
        b.date_of_service = Some("01/02/2024".into());
        assert!(!a.same_day_as(&b));
    }
}
