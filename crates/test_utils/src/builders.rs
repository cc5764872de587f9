//! Test Data Builders
//!
//! Provides builder patterns for constructing test data with sensible defaults.
//! These builders allow tests to specify only the relevant fields while using
//! defaults for everything else.

use core_kernel::{LineId, LineSource, Money};
use domain_audit::{
    AuditEngine, AuditInput, DocumentFacts, EngineResult, InsuranceContext, LineItem, LineMatch,
    LineMatcher, RawLine, RawModifiers, RawValue,
};

use crate::fixtures::TemporalFixtures;

/// Builder for normalized line items
#[derive(Debug, Clone)]
pub struct LineItemBuilder {
    item: LineItem,
}

impl LineItemBuilder {
    /// Starts a bill line at the 1-based `position`
    pub fn bill(position: usize) -> Self {
        Self::at(LineSource::Bill, position)
    }

    /// Starts an EOB line at the 1-based `position`
    pub fn eob(position: usize) -> Self {
        Self::at(LineSource::Eob, position)
    }

    fn at(source: LineSource, position: usize) -> Self {
        let mut item = LineItem::new(LineId::new(source, position), source);
        item.date_of_service = Some(TemporalFixtures::service_date().to_string());
        Self { item }
    }

    /// Sets the procedure code
    pub fn code(mut self, code: &str) -> Self {
        self.item.code = Some(code.to_string());
        self
    }

    /// Clears the procedure code
    pub fn uncoded(mut self) -> Self {
        self.item.code = None;
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.item.description = description.to_string();
        self
    }

    /// Sets the canonical date of service
    pub fn date(mut self, date: &str) -> Self {
        self.item.date_of_service = Some(date.to_string());
        self
    }

    pub fn undated(mut self) -> Self {
        self.item.date_of_service = None;
        self
    }

    pub fn units(mut self, units: u32) -> Self {
        self.item.units = units;
        self
    }

    pub fn charge_cents(mut self, cents: i64) -> Self {
        self.item.charge = Money::from_cents(cents);
        self
    }

    pub fn unit_price_cents(mut self, cents: i64) -> Self {
        self.item.unit_price = Some(Money::from_cents(cents));
        self
    }

    pub fn allowed_cents(mut self, cents: i64) -> Self {
        self.item.allowed = Some(Money::from_cents(cents));
        self
    }

    pub fn plan_paid_cents(mut self, cents: i64) -> Self {
        self.item.plan_paid = Some(Money::from_cents(cents));
        self
    }

    pub fn patient_resp_cents(mut self, cents: i64) -> Self {
        self.item.patient_resp = Some(Money::from_cents(cents));
        self
    }

    pub fn adjustment_cents(mut self, cents: i64) -> Self {
        self.item.adjustment = Some(Money::from_cents(cents));
        self
    }

    pub fn deductible_cents(mut self, cents: i64) -> Self {
        self.item.deductible = Some(Money::from_cents(cents));
        self
    }

    pub fn coinsurance_cents(mut self, cents: i64) -> Self {
        self.item.coinsurance = Some(Money::from_cents(cents));
        self
    }

    /// Adds a modifier
    pub fn modifier(mut self, modifier: &str) -> Self {
        self.item.modifiers.push(modifier.to_string());
        self
    }

    pub fn build(self) -> LineItem {
        self.item
    }
}

/// Builder for raw extracted lines, amounts given in dollars as the
/// extraction collaborator would send them
#[derive(Debug, Clone, Default)]
pub struct RawLineBuilder {
    line: RawLine,
}

impl RawLineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn code(mut self, code: &str) -> Self {
        self.line.code = Some(RawValue::from(code));
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.line.description = Some(description.to_string());
        self
    }

    pub fn date(mut self, date: &str) -> Self {
        self.line.date_of_service = Some(date.to_string());
        self
    }

    pub fn units(mut self, units: impl Into<RawValue>) -> Self {
        self.line.units = Some(units.into());
        self
    }

    /// Sets the charge, e.g. `45.0` or `"$1,234.56"`
    pub fn charge(mut self, amount: impl Into<RawValue>) -> Self {
        self.line.charge_amount = Some(amount.into());
        self
    }

    pub fn unit_price(mut self, amount: impl Into<RawValue>) -> Self {
        self.line.unit_price = Some(amount.into());
        self
    }

    pub fn allowed(mut self, amount: impl Into<RawValue>) -> Self {
        self.line.allowed_amount = Some(amount.into());
        self
    }

    pub fn plan_paid(mut self, amount: impl Into<RawValue>) -> Self {
        self.line.plan_paid = Some(amount.into());
        self
    }

    pub fn patient_responsibility(mut self, amount: impl Into<RawValue>) -> Self {
        self.line.patient_responsibility = Some(amount.into());
        self
    }

    /// Sets modifiers as a list
    pub fn modifiers(mut self, modifiers: &[&str]) -> Self {
        self.line.modifiers = Some(RawModifiers::List(
            modifiers.iter().map(|m| m.to_string()).collect(),
        ));
        self
    }

    pub fn build(self) -> RawLine {
        self.line
    }
}

/// Owns everything an [`AuditInput`] borrows, so rule and engine tests can
/// be written without juggling lifetimes
#[derive(Debug, Clone, Default)]
pub struct AuditScenario {
    pub bill_lines: Vec<LineItem>,
    pub eob_lines: Vec<LineItem>,
    pub matches: Vec<LineMatch>,
    pub context: InsuranceContext,
    pub bill_facts: DocumentFacts,
}

impl AuditScenario {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a bill line
    pub fn bill(mut self, line: LineItemBuilder) -> Self {
        self.bill_lines.push(line.build());
        self
    }

    /// Adds an EOB line
    pub fn eob(mut self, line: LineItemBuilder) -> Self {
        self.eob_lines.push(line.build());
        self
    }

    pub fn context(mut self, context: InsuranceContext) -> Self {
        self.context = context;
        self
    }

    pub fn facts(mut self, facts: DocumentFacts) -> Self {
        self.bill_facts = facts;
        self
    }

    /// Runs the default matcher over the current lines
    pub fn matched(mut self) -> Self {
        self.matches = LineMatcher::new().match_lines(&self.bill_lines, &self.eob_lines);
        self
    }

    /// Borrows the scenario as rule input
    pub fn input(&self) -> AuditInput<'_> {
        AuditInput {
            bill_lines: &self.bill_lines,
            eob_lines: &self.eob_lines,
            matches: &self.matches,
            context: &self.context,
            bill_facts: &self.bill_facts,
        }
    }

    /// Runs the standard engine
    pub fn run(&self) -> EngineResult {
        self.run_with(&AuditEngine::standard())
    }

    pub fn run_with(&self, engine: &AuditEngine) -> EngineResult {
        engine.run(&self.input())
    }
}
