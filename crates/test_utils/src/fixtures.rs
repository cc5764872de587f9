//! Pre-built Test Fixtures
//!
//! Provides ready-to-use documents, plan contexts, and timestamps for the
//! audit test suites. These fixtures are consistent and predictable.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use core_kernel::{AuditId, Money};
use domain_audit::{DocumentType, ExtractedDocument, InsuranceContext};
use rust_decimal_macros::dec;
use uuid::Uuid;

use crate::builders::RawLineBuilder;

/// Fixture for temporal test data
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// Date of service used by default in builders
    pub fn service_date() -> &'static str {
        "01/01/2024"
    }

    pub fn service_naive_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    /// Moment the audit is run (Feb 15, 2024)
    pub fn audit_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 15, 10, 30, 0).unwrap()
    }

    /// A statement date well past a one year filing limit
    pub fn late_statement_date() -> &'static str {
        "03/01/2025"
    }
}

/// Fixture for identifiers
pub struct IdFixtures;

impl IdFixtures {
    /// Creates a deterministic audit ID for testing
    pub fn audit_id() -> AuditId {
        AuditId::from(Uuid::parse_str("550e8400-e29b-41d4-a716-446655440001").unwrap())
    }
}

/// Fixture for insurance plan contexts
pub struct ContextFixtures;

impl ContextFixtures {
    /// A plan with a $1,500 deductible, $500 met, 20% coinsurance
    pub fn standard_plan() -> InsuranceContext {
        InsuranceContext {
            deductible: Some(Money::from_cents(150_000)),
            deductible_met: Some(Money::from_cents(50_000)),
            coinsurance_percent: Some(dec!(20)),
            out_of_pocket_max: Some(Money::from_cents(600_000)),
            out_of_pocket_spent: Some(Money::from_cents(120_000)),
            copay: Some(Money::from_cents(3_000)),
            payer: Some("Acme Health Plan".to_string()),
            state: Some("TX".to_string()),
            timely_filing_days: None,
            has_secondary_coverage: None,
        }
    }

    /// A California plan, which changes the appeal deadline wording
    pub fn california_plan() -> InsuranceContext {
        InsuranceContext {
            state: Some("CA".to_string()),
            ..Self::standard_plan()
        }
    }

    /// Standard plan plus secondary coverage
    pub fn with_secondary() -> InsuranceContext {
        InsuranceContext {
            has_secondary_coverage: Some(true),
            ..Self::standard_plan()
        }
    }
}

/// Fixture for extracted documents
pub struct DocumentFixtures;

impl DocumentFixtures {
    /// Venipuncture at $45.00 plus a glucose test at $18.00 billed twice on
    /// the same day
    pub fn venipuncture_and_duplicate_bill() -> ExtractedDocument {
        ExtractedDocument::new(DocumentType::Bill)
            .with_line(
                RawLineBuilder::new()
                    .date("01/01/2024")
                    .code("36415")
                    .description("Venipuncture")
                    .charge(45.0)
                    .build(),
            )
            .with_line(
                RawLineBuilder::new()
                    .date("01/01/2024")
                    .code("82962")
                    .description("Glucose blood test")
                    .charge(18.0)
                    .build(),
            )
            .with_line(
                RawLineBuilder::new()
                    .date("01/01/2024")
                    .code("82962")
                    .description("Glucose blood test")
                    .charge(18.0)
                    .build(),
            )
    }

    /// A clean office visit bill
    pub fn clean_office_visit_bill() -> ExtractedDocument {
        ExtractedDocument::new(DocumentType::Bill)
            .with_statement_date("01/20/2024")
            .with_total_charges(150.0)
            .with_line(
                RawLineBuilder::new()
                    .date("01/05/2024")
                    .code("99213")
                    .description("Office visit, established patient")
                    .charge(150.0)
                    .patient_responsibility(30.0)
                    .build(),
            )
    }

    /// The EOB for [`DocumentFixtures::clean_office_visit_bill`]
    pub fn clean_office_visit_eob() -> ExtractedDocument {
        ExtractedDocument::new(DocumentType::Eob).with_line(
            RawLineBuilder::new()
                .date("01/05/2024")
                .code("99213")
                .description("Office visit established patient")
                .charge(150.0)
                .allowed(110.0)
                .plan_paid(80.0)
                .patient_responsibility(30.0)
                .build(),
        )
    }

    /// An emergency visit the plan adjudicated to $0 owed that the provider
    /// still bills $350 for
    pub fn balance_billed_er_bill() -> ExtractedDocument {
        ExtractedDocument::new(DocumentType::Bill).with_line(
            RawLineBuilder::new()
                .date("02/10/2024")
                .code("99284")
                .description("Emergency department visit")
                .charge("$1,200.00")
                .patient_responsibility("$350.00")
                .build(),
        )
    }

    /// The EOB for [`DocumentFixtures::balance_billed_er_bill`]
    pub fn balance_billed_er_eob() -> ExtractedDocument {
        ExtractedDocument::new(DocumentType::Eob).with_line(
            RawLineBuilder::new()
                .date("02/10/2024")
                .code("99284")
                .description("Emergency dept visit")
                .charge("$1,200.00")
                .allowed("$600.00")
                .plan_paid("$600.00")
                .patient_responsibility("$0.00")
                .build(),
        )
    }
}
