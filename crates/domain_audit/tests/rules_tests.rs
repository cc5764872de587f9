//! Tests for the individual audit rules

use std::collections::HashSet;

use core_kernel::{LineSource, Money};
use proptest::prelude::*;
use rust_decimal_macros::dec;

use domain_audit::rules::{clinical, coding, coverage, duplicates, math, packaging};
use domain_audit::{DocumentFacts, InsuranceContext, RuleId, Severity, STANDARD_RULES};
use test_utils::{
    assert_cents, assert_evidence_contains, assert_evidence_resolves, assert_single_finding,
    line_set_strategy, AuditScenario, ContextFixtures, LineItemBuilder, TemporalFixtures,
};

// ============================================================================
// Packaging Rules (R01-R03)
// ============================================================================

mod packaging_tests {
    use super::*;

    #[test]
    fn test_venipuncture_with_lab_is_packaged() {
        let scenario = AuditScenario::new()
            .bill(LineItemBuilder::bill(1).code("36415").description("Venipuncture").charge_cents(4500))
            .bill(LineItemBuilder::bill(2).code("82962").description("Glucose").charge_cents(1800));

        let findings = packaging::packaged_venipuncture(&scenario.input()).unwrap();
        let finding = assert_single_finding(&findings, RuleId::R01);
        assert_eq!(finding.severity, Severity::High);
        assert_cents(finding.savings, 4500);
        assert_evidence_contains(finding, &["bill-1"]);
        assert_eq!(finding.citations[0].authority, "CMS National Correct Coding Initiative (NCCI)");
    }

    #[test]
    fn test_venipuncture_without_lab_is_clear() {
        let scenario = AuditScenario::new()
            .bill(LineItemBuilder::bill(1).code("36415").description("Venipuncture").charge_cents(4500))
            .bill(LineItemBuilder::bill(2).code("99213").description("Office visit").charge_cents(15000));

        assert!(packaging::packaged_venipuncture(&scenario.input()).unwrap().is_empty());
    }

    #[test]
    fn test_iv_fluids_with_same_day_infusion() {
        let scenario = AuditScenario::new()
            .bill(LineItemBuilder::bill(1).code("96365").description("IV infusion").charge_cents(30000))
            .bill(LineItemBuilder::bill(2).code("J7030").description("Normal saline").charge_cents(12000));

        let findings = packaging::packaged_iv_fluids(&scenario.input()).unwrap();
        let finding = assert_single_finding(&findings, RuleId::R02);
        assert_cents(finding.savings, 12000);
        assert_evidence_contains(finding, &["bill-1", "bill-2"]);
    }

    #[test]
    fn test_iv_fluids_on_another_day_are_clear() {
        let scenario = AuditScenario::new()
            .bill(LineItemBuilder::bill(1).code("96365").description("IV infusion").charge_cents(30000))
            .bill(
                LineItemBuilder::bill(2)
                    .code("J7030")
                    .description("Normal saline")
                    .date("01/02/2024")
                    .charge_cents(12000),
            );

        assert!(packaging::packaged_iv_fluids(&scenario.input()).unwrap().is_empty());
    }

    #[test]
    fn test_marked_up_otc_medication() {
        let scenario = AuditScenario::new()
            .bill(LineItemBuilder::bill(1).description("Acetaminophen 500mg").units(2).charge_cents(5000))
            .bill(LineItemBuilder::bill(2).description("Ibuprofen 200mg").units(10).charge_cents(2000));

        let findings = packaging::packaged_otc_medications(&scenario.input()).unwrap();
        let finding = assert_single_finding(&findings, RuleId::R03);
        assert_eq!(finding.severity, Severity::Warn);
        assert_cents(finding.savings, 4800);
        assert_evidence_contains(finding, &["bill-1"]);
    }
}

// ============================================================================
// Duplicate Rule (R04)
// ============================================================================

mod duplicate_tests {
    use super::*;

    #[test]
    fn test_same_code_same_day_is_one_duplicate_finding() {
        let scenario = AuditScenario::new()
            .bill(LineItemBuilder::bill(1).code("82962").date("01/01/2024").charge_cents(1800))
            .bill(LineItemBuilder::bill(2).code("82962").date("01/01/2024").charge_cents(1800));

        let findings = duplicates::duplicate_charges(&scenario.input()).unwrap();
        let finding = assert_single_finding(&findings, RuleId::R04);
        assert_eq!(finding.severity, Severity::High);
        assert_evidence_contains(finding, &["bill-1", "bill-2"]);
        assert_eq!(finding.evidence_line_ids.len(), 2);
        assert_eq!(finding.savings, scenario.bill_lines[1].charge);
    }

    #[test]
    fn test_bilateral_modifier_is_not_a_duplicate() {
        let scenario = AuditScenario::new()
            .bill(LineItemBuilder::bill(1).code("73030").charge_cents(8000).modifier("RT"))
            .bill(LineItemBuilder::bill(2).code("73030").charge_cents(8000).modifier("LT"));

        assert!(duplicates::duplicate_charges(&scenario.input()).unwrap().is_empty());
    }

    #[test]
    fn test_repeated_component_is_a_duplicate() {
        let scenario = AuditScenario::new()
            .bill(LineItemBuilder::bill(1).code("93000").charge_cents(5000).modifier("26"))
            .bill(LineItemBuilder::bill(2).code("93000").charge_cents(5000).modifier("26"));

        let findings = duplicates::duplicate_charges(&scenario.input()).unwrap();
        let finding = assert_single_finding(&findings, RuleId::R04);
        assert_cents(finding.savings, 5000);
        assert_evidence_contains(finding, &["bill-1", "bill-2"]);
    }

    #[test]
    fn test_professional_and_technical_split_is_not_a_duplicate() {
        let scenario = AuditScenario::new()
            .bill(LineItemBuilder::bill(1).code("93000").charge_cents(5000).modifier("26"))
            .bill(LineItemBuilder::bill(2).code("93000").charge_cents(5000).modifier("TC"));

        assert!(duplicates::duplicate_charges(&scenario.input()).unwrap().is_empty());
    }

    #[test]
    fn test_later_line_similar_to_a_flagged_duplicate() {
        let scenario = AuditScenario::new()
            .bill(LineItemBuilder::bill(1).code("82962").date("01/01/2024").charge_cents(1800))
            .bill(LineItemBuilder::bill(2).code("82962").date("01/01/2024").charge_cents(1800))
            .bill(LineItemBuilder::bill(3).code("82962").date("01/02/2024").charge_cents(1800));

        let findings = duplicates::duplicate_charges(&scenario.input()).unwrap();
        assert_eq!(findings.len(), 2);

        assert_evidence_contains(&findings[0], &["bill-1", "bill-2"]);
        assert_cents(findings[0].savings, 1800);

        assert_evidence_contains(&findings[1], &["bill-3"]);
        assert!(findings[1].savings.is_zero());
    }

    #[test]
    fn test_near_duplicate_has_no_savings() {
        let scenario = AuditScenario::new()
            .bill(LineItemBuilder::bill(1).code("82962").date("01/01/2024").charge_cents(1800))
            .bill(LineItemBuilder::bill(2).code("82962").date("01/02/2024").charge_cents(1900));

        let findings = duplicates::duplicate_charges(&scenario.input()).unwrap();
        let finding = assert_single_finding(&findings, RuleId::R04);
        assert_eq!(finding.confidence, 0.5);
        assert!(finding.savings.is_zero());
        assert!(finding.is_reportable());
    }

    #[test]
    fn test_single_use_service_quantity() {
        let scenario = AuditScenario::new().bill(
            LineItemBuilder::bill(1)
                .code("00840")
                .description("Anesthesia, abdominal procedure")
                .units(3)
                .charge_cents(90000),
        );

        let findings = duplicates::duplicate_charges(&scenario.input()).unwrap();
        let finding = assert_single_finding(&findings, RuleId::R04);
        assert_eq!(finding.severity, Severity::Warn);
        assert_cents(finding.savings, 60000);
    }
}

// ============================================================================
// Coding Rules (R05-R08)
// ============================================================================

mod coding_tests {
    use super::*;

    #[test]
    fn test_unlisted_drug_allowed_nothing() {
        let scenario = AuditScenario::new()
            .bill(LineItemBuilder::bill(1).code("J3490").charge_cents(20000))
            .eob(LineItemBuilder::eob(1).code("J3490").charge_cents(20000).allowed_cents(0))
            .matched();

        let findings = coding::unlisted_drug_codes(&scenario.input()).unwrap();
        let finding = assert_single_finding(&findings, RuleId::R05);
        assert_cents(finding.savings, 20000);
        assert_evidence_contains(finding, &["bill-1", "eob-1"]);
    }

    #[test]
    fn test_jcode_units_above_processed() {
        let scenario = AuditScenario::new()
            .bill(LineItemBuilder::bill(1).code("J1100").units(10).charge_cents(10000))
            .eob(LineItemBuilder::eob(1).code("J1100").units(4).charge_cents(4000))
            .matched();

        let findings = coding::jcode_unit_errors(&scenario.input()).unwrap();
        let finding = assert_single_finding(&findings, RuleId::R06);
        assert_eq!(finding.severity, Severity::High);
        assert_cents(finding.savings, 6000);
    }

    #[test]
    fn test_jcode_units_above_processed_with_repeated_charge() {
        // The EOB repeats the billed amount but processed half the units
        let scenario = AuditScenario::new()
            .bill(LineItemBuilder::bill(1).code("J1100").units(10).charge_cents(10000))
            .eob(LineItemBuilder::eob(1).code("J1100").units(5).charge_cents(10000))
            .matched();

        let findings = coding::jcode_unit_errors(&scenario.input()).unwrap();
        let finding = assert_single_finding(&findings, RuleId::R06);
        assert_cents(finding.savings, 5000);
        assert_evidence_contains(finding, &["bill-1", "eob-1"]);
    }

    #[test]
    fn test_unmatched_jcode_with_extreme_units_needs_verification() {
        let scenario = AuditScenario::new()
            .bill(LineItemBuilder::bill(1).code("J2405").units(150).charge_cents(30000))
            .matched();

        let findings = coding::jcode_unit_errors(&scenario.input()).unwrap();
        let finding = assert_single_finding(&findings, RuleId::R06);
        assert_eq!(finding.confidence, 0.5);
        assert!(finding.savings.is_zero());
    }

    #[test]
    fn test_modifier_25_on_non_em_code() {
        let scenario = AuditScenario::new()
            .bill(LineItemBuilder::bill(1).code("36415").charge_cents(4500).modifier("25"));

        let findings = coding::modifier_misuse(&scenario.input()).unwrap();
        let finding = assert_single_finding(&findings, RuleId::R07);
        assert_cents(finding.savings, 1350);
    }

    #[test]
    fn test_global_and_component_billed_together() {
        let scenario = AuditScenario::new()
            .bill(LineItemBuilder::bill(1).code("71046").charge_cents(20000))
            .bill(LineItemBuilder::bill(2).code("71046").charge_cents(6000).modifier("26"));

        let findings = coding::modifier_misuse(&scenario.input()).unwrap();
        let finding = assert_single_finding(&findings, RuleId::R07);
        assert_eq!(finding.severity, Severity::High);
        assert_cents(finding.savings, 6000);
        assert_evidence_contains(finding, &["bill-1", "bill-2"]);
    }

    #[test]
    fn test_component_is_claimed_by_one_global_line() {
        let scenario = AuditScenario::new()
            .bill(LineItemBuilder::bill(1).code("71046").charge_cents(20000))
            .bill(LineItemBuilder::bill(2).code("71046").charge_cents(20000))
            .bill(LineItemBuilder::bill(3).code("71046").charge_cents(4000).modifier("26"));

        let findings = coding::modifier_misuse(&scenario.input()).unwrap();
        let finding = assert_single_finding(&findings, RuleId::R07);
        assert_cents(finding.savings, 4000);
        assert_evidence_contains(finding, &["bill-1", "bill-3"]);
    }

    #[test]
    fn test_ptp_component_billed_with_panel() {
        let scenario = AuditScenario::new()
            .bill(LineItemBuilder::bill(1).code("80053").charge_cents(15000))
            .bill(LineItemBuilder::bill(2).code("82947").charge_cents(2000));

        let findings = coding::unbundling_ptp(&scenario.input()).unwrap();
        let finding = assert_single_finding(&findings, RuleId::R08);
        assert_cents(finding.savings, 2000);
    }

    #[test]
    fn test_ptp_bypassed_with_distinct_modifier() {
        let scenario = AuditScenario::new()
            .bill(LineItemBuilder::bill(1).code("80053").charge_cents(15000))
            .bill(LineItemBuilder::bill(2).code("82947").charge_cents(2000).modifier("59"));

        assert!(coding::unbundling_ptp(&scenario.input()).unwrap().is_empty());
    }
}

// ============================================================================
// Clinical Rules (R09-R12)
// ============================================================================

mod clinical_tests {
    use super::*;

    #[test]
    fn test_visit_inside_global_period() {
        let scenario = AuditScenario::new()
            .bill(LineItemBuilder::bill(1).code("27447").date("01/01/2024").charge_cents(2_500_000))
            .bill(LineItemBuilder::bill(2).code("99213").date("02/15/2024").charge_cents(15000));

        let findings = clinical::global_surgical_package(&scenario.input()).unwrap();
        let finding = assert_single_finding(&findings, RuleId::R09);
        assert_cents(finding.savings, 15000);
    }

    #[test]
    fn test_unrelated_visit_modifier_is_exempt() {
        let scenario = AuditScenario::new()
            .bill(LineItemBuilder::bill(1).code("27447").date("01/01/2024").charge_cents(2_500_000))
            .bill(
                LineItemBuilder::bill(2)
                    .code("99213")
                    .date("02/15/2024")
                    .charge_cents(15000)
                    .modifier("24"),
            );

        assert!(clinical::global_surgical_package(&scenario.input()).unwrap().is_empty());
    }

    #[test]
    fn test_therapy_units_over_per_code_ceiling() {
        let scenario = AuditScenario::new()
            .bill(LineItemBuilder::bill(1).code("97110").units(6).charge_cents(30000));

        let findings = clinical::therapy_time_units(&scenario.input()).unwrap();
        let finding = assert_single_finding(&findings, RuleId::R10);
        assert_cents(finding.savings, 10000);
    }

    #[test]
    fn test_observation_on_inpatient_day() {
        let scenario = AuditScenario::new()
            .bill(LineItemBuilder::bill(1).code("G0378").charge_cents(50000))
            .bill(LineItemBuilder::bill(2).code("99221").charge_cents(30000));

        let findings = clinical::observation_vs_inpatient(&scenario.input()).unwrap();
        let finding = assert_single_finding(&findings, RuleId::R11);
        assert_cents(finding.savings, 50000);
        assert_evidence_contains(finding, &["bill-1", "bill-2"]);
    }

    #[test]
    fn test_room_and_board_beyond_stay() {
        let scenario = AuditScenario::new()
            .bill(
                LineItemBuilder::bill(1)
                    .description("Room and board, semi-private")
                    .date("01/01/2024")
                    .units(5)
                    .charge_cents(500000),
            )
            .bill(LineItemBuilder::bill(2).code("99221").date("01/03/2024").charge_cents(30000));

        let findings = clinical::room_and_board_los(&scenario.input()).unwrap();
        let finding = assert_single_finding(&findings, RuleId::R12);
        assert_eq!(finding.severity, Severity::High);
        assert_cents(finding.savings, 300000);
    }
}

// ============================================================================
// Coverage Rules (R13-R15, R17, R18)
// ============================================================================

mod coverage_tests {
    use super::*;

    #[test]
    fn test_late_filing_billed_to_patient() {
        let scenario = AuditScenario::new()
            .bill(LineItemBuilder::bill(1).code("99213").charge_cents(20000))
            .eob(LineItemBuilder::eob(1).code("99213").charge_cents(20000).plan_paid_cents(0))
            .facts(DocumentFacts {
                statement_date: Some(TemporalFixtures::late_statement_date().to_string()),
                ..DocumentFacts::default()
            })
            .matched();

        let findings = coverage::timely_filing(&scenario.input()).unwrap();
        let finding = assert_single_finding(&findings, RuleId::R13);
        assert_cents(finding.savings, 20000);
    }

    #[test]
    fn test_longer_filing_window_is_respected() {
        let scenario = AuditScenario::new()
            .bill(LineItemBuilder::bill(1).code("99213").charge_cents(20000))
            .eob(LineItemBuilder::eob(1).code("99213").charge_cents(20000).plan_paid_cents(0))
            .facts(DocumentFacts {
                statement_date: Some(TemporalFixtures::late_statement_date().to_string()),
                ..DocumentFacts::default()
            })
            .context(InsuranceContext {
                timely_filing_days: Some(730),
                ..InsuranceContext::default()
            })
            .matched();

        assert!(coverage::timely_filing(&scenario.input()).unwrap().is_empty());
    }

    #[test]
    fn test_secondary_coverage_not_billed() {
        let scenario = AuditScenario::new()
            .bill(LineItemBuilder::bill(1).code("99213").charge_cents(15000).patient_resp_cents(5000))
            .eob(LineItemBuilder::eob(1).code("99213").charge_cents(15000).patient_resp_cents(5000))
            .context(ContextFixtures::with_secondary())
            .matched();

        let findings = coverage::cob_primary_missing(&scenario.input()).unwrap();
        let finding = assert_single_finding(&findings, RuleId::R14);
        assert_cents(finding.savings, 5000);
    }

    #[test]
    fn test_no_secondary_means_no_cob_finding() {
        let scenario = AuditScenario::new()
            .bill(LineItemBuilder::bill(1).code("99213").charge_cents(15000).patient_resp_cents(5000))
            .eob(LineItemBuilder::eob(1).code("99213").charge_cents(15000).patient_resp_cents(5000))
            .context(ContextFixtures::standard_plan())
            .matched();

        assert!(coverage::cob_primary_missing(&scenario.input()).unwrap().is_empty());
    }

    #[test]
    fn test_eob_zero_billed_line() {
        let scenario = AuditScenario::new()
            .bill(LineItemBuilder::bill(1).code("99284").charge_cents(10000))
            .eob(LineItemBuilder::eob(1).code("99284").charge_cents(0).allowed_cents(0))
            .matched();

        let findings = coverage::eob_zero_billed(&scenario.input()).unwrap();
        let finding = assert_single_finding(&findings, RuleId::R15);
        assert_cents(finding.savings, 10000);
        assert_eq!(finding.comparison.unwrap().difference().cents(), 10000);
    }

    #[test]
    fn test_price_outlier_with_balance_billing() {
        let scenario = AuditScenario::new()
            .bill(LineItemBuilder::bill(1).code("99284").charge_cents(100000).patient_resp_cents(40000))
            .eob(
                LineItemBuilder::eob(1)
                    .code("99284")
                    .charge_cents(100000)
                    .allowed_cents(20000)
                    .patient_resp_cents(10000),
            )
            .matched();

        let findings = coverage::tic_price_outliers(&scenario.input()).unwrap();
        let finding = assert_single_finding(&findings, RuleId::R17);
        assert_cents(finding.savings, 30000);
    }

    #[test]
    fn test_eob_without_bill_requests_itemization() {
        let scenario = AuditScenario::new()
            .eob(LineItemBuilder::eob(1).code("99284").charge_cents(100000))
            .eob(LineItemBuilder::eob(2).code("36415").charge_cents(4500));

        let findings = coverage::missing_itemized_bill(&scenario.input()).unwrap();
        let finding = assert_single_finding(&findings, RuleId::R18);
        assert_evidence_contains(finding, &["eob-1", "eob-2"]);
        assert!(finding.savings.is_zero());
    }
}

// ============================================================================
// Math Rule (R16)
// ============================================================================

mod math_tests {
    use super::*;

    #[test]
    fn test_units_times_price_overstatement() {
        let scenario = AuditScenario::new().bill(
            LineItemBuilder::bill(1)
                .code("99070")
                .units(2)
                .unit_price_cents(5000)
                .charge_cents(15000),
        );

        let findings = math::math_posting_errors(&scenario.input()).unwrap();
        let finding = assert_single_finding(&findings, RuleId::R16);
        assert_eq!(finding.comparison.unwrap().difference(), Money::from_cents(5000));
        assert_cents(finding.savings, 5000);

        let result = scenario.run();
        assert_cents(result.total_savings, 5000);
    }

    #[test]
    fn test_eob_patient_responsibility_recomputed() {
        let scenario = AuditScenario::new().eob(
            LineItemBuilder::eob(1)
                .code("99213")
                .charge_cents(15000)
                .allowed_cents(10000)
                .plan_paid_cents(8000)
                .patient_resp_cents(5000),
        );

        let findings = math::math_posting_errors(&scenario.input()).unwrap();
        let finding = assert_single_finding(&findings, RuleId::R16);
        assert_eq!(finding.severity, Severity::Critical);
        assert_cents(finding.savings, 3000);
    }

    #[test]
    fn test_deductible_applied_beyond_remaining() {
        let context = InsuranceContext {
            deductible: Some(Money::from_cents(150_000)),
            deductible_met: Some(Money::from_cents(145_000)),
            ..InsuranceContext::default()
        };
        let scenario = AuditScenario::new()
            .eob(LineItemBuilder::eob(1).code("99213").charge_cents(30000).deductible_cents(20000))
            .context(context);

        let findings = math::math_posting_errors(&scenario.input()).unwrap();
        let finding = assert_single_finding(&findings, RuleId::R16);
        assert_cents(finding.savings, 15000);
    }

    #[test]
    fn test_coinsurance_within_a_dollar_is_accepted() {
        let context = InsuranceContext {
            coinsurance_percent: Some(dec!(20)),
            ..InsuranceContext::default()
        };
        let scenario = AuditScenario::new()
            .eob(
                LineItemBuilder::eob(1)
                    .code("99213")
                    .charge_cents(15000)
                    .allowed_cents(10000)
                    .coinsurance_cents(2050),
            )
            .context(context);

        assert!(math::math_posting_errors(&scenario.input()).unwrap().is_empty());
    }
}

// ============================================================================
// Properties shared by every rule
// ============================================================================

mod rule_properties {
    use super::*;

    proptest! {
        #[test]
        fn every_rule_succeeds_and_cites_known_lines(
            bills in line_set_strategy(LineSource::Bill, 10),
            eobs in line_set_strategy(LineSource::Eob, 10),
        ) {
            let scenario = AuditScenario {
                bill_lines: bills,
                eob_lines: eobs,
                context: ContextFixtures::standard_plan(),
                ..AuditScenario::default()
            }
            .matched();

            let input = scenario.input();
            let mut seen = HashSet::new();
            for rule in STANDARD_RULES.iter() {
                let findings = (rule.evaluate)(&input);
                prop_assert!(findings.is_ok(), "{} failed: {:?}", rule.id, findings);
                let findings = findings.unwrap();
                assert_evidence_resolves(&findings, &[scenario.bill_lines.as_slice(), scenario.eob_lines.as_slice()]);
                for finding in &findings {
                    prop_assert_eq!(finding.rule_id, rule.id);
                    prop_assert!(!finding.savings.is_negative());
                    prop_assert!((0.0..=1.0).contains(&finding.confidence));
                }
                seen.insert(rule.id);
            }
            prop_assert_eq!(seen.len(), 18);
        }
    }
}
