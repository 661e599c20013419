use loan_tracker_core::amortization::{
    self, analyze_schedule, analyze_summary, LoanTerms, ScheduleEntry,
};
use loan_tracker_core::LoanError;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const TOLERANCE: Decimal = dec!(0.01);

fn reference_loan() -> LoanTerms {
    LoanTerms::new(dec!(1000), dec!(0.05), 12)
}

fn entry(month: u32, monthly_payment: Decimal, remaining_balance: Decimal) -> ScheduleEntry {
    ScheduleEntry {
        month,
        monthly_payment,
        remaining_balance,
    }
}

// ===========================================================================
// Known-answer schedules
// ===========================================================================

#[test]
fn test_reference_loan_full_schedule() {
    let expected = vec![
        entry(1, dec!(85.61), dec!(918.56)),
        entry(2, dec!(85.61), dec!(836.78)),
        entry(3, dec!(85.61), dec!(754.66)),
        entry(4, dec!(85.61), dec!(672.20)),
        entry(5, dec!(85.61), dec!(589.39)),
        entry(6, dec!(85.61), dec!(506.24)),
        entry(7, dec!(85.61), dec!(422.74)),
        entry(8, dec!(85.61), dec!(338.89)),
        entry(9, dec!(85.61), dec!(254.70)),
        entry(10, dec!(85.61), dec!(170.15)),
        entry(11, dec!(85.61), dec!(85.25)),
        entry(12, dec!(85.61), dec!(0)),
    ];
    assert_eq!(amortization::schedule(&reference_loan()), expected);
}

#[test]
fn test_reference_loan_summary_month_ten() {
    let result = amortization::summary(&reference_loan(), 10).unwrap();
    assert_eq!(result.remaining_balance, dec!(170.15));
    assert_eq!(result.aggregate_principal_paid, dec!(829.85));
    assert_eq!(result.aggregate_interest_paid, dec!(26.23));
}

#[test]
fn test_reference_loan_month_thirteen_rejected() {
    let err = amortization::summary(&reference_loan(), 13).unwrap_err();
    assert!(matches!(
        err,
        LoanError::InvalidMonth {
            month: 13,
            term_months: 12
        }
    ));
}

#[test]
fn test_zero_rate_loan_linear_decay() {
    let terms = LoanTerms::new(dec!(1200), Decimal::ZERO, 12);
    let entries = amortization::schedule(&terms);
    assert_eq!(entries.len(), 12);
    assert!(entries.iter().all(|e| e.monthly_payment == dec!(100.00)));
    assert_eq!(entries[5].remaining_balance, dec!(600));
    assert_eq!(entries[11].remaining_balance, Decimal::ZERO);

    let summary = amortization::summary(&terms, 6).unwrap();
    assert_eq!(summary.aggregate_interest_paid, Decimal::ZERO);
    assert_eq!(summary.aggregate_principal_paid, dec!(600));
}

#[test]
fn test_thirty_year_mortgage() {
    // 250k at 6.5% over 360 months => ~1580.17 per month
    let terms = LoanTerms::new(dec!(250_000), dec!(0.065), 360);
    let entries = amortization::schedule(&terms);
    assert_eq!(entries[0].monthly_payment, dec!(1580.17));
    assert_eq!(entries[359].remaining_balance, Decimal::ZERO);
    assert_eq!(entries[358].remaining_balance, dec!(1571.66));

    let full = amortization::summary(&terms, 360).unwrap();
    assert_eq!(full.aggregate_principal_paid, dec!(250_000.00));
    assert_eq!(full.aggregate_interest_paid, dec!(318_861.22));
}

#[test]
fn test_summary_rounds_once_not_per_month() {
    let terms = LoanTerms::new(dec!(250_000), dec!(0.065), 360);
    let per_month_rounded: Decimal = amortization::amortize(&terms)
        .map(|s| s.interest.round_dp(2))
        .sum();
    let summary = amortization::summary(&terms, 360).unwrap();

    // Rounding every month before summing drifts by several cents
    assert_eq!(per_month_rounded, dec!(318_861.30));
    assert_eq!(summary.aggregate_interest_paid, dec!(318_861.22));
}

#[test]
fn test_half_cent_ties_round_to_even_on_exact_decimals() {
    // 311825.70 / 8 * 6 = 233869.275 exactly
    let terms = LoanTerms::new(dec!(311_825.70), Decimal::ZERO, 8);
    let result = amortization::summary(&terms, 6).unwrap();
    assert_eq!(result.aggregate_principal_paid, dec!(233_869.28));
    assert_eq!(result.remaining_balance, dec!(77_956.42));
}

#[test]
fn test_enveloped_summary_records_target_month() {
    let out = analyze_summary(&reference_loan(), 10).unwrap();
    assert_eq!(out.assumptions["target_month"], serde_json::json!(10));
    assert_eq!(out.result.remaining_balance, dec!(170.15));
    assert_eq!(out.methodology, "Paid-to-date loan summary");
}

#[test]
fn test_enveloped_schedule_serializes_decimals_as_strings() {
    let out = analyze_schedule(&reference_loan()).unwrap();
    let value = serde_json::to_value(&out).unwrap();
    assert_eq!(value["result"]["schedule"][0]["monthly_payment"], "85.61");
    assert_eq!(value["result"]["schedule"][0]["month"], 1);
}

// ===========================================================================
// Properties over arbitrary valid terms
// ===========================================================================

fn terms_strategy() -> impl Strategy<Value = LoanTerms> {
    (1i64..=100_000_000, 0i64..=3_000, 1u32..=480).prop_map(|(cents, bps, term)| {
        LoanTerms::new(Decimal::new(cents, 2), Decimal::new(bps, 4), term)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_schedule_has_one_entry_per_month(terms in terms_strategy()) {
        let entries = amortization::schedule(&terms);
        prop_assert_eq!(entries.len(), terms.term_months as usize);
        for (i, e) in entries.iter().enumerate() {
            prop_assert_eq!(e.month, i as u32 + 1);
        }
    }

    #[test]
    fn prop_payment_is_fixed(terms in terms_strategy()) {
        let entries = amortization::schedule(&terms);
        let first = entries[0].monthly_payment;
        prop_assert!(entries.iter().all(|e| e.monthly_payment == first));
    }

    #[test]
    fn prop_balance_never_negative_and_ends_at_zero(terms in terms_strategy()) {
        let entries = amortization::schedule(&terms);
        prop_assert!(entries.iter().all(|e| e.remaining_balance >= Decimal::ZERO));
        let last = entries.last().unwrap();
        prop_assert!(last.remaining_balance.abs() <= TOLERANCE);
    }

    #[test]
    fn prop_full_term_summary_repays_principal(terms in terms_strategy()) {
        let full = amortization::summary(&terms, terms.term_months).unwrap();
        prop_assert!(full.remaining_balance.abs() <= TOLERANCE);
        prop_assert!((full.aggregate_principal_paid - terms.principal).abs() <= TOLERANCE);

        let entries = amortization::schedule(&terms);
        prop_assert_eq!(full.remaining_balance, entries.last().unwrap().remaining_balance);
    }

    #[test]
    fn prop_summary_matches_schedule_at_any_month(
        terms in terms_strategy(),
        pick in any::<prop::sample::Index>(),
    ) {
        let month = pick.index(terms.term_months as usize) as u32 + 1;
        let entries = amortization::schedule(&terms);
        let result = amortization::summary(&terms, month).unwrap();
        prop_assert_eq!(result.month, month);
        prop_assert_eq!(result.remaining_balance, entries[month as usize - 1].remaining_balance);

        let paid = amortization::monthly_payment(&terms) * Decimal::from(month);
        let reported = result.aggregate_principal_paid + result.aggregate_interest_paid;
        prop_assert!((reported - paid).abs() <= TOLERANCE);
    }

    #[test]
    fn prop_month_past_term_is_rejected(terms in terms_strategy(), extra in 1u32..=24) {
        let err = amortization::summary(&terms, terms.term_months + extra).unwrap_err();
        prop_assert_eq!(
            err.to_string(),
            format!("Month must be between 1 and {}", terms.term_months)
        );
    }
}
