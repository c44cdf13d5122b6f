mod common;

use common::{at, date};
use compliance_core::period::{
    next_period, next_period_for, period_label, period_label_for, CompliancePeriod,
    DurationQualifier, Frequency,
};

fn label(period: CompliancePeriod, frequency: Frequency) -> String {
    period_label(&period, frequency)
}

#[test]
fn test_monthly_boundary_on_the_fifteenth() {
    let reference = at(2025, 5, 15, 10);
    let period = next_period(Frequency::Monthly, None, reference, reference.date()).unwrap();
    assert_eq!(period.start, at(2025, 5, 1, 0));
    assert_eq!(label(period, Frequency::Monthly), "May 2025");
}

#[test]
fn test_monthly_boundary_on_the_sixteenth() {
    let reference = at(2025, 5, 16, 10);
    let period = next_period(Frequency::Monthly, None, reference, reference.date()).unwrap();
    assert_eq!(period.start, at(2025, 6, 1, 0));
    assert_eq!(period.end.to_string(), "2025-06-30 23:59:59.999");
    assert_eq!(label(period, Frequency::Monthly), "June 2025");
}

#[test]
fn test_monthly_previous_ignores_cutoff() {
    let reference = at(2025, 1, 20, 10);
    let period = next_period(
        Frequency::Monthly,
        Some(DurationQualifier::Previous),
        reference,
        reference.date(),
    )
    .unwrap();
    assert_eq!(label(period, Frequency::Monthly), "December 2024");
}

#[test]
fn test_quarterly_wraps_into_next_year() {
    for month in [10, 11, 12] {
        let reference = at(2025, month, 3, 9);
        let period = next_period(Frequency::Quarterly, None, reference, reference.date()).unwrap();
        assert_eq!(period.start, at(2026, 1, 1, 0));
        assert_eq!(period.end.to_string(), "2026-03-31 23:59:59.999");
        assert_eq!(label(period, Frequency::Quarterly), "Q1 2026");
    }

    let reference = at(2025, 5, 3, 9);
    let period = next_period(Frequency::Quarterly, None, reference, reference.date()).unwrap();
    assert_eq!(label(period, Frequency::Quarterly), "Q3 2025");
}

#[test]
fn test_semi_annual_halves() {
    let reference = at(2025, 3, 1, 9);
    let period = next_period(Frequency::SemiAnnual, None, reference, reference.date()).unwrap();
    assert_eq!(label(period, Frequency::SemiAnnual), "H2 2025");

    let reference = at(2025, 9, 1, 9);
    let period = next_period(Frequency::SemiAnnual, None, reference, reference.date()).unwrap();
    assert_eq!(period.start.date(), date(2026, 1, 1));
    assert_eq!(label(period, Frequency::SemiAnnual), "H1 2026");
}

#[test]
fn test_yearly_qualifiers_from_stored_strings() {
    let reference = at(2025, 8, 10, 9);
    let today = reference.date();

    let period = next_period_for("annual", None, reference, today).unwrap();
    assert_eq!(period_label_for(&period, "annual"), "2026");

    let period = next_period_for("yearly", Some("Fiscal Year"), reference, today).unwrap();
    assert_eq!(period.start.date(), date(2026, 7, 1));
    assert_eq!(period.end.date(), date(2027, 6, 30));
    assert_eq!(period_label_for(&period, "yearly"), "FY 2026-2027");

    let period = next_period_for("yearly", Some("5 years"), reference, today).unwrap();
    assert_eq!(period.end.to_string(), "2030-12-31 23:59:59.999");
    assert_eq!(period_label_for(&period, "yearly"), "2026-2030");
}

#[test]
fn test_fixed_span_frequencies() {
    let reference = at(2025, 5, 20, 17);
    let today = reference.date();

    let daily = next_period_for("daily", None, reference, today).unwrap();
    assert_eq!(daily.start, at(2025, 5, 21, 0));
    assert_eq!(period_label_for(&daily, "daily"), "May 21, 2025");

    let weekly = next_period_for("weekly", None, reference, today).unwrap();
    assert_eq!(weekly.end.date(), date(2025, 5, 27));
    assert_eq!(
        period_label_for(&weekly, "weekly"),
        "May 21, 2025 - May 27, 2025"
    );

    let biweekly = next_period_for("bi-weekly", None, reference, today).unwrap();
    assert_eq!(biweekly.end.date(), date(2025, 6, 3));
}

#[test]
fn test_one_time_and_unknown() {
    let reference = at(2025, 5, 20, 17);
    let period = next_period_for("one-time", None, reference, reference.date()).unwrap();
    assert_eq!(period.start.date(), date(2025, 5, 20));
    assert_eq!(period.end.date(), date(2025, 5, 20));
    assert_eq!(period_label_for(&period, "one-time"), "May 2025 (One-time)");

    assert!(next_period_for("hourly", None, reference, reference.date()).is_none());
    assert_eq!(
        period_label_for(&period, "hourly"),
        "2025-05-20 - 2025-05-20"
    );
}
