//! # Period Calculator
//!
//! Pure calendar arithmetic mapping a frequency, an optional duration
//! qualifier and a reference date to a compliance period.
//!
//! ## Rules
//!
//! - **daily / weekly / biweekly**: the period starts the day after the
//!   reference date and spans 1 / 7 / 14 days.
//! - **monthly**: with the `previous` qualifier, the month before the
//!   reference month. Otherwise the *current* day-of-month decides: past the
//!   15th targets the month after the reference month, else the reference
//!   month itself. This avoids issuing a task for a month that has mostly
//!   elapsed.
//! - **quarterly**: the quarter after the one containing the reference date.
//! - **semi-annual**: the other half-year (Jan-Jun / Jul-Dec), wrapping years.
//! - **yearly**: the next calendar year; fiscal-year qualifiers give the next
//!   July 1 - June 30 year; multi-year qualifiers give N calendar years
//!   starting next January.
//! - **one-time**: the reference date itself.
//!
//! Every period ends at `23:59:59.999` on its last day.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};

use super::frequency::{DurationQualifier, Frequency};
use crate::constants::MONTHLY_CUTOFF_DAY;

/// Inclusive `[start, end]` range covered by one task instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompliancePeriod {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl CompliancePeriod {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// Midnight of `first` through end-of-day of `last`.
    pub fn from_dates(first: NaiveDate, last: NaiveDate) -> Self {
        Self {
            start: start_of_day(first),
            end: end_of_day(last),
        }
    }

    pub fn year(&self) -> i32 {
        self.start.year()
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.start <= at && at <= self.end
    }

    /// Period end minus `offset_days`, or `None` if that leaves the
    /// representable date range.
    pub fn due_date(&self, offset_days: i64) -> Option<NaiveDateTime> {
        TimeDelta::try_days(offset_days).and_then(|offset| self.end.checked_sub_signed(offset))
    }
}

pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// `23:59:59.999` on `date`.
pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    start_of_day(date) + Duration::days(1) - Duration::milliseconds(1)
}

/// Next period for a stored frequency string.
///
/// Returns `None` for an unrecognized frequency.
pub fn next_period_for(
    frequency: &str,
    duration: Option<&str>,
    reference: NaiveDateTime,
    today: NaiveDate,
) -> Option<CompliancePeriod> {
    let frequency: Frequency = frequency.parse().ok()?;
    next_period(frequency, DurationQualifier::parse(duration), reference, today)
}

/// Next period after `reference`.
///
/// `today` only matters for monthly frequencies, where the current
/// day-of-month selects between the reference month and the one after it.
pub fn next_period(
    frequency: Frequency,
    qualifier: Option<DurationQualifier>,
    reference: NaiveDateTime,
    today: NaiveDate,
) -> Option<CompliancePeriod> {
    let date = reference.date();
    match frequency {
        Frequency::Daily | Frequency::Weekly | Frequency::Biweekly => {
            let first = date.succ_opt()?;
            let span = frequency.fixed_span_days()?;
            Some(CompliancePeriod::from_dates(first, first + Duration::days(span)))
        }
        Frequency::Monthly => {
            let delta = match qualifier {
                Some(DurationQualifier::Previous) => -1,
                _ if today.day() > MONTHLY_CUTOFF_DAY => 1,
                _ => 0,
            };
            let (year, month) = shift_month(date.year(), date.month(), delta);
            month_period(year, month)
        }
        Frequency::Quarterly => {
            let quarter = date.month0() / 3;
            let (year, next) = if quarter == 3 {
                (date.year() + 1, 0)
            } else {
                (date.year(), quarter + 1)
            };
            quarter_period(year, next)
        }
        Frequency::SemiAnnual => {
            if date.month() <= 6 {
                half_period(date.year(), 2)
            } else {
                half_period(date.year() + 1, 1)
            }
        }
        Frequency::Yearly => match qualifier {
            Some(DurationQualifier::FiscalYear) => {
                let start_year = if date.month() >= 7 {
                    date.year() + 1
                } else {
                    date.year()
                };
                fiscal_year_period(start_year)
            }
            Some(DurationQualifier::MultiYear(span)) => {
                calendar_years_period(date.year() + 1, i32::from(span))
            }
            _ => calendar_years_period(date.year() + 1, 1),
        },
        Frequency::OneTime => Some(CompliancePeriod::from_dates(date, date)),
    }
}

/// The period of `frequency` that contains `date`.
///
/// Reproduces an instance's own period from its start date, so applying it to
/// a correctly generated instance is a no-op.
pub fn period_containing(
    frequency: Frequency,
    qualifier: Option<DurationQualifier>,
    date: NaiveDate,
) -> Option<CompliancePeriod> {
    match frequency {
        Frequency::Daily | Frequency::Weekly | Frequency::Biweekly => {
            let span = frequency.fixed_span_days()?;
            Some(CompliancePeriod::from_dates(date, date + Duration::days(span)))
        }
        Frequency::Monthly => month_period(date.year(), date.month()),
        Frequency::Quarterly => quarter_period(date.year(), date.month0() / 3),
        Frequency::SemiAnnual => half_period(date.year(), if date.month() <= 6 { 1 } else { 2 }),
        Frequency::Yearly => match qualifier {
            Some(DurationQualifier::FiscalYear) => {
                let start_year = if date.month() >= 7 {
                    date.year()
                } else {
                    date.year() - 1
                };
                fiscal_year_period(start_year)
            }
            Some(DurationQualifier::MultiYear(span)) => {
                calendar_years_period(date.year(), i32::from(span))
            }
            _ => calendar_years_period(date.year(), 1),
        },
        Frequency::OneTime => Some(CompliancePeriod::from_dates(date, date)),
    }
}

/// Shift a (year, 1-based month) pair by `delta` months.
pub(crate) fn shift_month(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let total = year * 12 + month as i32 - 1 + delta;
    (total.div_euclid(12), total.rem_euclid(12) as u32 + 1)
}

fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = shift_month(year, month, 1);
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}

fn month_period(year: i32, month: u32) -> Option<CompliancePeriod> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    Some(CompliancePeriod::from_dates(first, last_day_of_month(year, month)?))
}

/// `quarter` is zero-based.
fn quarter_period(year: i32, quarter: u32) -> Option<CompliancePeriod> {
    let first_month = quarter * 3 + 1;
    let first = NaiveDate::from_ymd_opt(year, first_month, 1)?;
    let last = last_day_of_month(year, first_month + 2)?;
    Some(CompliancePeriod::from_dates(first, last))
}

/// `half` is 1 (Jan-Jun) or 2 (Jul-Dec).
fn half_period(year: i32, half: u32) -> Option<CompliancePeriod> {
    let first_month = if half == 1 { 1 } else { 7 };
    let first = NaiveDate::from_ymd_opt(year, first_month, 1)?;
    let last = last_day_of_month(year, first_month + 5)?;
    Some(CompliancePeriod::from_dates(first, last))
}

fn fiscal_year_period(start_year: i32) -> Option<CompliancePeriod> {
    let first = NaiveDate::from_ymd_opt(start_year, 7, 1)?;
    let last = NaiveDate::from_ymd_opt(start_year + 1, 6, 30)?;
    Some(CompliancePeriod::from_dates(first, last))
}

fn calendar_years_period(start_year: i32, years: i32) -> Option<CompliancePeriod> {
    let first = NaiveDate::from_ymd_opt(start_year, 1, 1)?;
    let last = NaiveDate::from_ymd_opt(start_year + years - 1, 12, 31)?;
    Some(CompliancePeriod::from_dates(first, last))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn noon(y: i32, m: u32, d: u32) -> NaiveDateTime {
        date(y, m, d).and_hms_opt(12, 0, 0).unwrap()
    }

    #[test]
    fn test_shift_month_wraps() {
        assert_eq!(shift_month(2025, 1, -1), (2024, 12));
        assert_eq!(shift_month(2025, 12, 1), (2026, 1));
        assert_eq!(shift_month(2025, 5, 0), (2025, 5));
    }

    #[test]
    fn test_end_of_day() {
        assert_eq!(end_of_day(date(2024, 2, 29)).to_string(), "2024-02-29 23:59:59.999");
        assert_eq!(start_of_day(date(2024, 2, 29)).to_string(), "2024-02-29 00:00:00");
    }

    #[test]
    fn test_fixed_spans() {
        let reference = noon(2025, 5, 20);
        let today = reference.date();
        let daily = next_period(Frequency::Daily, None, reference, today).unwrap();
        assert_eq!(daily, CompliancePeriod::from_dates(date(2025, 5, 21), date(2025, 5, 21)));

        let weekly = next_period(Frequency::Weekly, None, reference, today).unwrap();
        assert_eq!(weekly, CompliancePeriod::from_dates(date(2025, 5, 21), date(2025, 5, 27)));

        let biweekly = next_period(Frequency::Biweekly, None, reference, today).unwrap();
        assert_eq!(biweekly, CompliancePeriod::from_dates(date(2025, 5, 21), date(2025, 6, 3)));
    }

    #[test]
    fn test_monthly_previous() {
        let period = next_period(
            Frequency::Monthly,
            Some(DurationQualifier::Previous),
            noon(2025, 1, 20),
            date(2025, 1, 20),
        )
        .unwrap();
        assert_eq!(period, CompliancePeriod::from_dates(date(2024, 12, 1), date(2024, 12, 31)));
    }

    #[test]
    fn test_monthly_uses_today_not_reference() {
        // Reference in the first half of the month, but today is past the cutoff.
        let period = next_period(Frequency::Monthly, None, noon(2025, 3, 2), date(2025, 3, 16)).unwrap();
        assert_eq!(period, CompliancePeriod::from_dates(date(2025, 4, 1), date(2025, 4, 30)));

        let period = next_period(Frequency::Monthly, None, noon(2025, 3, 28), date(2025, 3, 10)).unwrap();
        assert_eq!(period, CompliancePeriod::from_dates(date(2025, 3, 1), date(2025, 3, 31)));
    }

    #[test]
    fn test_monthly_december_wraps() {
        let period = next_period(Frequency::Monthly, None, noon(2025, 12, 20), date(2025, 12, 20)).unwrap();
        assert_eq!(period, CompliancePeriod::from_dates(date(2026, 1, 1), date(2026, 1, 31)));
    }

    #[test]
    fn test_semi_annual() {
        let h2 = next_period(Frequency::SemiAnnual, None, noon(2025, 6, 30), date(2025, 6, 30)).unwrap();
        assert_eq!(h2, CompliancePeriod::from_dates(date(2025, 7, 1), date(2025, 12, 31)));

        let h1 = next_period(Frequency::SemiAnnual, None, noon(2025, 7, 1), date(2025, 7, 1)).unwrap();
        assert_eq!(h1, CompliancePeriod::from_dates(date(2026, 1, 1), date(2026, 6, 30)));
    }

    #[test]
    fn test_yearly_variants() {
        let reference = noon(2025, 5, 20);
        let today = reference.date();

        let yearly = next_period(Frequency::Yearly, None, reference, today).unwrap();
        assert_eq!(yearly, CompliancePeriod::from_dates(date(2026, 1, 1), date(2026, 12, 31)));

        let five = next_period(Frequency::Yearly, Some(DurationQualifier::MultiYear(5)), reference, today)
            .unwrap();
        assert_eq!(five, CompliancePeriod::from_dates(date(2026, 1, 1), date(2030, 12, 31)));

        let fy = next_period(Frequency::Yearly, Some(DurationQualifier::FiscalYear), reference, today)
            .unwrap();
        assert_eq!(fy, CompliancePeriod::from_dates(date(2025, 7, 1), date(2026, 6, 30)));

        let fy_late = next_period(
            Frequency::Yearly,
            Some(DurationQualifier::FiscalYear),
            noon(2025, 8, 1),
            date(2025, 8, 1),
        )
        .unwrap();
        assert_eq!(fy_late, CompliancePeriod::from_dates(date(2026, 7, 1), date(2027, 6, 30)));
    }

    #[test]
    fn test_one_time_does_not_advance() {
        let period = next_period(Frequency::OneTime, None, noon(2025, 5, 20), date(2025, 5, 20)).unwrap();
        assert_eq!(period, CompliancePeriod::from_dates(date(2025, 5, 20), date(2025, 5, 20)));
    }

    #[test]
    fn test_unrecognized_frequency() {
        assert!(next_period_for("hourly", None, noon(2025, 5, 20), date(2025, 5, 20)).is_none());
        assert!(next_period_for("Quarterly", None, noon(2025, 5, 20), date(2025, 5, 20)).is_some());
    }

    #[test]
    fn test_period_containing() {
        assert_eq!(
            period_containing(Frequency::Quarterly, None, date(2025, 5, 20)).unwrap(),
            CompliancePeriod::from_dates(date(2025, 4, 1), date(2025, 6, 30))
        );
        assert_eq!(
            period_containing(Frequency::Yearly, Some(DurationQualifier::FiscalYear), date(2026, 3, 1))
                .unwrap(),
            CompliancePeriod::from_dates(date(2025, 7, 1), date(2026, 6, 30))
        );
        assert_eq!(
            period_containing(Frequency::Yearly, Some(DurationQualifier::MultiYear(3)), date(2026, 1, 1))
                .unwrap(),
            CompliancePeriod::from_dates(date(2026, 1, 1), date(2028, 12, 31))
        );
        assert_eq!(
            period_containing(Frequency::Monthly, None, date(2024, 2, 1)).unwrap(),
            CompliancePeriod::from_dates(date(2024, 2, 1), date(2024, 2, 29))
        );
    }

    #[test]
    fn test_containing_reproduces_next_period() {
        let reference = noon(2025, 11, 3);
        let today = reference.date();
        for frequency in [
            Frequency::Daily,
            Frequency::Weekly,
            Frequency::Biweekly,
            Frequency::Monthly,
            Frequency::Quarterly,
            Frequency::SemiAnnual,
            Frequency::Yearly,
            Frequency::OneTime,
        ] {
            let next = next_period(frequency, None, reference, today).unwrap();
            let again = period_containing(frequency, None, next.start.date()).unwrap();
            assert_eq!(next, again, "{frequency}");
        }
    }

    #[test]
    fn test_due_date() {
        let period = CompliancePeriod::from_dates(date(2025, 6, 1), date(2025, 6, 30));
        assert_eq!(period.due_date(5).unwrap().to_string(), "2025-06-25 23:59:59.999");
        assert_eq!(period.due_date(i64::MAX), None);
        assert_eq!(period.due_date(1_000_000_000), None);
        assert!(period.contains(noon(2025, 6, 15)));
        assert!(!period.contains(noon(2025, 7, 1)));
        assert_eq!(period.year(), 2025);
    }
}
