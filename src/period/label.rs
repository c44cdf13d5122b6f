use chrono::Datelike;

use super::calculator::CompliancePeriod;
use super::frequency::Frequency;

/// Human-readable label stored in `compliance_period`.
///
/// ```
/// use chrono::NaiveDate;
/// use compliance_core::period::{period_label, CompliancePeriod, Frequency};
///
/// let may = CompliancePeriod::from_dates(
///     NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2025, 5, 31).unwrap(),
/// );
/// assert_eq!(period_label(&may, Frequency::Monthly), "May 2025");
/// assert_eq!(period_label(&may, Frequency::OneTime), "May 2025 (One-time)");
/// ```
pub fn period_label(period: &CompliancePeriod, frequency: Frequency) -> String {
    let start = period.start.date();
    let end = period.end.date();
    match frequency {
        Frequency::Daily => start.format("%B %-d, %Y").to_string(),
        Frequency::Weekly | Frequency::Biweekly => format!(
            "{} - {}",
            start.format("%B %-d, %Y"),
            end.format("%B %-d, %Y")
        ),
        Frequency::Monthly => start.format("%B %Y").to_string(),
        Frequency::Quarterly => format!("Q{} {}", start.month0() / 3 + 1, start.year()),
        Frequency::SemiAnnual => {
            let half = if start.month() <= 6 { 1 } else { 2 };
            format!("H{half} {}", start.year())
        }
        Frequency::Yearly => {
            if start.month() == 7 && start.day() == 1 {
                format!("FY {}-{}", start.year(), end.year())
            } else if start.year() == end.year() {
                start.year().to_string()
            } else {
                format!("{}-{}", start.year(), end.year())
            }
        }
        Frequency::OneTime => format!("{} (One-time)", start.format("%B %Y")),
    }
}

/// Label for a stored frequency string; unknown frequencies fall back to
/// the ISO date range.
pub fn period_label_for(period: &CompliancePeriod, frequency: &str) -> String {
    match frequency.parse::<Frequency>() {
        Ok(frequency) => period_label(period, frequency),
        Err(_) => format!(
            "{} - {}",
            period.start.date().format("%Y-%m-%d"),
            period.end.date().format("%Y-%m-%d")
        ),
    }
}
