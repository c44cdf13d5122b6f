use serde::{Deserialize, Serialize};
use std::fmt;

/// Recurrence frequency as stored in `compliance_frequency`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
    Quarterly,
    SemiAnnual,
    Yearly,
    OneTime,
}

impl Frequency {
    /// Days added to the start date to reach the end date, for the fixed-span
    /// frequencies.
    pub fn fixed_span_days(&self) -> Option<i64> {
        match self {
            Self::Daily => Some(0),
            Self::Weekly => Some(6),
            Self::Biweekly => Some(13),
            _ => None,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Daily => write!(f, "daily"),
            Self::Weekly => write!(f, "weekly"),
            Self::Biweekly => write!(f, "biweekly"),
            Self::Monthly => write!(f, "monthly"),
            Self::Quarterly => write!(f, "quarterly"),
            Self::SemiAnnual => write!(f, "semi-annual"),
            Self::Yearly => write!(f, "yearly"),
            Self::OneTime => write!(f, "one-time"),
        }
    }
}

impl std::str::FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "biweekly" | "bi-weekly" | "fortnightly" => Ok(Self::Biweekly),
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            "semi-annual" | "semi-annually" | "semiannual" | "semiannually" | "biannual"
            | "bi-annual" | "biannually" | "half-yearly" => Ok(Self::SemiAnnual),
            "yearly" | "annual" | "annually" => Ok(Self::Yearly),
            "one-time" | "onetime" | "once" => Ok(Self::OneTime),
            _ => Err(format!("Invalid compliance frequency: {s}")),
        }
    }
}

/// Qualifier carried in `compliance_duration`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationQualifier {
    /// Monthly: target the calendar month before the reference month.
    Previous,
    /// Yearly: fiscal year running July 1 to June 30.
    FiscalYear,
    /// Yearly: span of N calendar years, N in 2..=5.
    MultiYear(u8),
}

impl DurationQualifier {
    /// Parse a free-form qualifier. Unknown text yields `None`.
    ///
    /// Fiscal-year markers take precedence over digits, so "FY 2" is fiscal.
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        let text = raw?.trim().to_lowercase();
        if text.is_empty() {
            return None;
        }
        if text.contains("previous") {
            return Some(Self::Previous);
        }
        if text.contains("fiscal") || text.split(|c: char| !c.is_alphanumeric()).any(|w| w == "fy")
        {
            return Some(Self::FiscalYear);
        }
        text.chars()
            .filter_map(|c| c.to_digit(10))
            .find(|d| (2..=5).contains(d))
            .map(|d| Self::MultiYear(d as u8))
    }
}
