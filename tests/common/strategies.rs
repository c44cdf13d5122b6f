use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use proptest::prelude::*;
use proptest::strategy::Just;

/// Frequency strings as users store them, including aliases and odd casing
pub fn frequency_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("daily".to_string()),
        Just("Weekly".to_string()),
        Just("bi-weekly".to_string()),
        Just("biweekly".to_string()),
        Just("monthly".to_string()),
        Just("Quarterly".to_string()),
        Just("semi-annual".to_string()),
        Just("biannual".to_string()),
        Just("yearly".to_string()),
        Just("annual".to_string()),
        Just("one-time".to_string()),
    ]
}

/// Optional `compliance_duration` qualifiers
pub fn duration_strategy() -> impl Strategy<Value = Option<String>> {
    prop::option::of(prop_oneof![
        Just("previous".to_string()),
        Just("current".to_string()),
        Just("Fiscal Year".to_string()),
        Just("FY".to_string()),
        Just("2 years".to_string()),
        Just("3-year".to_string()),
        Just("5 Years".to_string()),
    ])
}

/// Dates between 2000-01-01 and roughly 2060
pub fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (0i64..22_000).prop_map(|offset| NaiveDate::from_ymd_opt(2000, 1, 1).unwrap() + Duration::days(offset))
}

/// Date-times with an arbitrary time of day
pub fn datetime_strategy() -> impl Strategy<Value = NaiveDateTime> {
    (date_strategy(), 0u32..86_400).prop_map(|(date, secs)| {
        date.and_time(NaiveTime::from_num_seconds_from_midnight_opt(secs, 0).unwrap())
    })
}
