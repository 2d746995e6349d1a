//! Calendar periods for the analytics view.
//!
//! Periods are calendar-aligned (months, quarters, years) rather than rolling
//! windows, so totals line up with conventional accounting periods.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bucket size for the analytics view.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// One bucket per month of the current year
    #[default]
    Monthly,
    /// One bucket per quarter of the previous and current year
    Quarterly,
    /// One bucket per year, current year and the two before it
    Yearly,
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Granularity::Monthly => write!(f, "monthly"),
            Granularity::Quarterly => write!(f, "quarterly"),
            Granularity::Yearly => write!(f, "yearly"),
        }
    }
}

/// A closed time interval `[start, end]` with its display label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Period {
    pub label: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Period {
    /// Build a period that ends one nanosecond before `next_start`.
    fn new(label: String, start: NaiveDateTime, next_start: Option<NaiveDateTime>) -> Self {
        let end = next_start
            .map(|next| next - Duration::nanoseconds(1))
            .unwrap_or(NaiveDateTime::MAX);
        Self { label, start, end }
    }

    /// Whether `instant` falls inside the period, both bounds included.
    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        self.start <= instant && instant <= self.end
    }
}

/// Generate the ordered periods covering the range selected by `granularity`.
///
/// - monthly: January of `now`'s year through `now`'s month
/// - quarterly: Q1 of the previous year through `now`'s quarter
/// - yearly: the two years before `now`'s year, then `now`'s year
pub fn periods(granularity: Granularity, now: NaiveDateTime) -> Vec<Period> {
    let year = now.year();

    match granularity {
        Granularity::Monthly => (1..=now.month())
            .filter_map(|month| month_period(year, month))
            .collect(),
        Granularity::Quarterly => {
            let current_quarter = quarter_of(now.month());
            (year - 1..=year)
                .flat_map(|y| (1..=4).map(move |q| (y, q)))
                .take_while(|&(y, q)| y < year || q <= current_quarter)
                .filter_map(|(y, q)| quarter_period(y, q))
                .collect()
        }
        Granularity::Yearly => (year - 2..=year).filter_map(year_period).collect(),
    }
}

/// Quarter number (1-4) of a calendar month (1-12).
pub fn quarter_of(month: u32) -> u32 {
    (month - 1) / 3 + 1
}

fn month_period(year: i32, month: u32) -> Option<Period> {
    let start = first_of_month(year, month)?;
    let next = if month == 12 {
        first_of_month(year + 1, 1)
    } else {
        first_of_month(year, month + 1)
    };
    let label = start.format("%b %Y").to_string();
    Some(Period::new(label, start, next))
}

fn quarter_period(year: i32, quarter: u32) -> Option<Period> {
    let start = first_of_month(year, (quarter - 1) * 3 + 1)?;
    let next = if quarter == 4 {
        first_of_month(year + 1, 1)
    } else {
        first_of_month(year, quarter * 3 + 1)
    };
    Some(Period::new(format!("Q{} {}", quarter, year), start, next))
}

fn year_period(year: i32) -> Option<Period> {
    let start = first_of_month(year, 1)?;
    let next = first_of_month(year + 1, 1);
    Some(Period::new(year.to_string(), start, next))
}

fn first_of_month(year: i32, month: u32) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year, month, 1).and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Parse a backend timestamp leniently.
///
/// Accepts RFC 3339 (converted to UTC), ISO-like date-times with `T` or a
/// space separator, and bare `YYYY-MM-DD` dates (midnight). Anything else
/// yields `None`.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_monthly_periods_cover_year_to_date() {
        let periods = periods(Granularity::Monthly, at(2024, 4, 10));
        let labels: Vec<_> = periods.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["Jan 2024", "Feb 2024", "Mar 2024", "Apr 2024"]);
    }

    #[test]
    fn test_monthly_in_january_has_one_period() {
        let periods = periods(Granularity::Monthly, at(2024, 1, 1));
        assert_eq!(periods.len(), 1);
        assert_eq!(periods[0].label, "Jan 2024");
    }

    #[test]
    fn test_quarterly_starts_previous_year() {
        let periods = periods(Granularity::Quarterly, at(2024, 5, 20));
        let labels: Vec<_> = periods.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["Q1 2023", "Q2 2023", "Q3 2023", "Q4 2023", "Q1 2024", "Q2 2024"]
        );
    }

    #[test]
    fn test_yearly_has_three_periods() {
        let periods = periods(Granularity::Yearly, at(2024, 7, 1));
        let labels: Vec<_> = periods.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["2022", "2023", "2024"]);
    }

    #[test]
    fn test_periods_are_contiguous() {
        for granularity in [
            Granularity::Monthly,
            Granularity::Quarterly,
            Granularity::Yearly,
        ] {
            let periods = periods(granularity, at(2024, 12, 31));
            for pair in periods.windows(2) {
                assert_eq!(pair[0].end + Duration::nanoseconds(1), pair[1].start);
            }
        }
    }

    #[test]
    fn test_february_leap_year_end() {
        let periods = periods(Granularity::Monthly, at(2024, 3, 1));
        let feb = &periods[1];
        assert_eq!(feb.end.date(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert!(feb.contains(at(2024, 2, 29)));
    }

    #[test]
    fn test_contains_inclusive_bounds() {
        let period = month_period(2024, 1).unwrap();
        assert!(period.contains(period.start));
        assert!(period.contains(period.end));
        assert!(!period.contains(period.end + Duration::nanoseconds(1)));
    }

    #[test]
    fn test_quarter_of() {
        assert_eq!(quarter_of(1), 1);
        assert_eq!(quarter_of(3), 1);
        assert_eq!(quarter_of(4), 2);
        assert_eq!(quarter_of(12), 4);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert_eq!(
            parse_timestamp("2024-01-15"),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap().and_hms_opt(0, 0, 0)
        );
        assert_eq!(
            parse_timestamp("2024-01-15T08:30:00.250"),
            NaiveDate::from_ymd_opt(2024, 1, 15)
                .unwrap()
                .and_hms_milli_opt(8, 30, 0, 250)
        );
        assert_eq!(
            parse_timestamp("2024-01-15 08:30:00"),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap().and_hms_opt(8, 30, 0)
        );
        assert_eq!(
            parse_timestamp("2024-01-15T23:30:00-02:00"),
            NaiveDate::from_ymd_opt(2024, 1, 16).unwrap().and_hms_opt(1, 30, 0)
        );
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("   "), None);
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("2024-13-01"), None);
    }
}
