//! Date-bucketed aggregation for the dashboard trackers.
//!
//! Records carry a `YYYY-MM-DD` date string. Everything on or after a
//! period's start date is grouped by that string and summed; the period
//! total is always the sum of the daily buckets.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::AddAssign;
use std::str::FromStr;

use anyhow::{Result, bail};
use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::{ExerciseEntry, MealIntake, WaterEntry, format_date, parse_date};

/// Calendar-relative range selector. Only the lower bound is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Period {
    #[default]
    ThisWeek,
    LastWeek,
    ThisMonth,
    LastMonth,
}

impl Period {
    pub const ALL: &'static [Period] = &[
        Period::ThisWeek,
        Period::LastWeek,
        Period::ThisMonth,
        Period::LastMonth,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Period::ThisWeek => "this-week",
            Period::LastWeek => "last-week",
            Period::ThisMonth => "this-month",
            Period::LastMonth => "last-month",
        }
    }

    /// First day included in the period. Weeks start on Sunday.
    #[must_use]
    pub fn start_date(self, today: NaiveDate) -> NaiveDate {
        match self {
            Period::ThisWeek => {
                today - chrono::Duration::days(i64::from(today.weekday().num_days_from_sunday()))
            }
            Period::LastWeek => today - chrono::Duration::days(7),
            Period::ThisMonth => first_of_month(today),
            Period::LastMonth => {
                let first = first_of_month(today);
                first.checked_sub_months(Months::new(1)).unwrap_or(first)
            }
        }
    }

    /// Parses an optional selector, defaulting to `this-week` when absent.
    pub fn parse_or_default(s: Option<&str>) -> Result<Self> {
        match s {
            None => Ok(Period::default()),
            Some(s) if s.trim().is_empty() => Ok(Period::default()),
            Some(s) => s.parse(),
        }
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

impl FromStr for Period {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_lowercase();
        match Period::ALL.iter().find(|p| p.as_str() == lower) {
            Some(p) => Ok(*p),
            None => bail!(
                "Invalid period '{s}'. Must be one of: {}",
                Period::ALL
                    .iter()
                    .map(|p| p.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record that belongs to one calendar day.
pub trait Dated {
    fn date_key(&self) -> &str;
}

impl Dated for WaterEntry {
    fn date_key(&self) -> &str {
        &self.date
    }
}

impl Dated for ExerciseEntry {
    fn date_key(&self) -> &str {
        &self.date
    }
}

impl Dated for MealIntake {
    fn date_key(&self) -> &str {
        &self.date
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodTotals<T> {
    pub total: T,
    pub daily_totals: BTreeMap<String, T>,
}

impl<T: Default> Default for PeriodTotals<T> {
    fn default() -> Self {
        Self {
            total: T::default(),
            daily_totals: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ExerciseTotals {
    pub duration: f64,
    pub calories: f64,
}

impl AddAssign for ExerciseTotals {
    fn add_assign(&mut self, rhs: Self) {
        self.duration += rhs.duration;
        self.calories += rhs.calories;
    }
}

/// Groups `records` dated on or after `since` by day and sums `value` per day.
///
/// Records with an unparseable date are skipped with a warning.
pub fn aggregate<R, T, F>(records: &[R], since: NaiveDate, value: F) -> PeriodTotals<T>
where
    R: Dated,
    T: Copy + Default + AddAssign,
    F: Fn(&R) -> T,
{
    let mut daily_totals: BTreeMap<String, T> = BTreeMap::new();
    for record in records {
        let key = record.date_key();
        let date = match parse_date(key) {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!(date = key, error = %e, "skipping record with bad date");
                continue;
            }
        };
        if date < since {
            continue;
        }
        *daily_totals.entry(format_date(date)).or_default() += value(record);
    }

    let mut total = T::default();
    for v in daily_totals.values() {
        total += *v;
    }
    PeriodTotals {
        total,
        daily_totals,
    }
}

fn finite_or_zero(v: Option<f64>) -> f64 {
    v.filter(|x| x.is_finite()).unwrap_or(0.0)
}

pub fn water_totals(entries: &[WaterEntry], period: Period, today: NaiveDate) -> PeriodTotals<f64> {
    aggregate(entries, period.start_date(today), |e| {
        finite_or_zero(e.amount_ml)
    })
}

pub fn exercise_totals(
    entries: &[ExerciseEntry],
    period: Period,
    today: NaiveDate,
) -> PeriodTotals<ExerciseTotals> {
    aggregate(entries, period.start_date(today), |e| ExerciseTotals {
        duration: finite_or_zero(e.duration_min),
        calories: finite_or_zero(e.calories_burned),
    })
}

pub fn calorie_totals(intake: &[MealIntake], period: Period, today: NaiveDate) -> PeriodTotals<f64> {
    aggregate(intake, period.start_date(today), |m| {
        finite_or_zero(Some(m.calories))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MealCategory;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn water(date: &str, amount: Option<f64>) -> WaterEntry {
        WaterEntry {
            id: 0,
            date: date.to_string(),
            amount_ml: amount,
            created_at: String::new(),
        }
    }

    fn intake(date: &str, calories: f64) -> MealIntake {
        MealIntake {
            date: date.to_string(),
            meal_id: 1,
            slot: MealCategory::Lunch,
            calories,
        }
    }

    #[test]
    fn test_this_week_starts_on_sunday() {
        // 2024-01-10 is a Wednesday
        assert_eq!(Period::ThisWeek.start_date(date(2024, 1, 10)), date(2024, 1, 7));
        // Sunday is its own start
        assert_eq!(Period::ThisWeek.start_date(date(2024, 1, 7)), date(2024, 1, 7));
        assert_eq!(Period::ThisWeek.start_date(date(2024, 1, 13)), date(2024, 1, 7));
    }

    #[test]
    fn test_last_week_is_seven_days_back() {
        assert_eq!(Period::LastWeek.start_date(date(2024, 3, 5)), date(2024, 2, 27));
    }

    #[test]
    fn test_month_periods() {
        assert_eq!(Period::ThisMonth.start_date(date(2024, 3, 15)), date(2024, 3, 1));
        assert_eq!(Period::LastMonth.start_date(date(2024, 3, 31)), date(2024, 2, 1));
        assert_eq!(Period::LastMonth.start_date(date(2024, 1, 20)), date(2023, 12, 1));
    }

    #[test]
    fn test_parse_period() {
        assert_eq!("this-month".parse::<Period>().unwrap(), Period::ThisMonth);
        assert_eq!("LAST-WEEK".parse::<Period>().unwrap(), Period::LastWeek);
        assert!("yesterday".parse::<Period>().is_err());
        assert_eq!(Period::parse_or_default(None).unwrap(), Period::ThisWeek);
        assert_eq!(Period::parse_or_default(Some("")).unwrap(), Period::ThisWeek);
        assert!(Period::parse_or_default(Some("fortnight")).is_err());
    }

    #[test]
    fn test_water_grouped_by_day() {
        let entries = vec![
            water("2024-01-01", Some(500.0)),
            water("2024-01-01", Some(250.0)),
            water("2024-01-02", Some(2000.0)),
        ];
        let totals = aggregate(&entries, date(2024, 1, 1), |e| e.amount_ml.unwrap_or(0.0));
        assert_eq!(totals.daily_totals.len(), 2);
        assert!((totals.daily_totals["2024-01-01"] - 750.0).abs() < f64::EPSILON);
        assert!((totals.daily_totals["2024-01-02"] - 2000.0).abs() < f64::EPSILON);
        assert!((totals.total - 2750.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_meals_on_one_day() {
        let meals = vec![
            intake("2024-01-03", 300.0),
            intake("2024-01-03", 450.0),
            intake("2024-01-03", 520.0),
        ];
        let totals = calorie_totals(&meals, Period::ThisWeek, date(2024, 1, 3));
        assert!((totals.daily_totals["2024-01-03"] - 1270.0).abs() < f64::EPSILON);
        assert!((totals.total - 1270.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_total_equals_sum_of_days() {
        let meals: Vec<MealIntake> = (1..=28)
            .map(|d| intake(&format!("2024-02-{d:02}"), f64::from(d) * 37.5))
            .collect();
        let totals = calorie_totals(&meals, Period::ThisMonth, date(2024, 2, 28));
        let sum: f64 = totals.daily_totals.values().sum();
        assert!((totals.total - sum).abs() < 1e-9);
        assert_eq!(totals.daily_totals.len(), 28);
    }

    #[test]
    fn test_records_before_start_excluded() {
        let entries = vec![
            water("2024-01-06", Some(1000.0)),
            water("2024-01-07", Some(300.0)),
        ];
        let totals = water_totals(&entries, Period::ThisWeek, date(2024, 1, 10));
        assert_eq!(totals.daily_totals.len(), 1);
        assert!((totals.total - 300.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_no_upper_bound() {
        let entries = vec![water("2024-01-20", Some(400.0))];
        let totals = water_totals(&entries, Period::LastWeek, date(2024, 1, 10));
        assert!((totals.total - 400.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_input() {
        let totals = water_totals(&[], Period::ThisMonth, date(2024, 1, 10));
        assert_eq!(totals, PeriodTotals::default());
    }

    #[test]
    fn test_missing_amount_counts_as_zero() {
        let entries = vec![water("2024-01-08", None), water("2024-01-09", Some(f64::NAN))];
        let totals = water_totals(&entries, Period::ThisWeek, date(2024, 1, 10));
        assert_eq!(totals.daily_totals.len(), 2);
        assert!(totals.total.abs() < f64::EPSILON);
    }

    #[test]
    fn test_unpadded_dates_share_a_day() {
        let entries = vec![water("2024-1-8", Some(250.0)), water("2024-01-08", Some(500.0))];
        let totals = water_totals(&entries, Period::ThisWeek, date(2024, 1, 10));
        assert_eq!(totals.daily_totals.len(), 1);
        assert!((totals.daily_totals["2024-01-08"] - 750.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_bad_date_skipped() {
        let entries = vec![water("not-a-date", Some(999.0)), water("2024-01-08", Some(100.0))];
        let totals = water_totals(&entries, Period::ThisWeek, date(2024, 1, 10));
        assert_eq!(totals.daily_totals.len(), 1);
        assert!((totals.total - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_exercise_totals() {
        let entry = |date: &str, duration: f64, calories: Option<f64>| ExerciseEntry {
            id: 0,
            date: date.to_string(),
            kind: "running".to_string(),
            duration_min: Some(duration),
            calories_burned: calories,
            notes: None,
            created_at: String::new(),
        };
        let entries = vec![
            entry("2024-01-08", 30.0, Some(300.0)),
            entry("2024-01-08", 15.0, None),
            entry("2024-01-09", 45.0, Some(400.0)),
        ];
        let totals = exercise_totals(&entries, Period::ThisWeek, date(2024, 1, 10));
        assert_eq!(
            totals.daily_totals["2024-01-08"],
            ExerciseTotals {
                duration: 45.0,
                calories: 300.0
            }
        );
        assert_eq!(
            totals.total,
            ExerciseTotals {
                duration: 90.0,
                calories: 700.0
            }
        );
    }
}
