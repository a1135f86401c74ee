use std::collections::BTreeMap;

use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;

use super::Database;
use crate::aggregate::{self, ExerciseTotals, Period};
use crate::health;
use crate::models::{HealthProfile, Meal, UserGoals, format_date};

const RECENT_MEALS: i64 = 6;

#[derive(Debug, Clone, Serialize)]
pub struct TrackerSummary {
    pub current: f64,
    pub goal: i64,
    pub daily_data: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExerciseSummary {
    /// Minutes in the period.
    pub current: f64,
    pub goal: i64,
    pub calories_burned: f64,
    pub daily_data: BTreeMap<String, ExerciseTotals>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub period: Period,
    pub start_date: String,
    pub calorie_tracker: TrackerSummary,
    pub water_tracker: TrackerSummary,
    pub exercise_tracker: ExerciseSummary,
    pub planned_meals: usize,
    pub logging_streak: i64,
    pub recent_meals: Vec<Meal>,
    pub goals: UserGoals,
}

/// The stored calorie goal, unless it was never customised and the profile
/// has everything needed to derive one from BMR.
fn effective_calorie_goal(goals: &UserGoals, profile: &HealthProfile) -> i64 {
    if goals.customized {
        return goals.calorie_goal;
    }
    let (Some(age), Some(weight), Some(height), Some(gender)) =
        (profile.age, profile.weight_kg, profile.height_cm, profile.gender)
    else {
        return goals.calorie_goal;
    };
    match health::bmr(gender, weight, height, age) {
        Ok(bmr) => health::daily_calorie_goal(bmr),
        Err(e) => {
            tracing::warn!(error = %e, "profile cannot derive a calorie goal");
            goals.calorie_goal
        }
    }
}

impl Database {
    /// Consecutive days with planned meals, ending today or yesterday.
    pub fn get_logging_streak(&self, user_id: i64, today: NaiveDate) -> Result<i64> {
        let dates = self.planned_dates(user_id)?;
        if dates.is_empty() {
            return Ok(0);
        }

        let today_str = format_date(today);
        let yesterday = today - chrono::Duration::days(1);
        let yesterday_str = format_date(yesterday);

        // Plans may exist for future days; skip past them.
        let past: Vec<&String> = dates.iter().filter(|d| **d <= today_str).collect();

        let start_date = if past.first().is_some_and(|d| **d == today_str) {
            today
        } else if past.first().is_some_and(|d| **d == yesterday_str) {
            yesterday
        } else {
            return Ok(0);
        };

        let mut streak: i64 = 0;
        for date_str in past {
            let expected = format_date(start_date - chrono::Duration::days(streak));
            if *date_str == expected {
                streak += 1;
            } else {
                break;
            }
        }

        Ok(streak)
    }

    pub fn build_dashboard(&self, user_id: i64, period: Period, today: NaiveDate) -> Result<Dashboard> {
        let since = period.start_date(today);
        let goals = self.get_goals(user_id)?;
        let profile = self.get_profile(user_id)?;

        let intake = self.planned_intake(user_id, since)?;
        let calories = aggregate::calorie_totals(&intake, period, today);
        let water = aggregate::water_totals(&self.list_water(user_id, Some(since))?, period, today);
        let exercise =
            aggregate::exercise_totals(&self.list_exercise(user_id, Some(since))?, period, today);

        Ok(Dashboard {
            period,
            start_date: format_date(since),
            calorie_tracker: TrackerSummary {
                current: calories.total,
                goal: effective_calorie_goal(&goals, &profile),
                daily_data: calories.daily_totals,
            },
            water_tracker: TrackerSummary {
                current: water.total,
                goal: goals.water_goal_ml,
                daily_data: water.daily_totals,
            },
            exercise_tracker: ExerciseSummary {
                current: exercise.total.duration,
                goal: goals.exercise_goal_min,
                calories_burned: exercise.total.calories,
                daily_data: exercise.daily_totals,
            },
            planned_meals: intake.len(),
            logging_streak: self.get_logging_streak(user_id, today)?,
            recent_meals: self.recent_meals(user_id, RECENT_MEALS)?,
            goals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{new_meal, user};
    use crate::models::{Gender, MealCategory, NewExerciseEntry, UpdateGoals, UpdateProfile};

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_empty_dashboard() {
        let db = Database::open_in_memory().unwrap();
        let uid = user(&db, "a@example.com");
        let dash = db.build_dashboard(uid, Period::ThisWeek, date(10)).unwrap();
        assert_eq!(dash.start_date, "2024-01-07");
        assert!(dash.calorie_tracker.current.abs() < f64::EPSILON);
        assert!(dash.calorie_tracker.daily_data.is_empty());
        assert_eq!(dash.calorie_tracker.goal, 2000);
        assert_eq!(dash.water_tracker.goal, 2000);
        assert_eq!(dash.exercise_tracker.goal, 150);
        assert_eq!(dash.logging_streak, 0);
        assert!(dash.recent_meals.is_empty());
    }

    #[test]
    fn test_dashboard_aggregates_period() {
        let db = Database::open_in_memory().unwrap();
        let uid = user(&db, "a@example.com");
        let a = db.create_meal(uid, &new_meal("A", MealCategory::Lunch, 300.0)).unwrap();
        let b = db.create_meal(uid, &new_meal("B", MealCategory::Dinner, 450.0)).unwrap();

        // Before the week starts (Sunday 2024-01-07)
        db.add_meal_to_plan(uid, date(6), MealCategory::Lunch, a.id).unwrap();
        db.log_water(uid, date(6), 900.0).unwrap();

        db.add_meal_to_plan(uid, date(8), MealCategory::Lunch, a.id).unwrap();
        db.add_meal_to_plan(uid, date(8), MealCategory::Dinner, b.id).unwrap();
        db.add_meal_to_plan(uid, date(9), MealCategory::Lunch, b.id).unwrap();
        db.log_water(uid, date(8), 500.0).unwrap();
        db.log_water(uid, date(8), 250.0).unwrap();
        db.log_exercise(
            uid,
            &NewExerciseEntry {
                date: date(9),
                kind: "run".to_string(),
                duration_min: 30.0,
                calories_burned: Some(280.0),
                notes: None,
            },
        )
        .unwrap();

        let dash = db.build_dashboard(uid, Period::ThisWeek, date(10)).unwrap();
        assert!((dash.calorie_tracker.current - 1200.0).abs() < f64::EPSILON);
        assert!((dash.calorie_tracker.daily_data["2024-01-08"] - 750.0).abs() < f64::EPSILON);
        assert!((dash.water_tracker.current - 750.0).abs() < f64::EPSILON);
        assert!((dash.exercise_tracker.current - 30.0).abs() < f64::EPSILON);
        assert!((dash.exercise_tracker.calories_burned - 280.0).abs() < f64::EPSILON);
        assert_eq!(dash.planned_meals, 3);
        assert_eq!(dash.recent_meals.len(), 2);

        let month = db.build_dashboard(uid, Period::ThisMonth, date(10)).unwrap();
        assert!((month.calorie_tracker.current - 1500.0).abs() < f64::EPSILON);
        assert!((month.water_tracker.current - 1650.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_derived_calorie_goal_until_customized() {
        let db = Database::open_in_memory().unwrap();
        let uid = user(&db, "a@example.com");
        db.update_profile(
            uid,
            &UpdateProfile {
                age: Some(30),
                weight_kg: Some(70.0),
                height_cm: Some(175.0),
                gender: Some(Gender::Male),
            },
        )
        .unwrap();
        let dash = db.build_dashboard(uid, Period::ThisWeek, date(10)).unwrap();
        assert_eq!(dash.calorie_tracker.goal, 2035);

        db.update_goals(
            uid,
            &UpdateGoals {
                calorie_goal: Some(1800),
                ..UpdateGoals::default()
            },
        )
        .unwrap();
        let dash = db.build_dashboard(uid, Period::ThisWeek, date(10)).unwrap();
        assert_eq!(dash.calorie_tracker.goal, 1800);
    }

    #[test]
    fn test_incomplete_profile_uses_stored_goal() {
        let db = Database::open_in_memory().unwrap();
        let uid = user(&db, "a@example.com");
        db.update_profile(
            uid,
            &UpdateProfile {
                weight_kg: Some(70.0),
                ..UpdateProfile::default()
            },
        )
        .unwrap();
        let dash = db.build_dashboard(uid, Period::ThisWeek, date(10)).unwrap();
        assert_eq!(dash.calorie_tracker.goal, 2000);
    }

    #[test]
    fn test_logging_streak() {
        let db = Database::open_in_memory().unwrap();
        let uid = user(&db, "a@example.com");
        let a = db.create_meal(uid, &new_meal("A", MealCategory::Lunch, 300.0)).unwrap();
        for d in [5, 7, 8, 9] {
            db.add_meal_to_plan(uid, date(d), MealCategory::Lunch, a.id).unwrap();
        }
        // Ends yesterday
        assert_eq!(db.get_logging_streak(uid, date(10)).unwrap(), 3);
        // Ends today
        assert_eq!(db.get_logging_streak(uid, date(9)).unwrap(), 3);
        // Gap of two days breaks it
        assert_eq!(db.get_logging_streak(uid, date(11)).unwrap(), 0);

        // Future plans don't count and don't hide today's streak
        db.add_meal_to_plan(uid, date(20), MealCategory::Lunch, a.id).unwrap();
        assert_eq!(db.get_logging_streak(uid, date(9)).unwrap(), 3);
    }
}
