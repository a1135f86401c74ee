use anyhow::{Context, Result};
use chrono::Local;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use mealwise_core::aggregate::Period;
use mealwise_core::db::Database;

use super::helpers::{no_neg_zero, progress, truncate};

pub(crate) fn cmd_dashboard(db: &Database, email: &str, period: &str, json: bool) -> Result<()> {
    let period: Period = period.parse()?;
    let user = db
        .get_user_by_email(email)?
        .with_context(|| format!("No user with email '{}'", email.trim()))?;
    let dashboard = db.build_dashboard(user.id, period, Local::now().date_naive())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&dashboard)?);
        return Ok(());
    }

    println!("=== {} ({period}, since {}) ===\n", user.full_name, dashboard.start_date);

    #[derive(Tabled)]
    struct TrackerRow {
        #[tabled(rename = "Tracker")]
        name: &'static str,
        #[tabled(rename = "Progress")]
        progress: String,
    }

    let calories = &dashboard.calorie_tracker;
    let water = &dashboard.water_tracker;
    let exercise = &dashboard.exercise_tracker;
    let rows = vec![
        TrackerRow {
            name: "Calories (kcal)",
            progress: progress(calories.current, calories.goal),
        },
        TrackerRow {
            name: "Water (ml)",
            progress: progress(water.current, water.goal),
        },
        TrackerRow {
            name: "Exercise (min)",
            progress: progress(exercise.current, exercise.goal),
        },
        TrackerRow {
            name: "Burned (kcal)",
            progress: format!("{:.0}", no_neg_zero(exercise.calories_burned)),
        },
    ];
    let table = Table::new(&rows).with(Style::rounded()).to_string();
    println!("{table}");

    println!(
        "\nPlanned meals: {}  |  Logging streak: {} day(s)",
        dashboard.planned_meals, dashboard.logging_streak
    );

    if !dashboard.recent_meals.is_empty() {
        #[derive(Tabled)]
        struct MealRow {
            #[tabled(rename = "Meal")]
            name: String,
            #[tabled(rename = "Category")]
            category: String,
            #[tabled(rename = "Cal")]
            calories: String,
        }

        let rows: Vec<MealRow> = dashboard
            .recent_meals
            .iter()
            .map(|m| MealRow {
                name: truncate(&m.name, 35),
                category: m.category.to_string(),
                calories: format!("{:.0}", no_neg_zero(m.calories)),
            })
            .collect();
        let table = Table::new(&rows)
            .with(Style::rounded())
            .with(Modify::new(Columns::new(2..3)).with(Alignment::right()))
            .to_string();
        println!("\nRecently planned:\n{table}");
    }

    Ok(())
}
