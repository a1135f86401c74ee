use anyhow::Result;
use serde::Serialize;

use mealwise_core::health::{bmi_report, recommended_protein};
use mealwise_core::models::Gender;

pub(crate) fn cmd_bmi(
    height_cm: f64,
    weight_kg: f64,
    age: Option<i64>,
    gender: Option<&str>,
    json: bool,
) -> Result<()> {
    let gender: Option<Gender> = gender.map(str::parse).transpose()?;
    if age.is_some() != gender.is_some() {
        eprintln!("Note: both --age and --gender are needed for BMR and a calorie goal");
    }
    let report = bmi_report(weight_kg, height_cm, age, gender)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("BMI: {:.1} ({})", report.bmi, report.category.as_str());
    if let (Some(bmr), Some(goal)) = (report.bmr, report.calorie_goal) {
        println!("BMR: {bmr} kcal/day");
        println!("Calorie goal: {goal} kcal/day");
    }
    Ok(())
}

pub(crate) fn cmd_protein(weight_kg: f64, goal_factor: f64, json: bool) -> Result<()> {
    let protein_g = recommended_protein(weight_kg, goal_factor)?;

    if json {
        #[derive(Serialize)]
        struct ProteinOutput {
            weight_kg: f64,
            goal_factor: f64,
            protein_g: i64,
        }
        let out = ProteinOutput {
            weight_kg,
            goal_factor,
            protein_g,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("Recommended protein: {protein_g} g/day");
    Ok(())
}
