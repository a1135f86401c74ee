use anyhow::{Result, bail};
use serde::Serialize;

use crate::models::Gender;

pub const LBS_PER_KG: f64 = 2.20462;
pub const SEDENTARY_ACTIVITY_FACTOR: f64 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BmiCategory::Underweight => "Underweight",
            BmiCategory::Normal => "Normal",
            BmiCategory::Overweight => "Overweight",
            BmiCategory::Obese => "Obese",
        }
    }
}

fn require_positive(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        bail!("{field} must be greater than 0");
    }
    Ok(())
}

/// Body mass index, unrounded: `weight / (height in metres)^2`.
pub fn bmi(weight_kg: f64, height_cm: f64) -> Result<f64> {
    require_positive("Weight", weight_kg)?;
    require_positive("Height", height_cm)?;
    let height_m = height_cm / 100.0;
    Ok(weight_kg / (height_m * height_m))
}

#[must_use]
pub fn round_bmi(bmi: f64) -> f64 {
    (bmi * 10.0).round() / 10.0
}

/// Boundary values belong to the higher category.
#[must_use]
pub fn bmi_category(bmi: f64) -> BmiCategory {
    if bmi < 18.5 {
        BmiCategory::Underweight
    } else if bmi < 25.0 {
        BmiCategory::Normal
    } else if bmi < 30.0 {
        BmiCategory::Overweight
    } else {
        BmiCategory::Obese
    }
}

/// Basal metabolic rate (Harris-Benedict), kcal/day, unrounded.
pub fn bmr(gender: Gender, weight_kg: f64, height_cm: f64, age: i64) -> Result<f64> {
    require_positive("Weight", weight_kg)?;
    require_positive("Height", height_cm)?;
    if age <= 0 {
        bail!("Age must be greater than 0");
    }
    #[allow(clippy::cast_precision_loss)]
    let age = age as f64;
    Ok(match gender {
        Gender::Male => 88.362 + 13.397 * weight_kg + 4.799 * height_cm - 5.677 * age,
        Gender::Female => 447.593 + 9.247 * weight_kg + 3.098 * height_cm - 4.330 * age,
    })
}

#[must_use]
pub fn daily_calorie_goal(bmr: f64) -> i64 {
    (bmr * SEDENTARY_ACTIVITY_FACTOR).round() as i64
}

/// Grams of protein per day for a goal factor expressed in grams per pound.
pub fn recommended_protein(weight_kg: f64, goal_factor: f64) -> Result<i64> {
    require_positive("Weight", weight_kg)?;
    require_positive("Goal factor", goal_factor)?;
    Ok((weight_kg * LBS_PER_KG * goal_factor).round() as i64)
}

#[derive(Debug, Clone, Serialize)]
pub struct BmiReport {
    pub bmi: f64,
    pub category: BmiCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bmr: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calorie_goal: Option<i64>,
}

/// BMI with its category, plus BMR and the derived calorie goal when age and
/// gender are known.
pub fn bmi_report(
    weight_kg: f64,
    height_cm: f64,
    age: Option<i64>,
    gender: Option<Gender>,
) -> Result<BmiReport> {
    let bmi = round_bmi(bmi(weight_kg, height_cm)?);
    let bmr = match (age, gender) {
        (Some(age), Some(gender)) => Some(bmr(gender, weight_kg, height_cm, age)?),
        _ => None,
    };
    Ok(BmiReport {
        bmi,
        category: bmi_category(bmi),
        bmr: bmr.map(|b| b.round() as i64),
        calorie_goal: bmr.map(daily_calorie_goal),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bmi_basic() {
        let value = bmi(70.0, 175.0).unwrap();
        assert!((value - 22.857_142_857).abs() < 1e-6);
        assert!((round_bmi(value) - 22.9).abs() < f64::EPSILON);
    }

    #[test]
    fn test_bmi_monotonic() {
        let light = bmi(60.0, 175.0).unwrap();
        let heavy = bmi(80.0, 175.0).unwrap();
        assert!(heavy > light);

        let short = bmi(70.0, 160.0).unwrap();
        let tall = bmi(70.0, 190.0).unwrap();
        assert!(short > tall);
    }

    #[test]
    fn test_bmi_rejects_non_positive() {
        assert!(bmi(0.0, 175.0).is_err());
        assert!(bmi(70.0, 0.0).is_err());
        assert!(bmi(-1.0, 175.0).is_err());
        assert!(bmi(70.0, f64::NAN).is_err());
    }

    #[test]
    fn test_category_boundaries() {
        assert_eq!(bmi_category(18.4999), BmiCategory::Underweight);
        assert_eq!(bmi_category(18.5), BmiCategory::Normal);
        assert_eq!(bmi_category(24.9999), BmiCategory::Normal);
        assert_eq!(bmi_category(25.0), BmiCategory::Overweight);
        assert_eq!(bmi_category(29.9999), BmiCategory::Overweight);
        assert_eq!(bmi_category(30.0), BmiCategory::Obese);
    }

    #[test]
    fn test_bmr_male() {
        let expected = 88.362 + 13.397 * 70.0 + 4.799 * 175.0 - 5.677 * 30.0;
        let value = bmr(Gender::Male, 70.0, 175.0, 30).unwrap();
        assert!((value - expected).abs() < 1e-6);
    }

    #[test]
    fn test_bmr_female() {
        let expected = 447.593 + 9.247 * 60.0 + 3.098 * 165.0 - 4.330 * 25.0;
        let value = bmr(Gender::Female, 60.0, 165.0, 25).unwrap();
        assert!((value - expected).abs() < 1e-6);
    }

    #[test]
    fn test_bmr_rejects_age() {
        assert!(bmr(Gender::Male, 70.0, 175.0, 0).is_err());
        assert!(bmr(Gender::Female, 70.0, 175.0, -3).is_err());
    }

    #[test]
    fn test_daily_calorie_goal() {
        // 1695.667 * 1.2 = 2034.8
        let value = bmr(Gender::Male, 70.0, 175.0, 30).unwrap();
        assert_eq!(daily_calorie_goal(value), 2035);
    }

    #[test]
    fn test_recommended_protein() {
        assert_eq!(recommended_protein(70.0, 0.8).unwrap(), 123);
        assert_eq!(recommended_protein(100.0, 1.0).unwrap(), 220);
        assert!(recommended_protein(0.0, 0.8).is_err());
        assert!(recommended_protein(70.0, 0.0).is_err());
        assert!(recommended_protein(70.0, -0.5).is_err());
    }

    #[test]
    fn test_bmi_report_without_age() {
        let report = bmi_report(70.0, 175.0, None, Some(Gender::Male)).unwrap();
        assert!((report.bmi - 22.9).abs() < f64::EPSILON);
        assert_eq!(report.category, BmiCategory::Normal);
        assert!(report.bmr.is_none());
        assert!(report.calorie_goal.is_none());
    }

    #[test]
    fn test_bmi_report_category_uses_rounded_value() {
        // 24.96... rounds to 25.0
        let report = bmi_report(76.45, 175.0, None, None).unwrap();
        assert!((report.bmi - 25.0).abs() < f64::EPSILON);
        assert_eq!(report.category, BmiCategory::Overweight);
    }

    #[test]
    fn test_bmi_report_full() {
        let report = bmi_report(70.0, 175.0, Some(30), Some(Gender::Male)).unwrap();
        assert_eq!(report.bmr, Some(1696));
        assert_eq!(report.calorie_goal, Some(2035));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["category"], "Normal");
    }
}
