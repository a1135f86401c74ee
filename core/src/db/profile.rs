use anyhow::Result;
use chrono::Local;
use rusqlite::params;

use super::{Database, parse_optional_column};
use crate::models::{
    BmiRecord, DEFAULT_CALORIE_GOAL, DEFAULT_EXERCISE_GOAL_MIN, DEFAULT_WATER_GOAL_ML, Gender,
    HealthProfile, ProteinRecord, UpdateGoals, UpdateProfile, UserGoals, validate_goals,
    validate_profile,
};

impl Database {
    // --- Goals ---

    /// Goals for a user, created with the defaults on first read.
    pub fn get_goals(&self, user_id: i64) -> Result<UserGoals> {
        self.conn.execute(
            "INSERT INTO user_goals (user_id, calorie_goal, water_goal_ml, exercise_goal_min, customized, updated_at)
             VALUES (?1, ?2, ?3, ?4, 0, ?5)
             ON CONFLICT(user_id) DO NOTHING",
            params![
                user_id,
                DEFAULT_CALORIE_GOAL,
                DEFAULT_WATER_GOAL_ML,
                DEFAULT_EXERCISE_GOAL_MIN,
                Local::now().to_rfc3339()
            ],
        )?;
        let goals = self.conn.query_row(
            "SELECT calorie_goal, water_goal_ml, exercise_goal_min, customized, updated_at
             FROM user_goals WHERE user_id = ?1",
            params![user_id],
            |row| {
                Ok(UserGoals {
                    calorie_goal: row.get(0)?,
                    water_goal_ml: row.get(1)?,
                    exercise_goal_min: row.get(2)?,
                    customized: row.get(3)?,
                    updated_at: row.get(4)?,
                })
            },
        )?;
        Ok(goals)
    }

    /// Applies the provided goals and marks the goals as customised.
    pub fn update_goals(&self, user_id: i64, update: &UpdateGoals) -> Result<UserGoals> {
        validate_goals(update)?;
        let current = self.get_goals(user_id)?;
        self.conn.execute(
            "UPDATE user_goals SET calorie_goal = ?1, water_goal_ml = ?2, exercise_goal_min = ?3,
                    customized = 1, updated_at = ?4
             WHERE user_id = ?5",
            params![
                update.calorie_goal.unwrap_or(current.calorie_goal),
                update.water_goal_ml.unwrap_or(current.water_goal_ml),
                update.exercise_goal_min.unwrap_or(current.exercise_goal_min),
                Local::now().to_rfc3339(),
                user_id
            ],
        )?;
        self.get_goals(user_id)
    }

    // --- Health profile ---

    fn ensure_profile(&self, user_id: i64) -> Result<()> {
        self.conn.execute(
            "INSERT INTO health_profiles (user_id, updated_at) VALUES (?1, ?2)
             ON CONFLICT(user_id) DO NOTHING",
            params![user_id, Local::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn get_profile(&self, user_id: i64) -> Result<HealthProfile> {
        let mut stmt = self.conn.prepare(
            "SELECT age, weight_kg, height_cm, gender, last_bmi, last_calculated
             FROM health_profiles WHERE user_id = ?1",
        )?;
        let mut rows = stmt.query(params![user_id])?;
        if let Some(row) = rows.next()? {
            Ok(HealthProfile {
                age: row.get(0)?,
                weight_kg: row.get(1)?,
                height_cm: row.get(2)?,
                gender: parse_optional_column(row, 3)?,
                last_bmi: row.get(4)?,
                last_calculated: row.get(5)?,
            })
        } else {
            Ok(HealthProfile::default())
        }
    }

    pub fn update_profile(&self, user_id: i64, update: &UpdateProfile) -> Result<HealthProfile> {
        validate_profile(update)?;
        self.ensure_profile(user_id)?;
        let current = self.get_profile(user_id)?;
        self.conn.execute(
            "UPDATE health_profiles SET age = ?1, weight_kg = ?2, height_cm = ?3, gender = ?4,
                    updated_at = ?5
             WHERE user_id = ?6",
            params![
                update.age.or(current.age),
                update.weight_kg.or(current.weight_kg),
                update.height_cm.or(current.height_cm),
                update.gender.or(current.gender).map(|g| g.as_str()),
                Local::now().to_rfc3339(),
                user_id
            ],
        )?;
        self.get_profile(user_id)
    }

    pub(super) fn set_profile_weight(&self, user_id: i64, weight_kg: f64) -> Result<()> {
        self.ensure_profile(user_id)?;
        self.conn.execute(
            "UPDATE health_profiles SET weight_kg = ?1, updated_at = ?2 WHERE user_id = ?3",
            params![weight_kg, Local::now().to_rfc3339(), user_id],
        )?;
        Ok(())
    }

    /// Stores the latest BMI calculation and the inputs it was computed from.
    pub fn record_bmi(
        &self,
        user_id: i64,
        bmi: f64,
        weight_kg: f64,
        height_cm: f64,
        gender: Option<Gender>,
    ) -> Result<()> {
        self.ensure_profile(user_id)?;
        let now = Local::now().to_rfc3339();
        self.conn.execute(
            "UPDATE health_profiles SET last_bmi = ?1, last_bmi_weight_kg = ?2,
                    last_bmi_height_cm = ?3, last_bmi_gender = ?4,
                    last_calculated = ?5, updated_at = ?5
             WHERE user_id = ?6",
            params![bmi, weight_kg, height_cm, gender.map(Gender::as_str), now, user_id],
        )?;
        Ok(())
    }

    pub fn last_bmi(&self, user_id: i64) -> Result<Option<BmiRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT last_bmi, last_bmi_weight_kg, last_bmi_height_cm, last_bmi_gender,
                    last_calculated
             FROM health_profiles
             WHERE user_id = ?1 AND last_bmi IS NOT NULL AND last_calculated IS NOT NULL",
        )?;
        let mut rows = stmt.query(params![user_id])?;
        if let Some(row) = rows.next()? {
            Ok(Some(BmiRecord {
                bmi: row.get(0)?,
                weight_kg: row.get(1)?,
                height_cm: row.get(2)?,
                gender: parse_optional_column(row, 3)?,
                calculated_at: row.get(4)?,
            }))
        } else {
            Ok(None)
        }
    }

    /// Stores the latest protein recommendation on the profile.
    pub fn record_protein(
        &self,
        user_id: i64,
        weight_kg: f64,
        goal_factor: f64,
        protein_g: i64,
    ) -> Result<ProteinRecord> {
        self.ensure_profile(user_id)?;
        let now = Local::now().to_rfc3339();
        self.conn.execute(
            "UPDATE health_profiles SET last_protein_weight_kg = ?1, last_goal_factor = ?2,
                    last_protein_g = ?3, last_protein_calculated = ?4, updated_at = ?4
             WHERE user_id = ?5",
            params![weight_kg, goal_factor, protein_g, now, user_id],
        )?;
        Ok(ProteinRecord {
            weight_kg,
            goal_factor,
            protein_g,
            calculated_at: now,
        })
    }

    pub fn last_protein(&self, user_id: i64) -> Result<Option<ProteinRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT last_protein_weight_kg, last_goal_factor, last_protein_g,
                    last_protein_calculated
             FROM health_profiles
             WHERE user_id = ?1 AND last_protein_g IS NOT NULL",
        )?;
        let mut rows = stmt.query(params![user_id])?;
        if let Some(row) = rows.next()? {
            Ok(Some(ProteinRecord {
                weight_kg: row.get(0)?,
                goal_factor: row.get(1)?,
                protein_g: row.get(2)?,
                calculated_at: row.get(3)?,
            }))
        } else {
            Ok(None)
        }
    }
}
