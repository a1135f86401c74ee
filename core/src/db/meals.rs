use std::collections::HashMap;

use anyhow::Result;
use chrono::Local;
use rusqlite::params;
use uuid::Uuid;

use super::{Database, json_list_column, parse_column, to_json_list};
use crate::models::{
    Meal, MealFilter, NewMeal, UpdateMeal, validate_new_meal, validate_update_meal,
};
use crate::seed::seed_meals;

const MEAL_COLUMNS: &str = "id, uuid, name, description, category, calories, protein, carbs, fat,
     ingredients, instructions, prep_time_min, cook_time_min, servings, is_healthy,
     created_at, updated_at";

impl Database {
    pub(super) fn meal_from_row(row: &rusqlite::Row) -> rusqlite::Result<Meal> {
        Ok(Meal {
            id: row.get(0)?,
            uuid: row.get(1)?,
            name: row.get(2)?,
            description: row.get(3)?,
            category: parse_column(row, 4)?,
            calories: row.get(5)?,
            protein: row.get(6)?,
            carbs: row.get(7)?,
            fat: row.get(8)?,
            ingredients: json_list_column(row, 9)?,
            instructions: json_list_column(row, 10)?,
            prep_time_min: row.get(11)?,
            cook_time_min: row.get(12)?,
            servings: row.get(13)?,
            is_healthy: row.get(14)?,
            created_at: row.get(15)?,
            updated_at: row.get(16)?,
        })
    }

    pub fn create_meal(&self, user_id: i64, meal: &NewMeal) -> Result<Meal> {
        validate_new_meal(meal)?;
        let now = Local::now().to_rfc3339();
        let ingredients: Vec<String> = meal.ingredients.iter().map(|i| i.trim().to_string()).collect();
        self.conn.execute(
            "INSERT INTO meals (uuid, user_id, name, description, category, calories, protein, carbs, fat,
                                ingredients, instructions, prep_time_min, cook_time_min, servings, is_healthy,
                                created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
            params![
                Uuid::new_v4().to_string(),
                user_id,
                meal.name.trim(),
                meal.description,
                meal.category.as_str(),
                meal.calories,
                meal.protein,
                meal.carbs,
                meal.fat,
                to_json_list(&ingredients)?,
                to_json_list(&meal.instructions)?,
                meal.prep_time_min,
                meal.cook_time_min,
                meal.servings,
                meal.is_healthy,
                now,
                now,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_meal(user_id, id)?
            .ok_or_else(|| anyhow::anyhow!("Meal not found after insert"))
    }

    pub fn get_meal(&self, user_id: i64, id: i64) -> Result<Option<Meal>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {MEAL_COLUMNS} FROM meals WHERE id = ?1 AND user_id = ?2"
        ))?;
        let mut rows = stmt.query(params![id, user_id])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::meal_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    /// Lists a user's meals, newest first.
    pub fn list_meals(&self, user_id: i64, filter: &MealFilter) -> Result<Vec<Meal>> {
        let pattern = filter.q.as_deref().map(|q| {
            let escaped = q
                .trim()
                .replace('\\', "\\\\")
                .replace('%', "\\%")
                .replace('_', "\\_");
            format!("%{escaped}%")
        });
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {MEAL_COLUMNS} FROM meals
             WHERE user_id = ?1
               AND (?2 IS NULL OR category = ?2)
               AND (?3 = 0 OR is_healthy = 1)
               AND (?4 IS NULL OR name LIKE ?4 ESCAPE '\\')
             ORDER BY created_at DESC, id DESC"
        ))?;
        let meals = stmt
            .query_map(
                params![
                    user_id,
                    filter.category.map(|c| c.as_str()),
                    filter.healthy,
                    pattern
                ],
                Self::meal_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(meals)
    }

    /// Copies the built-in recipes into an empty catalogue, once per user.
    pub fn seed_meals_if_empty(&self, user_id: i64) -> Result<usize> {
        let (seeded, count): (bool, i64) = self.conn.query_row(
            "SELECT u.meals_seeded, (SELECT COUNT(*) FROM meals WHERE user_id = u.id)
             FROM users u WHERE u.id = ?1",
            params![user_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        if seeded || count > 0 {
            return Ok(0);
        }

        let tx = self.conn.unchecked_transaction()?;
        let meals = seed_meals();
        for meal in &meals {
            self.create_meal(user_id, meal)?;
        }
        self.conn.execute(
            "UPDATE users SET meals_seeded = 1 WHERE id = ?1",
            params![user_id],
        )?;
        tx.commit()?;
        tracing::info!(user_id, count = meals.len(), "seeded meal catalogue");
        Ok(meals.len())
    }

    pub fn update_meal(&self, user_id: i64, id: i64, update: &UpdateMeal) -> Result<Option<Meal>> {
        validate_update_meal(update)?;
        let Some(mut meal) = self.get_meal(user_id, id)? else {
            return Ok(None);
        };

        if let Some(ref name) = update.name {
            meal.name = name.trim().to_string();
        }
        if let Some(ref description) = update.description {
            meal.description = Some(description.clone());
        }
        if let Some(category) = update.category {
            meal.category = category;
        }
        meal.calories = update.calories.unwrap_or(meal.calories);
        meal.protein = update.protein.unwrap_or(meal.protein);
        meal.carbs = update.carbs.unwrap_or(meal.carbs);
        meal.fat = update.fat.unwrap_or(meal.fat);
        if let Some(ref ingredients) = update.ingredients {
            meal.ingredients = ingredients.iter().map(|i| i.trim().to_string()).collect();
        }
        if let Some(ref instructions) = update.instructions {
            meal.instructions.clone_from(instructions);
        }
        meal.prep_time_min = update.prep_time_min.or(meal.prep_time_min);
        meal.cook_time_min = update.cook_time_min.or(meal.cook_time_min);
        meal.servings = update.servings.or(meal.servings);
        meal.is_healthy = update.is_healthy.unwrap_or(meal.is_healthy);

        let tx = self.conn.unchecked_transaction()?;
        let now = Local::now().to_rfc3339();
        self.conn.execute(
            "UPDATE meals SET name = ?1, description = ?2, category = ?3, calories = ?4, protein = ?5,
                    carbs = ?6, fat = ?7, ingredients = ?8, instructions = ?9, prep_time_min = ?10,
                    cook_time_min = ?11, servings = ?12, is_healthy = ?13, updated_at = ?14
             WHERE id = ?15 AND user_id = ?16",
            params![
                meal.name,
                meal.description,
                meal.category.as_str(),
                meal.calories,
                meal.protein,
                meal.carbs,
                meal.fat,
                to_json_list(&meal.ingredients)?,
                to_json_list(&meal.instructions)?,
                meal.prep_time_min,
                meal.cook_time_min,
                meal.servings,
                meal.is_healthy,
                now,
                id,
                user_id,
            ],
        )?;
        // Plans referencing this meal carry stale totals now.
        for plan_day_id in self.plan_days_referencing(id)? {
            self.recompute_plan_day(plan_day_id)?;
        }
        tx.commit()?;
        self.get_meal(user_id, id)
    }

    /// Deletes a meal and drops it from every plan that references it.
    pub fn delete_meal(&self, user_id: i64, id: i64) -> Result<bool> {
        if self.get_meal(user_id, id)?.is_none() {
            return Ok(false);
        }
        let tx = self.conn.unchecked_transaction()?;
        let affected = self.plan_days_referencing(id)?;
        self.conn
            .execute("DELETE FROM plan_meals WHERE meal_id = ?1", params![id])?;
        self.conn.execute(
            "DELETE FROM meals WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        for plan_day_id in &affected {
            self.recompute_plan_day(*plan_day_id)?;
        }
        tx.commit()?;
        tracing::debug!(meal_id = id, plans = affected.len(), "deleted meal");
        Ok(true)
    }

    /// Fetches the given meals keyed by id. Ids that don't exist are absent.
    pub fn meals_by_ids(&self, user_id: i64, ids: &[i64]) -> Result<HashMap<i64, Meal>> {
        let mut meals = HashMap::with_capacity(ids.len());
        for &id in ids {
            if meals.contains_key(&id) {
                continue;
            }
            if let Some(meal) = self.get_meal(user_id, id)? {
                meals.insert(id, meal);
            }
        }
        Ok(meals)
    }

    pub fn recent_meals(&self, user_id: i64, limit: i64) -> Result<Vec<Meal>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {MEAL_COLUMNS} FROM meals WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC LIMIT ?2"
        ))?;
        let meals = stmt
            .query_map(params![user_id, limit], Self::meal_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(meals)
    }
}
