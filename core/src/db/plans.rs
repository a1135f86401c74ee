use anyhow::{Result, bail};
use chrono::{Local, NaiveDate};
use rusqlite::params;

use super::{Database, parse_column};
use crate::models::{MealCategory, MealIntake, Nutrition, PlanDay, PlanSlots, format_date};
use crate::planner;

impl Database {
    fn plan_day_id(&self, user_id: i64, date: NaiveDate) -> Result<Option<i64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM plan_days WHERE user_id = ?1 AND date = ?2")?;
        let mut rows = stmt.query(params![user_id, format_date(date)])?;
        if let Some(row) = rows.next()? {
            Ok(Some(row.get(0)?))
        } else {
            Ok(None)
        }
    }

    fn ensure_plan_day(&self, user_id: i64, date: NaiveDate) -> Result<i64> {
        let now = Local::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO plan_days (user_id, date, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(user_id, date) DO NOTHING",
            params![user_id, format_date(date), now, now],
        )?;
        self.plan_day_id(user_id, date)?
            .ok_or_else(|| anyhow::anyhow!("Plan day not found after insert"))
    }

    fn plan_slots(&self, plan_day_id: i64) -> Result<PlanSlots<i64>> {
        let mut stmt = self.conn.prepare(
            "SELECT slot, meal_id FROM plan_meals WHERE plan_day_id = ?1 ORDER BY position",
        )?;
        let rows = stmt
            .query_map(params![plan_day_id], |row| {
                Ok((parse_column::<MealCategory>(row, 0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut slots = PlanSlots::default();
        for (slot, meal_id) in rows {
            slots.slot_mut(slot).push(meal_id);
        }
        Ok(slots)
    }

    /// Recomputes a plan day's stored totals from the meals it references.
    pub(super) fn recompute_plan_day(&self, plan_day_id: i64) -> Result<Nutrition> {
        let user_id: i64 = self.conn.query_row(
            "SELECT user_id FROM plan_days WHERE id = ?1",
            params![plan_day_id],
            |row| row.get(0),
        )?;
        let slots = self.plan_slots(plan_day_id)?;
        let ids: Vec<i64> = slots.iter().map(|(_, id)| *id).collect();
        let meals = self.meals_by_ids(user_id, &ids)?;
        let totals = planner::recompute_totals(&slots, &meals);

        self.conn.execute(
            "UPDATE plan_days SET total_calories = ?1, total_protein = ?2, total_carbs = ?3,
                    total_fat = ?4, updated_at = ?5
             WHERE id = ?6",
            params![
                totals.calories,
                totals.protein,
                totals.carbs,
                totals.fat,
                Local::now().to_rfc3339(),
                plan_day_id
            ],
        )?;
        Ok(totals)
    }

    pub(super) fn plan_days_referencing(&self, meal_id: i64) -> Result<Vec<i64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT plan_day_id FROM plan_meals WHERE meal_id = ?1")?;
        let ids = stmt
            .query_map(params![meal_id], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    fn load_plan_day(&self, plan_day_id: i64) -> Result<PlanDay> {
        let (user_id, date, totals, updated_at) = self.conn.query_row(
            "SELECT user_id, date, total_calories, total_protein, total_carbs, total_fat, updated_at
             FROM plan_days WHERE id = ?1",
            params![plan_day_id],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    Nutrition {
                        calories: row.get(2)?,
                        protein: row.get(3)?,
                        carbs: row.get(4)?,
                        fat: row.get(5)?,
                    },
                    row.get::<_, String>(6)?,
                ))
            },
        )?;
        let slots = self.plan_slots(plan_day_id)?;
        let ids: Vec<i64> = slots.iter().map(|(_, id)| *id).collect();
        let meals = self.meals_by_ids(user_id, &ids)?;
        Ok(PlanDay {
            date,
            meals: planner::resolve(&slots, &meals),
            totals,
            updated_at: Some(updated_at),
        })
    }

    /// The plan for a date; an empty plan when nothing is planned.
    pub fn get_plan_day(&self, user_id: i64, date: NaiveDate) -> Result<PlanDay> {
        match self.plan_day_id(user_id, date)? {
            Some(id) => self.load_plan_day(id),
            None => Ok(PlanDay {
                date: format_date(date),
                meals: PlanSlots::default(),
                totals: Nutrition::default(),
                updated_at: None,
            }),
        }
    }

    /// Stored plan days with `start <= date <= end`, oldest first.
    pub fn list_plan_days(
        &self,
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PlanDay>> {
        if end < start {
            bail!("End date must not be before start date");
        }
        let mut stmt = self.conn.prepare(
            "SELECT id FROM plan_days WHERE user_id = ?1 AND date >= ?2 AND date <= ?3
             ORDER BY date",
        )?;
        let ids: Vec<i64> = stmt
            .query_map(
                params![user_id, format_date(start), format_date(end)],
                |row| row.get(0),
            )?
            .collect::<Result<Vec<_>, _>>()?;
        ids.into_iter().map(|id| self.load_plan_day(id)).collect()
    }

    /// Adds a meal to a slot. Adding a meal already in the slot changes nothing.
    pub fn add_meal_to_plan(
        &self,
        user_id: i64,
        date: NaiveDate,
        slot: MealCategory,
        meal_id: i64,
    ) -> Result<PlanDay> {
        if self.get_meal(user_id, meal_id)?.is_none() {
            bail!("Meal {meal_id} not found");
        }
        let tx = self.conn.unchecked_transaction()?;
        let plan_day_id = self.ensure_plan_day(user_id, date)?;
        let mut slots = self.plan_slots(plan_day_id)?;
        if planner::add_meal(&mut slots, slot, meal_id) {
            self.conn.execute(
                "INSERT INTO plan_meals (plan_day_id, slot, meal_id, position)
                 VALUES (?1, ?2, ?3,
                         (SELECT COALESCE(MAX(position), -1) + 1 FROM plan_meals
                          WHERE plan_day_id = ?1 AND slot = ?2))",
                params![plan_day_id, slot.as_str(), meal_id],
            )?;
        }
        self.recompute_plan_day(plan_day_id)?;
        tx.commit()?;
        self.load_plan_day(plan_day_id)
    }

    /// Removes a meal from a slot. Removing an absent meal changes nothing.
    pub fn remove_meal_from_plan(
        &self,
        user_id: i64,
        date: NaiveDate,
        slot: MealCategory,
        meal_id: i64,
    ) -> Result<PlanDay> {
        let Some(plan_day_id) = self.plan_day_id(user_id, date)? else {
            return self.get_plan_day(user_id, date);
        };
        let tx = self.conn.unchecked_transaction()?;
        let mut slots = self.plan_slots(plan_day_id)?;
        if planner::remove_meal(&mut slots, slot, meal_id) {
            self.conn.execute(
                "DELETE FROM plan_meals WHERE plan_day_id = ?1 AND slot = ?2 AND meal_id = ?3",
                params![plan_day_id, slot.as_str(), meal_id],
            )?;
        }
        self.recompute_plan_day(plan_day_id)?;
        tx.commit()?;
        self.load_plan_day(plan_day_id)
    }

    pub fn clear_plan_day(&self, user_id: i64, date: NaiveDate) -> Result<bool> {
        let rows = self.conn.execute(
            "DELETE FROM plan_days WHERE user_id = ?1 AND date = ?2",
            params![user_id, format_date(date)],
        )?;
        Ok(rows > 0)
    }

    /// Adds every meal planned on `from` to the same slot on `to`.
    pub fn copy_plan_day(&self, user_id: i64, from: NaiveDate, to: NaiveDate) -> Result<PlanDay> {
        if from == to {
            bail!("Source and target dates must differ");
        }
        let source = match self.plan_day_id(user_id, from)? {
            Some(id) => self.plan_slots(id)?,
            None => PlanSlots::default(),
        };
        if source.is_empty() {
            bail!("No meals planned for {}", format_date(from));
        }

        let tx = self.conn.unchecked_transaction()?;
        let plan_day_id = self.ensure_plan_day(user_id, to)?;
        let mut target = self.plan_slots(plan_day_id)?;
        for (slot, meal_id) in source.iter() {
            if planner::add_meal(&mut target, slot, *meal_id) {
                self.conn.execute(
                    "INSERT INTO plan_meals (plan_day_id, slot, meal_id, position)
                     VALUES (?1, ?2, ?3,
                             (SELECT COALESCE(MAX(position), -1) + 1 FROM plan_meals
                              WHERE plan_day_id = ?1 AND slot = ?2))",
                    params![plan_day_id, slot.as_str(), meal_id],
                )?;
            }
        }
        self.recompute_plan_day(plan_day_id)?;
        tx.commit()?;
        self.load_plan_day(plan_day_id)
    }

    /// One row per planned meal on or after `since`.
    pub fn planned_intake(&self, user_id: i64, since: NaiveDate) -> Result<Vec<MealIntake>> {
        let mut stmt = self.conn.prepare(
            "SELECT pd.date, pm.meal_id, pm.slot, m.calories
             FROM plan_meals pm
             JOIN plan_days pd ON pm.plan_day_id = pd.id
             JOIN meals m ON pm.meal_id = m.id
             WHERE pd.user_id = ?1 AND pd.date >= ?2
             ORDER BY pd.date, pm.position",
        )?;
        let intake = stmt
            .query_map(params![user_id, format_date(since)], |row| {
                Ok(MealIntake {
                    date: row.get(0)?,
                    meal_id: row.get(1)?,
                    slot: parse_column(row, 2)?,
                    calories: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(intake)
    }

    /// Distinct dates with at least one planned meal, newest first.
    pub fn planned_dates(&self, user_id: i64) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT pd.date FROM plan_days pd
             WHERE pd.user_id = ?1
               AND EXISTS (SELECT 1 FROM plan_meals pm WHERE pm.plan_day_id = pd.id)
             ORDER BY pd.date DESC",
        )?;
        let dates = stmt
            .query_map(params![user_id], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(dates)
    }
}
