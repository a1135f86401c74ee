use anyhow::{Result, bail};
use chrono::{Local, NaiveDate};
use rusqlite::params;

use super::Database;
use crate::models::{
    ExerciseEntry, NewExerciseEntry, WaterEntry, WeightEntry, format_date, validate_exercise,
    validate_weight_kg,
};

impl Database {
    // --- Water ---

    fn water_entry_from_row(row: &rusqlite::Row) -> rusqlite::Result<WaterEntry> {
        Ok(WaterEntry {
            id: row.get(0)?,
            date: row.get(1)?,
            amount_ml: row.get(2)?,
            created_at: row.get(3)?,
        })
    }

    pub fn log_water(&self, user_id: i64, date: NaiveDate, amount_ml: f64) -> Result<WaterEntry> {
        if !amount_ml.is_finite() || amount_ml <= 0.0 {
            bail!("amount_ml must be greater than 0");
        }
        self.conn.execute(
            "INSERT INTO water_entries (user_id, date, amount_ml, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![user_id, format_date(date), amount_ml, Local::now().to_rfc3339()],
        )?;
        let id = self.conn.last_insert_rowid();
        let entry = self.conn.query_row(
            "SELECT id, date, amount_ml, created_at FROM water_entries WHERE id = ?1",
            params![id],
            Self::water_entry_from_row,
        )?;
        Ok(entry)
    }

    /// Entries on or after `since` (all entries when `None`), newest first.
    pub fn list_water(&self, user_id: i64, since: Option<NaiveDate>) -> Result<Vec<WaterEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, amount_ml, created_at FROM water_entries
             WHERE user_id = ?1 AND (?2 IS NULL OR date >= ?2)
             ORDER BY date DESC, id DESC",
        )?;
        let entries = stmt
            .query_map(
                params![user_id, since.map(format_date)],
                Self::water_entry_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn delete_water(&self, user_id: i64, id: i64) -> Result<bool> {
        let rows = self.conn.execute(
            "DELETE FROM water_entries WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        Ok(rows > 0)
    }

    // --- Exercise ---

    fn exercise_entry_from_row(row: &rusqlite::Row) -> rusqlite::Result<ExerciseEntry> {
        Ok(ExerciseEntry {
            id: row.get(0)?,
            date: row.get(1)?,
            kind: row.get(2)?,
            duration_min: row.get(3)?,
            calories_burned: row.get(4)?,
            notes: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    pub fn log_exercise(&self, user_id: i64, entry: &NewExerciseEntry) -> Result<ExerciseEntry> {
        validate_exercise(entry)?;
        self.conn.execute(
            "INSERT INTO exercise_entries (user_id, date, kind, duration_min, calories_burned, notes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                user_id,
                format_date(entry.date),
                entry.kind.trim(),
                entry.duration_min,
                entry.calories_burned,
                entry.notes,
                Local::now().to_rfc3339(),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        let entry = self.conn.query_row(
            "SELECT id, date, kind, duration_min, calories_burned, notes, created_at
             FROM exercise_entries WHERE id = ?1",
            params![id],
            Self::exercise_entry_from_row,
        )?;
        Ok(entry)
    }

    pub fn list_exercise(
        &self,
        user_id: i64,
        since: Option<NaiveDate>,
    ) -> Result<Vec<ExerciseEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, kind, duration_min, calories_burned, notes, created_at
             FROM exercise_entries
             WHERE user_id = ?1 AND (?2 IS NULL OR date >= ?2)
             ORDER BY date DESC, id DESC",
        )?;
        let entries = stmt
            .query_map(
                params![user_id, since.map(format_date)],
                Self::exercise_entry_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn delete_exercise(&self, user_id: i64, id: i64) -> Result<bool> {
        let rows = self.conn.execute(
            "DELETE FROM exercise_entries WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        Ok(rows > 0)
    }

    // --- Weight ---

    fn weight_entry_from_row(row: &rusqlite::Row) -> rusqlite::Result<WeightEntry> {
        Ok(WeightEntry {
            id: row.get(0)?,
            date: row.get(1)?,
            weight_kg: row.get(2)?,
            notes: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }

    /// One entry per date: logging the same date again replaces the weight.
    /// The profile weight follows the most recent entry.
    pub fn upsert_weight(
        &self,
        user_id: i64,
        date: NaiveDate,
        weight_kg: f64,
        notes: Option<&str>,
    ) -> Result<WeightEntry> {
        validate_weight_kg(weight_kg)?;
        let now = Local::now().to_rfc3339();
        let date_str = format_date(date);
        let tx = self.conn.unchecked_transaction()?;
        self.conn.execute(
            "INSERT INTO weight_entries (user_id, date, weight_kg, notes, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(user_id, date) DO UPDATE SET
                weight_kg = excluded.weight_kg,
                notes = excluded.notes,
                updated_at = excluded.updated_at",
            params![user_id, date_str, weight_kg, notes, now, now],
        )?;

        let entry = self.conn.query_row(
            "SELECT id, date, weight_kg, notes, created_at, updated_at
             FROM weight_entries WHERE user_id = ?1 AND date = ?2",
            params![user_id, date_str],
            Self::weight_entry_from_row,
        )?;

        self.sync_profile_weight(user_id)?;
        tx.commit()?;
        Ok(entry)
    }

    /// Copies the most recent entry's weight onto the profile. With no
    /// entries left the profile keeps its current weight.
    fn sync_profile_weight(&self, user_id: i64) -> Result<()> {
        if let Some(latest) = self.weight_history(user_id, None, None)?.first() {
            self.set_profile_weight(user_id, latest.weight_kg)?;
        }
        Ok(())
    }

    /// Weight entries within the optional bounds, newest first.
    pub fn weight_history(
        &self,
        user_id: i64,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<WeightEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, weight_kg, notes, created_at, updated_at
             FROM weight_entries
             WHERE user_id = ?1
               AND (?2 IS NULL OR date >= ?2)
               AND (?3 IS NULL OR date <= ?3)
             ORDER BY date DESC",
        )?;
        let entries = stmt
            .query_map(
                params![user_id, start.map(format_date), end.map(format_date)],
                Self::weight_entry_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn delete_weight(&self, user_id: i64, id: i64) -> Result<bool> {
        let tx = self.conn.unchecked_transaction()?;
        let rows = self.conn.execute(
            "DELETE FROM weight_entries WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        if rows > 0 {
            self.sync_profile_weight(user_id)?;
        }
        tx.commit()?;
        Ok(rows > 0)
    }
}
