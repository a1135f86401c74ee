use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use rusqlite::Connection;
use rusqlite::types::Type;

mod dashboard;
mod meals;
mod orders;
mod plans;
mod profile;
mod shopping;
mod support;
mod trackers;
mod users;

pub use dashboard::Dashboard;

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    #[allow(clippy::too_many_lines)]
    fn migrate(&self) -> Result<()> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS users (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT NOT NULL UNIQUE,
                    email TEXT NOT NULL UNIQUE,
                    full_name TEXT NOT NULL,
                    token_hash TEXT NOT NULL UNIQUE,
                    meals_seeded INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS meals (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT NOT NULL UNIQUE,
                    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    name TEXT NOT NULL,
                    description TEXT,
                    category TEXT NOT NULL,
                    calories REAL NOT NULL,
                    protein REAL NOT NULL,
                    carbs REAL NOT NULL,
                    fat REAL NOT NULL,
                    ingredients TEXT NOT NULL,
                    instructions TEXT NOT NULL,
                    prep_time_min INTEGER,
                    cook_time_min INTEGER,
                    servings INTEGER,
                    is_healthy INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS plan_days (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    date TEXT NOT NULL,
                    total_calories REAL NOT NULL DEFAULT 0,
                    total_protein REAL NOT NULL DEFAULT 0,
                    total_carbs REAL NOT NULL DEFAULT 0,
                    total_fat REAL NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL,
                    UNIQUE(user_id, date)
                );

                CREATE TABLE IF NOT EXISTS plan_meals (
                    plan_day_id INTEGER NOT NULL REFERENCES plan_days(id) ON DELETE CASCADE,
                    slot TEXT NOT NULL,
                    meal_id INTEGER NOT NULL REFERENCES meals(id) ON DELETE CASCADE,
                    position INTEGER NOT NULL,
                    PRIMARY KEY (plan_day_id, slot, meal_id)
                );

                CREATE INDEX IF NOT EXISTS idx_meals_user ON meals(user_id);
                CREATE INDEX IF NOT EXISTS idx_plan_days_user_date ON plan_days(user_id, date);
                CREATE INDEX IF NOT EXISTS idx_plan_meals_meal ON plan_meals(meal_id);

                PRAGMA user_version = 1;",
            )?;
        }

        if version < 2 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS water_entries (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    date TEXT NOT NULL,
                    amount_ml REAL,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS exercise_entries (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    date TEXT NOT NULL,
                    kind TEXT NOT NULL,
                    duration_min REAL,
                    calories_burned REAL,
                    notes TEXT,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS weight_entries (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    date TEXT NOT NULL,
                    weight_kg REAL NOT NULL,
                    notes TEXT,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL,
                    UNIQUE(user_id, date)
                );

                CREATE TABLE IF NOT EXISTS user_goals (
                    user_id INTEGER PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
                    calorie_goal INTEGER NOT NULL,
                    water_goal_ml INTEGER NOT NULL,
                    exercise_goal_min INTEGER NOT NULL,
                    customized INTEGER NOT NULL DEFAULT 0,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS health_profiles (
                    user_id INTEGER PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
                    age INTEGER,
                    weight_kg REAL,
                    height_cm REAL,
                    gender TEXT,
                    last_bmi REAL,
                    last_calculated TEXT,
                    updated_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_water_user_date ON water_entries(user_id, date);
                CREATE INDEX IF NOT EXISTS idx_exercise_user_date ON exercise_entries(user_id, date);

                PRAGMA user_version = 2;",
            )?;
        }

        if version < 3 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS shopping_items (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    ingredient_name TEXT NOT NULL,
                    amount TEXT NOT NULL DEFAULT '',
                    unit TEXT NOT NULL DEFAULT '',
                    checked INTEGER NOT NULL DEFAULT 0,
                    recipe_title TEXT NOT NULL DEFAULT '',
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS orders (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT NOT NULL UNIQUE,
                    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    status TEXT NOT NULL,
                    payment_method TEXT NOT NULL,
                    total_calories REAL NOT NULL,
                    total_price REAL NOT NULL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS order_meals (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    order_id INTEGER NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
                    meal_id INTEGER NOT NULL,
                    name TEXT NOT NULL,
                    category TEXT NOT NULL,
                    calories REAL NOT NULL,
                    protein REAL NOT NULL,
                    carbs REAL NOT NULL,
                    fat REAL NOT NULL,
                    ingredients TEXT NOT NULL,
                    position INTEGER NOT NULL
                );

                CREATE TABLE IF NOT EXISTS support_tickets (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT NOT NULL UNIQUE,
                    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    subject TEXT NOT NULL,
                    message TEXT NOT NULL,
                    priority TEXT NOT NULL,
                    category TEXT NOT NULL,
                    status TEXT NOT NULL,
                    user_email TEXT NOT NULL,
                    contact_number TEXT,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS ticket_responses (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    ticket_id INTEGER NOT NULL REFERENCES support_tickets(id) ON DELETE CASCADE,
                    message TEXT NOT NULL,
                    is_admin INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_shopping_user ON shopping_items(user_id);
                CREATE INDEX IF NOT EXISTS idx_orders_user ON orders(user_id);
                CREATE INDEX IF NOT EXISTS idx_order_meals_order ON order_meals(order_id);
                CREATE INDEX IF NOT EXISTS idx_tickets_user ON support_tickets(user_id);
                CREATE INDEX IF NOT EXISTS idx_responses_ticket ON ticket_responses(ticket_id);

                PRAGMA user_version = 3;",
            )?;
        }

        if version < 4 {
            self.conn.execute_batch(
                "ALTER TABLE health_profiles ADD COLUMN last_bmi_weight_kg REAL;
                ALTER TABLE health_profiles ADD COLUMN last_bmi_height_cm REAL;
                ALTER TABLE health_profiles ADD COLUMN last_bmi_gender TEXT;
                ALTER TABLE health_profiles ADD COLUMN last_protein_weight_kg REAL;
                ALTER TABLE health_profiles ADD COLUMN last_goal_factor REAL;
                ALTER TABLE health_profiles ADD COLUMN last_protein_g INTEGER;
                ALTER TABLE health_profiles ADD COLUMN last_protein_calculated TEXT;

                PRAGMA user_version = 4;",
            )?;
        }

        Ok(())
    }
}

// --- Row mapping helpers ---

/// Reads a TEXT column into one of the closed text enums.
fn parse_column<T>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = anyhow::Error>,
{
    let text: String = row.get(idx)?;
    text.parse()
        .map_err(|e: anyhow::Error| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
}

fn parse_optional_column<T>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Option<T>>
where
    T: FromStr<Err = anyhow::Error>,
{
    let text: Option<String> = row.get(idx)?;
    text.map(|t| {
        t.parse().map_err(|e: anyhow::Error| {
            rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into())
        })
    })
    .transpose()
}

/// String lists are stored as JSON arrays.
fn json_list_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Vec<String>> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn to_json_list(items: &[String]) -> Result<String> {
    serde_json::to_string(items).context("failed to encode list")
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Database;
    use crate::models::{MealCategory, NewMeal};

    pub fn user(db: &Database, email: &str) -> i64 {
        db.create_user(email, "Test User").unwrap().user.id
    }

    pub fn new_meal(name: &str, category: MealCategory, calories: f64) -> NewMeal {
        NewMeal {
            name: name.to_string(),
            description: None,
            category,
            calories,
            protein: 10.0,
            carbs: 20.0,
            fat: 5.0,
            ingredients: vec!["Rice".to_string(), "Beans".to_string()],
            instructions: vec![],
            prep_time_min: None,
            cook_time_min: None,
            servings: Some(1),
            is_healthy: false,
        }
    }
}
