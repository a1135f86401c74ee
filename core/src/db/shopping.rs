use std::collections::HashSet;

use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};
use rusqlite::params;
use serde::Serialize;

use super::Database;
use crate::models::{NewShoppingItem, ShoppingItem, validate_shopping_item};

const ITEM_COLUMNS: &str =
    "id, ingredient_name, amount, unit, checked, recipe_title, created_at, updated_at";

#[derive(Serialize)]
struct CsvRow<'a> {
    #[serde(rename = "Ingredient")]
    ingredient: &'a str,
    #[serde(rename = "Amount")]
    amount: &'a str,
    #[serde(rename = "Unit")]
    unit: &'a str,
    #[serde(rename = "Recipe")]
    recipe: &'a str,
    #[serde(rename = "Checked")]
    checked: &'a str,
}

impl Database {
    fn shopping_item_from_row(row: &rusqlite::Row) -> rusqlite::Result<ShoppingItem> {
        Ok(ShoppingItem {
            id: row.get(0)?,
            ingredient_name: row.get(1)?,
            amount: row.get(2)?,
            unit: row.get(3)?,
            checked: row.get(4)?,
            recipe_title: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }

    fn get_shopping_item(&self, user_id: i64, id: i64) -> Result<Option<ShoppingItem>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ITEM_COLUMNS} FROM shopping_items WHERE id = ?1 AND user_id = ?2"
        ))?;
        let mut rows = stmt.query(params![id, user_id])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::shopping_item_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    /// Unchecked items first, each group in insertion order.
    pub fn list_shopping_items(&self, user_id: i64) -> Result<Vec<ShoppingItem>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ITEM_COLUMNS} FROM shopping_items WHERE user_id = ?1 ORDER BY checked, id"
        ))?;
        let items = stmt
            .query_map(params![user_id], Self::shopping_item_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    pub fn add_shopping_item(&self, user_id: i64, item: &NewShoppingItem) -> Result<ShoppingItem> {
        validate_shopping_item(item)?;
        let now = Local::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO shopping_items (user_id, ingredient_name, amount, unit, checked, recipe_title, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                user_id,
                item.ingredient_name.trim(),
                item.amount.trim(),
                item.unit.trim(),
                item.checked,
                item.recipe_title.trim(),
                now,
                now
            ],
        )?;
        self.get_shopping_item(user_id, self.conn.last_insert_rowid())?
            .context("Shopping item not found after insert")
    }

    /// Sets the checked flag, or flips it when `checked` is `None`.
    pub fn set_shopping_item_checked(
        &self,
        user_id: i64,
        id: i64,
        checked: Option<bool>,
    ) -> Result<Option<ShoppingItem>> {
        let Some(item) = self.get_shopping_item(user_id, id)? else {
            return Ok(None);
        };
        let checked = checked.unwrap_or(!item.checked);
        self.conn.execute(
            "UPDATE shopping_items SET checked = ?1, updated_at = ?2 WHERE id = ?3 AND user_id = ?4",
            params![checked, Local::now().to_rfc3339(), id, user_id],
        )?;
        self.get_shopping_item(user_id, id)
    }

    pub fn delete_shopping_item(&self, user_id: i64, id: i64) -> Result<bool> {
        let rows = self.conn.execute(
            "DELETE FROM shopping_items WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        Ok(rows > 0)
    }

    pub fn clear_checked_items(&self, user_id: i64) -> Result<usize> {
        let rows = self.conn.execute(
            "DELETE FROM shopping_items WHERE user_id = ?1 AND checked = 1",
            params![user_id],
        )?;
        Ok(rows)
    }

    /// Adds one item per distinct ingredient of the meals planned in the
    /// range. Ingredients already on the list and unchecked are skipped.
    pub fn add_items_from_plan(
        &self,
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ShoppingItem>> {
        let plans = self.list_plan_days(user_id, start, end)?;

        let mut seen: HashSet<String> = self
            .list_shopping_items(user_id)?
            .into_iter()
            .filter(|i| !i.checked)
            .map(|i| i.ingredient_name.to_lowercase())
            .collect();

        let tx = self.conn.unchecked_transaction()?;
        let mut added = Vec::new();
        for plan in &plans {
            for (_, meal) in plan.meals.iter() {
                for ingredient in &meal.ingredients {
                    let name = ingredient.trim();
                    if name.is_empty() || !seen.insert(name.to_lowercase()) {
                        continue;
                    }
                    added.push(self.add_shopping_item(
                        user_id,
                        &NewShoppingItem {
                            ingredient_name: name.to_string(),
                            amount: String::new(),
                            unit: String::new(),
                            checked: false,
                            recipe_title: meal.name.clone(),
                        },
                    )?);
                }
            }
        }
        tx.commit()?;
        tracing::debug!(user_id, added = added.len(), "shopping list generated from plan");
        Ok(added)
    }

    pub fn export_shopping_csv(&self, user_id: i64) -> Result<String> {
        let items = self.list_shopping_items(user_id)?;
        let mut wtr = csv::Writer::from_writer(Vec::new());
        for item in &items {
            wtr.serialize(CsvRow {
                ingredient: &item.ingredient_name,
                amount: &item.amount,
                unit: &item.unit,
                recipe: &item.recipe_title,
                checked: if item.checked { "yes" } else { "no" },
            })?;
        }
        if items.is_empty() {
            wtr.write_record(["Ingredient", "Amount", "Unit", "Recipe", "Checked"])?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| anyhow::anyhow!("failed to write CSV: {}", e.error()))?;
        match String::from_utf8(bytes) {
            Ok(s) => Ok(s),
            Err(_) => bail!("CSV output is not valid UTF-8"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{new_meal, user};
    use crate::models::MealCategory;

    fn item(name: &str) -> NewShoppingItem {
        NewShoppingItem {
            ingredient_name: name.to_string(),
            amount: "2".to_string(),
            unit: "cups".to_string(),
            checked: false,
            recipe_title: String::new(),
        }
    }

    #[test]
    fn test_add_and_list_items() {
        let db = Database::open_in_memory().unwrap();
        let uid = user(&db, "a@example.com");
        db.add_shopping_item(uid, &item("Milk")).unwrap();
        let eggs = db.add_shopping_item(uid, &item("Eggs")).unwrap();
        db.set_shopping_item_checked(uid, eggs.id, Some(true)).unwrap();
        db.add_shopping_item(uid, &item("Bread")).unwrap();

        let names: Vec<String> = db
            .list_shopping_items(uid)
            .unwrap()
            .into_iter()
            .map(|i| i.ingredient_name)
            .collect();
        assert_eq!(names, vec!["Milk", "Bread", "Eggs"]);
    }

    #[test]
    fn test_add_item_rejects_blank_name() {
        let db = Database::open_in_memory().unwrap();
        let uid = user(&db, "a@example.com");
        assert!(db.add_shopping_item(uid, &item("  ")).is_err());
    }

    #[test]
    fn test_toggle_item() {
        let db = Database::open_in_memory().unwrap();
        let uid = user(&db, "a@example.com");
        let milk = db.add_shopping_item(uid, &item("Milk")).unwrap();
        let toggled = db.set_shopping_item_checked(uid, milk.id, None).unwrap().unwrap();
        assert!(toggled.checked);
        let toggled = db.set_shopping_item_checked(uid, milk.id, None).unwrap().unwrap();
        assert!(!toggled.checked);
        assert!(db.set_shopping_item_checked(uid, 999, None).unwrap().is_none());
    }

    #[test]
    fn test_clear_checked_items() {
        let db = Database::open_in_memory().unwrap();
        let uid = user(&db, "a@example.com");
        let milk = db.add_shopping_item(uid, &item("Milk")).unwrap();
        db.add_shopping_item(uid, &item("Eggs")).unwrap();
        db.set_shopping_item_checked(uid, milk.id, Some(true)).unwrap();
        assert_eq!(db.clear_checked_items(uid).unwrap(), 1);
        assert_eq!(db.list_shopping_items(uid).unwrap().len(), 1);
        assert!(!db.delete_shopping_item(uid, milk.id).unwrap());
    }

    #[test]
    fn test_items_from_plan_dedup() {
        let db = Database::open_in_memory().unwrap();
        let uid = user(&db, "a@example.com");
        let mut bowl = new_meal("Bowl", MealCategory::Lunch, 400.0);
        bowl.ingredients = vec!["Rice".to_string(), "Beans".to_string(), "Salsa".to_string()];
        let bowl = db.create_meal(uid, &bowl).unwrap();
        let mut soup = new_meal("Soup", MealCategory::Dinner, 300.0);
        soup.ingredients = vec!["beans".to_string(), "Onion".to_string()];
        let soup = db.create_meal(uid, &soup).unwrap();

        let day = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        db.add_meal_to_plan(uid, day, MealCategory::Lunch, bowl.id).unwrap();
        db.add_meal_to_plan(uid, day, MealCategory::Dinner, soup.id).unwrap();
        db.add_shopping_item(uid, &item("salsa")).unwrap();

        let added = db.add_items_from_plan(uid, day, day).unwrap();
        let names: Vec<&str> = added.iter().map(|i| i.ingredient_name.as_str()).collect();
        assert_eq!(names, vec!["Rice", "Beans", "Onion"]);
        assert_eq!(added[0].recipe_title, "Bowl");
        assert_eq!(added[2].recipe_title, "Soup");

        // Running again adds nothing new
        assert!(db.add_items_from_plan(uid, day, day).unwrap().is_empty());
    }

    #[test]
    fn test_export_csv() {
        let db = Database::open_in_memory().unwrap();
        let uid = user(&db, "a@example.com");
        let milk = db.add_shopping_item(uid, &item("Milk, whole")).unwrap();
        db.set_shopping_item_checked(uid, milk.id, Some(true)).unwrap();

        let csv = db.export_shopping_csv(uid).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("Ingredient,Amount,Unit,Recipe,Checked"));
        assert_eq!(lines.next(), Some("\"Milk, whole\",2,cups,,yes"));
    }

    #[test]
    fn test_export_csv_empty_has_header() {
        let db = Database::open_in_memory().unwrap();
        let uid = user(&db, "a@example.com");
        let csv = db.export_shopping_csv(uid).unwrap();
        assert_eq!(csv.trim_end(), "Ingredient,Amount,Unit,Recipe,Checked");
    }
}
