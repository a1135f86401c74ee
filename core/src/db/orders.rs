use anyhow::{Context, Result, bail};
use chrono::Local;
use rusqlite::params;
use uuid::Uuid;

use super::{Database, json_list_column, parse_column, to_json_list};
use crate::models::{Order, OrderMeal, OrderStatus, PRICE_PER_MEAL, PaymentMethod};

impl Database {
    fn order_meals(&self, order_id: i64) -> Result<Vec<OrderMeal>> {
        let mut stmt = self.conn.prepare(
            "SELECT meal_id, name, category, calories, protein, carbs, fat, ingredients
             FROM order_meals WHERE order_id = ?1 ORDER BY position",
        )?;
        let meals = stmt
            .query_map(params![order_id], |row| {
                Ok(OrderMeal {
                    meal_id: row.get(0)?,
                    name: row.get(1)?,
                    category: parse_column(row, 2)?,
                    calories: row.get(3)?,
                    protein: row.get(4)?,
                    carbs: row.get(5)?,
                    fat: row.get(6)?,
                    ingredients: json_list_column(row, 7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(meals)
    }

    pub fn get_order(&self, user_id: i64, id: i64) -> Result<Option<Order>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, uuid, status, payment_method, total_calories, total_price, created_at, updated_at
             FROM orders WHERE id = ?1 AND user_id = ?2",
        )?;
        let mut rows = stmt.query(params![id, user_id])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        let mut order = Order {
            id: row.get(0)?,
            uuid: row.get(1)?,
            status: parse_column(row, 2)?,
            payment_method: parse_column(row, 3)?,
            total_calories: row.get(4)?,
            total_price: row.get(5)?,
            meals: Vec::new(),
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        };
        order.meals = self.order_meals(order.id)?;
        Ok(Some(order))
    }

    /// Places an order for the given meals, snapshotting each one.
    pub fn place_order(
        &self,
        user_id: i64,
        meal_ids: &[i64],
        payment_method: PaymentMethod,
    ) -> Result<Order> {
        if meal_ids.is_empty() {
            bail!("Order must contain at least one meal");
        }
        let mut meals = Vec::with_capacity(meal_ids.len());
        for &id in meal_ids {
            let meal = self
                .get_meal(user_id, id)?
                .with_context(|| format!("Meal {id} not found"))?;
            meals.push(meal);
        }

        let total_calories: f64 = meals.iter().map(|m| m.calories).sum();
        #[allow(clippy::cast_precision_loss)]
        let total_price = PRICE_PER_MEAL * meals.len() as f64;
        let now = Local::now().to_rfc3339();

        let tx = self.conn.unchecked_transaction()?;
        self.conn.execute(
            "INSERT INTO orders (uuid, user_id, status, payment_method, total_calories, total_price, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                Uuid::new_v4().to_string(),
                user_id,
                OrderStatus::Pending.as_str(),
                payment_method.as_str(),
                total_calories,
                total_price,
                now,
                now
            ],
        )?;
        let order_id = self.conn.last_insert_rowid();
        for (position, meal) in meals.iter().enumerate() {
            self.conn.execute(
                "INSERT INTO order_meals (order_id, meal_id, name, category, calories, protein, carbs, fat, ingredients, position)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    order_id,
                    meal.id,
                    meal.name,
                    meal.category.as_str(),
                    meal.calories,
                    meal.protein,
                    meal.carbs,
                    meal.fat,
                    to_json_list(&meal.ingredients)?,
                    position as i64
                ],
            )?;
        }
        tx.commit()?;
        tracing::info!(user_id, order_id, meals = meals.len(), "order placed");

        self.get_order(user_id, order_id)?
            .context("Order not found after insert")
    }

    /// Orders newest first.
    pub fn list_orders(&self, user_id: i64) -> Result<Vec<Order>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM orders WHERE user_id = ?1 ORDER BY created_at DESC, id DESC")?;
        let ids: Vec<i64> = stmt
            .query_map(params![user_id], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        let mut orders = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(order) = self.get_order(user_id, id)? {
                orders.push(order);
            }
        }
        Ok(orders)
    }

    fn set_order_status(&self, user_id: i64, id: i64, status: OrderStatus) -> Result<Option<Order>> {
        let Some(order) = self.get_order(user_id, id)? else {
            return Ok(None);
        };
        if order.status != OrderStatus::Pending {
            bail!("Order is already {}", order.status);
        }
        self.conn.execute(
            "UPDATE orders SET status = ?1, updated_at = ?2 WHERE id = ?3 AND user_id = ?4",
            params![status.as_str(), Local::now().to_rfc3339(), id, user_id],
        )?;
        self.get_order(user_id, id)
    }

    /// Only pending orders can be cancelled.
    pub fn cancel_order(&self, user_id: i64, id: i64) -> Result<Option<Order>> {
        self.set_order_status(user_id, id, OrderStatus::Cancelled)
    }

    pub fn complete_order(&self, user_id: i64, id: i64) -> Result<Option<Order>> {
        self.set_order_status(user_id, id, OrderStatus::Completed)
    }
}
