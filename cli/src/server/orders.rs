use anyhow::Context;
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;

use mealwise_core::db::Database;
use mealwise_core::models::{Order, OrderStatus, PaymentMethod};

use super::{ApiError, AppState, AuthUser};

#[derive(Deserialize)]
pub(super) struct PlaceOrderRequest {
    meal_ids: Vec<i64>,
    payment_method: PaymentMethod,
}

pub(super) async fn list_orders(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Order>>, ApiError> {
    let db = state.db();
    Ok(Json(db.list_orders(user.id).context("database error")?))
}

pub(super) async fn get_order(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<Order>, ApiError> {
    let db = state.db();
    let order = db
        .get_order(user.id, id)
        .context("database error")?
        .ok_or_else(|| ApiError::NotFound(format!("Order {id} not found")))?;
    Ok(Json(order))
}

pub(super) async fn place_order(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    if req.meal_ids.is_empty() {
        return Err(ApiError::BadRequest(
            "Order must contain at least one meal".to_string(),
        ));
    }

    let db = state.db();
    for &meal_id in &req.meal_ids {
        if db.get_meal(user.id, meal_id).context("database error")?.is_none() {
            return Err(ApiError::BadRequest(format!("Meal {meal_id} not found")));
        }
    }
    let order = db
        .place_order(user.id, &req.meal_ids, req.payment_method)
        .context("failed to place order")?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// Only pending orders can change status.
fn require_pending(db: &Database, user_id: i64, id: i64) -> Result<(), ApiError> {
    let order = db
        .get_order(user_id, id)
        .context("database error")?
        .ok_or_else(|| ApiError::NotFound(format!("Order {id} not found")))?;
    if order.status != OrderStatus::Pending {
        return Err(ApiError::BadRequest(format!(
            "Order is already {}",
            order.status
        )));
    }
    Ok(())
}

pub(super) async fn cancel_order(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<Order>, ApiError> {
    let db = state.db();
    require_pending(&db, user.id, id)?;
    let order = db
        .cancel_order(user.id, id)
        .context("failed to cancel order")?
        .ok_or_else(|| ApiError::NotFound(format!("Order {id} not found")))?;
    tracing::info!(user_id = user.id, order_id = id, "order cancelled");
    Ok(Json(order))
}

pub(super) async fn complete_order(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<Order>, ApiError> {
    let db = state.db();
    require_pending(&db, user.id, id)?;
    let order = db
        .complete_order(user.id, id)
        .context("failed to complete order")?
        .ok_or_else(|| ApiError::NotFound(format!("Order {id} not found")))?;
    Ok(Json(order))
}
