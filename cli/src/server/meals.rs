use anyhow::Context;
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use mealwise_core::models::{
    Meal, MealFilter, NewMeal, UpdateMeal, validate_new_meal, validate_update_meal,
};

use super::{ApiError, AppState, AuthUser};

/// Lists the caller's meals. An empty catalogue is seeded with the built-in
/// recipes on first use.
pub(super) async fn list_meals(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(filter): Query<MealFilter>,
) -> Result<Json<Vec<Meal>>, ApiError> {
    let db = state.db();
    db.seed_meals_if_empty(user.id)
        .context("failed to seed meals")?;
    let meals = db
        .list_meals(user.id, &filter)
        .context("database error")?;
    Ok(Json(meals))
}

pub(super) async fn create_meal(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<NewMeal>,
) -> Result<(StatusCode, Json<Meal>), ApiError> {
    validate_new_meal(&req).map_err(ApiError::bad_request)?;

    let db = state.db();
    let meal = db
        .create_meal(user.id, &req)
        .context("failed to insert meal")?;
    Ok((StatusCode::CREATED, Json(meal)))
}

pub(super) async fn get_meal(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<Meal>, ApiError> {
    let db = state.db();
    let meal = db
        .get_meal(user.id, id)
        .context("database error")?
        .ok_or_else(|| ApiError::NotFound(format!("Meal {id} not found")))?;
    Ok(Json(meal))
}

pub(super) async fn update_meal(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateMeal>,
) -> Result<Json<Meal>, ApiError> {
    validate_update_meal(&req).map_err(ApiError::bad_request)?;

    let db = state.db();
    let meal = db
        .update_meal(user.id, id, &req)
        .context("failed to update meal")?
        .ok_or_else(|| ApiError::NotFound(format!("Meal {id} not found")))?;
    Ok(Json(meal))
}

pub(super) async fn delete_meal(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let db = state.db();
    if db.delete_meal(user.id, id).context("database error")? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Meal {id} not found")))
    }
}
