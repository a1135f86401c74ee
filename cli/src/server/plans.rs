use anyhow::Context;
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use mealwise_core::models::{MealCategory, PlanDay, format_date};

use super::{ApiError, AppState, AuthUser, parse_date_param, today};

const DEFAULT_RANGE_DAYS: i64 = 6;

#[derive(Deserialize)]
pub(super) struct PlanRangeQuery {
    start: Option<String>,
    end: Option<String>,
}

#[derive(Deserialize)]
pub(super) struct AddPlanMealRequest {
    slot: MealCategory,
    meal_id: i64,
}

#[derive(Deserialize)]
pub(super) struct CopyPlanRequest {
    to: String,
}

/// Plan days between `start` and `end` inclusive. Defaults to the week
/// starting today.
pub(super) async fn list_plans(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<PlanRangeQuery>,
) -> Result<Json<Vec<PlanDay>>, ApiError> {
    let start = match params.start.as_deref() {
        Some(s) => parse_date_param(s)?,
        None => today(),
    };
    let end = match params.end.as_deref() {
        Some(s) => parse_date_param(s)?,
        None => start + chrono::Duration::days(DEFAULT_RANGE_DAYS),
    };
    if end < start {
        return Err(ApiError::BadRequest(
            "End date must not be before start date".to_string(),
        ));
    }

    let db = state.db();
    let plans = db
        .list_plan_days(user.id, start, end)
        .context("database error")?;
    Ok(Json(plans))
}

pub(super) async fn get_plan(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(date_str): Path<String>,
) -> Result<Json<PlanDay>, ApiError> {
    let date = parse_date_param(&date_str)?;
    let db = state.db();
    let plan = db.get_plan_day(user.id, date).context("database error")?;
    Ok(Json(plan))
}

pub(super) async fn clear_plan(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(date_str): Path<String>,
) -> Result<StatusCode, ApiError> {
    let date = parse_date_param(&date_str)?;
    let db = state.db();
    if db.clear_plan_day(user.id, date).context("database error")? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("No plan for {date_str}")))
    }
}

pub(super) async fn add_plan_meal(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(date_str): Path<String>,
    Json(req): Json<AddPlanMealRequest>,
) -> Result<Json<PlanDay>, ApiError> {
    let date = parse_date_param(&date_str)?;

    let db = state.db();
    if db.get_meal(user.id, req.meal_id).context("database error")?.is_none() {
        return Err(ApiError::NotFound(format!("Meal {} not found", req.meal_id)));
    }
    let plan = db
        .add_meal_to_plan(user.id, date, req.slot, req.meal_id)
        .context("failed to update plan")?;
    Ok(Json(plan))
}

pub(super) async fn remove_plan_meal(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((date_str, slot, meal_id)): Path<(String, String, i64)>,
) -> Result<Json<PlanDay>, ApiError> {
    let date = parse_date_param(&date_str)?;
    let slot: MealCategory = slot.parse().map_err(ApiError::bad_request)?;

    let db = state.db();
    let plan = db
        .remove_meal_from_plan(user.id, date, slot, meal_id)
        .context("failed to update plan")?;
    Ok(Json(plan))
}

/// Copies every meal planned on the path date onto `to`, keeping slots.
pub(super) async fn copy_plan(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(date_str): Path<String>,
    Json(req): Json<CopyPlanRequest>,
) -> Result<Json<PlanDay>, ApiError> {
    let from = parse_date_param(&date_str)?;
    let to = parse_date_param(&req.to)?;
    if from == to {
        return Err(ApiError::BadRequest(
            "Source and target dates must differ".to_string(),
        ));
    }

    let db = state.db();
    let source = db.get_plan_day(user.id, from).context("database error")?;
    if source.meals.is_empty() {
        return Err(ApiError::NotFound(format!(
            "No meals planned for {}",
            format_date(from)
        )));
    }
    let plan = db
        .copy_plan_day(user.id, from, to)
        .context("failed to copy plan")?;
    Ok(Json(plan))
}
