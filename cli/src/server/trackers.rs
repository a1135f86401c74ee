use anyhow::Context;
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use mealwise_core::aggregate::{self, ExerciseTotals, Period, PeriodTotals};
use mealwise_core::models::{
    ExerciseEntry, ML_PER_GLASS, NewExerciseEntry, WaterEntry, WeightEntry, format_date,
    validate_exercise, validate_weight_kg,
};

use super::{ApiError, AppState, AuthUser, date_or_today, parse_date_param, today};

#[derive(Deserialize)]
pub(super) struct PeriodQuery {
    period: Option<String>,
}

impl PeriodQuery {
    fn period(&self) -> Result<Period, ApiError> {
        Period::parse_or_default(self.period.as_deref()).map_err(ApiError::bad_request)
    }
}

/// Period totals together with the entries they were computed from.
#[derive(Serialize)]
pub(super) struct TrackerResponse<E, T> {
    period: Period,
    start_date: String,
    #[serde(flatten)]
    totals: PeriodTotals<T>,
    entries: Vec<E>,
}

#[derive(Deserialize)]
pub(super) struct LogWaterRequest {
    date: Option<String>,
    amount_ml: Option<f64>,
    glasses: Option<f64>,
}

#[derive(Deserialize)]
pub(super) struct LogExerciseRequest {
    date: Option<String>,
    #[serde(alias = "type")]
    kind: String,
    duration_min: f64,
    calories_burned: Option<f64>,
    notes: Option<String>,
}

#[derive(Deserialize)]
pub(super) struct LogWeightRequest {
    date: Option<String>,
    weight_kg: f64,
    notes: Option<String>,
}

#[derive(Deserialize)]
pub(super) struct WeightHistoryQuery {
    start: Option<String>,
    end: Option<String>,
}

// --- Water ---

pub(super) async fn get_water(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<PeriodQuery>,
) -> Result<Json<TrackerResponse<WaterEntry, f64>>, ApiError> {
    let period = params.period()?;
    let today = today();
    let since = period.start_date(today);

    let entries = {
        let db = state.db();
        db.list_water(user.id, Some(since)).context("database error")?
    };
    Ok(Json(TrackerResponse {
        period,
        start_date: format_date(since),
        totals: aggregate::water_totals(&entries, period, today),
        entries,
    }))
}

/// Logs water by millilitres, or by glasses of 250 ml.
pub(super) async fn log_water(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<LogWaterRequest>,
) -> Result<(StatusCode, Json<WaterEntry>), ApiError> {
    let date = date_or_today(req.date.as_deref())?;
    let amount_ml = match (req.amount_ml, req.glasses) {
        (Some(ml), _) => ml,
        (None, Some(glasses)) => glasses * ML_PER_GLASS,
        (None, None) => {
            return Err(ApiError::BadRequest(
                "amount_ml or glasses is required".to_string(),
            ));
        }
    };
    if !amount_ml.is_finite() || amount_ml <= 0.0 {
        return Err(ApiError::BadRequest(
            "amount_ml must be greater than 0".to_string(),
        ));
    }

    let db = state.db();
    let entry = db
        .log_water(user.id, date, amount_ml)
        .context("failed to log water")?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub(super) async fn delete_water(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let db = state.db();
    if db.delete_water(user.id, id).context("database error")? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Water entry {id} not found")))
    }
}

// --- Exercise ---

pub(super) async fn get_exercise(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<PeriodQuery>,
) -> Result<Json<TrackerResponse<ExerciseEntry, ExerciseTotals>>, ApiError> {
    let period = params.period()?;
    let today = today();
    let since = period.start_date(today);

    let entries = {
        let db = state.db();
        db.list_exercise(user.id, Some(since))
            .context("database error")?
    };
    Ok(Json(TrackerResponse {
        period,
        start_date: format_date(since),
        totals: aggregate::exercise_totals(&entries, period, today),
        entries,
    }))
}

pub(super) async fn log_exercise(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<LogExerciseRequest>,
) -> Result<(StatusCode, Json<ExerciseEntry>), ApiError> {
    let entry = NewExerciseEntry {
        date: date_or_today(req.date.as_deref())?,
        kind: req.kind,
        duration_min: req.duration_min,
        calories_burned: req.calories_burned,
        notes: req.notes,
    };
    validate_exercise(&entry).map_err(ApiError::bad_request)?;

    let db = state.db();
    let created = db
        .log_exercise(user.id, &entry)
        .context("failed to log exercise")?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub(super) async fn delete_exercise(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let db = state.db();
    if db.delete_exercise(user.id, id).context("database error")? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Exercise entry {id} not found")))
    }
}

// --- Weight ---

pub(super) async fn get_weight_history(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<WeightHistoryQuery>,
) -> Result<Json<Vec<WeightEntry>>, ApiError> {
    let start = params.start.as_deref().map(parse_date_param).transpose()?;
    let end = params.end.as_deref().map(parse_date_param).transpose()?;

    let db = state.db();
    let entries = db
        .weight_history(user.id, start, end)
        .context("database error")?;
    Ok(Json(entries))
}

/// One entry per date; logging the same date again replaces it.
pub(super) async fn log_weight(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<LogWeightRequest>,
) -> Result<(StatusCode, Json<WeightEntry>), ApiError> {
    let date = date_or_today(req.date.as_deref())?;
    validate_weight_kg(req.weight_kg).map_err(ApiError::bad_request)?;

    let db = state.db();
    let entry = db
        .upsert_weight(user.id, date, req.weight_kg, req.notes.as_deref())
        .context("failed to upsert weight")?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub(super) async fn delete_weight(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let db = state.db();
    if db.delete_weight(user.id, id).context("database error")? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Weight entry {id} not found")))
    }
}
