use anyhow::Context;
use axum::{Extension, Json, extract::State};
use serde::{Deserialize, Serialize};

use mealwise_core::health::{self, BmiCategory, BmiReport};
use mealwise_core::models::{Gender, ProteinRecord};

use super::{ApiError, AppState, AuthUser};

#[derive(Deserialize)]
pub(super) struct BmiRequest {
    weight_kg: Option<f64>,
    height_cm: Option<f64>,
    age: Option<i64>,
    gender: Option<Gender>,
}

#[derive(Deserialize)]
pub(super) struct ProteinRequest {
    weight_kg: Option<f64>,
    goal_factor: f64,
}

#[derive(Serialize)]
pub(super) struct LastBmi {
    bmi: f64,
    category: BmiCategory,
    weight_kg: Option<f64>,
    height_cm: Option<f64>,
    gender: Option<Gender>,
    calculated_at: String,
}

pub(super) async fn get_last_bmi(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<LastBmi>, ApiError> {
    let db = state.db();
    let last = db
        .last_bmi(user.id)
        .context("database error")?
        .ok_or_else(|| ApiError::NotFound("No BMI calculated yet".to_string()))?;
    Ok(Json(LastBmi {
        bmi: last.bmi,
        category: health::bmi_category(last.bmi),
        weight_kg: last.weight_kg,
        height_cm: last.height_cm,
        gender: last.gender,
        calculated_at: last.calculated_at,
    }))
}

/// Values missing from the request come from the stored profile. The result
/// is recorded on the profile.
pub(super) async fn calculate_bmi(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<BmiRequest>,
) -> Result<Json<BmiReport>, ApiError> {
    let db = state.db();
    let profile = db.get_profile(user.id).context("database error")?;

    let (Some(weight_kg), Some(height_cm)) = (
        req.weight_kg.or(profile.weight_kg),
        req.height_cm.or(profile.height_cm),
    ) else {
        return Err(ApiError::BadRequest(
            "weight_kg and height_cm are required".to_string(),
        ));
    };
    let gender = req.gender.or(profile.gender);
    let report = health::bmi_report(weight_kg, height_cm, req.age.or(profile.age), gender)
        .map_err(ApiError::bad_request)?;

    db.record_bmi(user.id, report.bmi, weight_kg, height_cm, gender)
        .context("failed to record BMI")?;
    Ok(Json(report))
}

pub(super) async fn get_last_protein(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ProteinRecord>, ApiError> {
    let db = state.db();
    let last = db
        .last_protein(user.id)
        .context("database error")?
        .ok_or_else(|| ApiError::NotFound("No protein calculation yet".to_string()))?;
    Ok(Json(last))
}

/// Weight defaults to the profile weight. The result is recorded on the
/// profile.
pub(super) async fn calculate_protein(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<ProteinRequest>,
) -> Result<Json<ProteinRecord>, ApiError> {
    let db = state.db();
    let weight_kg = match req.weight_kg {
        Some(w) => w,
        None => db
            .get_profile(user.id)
            .context("database error")?
            .weight_kg
            .ok_or_else(|| ApiError::BadRequest("weight_kg is required".to_string()))?,
    };
    let protein_g =
        health::recommended_protein(weight_kg, req.goal_factor).map_err(ApiError::bad_request)?;
    let record = db
        .record_protein(user.id, weight_kg, req.goal_factor, protein_g)
        .context("failed to record protein calculation")?;
    Ok(Json(record))
}
