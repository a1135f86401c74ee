use anyhow::Context;
use axum::{Extension, Json, extract::State};

use mealwise_core::models::{
    HealthProfile, UpdateGoals, UpdateProfile, User, UserGoals, validate_goals, validate_profile,
};

use super::{ApiError, AppState, AuthUser};

pub(super) async fn get_me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<User>, ApiError> {
    let db = state.db();
    let user = db.get_user(user.id).context("database error")?;
    Ok(Json(user))
}

pub(super) async fn get_goals(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserGoals>, ApiError> {
    let db = state.db();
    Ok(Json(db.get_goals(user.id).context("database error")?))
}

pub(super) async fn update_goals(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<UpdateGoals>,
) -> Result<Json<UserGoals>, ApiError> {
    validate_goals(&req).map_err(ApiError::bad_request)?;

    let db = state.db();
    let goals = db
        .update_goals(user.id, &req)
        .context("failed to update goals")?;
    Ok(Json(goals))
}

pub(super) async fn get_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<HealthProfile>, ApiError> {
    let db = state.db();
    Ok(Json(db.get_profile(user.id).context("database error")?))
}

pub(super) async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<UpdateProfile>,
) -> Result<Json<HealthProfile>, ApiError> {
    validate_profile(&req).map_err(ApiError::bad_request)?;

    let db = state.db();
    let profile = db
        .update_profile(user.id, &req)
        .context("failed to update profile")?;
    Ok(Json(profile))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::server::test_support::test_app;

    #[tokio::test]
    async fn goals_default_then_update() {
        let app = test_app();
        let (status, json) = app.send("GET", "/api/goals", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["calorie_goal"], 2000);
        assert_eq!(json["water_goal_ml"], 2000);
        assert_eq!(json["exercise_goal_min"], 150);
        assert_eq!(json["customized"], false);

        let (status, json) = app
            .send("PUT", "/api/goals", Some(json!({ "water_goal_ml": 2500 })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["water_goal_ml"], 2500);
        assert_eq!(json["calorie_goal"], 2000);
        assert_eq!(json["customized"], true);
    }

    #[tokio::test]
    async fn goals_out_of_range_rejected() {
        let app = test_app();
        let (status, json) = app
            .send("PUT", "/api/goals", Some(json!({ "calorie_goal": 10001 })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            json["error"],
            "Invalid calorie_goal: must be between 0 and 10000"
        );
    }

    #[tokio::test]
    async fn profile_partial_update() {
        let app = test_app();
        let (status, json) = app
            .send(
                "PUT",
                "/api/profile",
                Some(json!({ "age": 30, "gender": "female" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["age"], 30);
        assert_eq!(json["gender"], "female");
        assert!(json["height_cm"].is_null());

        let (status, _) = app
            .send("PUT", "/api/profile", Some(json!({ "height_cm": -10.0 })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
