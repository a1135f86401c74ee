use anyhow::Context;
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};

use mealwise_core::models::{NewShoppingItem, ShoppingItem, validate_shopping_item};

use super::{ApiError, AppState, AuthUser, parse_date_param};

#[derive(Deserialize)]
pub(super) struct ToggleRequest {
    /// Flips the current state when absent.
    #[serde(default)]
    checked: Option<bool>,
}

#[derive(Deserialize)]
pub(super) struct FromPlanRequest {
    start: String,
    end: String,
}

#[derive(Serialize)]
pub(super) struct ClearedResponse {
    deleted: usize,
}

pub(super) async fn list_items(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<ShoppingItem>>, ApiError> {
    let db = state.db();
    let items = db
        .list_shopping_items(user.id)
        .context("database error")?;
    Ok(Json(items))
}

pub(super) async fn add_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<NewShoppingItem>,
) -> Result<(StatusCode, Json<ShoppingItem>), ApiError> {
    validate_shopping_item(&req).map_err(ApiError::bad_request)?;

    let db = state.db();
    let item = db
        .add_shopping_item(user.id, &req)
        .context("failed to add shopping item")?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub(super) async fn toggle_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(req): Json<ToggleRequest>,
) -> Result<Json<ShoppingItem>, ApiError> {
    let db = state.db();
    let item = db
        .set_shopping_item_checked(user.id, id, req.checked)
        .context("failed to update shopping item")?
        .ok_or_else(|| ApiError::NotFound(format!("Shopping item {id} not found")))?;
    Ok(Json(item))
}

pub(super) async fn delete_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let db = state.db();
    if db
        .delete_shopping_item(user.id, id)
        .context("database error")?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Shopping item {id} not found")))
    }
}

pub(super) async fn clear_checked(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ClearedResponse>, ApiError> {
    let db = state.db();
    let deleted = db
        .clear_checked_items(user.id)
        .context("failed to clear shopping list")?;
    Ok(Json(ClearedResponse { deleted }))
}

/// Adds the ingredients of every meal planned in the range. Returns only the
/// items that were added.
pub(super) async fn add_from_plan(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<FromPlanRequest>,
) -> Result<(StatusCode, Json<Vec<ShoppingItem>>), ApiError> {
    let start = parse_date_param(&req.start)?;
    let end = parse_date_param(&req.end)?;
    if end < start {
        return Err(ApiError::BadRequest(
            "End date must not be before start date".to_string(),
        ));
    }

    let db = state.db();
    let added = db
        .add_items_from_plan(user.id, start, end)
        .context("failed to generate shopping list")?;
    Ok((StatusCode::CREATED, Json(added)))
}

pub(super) async fn export_csv(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.db();
    let csv = db
        .export_shopping_csv(user.id)
        .context("failed to export shopping list")?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"shopping-list.csv\"",
            ),
        ],
        csv,
    ))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::server::test_support::test_app;

    #[tokio::test]
    async fn add_toggle_and_clear() {
        let app = test_app();
        let (status, json) = app
            .send(
                "POST",
                "/api/shopping-list",
                Some(json!({ "ingredient_name": "Milk", "amount": "1", "unit": "l" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["checked"], false);
        let id = json["id"].as_i64().unwrap();

        let (status, json) = app
            .send("PUT", &format!("/api/shopping-list/{id}"), Some(json!({})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["checked"], true);

        let (status, json) = app.send("DELETE", "/api/shopping-list", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["deleted"], 1);

        let (status, _) = app
            .send("DELETE", &format!("/api/shopping-list/{id}"), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn blank_ingredient_rejected() {
        let app = test_app();
        let (status, _) = app
            .send(
                "POST",
                "/api/shopping-list",
                Some(json!({ "ingredient_name": "   " })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn generate_from_plan() {
        let app = test_app();
        let oats = app.create_meal("Oats", "breakfast", 300.0).await;
        app.send(
            "POST",
            "/api/plans/2024-03-01/meals",
            Some(json!({ "slot": "breakfast", "meal_id": oats })),
        )
        .await;

        let (status, json) = app
            .send(
                "POST",
                "/api/shopping-list/from-plan",
                Some(json!({ "start": "2024-03-01", "end": "2024-03-07" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json[0]["ingredient_name"], "Oats base");
        assert_eq!(json[0]["recipe_title"], "Oats");
    }

    #[tokio::test]
    async fn export_is_csv() {
        let app = test_app();
        app.send(
            "POST",
            "/api/shopping-list",
            Some(json!({ "ingredient_name": "Eggs", "amount": "12" })),
        )
        .await;

        let (status, headers, body) = app.send_raw("GET", "/api/shopping-list/export", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            headers.get("content-type").unwrap(),
            "text/csv; charset=utf-8"
        );
        let text = String::from_utf8(body.to_vec()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["Ingredient,Amount,Unit,Recipe,Checked", "Eggs,12,,,no"]);
    }
}
