use anyhow::Context;
use axum::{
    Extension, Json,
    extract::{Query, State},
};
use serde::Deserialize;

use mealwise_core::aggregate::Period;
use mealwise_core::db::Dashboard;

use super::{ApiError, AppState, AuthUser, today};

#[derive(Deserialize)]
pub(super) struct DashboardQuery {
    period: Option<String>,
}

pub(super) async fn get_dashboard(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<DashboardQuery>,
) -> Result<Json<Dashboard>, ApiError> {
    let period =
        Period::parse_or_default(params.period.as_deref()).map_err(ApiError::bad_request)?;

    let db = state.db();
    let dashboard = db
        .build_dashboard(user.id, period, today())
        .context("failed to build dashboard")?;
    Ok(Json(dashboard))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::server::test_support::test_app;
    use crate::server::today;
    use mealwise_core::models::format_date;

    #[tokio::test]
    async fn dashboard_defaults_to_this_week() {
        let app = test_app();
        let (status, json) = app.send("GET", "/api/dashboard", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["period"], "this-week");
        assert_eq!(json["calorie_tracker"]["current"], 0.0);
        assert_eq!(json["calorie_tracker"]["goal"], 2000);
        assert_eq!(json["water_tracker"]["goal"], 2000);
        assert_eq!(json["exercise_tracker"]["goal"], 150);
        assert_eq!(json["logging_streak"], 0);
    }

    #[tokio::test]
    async fn dashboard_counts_planned_meals_and_water() {
        let app = test_app();
        let day = format_date(today());
        let oats = app.create_meal("Oats", "breakfast", 300.0).await;
        let stew = app.create_meal("Stew", "dinner", 520.0).await;
        for (slot, id) in [("breakfast", oats), ("dinner", stew)] {
            app.send(
                "POST",
                &format!("/api/plans/{day}/meals"),
                Some(json!({ "slot": slot, "meal_id": id })),
            )
            .await;
        }
        app.send("POST", "/api/water", Some(json!({ "amount_ml": 750.0 })))
            .await;

        let (status, json) = app
            .send("GET", "/api/dashboard?period=this-month", None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["calorie_tracker"]["current"], 820.0);
        assert_eq!(json["calorie_tracker"]["daily_data"][&day], 820.0);
        assert_eq!(json["water_tracker"]["current"], 750.0);
        assert_eq!(json["planned_meals"], 2);
        assert_eq!(json["logging_streak"], 1);
        assert_eq!(json["recent_meals"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn dashboard_rejects_unknown_period() {
        let app = test_app();
        let (status, json) = app
            .send("GET", "/api/dashboard?period=yesterday", None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("this-week"));
    }
}
