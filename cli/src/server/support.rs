use anyhow::Context;
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;

use mealwise_core::models::{
    NewSupportTicket, SupportTicket, TicketCategory, TicketPriority, TicketStatus, validate_email,
    validate_ticket_message, validate_ticket_text,
};

use super::{ApiError, AppState, AuthUser};

fn default_priority() -> TicketPriority {
    TicketPriority::Medium
}

fn default_category() -> TicketCategory {
    TicketCategory::General
}

#[derive(Deserialize)]
pub(super) struct CreateTicketRequest {
    subject: String,
    message: String,
    #[serde(default = "default_priority")]
    priority: TicketPriority,
    #[serde(default = "default_category")]
    category: TicketCategory,
    /// Defaults to the caller's email.
    email: Option<String>,
    contact_number: Option<String>,
}

#[derive(Deserialize)]
pub(super) struct ResponseRequest {
    message: String,
}

#[derive(Deserialize)]
pub(super) struct StatusRequest {
    status: TicketStatus,
}

fn ticket_not_found(id: i64) -> ApiError {
    ApiError::NotFound(format!("Ticket {id} not found"))
}

pub(super) async fn list_tickets(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<SupportTicket>>, ApiError> {
    let db = state.db();
    Ok(Json(db.list_tickets(user.id).context("database error")?))
}

pub(super) async fn get_ticket(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<SupportTicket>, ApiError> {
    let db = state.db();
    let ticket = db
        .get_ticket(user.id, id)
        .context("database error")?
        .ok_or_else(|| ticket_not_found(id))?;
    Ok(Json(ticket))
}

pub(super) async fn create_ticket(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateTicketRequest>,
) -> Result<(StatusCode, Json<SupportTicket>), ApiError> {
    validate_ticket_text(&req.subject, &req.message).map_err(ApiError::bad_request)?;

    let db = state.db();
    let user_email = match req.email {
        Some(email) => validate_email(&email).map_err(ApiError::bad_request)?,
        None => db.get_user(user.id).context("database error")?.email,
    };
    let ticket = db
        .create_ticket(
            user.id,
            &NewSupportTicket {
                subject: req.subject,
                message: req.message,
                priority: req.priority,
                category: req.category,
                user_email,
                contact_number: req.contact_number,
            },
        )
        .context("failed to create ticket")?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

pub(super) async fn add_response(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(req): Json<ResponseRequest>,
) -> Result<(StatusCode, Json<SupportTicket>), ApiError> {
    validate_ticket_message(&req.message).map_err(ApiError::bad_request)?;

    let db = state.db();
    let ticket = db
        .add_ticket_response(user.id, id, &req.message, false)
        .context("failed to add response")?
        .ok_or_else(|| ticket_not_found(id))?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

pub(super) async fn set_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<SupportTicket>, ApiError> {
    let db = state.db();
    let ticket = db
        .set_ticket_status(user.id, id, req.status)
        .context("failed to update ticket")?
        .ok_or_else(|| ticket_not_found(id))?;
    Ok(Json(ticket))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::server::test_support::test_app;

    #[tokio::test]
    async fn create_with_defaults() {
        let app = test_app();
        let (status, json) = app
            .send(
                "POST",
                "/api/support",
                Some(json!({ "subject": "Login", "message": "Token stopped working" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["priority"], "medium");
        assert_eq!(json["category"], "general");
        assert_eq!(json["status"], "open");
        assert_eq!(json["user_email"], "ana@example.com");
    }

    #[tokio::test]
    async fn create_validation() {
        let app = test_app();
        let (status, _) = app
            .send(
                "POST",
                "/api/support",
                Some(json!({ "subject": "", "message": "hello" })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app
            .send(
                "POST",
                "/api/support",
                Some(json!({ "subject": "Hi", "message": "x".repeat(2001) })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app
            .send(
                "POST",
                "/api/support",
                Some(json!({ "subject": "Hi", "message": "hello", "email": "not-an-email" })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn respond_and_close() {
        let app = test_app();
        let (_, json) = app
            .send(
                "POST",
                "/api/support",
                Some(json!({
                    "subject": "Feature",
                    "message": "Dark mode please",
                    "category": "feature-request",
                    "priority": "low",
                })),
            )
            .await;
        let id = json["id"].as_i64().unwrap();

        let (status, json) = app
            .send(
                "POST",
                &format!("/api/support/{id}/responses"),
                Some(json!({ "message": "Any news?" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["responses"][0]["message"], "Any news?");
        assert_eq!(json["responses"][0]["is_admin"], false);

        let (status, json) = app
            .send(
                "PUT",
                &format!("/api/support/{id}/status"),
                Some(json!({ "status": "in_progress" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "in_progress");

        let (status, _) = app.send("GET", "/api/support/999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
