mod account;
mod dashboard;
mod health;
mod meals;
mod orders;
mod plans;
mod shopping;
mod support;
mod trackers;

use std::fmt::Display;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use mealwise_core::db::Database;
use mealwise_core::models::parse_date;

const BODY_LIMIT: usize = 1024 * 1024; // 1 MB

/// How requests are mapped to a user.
#[derive(Debug, Clone, Copy)]
pub enum AuthMode {
    /// `Authorization: Bearer <token>` resolved against stored token hashes.
    Token,
    /// No authentication; every request acts as this user.
    Disabled { user_id: i64 },
}

#[derive(Clone)]
struct AppState {
    db: Arc<Mutex<Database>>,
    auth: AuthMode,
}

impl AppState {
    fn db(&self) -> MutexGuard<'_, Database> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The authenticated caller, inserted by `require_auth`.
#[derive(Debug, Clone, Copy)]
struct AuthUser {
    id: i64,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// --- Error handling ---

enum ApiError {
    NotFound(String),
    BadRequest(String),
    Unauthorized,
    Internal(anyhow::Error),
}

impl ApiError {
    fn bad_request(err: impl Display) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Invalid or missing API key".to_string(),
            ),
            Self::Internal(err) => {
                tracing::error!("internal server error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

fn parse_date_param(s: &str) -> Result<NaiveDate, ApiError> {
    parse_date(s).map_err(ApiError::bad_request)
}

/// Parses an optional date, defaulting to today.
fn date_or_today(s: Option<&str>) -> Result<NaiveDate, ApiError> {
    s.map_or_else(|| Ok(today()), parse_date_param)
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

// --- Middleware ---

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

async fn require_auth(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let user_id = match state.auth {
        AuthMode::Disabled { user_id } => Some(user_id),
        AuthMode::Token => match bearer_token(&request) {
            None => None,
            Some(token) => match state.db().find_user_by_token(token) {
                Ok(user) => user.map(|u| u.id),
                Err(e) => return ApiError::Internal(e).into_response(),
            },
        },
    };

    let Some(id) = user_id else {
        tracing::debug!(path = %request.uri().path(), "rejected unauthenticated request");
        return ApiError::Unauthorized.into_response();
    };
    request.extensions_mut().insert(AuthUser { id });
    next.run(request).await
}

async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static("default-src 'none'"),
    );
    response
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/me", get(account::get_me))
        .route("/api/meals", get(meals::list_meals).post(meals::create_meal))
        .route(
            "/api/meals/{id}",
            get(meals::get_meal)
                .put(meals::update_meal)
                .delete(meals::delete_meal),
        )
        .route("/api/plans", get(plans::list_plans))
        .route(
            "/api/plans/{date}",
            get(plans::get_plan).delete(plans::clear_plan),
        )
        .route("/api/plans/{date}/meals", post(plans::add_plan_meal))
        .route(
            "/api/plans/{date}/meals/{slot}/{meal_id}",
            delete(plans::remove_plan_meal),
        )
        .route("/api/plans/{date}/copy", post(plans::copy_plan))
        .route(
            "/api/water",
            get(trackers::get_water).post(trackers::log_water),
        )
        .route("/api/water/{id}", delete(trackers::delete_water))
        .route(
            "/api/exercise",
            get(trackers::get_exercise).post(trackers::log_exercise),
        )
        .route("/api/exercise/{id}", delete(trackers::delete_exercise))
        .route(
            "/api/weight",
            get(trackers::get_weight_history).post(trackers::log_weight),
        )
        .route("/api/weight/{id}", delete(trackers::delete_weight))
        .route(
            "/api/goals",
            get(account::get_goals).put(account::update_goals),
        )
        .route(
            "/api/profile",
            get(account::get_profile).put(account::update_profile),
        )
        .route(
            "/api/health/bmi",
            get(health::get_last_bmi).post(health::calculate_bmi),
        )
        .route(
            "/api/health/protein",
            get(health::get_last_protein).post(health::calculate_protein),
        )
        .route("/api/dashboard", get(dashboard::get_dashboard))
        .route(
            "/api/shopping-list",
            get(shopping::list_items)
                .post(shopping::add_item)
                .delete(shopping::clear_checked),
        )
        .route(
            "/api/shopping-list/{id}",
            put(shopping::toggle_item).delete(shopping::delete_item),
        )
        .route("/api/shopping-list/from-plan", post(shopping::add_from_plan))
        .route("/api/shopping-list/export", get(shopping::export_csv))
        .route("/api/orders", get(orders::list_orders).post(orders::place_order))
        .route("/api/orders/{id}", get(orders::get_order))
        .route("/api/orders/{id}/cancel", post(orders::cancel_order))
        .route("/api/orders/{id}/complete", post(orders::complete_order))
        .route(
            "/api/support",
            get(support::list_tickets).post(support::create_ticket),
        )
        .route("/api/support/{id}", get(support::get_ticket))
        .route("/api/support/{id}/responses", post(support::add_response))
        .route("/api/support/{id}/status", put(support::set_status))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(middleware::from_fn(security_headers))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// --- Server startup ---

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("received Ctrl+C, shutting down");
}

pub async fn start_server(db: Database, port: u16, bind: &str, auth: AuthMode) -> anyhow::Result<()> {
    if let AuthMode::Disabled { user_id } = auth {
        tracing::warn!(user_id, "authentication disabled (--no-auth); API is open to anyone");
        if bind != "127.0.0.1" && bind != "localhost" {
            tracing::warn!(
                bind,
                "listening beyond localhost with no authentication; any device on your network can access this API"
            );
        }
    }

    let state = AppState {
        db: Arc::new(Mutex::new(db)),
        auth,
    };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(format!("{bind}:{port}"))
        .await
        .with_context(|| format!("failed to bind {bind}:{port}"))?;
    tracing::info!("listening on http://{bind}:{port}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
