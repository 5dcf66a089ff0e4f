use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Json, Router};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use dayplan_core::dates::{DateParseError, TimeParseError};
use dayplan_core::planner::{GenerateError, PlanGenerator, WorkHours};

use crate::{plan_routes, task_routes};

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Handed to every handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub planner: Arc<PlanGenerator>,
    /// Used when a generation request carries no `workHours`.
    pub work_hours: WorkHours,
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.into(),
        }
    }

    pub fn internal(err: anyhow::Error) -> Self {
        tracing::error!(error = %format!("{err:#}"), "request failed");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("{err:#}"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

impl From<GenerateError> for AppError {
    fn from(err: GenerateError) -> Self {
        let status = match err {
            GenerateError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        tracing::warn!(error = %err, status = status.as_u16(), "plan generation failed");
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<DateParseError> for AppError {
    fn from(err: DateParseError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<TimeParseError> for AppError {
    fn from(err: TimeParseError) -> Self {
        Self::bad_request(err.to_string())
    }
}

// axum answers bad bodies with 422 and its own text; every client input
// error here is a JSON 400.

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(task_routes::routes())
        .merge(plan_routes::routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(state: AppState, bind: &str, port: u16) -> Result<()> {
    let app = build_router(state);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!("dayplan serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("dayplan serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use dayplan_test_utils::{create_test_db, drop_test_db};

    use super::*;
    use crate::test_util::{body_json, send, state_with};

    #[test]
    fn generate_errors_map_to_status_codes() {
        use std::time::Duration;

        use dayplan_core::llm::LlmError;
        use dayplan_core::planner::ReplyParseError;

        let timeout: AppError = GenerateError::Timeout(Duration::from_secs(60)).into();
        assert_eq!(timeout.status, StatusCode::GATEWAY_TIMEOUT);

        let missing: AppError = GenerateError::MissingApiKey.into();
        assert_eq!(missing.status, StatusCode::INTERNAL_SERVER_ERROR);

        let upstream: AppError = GenerateError::Llm(LlmError::EmptyReply).into();
        assert_eq!(upstream.status, StatusCode::INTERNAL_SERVER_ERROR);

        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let malformed: AppError =
            GenerateError::MalformedReply(ReplyParseError::Json(parse_err)).into();
        assert_eq!(malformed.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn date_error_keeps_exact_message() {
        let err: AppError = DateParseError {
            input: "2023/13/40".to_string(),
        }
        .into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Invalid date format. Use YYYY-MM-DD");
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let (pool, db_name) = create_test_db().await;
        let app = build_router(state_with(pool.clone(), "{}"));

        let resp = send(app, Method::GET, "/nope", None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn test_malformed_json_body_is_400() {
        let (pool, db_name) = create_test_db().await;
        let app = build_router(state_with(pool.clone(), "{}"));

        let resp = send(
            app,
            Method::POST,
            "/tasks",
            Some(json!({ "description": "x", "priority": "urgent" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = body_json(resp).await;
        assert!(body["error"].is_string(), "error body: {body}");

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn test_cors_headers_present() {
        let (pool, db_name) = create_test_db().await;
        let app = build_router(state_with(pool.clone(), "{}"));

        let resp = tower::ServiceExt::oneshot(
            app,
            axum::http::Request::builder()
                .uri("/tasks")
                .header("origin", "http://localhost:19006")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().contains_key("access-control-allow-origin"));

        pool.close().await;
        drop_test_db(&db_name).await;
    }
}
