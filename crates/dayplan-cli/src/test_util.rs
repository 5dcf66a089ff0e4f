//! Helpers shared by the router and config tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request};
use axum::Router;
use sqlx::PgPool;
use tower::ServiceExt;

use dayplan_core::llm::{CompletionRequest, LlmError, TextGenerator};
use dayplan_core::planner::{PlanGenerator, WorkHours};

use crate::serve_cmd::AppState;

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Serialize tests that read or write process environment variables.
pub fn lock_env() -> MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ---------------------------------------------------------------------------
// Stub generators
// ---------------------------------------------------------------------------

/// Replies with the same text every time and counts calls.
pub struct Canned {
    reply: String,
    calls: AtomicUsize,
    last_user_prompt: Mutex<Option<String>>,
}

impl Canned {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            calls: AtomicUsize::new(0),
            last_user_prompt: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_user_prompt(&self) -> Option<String> {
        self.last_user_prompt.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for Canned {
    fn name(&self) -> &str {
        "canned"
    }

    fn model(&self) -> &str {
        "stub"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_user_prompt.lock().unwrap() = Some(request.user.clone());
        Ok(self.reply.clone())
    }
}

/// Always fails the way an overloaded upstream would.
pub struct Unavailable;

#[async_trait]
impl TextGenerator for Unavailable {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn model(&self) -> &str {
        "stub"
    }

    async fn complete(&self, _request: &CompletionRequest) -> Result<String, LlmError> {
        Err(LlmError::Status {
            status: 503,
            body: "service unavailable".to_string(),
        })
    }
}

/// Never answers.
pub struct Silent;

#[async_trait]
impl TextGenerator for Silent {
    fn name(&self) -> &str {
        "silent"
    }

    fn model(&self) -> &str {
        "stub"
    }

    async fn complete(&self, _request: &CompletionRequest) -> Result<String, LlmError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(String::new())
    }
}

// ---------------------------------------------------------------------------
// State and requests
// ---------------------------------------------------------------------------

pub fn state_with_backend(
    pool: PgPool,
    backend: Arc<dyn TextGenerator>,
    timeout: Duration,
) -> AppState {
    AppState {
        pool,
        planner: Arc::new(PlanGenerator::new(backend, timeout)),
        work_hours: WorkHours::default(),
    }
}

/// State whose generator always replies with `reply`.
pub fn state_with(pool: PgPool, reply: &str) -> AppState {
    state_with_backend(pool, Arc::new(Canned::new(reply)), Duration::from_secs(5))
}

pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
) -> axum::response::Response {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

/// Send a raw, possibly malformed, JSON body.
pub async fn send_raw(app: Router, method: Method, uri: &str, body: &str) -> axum::response::Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_owned()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1_048_576)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
