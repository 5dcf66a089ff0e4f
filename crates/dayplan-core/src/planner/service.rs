//! Plan generation service.
//!
//! Sends one prompt per call to the configured [`TextGenerator`], bounded by
//! a timeout, and turns the reply into a plan for the requested date.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use tracing::{info, warn};

use dayplan_db::models::{DailyPlan, NewDailyPlan};
use dayplan_db::queries::plans as plan_queries;

use crate::llm::{LlmConfig, LlmError, OpenAiClient, TextGenerator};

use super::error::GenerateError;
use super::parser::parse_schedule_reply;
use super::prompt::build_completion_request;
use super::types::PlanRequest;

/// Turns plan requests into schedules via a text-generation backend.
///
/// Holds no per-request state; one instance is shared across the server.
pub struct PlanGenerator {
    backend: Arc<dyn TextGenerator>,
    timeout: Duration,
}

impl PlanGenerator {
    pub fn new(backend: Arc<dyn TextGenerator>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    /// Build a generator backed by [`OpenAiClient`].
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let client = OpenAiClient::new(config)?;
        Ok(Self::new(Arc::new(client), config.timeout))
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Ask the backend for a schedule and parse it.
    ///
    /// When the timeout expires the in-flight request future is dropped,
    /// which aborts the HTTP call, and [`GenerateError::Timeout`] is returned.
    pub async fn generate(&self, request: &PlanRequest) -> Result<NewDailyPlan, GenerateError> {
        let completion = build_completion_request(request);

        info!(
            date = %request.date,
            tasks = request.tasks.len(),
            backend = self.backend.name(),
            model = self.backend.model(),
            "requesting plan"
        );

        let reply = match tokio::time::timeout(self.timeout, self.backend.complete(&completion))
            .await
        {
            Ok(result) => result?,
            Err(_) => {
                warn!(date = %request.date, timeout = ?self.timeout, "plan generation timed out");
                return Err(GenerateError::Timeout(self.timeout));
            }
        };

        let schedule = parse_schedule_reply(&reply)?;
        info!(date = %request.date, entries = schedule.len(), "plan generated");

        Ok(NewDailyPlan {
            date: request.date,
            schedule,
        })
    }

    /// Generate a plan and store it, replacing any plan already stored for
    /// the date. Nothing is written if generation fails.
    pub async fn generate_and_store(
        &self,
        pool: &PgPool,
        request: &PlanRequest,
    ) -> Result<DailyPlan, GenerateError> {
        let plan = self.generate(request).await?;
        plan_queries::upsert_plan(pool, &plan)
            .await
            .map_err(GenerateError::Storage)
    }
}
