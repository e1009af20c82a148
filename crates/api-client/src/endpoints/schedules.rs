//! Job scheduler endpoints
//!
//! Schedules live on the scheduler API, which has its own base URL and
//! authenticates with the scheduler bearer token.

use crate::client::{Endpoint, Transport};
use crate::endpoints::duration_millis;
use crate::error::{ApiError, ApiResult};
use addons_core::FlexibleTimestamp;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Schedules API interface
#[derive(Debug, Clone)]
pub struct SchedulesApi {
    transport: Transport,
}

impl SchedulesApi {
    /// Create a new schedules API interface
    pub(crate) fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// List schedules
    ///
    /// GET /schedules
    pub async fn list(&self) -> ApiResult<Vec<Schedule>> {
        self.transport.call(&Endpoint::get("/schedules")).await
    }

    /// Get a schedule by ID
    ///
    /// GET /schedules/{schedule_id}
    pub async fn get(&self, schedule_id: &str) -> ApiResult<Schedule> {
        let endpoint = Endpoint::get("/schedules/{schedule_id}").param("schedule_id", schedule_id);
        self.transport.call(&endpoint).await
    }

    /// Create a schedule
    ///
    /// POST /schedules
    pub async fn create(&self, request: &CreateScheduleRequest) -> ApiResult<CreatedSchedule> {
        let body = request.to_body()?;
        self.transport
            .call_with(&Endpoint::post("/schedules"), &body)
            .await
    }

    /// Pause a schedule
    ///
    /// POST /schedules/{schedule_id}/pause
    pub async fn pause(&self, schedule_id: &str) -> ApiResult<()> {
        self.action(schedule_id, "pause").await
    }

    /// Resume a paused schedule
    ///
    /// POST /schedules/{schedule_id}/resume
    pub async fn resume(&self, schedule_id: &str) -> ApiResult<()> {
        self.action(schedule_id, "resume").await
    }

    /// Delete a schedule
    ///
    /// DELETE /schedules/{schedule_id}
    pub async fn delete(&self, schedule_id: &str) -> ApiResult<()> {
        let endpoint =
            Endpoint::delete("/schedules/{schedule_id}").param("schedule_id", schedule_id);
        self.transport.call_empty(&endpoint).await
    }

    /// Find the first schedule calling `destination`
    pub async fn find_by_destination(&self, destination: &str) -> ApiResult<Schedule> {
        self.list()
            .await?
            .into_iter()
            .find(|s| s.destination == destination)
            .ok_or_else(|| ApiError::not_found("schedule", destination))
    }

    async fn action(&self, schedule_id: &str, action: &str) -> ApiResult<()> {
        let endpoint = Endpoint::post("/schedules/{schedule_id}/{action}")
            .param("schedule_id", schedule_id)
            .param("action", action);
        self.transport.call_empty(&endpoint).await
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    /// Schedule ID
    pub schedule_id: String,
    /// URL called on every run
    pub destination: String,
    /// Cron expression
    pub cron: String,
    /// HTTP method used
    pub method: Option<String>,
    /// Headers forwarded to the destination
    #[serde(default)]
    pub header: BTreeMap<String, Vec<String>>,
    /// Body forwarded to the destination
    pub body: Option<String>,
    /// Retry count on failure
    pub retries: Option<u32>,
    /// Delay before each run in milliseconds
    pub delay: Option<i64>,
    /// URL notified with the run result
    pub callback: Option<String>,
    /// Milliseconds
    pub timeout: Option<i64>,
    /// Whether runs are paused
    #[serde(default)]
    pub is_paused: bool,
    /// Creation time
    #[serde(default)]
    pub created_at: Option<FlexibleTimestamp>,
    /// Start of the previous run
    #[serde(default)]
    pub last_run_at: Option<FlexibleTimestamp>,
    /// Start of the next run
    #[serde(default)]
    pub next_run_at: Option<FlexibleTimestamp>,
}

/// Response to a schedule creation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedSchedule {
    /// ID of the new schedule
    pub schedule_id: String,
}

/// Create schedule request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateScheduleRequest {
    /// URL called on every run
    pub destination: String,
    /// Cron expression, e.g. `"*/5 * * * *"`
    pub cron: String,
    /// HTTP method, `POST` when unset
    pub method: Option<String>,
    /// Headers forwarded to the destination
    pub headers: BTreeMap<String, String>,
    /// Body forwarded to the destination
    pub body: Option<String>,
    /// Retry count on failure
    pub retries: Option<u32>,
    /// URL notified with the run result
    pub callback: Option<String>,
    /// Duration text such as `"30s"`
    pub timeout: Option<String>,
}

impl CreateScheduleRequest {
    /// Schedule calling `destination` on `cron`
    pub fn new(destination: impl Into<String>, cron: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            cron: cron.into(),
            ..Self::default()
        }
    }

    /// HTTP body forwarded to the destination
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Header forwarded to the destination
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Retry count on failure
    #[must_use]
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    /// Per-run timeout as duration text
    #[must_use]
    pub fn with_timeout(mut self, text: impl Into<String>) -> Self {
        self.timeout = Some(text.into());
        self
    }

    fn to_body(&self) -> ApiResult<ScheduleBody<'_>> {
        Ok(ScheduleBody {
            destination: &self.destination,
            cron: &self.cron,
            method: self.method.as_deref(),
            headers: &self.headers,
            body: self.body.as_deref(),
            retries: self.retries,
            callback: self.callback.as_deref(),
            timeout: duration_millis(self.timeout.as_deref(), "timeout")?,
        })
    }
}

#[derive(Debug, Serialize)]
struct ScheduleBody<'a> {
    destination: &'a str,
    cron: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    method: Option<&'a str>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    headers: &'a BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    retries: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    callback: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout: Option<i64>,
}
