//! REST Task Store
//!
//! `TaskStore` over a small JSON HTTP API: `GET /tasks?status=active`,
//! `PATCH /tasks/{id}`, `POST /tasks/{id}/complete`. Authentication is
//! an optional bearer token. Requests carry a flat client-side timeout;
//! anything that never completes surfaces as `StoreError::Network` so
//! the orchestrator can apply its transport cooldown.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::models::{Task, TaskPatch};

use super::{StoreError, TaskStore};

/// Request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// `TaskStore` backed by an HTTP JSON API.
pub struct RestTaskStore {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl RestTaskStore {
    /// Build a store client for one base URL.
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| StoreError::Network(format!("failed to build HTTP client: {e}")))?;
        let base_url: String = base_url.into();
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn check(
        response: reqwest::Response,
        id: Option<&str>,
    ) -> Result<reqwest::Response, StoreError> {
        let status = response.status().as_u16();
        if status == 404 {
            if let Some(id) = id {
                return Err(StoreError::NotFound(id.to_string()));
            }
        }
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Http { status, body });
        }
        Ok(response)
    }
}

#[async_trait]
impl TaskStore for RestTaskStore {
    async fn list_active(&self) -> Result<Vec<Task>, StoreError> {
        let url = format!("{}/tasks?status=active", self.base_url);
        let response = self.authed(self.client.get(&url)).send().await?;
        let response = Self::check(response, None).await?;
        let tasks: Vec<Task> = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(format!("failed to parse task list: {e}")))?;
        debug!(count = tasks.len(), "fetched active tasks");
        Ok(tasks)
    }

    async fn update(&self, id: &str, patch: TaskPatch) -> Result<(), StoreError> {
        let url = format!("{}/tasks/{}", self.base_url, id);
        let response = self
            .authed(self.client.patch(&url).json(&patch))
            .send()
            .await?;
        Self::check(response, Some(id)).await?;
        Ok(())
    }

    async fn complete(&self, id: &str) -> Result<(), StoreError> {
        let url = format!("{}/tasks/{}/complete", self.base_url, id);
        let response = self.authed(self.client.post(&url)).send().await?;
        Self::check(response, Some(id)).await?;
        Ok(())
    }
}
