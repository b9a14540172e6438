use crate::config::MemoryConfig;
use crate::error::MemoryError;
use crate::store::{MemoryStore, Submission};
use crate::wire::{
    MemorizeRequest, MemorizeResponse, RetrieveCategoriesRequest, RetrieveCategoriesResponse,
    TaskStatusResponse, MEMORIZE_PATH, RETRIEVE_DEFAULT_CATEGORIES_PATH, TASK_STATUS_PATH,
};
use async_trait::async_trait;
use recall_types::{MemoryCategory, TaskStatus};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// HTTP client for the MemU memory service.
#[derive(Debug, Clone)]
pub struct MemuClient {
    base_url: String,
    api_key: String,
    status_endpoint: bool,
    http: reqwest::Client,
}

impl MemuClient {
    /// Builds a client whose every request is bounded by
    /// `config.request_timeout_seconds`.
    pub fn new(config: &MemoryConfig) -> Result<Self, MemoryError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            status_endpoint: config.status_endpoint,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, MemoryError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(MemoryError::Status {
                status: status.as_u16(),
                body,
            });
        }
        serde_json::from_str(&body).map_err(|e| MemoryError::Decode(e.to_string()))
    }
}

#[async_trait]
impl MemoryStore for MemuClient {
    async fn retrieve_default_categories(
        &self,
        user_id: &str,
        agent_id: &str,
    ) -> Result<Vec<MemoryCategory>, MemoryError> {
        let request = RetrieveCategoriesRequest {
            user_id,
            agent_id,
            include_inactive: false,
        };

        let response = self
            .http
            .post(self.url(RETRIEVE_DEFAULT_CATEGORIES_PATH))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let body: RetrieveCategoriesResponse = Self::decode(response).await?;
        Ok(body.into_categories())
    }

    async fn memorize_conversation(
        &self,
        submission: &Submission,
    ) -> Result<Option<String>, MemoryError> {
        let request = MemorizeRequest {
            conversation: &submission.conversation,
            user_id: &submission.user_id,
            user_name: &submission.user_name,
            agent_id: &submission.agent_id,
            agent_name: &submission.agent_name,
        };

        let response = self
            .http
            .post(self.url(MEMORIZE_PATH))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let body: MemorizeResponse = Self::decode(response).await?;
        debug!(
            task_id = ?body.task_id,
            status = ?body.status,
            message = ?body.message,
            "memorize response"
        );
        Ok(body.task_id.filter(|id| !id.is_empty()))
    }

    async fn task_status(&self, task_id: &str) -> Result<TaskStatus, MemoryError> {
        if !self.status_endpoint {
            return Err(MemoryError::StatusUnsupported);
        }

        let response = self
            .http
            .get(format!("{}/{}", self.url(TASK_STATUS_PATH), task_id))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let body: TaskStatusResponse = Self::decode(response).await?;
        Ok(body.status())
    }

    fn supports_task_status(&self) -> bool {
        self.status_endpoint
    }
}
