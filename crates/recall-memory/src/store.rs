use crate::client::MemuClient;
use crate::config::MemoryConfig;
use crate::error::MemoryError;
use async_trait::async_trait;
use recall_types::{ChatMessage, MemoryCategory, TaskStatus};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Number of characters shown when logging summaries and messages.
const PREVIEW_CHARS: usize = 50;

/// A conversation snapshot handed to the memory store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub conversation: Vec<ChatMessage>,
    pub user_id: String,
    pub user_name: String,
    pub agent_id: String,
    pub agent_name: String,
}

/// Operations the coordinator needs from a remote memory store.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Returns the default memory categories for a (user, agent) pair.
    async fn retrieve_default_categories(
        &self,
        user_id: &str,
        agent_id: &str,
    ) -> Result<Vec<MemoryCategory>, MemoryError>;

    /// Submits a conversation for summarization and returns the remote
    /// task identifier, if the store provided one.
    async fn memorize_conversation(
        &self,
        submission: &Submission,
    ) -> Result<Option<String>, MemoryError>;

    /// Returns the processing status of a submitted conversation.
    async fn task_status(&self, task_id: &str) -> Result<TaskStatus, MemoryError>;

    /// Whether [`MemoryStore::task_status`] is backed by a real endpoint.
    fn supports_task_status(&self) -> bool {
        true
    }
}

/// Store used when no credentials are configured. Every call fails with
/// [`MemoryError::Disabled`], which callers treat as a no-op.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledStore;

#[async_trait]
impl MemoryStore for DisabledStore {
    async fn retrieve_default_categories(
        &self,
        _user_id: &str,
        _agent_id: &str,
    ) -> Result<Vec<MemoryCategory>, MemoryError> {
        Err(MemoryError::Disabled)
    }

    async fn memorize_conversation(
        &self,
        _submission: &Submission,
    ) -> Result<Option<String>, MemoryError> {
        Err(MemoryError::Disabled)
    }

    async fn task_status(&self, _task_id: &str) -> Result<TaskStatus, MemoryError> {
        Err(MemoryError::Disabled)
    }

    fn supports_task_status(&self) -> bool {
        false
    }
}

/// Builds the store described by `config`.
///
/// A missing API key or an HTTP client that cannot be built yields a
/// [`DisabledStore`]; memory is an optional feature and never stops the agent.
pub fn connect(config: &MemoryConfig) -> Arc<dyn MemoryStore> {
    if !config.is_enabled() {
        warn!("memory store API key not set, long-term memory is disabled");
        return Arc::new(DisabledStore);
    }

    match MemuClient::new(config) {
        Ok(client) => {
            info!(base_url = client.base_url(), "memory store client initialized");
            Arc::new(client)
        }
        Err(e) => {
            error!(error = %e, "failed to build memory store client, long-term memory is disabled");
            Arc::new(DisabledStore)
        }
    }
}

/// Retrieves the memory categories for a (user, agent) pair.
///
/// Never fails: any store error is logged and yields an empty list.
pub async fn retrieve(store: &dyn MemoryStore, user_id: &str, agent_id: &str) -> Vec<MemoryCategory> {
    match store.retrieve_default_categories(user_id, agent_id).await {
        Ok(categories) => {
            if categories.is_empty() {
                info!(user_id, agent_id, "no stored memories (new user or first conversation)");
            } else {
                info!(
                    user_id,
                    agent_id,
                    count = categories.len(),
                    "retrieved memory categories"
                );
                for (idx, category) in categories.iter().enumerate() {
                    info!(
                        index = idx + 1,
                        name = %category.name,
                        summary = %category
                            .usable_summary()
                            .map(|s| preview(s, PREVIEW_CHARS))
                            .unwrap_or_else(|| "-".to_string()),
                        "memory category"
                    );
                }
            }
            categories
        }
        Err(MemoryError::Disabled) => {
            warn!("memory store disabled, skipping memory retrieval");
            Vec::new()
        }
        Err(e) => {
            error!(user_id, agent_id, error = %e, "failed to retrieve memories");
            Vec::new()
        }
    }
}

/// Truncates `text` to at most `max_chars` characters, marking the cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingStore;

    #[async_trait]
    impl MemoryStore for FailingStore {
        async fn retrieve_default_categories(
            &self,
            _user_id: &str,
            _agent_id: &str,
        ) -> Result<Vec<MemoryCategory>, MemoryError> {
            Err(MemoryError::Status {
                status: 503,
                body: "unavailable".to_string(),
            })
        }

        async fn memorize_conversation(
            &self,
            _submission: &Submission,
        ) -> Result<Option<String>, MemoryError> {
            Err(MemoryError::Decode("bad".to_string()))
        }

        async fn task_status(&self, _task_id: &str) -> Result<TaskStatus, MemoryError> {
            Ok(TaskStatus::Unknown)
        }
    }

    #[tokio::test]
    async fn retrieve_fails_soft_on_store_error() {
        let categories = retrieve(&FailingStore, "u", "a").await;
        assert!(categories.is_empty());
    }

    #[tokio::test]
    async fn retrieve_fails_soft_when_disabled() {
        let categories = retrieve(&DisabledStore, "u", "a").await;
        assert!(categories.is_empty());
        assert!(!DisabledStore.supports_task_status());
    }

    #[test]
    fn connect_without_key_is_disabled() {
        let store = connect(&MemoryConfig::default());
        assert!(!store.supports_task_status());
    }

    #[test]
    fn preview_truncates_on_char_boundary() {
        assert_eq!(preview("短文本", 50), "短文本");
        assert_eq!(preview("一二三四五", 3), "一二三...");
    }
}
