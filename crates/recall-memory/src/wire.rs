//! Request and response bodies for the memory store HTTP API.
//!
//! Each remote call has exactly one response type. Responses are decoded
//! here and converted into `recall_types` values before they reach the
//! coordinator.

use recall_types::{ChatMessage, MemoryCategory, TaskStatus};
use serde::{Deserialize, Serialize};

pub const MEMORIZE_PATH: &str = "/api/v1/memory/memorize";
pub const TASK_STATUS_PATH: &str = "/api/v1/memory/memorize/status";
pub const RETRIEVE_DEFAULT_CATEGORIES_PATH: &str = "/api/v1/memory/retrieve/default-categories";

/// Category name used when the store omits one.
pub const UNNAMED_CATEGORY: &str = "未知分类";

#[derive(Debug, Serialize)]
pub struct MemorizeRequest<'a> {
    pub conversation: &'a [ChatMessage],
    pub user_id: &'a str,
    pub user_name: &'a str,
    pub agent_id: &'a str,
    pub agent_name: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct MemorizeResponse {
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TaskStatusResponse {
    #[serde(default)]
    pub task_id: Option<String>,
    pub status: String,
}

impl TaskStatusResponse {
    pub fn status(&self) -> TaskStatus {
        TaskStatus::from_remote(&self.status)
    }
}

#[derive(Debug, Serialize)]
pub struct RetrieveCategoriesRequest<'a> {
    pub user_id: &'a str,
    pub agent_id: &'a str,
    pub include_inactive: bool,
}

#[derive(Debug, Deserialize)]
pub struct RetrieveCategoriesResponse {
    #[serde(default)]
    pub categories: Vec<CategoryBody>,
}

#[derive(Debug, Deserialize)]
pub struct CategoryBody {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
}

impl From<CategoryBody> for MemoryCategory {
    fn from(body: CategoryBody) -> Self {
        MemoryCategory {
            name: body
                .name
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| UNNAMED_CATEGORY.to_string()),
            summary: body.summary,
        }
    }
}

impl RetrieveCategoriesResponse {
    pub fn into_categories(self) -> Vec<MemoryCategory> {
        self.categories.into_iter().map(Into::into).collect()
    }
}
