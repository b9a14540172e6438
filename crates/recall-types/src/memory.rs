//! Memory-store domain types.
//!
//! These are the decoded, validated forms of what the remote memory store
//! returns. The raw wire schema lives in `recall-memory`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named memory category with an optional summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryCategory {
    pub name: String,
    #[serde(default)]
    pub summary: Option<String>,
}

impl MemoryCategory {
    pub fn new(name: impl Into<String>, summary: Option<&str>) -> Self {
        Self {
            name: name.into(),
            summary: summary.map(str::to_string),
        }
    }

    /// Returns the summary unless it is missing or the empty string.
    /// Whitespace-only summaries are kept as the store sent them.
    pub fn usable_summary(&self) -> Option<&str> {
        self.summary.as_deref().filter(|summary| !summary.is_empty())
    }

    /// Whether this category contributes to the rendered prompt.
    pub fn has_summary(&self) -> bool {
        self.usable_summary().is_some()
    }
}

/// Processing state of a submitted conversation on the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Accepted or still being summarized.
    Pending,
    /// Summaries for this submission are available.
    Completed,
    /// The remote store gave up on the task (failed or revoked).
    Failed,
    /// Status could not be determined.
    Unknown,
}

impl TaskStatus {
    /// Maps a remote status label (`PENDING`, `PROCESSING`, `SUCCESS`,
    /// `FAILURE`, `REVOKED`) to a task status. Matching is case-insensitive.
    pub fn from_remote(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "PENDING" | "PROCESSING" | "STARTED" | "RETRY" => Self::Pending,
            "SUCCESS" | "COMPLETED" => Self::Completed,
            "FAILURE" | "FAILED" | "REVOKED" => Self::Failed,
            _ => Self::Unknown,
        }
    }

    /// Whether the remote store will not change this status again.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One in-flight save-and-refresh cycle.
///
/// `id` is local and always present; `remote_id` is the identifier the
/// memory store returned, if any. Without a remote id the status cannot be
/// polled and the refresh goes straight to retrieval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionTask {
    pub id: Uuid,
    pub remote_id: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub status: TaskStatus,
}

impl SubmissionTask {
    pub fn new(remote_id: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            remote_id,
            submitted_at: Utc::now(),
            status: TaskStatus::Pending,
        }
    }
}
