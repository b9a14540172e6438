#![allow(dead_code)]

use async_trait::async_trait;
use recall_memory::{MemoryError, MemoryStore, Submission};
use recall_types::{MemoryCategory, SessionIdentity, TaskStatus};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub const BASE: &str = "你是一个有用的语音人工智能助手。";

pub fn identity() -> SessionIdentity {
    SessionIdentity::from_room("room-1", "语音用户", "voice_assistant_001", "语音助手")
}

/// In-memory stand-in for the remote memory store.
pub struct MockStore {
    pub task_id: Option<String>,
    pub status_supported: bool,
    pub fail_memorize: bool,
    /// Number of leading status checks that fail with a transient error.
    pub status_errors: AtomicUsize,
    /// Statuses returned in order; `default_status` once drained.
    pub statuses: Mutex<VecDeque<TaskStatus>>,
    pub default_status: TaskStatus,
    /// Category sets returned in order; `default_categories` once drained.
    pub categories: Mutex<VecDeque<Vec<MemoryCategory>>>,
    pub default_categories: Vec<MemoryCategory>,
    /// When set, memorize waits for a notification before answering.
    pub gate: Option<Arc<Notify>>,

    pub submissions: Mutex<Vec<Submission>>,
    pub status_calls: AtomicUsize,
    pub retrieve_calls: AtomicUsize,
}

impl Default for MockStore {
    fn default() -> Self {
        Self {
            task_id: Some("task-1".to_string()),
            status_supported: true,
            fail_memorize: false,
            status_errors: AtomicUsize::new(0),
            statuses: Mutex::new(VecDeque::new()),
            default_status: TaskStatus::Pending,
            categories: Mutex::new(VecDeque::new()),
            default_categories: Vec::new(),
            gate: None,
            submissions: Mutex::new(Vec::new()),
            status_calls: AtomicUsize::new(0),
            retrieve_calls: AtomicUsize::new(0),
        }
    }
}

impl MockStore {
    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn retrieve_calls(&self) -> usize {
        self.retrieve_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MemoryStore for MockStore {
    async fn retrieve_default_categories(
        &self,
        _user_id: &str,
        _agent_id: &str,
    ) -> Result<Vec<MemoryCategory>, MemoryError> {
        self.retrieve_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.categories.lock().unwrap().pop_front();
        Ok(next.unwrap_or_else(|| self.default_categories.clone()))
    }

    async fn memorize_conversation(
        &self,
        submission: &Submission,
    ) -> Result<Option<String>, MemoryError> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.submissions.lock().unwrap().push(submission.clone());
        if self.fail_memorize {
            return Err(MemoryError::Status {
                status: 500,
                body: "internal error".to_string(),
            });
        }
        Ok(self.task_id.clone())
    }

    async fn task_status(&self, _task_id: &str) -> Result<TaskStatus, MemoryError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if self
            .status_errors
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(MemoryError::Status {
                status: 503,
                body: "service unavailable".to_string(),
            });
        }
        let next = self.statuses.lock().unwrap().pop_front();
        Ok(next.unwrap_or(self.default_status))
    }

    fn supports_task_status(&self) -> bool {
        self.status_supported
    }
}
