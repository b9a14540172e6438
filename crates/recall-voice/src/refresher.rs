//! Post-submission refresh of the agent's memory appendix.

use crate::config::CoordinatorConfig;
use crate::instructions::AgentInstructions;
use recall_memory::{render_appendix, retrieve, MemoryError, MemoryStore};
use recall_types::{SubmissionTask, TaskStatus};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Where a refresh cycle is. Cycles only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Dispatched,
    Polling,
    Retrieving,
    PromptUpdated,
    Exhausted,
}

/// How a refresh cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The prompt now carries summaries from this many categories.
    PromptUpdated { categories: usize },
    /// No usable summaries appeared; the prompt was left untouched.
    Exhausted,
}

#[derive(Debug, Clone)]
pub struct RefreshPolicy {
    pub poll_attempts: u32,
    pub poll_interval: Duration,
    pub retrieve_attempts: u32,
    pub retrieve_interval: Duration,
    pub memory_header: String,
}

impl From<&CoordinatorConfig> for RefreshPolicy {
    fn from(config: &CoordinatorConfig) -> Self {
        Self {
            poll_attempts: config.poll_attempts,
            poll_interval: config.poll_interval(),
            retrieve_attempts: config.retrieve_attempts,
            retrieve_interval: config.retrieve_interval(),
            memory_header: config.memory_header.clone(),
        }
    }
}

/// Waits for the memory store to summarize a submission, then rewrites the
/// agent's memory appendix with the fresh summaries.
///
/// First polls the task status (when the store supports it and the
/// submission has a remote id) until it reports completion, then retrieves
/// the memory set until some category carries a summary. Each attempt is
/// separated by a fixed delay. Cycles are independent; when several run at
/// once the last one to finish decides the prompt.
#[derive(Clone)]
pub struct PromptRefresher {
    store: Arc<dyn MemoryStore>,
    instructions: AgentInstructions,
    user_id: String,
    agent_id: String,
    policy: RefreshPolicy,
}

impl PromptRefresher {
    pub fn new(
        store: Arc<dyn MemoryStore>,
        instructions: AgentInstructions,
        user_id: impl Into<String>,
        agent_id: impl Into<String>,
        policy: RefreshPolicy,
    ) -> Self {
        Self {
            store,
            instructions,
            user_id: user_id.into(),
            agent_id: agent_id.into(),
            policy,
        }
    }

    pub async fn run(&self, mut task: SubmissionTask) -> RefreshOutcome {
        let mut state = RefreshState::Dispatched;
        debug!(cycle = %task.id, remote_id = ?task.remote_id, ?state, "refresh cycle started");

        if let Some(remote_id) = task.remote_id.clone() {
            if self.store.supports_task_status() {
                state = RefreshState::Polling;
                debug!(cycle = %task.id, ?state, "polling task status");
                task.status = self.poll(&remote_id).await;
            }
        }

        state = RefreshState::Retrieving;
        if task.status == TaskStatus::Completed {
            info!(cycle = %task.id, ?state, "memory task completed, retrieving summaries");
        } else {
            info!(
                cycle = %task.id,
                status = %task.status,
                ?state,
                "task not confirmed complete, falling back to direct retrieval"
            );
        }

        let outcome = self.retrieve_until_summarized().await;
        state = match outcome {
            RefreshOutcome::PromptUpdated { .. } => RefreshState::PromptUpdated,
            RefreshOutcome::Exhausted => RefreshState::Exhausted,
        };

        match outcome {
            RefreshOutcome::PromptUpdated { categories } => info!(
                cycle = %task.id,
                categories,
                ?state,
                "agent instructions refreshed with new memories"
            ),
            RefreshOutcome::Exhausted => warn!(
                cycle = %task.id,
                ?state,
                "no memory summaries available, keeping previous instructions"
            ),
        }
        outcome
    }

    /// Polls until the task reaches a terminal status or attempts run out.
    async fn poll(&self, remote_id: &str) -> TaskStatus {
        let mut status = TaskStatus::Unknown;

        for attempt in 1..=self.policy.poll_attempts {
            match self.store.task_status(remote_id).await {
                Ok(current) => {
                    status = current;
                    debug!(
                        task_id = remote_id,
                        attempt,
                        max_attempts = self.policy.poll_attempts,
                        %status,
                        "task status"
                    );
                    if status.is_terminal() {
                        if status == TaskStatus::Failed {
                            warn!(task_id = remote_id, "memory task failed on the store");
                        }
                        return status;
                    }
                }
                Err(MemoryError::StatusUnsupported) | Err(MemoryError::Disabled) => {
                    return TaskStatus::Unknown;
                }
                Err(e) => {
                    status = TaskStatus::Unknown;
                    warn!(task_id = remote_id, attempt, error = %e, "task status check failed");
                }
            }

            if attempt < self.policy.poll_attempts {
                sleep(self.policy.poll_interval).await;
            }
        }

        warn!(
            task_id = remote_id,
            attempts = self.policy.poll_attempts,
            "task status polling exhausted"
        );
        status
    }

    async fn retrieve_until_summarized(&self) -> RefreshOutcome {
        for attempt in 1..=self.policy.retrieve_attempts {
            let categories = retrieve(self.store.as_ref(), &self.user_id, &self.agent_id).await;
            let summarized = categories.iter().filter(|c| c.has_summary()).count();

            if summarized > 0 {
                let appendix = render_appendix(&self.policy.memory_header, &categories);
                self.instructions.replace_appendix(appendix);
                return RefreshOutcome::PromptUpdated {
                    categories: summarized,
                };
            }

            debug!(
                attempt,
                max_attempts = self.policy.retrieve_attempts,
                "no summaries yet"
            );
            if attempt < self.policy.retrieve_attempts {
                sleep(self.policy.retrieve_interval).await;
            }
        }
        RefreshOutcome::Exhausted
    }
}
