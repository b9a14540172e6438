//! Memory coordination for one voice session.

use crate::accumulator::{ConversationBuffer, TurnAccumulator};
use crate::config::CoordinatorConfig;
use crate::event::SessionEvent;
use crate::instructions::AgentInstructions;
use crate::refresher::{PromptRefresher, RefreshPolicy};
use recall_memory::store::preview;
use recall_memory::{MemoryError, MemoryStore, Submission};
use recall_types::{SessionIdentity, SubmissionTask, Utterance};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Messages previewed in the submission log.
const PREVIEW_MESSAGES: usize = 4;
const PREVIEW_CHARS: usize = 50;

/// Consumes session events, buffers completed turns and submits them to the
/// memory store in the background.
///
/// Owned by the task that processes the session's events, so the buffer is
/// only ever touched from one place. Network calls run on spawned tasks;
/// every `on_*` method returns without awaiting anything.
pub struct MemoryCoordinator {
    store: Arc<dyn MemoryStore>,
    identity: SessionIdentity,
    refresher: PromptRefresher,
    flush_threshold: usize,
    accumulator: TurnAccumulator,
    buffer: ConversationBuffer,
    in_flight: Arc<AtomicUsize>,
}

impl MemoryCoordinator {
    pub fn new(
        store: Arc<dyn MemoryStore>,
        instructions: AgentInstructions,
        identity: SessionIdentity,
        config: &CoordinatorConfig,
    ) -> Self {
        let refresher = PromptRefresher::new(
            store.clone(),
            instructions,
            identity.user_id.clone(),
            identity.agent_id.clone(),
            RefreshPolicy::from(config),
        );

        Self {
            store,
            identity,
            refresher,
            flush_threshold: config.flush_threshold.max(1),
            accumulator: TurnAccumulator::new(),
            buffer: ConversationBuffer::new(),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Messages waiting for the next submission.
    pub fn buffered_messages(&self) -> usize {
        self.buffer.len()
    }

    pub fn accumulator(&self) -> &TurnAccumulator {
        &self.accumulator
    }

    /// Submissions and refresh cycles that have not finished yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Handles one session event. Returns the background task when the
    /// event caused a submission.
    pub fn on_event(&mut self, event: SessionEvent) -> Option<JoinHandle<()>> {
        match event {
            SessionEvent::UserInputTranscribed { text, is_final } => {
                if self.accumulator.pending_user().is_some() {
                    debug!("transcript arrived while a user utterance is still unanswered");
                }
                info!(%text, is_final, "user input transcribed");
                None
            }
            SessionEvent::AgentStateChanged { state } => {
                info!(%state, "agent state changed");
                None
            }
            SessionEvent::UserStateChanged { state } => {
                info!(%state, "user state changed");
                None
            }
            SessionEvent::Close { reason } => self.close(reason.as_deref()),
            event @ SessionEvent::ConversationItemAdded { .. } => match event.utterance() {
                Some(utterance) => {
                    info!(role = %utterance.role, content = %utterance.text, "conversation item added");
                    self.on_utterance(utterance)
                }
                None => {
                    debug!("conversation item with blank content ignored");
                    None
                }
            },
        }
    }

    /// Feeds one finalized utterance through the accumulator.
    pub fn on_utterance(&mut self, utterance: Utterance) -> Option<JoinHandle<()>> {
        let turn = self.accumulator.push(utterance)?;
        self.buffer.push_turn(turn);
        debug!(
            buffered = self.buffer.len(),
            threshold = self.flush_threshold,
            "turn buffered"
        );

        if self.buffer.len() >= self.flush_threshold {
            self.flush(true)
        } else {
            None
        }
    }

    /// Submits everything buffered so far on a background task.
    ///
    /// The buffer is empty when this returns. With `refresh`, a successful
    /// submission is followed by a refresh cycle on the same task. Returns
    /// `None` when there was nothing to submit.
    pub fn flush(&mut self, refresh: bool) -> Option<JoinHandle<()>> {
        if self.buffer.is_empty() {
            return None;
        }

        let submission = Submission {
            conversation: self.buffer.take_snapshot(),
            user_id: self.identity.user_id.clone(),
            user_name: self.identity.user_name.clone(),
            agent_id: self.identity.agent_id.clone(),
            agent_name: self.identity.agent_name.clone(),
        };

        let store = self.store.clone();
        let refresher = refresh.then(|| self.refresher.clone());
        let guard = InFlight::enter(self.in_flight.clone());
        info!(
            messages = submission.conversation.len(),
            in_flight = guard.count(),
            "dispatching conversation to memory store"
        );

        Some(tokio::spawn(async move {
            let _guard = guard;
            submit(store.as_ref(), &submission, refresher).await;
        }))
    }

    /// Flushes whatever is left when the session ends. The returned task
    /// is not awaited here.
    pub fn close(&mut self, reason: Option<&str>) -> Option<JoinHandle<()>> {
        info!(reason = reason.unwrap_or("-"), "session closed");
        if self.buffer.is_empty() {
            return None;
        }
        info!(
            turns = self.buffer.turn_count(),
            "flushing remaining turns before teardown"
        );
        self.flush(false)
    }

    /// Processes events until the session closes or the engine goes away.
    ///
    /// Returns the final flush task, if the close produced one, so the
    /// caller can give it a chance to finish before the process exits.
    pub async fn run(
        mut self,
        mut events: mpsc::UnboundedReceiver<SessionEvent>,
    ) -> Option<JoinHandle<()>> {
        while let Some(event) = events.recv().await {
            if let SessionEvent::Close { .. } = event {
                return self.on_event(event);
            }
            self.on_event(event);
        }
        self.close(Some("event stream ended"))
    }
}

/// Sends one snapshot and, when asked, refreshes the prompt afterwards.
/// Failures are logged; the snapshot is not re-queued.
async fn submit(
    store: &dyn MemoryStore,
    submission: &Submission,
    refresher: Option<PromptRefresher>,
) {
    for (idx, message) in submission
        .conversation
        .iter()
        .take(PREVIEW_MESSAGES)
        .enumerate()
    {
        debug!(
            index = idx + 1,
            role = %message.role,
            content = %preview(&message.content, PREVIEW_CHARS),
            "submission message"
        );
    }

    match store.memorize_conversation(submission).await {
        Ok(remote_id) => {
            info!(
                user_id = %submission.user_id,
                agent_id = %submission.agent_id,
                task_id = remote_id.as_deref().unwrap_or("-"),
                messages = submission.conversation.len(),
                "conversation submitted to memory store"
            );
            if let Some(refresher) = refresher {
                refresher.run(SubmissionTask::new(remote_id)).await;
            }
        }
        Err(MemoryError::Disabled) => {
            warn!("memory store disabled, skipping conversation save");
        }
        Err(e) => {
            error!(
                error = %e,
                messages = submission.conversation.len(),
                "failed to save conversation, turns dropped"
            );
        }
    }
}

/// Counts a background task as in flight until dropped.
struct InFlight {
    counter: Arc<AtomicUsize>,
}

impl InFlight {
    fn enter(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self { counter }
    }

    fn count(&self) -> usize {
        self.counter.load(Ordering::SeqCst)
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        let remaining = self.counter.fetch_sub(1, Ordering::SeqCst) - 1;
        debug!(in_flight = remaining, "memory task finished");
    }
}
