use crate::instructions::AgentInstructions;
use crate::event::SessionEvent;
use recall_memory::{render_appendix, retrieve, MemoryStore};
use recall_types::{SessionIdentity, SystemPrompt};
use std::sync::{Mutex, PoisonError};
use tokio::sync::{broadcast, mpsc};
use tracing::info;

/// Default capacity for the per-agent session event broadcast channel.
const DEFAULT_SESSION_EVENT_BROADCAST_CAPACITY: usize = 256;

/// The voice agent as seen by the session engine: who it is talking to,
/// its live instructions, and the channels its session events flow through.
///
/// Events go out two ways. The broadcast channel is bounded and may skip
/// events for a slow subscriber, which is fine for observers. Event feeds
/// are unbounded and lossless, for consumers that must see every event in
/// order (the memory coordinator).
#[derive(Debug)]
pub struct VoiceAgent {
    pub identity: SessionIdentity,
    instructions: AgentInstructions,
    events_tx: broadcast::Sender<SessionEvent>,
    feeds: Mutex<Vec<mpsc::UnboundedSender<SessionEvent>>>,
}

impl VoiceAgent {
    pub fn new(identity: SessionIdentity, prompt: SystemPrompt) -> Self {
        let (tx, _) = broadcast::channel(DEFAULT_SESSION_EVENT_BROADCAST_CAPACITY);
        Self {
            identity,
            instructions: AgentInstructions::new(prompt),
            events_tx: tx,
            feeds: Mutex::new(Vec::new()),
        }
    }

    /// Creates the agent with whatever the memory store already knows about
    /// this user folded into its instructions.
    ///
    /// Retrieval failures leave the base instructions unchanged.
    pub async fn bootstrap(
        identity: SessionIdentity,
        base_instructions: &str,
        memory_header: &str,
        store: &dyn MemoryStore,
    ) -> Self {
        info!(
            user_id = %identity.user_id,
            agent_id = %identity.agent_id,
            "loading long-term memory for session"
        );

        let categories = retrieve(store, &identity.user_id, &identity.agent_id).await;
        let prompt = SystemPrompt::new(base_instructions)
            .with_appendix(render_appendix(memory_header, &categories));

        if prompt.has_memories() {
            info!(
                prompt_chars = prompt.text().chars().count(),
                "memory summaries added to agent instructions"
            );
        } else {
            info!("no memory summaries available, using base instructions");
        }

        Self::new(identity, prompt)
    }

    pub fn instructions(&self) -> &AgentInstructions {
        &self.instructions
    }

    /// Publishes an event from the session engine to all feeds and
    /// subscribers. Never blocks.
    pub fn publish(&self, event: SessionEvent) {
        {
            let mut feeds = self.feeds.lock().unwrap_or_else(PoisonError::into_inner);
            feeds.retain(|feed| feed.send(event.clone()).is_ok());
        }
        // No subscribers is fine; the event is simply not observed.
        let _ = self.events_tx.send(event);
    }

    /// Opens a lossless feed of events published after this call.
    ///
    /// The feed ends once the agent is dropped and every buffered event has
    /// been received.
    pub fn event_feed(&self) -> mpsc::UnboundedReceiver<SessionEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.feeds
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    /// Subscribes to session events published after this call.
    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events_tx.subscribe()
    }
}
