//! Voice session coordination for the Recall agent.
//!
//! The speech pipeline (transport, STT, LLM, TTS, VAD) runs in an external
//! session engine. This crate consumes that engine's event stream and keeps
//! the agent's long-term memory current:
//!
//! - [`TurnAccumulator`] pairs finalized user and agent utterances into turns.
//! - [`MemoryCoordinator`] buffers turns and, once a threshold is reached,
//!   hands a snapshot to the memory store on a background task.
//! - [`PromptRefresher`] waits for the store to summarize the submission and
//!   swaps the fresh summaries into the agent's live [`AgentInstructions`].
//!
//! Nothing on the event path waits on the network. Memory failures are
//! logged and absorbed; the voice session always continues.

pub mod accumulator;
pub mod agent;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod event;
pub mod instructions;
pub mod llm;
pub mod refresher;

pub use accumulator::{AccumulatorState, ConversationBuffer, TurnAccumulator};
pub use agent::VoiceAgent;
pub use config::{
    CoordinatorConfig, LlmConfig, PipelineConfig, SttConfig, TtsConfig, DEFAULT_GREETING,
    DEFAULT_INSTRUCTIONS,
};
pub use coordinator::MemoryCoordinator;
pub use error::VoiceError;
pub use event::SessionEvent;
pub use instructions::AgentInstructions;
pub use llm::ChatClient;
pub use refresher::{PromptRefresher, RefreshOutcome, RefreshPolicy, RefreshState};
