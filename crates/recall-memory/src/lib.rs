//! Long-term memory for the Recall voice agent.
//!
//! Talks to a remote memory-summarization service that turns submitted
//! conversations into named categories per (user, agent) pair. The crate
//! provides:
//!
//! - [`MemoryStore`], the seam the coordinator depends on, with the HTTP
//!   implementation [`MemuClient`] and the no-op [`DisabledStore`] used when
//!   no credentials are configured.
//! - [`retrieve`], which never fails: any store error degrades to an empty
//!   category list.
//! - [`render`], the pure function that folds category summaries into the
//!   agent's system prompt.

pub mod client;
pub mod config;
pub mod error;
pub mod prompt;
pub mod store;
pub mod wire;

pub use client::MemuClient;
pub use config::{MemoryConfig, DEFAULT_MEMU_BASE_URL};
pub use error::MemoryError;
pub use prompt::{render, render_appendix, render_with_header, DEFAULT_MEMORY_HEADER};
pub use store::{connect, retrieve, DisabledStore, MemoryStore, Submission};
