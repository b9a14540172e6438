//! Shared types for the Recall voice agent.
//!
//! This crate holds the plain data passed between the memory store client,
//! the coordination core and the agent binary: conversation roles and
//! utterances, completed turns, the role/content messages submitted to the
//! memory store, and the agent's system prompt.
//!
//! Nothing here performs I/O. Memory-store shapes live in [`memory`].

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub mod memory;

pub use memory::{MemoryCategory, SubmissionTask, TaskStatus};

/// Which side of the conversation produced an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// The human speaking to the agent.
    #[serde(rename = "user")]
    User,
    /// The voice agent. Serialized as `assistant` on the wire.
    #[serde(rename = "assistant")]
    Agent,
}

impl Role {
    /// Returns the wire label for this role.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Agent => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a role label is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown conversation role: {0}")]
pub struct ParseRoleError(pub String);

impl std::str::FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "assistant" | "agent" => Ok(Self::Agent),
            _ => Err(ParseRoleError(s.to_string())),
        }
    }
}

/// A finalized piece of speech, either transcribed from the user or
/// generated by the agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub role: Role,
    pub text: String,
}

impl Utterance {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn agent(text: impl Into<String>) -> Self {
        Self {
            role: Role::Agent,
            text: text.into(),
        }
    }
}

/// One user utterance answered by one agent utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub user: String,
    pub agent: String,
}

impl Turn {
    /// Flattens the turn into the two role/content messages the memory
    /// store expects, user first.
    pub fn into_messages(self) -> [ChatMessage; 2] {
        [
            ChatMessage::new(Role::User, self.user),
            ChatMessage::new(Role::Agent, self.agent),
        ]
    }
}

/// A role/content pair as submitted to the memory store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// User id used when the session carries no room name.
pub const DEFAULT_USER_ID: &str = "default_user";

/// Who is talking to whom in a session. Memories are keyed by
/// `(user_id, agent_id)`; the names are display labels sent with submissions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    pub user_id: String,
    pub user_name: String,
    pub agent_id: String,
    pub agent_name: String,
}

impl SessionIdentity {
    /// Derives the identity from the session's room name. An empty room
    /// falls back to [`DEFAULT_USER_ID`].
    pub fn from_room(
        room: &str,
        user_name: impl Into<String>,
        agent_id: impl Into<String>,
        agent_name: impl Into<String>,
    ) -> Self {
        let room = room.trim();
        Self {
            user_id: if room.is_empty() {
                DEFAULT_USER_ID.to_string()
            } else {
                room.to_string()
            },
            user_name: user_name.into(),
            agent_id: agent_id.into(),
            agent_name: agent_name.into(),
        }
    }
}

/// The agent's system prompt.
///
/// `base` is fixed for the lifetime of the agent. `memory_appendix` is
/// derived from retrieved memory summaries and is always replaced as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SystemPrompt {
    pub base: String,
    pub memory_appendix: String,
}

impl SystemPrompt {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            memory_appendix: String::new(),
        }
    }

    /// Returns a prompt with the same base and the given appendix.
    pub fn with_appendix(&self, memory_appendix: impl Into<String>) -> Self {
        Self {
            base: self.base.clone(),
            memory_appendix: memory_appendix.into(),
        }
    }

    /// Whether any memory summaries are currently part of the prompt.
    pub fn has_memories(&self) -> bool {
        !self.memory_appendix.is_empty()
    }

    /// The full instruction text handed to the language model.
    pub fn text(&self) -> String {
        let mut text = String::with_capacity(self.base.len() + self.memory_appendix.len());
        text.push_str(&self.base);
        text.push_str(&self.memory_appendix);
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_labels_parse() {
        assert_eq!("user".parse::<Role>(), Ok(Role::User));
        assert_eq!("assistant".parse::<Role>(), Ok(Role::Agent));
        assert_eq!("agent".parse::<Role>(), Ok(Role::Agent));
        assert_eq!(
            "system".parse::<Role>(),
            Err(ParseRoleError("system".to_string()))
        );
    }

    #[test]
    fn chat_message_uses_assistant_label() {
        let json = serde_json::to_value(ChatMessage::new(Role::Agent, "hi")).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["content"], "hi");
    }

    #[test]
    fn turn_flattens_user_first() {
        let turn = Turn {
            user: "你好".to_string(),
            agent: "你好，有什么可以帮您".to_string(),
        };
        let [first, second] = turn.into_messages();
        assert_eq!(first.role, Role::User);
        assert_eq!(first.content, "你好");
        assert_eq!(second.role, Role::Agent);
        assert_eq!(second.content, "你好，有什么可以帮您");
    }

    #[test]
    fn identity_uses_room_name() {
        let identity = SessionIdentity::from_room("room-7", "u", "agent-1", "a");
        assert_eq!(identity.user_id, "room-7");
        assert_eq!(identity.agent_id, "agent-1");

        let fallback = SessionIdentity::from_room("  ", "u", "agent-1", "a");
        assert_eq!(fallback.user_id, DEFAULT_USER_ID);
    }

    #[test]
    fn system_prompt_replaces_appendix() {
        let prompt = SystemPrompt::new("base");
        assert!(!prompt.has_memories());
        assert_eq!(prompt.text(), "base");

        let refreshed = prompt.with_appendix("\n\nA");
        assert_eq!(refreshed.text(), "base\n\nA");

        let again = refreshed.with_appendix("\n\nB");
        assert_eq!(again.text(), "base\n\nB");
        assert_eq!(again.base, "base");
    }
}
