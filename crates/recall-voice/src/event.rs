//! Events emitted by the live session engine.
//!
//! Engine payloads are decoded once, here, into [`SessionEvent`]. Anything
//! that does not match the expected shape is rejected with
//! [`VoiceError::InvalidEvent`]; callers log it and move on. Event types
//! this layer does not model are reported as
//! [`VoiceError::UnsupportedEvent`] so callers can skip them quietly.

use crate::error::VoiceError;
use recall_types::{Role, Utterance};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The STT provider produced a transcript of the user's speech.
    UserInputTranscribed { text: String, is_final: bool },
    /// A message was committed to the session's chat history.
    ConversationItemAdded { role: Role, content: String },
    AgentStateChanged { state: String },
    UserStateChanged { state: String },
    /// The session ended.
    Close { reason: Option<String> },
}

impl SessionEvent {
    pub fn user_item(content: impl Into<String>) -> Self {
        Self::ConversationItemAdded {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn agent_item(content: impl Into<String>) -> Self {
        Self::ConversationItemAdded {
            role: Role::Agent,
            content: content.into(),
        }
    }

    /// The finalized utterance carried by this event, if any. Items with
    /// blank content carry none.
    pub fn utterance(&self) -> Option<Utterance> {
        match self {
            Self::ConversationItemAdded { role, content } if !content.trim().is_empty() => {
                Some(Utterance {
                    role: *role,
                    text: content.clone(),
                })
            }
            _ => None,
        }
    }

    /// Wire label of the event, as used by the engine.
    pub fn name(&self) -> &'static str {
        match self {
            Self::UserInputTranscribed { .. } => "user_input_transcribed",
            Self::ConversationItemAdded { .. } => "conversation_item_added",
            Self::AgentStateChanged { .. } => "agent_state_changed",
            Self::UserStateChanged { .. } => "user_state_changed",
            Self::Close { .. } => "close",
        }
    }

    /// Decodes one engine payload.
    pub fn from_json(value: &Value) -> Result<Self, VoiceError> {
        if let Some(kind) = value.get("type").and_then(Value::as_str) {
            if !EVENT_TYPES.contains(&kind) {
                return Err(VoiceError::UnsupportedEvent(kind.to_string()));
            }
        }
        let raw: RawEvent = serde_json::from_value(value.clone())
            .map_err(|e| VoiceError::InvalidEvent(e.to_string()))?;
        raw.try_into()
    }

    pub fn parse(line: &str) -> Result<Self, VoiceError> {
        let value: Value =
            serde_json::from_str(line).map_err(|e| VoiceError::InvalidEvent(e.to_string()))?;
        Self::from_json(&value)
    }
}

const EVENT_TYPES: &[&str] = &[
    "user_input_transcribed",
    "conversation_item_added",
    "agent_state_changed",
    "user_state_changed",
    "close",
];

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RawEvent {
    UserInputTranscribed {
        #[serde(alias = "text")]
        transcript: String,
        #[serde(default = "default_is_final")]
        is_final: bool,
    },
    ConversationItemAdded {
        #[serde(default)]
        item: Option<RawChatItem>,
    },
    AgentStateChanged {
        #[serde(alias = "new_state")]
        state: String,
    },
    UserStateChanged {
        #[serde(alias = "new_state")]
        state: String,
    },
    Close {
        #[serde(default)]
        reason: Option<String>,
    },
}

fn default_is_final() -> bool {
    true
}

#[derive(Deserialize)]
struct RawChatItem {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    content: Option<RawContent>,
}

/// Chat content arrives either as one string or as a list of text parts.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawContent {
    Text(String),
    Parts(Vec<String>),
}

impl RawContent {
    fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Parts(parts) => parts.concat(),
        }
    }
}

impl TryFrom<RawEvent> for SessionEvent {
    type Error = VoiceError;

    fn try_from(raw: RawEvent) -> Result<Self, Self::Error> {
        Ok(match raw {
            RawEvent::UserInputTranscribed {
                transcript,
                is_final,
            } => Self::UserInputTranscribed {
                text: transcript,
                is_final,
            },
            RawEvent::ConversationItemAdded { item } => {
                let item = item.ok_or_else(|| {
                    VoiceError::InvalidEvent("conversation item has no chat message".to_string())
                })?;
                let role = item
                    .role
                    .ok_or_else(|| VoiceError::InvalidEvent("chat message has no role".to_string()))?;
                let role = role
                    .parse::<Role>()
                    .map_err(|e| VoiceError::InvalidEvent(e.to_string()))?;
                let content = item.content.ok_or_else(|| {
                    VoiceError::InvalidEvent(format!("chat message content is empty, role={role}"))
                })?;
                Self::ConversationItemAdded {
                    role,
                    content: content.into_text(),
                }
            }
            RawEvent::AgentStateChanged { state } => Self::AgentStateChanged { state },
            RawEvent::UserStateChanged { state } => Self::UserStateChanged { state },
            RawEvent::Close { reason } => Self::Close { reason },
        })
    }
}
