//! Pairs utterances into turns and buffers them until submission.

use recall_types::{ChatMessage, Role, Turn, Utterance};
use tracing::debug;

/// Progress of the turn currently being assembled.
///
/// A turn completes the moment an agent utterance arrives in
/// `UserPending`; the accumulator then returns to `Empty`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AccumulatorState {
    #[default]
    Empty,
    UserPending(String),
}

/// Forms [`Turn`]s from the session's finalized utterances.
///
/// Never fails. A user utterance replaces any user utterance still waiting
/// for a reply, and an agent utterance with nothing to answer is dropped.
#[derive(Debug, Default)]
pub struct TurnAccumulator {
    state: AccumulatorState,
}

impl TurnAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &AccumulatorState {
        &self.state
    }

    pub fn pending_user(&self) -> Option<&str> {
        match &self.state {
            AccumulatorState::UserPending(text) => Some(text),
            AccumulatorState::Empty => None,
        }
    }

    /// Feeds one utterance in arrival order. Returns the completed turn, if
    /// this utterance completed one.
    pub fn push(&mut self, utterance: Utterance) -> Option<Turn> {
        match utterance.role {
            Role::User => {
                if let AccumulatorState::UserPending(previous) = &self.state {
                    // TODO: confirm with product whether unanswered user
                    // utterances should be queued instead of replaced.
                    debug!(
                        dropped = %previous,
                        "replacing unanswered user utterance"
                    );
                }
                self.state = AccumulatorState::UserPending(utterance.text);
                None
            }
            Role::Agent => match std::mem::take(&mut self.state) {
                AccumulatorState::UserPending(user) => Some(Turn {
                    user,
                    agent: utterance.text,
                }),
                AccumulatorState::Empty => {
                    debug!("agent utterance without a pending user utterance, no turn formed");
                    None
                }
            },
        }
    }
}

/// Turns accumulated since the last submission, flattened to role/content
/// messages in arrival order.
#[derive(Debug, Default)]
pub struct ConversationBuffer {
    messages: Vec<ChatMessage>,
}

impl ConversationBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_turn(&mut self, turn: Turn) {
        self.messages.extend(turn.into_messages());
    }

    /// Number of buffered messages (two per turn).
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn turn_count(&self) -> usize {
        self.messages.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Moves the buffered messages out, leaving the buffer empty.
    ///
    /// The snapshot is taken before the buffer is cleared, in one step, so
    /// turns pushed afterwards belong to the next snapshot.
    pub fn take_snapshot(&mut self) -> Vec<ChatMessage> {
        std::mem::take(&mut self.messages)
    }
}
