//! Text console session.
//!
//! Stands in for the media engine: each stdin line is a finalized user
//! transcript, and replies come from the configured LLM provider using the
//! agent's live instructions. Session events are published exactly as the
//! media engine would publish them, so the memory coordinator cannot tell
//! the difference.

use recall_types::{ChatMessage, Role};
use recall_voice::{ChatClient, SessionEvent, VoiceAgent, VoiceError};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{error, info};

/// Runs the console session until `input` reaches end of file.
pub async fn run<R, W>(
    agent: &VoiceAgent,
    llm: &ChatClient,
    input: R,
    mut output: W,
    greeting: Option<&str>,
) -> Result<(), VoiceError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    info!(model = llm.model(), "console session started");
    let mut history: Vec<ChatMessage> = Vec::new();

    if let Some(greeting) = greeting {
        reply(agent, llm, &mut history, &mut output, Some(greeting)).await?;
    }

    let mut lines = input.lines();
    set_agent_state(agent, "listening");
    while let Some(line) = lines.next_line().await? {
        let text = line.trim();
        if text.is_empty() {
            continue;
        }

        agent.publish(SessionEvent::UserInputTranscribed {
            text: text.to_string(),
            is_final: true,
        });
        agent.publish(SessionEvent::user_item(text));
        history.push(ChatMessage::new(Role::User, text));

        reply(agent, llm, &mut history, &mut output, None).await?;
        set_agent_state(agent, "listening");
    }

    info!("console input closed");
    Ok(())
}

/// Generates one agent reply with the instructions in effect right now.
/// LLM failures are logged and the session continues without a reply.
async fn reply<W>(
    agent: &VoiceAgent,
    llm: &ChatClient,
    history: &mut Vec<ChatMessage>,
    output: &mut W,
    reply_instructions: Option<&str>,
) -> Result<(), VoiceError>
where
    W: AsyncWrite + Unpin,
{
    set_agent_state(agent, "thinking");
    let instructions = agent.instructions().text();

    match llm.complete(&instructions, history, reply_instructions).await {
        Ok(text) => {
            set_agent_state(agent, "speaking");
            output
                .write_all(format!("agent: {}\n", text).as_bytes())
                .await?;
            output.flush().await?;
            history.push(ChatMessage::new(Role::Agent, text.clone()));
            agent.publish(SessionEvent::agent_item(text));
        }
        Err(e) => {
            error!(error = %e, "failed to generate reply");
        }
    }
    Ok(())
}

fn set_agent_state(agent: &VoiceAgent, state: &str) {
    agent.publish(SessionEvent::AgentStateChanged {
        state: state.to_string(),
    });
}
