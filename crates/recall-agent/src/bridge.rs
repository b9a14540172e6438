//! JSON-lines bridge to an external session engine.
//!
//! The engine writes one [`SessionEvent`] per line to our stdin and reads
//! [`BridgeCommand`]s from our stdout: the agent's instructions whenever
//! they change, and a one-off request for the opening reply.

use recall_voice::{SessionEvent, VoiceAgent, VoiceError};
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

/// Messages sent back to the session engine.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeCommand<'a> {
    /// Replace the agent's active instructions with this text.
    InstructionsUpdated { instructions: &'a str },
    /// Generate a reply steered by these instructions.
    GenerateReply { instructions: &'a str },
}

async fn send<W>(output: &mut W, command: &BridgeCommand<'_>) -> Result<(), VoiceError>
where
    W: AsyncWrite + Unpin,
{
    let mut line = serde_json::to_string(command)?;
    line.push('\n');
    output.write_all(line.as_bytes()).await?;
    output.flush().await?;
    Ok(())
}

/// Relays engine events until the engine sends `close` or its stream ends.
pub async fn run<R, W>(
    agent: &VoiceAgent,
    input: R,
    mut output: W,
    greeting: Option<&str>,
) -> Result<(), VoiceError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut prompt_rx = agent.instructions().subscribe();
    let initial = prompt_rx.borrow_and_update().text();
    send(
        &mut output,
        &BridgeCommand::InstructionsUpdated {
            instructions: &initial,
        },
    )
    .await?;

    if let Some(greeting) = greeting {
        send(
            &mut output,
            &BridgeCommand::GenerateReply {
                instructions: greeting,
            },
        )
        .await?;
    }

    info!("bridge session started");
    let mut lines = input.lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("engine event stream ended");
                    return Ok(());
                };
                if line.trim().is_empty() {
                    continue;
                }
                match SessionEvent::parse(&line) {
                    Ok(event) => {
                        debug!(event = event.name(), "session event received");
                        let closing = matches!(event, SessionEvent::Close { .. });
                        agent.publish(event);
                        if closing {
                            return Ok(());
                        }
                    }
                    Err(VoiceError::UnsupportedEvent(kind)) => {
                        debug!(event = %kind, "skipping unsupported session event");
                    }
                    Err(e) => warn!(error = %e, "ignoring malformed session event"),
                }
            }
            Ok(()) = prompt_rx.changed() => {
                let text = prompt_rx.borrow_and_update().text();
                send(&mut output, &BridgeCommand::InstructionsUpdated { instructions: &text }).await?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recall_types::{SessionIdentity, SystemPrompt};
    use serde_json::Value;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

    fn agent() -> VoiceAgent {
        VoiceAgent::new(
            SessionIdentity::from_room("room-1", "u", "agent-1", "a"),
            SystemPrompt::new("base"),
        )
    }

    #[tokio::test]
    async fn forwards_events_and_stops_on_close() {
        let agent = agent();
        let mut events = agent.subscribe_events();
        let input = concat!(
            r#"{"type":"conversation_item_added","item":{"role":"user","content":["你好"]}}"#,
            "\n",
            "not json\n",
            r#"{"type":"metrics_collected","metrics":{"ttft":0.4}}"#,
            "\n",
            "\n",
            r#"{"type":"close","reason":"user_left"}"#,
            "\n",
            r#"{"type":"conversation_item_added","item":{"role":"user","content":"after close"}}"#,
            "\n",
        );
        let mut output = Vec::new();

        run(&agent, input.as_bytes(), &mut output, Some("greet"))
            .await
            .unwrap();

        assert_eq!(events.recv().await.unwrap(), SessionEvent::user_item("你好"));
        assert_eq!(
            events.recv().await.unwrap(),
            SessionEvent::Close {
                reason: Some("user_left".to_string())
            }
        );
        assert!(events.try_recv().is_err());

        let lines: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines[0]["type"], "instructions_updated");
        assert_eq!(lines[0]["instructions"], "base");
        assert_eq!(lines[1]["type"], "generate_reply");
        assert_eq!(lines[1]["instructions"], "greet");
    }

    #[tokio::test]
    async fn writes_instruction_updates() {
        let agent = agent();
        let (mut engine_in, bridge_in) = tokio::io::duplex(1024);
        let (bridge_out, engine_out) = tokio::io::duplex(1024);
        let instructions = agent.instructions().clone();

        let engine = async move {
            let mut reader = BufReader::new(engine_out).lines();
            let first: Value = serde_json::from_str(&reader.next_line().await.unwrap().unwrap()).unwrap();
            assert_eq!(first["instructions"], "base");

            instructions.replace_appendix("\n\nmemory".to_string());
            let second: Value = serde_json::from_str(&reader.next_line().await.unwrap().unwrap()).unwrap();
            assert_eq!(second["type"], "instructions_updated");
            assert_eq!(second["instructions"], "base\n\nmemory");

            engine_in.write_all(b"{\"type\":\"close\"}\n").await.unwrap();
        };

        let (result, ()) = tokio::join!(
            run(&agent, BufReader::new(bridge_in), bridge_out, None),
            engine
        );
        result.unwrap();
    }
}
