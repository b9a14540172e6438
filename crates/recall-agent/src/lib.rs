//! Recall voice agent runtime.
//!
//! Wires configuration, the memory store, and the voice session together:
//! the agent starts with whatever the store already knows about the user,
//! and the memory coordinator keeps that knowledge current while the
//! session runs.

pub mod bridge;
pub mod config;
pub mod console;

use config::{Config, ConfigError, LoggingConfig, SessionMode};
use recall_types::SessionIdentity;
use recall_voice::{
    ChatClient, MemoryCoordinator, PipelineConfig, SessionEvent, VoiceAgent, VoiceError,
};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncWrite};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("voice session error: {0}")]
    Voice(#[from] VoiceError),
}

/// Installs the global tracing subscriber. Logs go to stderr so stdout stays
/// free for the session's own output.
pub fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_new(&logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Identity of the session described by `config`.
pub fn session_identity(config: &Config) -> SessionIdentity {
    SessionIdentity::from_room(
        &config.session.room,
        &config.memory.user_name,
        &config.session.agent_id,
        &config.memory.agent_name,
    )
}

fn log_pipeline(pipeline: &PipelineConfig) {
    let (tts_base_url, tts_api_key) = pipeline.tts_credentials();
    info!(
        stt_model = %pipeline.stt.model,
        stt_language = %pipeline.stt.language,
        stt_key_set = !pipeline.stt.api_key.is_empty(),
        llm_model = %pipeline.llm.model,
        llm_base_url = %pipeline.llm.base_url,
        llm_key_set = !pipeline.llm.api_key.is_empty(),
        tts_model = %pipeline.tts.model,
        tts_voice = %pipeline.tts.voice,
        tts_base_url,
        tts_key_set = !tts_api_key.is_empty(),
        vad = %pipeline.vad,
        turn_detection = %pipeline.turn_detection,
        "voice pipeline configuration"
    );
}

/// Runs one voice session from start to finish.
///
/// `input` and `output` carry the session engine's traffic: typed lines in
/// console mode, JSON lines in bridge mode. The session ends when `input`
/// is exhausted or `shutdown` resolves. The final memory submission is
/// awaited for at most `session.shutdown_grace_seconds`.
pub async fn run_session<R, W, S>(
    config: &Config,
    input: R,
    output: W,
    shutdown: S,
) -> Result<(), AgentError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    S: Future<Output = ()>,
{
    config.validate()?;

    let identity = session_identity(config);
    info!(
        room = %config.session.room,
        user_id = %identity.user_id,
        agent_id = %identity.agent_id,
        mode = ?config.session.mode,
        "starting voice session"
    );
    log_pipeline(&config.pipeline);

    let store = recall_memory::connect(&config.memory);
    let agent = VoiceAgent::bootstrap(
        identity.clone(),
        &config.session.instructions,
        &config.coordinator.memory_header,
        store.as_ref(),
    )
    .await;

    let coordinator = MemoryCoordinator::new(
        store,
        agent.instructions().clone(),
        identity,
        &config.coordinator,
    );
    let coordinator_task = tokio::spawn(coordinator.run(agent.event_feed()));

    let greeting = Some(config.session.greeting.as_str()).filter(|g| !g.trim().is_empty());

    let (result, reason) = tokio::select! {
        result = run_engine(config, &agent, input, output, greeting) => (result, "session ended"),
        () = shutdown => (Ok(()), "shutdown"),
    };
    if let Err(e) = &result {
        error!(error = %e, "voice session failed");
    }

    // A close already relayed by the engine makes this one a no-op.
    agent.publish(SessionEvent::Close {
        reason: Some(reason.to_string()),
    });

    match coordinator_task.await {
        Ok(Some(final_flush)) => {
            let grace = Duration::from_secs(config.session.shutdown_grace_seconds);
            if tokio::time::timeout(grace, final_flush).await.is_err() {
                warn!(
                    grace_seconds = config.session.shutdown_grace_seconds,
                    "final memory submission did not finish before shutdown"
                );
            }
        }
        Ok(None) => {}
        Err(e) => error!(error = %e, "memory coordinator task failed"),
    }

    info!("voice session finished");
    result
}

async fn run_engine<R, W>(
    config: &Config,
    agent: &VoiceAgent,
    input: R,
    output: W,
    greeting: Option<&str>,
) -> Result<(), AgentError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    match config.session.mode {
        SessionMode::Console => {
            let llm = ChatClient::new(&config.pipeline.llm)?;
            console::run(agent, &llm, input, output, greeting).await?;
        }
        SessionMode::Bridge => bridge::run(agent, input, output, greeting).await?,
    }
    Ok(())
}
