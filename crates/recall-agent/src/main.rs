//! Recall agent binary.
//!
//! Loads configuration, starts structured logging, and runs one voice
//! session over stdin/stdout until the input ends or SIGTERM/SIGINT arrives.

use recall_agent::config::load_config;
use recall_agent::{init_tracing, run_session};
use tokio::io::BufReader;

fn resolve_config_path() -> (Option<String>, &'static str) {
    if let Some(path) = std::env::args()
        .nth(1)
        .filter(|value| !value.trim().is_empty())
    {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var("RECALL_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

#[tokio::main]
async fn main() {
    let (resolved_config_path, config_source) = resolve_config_path();
    let selected_config_path = resolved_config_path.as_deref().or(Some("config.toml"));

    let config = load_config(selected_config_path)
        .expect("failed to load configuration, the agent cannot start without valid config");

    init_tracing(&config.logging);

    tracing::info!(
        source = config_source,
        path = selected_config_path.unwrap_or("<none>"),
        "resolved startup configuration path"
    );

    let input = BufReader::new(tokio::io::stdin());
    let output = tokio::io::stdout();

    if let Err(e) = run_session(&config, input, output, shutdown_signal()).await {
        tracing::error!(error = %e, "recall agent exited with an error");
        std::process::exit(1);
    }

    tracing::info!("recall agent shut down");
}

/// Waits for a SIGINT (Ctrl+C) or SIGTERM signal.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { tracing::info!("received SIGINT, closing session"); }
        () = terminate => { tracing::info!("received SIGTERM, closing session"); }
    }
}
