// src/main.rs
use anyhow::Context;
use rhino_bridger::config::load_config;
use rhino_bridger::results::JsonlResultSink;
use rhino_bridger::Orchestrator;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = load_config(&config_path)
        .await
        .with_context(|| format!("loading {config_path}"))?;

    let sink = Arc::new(JsonlResultSink::new("results.jsonl"));
    Orchestrator::new(config, sink).run().await;

    Ok(())
}
