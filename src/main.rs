use diarly::adapters::{LogMailer, MemoryIdentity, MemoryStore, SystemClock};

use std::sync::Arc;

mod cli;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let (config, addr) = match cli::run() {
        cli::RunOutcome::Serve(config, addr) => (config, addr),
        cli::RunOutcome::Exit(code) => std::process::exit(code),
    };

    let state = match diarly::AppState::new(
        config,
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryIdentity::new()),
        Arc::new(LogMailer),
        Arc::new(SystemClock),
    ) {
        Ok(state) => state,
        Err(err) => {
            eprintln!("error: invalid auth configuration: {err}");
            std::process::exit(2);
        }
    };

    tracing::info!(%addr, "listening");
    diarly::serve(addr, state).await;
}
