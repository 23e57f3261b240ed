//! drawfish server - chess against an external move oracle.

#![warn(missing_docs)]

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use drawfish_game::Board;
use drawfish_server::{AppState, MoveOracle, ServerConfig, router};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { host, port, config } => serve(host, port, config).await,
        Command::Probe { config, fen } => probe(config, fen).await,
    }
}

/// Run the HTTP game server
async fn serve(host: Option<String>, port: Option<u16>, config_path: PathBuf) -> Result<()> {
    let config = ServerConfig::load_or_default(&config_path)?;
    let host = host.unwrap_or_else(|| config.host().clone());
    let port = port.unwrap_or(*config.port());

    let oracle = config.oracle().build()?;
    info!(oracle = %oracle.describe(), timeout_ms = config.oracle().timeout_ms(), "Move oracle configured");

    let state = Arc::new(AppState::new(Arc::new(oracle)));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind((host.as_str(), port)).await?;
    info!("🚀 Backend running on http://{}:{}", host, port);
    info!("✅ Play with POST /api/move, inspect with GET /api/game");
    axum::serve(listener, app).await?;

    Ok(())
}

/// Run the configured oracle once and print its move
async fn probe(config_path: PathBuf, fen: Option<String>) -> Result<()> {
    let config = ServerConfig::load_or_default(&config_path)?;
    let oracle = config.oracle().build()?;
    info!(oracle = %oracle.describe(), "Probing move oracle");

    let board = match &fen {
        Some(fen) => Board::from_fen(fen)?,
        None => Board::default(),
    };

    let mv = oracle.best_move(&board.fen()).await?;
    let played = board.play(&mv)?;
    println!("{} ({})", mv, played.san);

    Ok(())
}
