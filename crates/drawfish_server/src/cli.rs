//! Command-line interface for the drawfish server.

use clap::{Parser, Subcommand};

/// drawfish - chess server backed by an external move oracle
#[derive(Parser, Debug)]
#[command(name = "drawfish_server")]
#[command(about = "Chess server backed by an external move oracle", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP game server
    Serve {
        /// Host to bind to (overrides the config file)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides the config file)
        #[arg(short, long)]
        port: Option<u16>,

        /// Path to the server configuration file
        #[arg(short, long, default_value = "drawfish.toml")]
        config: std::path::PathBuf,
    },

    /// Run the configured oracle once against a position and print its move
    Probe {
        /// Path to the server configuration file
        #[arg(short, long, default_value = "drawfish.toml")]
        config: std::path::PathBuf,

        /// Position to probe, as FEN (defaults to the start position)
        #[arg(long)]
        fen: Option<String>,
    },
}
