//! Terminal chess client for the drawfish server.

#![warn(missing_docs)]

mod app;
mod client;
mod sync;
mod ui;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use app::{Action, App};
use client::{ApiClient, NetEvent, TurnReply};
use sync::{GameView, Submission};

/// Command line arguments for the terminal client.
#[derive(Parser)]
#[command(
    name = "drawfish_tui",
    about = "Terminal chess client for the drawfish server",
    version
)]
struct Cli {
    /// Base URL of the drawfish server
    #[arg(long, default_value = "http://127.0.0.1:5000")]
    server_url: String,

    /// Session name to play in
    #[arg(long, default_value = "default")]
    session: String,

    /// File that receives tracing output
    #[arg(long, default_value = "drawfish_tui.log")]
    log_file: std::path::PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Log to a file to avoid interfering with the TUI
    let log_file = std::fs::File::create(&cli.log_file)?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::sync::Arc::new(log_file))
        .with_ansi(false)
        .try_init(); // Don't panic if already initialized

    info!(server_url = %cli.server_url, session = %cli.session, "Starting drawfish TUI");

    let client = ApiClient::new(cli.server_url, cli.session.clone());

    // Join the session before entering the alternate screen, so a dead
    // server reports a plain error instead of a garbled terminal
    let fen = client.game().await?;
    let view = GameView::from_fen(&fen)?;
    let app = App::new(view, cli.session);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app, client).await;

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {}", err);
    }

    Ok(())
}

/// Draws frames, forwards key presses to the app, and dispatches the
/// network work it asks for.
async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    client: ApiClient,
) -> Result<()> {
    let (net_tx, mut net_rx) = mpsc::unbounded_channel();

    loop {
        terminal.draw(|f| ui::draw(f, &app))?;

        // Apply any finished network work
        while let Ok(event) = net_rx.try_recv() {
            app.handle_net(event);
        }

        // Check for keyboard input
        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                match app.handle_key(key.code) {
                    Action::Quit => return Ok(()),
                    Action::Submit(submission) => {
                        let client = client.clone();
                        let tx = net_tx.clone();
                        tokio::spawn(async move {
                            let result = submit_turn(&client, submission).await;
                            let _ = tx.send(NetEvent::Turn(result.map_err(|e| e.to_string())));
                        });
                    }
                    Action::Reset => {
                        let client = client.clone();
                        let tx = net_tx.clone();
                        tokio::spawn(async move {
                            let result = client.reset().await;
                            let _ = tx.send(NetEvent::Reset(result.map_err(|e| e.to_string())));
                        });
                    }
                    Action::None => {}
                }
            }
        }
    }
}

/// Plays one turn against the server.
///
/// Re-bases the server first when the move starts from a rewound position,
/// so the server plays from the position the player is looking at.
async fn submit_turn(client: &ApiClient, submission: Submission) -> Result<TurnReply> {
    if let Some(fen) = &submission.rebase {
        client.load(fen).await?;
    }
    client.send_move(&submission.mv).await
}
