//! Application state and input handling.
//!
//! `App` owns the synchronised game view plus everything a frame needs: the
//! square cursor, the piece-selection state machine, and the status line.
//! Key handling never performs IO; it returns an [`Action`] and the event
//! loop dispatches the network work, feeding results back through
//! [`App::handle_net`].

use crate::client::NetEvent;
use crate::sync::{GameView, Submission, SyncError};
use crossterm::event::KeyCode;
use drawfish_game::{CoordMove, Role, Square};
use tracing::debug;

/// Where the player is in the pick-a-move flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputMode {
    /// Choosing which piece to move.
    SelectPiece,
    /// A piece is selected; choosing its destination.
    SelectTarget {
        /// The selected origin square.
        from: Square,
    },
    /// Waiting for a promotion piece letter.
    Promotion {
        /// The selected origin square.
        from: Square,
        /// The selected destination square.
        to: Square,
    },
}

/// What the event loop should do after a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Nothing to dispatch; state may still have changed.
    None,
    /// Exit the client.
    Quit,
    /// Send the staged move to the server.
    Submit(Submission),
    /// Ask the server for a fresh game.
    Reset,
}

/// Main application state.
pub struct App {
    view: GameView,
    cursor: Square,
    mode: InputMode,
    busy: bool,
    status: String,
    session: String,
}

impl App {
    /// Creates the client state around an already-synchronised view.
    pub fn new(view: GameView, session: impl Into<String>) -> Self {
        Self {
            view,
            cursor: Square::E2,
            mode: InputMode::SelectPiece,
            busy: false,
            status: "Select a piece with Enter, then its destination.".to_string(),
            session: session.into(),
        }
    }

    /// Gets the synchronised game view.
    pub fn view(&self) -> &GameView {
        &self.view
    }

    /// Gets the square the keyboard cursor is on.
    pub fn cursor(&self) -> Square {
        self.cursor
    }

    /// Gets the selected origin square, if a piece is selected.
    pub fn selected(&self) -> Option<Square> {
        match self.mode {
            InputMode::SelectPiece => None,
            InputMode::SelectTarget { from } | InputMode::Promotion { from, .. } => Some(from),
        }
    }

    /// True while a request against the server is outstanding.
    pub fn busy(&self) -> bool {
        self.busy
    }

    /// Gets the current status message.
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Gets the session name shown in the board title.
    pub fn session(&self) -> &str {
        &self.session
    }

    /// Handles a key press, returning what the event loop should dispatch.
    ///
    /// While a request is in flight every key except `q` is ignored, so the
    /// local board cannot drift from what the server was asked to play.
    pub fn handle_key(&mut self, code: KeyCode) -> Action {
        if self.busy {
            return match code {
                KeyCode::Char('q') => Action::Quit,
                _ => Action::None,
            };
        }

        // The promotion prompt wants letters that double as global bindings
        // (q, r), so it is resolved before anything else.
        if let InputMode::Promotion { from, to } = self.mode {
            return self.handle_promotion_key(code, from, to);
        }

        match code {
            KeyCode::Char('q') => Action::Quit,
            KeyCode::Left | KeyCode::Char('h') => {
                self.move_cursor(-1, 0);
                Action::None
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.move_cursor(1, 0);
                Action::None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.move_cursor(0, 1);
                Action::None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.move_cursor(0, -1);
                Action::None
            }
            KeyCode::Enter | KeyCode::Char(' ') => self.handle_select(),
            KeyCode::Esc => {
                self.mode = InputMode::SelectPiece;
                self.status = "Selection cleared.".to_string();
                Action::None
            }
            KeyCode::Char('u') => {
                if self.view.step_back().is_ok() {
                    self.mode = InputMode::SelectPiece;
                    self.status = self.rewind_status();
                }
                Action::None
            }
            KeyCode::Char('p') => {
                if self.view.step_forward().is_ok() {
                    self.mode = InputMode::SelectPiece;
                    self.status = self.rewind_status();
                }
                Action::None
            }
            KeyCode::Char('r') => {
                debug!("Requesting a new game");
                self.busy = true;
                self.status = "Starting a new game...".to_string();
                Action::Reset
            }
            _ => Action::None,
        }
    }

    /// Applies a network result delivered by the event loop.
    pub fn handle_net(&mut self, event: NetEvent) {
        debug!(?event, "Handling network event");
        self.busy = false;

        match event {
            NetEvent::Turn(Ok(reply)) => {
                match self.view.confirm(reply.bot_move.as_ref(), &reply.fen) {
                    Ok(bot_san) => self.status = self.turn_status(bot_san),
                    Err(e) => {
                        self.status =
                            format!("Out of sync with the server ({}). Press 'r' to restart.", e);
                    }
                }
            }
            NetEvent::Turn(Err(message)) => {
                self.view.abandon();
                self.status = format!("Move not played: {}", message);
            }
            NetEvent::Reset(Ok(_)) => {
                self.view.apply_reset();
                self.mode = InputMode::SelectPiece;
                self.cursor = Square::E2;
                self.status = "New game. White to move.".to_string();
            }
            NetEvent::Reset(Err(message)) => {
                self.status = format!("Reset failed: {}", message);
            }
        }
    }

    fn handle_select(&mut self) -> Action {
        match self.mode {
            InputMode::SelectPiece => {
                let board = self.view.board();
                match board.piece_at(self.cursor) {
                    Some(piece) if piece.color == board.turn() => {
                        self.mode = InputMode::SelectTarget { from: self.cursor };
                        self.status = format!("Selected {}. Pick a destination.", self.cursor);
                    }
                    _ => {
                        self.status = "No piece to move on that square.".to_string();
                    }
                }
                Action::None
            }
            InputMode::SelectTarget { from } => {
                let to = self.cursor;
                if to == from {
                    self.mode = InputMode::SelectPiece;
                    self.status = "Selection cleared.".to_string();
                    return Action::None;
                }
                if self.view.board().requires_promotion(from, to) {
                    self.mode = InputMode::Promotion { from, to };
                    self.status = "Promote to: [q]ueen, [r]ook, [b]ishop or k[n]ight.".to_string();
                    return Action::None;
                }
                self.submit(CoordMove::new(from, to))
            }
            // Resolved in handle_key before reaching here
            InputMode::Promotion { .. } => Action::None,
        }
    }

    fn handle_promotion_key(&mut self, code: KeyCode, from: Square, to: Square) -> Action {
        let role = match code {
            KeyCode::Char('q') => Role::Queen,
            KeyCode::Char('r') => Role::Rook,
            KeyCode::Char('b') => Role::Bishop,
            KeyCode::Char('n') => Role::Knight,
            KeyCode::Esc => {
                self.mode = InputMode::SelectPiece;
                self.status = "Promotion cancelled.".to_string();
                return Action::None;
            }
            _ => return Action::None,
        };
        self.submit(CoordMove::with_promotion(from, to, role))
    }

    fn submit(&mut self, mv: CoordMove) -> Action {
        self.mode = InputMode::SelectPiece;
        match self.view.submit(mv) {
            Ok(submission) => {
                debug!(mv = %mv, rebased = submission.rebase.is_some(), "Submitting move");
                self.busy = true;
                self.status = "Bot is thinking...".to_string();
                Action::Submit(submission)
            }
            Err(SyncError::GameOver) => {
                self.status = "The game is over. Press 'r' to restart or 'q' to quit.".to_string();
                Action::None
            }
            Err(e) => {
                self.status = format!("Move not played: {}", e);
                Action::None
            }
        }
    }

    fn move_cursor(&mut self, file_delta: i32, rank_delta: i32) {
        let file = self
            .cursor
            .file()
            .offset(file_delta)
            .unwrap_or(self.cursor.file());
        let rank = self
            .cursor
            .rank()
            .offset(rank_delta)
            .unwrap_or(self.cursor.rank());
        self.cursor = Square::from_coords(file, rank);
    }

    fn turn_status(&self, bot_san: Option<String>) -> String {
        if let Some(outcome) = self.view.board().outcome() {
            let ending = format!("Game over: {}. Press 'r' to restart or 'q' to quit.", outcome);
            return match bot_san {
                Some(san) => format!("Bot played {}. {}", san, ending),
                None => ending,
            };
        }
        match bot_san {
            Some(san) => format!("Bot played {}. Your move.", san),
            None => "Your move.".to_string(),
        }
    }

    fn rewind_status(&self) -> String {
        let timeline = self.view.timeline();
        if timeline.is_empty() {
            "No moves to review yet.".to_string()
        } else if timeline.at_latest() {
            "Back at the latest position.".to_string()
        } else {
            match timeline.cursor() {
                Some(i) => format!("Viewing ply {} of {}.", i + 1, timeline.len()),
                None => format!("Viewing the start (0 of {} plies).", timeline.len()),
            }
        }
    }
}
