//! Game sessions and the turn transaction.
//!
//! A session owns one live game. Turns are transactional: the player move
//! and the oracle reply are applied to a scratch board and installed
//! together at a single commit point, so a failed oracle never leaves a
//! half-played turn behind.

use crate::oracle::{MoveOracle, OracleError};
use derive_getters::Getters;
use derive_more::Display;
use drawfish_game::{Board, CoordMove, FenError, Outcome};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Unique identifier for a game session.
pub type SessionId = String;

/// Handle to a session, locked for the duration of a turn.
pub type SharedSession = Arc<tokio::sync::Mutex<GameSession>>;

/// One live game.
#[derive(Debug, Clone, Getters)]
pub struct GameSession {
    /// Session identifier.
    id: SessionId,
    /// Current position.
    board: Board,
    /// Plies committed since the session base position.
    plies: u32,
    /// When the session was created or last reset.
    started: Instant,
}

impl GameSession {
    /// Creates a session at the standard start position.
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            board: Board::default(),
            plies: 0,
            started: Instant::now(),
        }
    }

    /// FEN of the current position.
    pub fn fen(&self) -> String {
        self.board.fen()
    }

    /// Plays one full turn: the player move, then the oracle reply.
    ///
    /// The session position only changes at the commit points below; every
    /// error path leaves it exactly as it was.
    #[instrument(skip(self, oracle), fields(session = %self.id, mv = %mv))]
    pub async fn play_turn(
        &mut self,
        mv: &CoordMove,
        oracle: &dyn MoveOracle,
    ) -> Result<TurnOutcome, TurnError> {
        if self.board.is_game_over() {
            debug!("Rejecting move, game already over");
            return Err(TurnError::GameOver);
        }

        let human = self.board.play(mv).map_err(|_| {
            debug!("Rejecting illegal player move");
            TurnError::IllegalMove(*mv)
        })?;

        if human.board.is_game_over() {
            let outcome = human.board.outcome();
            info!(san = %human.san, outcome = ?outcome, "Player move ended the game");
            self.board = human.board;
            self.plies += 1;
            return Ok(TurnOutcome {
                fen: self.board.fen(),
                human_san: human.san,
                oracle_move: None,
                oracle_san: None,
                outcome,
            });
        }

        let reply = oracle.best_move(&human.board.fen()).await.map_err(|e| {
            warn!(error = %e, "Oracle failed, rolling back player move");
            TurnError::Oracle(e)
        })?;

        let replied = human.board.play(&reply).map_err(|_| {
            warn!(%reply, "Oracle chose an illegal move, rolling back player move");
            TurnError::OracleMoveIllegal(reply)
        })?;

        // Sole commit point for a full turn: both plies or neither.
        self.board = replied.board;
        self.plies += 2;
        let outcome = self.board.outcome();
        info!(
            human_san = %human.san,
            oracle_san = %replied.san,
            plies = self.plies,
            "Turn committed"
        );
        Ok(TurnOutcome {
            fen: self.board.fen(),
            human_san: human.san,
            oracle_move: Some(reply),
            oracle_san: Some(replied.san),
            outcome,
        })
    }

    /// Puts the session back at the standard start position.
    #[instrument(skip(self), fields(session = %self.id))]
    pub fn reset(&mut self) -> String {
        info!(plies = self.plies, elapsed = ?self.started.elapsed(), "Resetting session");
        self.board = Board::default();
        self.plies = 0;
        self.started = Instant::now();
        self.board.fen()
    }

    /// Replaces the session position with an arbitrary FEN.
    #[instrument(skip(self, fen), fields(session = %self.id))]
    pub fn load(&mut self, fen: &str) -> Result<String, FenError> {
        let board = Board::from_fen(fen)?;
        info!(fen = %board.fen(), "Loading position into session");
        self.board = board;
        self.plies = 0;
        self.started = Instant::now();
        Ok(self.board.fen())
    }
}

/// Result of a committed turn.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct TurnOutcome {
    /// FEN after every committed ply of the turn.
    fen: String,
    /// SAN of the player's move.
    human_san: String,
    /// The oracle's reply, absent when the player's move ended the game.
    oracle_move: Option<CoordMove>,
    /// SAN of the oracle's reply.
    oracle_san: Option<String>,
    /// Game result, if the turn ended the game.
    outcome: Option<Outcome>,
}

/// Ways a turn can fail.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum TurnError {
    /// The game already ended; reset or load to continue.
    #[display("Game over")]
    GameOver,
    /// The player's move is not legal in the current position.
    #[display("Invalid move by player: {}", _0)]
    IllegalMove(CoordMove),
    /// The oracle failed to produce a move.
    #[display("Oracle failure: {}", _0)]
    Oracle(OracleError),
    /// The oracle produced a move that is illegal in the position.
    #[display("Oracle move is illegal: {}", _0)]
    OracleMoveIllegal(CoordMove),
}

impl std::error::Error for TurnError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Oracle(e) => Some(e),
            _ => None,
        }
    }
}

/// Registry of live sessions keyed by id.
///
/// The outer mutex guards only map access; each session carries its own
/// async lock that is held across the oracle await, so turns for one
/// session serialize while distinct sessions proceed in parallel.
#[derive(Debug, Clone, Default)]
pub struct SessionManager {
    sessions: Arc<Mutex<HashMap<SessionId, SharedSession>>>,
}

impl SessionManager {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the session for `id`, creating it at the start position on
    /// first use.
    pub fn get_or_create(&self, id: &str) -> SharedSession {
        let mut sessions = self.sessions.lock().unwrap();
        sessions
            .entry(id.to_string())
            .or_insert_with(|| {
                info!(session = id, "Creating new session");
                Arc::new(tokio::sync::Mutex::new(GameSession::new(id.to_string())))
            })
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::ScriptedOracle;
    use drawfish_game::START_FEN;
    use std::time::Duration;

    fn mv(s: &str) -> CoordMove {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_full_turn_commits_both_plies() {
        let mut session = GameSession::new("t".to_string());
        let oracle = ScriptedOracle::replying(&["e7e5"]);

        let outcome = session.play_turn(&mv("e2e4"), &oracle).await.unwrap();

        assert_eq!(
            outcome.fen(),
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2"
        );
        assert_eq!(outcome.human_san(), "e4");
        assert_eq!(
            outcome.oracle_move().as_ref().map(|m| m.to_string()),
            Some("e7e5".to_string())
        );
        assert_eq!(outcome.oracle_san().as_deref(), Some("e5"));
        assert!(outcome.outcome().is_none());
        assert_eq!(*session.plies(), 2);
        assert_eq!(session.fen(), *outcome.fen());
    }

    #[tokio::test]
    async fn test_illegal_player_move_changes_nothing() {
        let mut session = GameSession::new("t".to_string());
        let oracle = ScriptedOracle::replying(&["e7e5"]);

        let err = session.play_turn(&mv("e2e5"), &oracle).await.unwrap_err();

        assert!(matches!(err, TurnError::IllegalMove(_)));
        assert_eq!(session.fen(), START_FEN);
        assert_eq!(*session.plies(), 0);
        assert_eq!(oracle.calls(), 0);
    }

    #[tokio::test]
    async fn test_finished_game_rejects_moves_before_legality() {
        let mut session = GameSession::new("t".to_string());
        session
            .load("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3")
            .unwrap();
        let oracle = ScriptedOracle::replying(&["e7e5"]);

        let err = session.play_turn(&mv("e2e3"), &oracle).await.unwrap_err();

        assert!(matches!(err, TurnError::GameOver));
        assert_eq!(oracle.calls(), 0);
    }

    #[tokio::test]
    async fn test_mating_player_move_skips_the_oracle() {
        let mut session = GameSession::new("t".to_string());
        session
            .load("r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4")
            .unwrap();
        let oracle = ScriptedOracle::replying(&["e7e5"]);

        let outcome = session.play_turn(&mv("h5f7"), &oracle).await.unwrap();

        assert_eq!(outcome.human_san(), "Qxf7#");
        assert!(outcome.oracle_move().is_none());
        assert!(outcome.oracle_san().is_none());
        assert!(matches!(
            outcome.outcome(),
            Some(Outcome::Checkmate { winner }) if winner == &drawfish_game::Color::White
        ));
        assert_eq!(oracle.calls(), 0);
        assert_eq!(*session.plies(), 1);
    }

    #[tokio::test]
    async fn test_oracle_error_rolls_back_the_player_move() {
        let mut session = GameSession::new("t".to_string());
        let oracle = ScriptedOracle::failing(OracleError::TimedOut {
            timeout: Duration::from_millis(100),
        });

        let err = session.play_turn(&mv("e2e4"), &oracle).await.unwrap_err();

        assert!(matches!(err, TurnError::Oracle(OracleError::TimedOut { .. })));
        assert_eq!(session.fen(), START_FEN);
        assert_eq!(*session.plies(), 0);
    }

    #[tokio::test]
    async fn test_illegal_oracle_reply_rolls_back_the_player_move() {
        let mut session = GameSession::new("t".to_string());
        // A white move is never legal for the side the oracle plays here.
        let oracle = ScriptedOracle::replying(&["e2e4"]);

        let err = session.play_turn(&mv("e2e4"), &oracle).await.unwrap_err();

        assert!(matches!(err, TurnError::OracleMoveIllegal(_)));
        assert_eq!(session.fen(), START_FEN);
        assert_eq!(*session.plies(), 0);
        assert_eq!(oracle.calls(), 1);
    }

    #[tokio::test]
    async fn test_reset_restores_the_start_position() {
        let mut session = GameSession::new("t".to_string());
        let oracle = ScriptedOracle::replying(&["e7e5"]);
        session.play_turn(&mv("e2e4"), &oracle).await.unwrap();

        let fen = session.reset();

        assert_eq!(fen, START_FEN);
        assert_eq!(session.fen(), START_FEN);
        assert_eq!(*session.plies(), 0);
    }

    #[test]
    fn test_load_roundtrips_the_position() {
        let mut session = GameSession::new("t".to_string());
        let fen = "rnbqkbnr/pppp1ppp/8/4pP2/8/8/PPPPP1PP/RNBQKBNR w KQkq e6 0 3";

        assert_eq!(session.load(fen).unwrap(), fen);
        assert_eq!(session.fen(), fen);
        assert!(session.load("not a fen").is_err());
    }

    #[test]
    fn test_manager_reuses_sessions_by_id() {
        let manager = SessionManager::new();
        let a = manager.get_or_create("alpha");
        let again = manager.get_or_create("alpha");
        let b = manager.get_or_create("beta");

        assert!(Arc::ptr_eq(&a, &again));
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let manager = SessionManager::new();
        let oracle = ScriptedOracle::replying(&["e7e5"]);

        let a = manager.get_or_create("alpha");
        a.lock()
            .await
            .play_turn(&mv("e2e4"), &oracle)
            .await
            .unwrap();

        let b = manager.get_or_create("beta");
        assert_eq!(b.lock().await.fen(), START_FEN);
        assert_ne!(a.lock().await.fen(), START_FEN);
    }
}
