//! Client-side game state and the turn synchronization protocol.
//!
//! The client applies the player's move optimistically, but holds it in a
//! pending slot instead of the timeline until the server confirms the turn.
//! Confirmation appends the player ply and the oracle's reply together;
//! failure drops the pending slot, leaving board and timeline exactly as
//! they were before submission - including any redo branch the cursor had
//! rewound past.
//!
//! The server's FEN is telemetry: the oracle reply is replayed through the
//! local rules and the resulting position is the displayed truth, with a
//! divergence from the server logged as a warning.

use derive_more::Display;
use drawfish_game::{Board, CoordMove, FenError, MoveRecord, START_FEN, Timeline};
use tracing::{debug, warn};

/// What the transport must do for a staged turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// FEN to install on the server first, set when the move starts from a
    /// rewound position.
    pub rebase: Option<String>,
    /// The player's move.
    pub mv: CoordMove,
}

/// The optimistically applied player ply, kept out of the timeline until
/// the server confirms the turn.
#[derive(Debug, Clone)]
struct PendingTurn {
    record: MoveRecord,
    board: Board,
    prior: Board,
}

/// Local board, move timeline, and at most one turn in flight.
#[derive(Debug, Clone)]
pub struct GameView {
    board: Board,
    timeline: Timeline,
    pending: Option<PendingTurn>,
}

impl GameView {
    /// A view at the standard start position.
    pub fn new() -> Self {
        Self {
            board: Board::default(),
            timeline: Timeline::default(),
            pending: None,
        }
    }

    /// A view joining a game in progress; the timeline is based at `fen`.
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        let board = Board::from_fen(fen)?;
        Ok(Self {
            timeline: Timeline::new(board.fen()),
            board,
            pending: None,
        })
    }

    /// The displayed position, including the optimistic ply while a turn is
    /// in flight.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// The confirmed move history.
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// True while a submitted turn awaits the server's verdict.
    pub fn in_flight(&self) -> bool {
        self.pending.is_some()
    }

    /// Stages a move: applies it locally and returns what to send.
    ///
    /// The timeline is not touched; the ply is recorded by [`confirm`] or
    /// discarded by [`abandon`].
    ///
    /// [`confirm`]: GameView::confirm
    /// [`abandon`]: GameView::abandon
    pub fn submit(&mut self, mv: CoordMove) -> Result<Submission, SyncError> {
        if self.pending.is_some() {
            return Err(SyncError::TurnInFlight);
        }
        if self.board.is_game_over() {
            return Err(SyncError::GameOver);
        }

        let rebase = if self.timeline.at_latest() {
            None
        } else {
            Some(self.timeline.current_fen().to_string())
        };
        let played = self.board.play(&mv).map_err(|_| SyncError::IllegalMove(mv))?;

        debug!(%mv, rebase = rebase.is_some(), "Staging turn");
        let prior = std::mem::replace(&mut self.board, played.board.clone());
        self.pending = Some(PendingTurn {
            record: MoveRecord::new(played.san, played.board.fen()),
            board: played.board,
            prior,
        });
        Ok(Submission { rebase, mv })
    }

    /// Commits the pending turn after the server accepted it.
    ///
    /// Records the player ply, replays the oracle's reply through the local
    /// rules and records it too. Returns the SAN of the reply, if there was
    /// one.
    pub fn confirm(
        &mut self,
        bot_move: Option<&CoordMove>,
        server_fen: &str,
    ) -> Result<Option<String>, SyncError> {
        let pending = self.pending.take().ok_or(SyncError::NothingPending)?;
        self.timeline.record(pending.record);
        let mut board = pending.board;

        let bot_san = match bot_move {
            Some(mv) => {
                let played = board.play(mv).map_err(|_| SyncError::Desync(*mv))?;
                self.timeline
                    .record(MoveRecord::new(played.san.clone(), played.board.fen()));
                board = played.board;
                Some(played.san)
            }
            None => None,
        };

        if board.fen() != server_fen {
            warn!(local = %board.fen(), server = %server_fen, "Server position diverges from local replay");
        }
        self.board = board;
        Ok(bot_san)
    }

    /// Drops the pending turn after a failure, restoring the pre-submission
    /// state.
    pub fn abandon(&mut self) {
        if let Some(pending) = self.pending.take() {
            debug!("Dropping unconfirmed turn");
            self.board = pending.prior;
        }
    }

    /// Steps the displayed position one ply back.
    pub fn step_back(&mut self) -> Result<(), SyncError> {
        if self.pending.is_some() {
            return Err(SyncError::TurnInFlight);
        }
        let fen = self.timeline.step_back().to_string();
        self.reseat(&fen);
        Ok(())
    }

    /// Steps the displayed position one ply forward.
    pub fn step_forward(&mut self) -> Result<(), SyncError> {
        if self.pending.is_some() {
            return Err(SyncError::TurnInFlight);
        }
        let fen = self.timeline.step_forward().to_string();
        self.reseat(&fen);
        Ok(())
    }

    /// Puts the view back at the standard start position.
    pub fn apply_reset(&mut self) {
        self.pending = None;
        self.board = Board::default();
        self.timeline.reset(START_FEN);
    }

    fn reseat(&mut self, fen: &str) {
        match Board::from_fen(fen) {
            Ok(board) => self.board = board,
            Err(e) => warn!(error = %e, fen, "Stored snapshot failed to parse"),
        }
    }
}

impl Default for GameView {
    fn default() -> Self {
        Self::new()
    }
}

/// Ways the client-side protocol can refuse or fail an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SyncError {
    /// A submitted turn is still awaiting the server's verdict.
    #[display("a turn is already in flight")]
    TurnInFlight,
    /// The game has ended; reset to play again.
    #[display("the game is over")]
    GameOver,
    /// The move is not legal on the local board.
    #[display("illegal move {}", _0)]
    IllegalMove(CoordMove),
    /// There is no turn awaiting confirmation.
    #[display("no turn in flight")]
    NothingPending,
    /// The server's reply does not fit the local position.
    #[display("server reply {} is illegal on the local board", _0)]
    Desync(CoordMove),
}

impl std::error::Error for SyncError {}

#[cfg(test)]
mod tests {
    use super::*;

    const AFTER_E4: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";
    const AFTER_E4_E5: &str = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2";
    const AFTER_D4_D5: &str = "rnbqkbnr/ppp1pppp/8/3p4/3P4/8/PPP1PPPP/RNBQKBNR w KQkq - 0 2";

    fn mv(s: &str) -> CoordMove {
        s.parse().unwrap()
    }

    fn confirmed_e4_e5() -> GameView {
        let mut view = GameView::new();
        view.submit(mv("e2e4")).unwrap();
        view.confirm(Some(&mv("e7e5")), AFTER_E4_E5).unwrap();
        view
    }

    #[test]
    fn test_submit_applies_optimistically_without_recording() {
        let mut view = GameView::new();

        let submission = view.submit(mv("e2e4")).unwrap();

        assert_eq!(submission.mv, mv("e2e4"));
        assert!(submission.rebase.is_none());
        assert!(view.in_flight());
        assert_eq!(view.board().fen(), AFTER_E4);
        assert!(view.timeline().is_empty());
    }

    #[test]
    fn test_confirm_records_both_plies() {
        let mut view = GameView::new();
        view.submit(mv("e2e4")).unwrap();

        let bot_san = view.confirm(Some(&mv("e7e5")), AFTER_E4_E5).unwrap();

        assert_eq!(bot_san.as_deref(), Some("e5"));
        assert!(!view.in_flight());
        assert_eq!(view.board().fen(), AFTER_E4_E5);
        assert_eq!(view.timeline().len(), 2);
        assert_eq!(view.timeline().cursor(), Some(1));
        assert_eq!(view.timeline().records()[0].san, "e4");
        assert_eq!(view.timeline().records()[1].san, "e5");
    }

    #[test]
    fn test_abandon_restores_the_exact_prior_state() {
        let mut view = GameView::new();
        view.submit(mv("e2e4")).unwrap();

        view.abandon();

        assert!(!view.in_flight());
        assert_eq!(view.board().fen(), START_FEN);
        assert!(view.timeline().is_empty());
        // A fresh submission works again
        assert!(view.submit(mv("d2d4")).is_ok());
    }

    #[test]
    fn test_only_one_turn_in_flight() {
        let mut view = GameView::new();
        view.submit(mv("e2e4")).unwrap();

        assert_eq!(view.submit(mv("d2d4")), Err(SyncError::TurnInFlight));
        assert_eq!(view.step_back().unwrap_err(), SyncError::TurnInFlight);
        assert_eq!(view.step_forward().unwrap_err(), SyncError::TurnInFlight);
    }

    #[test]
    fn test_illegal_move_stages_nothing() {
        let mut view = GameView::new();

        assert_eq!(
            view.submit(mv("e2e5")),
            Err(SyncError::IllegalMove(mv("e2e5")))
        );
        assert!(!view.in_flight());
        assert_eq!(view.board().fen(), START_FEN);
    }

    #[test]
    fn test_terminal_player_move_confirms_without_reply() {
        let mut view =
            GameView::from_fen("r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4")
                .unwrap();
        view.submit(mv("h5f7")).unwrap();

        let bot_san = view
            .confirm(
                None,
                "r1bqkb1r/pppp1Qpp/2n2n2/4p3/2B1P3/8/PPPP1PPP/RNB1K1NR b KQkq - 0 4",
            )
            .unwrap();

        assert!(bot_san.is_none());
        assert_eq!(view.timeline().len(), 1);
        assert_eq!(view.timeline().records()[0].san, "Qxf7#");
        assert!(view.board().is_game_over());
        assert_eq!(view.submit(mv("e7e5")), Err(SyncError::GameOver));
    }

    #[test]
    fn test_rewound_submission_carries_a_rebase() {
        let mut view = confirmed_e4_e5();
        view.step_back().unwrap();
        view.step_back().unwrap();

        let submission = view.submit(mv("d2d4")).unwrap();

        assert_eq!(submission.rebase.as_deref(), Some(START_FEN));
        // The redo branch survives until the server confirms the new turn
        assert_eq!(view.timeline().len(), 2);
    }

    #[test]
    fn test_confirming_a_rewound_turn_truncates_the_redo_branch() {
        let mut view = confirmed_e4_e5();
        view.step_back().unwrap();
        view.step_back().unwrap();
        view.submit(mv("d2d4")).unwrap();

        view.confirm(Some(&mv("d7d5")), AFTER_D4_D5).unwrap();

        assert_eq!(view.timeline().len(), 2);
        assert_eq!(view.timeline().records()[0].san, "d4");
        assert_eq!(view.timeline().records()[1].san, "d5");
        assert_eq!(view.board().fen(), AFTER_D4_D5);
    }

    #[test]
    fn test_failed_rewound_turn_preserves_the_redo_branch() {
        let mut view = confirmed_e4_e5();
        view.step_back().unwrap();
        view.step_back().unwrap();
        view.submit(mv("d2d4")).unwrap();

        view.abandon();

        assert_eq!(view.timeline().len(), 2);
        assert_eq!(view.timeline().records()[1].san, "e5");
        assert_eq!(view.timeline().cursor(), None);
        assert_eq!(view.board().fen(), START_FEN);
        // Stepping forward replays the preserved branch
        view.step_forward().unwrap();
        assert_eq!(view.board().fen(), AFTER_E4);
    }

    #[test]
    fn test_navigation_reseats_the_displayed_board() {
        let mut view = confirmed_e4_e5();

        view.step_back().unwrap();
        assert_eq!(view.board().fen(), AFTER_E4);
        view.step_back().unwrap();
        assert_eq!(view.board().fen(), START_FEN);
        view.step_forward().unwrap();
        assert_eq!(view.board().fen(), AFTER_E4);
    }

    #[test]
    fn test_local_replay_wins_over_server_fen() {
        let mut view = GameView::new();
        view.submit(mv("e2e4")).unwrap();

        // Server claims a different position; local replay is displayed.
        view.confirm(Some(&mv("e7e5")), "8/8/8/8/8/8/8/8 w - - 0 1")
            .unwrap();

        assert_eq!(view.board().fen(), AFTER_E4_E5);
    }

    #[test]
    fn test_illegal_server_reply_is_a_desync() {
        let mut view = GameView::new();
        view.submit(mv("e2e4")).unwrap();

        let err = view.confirm(Some(&mv("e2e4")), AFTER_E4).unwrap_err();

        assert_eq!(err, SyncError::Desync(mv("e2e4")));
        // The confirmed player ply stays recorded
        assert_eq!(view.timeline().len(), 1);
        assert!(!view.in_flight());
    }

    #[test]
    fn test_joining_midgame_bases_the_timeline_there() {
        let fen = "rnbqkbnr/pppp1ppp/8/4pP2/8/8/PPPPP1PP/RNBQKBNR w KQkq e6 0 3";
        let view = GameView::from_fen(fen).unwrap();

        assert_eq!(view.board().fen(), fen);
        assert_eq!(view.timeline().base(), fen);
        assert!(view.timeline().is_empty());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut view = confirmed_e4_e5();
        view.submit(mv("g1f3")).unwrap();

        view.apply_reset();

        assert!(!view.in_flight());
        assert_eq!(view.board().fen(), START_FEN);
        assert!(view.timeline().is_empty());
        assert_eq!(view.timeline().base(), START_FEN);
    }
}
