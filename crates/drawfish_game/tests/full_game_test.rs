//! End-to-end games played through the board facade and the timeline.

use drawfish_game::{Board, Color, CoordMove, MoveRecord, Outcome, Timeline, START_FEN};

fn mv(s: &str) -> CoordMove {
    s.parse().unwrap()
}

/// Plays a sequence of coordinate moves, recording each ply.
fn play_line(board: Board, timeline: &mut Timeline, moves: &[&str]) -> Board {
    let mut board = board;
    for m in moves {
        let played = board.play(&mv(m)).unwrap();
        board = played.board;
        timeline.record(MoveRecord::new(played.san, board.fen()));
    }
    board
}

#[test]
fn test_scholars_mate_full_game() {
    let mut timeline = Timeline::default();
    let board = play_line(
        Board::default(),
        &mut timeline,
        &["e2e4", "e7e5", "f1c4", "b8c6", "d1h5", "g8f6", "h5f7"],
    );

    assert!(board.is_game_over());
    assert_eq!(
        board.outcome(),
        Some(Outcome::Checkmate {
            winner: Color::White
        })
    );
    assert_eq!(timeline.len(), 7);
    assert_eq!(timeline.cursor(), Some(6));
    assert_eq!(timeline.records()[6].san, "Qxf7#");
}

#[test]
fn test_rewind_and_diverge() {
    let mut timeline = Timeline::default();
    play_line(
        Board::default(),
        &mut timeline,
        &["e2e4", "e7e5", "g1f3", "b8c6"],
    );

    // Rewind to after 1...e5 and play a different second move
    let fen = timeline.go_to(Some(1)).unwrap().to_string();
    let board = Board::from_fen(&fen).unwrap();
    assert_eq!(board.turn(), Color::White);

    let played = board.play(&mv("f1c4")).unwrap();
    timeline.record(MoveRecord::new(played.san, played.board.fen()));

    assert_eq!(timeline.len(), 3);
    assert_eq!(timeline.records()[2].san, "Bc4");
    // The discarded branch is gone for good
    assert!(timeline.records().iter().all(|r| r.san != "Nf3"));
}

#[test]
fn test_reset_returns_to_start() {
    let mut timeline = Timeline::default();
    play_line(Board::default(), &mut timeline, &["d2d4", "d7d5", "c2c4"]);
    assert_eq!(timeline.len(), 3);

    timeline.reset(START_FEN);
    assert!(timeline.is_empty());
    assert_eq!(timeline.cursor(), None);
    assert_eq!(timeline.current_fen(), START_FEN);
    assert_eq!(Board::from_fen(timeline.base()).unwrap().fen(), START_FEN);
}

#[test]
fn test_timeline_over_nonstandard_base() {
    // A timeline can start mid-game, e.g. after the client re-bases
    let base = "8/1P6/8/8/8/7k/8/4K3 w - - 0 1";
    let mut timeline = Timeline::new(base);
    let board = Board::from_fen(base).unwrap();

    let played = board.play(&mv("b7b8q")).unwrap();
    timeline.record(MoveRecord::new(played.san.clone(), played.board.fen()));

    assert_eq!(timeline.base(), base);
    assert_eq!(played.san, "b8=Q");
    assert_eq!(timeline.step_back(), base);
    assert_eq!(timeline.step_forward(), played.board.fen());
}
