//! Board facade over shakmaty.
//!
//! `Board` is an immutable value: applying a move produces a new board plus
//! the move's SAN rendering. The facade exposes exactly what the session,
//! the HTTP surface, and the terminal client need (FEN in/out, legality,
//! terminal-state detection, piece lookup) so no other crate touches
//! shakmaty's move types directly.

use crate::moves::CoordMove;
use shakmaty::fen::Fen;
use shakmaty::san::San;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Piece, Position, Rank, Role, Square};
use std::fmt;

/// FEN of the standard starting position.
pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// A chess position with value-style move application.
#[derive(Debug, Clone)]
pub struct Board {
    position: Chess,
}

/// The result of applying a move.
#[derive(Debug, Clone)]
pub struct Played {
    /// Board after the move.
    pub board: Board,
    /// The move in standard algebraic notation, with check/mate suffix.
    pub san: String,
}

/// How a finished game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The given color delivered checkmate.
    Checkmate {
        /// Winning side.
        winner: Color,
    },
    /// The side to move has no legal moves but is not in check.
    Stalemate,
    /// Neither side retains mating material.
    InsufficientMaterial,
    /// Fifty moves passed without a capture or pawn move.
    FiftyMoveRule,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Checkmate {
                winner: Color::White,
            } => write!(f, "checkmate, white wins"),
            Outcome::Checkmate {
                winner: Color::Black,
            } => write!(f, "checkmate, black wins"),
            Outcome::Stalemate => write!(f, "draw by stalemate"),
            Outcome::InsufficientMaterial => write!(f, "draw by insufficient material"),
            Outcome::FiftyMoveRule => write!(f, "draw by fifty-move rule"),
        }
    }
}

impl Board {
    /// Creates a board from a FEN string.
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        let parsed: Fen = fen.parse().map_err(|e| FenError(format!("{e}")))?;
        let position: Chess = parsed
            .into_position(CastlingMode::Standard)
            .map_err(|e| FenError(format!("{e}")))?;
        Ok(Self { position })
    }

    /// Returns the FEN encoding of this position.
    pub fn fen(&self) -> String {
        Fen::from_position(self.position.clone(), EnPassantMode::Legal).to_string()
    }

    /// Returns the side to move.
    pub fn turn(&self) -> Color {
        self.position.turn()
    }

    /// Returns true if the side to move is in check.
    pub fn is_check(&self) -> bool {
        self.position.is_check()
    }

    /// Returns how the game ended, or `None` while it is still live.
    pub fn outcome(&self) -> Option<Outcome> {
        if self.position.is_checkmate() {
            // The side to move is mated, so the other side won
            let winner = match self.position.turn() {
                Color::White => Color::Black,
                Color::Black => Color::White,
            };
            Some(Outcome::Checkmate { winner })
        } else if self.position.is_stalemate() {
            Some(Outcome::Stalemate)
        } else if self.position.is_insufficient_material() {
            Some(Outcome::InsufficientMaterial)
        } else if self.position.halfmoves() >= 100 {
            Some(Outcome::FiftyMoveRule)
        } else {
            None
        }
    }

    /// Returns true once the game has ended.
    pub fn is_game_over(&self) -> bool {
        self.outcome().is_some()
    }

    /// Applies a move, returning the successor board and the move's SAN.
    ///
    /// The board itself is never mutated; an illegal move leaves everything
    /// as it was. Castling is accepted in king-destination form (`e1g1`).
    pub fn play(&self, mv: &CoordMove) -> Result<Played, IllegalMoveError> {
        let uci = UciMove::Normal {
            from: mv.from,
            to: mv.to,
            promotion: mv.promotion,
        };
        let m = uci
            .to_move(&self.position)
            .map_err(|_| IllegalMoveError(*mv))?;

        // SAN depends on the pre-move position
        let mut san = San::from_move(&self.position, &m).to_string();
        let next = self
            .position
            .clone()
            .play(&m)
            .map_err(|_| IllegalMoveError(*mv))?;
        if next.is_checkmate() {
            san.push('#');
        } else if next.is_check() {
            san.push('+');
        }

        Ok(Played {
            board: Self { position: next },
            san,
        })
    }

    /// Returns every legal move in coordinate form.
    pub fn legal_moves(&self) -> Vec<CoordMove> {
        self.position
            .legal_moves()
            .iter()
            .filter_map(|m| match UciMove::from_move(m, CastlingMode::Standard) {
                UciMove::Normal {
                    from,
                    to,
                    promotion,
                } => Some(CoordMove {
                    from,
                    to,
                    promotion,
                }),
                // Null and drop moves never come out of legal_moves
                _ => None,
            })
            .collect()
    }

    /// Returns the piece on the given square, if any.
    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.position.board().piece_at(square)
    }

    /// Returns true when a move from `from` to `to` needs a promotion piece.
    ///
    /// Used by clients to prompt for the piece before submitting the move.
    pub fn requires_promotion(&self, from: Square, to: Square) -> bool {
        let turn = self.position.turn();
        let is_own_pawn = self
            .position
            .board()
            .piece_at(from)
            .is_some_and(|p| p.color == turn && p.role == Role::Pawn);
        let last_rank = match turn {
            Color::White => Rank::Eighth,
            Color::Black => Rank::First,
        };
        is_own_pawn && to.rank() == last_rank
    }

    /// Returns the halfmove clock (plies since the last capture or pawn move).
    pub fn halfmoves(&self) -> u32 {
        self.position.halfmoves()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self {
            position: Chess::default(),
        }
    }
}

/// Error parsing or validating a FEN string.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
#[display("invalid FEN: {}", _0)]
pub struct FenError(
    /// Parser message describing the rejection.
    pub String,
);

impl std::error::Error for FenError {}

/// Error from attempting a move that is not legal in the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
#[display("illegal move: {}", _0)]
pub struct IllegalMoveError(
    /// The rejected move.
    pub CoordMove,
);

impl std::error::Error for IllegalMoveError {}
