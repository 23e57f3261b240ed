//! Pure chess domain logic for drawfish.
//!
//! This crate holds everything that can be reasoned about without IO:
//!
//! - **Moves**: coordinate-notation moves (`e2e4`, `a7a8q`), the only move
//!   format crossing process boundaries.
//! - **Board**: a value-style facade over `shakmaty` - applying a move
//!   produces a new board and the move's SAN, never mutating the receiver.
//! - **Timeline**: the client-held move history with a cursor, supporting
//!   rewind, replay, and branch truncation on divergent play.
//!
//! The server and the terminal client both build on these types; neither
//! re-implements any chess rule.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod board;
mod moves;
mod timeline;

// Crate-level exports - Board facade
pub use board::{Board, FenError, IllegalMoveError, Outcome, Played, START_FEN};

// Crate-level exports - Coordinate moves
pub use moves::{CoordMove, MoveParseError};

// Crate-level exports - Move timeline
pub use timeline::{MoveRecord, Timeline, TimelineError};

// Re-exported shakmaty primitives used in the public API
pub use shakmaty::{Color, File, Piece, Rank, Role, Square};
