//! Move history with cursor-based navigation.
//!
//! The timeline is the client's record of the game: one entry per ply, plus
//! a cursor marking which position is currently displayed. Navigation never
//! mutates the records; recording while the cursor is rewound truncates the
//! abandoned future first, so history never branches.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// One recorded ply: SAN for display, FEN snapshot for seeking.
///
/// Storing the resulting position with each record makes seeking a lookup
/// instead of a replay; the replay-equivalence of the snapshots is what the
/// timeline tests assert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    /// The move in standard algebraic notation.
    pub san: String,
    /// FEN of the position after the move.
    pub fen: String,
}

impl MoveRecord {
    /// Creates a record from a SAN string and the resulting FEN.
    pub fn new(san: impl Into<String>, fen: impl Into<String>) -> Self {
        Self {
            san: san.into(),
            fen: fen.into(),
        }
    }
}

/// Error from seeking the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum TimelineError {
    /// The requested index is past the end of the recorded history.
    #[display("move index {} out of range ({} moves recorded)", index, len)]
    IndexOutOfRange {
        /// The index that was requested.
        index: usize,
        /// Number of records at the time of the request.
        len: usize,
    },
}

impl std::error::Error for TimelineError {}

/// Ordered move history with a display cursor.
///
/// The cursor is `None` before any move (the base position) or `Some(i)`
/// after record `i`. Every operation preserves the invariant that the
/// cursor points at a recorded ply or at the base, and that the FEN under
/// the cursor equals the replay of the records up to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeline {
    base: String,
    records: Vec<MoveRecord>,
    cursor: Option<usize>,
}

impl Timeline {
    /// Creates an empty timeline starting from the given base position.
    pub fn new(base_fen: impl Into<String>) -> Self {
        Self {
            base: base_fen.into(),
            records: Vec::new(),
            cursor: None,
        }
    }

    /// Records a ply at the cursor, discarding any future past it.
    ///
    /// After a rewind, the records beyond the cursor are a redo branch the
    /// player has abandoned; recording a new ply makes that permanent.
    pub fn record(&mut self, record: MoveRecord) {
        let keep = self.cursor.map_or(0, |i| i + 1);
        if keep < self.records.len() {
            debug!(
                discarded = self.records.len() - keep,
                "Truncating abandoned branch"
            );
            self.records.truncate(keep);
        }
        self.records.push(record);
        self.cursor = Some(self.records.len() - 1);
    }

    /// Moves the cursor; `None` seeks to the base position.
    ///
    /// Returns the FEN now under the cursor. Records are never mutated.
    pub fn go_to(&mut self, index: Option<usize>) -> Result<&str, TimelineError> {
        if let Some(i) = index {
            if i >= self.records.len() {
                return Err(TimelineError::IndexOutOfRange {
                    index: i,
                    len: self.records.len(),
                });
            }
        }
        self.cursor = index;
        Ok(self.current_fen())
    }

    /// Steps the cursor one ply back, stopping at the base position.
    pub fn step_back(&mut self) -> &str {
        self.cursor = match self.cursor {
            None | Some(0) => None,
            Some(i) => Some(i - 1),
        };
        self.current_fen()
    }

    /// Steps the cursor one ply forward, stopping at the latest record.
    pub fn step_forward(&mut self) -> &str {
        self.cursor = match self.cursor {
            None if self.records.is_empty() => None,
            None => Some(0),
            Some(i) if i + 1 < self.records.len() => Some(i + 1),
            Some(i) => Some(i),
        };
        self.current_fen()
    }

    /// Returns the FEN under the cursor.
    pub fn current_fen(&self) -> &str {
        match self.cursor {
            None => &self.base,
            Some(i) => &self.records[i].fen,
        }
    }

    /// Clears all records and re-bases the timeline.
    pub fn reset(&mut self, base_fen: impl Into<String>) {
        self.base = base_fen.into();
        self.records.clear();
        self.cursor = None;
    }

    /// Returns the number of recorded plies.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true when no plies are recorded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the cursor (`None` = base position).
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Returns true when the cursor sits at the end of the history.
    pub fn at_latest(&self) -> bool {
        match self.cursor {
            None => self.records.is_empty(),
            Some(i) => i + 1 == self.records.len(),
        }
    }

    /// Returns the recorded plies, oldest first.
    pub fn records(&self) -> &[MoveRecord] {
        &self.records
    }

    /// Returns the FEN the timeline starts from.
    pub fn base(&self) -> &str {
        &self.base
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new(crate::board::START_FEN)
    }
}
