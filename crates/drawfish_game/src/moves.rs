//! Coordinate-notation moves.
//!
//! Moves cross every process boundary in the system as pure coordinate
//! notation: origin square, destination square, optional promotion letter
//! (`e2e4`, `a7a8q`). This is the only format the oracle is trusted to emit
//! and the only format the HTTP surface accepts, so parsing is strict:
//! lowercase squares, exactly one optional promotion character.

use serde::{Deserialize, Serialize};
use shakmaty::{Role, Square};
use std::fmt;
use std::str::FromStr;

/// A move as origin, destination, and optional promotion piece.
///
/// A `CoordMove` is only meaningful relative to a specific position; legality
/// is checked by [`crate::Board::play`], not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoordMove {
    /// Origin square.
    pub from: Square,
    /// Destination square.
    pub to: Square,
    /// Promotion piece, present only on promoting pawn moves.
    pub promotion: Option<Role>,
}

impl CoordMove {
    /// Creates a non-promoting move.
    pub fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    /// Creates a promoting move.
    pub fn with_promotion(from: Square, to: Square, promotion: Role) -> Self {
        Self {
            from,
            to,
            promotion: Some(promotion),
        }
    }
}

impl fmt::Display for CoordMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(role) = self.promotion {
            write!(f, "{}", role.char())?;
        }
        Ok(())
    }
}

impl FromStr for CoordMove {
    type Err = MoveParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.is_ascii() || s.len() < 4 || s.len() > 5 {
            return Err(MoveParseError::InvalidLength(s.to_string()));
        }
        let from: Square = s[0..2]
            .parse()
            .map_err(|_| MoveParseError::InvalidSquare(s.to_string()))?;
        let to: Square = s[2..4]
            .parse()
            .map_err(|_| MoveParseError::InvalidSquare(s.to_string()))?;
        // Lowercase only, matching what oracles emit on stdout.
        let promotion = match s.as_bytes().get(4) {
            None => None,
            Some(b'q') => Some(Role::Queen),
            Some(b'r') => Some(Role::Rook),
            Some(b'b') => Some(Role::Bishop),
            Some(b'n') => Some(Role::Knight),
            Some(_) => return Err(MoveParseError::InvalidPromotion(s.to_string())),
        };
        Ok(Self {
            from,
            to,
            promotion,
        })
    }
}

impl Serialize for CoordMove {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CoordMove {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Error parsing a coordinate-move string.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum MoveParseError {
    /// The string is not 4 or 5 ASCII characters.
    #[display("move must be 4 or 5 characters like e2e4, got {:?}", _0)]
    InvalidLength(String),

    /// A square is outside a1-h8 or not lowercase.
    #[display("move {:?} does not name two squares in a1-h8", _0)]
    InvalidSquare(String),

    /// The promotion character is not one of q, r, b, n.
    #[display("move {:?} has a promotion letter outside q/r/b/n", _0)]
    InvalidPromotion(String),
}

impl std::error::Error for MoveParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_move() {
        let mv: CoordMove = "e2e4".parse().unwrap();
        assert_eq!(mv.from, Square::E2);
        assert_eq!(mv.to, Square::E4);
        assert!(mv.promotion.is_none());
    }

    #[test]
    fn test_parse_promotion_move() {
        let mv: CoordMove = "a7a8q".parse().unwrap();
        assert_eq!(mv.from, Square::A7);
        assert_eq!(mv.to, Square::A8);
        assert_eq!(mv.promotion, Some(Role::Queen));

        let mv: CoordMove = "h2h1n".parse().unwrap();
        assert_eq!(mv.promotion, Some(Role::Knight));
    }

    #[test]
    fn test_display_roundtrip() {
        for s in ["e2e4", "g8f6", "a7a8q", "h2h1r"] {
            let mv: CoordMove = s.parse().unwrap();
            assert_eq!(mv.to_string(), s);
        }
    }

    #[test]
    fn test_rejects_uppercase() {
        assert!(matches!(
            "E2E4".parse::<CoordMove>(),
            Err(MoveParseError::InvalidSquare(_))
        ));
    }

    #[test]
    fn test_rejects_bad_length() {
        assert!(matches!(
            "e2".parse::<CoordMove>(),
            Err(MoveParseError::InvalidLength(_))
        ));
        assert!(matches!(
            "e2e4qq".parse::<CoordMove>(),
            Err(MoveParseError::InvalidLength(_))
        ));
        assert!(matches!(
            "".parse::<CoordMove>(),
            Err(MoveParseError::InvalidLength(_))
        ));
    }

    #[test]
    fn test_rejects_bad_square() {
        assert!("e9e4".parse::<CoordMove>().is_err());
        assert!("i2i4".parse::<CoordMove>().is_err());
        assert!("22e4".parse::<CoordMove>().is_err());
    }

    #[test]
    fn test_rejects_bad_promotion() {
        assert!(matches!(
            "a7a8k".parse::<CoordMove>(),
            Err(MoveParseError::InvalidPromotion(_))
        ));
        assert!(matches!(
            "a7a8Q".parse::<CoordMove>(),
            Err(MoveParseError::InvalidPromotion(_))
        ));
    }

    #[test]
    fn test_rejects_non_ascii() {
        assert!("e2é4".parse::<CoordMove>().is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let mv: CoordMove = "b7b8n".parse().unwrap();
        let json = serde_json::to_string(&mv).unwrap();
        assert_eq!(json, "\"b7b8n\"");
        let back: CoordMove = serde_json::from_str(&json).unwrap();
        assert_eq!(back, mv);
    }
}
