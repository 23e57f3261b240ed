//! drawfish server library - chess against an external move oracle.
//!
//! # Architecture
//!
//! - **Oracle**: gateway to the external move-selection process (spawn,
//!   timeout, stdout parsing)
//! - **Session**: authoritative game state; a human move and the oracle's
//!   reply commit as one atomic turn
//! - **Http**: the REST surface clients play through
//! - **Config**: TOML-backed server and oracle settings
//!
//! The binary in `main.rs` wires these together behind a clap CLI.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod config;
mod http;
mod oracle;
mod session;

// Crate-level exports - Configuration
pub use config::{ConfigError, OracleConfig, ServerConfig};

// Crate-level exports - HTTP surface
pub use http::{AppState, GameResponse, LoadRequest, MoveRequest, MoveResponse, router};

// Crate-level exports - Move oracle gateway
pub use oracle::{MoveOracle, OracleError, ProcessOracle};

// Crate-level exports - Session management
pub use session::{GameSession, SessionId, SessionManager, SharedSession, TurnError, TurnOutcome};
