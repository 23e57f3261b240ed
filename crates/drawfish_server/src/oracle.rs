//! Move oracle gateway.
//!
//! The opponent lives outside the server as an arbitrary executable. Each
//! turn the gateway spawns it with the current FEN as the final argument,
//! collects stdout until the process exits, and takes the first line that
//! parses as a coordinate move. Slow oracles are killed at the deadline.

use async_trait::async_trait;
use derive_more::Display;
use drawfish_game::CoordMove;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, error, instrument, warn};

/// Selects a reply move for a position.
#[async_trait]
pub trait MoveOracle: Send + Sync {
    /// Chooses a move for the side to play in `fen`.
    async fn best_move(&self, fen: &str) -> Result<CoordMove, OracleError>;

    /// Short human-readable description for logs.
    fn describe(&self) -> String;
}

/// Oracle that shells out to an external move-selection process.
#[derive(Debug, Clone)]
pub struct ProcessOracle {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl ProcessOracle {
    /// Creates an oracle that runs `program` with `args`, appending the
    /// position FEN as one extra argument.
    pub fn new(program: String, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program,
            args,
            timeout,
        }
    }
}

#[async_trait]
impl MoveOracle for ProcessOracle {
    #[instrument(skip(self, fen), fields(program = %self.program))]
    async fn best_move(&self, fen: &str) -> Result<CoordMove, OracleError> {
        debug!(fen, "Spawning oracle process");
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(fen)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = command.spawn().map_err(|e| {
            error!(error = %e, "Failed to spawn oracle process");
            OracleError::SpawnFailed {
                program: self.program.clone(),
                message: e.to_string(),
            }
        })?;

        // Dropping the wait future on timeout drops the child, and
        // kill_on_drop reaps it off the request path.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|e| {
                error!(error = %e, "Failed to collect oracle output");
                OracleError::SpawnFailed {
                    program: self.program.clone(),
                    message: e.to_string(),
                }
            })?,
            Err(_) => {
                warn!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Oracle deadline elapsed, killing process"
                );
                return Err(OracleError::TimedOut {
                    timeout: self.timeout,
                });
            }
        };

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            debug!(stderr = %stderr.trim(), "Oracle stderr");
        }

        if !output.status.success() {
            warn!(status = %output.status, "Oracle process failed");
            return Err(OracleError::ProcessFailed {
                status: output.status.to_string(),
                stderr: tail(&stderr),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        for line in stdout.lines() {
            if let Ok(mv) = line.trim().parse::<CoordMove>() {
                debug!(%mv, "Oracle selected move");
                return Ok(mv);
            }
        }

        warn!(stdout = %stdout.trim(), "Oracle produced no parseable move");
        Err(OracleError::MalformedOutput {
            stdout: tail(&stdout),
        })
    }

    fn describe(&self) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Ways the oracle can fail to produce a move.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum OracleError {
    /// The oracle process could not be started or awaited.
    #[display("Failed to run oracle '{}': {}", program, message)]
    SpawnFailed {
        /// Program that was invoked.
        program: String,
        /// Underlying io error.
        message: String,
    },
    /// The oracle did not exit before the deadline.
    #[display("Oracle timed out after {}ms", timeout.as_millis())]
    TimedOut {
        /// Deadline that elapsed.
        timeout: Duration,
    },
    /// The oracle exited with a non-zero status.
    #[display("Oracle process failed ({}): {}", status, stderr)]
    ProcessFailed {
        /// Rendered exit status.
        status: String,
        /// Tail of captured stderr.
        stderr: String,
    },
    /// No stdout line parsed as a coordinate move.
    #[display("Oracle output contained no move: {:?}", stdout)]
    MalformedOutput {
        /// Tail of captured stdout.
        stdout: String,
    },
}

impl std::error::Error for OracleError {}

// Error payloads stay small; full output is already in the log.
fn tail(s: &str) -> String {
    let trimmed = s.trim();
    match trimmed.char_indices().nth_back(199) {
        Some((i, _)) => trimmed[i..].to_string(),
        None => trimmed.to_string(),
    }
}

/// In-process oracle for tests: pops replies from a queue and counts calls.
#[cfg(test)]
pub(crate) struct ScriptedOracle {
    replies: std::sync::Mutex<std::collections::VecDeque<Result<CoordMove, OracleError>>>,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl ScriptedOracle {
    pub(crate) fn new(replies: Vec<Result<CoordMove, OracleError>>) -> Self {
        Self {
            replies: std::sync::Mutex::new(replies.into()),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub(crate) fn replying(moves: &[&str]) -> Self {
        Self::new(moves.iter().map(|m| Ok(m.parse().unwrap())).collect())
    }

    pub(crate) fn failing(error: OracleError) -> Self {
        Self::new(vec![Err(error)])
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait]
impl MoveOracle for ScriptedOracle {
    async fn best_move(&self, _fen: &str) -> Result<CoordMove, OracleError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(OracleError::MalformedOutput {
                stdout: "script exhausted".to_string(),
            }))
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}
