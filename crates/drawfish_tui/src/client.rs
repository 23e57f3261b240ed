//! HTTP client for the drawfish server.

use anyhow::Result;
use drawfish_game::CoordMove;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

/// Result of a network call, delivered back to the UI loop over a channel.
#[derive(Debug)]
pub enum NetEvent {
    /// Outcome of a submitted turn.
    Turn(Result<TurnReply, String>),
    /// Outcome of a reset request.
    Reset(Result<String, String>),
}

/// Confirmed turn data from the server.
#[derive(Debug, Clone)]
pub struct TurnReply {
    /// The oracle's reply, absent when the player's move ended the game.
    pub bot_move: Option<CoordMove>,
    /// Server-side FEN after the turn, used for divergence checks.
    pub fen: String,
}

#[derive(Debug, Serialize)]
struct MoveBody {
    from: String,
    to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    promotion: Option<String>,
}

#[derive(Debug, Serialize)]
struct LoadBody {
    fen: String,
}

#[derive(Debug, Deserialize)]
struct GameBody {
    fen: String,
}

#[derive(Debug, Deserialize)]
struct ReplyBody {
    success: bool,
    fen: Option<String>,
    #[serde(rename = "botMove")]
    bot_move: Option<String>,
    error: Option<String>,
}

/// Typed wrapper over the server's REST surface, bound to one session.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    session: String,
    client: reqwest::Client,
}

impl ApiClient {
    /// Creates a client for `session` on the server at `base_url`.
    pub fn new(base_url: String, session: String) -> Self {
        Self {
            base_url,
            session,
            client: reqwest::Client::new(),
        }
    }

    /// Fetches the session's current position.
    #[instrument(skip(self), fields(session = %self.session))]
    pub async fn game(&self) -> Result<String> {
        let body: GameBody = self
            .client
            .get(format!("{}/api/game", self.base_url))
            .query(&[("session", &self.session)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        debug!(fen = %body.fen, "Fetched game state");
        Ok(body.fen)
    }

    /// Submits the player's move and returns the oracle's reply.
    #[instrument(skip(self), fields(session = %self.session, mv = %mv))]
    pub async fn send_move(&self, mv: &CoordMove) -> Result<TurnReply> {
        let body = MoveBody {
            from: mv.from.to_string(),
            to: mv.to.to_string(),
            promotion: mv.promotion.map(|role| role.char().to_string()),
        };

        let response = self
            .client
            .post(format!("{}/api/move", self.base_url))
            .query(&[("session", &self.session)])
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        let reply: ReplyBody = response.json().await?;
        debug!(status = %status, success = reply.success, "Move response");

        if !reply.success {
            let message = reply
                .error
                .unwrap_or_else(|| format!("server returned {}", status));
            warn!(message = %message, "Server rejected the turn");
            return Err(anyhow::anyhow!(message));
        }

        let fen = reply
            .fen
            .ok_or_else(|| anyhow::anyhow!("success response without a position"))?;
        let bot_move = reply
            .bot_move
            .map(|raw| {
                raw.parse::<CoordMove>()
                    .map_err(|e| anyhow::anyhow!("unreadable reply move {:?}: {}", raw, e))
            })
            .transpose()?;
        Ok(TurnReply { bot_move, fen })
    }

    /// Installs a position on the server, used before playing from a
    /// rewound point.
    #[instrument(skip(self, fen), fields(session = %self.session))]
    pub async fn load(&self, fen: &str) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/api/load", self.base_url))
            .query(&[("session", &self.session)])
            .json(&LoadBody {
                fen: fen.to_string(),
            })
            .send()
            .await?;
        let status = response.status();
        let reply: ReplyBody = response.json().await?;

        if !reply.success {
            let message = reply
                .error
                .unwrap_or_else(|| format!("server returned {}", status));
            warn!(message = %message, "Server rejected the position");
            return Err(anyhow::anyhow!(message));
        }
        reply
            .fen
            .ok_or_else(|| anyhow::anyhow!("load response without a position"))
    }

    /// Starts a fresh game in the session.
    #[instrument(skip(self), fields(session = %self.session))]
    pub async fn reset(&self) -> Result<String> {
        let reply: ReplyBody = self
            .client
            .post(format!("{}/api/reset", self.base_url))
            .query(&[("session", &self.session)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        reply
            .fen
            .ok_or_else(|| anyhow::anyhow!("reset response without a position"))
    }
}
