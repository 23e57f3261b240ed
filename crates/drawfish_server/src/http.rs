//! HTTP surface.
//!
//! Thin JSON layer over [`SessionManager`]: request parsing and status
//! mapping live here, game semantics stay in the session. Oracle failures
//! reach the wire as one opaque message; the cause goes to the log.

use crate::oracle::MoveOracle;
use crate::session::{SessionManager, TurnError};
use axum::Router;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use drawfish_game::{CoordMove, MoveParseError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, instrument};

/// Shared state behind the router.
pub struct AppState {
    sessions: SessionManager,
    oracle: Arc<dyn MoveOracle>,
}

impl AppState {
    /// Creates state serving moves from `oracle`.
    pub fn new(oracle: Arc<dyn MoveOracle>) -> Self {
        Self {
            sessions: SessionManager::new(),
            oracle,
        }
    }
}

/// Builds the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/game", get(get_game))
        .route("/api/move", post(post_move))
        .route("/api/load", post(post_load))
        .route("/api/reset", post(post_reset))
        .with_state(state)
}

/// Session selector; every endpoint accepts `?session=<id>`.
#[derive(Debug, Clone, Deserialize)]
struct SessionQuery {
    #[serde(default = "default_session")]
    session: String,
}

fn default_session() -> String {
    "default".to_string()
}

/// JSON body for `POST /api/move`.
#[derive(Debug, Clone, Deserialize)]
pub struct MoveRequest {
    /// Origin square, e.g. `e2`.
    pub from: String,
    /// Destination square, e.g. `e4`.
    pub to: String,
    /// Promotion piece letter (`q`, `r`, `b`, `n`), present only when
    /// promoting.
    #[serde(default)]
    pub promotion: Option<String>,
}

impl MoveRequest {
    /// Assembles the request fields into a coordinate move.
    ///
    /// Field lengths are checked before concatenation so `from: "e2e"`,
    /// `to: "4"` cannot masquerade as `e2e4`.
    pub fn to_coord_move(&self) -> Result<CoordMove, MoveParseError> {
        if self.from.len() != 2 || self.to.len() != 2 {
            return Err(MoveParseError::InvalidLength(format!(
                "{}/{}",
                self.from, self.to
            )));
        }
        if let Some(p) = &self.promotion {
            if p.len() != 1 {
                return Err(MoveParseError::InvalidPromotion(p.clone()));
            }
        }
        let promotion = self.promotion.as_deref().unwrap_or("");
        format!("{}{}{}", self.from, self.to, promotion).parse()
    }
}

/// JSON body for `POST /api/load`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoadRequest {
    /// Position to install, as FEN.
    pub fen: String,
}

/// JSON body for `GET /api/game`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameResponse {
    /// Current position FEN.
    pub fen: String,
}

/// JSON body for move, load and reset responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveResponse {
    /// Whether the request took effect.
    pub success: bool,
    /// FEN after the request, when it took effect.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fen: Option<String>,
    /// The oracle's reply in coordinate notation, absent when the player's
    /// move ended the game.
    #[serde(rename = "botMove", skip_serializing_if = "Option::is_none")]
    pub bot_move: Option<String>,
    /// Error message, when the request failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MoveResponse {
    fn ok(fen: String, bot_move: Option<String>) -> Self {
        Self {
            success: true,
            fen: Some(fen),
            bot_move,
            error: None,
        }
    }

    fn err(message: &str) -> Self {
        Self {
            success: false,
            fen: None,
            bot_move: None,
            error: Some(message.to_string()),
        }
    }
}

async fn root() -> &'static str {
    "Welcome to the drawfish backend!"
}

#[instrument(skip(state, query), fields(session = %query.session))]
async fn get_game(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SessionQuery>,
) -> Json<GameResponse> {
    let session = state.sessions.get_or_create(&query.session);
    let fen = session.lock().await.fen();
    Json(GameResponse { fen })
}

#[instrument(skip(state, query, payload), fields(session = %query.session))]
async fn post_move(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SessionQuery>,
    payload: Result<Json<MoveRequest>, JsonRejection>,
) -> (StatusCode, Json<MoveResponse>) {
    let Ok(Json(request)) = payload else {
        debug!("Malformed move request body");
        return (
            StatusCode::BAD_REQUEST,
            Json(MoveResponse::err("Invalid move by player")),
        );
    };

    let mv = match request.to_coord_move() {
        Ok(mv) => mv,
        Err(e) => {
            debug!(from = %request.from, to = %request.to, error = %e, "Unparseable move request");
            return (
                StatusCode::BAD_REQUEST,
                Json(MoveResponse::err("Invalid move by player")),
            );
        }
    };

    let session = state.sessions.get_or_create(&query.session);
    let mut game = session.lock().await;
    match game.play_turn(&mv, state.oracle.as_ref()).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(MoveResponse::ok(
                outcome.fen().clone(),
                outcome.oracle_move().as_ref().map(|m| m.to_string()),
            )),
        ),
        Err(TurnError::GameOver) => (StatusCode::OK, Json(MoveResponse::err("Game over"))),
        Err(TurnError::IllegalMove(_)) => (
            StatusCode::BAD_REQUEST,
            Json(MoveResponse::err("Invalid move by player")),
        ),
        Err(e) => {
            error!(error = %e, "Turn failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(MoveResponse::err("Bot failed to make a move.")),
            )
        }
    }
}

#[instrument(skip(state, query, payload), fields(session = %query.session))]
async fn post_load(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SessionQuery>,
    payload: Result<Json<LoadRequest>, JsonRejection>,
) -> (StatusCode, Json<MoveResponse>) {
    let Ok(Json(request)) = payload else {
        debug!("Malformed load request body");
        return (
            StatusCode::BAD_REQUEST,
            Json(MoveResponse::err("Invalid position")),
        );
    };

    let session = state.sessions.get_or_create(&query.session);
    let mut game = session.lock().await;
    match game.load(&request.fen) {
        Ok(fen) => (StatusCode::OK, Json(MoveResponse::ok(fen, None))),
        Err(e) => {
            debug!(error = %e, "Rejecting position load");
            (
                StatusCode::BAD_REQUEST,
                Json(MoveResponse::err("Invalid position")),
            )
        }
    }
}

#[instrument(skip(state, query), fields(session = %query.session))]
async fn post_reset(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SessionQuery>,
) -> Json<MoveResponse> {
    let session = state.sessions.get_or_create(&query.session);
    let fen = session.lock().await.reset();
    Json(MoveResponse::ok(fen, None))
}
