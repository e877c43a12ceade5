//! API route handlers.
//!
//! All endpoints return JSON. State is shared via `Arc<ApiState>`.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

use crate::data::markets;
use crate::data::odds::{find_best_odds, summarize_props, GameInfo, OddsSource, OverProp, PropsSummary};
use crate::report::ReportSnapshot;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

pub struct ApiState {
    pub source: Arc<dyn OddsSource>,
    /// Most recent generation run, if any.
    pub latest: RwLock<Option<ReportSnapshot>>,
}

impl ApiState {
    pub fn new(source: Arc<dyn OddsSource>) -> Self {
        Self {
            source,
            latest: RwLock::new(None),
        }
    }

    pub async fn publish(&self, snapshot: ReportSnapshot) {
        *self.latest.write().await = Some(snapshot);
    }
}

pub type AppState = Arc<ApiState>;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct PropsQuery {
    pub game_id: String,
    /// Comma-separated market keys; standard markets when absent.
    #[serde(default)]
    pub markets: Option<String>,
}

impl PropsQuery {
    fn market_list(&self) -> Vec<String> {
        let requested: Vec<String> = self
            .markets
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(String::from)
            .collect();
        if requested.is_empty() {
            markets::standard_markets().into_iter().map(String::from).collect()
        } else {
            requested
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Upstream failure, reported as 502 with a JSON body.
pub struct ApiError(anyhow::Error);

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!(error = %self.0, "API request failed");
        (
            StatusCode::BAD_GATEWAY,
            Json(ErrorBody {
                error: format!("{:#}", self.0),
            }),
        )
            .into_response()
    }
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /games
pub async fn get_games(State(state): State<AppState>) -> Result<Json<Vec<GameInfo>>, ApiError> {
    Ok(Json(state.source.games().await?))
}

/// GET /props?game_id=..&markets=a,b
pub async fn get_props(
    State(state): State<AppState>,
    Query(query): Query<PropsQuery>,
) -> Result<Json<Vec<OverProp>>, ApiError> {
    let props = state
        .source
        .player_props(&query.game_id, &query.market_list())
        .await?;
    Ok(Json(props))
}

/// GET /best-odds?game_id=..&markets=a,b
pub async fn get_best_odds(
    State(state): State<AppState>,
    Query(query): Query<PropsQuery>,
) -> Result<Json<Vec<OverProp>>, ApiError> {
    let props = state
        .source
        .player_props(&query.game_id, &query.market_list())
        .await?;
    Ok(Json(find_best_odds(&props)))
}

/// GET /summary?game_id=..&markets=a,b
pub async fn get_summary(
    State(state): State<AppState>,
    Query(query): Query<PropsQuery>,
) -> Result<Json<PropsSummary>, ApiError> {
    let props = state
        .source
        .player_props(&query.game_id, &query.market_list())
        .await?;
    Ok(Json(summarize_props(&props)))
}

/// GET /parlays
pub async fn get_parlays(State(state): State<AppState>) -> Response {
    match state.latest.read().await.as_ref() {
        Some(snapshot) => Json(snapshot).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorBody {
                error: "no parlays generated yet".to_string(),
            }),
        )
            .into_response(),
    }
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
