use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::apifootball::{FixtureQuery, OddsSource};
use crate::db::{models::PickRecord, Database};
use crate::engine::{self, EngineParams};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub params: EngineParams,
    /// Absent when no API key is configured; fixture routes report that.
    pub odds_source: Option<Arc<dyn OddsSource>>,
    pub apisports_base: String,
}

/// Build the Axum router for the service.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/analyze/football", post(analyze_handler))
        .route("/api/matches", get(matches_handler))
        .route("/api/teams", get(teams_handler))
        .route("/api/picks", get(picks_handler))
        .route("/api/stats", get(stats_handler))
        .route("/api/config", get(config_handler))
        .route("/export", get(export_handler))
        .route("/import", post(import_handler))
        .route("/healthz", get(healthz_handler))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

/// POST /analyze/football
///
/// Runs one analysis and records the outcome in the pick log. A failed log
/// write is not the caller's problem; the result is still served.
async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<engine::AnalyzeRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let result = engine::analyze(&request, &state.params)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let document = serde_json::to_value(&result)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    match PickRecord::from_result_json(&document) {
        Ok(record) => {
            if let Err(e) = state.db.insert_pick(&record) {
                warn!("Failed to record pick: {}", e);
            }
        }
        Err(e) => warn!("Failed to index analysis result: {}", e),
    }

    Ok(Json(document))
}

/// GET /api/matches?fixture_id=&league_id=&season=&date=
async fn matches_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FixtureQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let source = state.odds_source.as_ref().ok_or((
        StatusCode::SERVICE_UNAVAILABLE,
        "APISPORTS_KEY is not configured".to_string(),
    ))?;
    if !query.is_usable() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Provide fixture_id OR league_id with season/date".to_string(),
        ));
    }

    let items = source
        .fixtures_with_odds(&query)
        .await
        .map_err(|e| (StatusCode::BAD_GATEWAY, format!("fixtures fetch failed: {e}")))?;
    Ok(Json(serde_json::json!({
        "count": items.len(),
        "items": items,
    })))
}

#[derive(Debug, Deserialize)]
struct TeamSearch {
    #[serde(default)]
    name: String,
}

/// GET /api/teams?name=<team>
async fn teams_handler(
    State(state): State<Arc<AppState>>,
    Query(search): Query<TeamSearch>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let source = state.odds_source.as_ref().ok_or((
        StatusCode::SERVICE_UNAVAILABLE,
        "APISPORTS_KEY is not configured".to_string(),
    ))?;
    if search.name.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "missing ?name=<team>".to_string()));
    }

    let team = source
        .search_team(&search.name)
        .await
        .map_err(|e| (StatusCode::BAD_GATEWAY, format!("team search failed: {e}")))?;
    match team {
        Some(team) => Ok(Json(serde_json::json!({
            "found": true,
            "query": search.name,
            "team": team,
        }))),
        None => Ok(Json(serde_json::json!({
            "found": false,
            "query": search.name,
        }))),
    }
}

#[derive(Debug, Deserialize)]
struct Pagination {
    #[serde(default = "default_limit")]
    limit: i64,
    #[serde(default)]
    offset: i64,
}

fn default_limit() -> i64 {
    50
}

/// GET /api/picks?limit=50&offset=0
async fn picks_handler(
    State(state): State<Arc<AppState>>,
    Query(page): Query<Pagination>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .db
        .list_picks(page.limit.clamp(1, 500), page.offset.max(0))
        .map(Json)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

/// GET /api/stats
async fn stats_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .db
        .pick_stats()
        .map(Json)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

/// GET /api/config
async fn config_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "apisports_key": state.odds_source.is_some(),
        "apisports_base": state.apisports_base,
        "league_avg_goals": state.params.league_avg_goals,
        "max_goals": state.params.max_goals,
        "min_edge": state.params.min_edge,
        "efficiency_threshold": state.params.efficiency_threshold,
        "supported_markets": engine::markets::SUPPORTED_MARKETS,
    }))
}

/// GET /export
async fn export_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .db
        .export_picks()
        .map(|items| Json(serde_json::json!({ "items": items })))
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

#[derive(Debug, Deserialize)]
struct ImportBody {
    #[serde(default)]
    items: Vec<serde_json::Value>,
}

/// POST /import
async fn import_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ImportBody>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .db
        .replace_picks(&body.items)
        .map(|count| Json(serde_json::json!({ "status": "ok", "count": count })))
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

/// GET /healthz
async fn healthz_handler() -> &'static str {
    "ok"
}
