//! Admin HTTP handlers.
//!
//! The exposed operations, consumed by the scheduling/CLI layer that sits
//! outside this core: ingest, settle, recompute, link management, rollup
//! reads. Batch operations always answer with partial-progress summaries;
//! errors map to structured JSON, never opaque aborts.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::application::services::ingestion_service::{
    BatchIngestSummary, IngestReport, IngestionService,
};
use crate::application::services::rollup_service::RollupService;
use crate::application::services::settlement_service::{SettlementReport, SettlementService};
use crate::domain::entities::strategy::StrategyRollup;
use crate::domain::errors::{IngestionError, RollupError, SettlementError};
use crate::domain::repositories::game_catalog::CatalogError;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub ingestion: Arc<IngestionService>,
    pub settlement: Arc<SettlementService>,
    pub rollups: Arc<RollupService>,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

type HandlerError = (StatusCode, Json<ErrorResponse>);

fn error_response(status: StatusCode, message: String) -> HandlerError {
    (status, Json(ErrorResponse { error: message }))
}

/// POST /admin/ingest: one batch cycle over the league's upcoming events.
pub async fn ingest_upcoming(
    State(state): State<AppState>,
) -> Json<BatchIngestSummary> {
    Json(state.ingestion.ingest_upcoming().await)
}

/// POST /admin/ingest/:event_id
pub async fn ingest_event(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Result<Json<IngestReport>, HandlerError> {
    state
        .ingestion
        .ingest_event(&event_id)
        .await
        .map(Json)
        .map_err(|e| {
            let status = match &e {
                IngestionError::Catalog {
                    source: CatalogError::NotFound(_),
                    ..
                } => StatusCode::NOT_FOUND,
                IngestionError::Catalog { .. } | IngestionError::Feed { .. } => {
                    StatusCode::BAD_GATEWAY
                }
                IngestionError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            error_response(status, e.to_string())
        })
}

/// POST /admin/settle/:event_id
pub async fn settle_event(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Result<Json<SettlementReport>, HandlerError> {
    state
        .settlement
        .settle_event(&event_id)
        .await
        .map(Json)
        .map_err(|e| {
            let status = match &e {
                SettlementError::EventNotFinal { .. } => StatusCode::CONFLICT,
                SettlementError::Catalog {
                    source: CatalogError::NotFound(_),
                    ..
                } => StatusCode::NOT_FOUND,
                SettlementError::Catalog { .. } | SettlementError::Results { .. } => {
                    StatusCode::BAD_GATEWAY
                }
                SettlementError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            error_response(status, e.to_string())
        })
}

/// POST /admin/strategies/:strategy_id/recompute
pub async fn recompute_rollup(
    State(state): State<AppState>,
    Path(strategy_id): Path<String>,
) -> Result<Json<StrategyRollup>, HandlerError> {
    state
        .rollups
        .recompute(&strategy_id)
        .await
        .map(Json)
        .map_err(rollup_error)
}

/// POST /admin/strategies/:strategy_id/links/:wager_id
pub async fn link_wager(
    State(state): State<AppState>,
    Path((strategy_id, wager_id)): Path<(String, String)>,
) -> Result<Json<StrategyRollup>, HandlerError> {
    state
        .rollups
        .link_wager(&strategy_id, &wager_id)
        .await
        .map(Json)
        .map_err(rollup_error)
}

/// DELETE /admin/strategies/:strategy_id/links/:wager_id
pub async fn unlink_wager(
    State(state): State<AppState>,
    Path((strategy_id, wager_id)): Path<(String, String)>,
) -> Result<Json<StrategyRollup>, HandlerError> {
    state
        .rollups
        .unlink_wager(&strategy_id, &wager_id)
        .await
        .map(Json)
        .map_err(rollup_error)
}

/// GET /strategies/:strategy_id/rollup, serving the cached aggregate.
pub async fn get_rollup(
    State(state): State<AppState>,
    Path(strategy_id): Path<String>,
) -> Result<Json<StrategyRollup>, HandlerError> {
    match state.rollups.get_cached(&strategy_id).await {
        Ok(Some(rollup)) => Ok(Json(rollup)),
        Ok(None) => Err(error_response(
            StatusCode::NOT_FOUND,
            format!("No rollup computed for strategy {}", strategy_id),
        )),
        Err(e) => Err(rollup_error(e)),
    }
}

/// GET /health
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

fn rollup_error(e: RollupError) -> HandlerError {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
