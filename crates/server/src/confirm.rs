//! Confirmation page endpoints

use api_types::confirm::{ConfirmOutcome, ConfirmRequest, PendingView};
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use engine::EngineError;

use crate::{
    ServerError,
    server::{CurrentSession, ServerState},
    views,
};

/// What is waiting behind a token. Resolved tokens are gone.
pub async fn lookup(
    State(state): State<ServerState>,
    Path(token): Path<String>,
) -> Result<Json<PendingView>, ServerError> {
    let operation = state.engine.lookup(&token).await?;
    views::pending(operation)
        .map(Json)
        .ok_or_else(|| EngineError::NotFound("confirmation".to_string()).into())
}

pub async fn resolve(
    Extension(session): Extension<CurrentSession>,
    State(state): State<ServerState>,
    Path(token): Path<String>,
    Json(payload): Json<ConfirmRequest>,
) -> Result<Json<ConfirmOutcome>, ServerError> {
    let settlement = state
        .engine
        .resolve(
            &token,
            session.account.external_id,
            views::confirm_action(payload.action),
        )
        .await?;
    Ok(Json(views::settlement(settlement)))
}
