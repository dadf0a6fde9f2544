//! User to user transfer endpoints

use api_types::transfer::{
    BatchTransferCreated, BatchTransferRequest, TransferCreated, TransferRequest,
};
use axum::{Extension, Json, extract::State, http::StatusCode};
use engine::{BatchEntry, BatchTransferCmd, TransferCmd};

use crate::{
    ServerError,
    server::{CurrentSession, ServerState},
};

pub async fn transfer_new(
    Extension(session): Extension<CurrentSession>,
    State(state): State<ServerState>,
    Json(payload): Json<TransferRequest>,
) -> Result<(StatusCode, Json<TransferCreated>), ServerError> {
    let mut cmd = TransferCmd::new(
        session.account.external_id,
        payload.to_username,
        payload.amount,
    );
    if let Some(message) = payload.message {
        cmd = cmd.message(message);
    }
    if let Some(level) = payload.min_trust_level {
        cmd = cmd.min_trust_level(level);
    }

    let receipt = state.engine.request_transfer(cmd).await?;
    Ok((
        StatusCode::CREATED,
        Json(TransferCreated {
            transfer_id: receipt.id,
            confirm_url: state.settings.confirm_url(&receipt.confirm_token),
        }),
    ))
}

/// Several recipients, one confirmation link.
pub async fn batch_new(
    Extension(session): Extension<CurrentSession>,
    State(state): State<ServerState>,
    Json(payload): Json<BatchTransferRequest>,
) -> Result<(StatusCode, Json<BatchTransferCreated>), ServerError> {
    let entries = payload.recipients.into_iter().map(|r| {
        let entry = BatchEntry::new(r.username, r.amount);
        match r.message {
            Some(message) => entry.message(message),
            None => entry,
        }
    });
    let mut cmd = BatchTransferCmd::new(session.account.external_id).entries(entries);
    if let Some(level) = payload.min_trust_level {
        cmd = cmd.min_trust_level(level);
    }

    let receipt = state.engine.request_batch_transfer(cmd).await?;
    Ok((
        StatusCode::CREATED,
        Json(BatchTransferCreated {
            batch_id: receipt.batch_id,
            confirm_url: state.settings.confirm_url(&receipt.confirm_token),
            transfer_ids: receipt.transfers,
            skipped: receipt.skipped,
        }),
    ))
}
