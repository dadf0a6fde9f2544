//! App-facing consumption endpoint

use api_types::consume::{ConsumeCreated, ConsumeRequest};
use axum::{Extension, Json, extract::State, http::StatusCode};
use engine::{App, ConsumeCmd};

use crate::{ServerError, server::ServerState};

/// Ask a user to approve spending `amount` of their points in this app.
///
/// The user must open `confirm_url` and confirm before anything is debited.
pub async fn consume_new(
    Extension(app): Extension<App>,
    State(state): State<ServerState>,
    Json(payload): Json<ConsumeRequest>,
) -> Result<(StatusCode, Json<ConsumeCreated>), ServerError> {
    let mut cmd = ConsumeCmd::new(payload.username, payload.amount);
    if let Some(purpose) = payload.purpose {
        cmd = cmd.purpose(purpose);
    }

    let receipt = state.engine.request_consumption(&app, cmd).await?;
    Ok((
        StatusCode::CREATED,
        Json(ConsumeCreated {
            consumption_id: receipt.id,
            confirm_url: state.settings.confirm_url(&receipt.confirm_token),
        }),
    ))
}
