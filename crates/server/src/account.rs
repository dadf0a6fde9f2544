//! Login sync, dashboard and account settings endpoints

use api_types::{
    account::{Account, LeaderboardVisibility},
    auth::{SyncRequest, SyncResponse},
    record::{RecordList, RecordsQuery},
};
use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
};
use engine::ForumIdentity;

use crate::{
    ServerError,
    server::{CurrentSession, ServerState},
    views,
};

const DEFAULT_RECORDS: u64 = 50;
const MAX_RECORDS: u64 = 200;

/// Called by the login front once the forum handshake succeeded.
///
/// Refreshes the account from the forum score and opens a session.
pub async fn sync(
    State(state): State<ServerState>,
    Json(payload): Json<SyncRequest>,
) -> Result<Json<SyncResponse>, ServerError> {
    if payload.username.trim().is_empty() {
        return Err(ServerError::Generic("username required".to_string()));
    }

    let score = state.scores.gamification_score(payload.username.trim()).await;
    let identity = ForumIdentity {
        external_id: payload.id,
        username: payload.username,
        name: payload.name,
        trust_level: payload.trust_level,
    };
    let account = state.engine.sync_account(&identity, score).await?;
    let session_token = state.engine.open_session(account.external_id).await?;
    tracing::info!(account = account.external_id, "user {} logged in", account.username);

    Ok(Json(SyncResponse {
        session_token,
        account: views::account(&account),
    }))
}

pub async fn me(Extension(session): Extension<CurrentSession>) -> Json<Account> {
    Json(views::account(&session.account))
}

pub async fn logout(
    Extension(session): Extension<CurrentSession>,
    State(state): State<ServerState>,
) -> Result<StatusCode, ServerError> {
    state.engine.close_session(&session.token).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_leaderboard_visibility(
    Extension(session): Extension<CurrentSession>,
    State(state): State<ServerState>,
    Json(payload): Json<LeaderboardVisibility>,
) -> Result<Json<Account>, ServerError> {
    let account = state
        .engine
        .set_leaderboard_visibility(session.account.external_id, payload.show)
        .await?;
    Ok(Json(views::account(&account)))
}

/// Consumptions and transfers of the logged-in account, newest first.
pub async fn records(
    Extension(session): Extension<CurrentSession>,
    State(state): State<ServerState>,
    Query(query): Query<RecordsQuery>,
) -> Result<Json<RecordList>, ServerError> {
    let limit = query.limit.unwrap_or(DEFAULT_RECORDS).clamp(1, MAX_RECORDS);
    let account_id = session.account.external_id;
    let records = state
        .engine
        .history(account_id, limit)
        .await?
        .into_iter()
        .map(|record| views::record(account_id, record))
        .collect();
    Ok(Json(RecordList { records }))
}
