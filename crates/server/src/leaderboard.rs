//! Public leaderboard endpoint

use api_types::leaderboard::{Leaderboard, LeaderboardEntry, LeaderboardQuery};
use axum::{
    Json,
    extract::{Query, State},
};

use crate::{ServerError, server::ServerState, views};

const DEFAULT_ENTRIES: u64 = 20;
const MAX_ENTRIES: u64 = 100;

pub async fn get(
    State(state): State<ServerState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<Leaderboard>, ServerError> {
    let kind = views::leaderboard_kind(query.kind);
    let limit = query.limit.unwrap_or(DEFAULT_ENTRIES).clamp(1, MAX_ENTRIES);

    let entries = state
        .engine
        .leaderboard(kind, limit)
        .await?
        .into_iter()
        .zip(1..)
        .map(|(account, rank)| LeaderboardEntry {
            rank,
            value: kind.value(&account),
            username: account.username,
            name: account.name,
        })
        .collect();

    Ok(Json(Leaderboard {
        kind: query.kind,
        entries,
    }))
}
