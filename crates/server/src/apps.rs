//! Application registration endpoints

use api_types::app::{App, AppList, AppNew};
use axum::{Extension, Json, extract::State, http::StatusCode};
use engine::AppNewCmd;

use crate::{
    ServerError,
    server::{CurrentSession, ServerState},
    views,
};

/// Register an app owned by the logged-in account.
pub async fn app_new(
    Extension(session): Extension<CurrentSession>,
    State(state): State<ServerState>,
    Json(payload): Json<AppNew>,
) -> Result<(StatusCode, Json<App>), ServerError> {
    let mut cmd = AppNewCmd::new(
        session.account.external_id,
        payload.name,
        payload.redirect_uri,
    );
    if let Some(description) = payload.description {
        cmd = cmd.description(description);
    }

    let app = state.engine.create_app(cmd).await?;
    Ok((StatusCode::CREATED, Json(views::app(app))))
}

pub async fn list(
    Extension(session): Extension<CurrentSession>,
    State(state): State<ServerState>,
) -> Result<Json<AppList>, ServerError> {
    let apps = state
        .engine
        .apps(session.account.external_id)
        .await?
        .into_iter()
        .map(views::app)
        .collect();
    Ok(Json(AppList { apps }))
}
