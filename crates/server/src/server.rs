use axum::{
    Router,
    extract::{Request, State},
    http::{HeaderName, HeaderValue, header::AUTHORIZATION},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, Error as AxumError, Header, authorization::Bearer},
};
use serde::Deserialize;

use std::sync::Arc;

use crate::{ServerError, account, apps, confirm, consume, leaderboard, transfer};
use engine::{Account, Engine, EngineError};
use forum::ScoreSource;

static SYNC_KEY_HEADER: HeaderName = HeaderName::from_static("x-sync-key");

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
    /// Base of the confirmation links handed to apps and users.
    pub public_url: String,
    /// Shared secret of the login front calling `/auth/sync`. Empty disables sync.
    pub sync_key: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
            public_url: "http://127.0.0.1:3000".to_string(),
            sync_key: String::new(),
        }
    }
}

impl ServerSettings {
    pub(crate) fn confirm_url(&self, token: &str) -> String {
        format!("{}/confirm/{token}", self.public_url.trim_end_matches('/'))
    }
}

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub scores: Arc<dyn ScoreSource>,
    pub settings: Arc<ServerSettings>,
}

/// Account behind the bearer token of the current request.
#[derive(Clone, Debug)]
pub struct CurrentSession {
    pub account: Account,
    pub token: String,
}

/// `TypedHeader` for the login front shared secret.
#[derive(Debug)]
struct SyncKeyHeader(String);

impl Header for SyncKeyHeader {
    fn name() -> &'static HeaderName {
        &SYNC_KEY_HEADER
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, AxumError>
    where
        Self: Sized,
        I: Iterator<Item = &'i HeaderValue>,
    {
        let value = values.next().ok_or_else(AxumError::invalid)?;
        let Ok(value) = value.to_str() else {
            return Err(AxumError::invalid());
        };

        Ok(SyncKeyHeader(value.to_string()))
    }

    fn encode<E: Extend<HeaderValue>>(&self, values: &mut E) {
        match HeaderValue::from_str(&self.0) {
            Ok(value) => values.extend(std::iter::once(value)),
            Err(_) => tracing::error!("failed to encode x-sync-key header"),
        }
    }
}

async fn session_auth(
    auth_header: Option<TypedHeader<Authorization<Bearer>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let Some(TypedHeader(Authorization(bearer))) = auth_header else {
        return Err(ServerError::Unauthorized);
    };

    let account = match state.engine.session_account(bearer.token()).await {
        Ok(account) => account,
        Err(EngineError::NotFound(_)) => return Err(ServerError::Unauthorized),
        Err(err) => return Err(err.into()),
    };

    request.extensions_mut().insert(CurrentSession {
        account,
        token: bearer.token().to_string(),
    });
    Ok(next.run(request).await)
}

/// Apps send the raw `client_id:client_secret` pair as `Authorization`.
async fn app_auth(
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let credential = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(ServerError::Unauthorized)?;

    let app = state
        .engine
        .authenticate_app(credential)
        .await
        .map_err(|_| ServerError::Unauthorized)?;

    request.extensions_mut().insert(app);
    Ok(next.run(request).await)
}

async fn sync_auth(
    sync_header: Option<TypedHeader<SyncKeyHeader>>,
    State(state): State<ServerState>,
    request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    if state.settings.sync_key.is_empty() {
        tracing::warn!("rejected account sync: no sync key configured");
        return Err(ServerError::Unauthorized);
    }
    match sync_header {
        Some(TypedHeader(SyncKeyHeader(key))) if key == state.settings.sync_key => {
            Ok(next.run(request).await)
        }
        _ => {
            tracing::warn!("rejected account sync with a wrong key");
            Err(ServerError::Unauthorized)
        }
    }
}

pub fn router(state: ServerState) -> Router {
    let session_routes = Router::new()
        .route("/me", get(account::me))
        .route("/me/leaderboard", post(account::set_leaderboard_visibility))
        .route("/me/records", get(account::records))
        .route("/auth/logout", post(account::logout))
        .route("/apps", post(apps::app_new).get(apps::list))
        .route("/api/score/transfer", post(transfer::transfer_new))
        .route("/api/score/transfer/batch", post(transfer::batch_new))
        .route("/confirm/{token}", post(confirm::resolve))
        .route_layer(middleware::from_fn_with_state(state.clone(), session_auth));

    let app_routes = Router::new()
        .route("/api/score/consume", post(consume::consume_new))
        .route_layer(middleware::from_fn_with_state(state.clone(), app_auth));

    let sync_routes = Router::new()
        .route("/auth/sync", post(account::sync))
        .route_layer(middleware::from_fn_with_state(state.clone(), sync_auth));

    let public_routes = Router::new()
        .route("/confirm/{token}", get(confirm::lookup))
        .route("/leaderboard", get(leaderboard::get));

    Router::new()
        .merge(session_routes)
        .merge(app_routes)
        .merge(sync_routes)
        .merge(public_routes)
        .with_state(state)
}

pub async fn run(
    engine: Engine,
    scores: Arc<dyn ScoreSource>,
    settings: ServerSettings,
) -> Result<(), std::io::Error> {
    let listener = tokio::net::TcpListener::bind(&settings.bind).await?;
    run_with_listener(engine, scores, settings, listener).await
}

pub async fn run_with_listener(
    engine: Engine,
    scores: Arc<dyn ScoreSource>,
    settings: ServerSettings,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
        scores,
        settings: Arc::new(settings),
    };

    axum::serve(listener, router(state)).await
}
