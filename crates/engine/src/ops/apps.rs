use chrono::Utc;
use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    App, AppNewCmd, EngineError, ResultEngine,
    apps::{self, split_credential},
    util::{normalize_optional_text, normalize_required_text},
};

use super::{Engine, with_tx};

/// Lowest forum trust level allowed to register applications.
const MIN_TRUST_TO_CREATE_APP: i32 = 1;

impl Engine {
    /// Register a new application owned by `cmd.owner_id`.
    pub async fn create_app(&self, cmd: AppNewCmd) -> ResultEngine<App> {
        let name = normalize_required_text(&cmd.name, "app name")?;
        let redirect_uri = normalize_required_text(&cmd.redirect_uri, "redirect uri")?;
        let description = normalize_optional_text(cmd.description.as_deref()).unwrap_or_default();
        let created_at = Utc::now();

        with_tx!(self, |db_tx| {
            let owner = self.require_account(&db_tx, cmd.owner_id).await?;
            if owner.trust_level < MIN_TRUST_TO_CREATE_APP {
                return Err(EngineError::Forbidden(format!(
                    "trust level {MIN_TRUST_TO_CREATE_APP} required to create applications"
                )));
            }

            let app = App::new(owner.external_id, name, description, redirect_uri, created_at);
            apps::ActiveModel::from(&app).insert(&db_tx).await?;
            tracing::info!(app = %app.id, owner = owner.external_id, "registered app {}", app.name);
            Ok(app)
        })
    }

    /// Applications owned by an account, oldest first.
    pub async fn apps(&self, owner_id: i64) -> ResultEngine<Vec<App>> {
        let models = apps::Entity::find()
            .filter(apps::Column::OwnerId.eq(owner_id))
            .order_by_asc(apps::Column::CreatedAt)
            .all(&self.database)
            .await?;
        models.into_iter().map(App::try_from).collect()
    }

    /// Resolve a raw `client_id:client_secret` credential.
    ///
    /// Every failure, storage errors included, surfaces as `AuthFailed`.
    pub async fn authenticate_app(&self, credential: &str) -> ResultEngine<App> {
        let (client_id, client_secret) = split_credential(credential).inspect_err(|_| {
            tracing::warn!("rejected malformed app credential");
        })?;

        let found = apps::Entity::find()
            .filter(apps::Column::ClientId.eq(client_id))
            .filter(apps::Column::ClientSecret.eq(client_secret))
            .one(&self.database)
            .await;

        match found {
            Ok(Some(model)) => App::try_from(model),
            Ok(None) => {
                tracing::warn!(client_id, "unknown app credential");
                Err(EngineError::AuthFailed)
            }
            Err(err) => {
                tracing::error!("app authentication lookup failed: {err}");
                Err(EngineError::AuthFailed)
            }
        }
    }
}
