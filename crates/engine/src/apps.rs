//! Third-party applications allowed to request consumptions.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, util::parse_uuid};

/// A registered application.
///
/// The credential pair is `client_id:client_secret`; both halves are random
/// hex strings generated on creation and never change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct App {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub redirect_uri: String,
    pub owner_id: i64,
    pub client_id: String,
    pub client_secret: String,
    pub created_at: DateTime<Utc>,
}

impl App {
    pub(crate) fn new(
        owner_id: i64,
        name: String,
        description: String,
        redirect_uri: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            description,
            redirect_uri,
            owner_id,
            // 16 random bytes for the id, 32 for the secret.
            client_id: Uuid::new_v4().simple().to_string(),
            client_secret: format!(
                "{}{}",
                Uuid::new_v4().simple(),
                Uuid::new_v4().simple()
            ),
            created_at,
        }
    }
}

/// Split an opaque `client_id:client_secret` credential.
///
/// Exactly one separator is accepted and neither half may be empty.
pub(crate) fn split_credential(credential: &str) -> ResultEngine<(&str, &str)> {
    let mut parts = credential.trim().split(':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(id), Some(secret), None) if !id.is_empty() && !secret.is_empty() => {
            Ok((id, secret))
        }
        _ => Err(EngineError::AuthFailed),
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "apps")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub description: String,
    pub redirect_uri: String,
    pub owner_id: i64,
    #[sea_orm(unique)]
    pub client_id: String,
    #[sea_orm(unique)]
    pub client_secret: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::OwnerId",
        to = "super::accounts::Column::ExternalId",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Owner,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&App> for ActiveModel {
    fn from(value: &App) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            name: ActiveValue::Set(value.name.clone()),
            description: ActiveValue::Set(value.description.clone()),
            redirect_uri: ActiveValue::Set(value.redirect_uri.clone()),
            owner_id: ActiveValue::Set(value.owner_id),
            client_id: ActiveValue::Set(value.client_id.clone()),
            client_secret: ActiveValue::Set(value.client_secret.clone()),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}

impl TryFrom<Model> for App {
    type Error = EngineError;

    fn try_from(value: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&value.id, "app")?,
            name: value.name,
            description: value.description,
            redirect_uri: value.redirect_uri,
            owner_id: value.owner_id,
            client_id: value.client_id,
            client_secret: value.client_secret,
            created_at: value.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_credentials_have_expected_shape() {
        let app = App::new(
            1,
            "Shop".to_string(),
            String::new(),
            "https://shop.example/cb".to_string(),
            Utc::now(),
        );
        assert_eq!(app.client_id.len(), 32);
        assert_eq!(app.client_secret.len(), 64);
        assert!(app.client_secret.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(app.client_secret[..32], app.client_secret[32..]);
    }

    #[test]
    fn split_credential_accepts_one_separator() {
        assert_eq!(split_credential("abc:def"), Ok(("abc", "def")));
        assert_eq!(split_credential(" abc:def\n"), Ok(("abc", "def")));
    }

    #[test]
    fn split_credential_rejects_malformed_input() {
        for bad in ["", "abc", "abc:", ":def", "a:b:c", "::"] {
            assert_eq!(split_credential(bad), Err(EngineError::AuthFailed), "{bad:?}");
        }
    }
}
