use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveValue, Condition, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*,
};

use crate::{
    Account, Consumption, EngineError, ForumIdentity, LeaderboardKind, ResultEngine, Transfer,
    accounts::{self, seeded_balance},
    consumptions, sessions, transfers,
    util::{normalize_required_text, random_token},
};

use super::{Engine, with_tx};

/// A line of an account's history: either side of a transfer, or a consumption.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Record {
    Consumption(Consumption),
    Transfer(Transfer),
}

impl Record {
    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            Self::Consumption(c) => c.created_at,
            Self::Transfer(t) => t.created_at,
        }
    }
}

impl Engine {
    /// Create or refresh the account behind a forum identity.
    ///
    /// New accounts start with `actual_score = external_score`. Known accounts
    /// get their identity fields and `original_score` refreshed, while
    /// `actual_score` follows the first-login seeding rule (re-seeded only when
    /// it is still zero).
    ///
    /// A forum rename can leave `username` on another account that has not
    /// synced since. That holder is parked on `{username}~{external_id}` until
    /// its own next sync.
    pub async fn sync_account(
        &self,
        identity: &ForumIdentity,
        external_score: i64,
    ) -> ResultEngine<Account> {
        let username = normalize_required_text(&identity.username, "username")?;
        let trust_level = identity.trust_level.max(0);
        let synced_at = Utc::now();
        with_tx!(self, |db_tx| {
            let stale = accounts::Entity::find()
                .filter(accounts::Column::Username.eq(username.as_str()))
                .filter(accounts::Column::ExternalId.ne(identity.external_id))
                .one(&db_tx)
                .await?;
            if let Some(holder) = stale {
                let parked = format!("{}~{}", holder.username, holder.external_id);
                tracing::warn!(
                    account = holder.external_id,
                    "username {username} moved to account {}, parking as {parked}",
                    identity.external_id
                );
                let mut active: accounts::ActiveModel = holder.into();
                active.username = ActiveValue::Set(parked);
                active.update(&db_tx).await?;
            }

            let existing = accounts::Entity::find_by_id(identity.external_id)
                .one(&db_tx)
                .await?;

            let model = match existing {
                Some(model) => {
                    let actual_score = seeded_balance(model.actual_score, external_score);
                    if actual_score != model.actual_score {
                        tracing::info!(
                            account = identity.external_id,
                            "re-seeding zero balance with {external_score}"
                        );
                    }
                    let mut active: accounts::ActiveModel = model.into();
                    active.username = ActiveValue::Set(username);
                    active.name = ActiveValue::Set(identity.name.trim().to_string());
                    active.trust_level = ActiveValue::Set(trust_level);
                    active.original_score = ActiveValue::Set(external_score);
                    active.actual_score = ActiveValue::Set(actual_score);
                    active.last_synced_at = ActiveValue::Set(synced_at);
                    active.update(&db_tx).await?
                }
                None => {
                    tracing::info!(
                        account = identity.external_id,
                        "creating account for {username}"
                    );
                    let active = accounts::ActiveModel {
                        external_id: ActiveValue::Set(identity.external_id),
                        username: ActiveValue::Set(username),
                        name: ActiveValue::Set(identity.name.trim().to_string()),
                        trust_level: ActiveValue::Set(trust_level),
                        original_score: ActiveValue::Set(external_score),
                        actual_score: ActiveValue::Set(external_score),
                        total_transferred: ActiveValue::Set(0),
                        total_received: ActiveValue::Set(0),
                        total_consumed: ActiveValue::Set(0),
                        total_fee_paid: ActiveValue::Set(0),
                        show_in_leaderboard: ActiveValue::Set(true),
                        last_synced_at: ActiveValue::Set(synced_at),
                    };
                    active.insert(&db_tx).await?
                }
            };

            Ok(Account::from(model))
        })
    }

    /// Return an account snapshot from DB.
    pub async fn account(&self, account_id: i64) -> ResultEngine<Account> {
        with_tx!(self, |db_tx| self.require_account(&db_tx, account_id).await)
    }

    pub async fn account_by_username(&self, username: &str) -> ResultEngine<Account> {
        with_tx!(self, |db_tx| {
            self.find_account_by_username(&db_tx, username)
                .await?
                .ok_or_else(|| EngineError::not_found("user"))
        })
    }

    /// Opt an account in or out of public leaderboards.
    pub async fn set_leaderboard_visibility(
        &self,
        account_id: i64,
        show: bool,
    ) -> ResultEngine<Account> {
        with_tx!(self, |db_tx| {
            self.require_account(&db_tx, account_id).await?;
            let active = accounts::ActiveModel {
                external_id: ActiveValue::Set(account_id),
                show_in_leaderboard: ActiveValue::Set(show),
                ..Default::default()
            };
            let model = active.update(&db_tx).await?;
            Ok(Account::from(model))
        })
    }

    /// Visible accounts ordered by the chosen statistic, highest first.
    ///
    /// Ties are broken by username so pages are stable.
    pub async fn leaderboard(&self, kind: LeaderboardKind, limit: u64) -> ResultEngine<Vec<Account>> {
        let models = accounts::Entity::find()
            .filter(accounts::Column::ShowInLeaderboard.eq(true))
            .order_by_desc(kind.column())
            .order_by_asc(accounts::Column::Username)
            .limit(limit)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Account::from).collect())
    }

    /// Consumptions paid and transfers sent or received, newest first.
    pub async fn history(&self, account_id: i64, limit: u64) -> ResultEngine<Vec<Record>> {
        with_tx!(self, |db_tx| {
            self.require_account(&db_tx, account_id).await?;

            let consumption_models = consumptions::Entity::find()
                .filter(consumptions::Column::PayerId.eq(account_id))
                .order_by_desc(consumptions::Column::CreatedAt)
                .limit(limit)
                .all(&db_tx)
                .await?;
            let transfer_models = transfers::Entity::find()
                .filter(
                    Condition::any()
                        .add(transfers::Column::FromId.eq(account_id))
                        .add(transfers::Column::ToId.eq(account_id)),
                )
                .order_by_desc(transfers::Column::CreatedAt)
                .limit(limit)
                .all(&db_tx)
                .await?;

            let mut records = Vec::with_capacity(consumption_models.len() + transfer_models.len());
            for model in consumption_models {
                records.push(Record::Consumption(Consumption::try_from(model)?));
            }
            for model in transfer_models {
                records.push(Record::Transfer(Transfer::try_from(model)?));
            }
            records.sort_by_key(|record| std::cmp::Reverse(record.created_at()));
            records.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
            Ok(records)
        })
    }

    /// Open a login session and return its bearer token.
    pub async fn open_session(&self, account_id: i64) -> ResultEngine<String> {
        let created_at = Utc::now();
        let token = random_token();
        with_tx!(self, |db_tx| {
            self.require_account(&db_tx, account_id).await?;
            let active = sessions::ActiveModel {
                token: ActiveValue::Set(token.clone()),
                account_id: ActiveValue::Set(account_id),
                created_at: ActiveValue::Set(created_at),
                expires_at: ActiveValue::Set(created_at + Duration::days(sessions::SESSION_TTL_DAYS)),
            };
            active.insert(&db_tx).await?;
            Ok(token)
        })
    }

    /// Resolve a bearer token to its account.
    ///
    /// Unknown and expired sessions are both reported as `NotFound`.
    pub async fn session_account(&self, token: &str) -> ResultEngine<Account> {
        let now = Utc::now();
        with_tx!(self, |db_tx| {
            let session = sessions::Entity::find_by_id(token.to_string())
                .one(&db_tx)
                .await?
                .filter(|session| session.expires_at > now)
                .ok_or_else(|| EngineError::not_found("session"))?;
            self.require_account(&db_tx, session.account_id).await
        })
    }

    pub async fn close_session(&self, token: &str) -> ResultEngine<()> {
        sessions::Entity::delete_by_id(token.to_string())
            .exec(&self.database)
            .await?;
        Ok(())
    }
}
