use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    App, BatchTransferCmd, ConsumeCmd, Consumption, EngineError, OperationStatus, ResultEngine,
    Transfer, TransferCmd, apps,
    consumptions::{self, DEFAULT_PURPOSE},
    transfers::{self, NewTransfer},
    util::{normalize_optional_text, random_token, require_positive},
};

use super::{Engine, with_tx};

/// What a request operation hands back to its caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Receipt {
    pub id: Uuid,
    pub confirm_token: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BatchReceipt {
    pub batch_id: Uuid,
    pub confirm_token: String,
    /// Ids of the transfers actually created.
    pub transfers: Vec<Uuid>,
    /// Receivers whose entries were dropped (bad amount, unknown user, sender).
    pub skipped: Vec<String>,
}

/// A consumption together with the names needed to show it to the payer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConsumptionDetails {
    pub consumption: Consumption,
    pub payer_username: String,
    pub app_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TransferDetails {
    pub transfer: Transfer,
    pub from_username: String,
    pub to_username: String,
}

/// Everything reachable through one confirmation token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "details", rename_all = "snake_case")]
pub enum PendingOperation {
    Consumption(ConsumptionDetails),
    /// One element for a single transfer, one per recipient for a batch.
    Transfer(Vec<TransferDetails>),
}

impl Engine {
    /// Record a pending consumption on behalf of an authenticated app.
    ///
    /// Nothing moves until the payer confirms the returned token.
    pub async fn request_consumption(&self, app: &App, cmd: ConsumeCmd) -> ResultEngine<Receipt> {
        require_positive(cmd.amount)?;
        let purpose = normalize_optional_text(cmd.purpose.as_deref())
            .unwrap_or_else(|| DEFAULT_PURPOSE.to_string());
        let created_at = Utc::now();

        with_tx!(self, |db_tx| {
            let payer = self
                .find_account_by_username(&db_tx, &cmd.username)
                .await?
                .ok_or_else(|| EngineError::not_found("user"))?;
            if payer.actual_score < cmd.amount {
                return Err(EngineError::InsufficientBalance {
                    current_score: payer.actual_score,
                });
            }

            let fee = self.fees.consumption(cmd.amount);
            let consumption = Consumption::new(
                payer.external_id,
                app.id,
                cmd.amount,
                fee,
                purpose,
                random_token(),
                created_at,
            );
            consumptions::ActiveModel::from(&consumption)
                .insert(&db_tx)
                .await?;

            tracing::info!(
                consumption = %consumption.id,
                app = %app.id,
                payer = payer.external_id,
                "consumption of {} requested",
                consumption.amount
            );
            Ok(Receipt {
                id: consumption.id,
                confirm_token: consumption.confirm_token,
            })
        })
    }

    /// Record a pending transfer from `cmd.sender_id` to the named receiver.
    pub async fn request_transfer(&self, cmd: TransferCmd) -> ResultEngine<Receipt> {
        let message = normalize_optional_text(cmd.message.as_deref());
        let created_at = Utc::now();

        with_tx!(self, |db_tx| {
            let sender = self.require_account(&db_tx, cmd.sender_id).await?;
            if cmd.receiver.trim() == sender.username {
                return Err(EngineError::SelfTransfer);
            }
            require_positive(cmd.amount)?;

            let receiver = self
                .find_account_by_username(&db_tx, &cmd.receiver)
                .await?
                .ok_or_else(|| EngineError::not_found("user"))?;
            if receiver.external_id == sender.external_id {
                return Err(EngineError::SelfTransfer);
            }
            if sender.actual_score < cmd.amount {
                return Err(EngineError::InsufficientBalance {
                    current_score: sender.actual_score,
                });
            }

            let transfer = Transfer::new(NewTransfer {
                from_id: sender.external_id,
                to_id: receiver.external_id,
                amount: cmd.amount,
                fee: self.fees.transfer(cmd.amount),
                message,
                batch_id: None,
                min_trust_level: cmd.min_trust_level,
                confirm_token: random_token(),
                created_at,
            });
            transfers::ActiveModel::from(&transfer).insert(&db_tx).await?;

            tracing::info!(
                transfer = %transfer.id,
                from = sender.external_id,
                to = receiver.external_id,
                "transfer of {} requested",
                transfer.amount
            );
            Ok(Receipt {
                id: transfer.id,
                confirm_token: transfer.confirm_token,
            })
        })
    }

    /// Record one pending transfer per valid entry, all under one token.
    ///
    /// The sender must be able to cover the sum of the positive amounts.
    /// Entries with a non-positive amount, an unknown receiver, or the sender
    /// as receiver are skipped rather than failing the whole batch.
    pub async fn request_batch_transfer(&self, cmd: BatchTransferCmd) -> ResultEngine<BatchReceipt> {
        let total = cmd
            .requested_total()
            .ok_or_else(|| EngineError::InvalidAmount("batch total overflows".to_string()))?;
        let created_at = Utc::now();
        let batch_id = Uuid::new_v4();
        let confirm_token = random_token();

        with_tx!(self, |db_tx| {
            let sender = self.require_account(&db_tx, cmd.sender_id).await?;
            if sender.actual_score < total {
                return Err(EngineError::InsufficientBalance {
                    current_score: sender.actual_score,
                });
            }

            let mut created = Vec::new();
            let mut skipped = Vec::new();
            for entry in &cmd.entries {
                if entry.amount <= 0 {
                    skipped.push(entry.receiver.clone());
                    continue;
                }
                let receiver = match self.find_account_by_username(&db_tx, &entry.receiver).await? {
                    Some(receiver) if receiver.external_id != sender.external_id => receiver,
                    _ => {
                        skipped.push(entry.receiver.clone());
                        continue;
                    }
                };

                let transfer = Transfer::new(NewTransfer {
                    from_id: sender.external_id,
                    to_id: receiver.external_id,
                    amount: entry.amount,
                    fee: self.fees.transfer(entry.amount),
                    message: normalize_optional_text(entry.message.as_deref()),
                    batch_id: Some(batch_id),
                    min_trust_level: cmd.min_trust_level,
                    confirm_token: confirm_token.clone(),
                    created_at,
                });
                transfers::ActiveModel::from(&transfer).insert(&db_tx).await?;
                created.push(transfer.id);
            }

            if created.is_empty() {
                tracing::warn!(batch = %batch_id, "batch transfer has no valid entries");
            } else {
                tracing::info!(
                    batch = %batch_id,
                    from = sender.external_id,
                    "batch of {} transfers requested, {} skipped",
                    created.len(),
                    skipped.len()
                );
            }
            Ok(BatchReceipt {
                batch_id,
                confirm_token,
                transfers: created,
                skipped,
            })
        })
    }

    /// Pending operation behind a confirmation token.
    ///
    /// Resolved and unknown tokens are both `NotFound`.
    pub async fn lookup(&self, token: &str) -> ResultEngine<PendingOperation> {
        with_tx!(self, |db_tx| {
            load_operation(&db_tx, token, Some(OperationStatus::Pending)).await
        })
    }

    /// Operation behind a token whatever its status, for auditing.
    pub async fn operation(&self, token: &str) -> ResultEngine<PendingOperation> {
        with_tx!(self, |db_tx| load_operation(&db_tx, token, None).await)
    }
}

async fn load_operation(
    db: &DatabaseTransaction,
    token: &str,
    status: Option<OperationStatus>,
) -> ResultEngine<PendingOperation> {
    let mut consumption_query =
        consumptions::Entity::find().filter(consumptions::Column::ConfirmToken.eq(token));
    if let Some(status) = status {
        consumption_query = consumption_query.filter(consumptions::Column::Status.eq(status.as_str()));
    }
    if let Some(model) = consumption_query.one(db).await? {
        let consumption = Consumption::try_from(model)?;
        let payer_username = username(db, consumption.payer_id).await?;
        let app_name = apps::Entity::find_by_id(consumption.app_id.to_string())
            .one(db)
            .await?
            .map(|app| app.name)
            .ok_or_else(|| EngineError::not_found("app"))?;
        return Ok(PendingOperation::Consumption(ConsumptionDetails {
            consumption,
            payer_username,
            app_name,
        }));
    }

    let mut transfer_query = transfers::Entity::find()
        .filter(transfers::Column::ConfirmToken.eq(token))
        .order_by_asc(transfers::Column::CreatedAt)
        .order_by_asc(transfers::Column::Id);
    if let Some(status) = status {
        transfer_query = transfer_query.filter(transfers::Column::Status.eq(status.as_str()));
    }
    let models = transfer_query.all(db).await?;
    if models.is_empty() {
        return Err(EngineError::not_found("confirmation"));
    }

    let mut names: HashMap<i64, String> = HashMap::new();
    let mut details = Vec::with_capacity(models.len());
    for model in models {
        let transfer = Transfer::try_from(model)?;
        let from_username = cached_username(db, &mut names, transfer.from_id).await?;
        let to_username = cached_username(db, &mut names, transfer.to_id).await?;
        details.push(TransferDetails {
            transfer,
            from_username,
            to_username,
        });
    }
    Ok(PendingOperation::Transfer(details))
}

pub(super) async fn username(db: &DatabaseTransaction, account_id: i64) -> ResultEngine<String> {
    crate::accounts::Entity::find_by_id(account_id)
        .one(db)
        .await?
        .map(|account| account.username)
        .ok_or_else(|| EngineError::not_found("account"))
}

async fn cached_username(
    db: &DatabaseTransaction,
    names: &mut HashMap<i64, String>,
    account_id: i64,
) -> ResultEngine<String> {
    if let Some(name) = names.get(&account_id) {
        return Ok(name.clone());
    }
    let name = username(db, account_id).await?;
    names.insert(account_id, name.clone());
    Ok(name)
}
