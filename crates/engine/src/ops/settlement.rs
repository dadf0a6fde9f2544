use chrono::{DateTime, Utc};
use sea_orm::{
    ConnectionTrait, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder, Statement,
    TransactionTrait, prelude::*,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    ConfirmAction, Consumption, EngineError, OperationStatus, ResultEngine, Transfer,
    consumptions, transfers,
};

use super::{Engine, ledger::username, with_tx};

/// One leg of a confirmed transfer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SettledTransfer {
    pub transfer_id: Uuid,
    pub to_username: String,
    pub amount: i64,
    pub fee_amount: i64,
    pub actual_amount: i64,
}

/// Outcome of resolving a confirmation token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Settlement {
    Consumed {
        consumption_id: Uuid,
        username: String,
        consumed: i64,
        fee_amount: i64,
        remaining_score: i64,
    },
    Transferred {
        from_username: String,
        transfers: Vec<SettledTransfer>,
        remaining_score: i64,
        /// `Some` for batch transfers: whether no sibling is left unconfirmed.
        batch_complete: Option<bool>,
    },
    Rejected,
}

const CONSUMPTIONS_TABLE: &str = "pending_consumptions";
const TRANSFERS_TABLE: &str = "pending_transfers";

#[derive(Clone, Copy)]
enum Spend {
    Consumption,
    Transfer,
}

impl Spend {
    fn stat_column(self) -> &'static str {
        match self {
            Self::Consumption => "total_consumed",
            Self::Transfer => "total_transferred",
        }
    }
}

impl Engine {
    /// Confirm or reject whatever is pending behind `token`.
    ///
    /// Only rows paid or sent by `actor_id` are considered, so another user's
    /// token looks exactly like an unknown one. Status flips are conditional on
    /// the row still being pending, so a token settles at most once; a losing
    /// racer sees `NotFound`. On confirm the debit is guarded by the balance,
    /// and an `InsufficientBalance` leaves the operation pending.
    pub async fn resolve(
        &self,
        token: &str,
        actor_id: i64,
        action: ConfirmAction,
    ) -> ResultEngine<Settlement> {
        let resolved_at = Utc::now();
        with_tx!(self, |db_tx| {
            let consumption = consumptions::Entity::find()
                .filter(consumptions::Column::ConfirmToken.eq(token))
                .filter(consumptions::Column::PayerId.eq(actor_id))
                .filter(consumptions::Column::Status.eq(OperationStatus::Pending.as_str()))
                .one(&db_tx)
                .await?;

            match consumption {
                Some(model) => {
                    let consumption = Consumption::try_from(model)?;
                    self.resolve_consumption(&db_tx, consumption, actor_id, action, resolved_at)
                        .await
                }
                None => {
                    let models = transfers::Entity::find()
                        .filter(transfers::Column::ConfirmToken.eq(token))
                        .filter(transfers::Column::FromId.eq(actor_id))
                        .filter(transfers::Column::Status.eq(OperationStatus::Pending.as_str()))
                        .order_by_asc(transfers::Column::CreatedAt)
                        .order_by_asc(transfers::Column::Id)
                        .all(&db_tx)
                        .await?;
                    let pending = models
                        .into_iter()
                        .map(Transfer::try_from)
                        .collect::<ResultEngine<Vec<_>>>()?;
                    self.resolve_transfers(&db_tx, pending, actor_id, action, resolved_at)
                        .await
                }
            }
        })
    }

    async fn resolve_consumption(
        &self,
        db: &DatabaseTransaction,
        consumption: Consumption,
        actor_id: i64,
        action: ConfirmAction,
        resolved_at: DateTime<Utc>,
    ) -> ResultEngine<Settlement> {
        if action == ConfirmAction::Reject {
            mark_resolved(db, CONSUMPTIONS_TABLE, consumption.id, action, resolved_at)
                .await?;
            tracing::info!(consumption = %consumption.id, "consumption rejected");
            return Ok(Settlement::Rejected);
        }

        let payer = self.require_account(db, actor_id).await?;
        if payer.actual_score < consumption.amount {
            return Err(EngineError::InsufficientBalance {
                current_score: payer.actual_score,
            });
        }

        mark_resolved(db, CONSUMPTIONS_TABLE, consumption.id, action, resolved_at)
            .await?;
        debit(
            db,
            actor_id,
            consumption.amount,
            consumption.fee_amount,
            Spend::Consumption,
        )
        .await?;

        let payer = self.require_account(db, actor_id).await?;
        tracing::info!(
            consumption = %consumption.id,
            payer = actor_id,
            "consumed {}, remaining {}",
            consumption.amount,
            payer.actual_score
        );
        Ok(Settlement::Consumed {
            consumption_id: consumption.id,
            username: payer.username,
            consumed: consumption.amount,
            fee_amount: consumption.fee_amount,
            remaining_score: payer.actual_score,
        })
    }

    async fn resolve_transfers(
        &self,
        db: &DatabaseTransaction,
        pending: Vec<Transfer>,
        actor_id: i64,
        action: ConfirmAction,
        resolved_at: DateTime<Utc>,
    ) -> ResultEngine<Settlement> {
        let Some(batch_id) = pending.first().map(|t| t.batch_id) else {
            return Err(EngineError::not_found("confirmation"));
        };

        let table = TRANSFERS_TABLE;
        if action == ConfirmAction::Reject {
            for transfer in &pending {
                mark_resolved(db, table, transfer.id, action, resolved_at).await?;
            }
            tracing::info!(sender = actor_id, "{} transfer(s) rejected", pending.len());
            return Ok(Settlement::Rejected);
        }

        // Siblings settle one by one; any the balance no longer covers stay pending.
        let mut balance = self.require_account(db, actor_id).await?.actual_score;
        let mut settled = Vec::with_capacity(pending.len());
        for transfer in &pending {
            if balance < transfer.amount {
                tracing::info!(
                    transfer = %transfer.id,
                    "left pending: {} exceeds balance {balance}",
                    transfer.amount
                );
                continue;
            }
            mark_resolved(db, table, transfer.id, action, resolved_at).await?;
            debit(db, actor_id, transfer.amount, transfer.fee_amount, Spend::Transfer).await?;
            credit(db, transfer.to_id, transfer.actual_amount).await?;
            balance -= transfer.amount;
            settled.push(SettledTransfer {
                transfer_id: transfer.id,
                to_username: username(db, transfer.to_id).await?,
                amount: transfer.amount,
                fee_amount: transfer.fee_amount,
                actual_amount: transfer.actual_amount,
            });
        }
        if settled.is_empty() {
            return Err(EngineError::InsufficientBalance {
                current_score: balance,
            });
        }

        let batch_complete = match batch_id {
            Some(batch_id) => {
                let unconfirmed = transfers::Entity::find()
                    .filter(transfers::Column::BatchId.eq(batch_id.to_string()))
                    .filter(transfers::Column::Status.ne(OperationStatus::Confirmed.as_str()))
                    .count(db)
                    .await?;
                Some(unconfirmed == 0)
            }
            None => None,
        };

        let sender = self.require_account(db, actor_id).await?;
        tracing::info!(
            sender = actor_id,
            "settled {} of {} transfer(s), remaining {}",
            settled.len(),
            pending.len(),
            sender.actual_score
        );
        Ok(Settlement::Transferred {
            from_username: sender.username,
            transfers: settled,
            remaining_score: sender.actual_score,
            batch_complete,
        })
    }
}

/// Flip one row from pending to the action's terminal status.
///
/// Zero affected rows means someone else resolved it first.
async fn mark_resolved(
    db: &DatabaseTransaction,
    table: &str,
    id: Uuid,
    action: ConfirmAction,
    resolved_at: DateTime<Utc>,
) -> ResultEngine<()> {
    let stmt = Statement::from_sql_and_values(
        db.get_database_backend(),
        format!("UPDATE {table} SET status = ?, resolved_at = ? WHERE id = ? AND status = ?"),
        [
            action.target_status().as_str().into(),
            resolved_at.into(),
            id.to_string().into(),
            OperationStatus::Pending.as_str().into(),
        ],
    );
    if db.execute(stmt).await?.rows_affected() != 1 {
        return Err(EngineError::not_found("confirmation"));
    }
    Ok(())
}

/// Take `amount` from an account, never below zero, and bump its statistics.
async fn debit(
    db: &DatabaseTransaction,
    account_id: i64,
    amount: i64,
    fee_amount: i64,
    spend: Spend,
) -> ResultEngine<()> {
    let stat = spend.stat_column();
    let stmt = Statement::from_sql_and_values(
        db.get_database_backend(),
        format!(
            "UPDATE accounts SET actual_score = actual_score - ?, {stat} = {stat} + ?, \
             total_fee_paid = total_fee_paid + ? WHERE external_id = ? AND actual_score >= ?"
        ),
        [
            amount.into(),
            amount.into(),
            fee_amount.into(),
            account_id.into(),
            amount.into(),
        ],
    );
    if db.execute(stmt).await?.rows_affected() != 1 {
        let current_score = crate::accounts::Entity::find_by_id(account_id)
            .one(db)
            .await?
            .map(|account| account.actual_score)
            .ok_or_else(|| EngineError::not_found("account"))?;
        return Err(EngineError::InsufficientBalance { current_score });
    }
    Ok(())
}

async fn credit(db: &DatabaseTransaction, account_id: i64, amount: i64) -> ResultEngine<()> {
    let stmt = Statement::from_sql_and_values(
        db.get_database_backend(),
        "UPDATE accounts SET actual_score = actual_score + ?, total_received = total_received + ? \
         WHERE external_id = ?",
        [amount.into(), amount.into(), account_id.into()],
    );
    if db.execute(stmt).await?.rows_affected() != 1 {
        return Err(EngineError::not_found("account"));
    }
    Ok(())
}
