//! Pending transfers between two accounts.
//!
//! A batch request creates one row per recipient. Siblings share `batch_id`
//! and `confirm_token`, so one confirmation resolves all of them.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, OperationStatus, fees::TransferFee, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferKind {
    Single,
    Batch,
}

impl TransferKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Batch => "batch",
        }
    }
}

impl TryFrom<&str> for TransferKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "single" => Ok(Self::Single),
            "batch" => Ok(Self::Batch),
            other => Err(EngineError::NotFound(format!(
                "invalid transfer kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: Uuid,
    pub from_id: i64,
    pub to_id: i64,
    /// Gross amount debited from the sender.
    pub amount: i64,
    pub fee_amount: i64,
    /// Net amount credited to the receiver.
    pub actual_amount: i64,
    pub message: Option<String>,
    pub kind: TransferKind,
    pub batch_id: Option<Uuid>,
    /// Stored for display; settlement does not enforce it.
    pub min_trust_level: Option<i32>,
    pub status: OperationStatus,
    pub confirm_token: String,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Input for [`Transfer::new`]; `batch_id` decides the kind.
pub(crate) struct NewTransfer {
    pub from_id: i64,
    pub to_id: i64,
    pub amount: i64,
    pub fee: TransferFee,
    pub message: Option<String>,
    pub batch_id: Option<Uuid>,
    pub min_trust_level: Option<i32>,
    pub confirm_token: String,
    pub created_at: DateTime<Utc>,
}

impl Transfer {
    pub(crate) fn new(input: NewTransfer) -> Self {
        let kind = if input.batch_id.is_some() {
            TransferKind::Batch
        } else {
            TransferKind::Single
        };
        Self {
            id: Uuid::new_v4(),
            from_id: input.from_id,
            to_id: input.to_id,
            amount: input.amount,
            fee_amount: input.fee.fee_amount,
            actual_amount: input.fee.actual_amount,
            message: input.message,
            kind,
            batch_id: input.batch_id,
            min_trust_level: input.min_trust_level,
            status: OperationStatus::Pending,
            confirm_token: input.confirm_token,
            created_at: input.created_at,
            resolved_at: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "pending_transfers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub from_id: i64,
    pub to_id: i64,
    pub amount: i64,
    pub fee_amount: i64,
    pub actual_amount: i64,
    pub message: Option<String>,
    pub kind: String,
    pub batch_id: Option<String>,
    pub min_trust_level: Option<i32>,
    pub status: String,
    pub confirm_token: String,
    pub created_at: DateTimeUtc,
    pub resolved_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::FromId",
        to = "super::accounts::Column::ExternalId",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Sender,
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::ToId",
        to = "super::accounts::Column::ExternalId",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Receiver,
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transfer> for ActiveModel {
    fn from(value: &Transfer) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            from_id: ActiveValue::Set(value.from_id),
            to_id: ActiveValue::Set(value.to_id),
            amount: ActiveValue::Set(value.amount),
            fee_amount: ActiveValue::Set(value.fee_amount),
            actual_amount: ActiveValue::Set(value.actual_amount),
            message: ActiveValue::Set(value.message.clone()),
            kind: ActiveValue::Set(value.kind.as_str().to_string()),
            batch_id: ActiveValue::Set(value.batch_id.map(|id| id.to_string())),
            min_trust_level: ActiveValue::Set(value.min_trust_level),
            status: ActiveValue::Set(value.status.as_str().to_string()),
            confirm_token: ActiveValue::Set(value.confirm_token.clone()),
            created_at: ActiveValue::Set(value.created_at),
            resolved_at: ActiveValue::Set(value.resolved_at),
        }
    }
}

impl TryFrom<Model> for Transfer {
    type Error = EngineError;

    fn try_from(value: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&value.id, "transfer")?,
            from_id: value.from_id,
            to_id: value.to_id,
            amount: value.amount,
            fee_amount: value.fee_amount,
            actual_amount: value.actual_amount,
            message: value.message,
            kind: TransferKind::try_from(value.kind.as_str())?,
            batch_id: value
                .batch_id
                .as_deref()
                .map(|id| parse_uuid(id, "batch"))
                .transpose()?,
            min_trust_level: value.min_trust_level,
            status: OperationStatus::try_from(value.status.as_str())?,
            confirm_token: value.confirm_token,
            created_at: value.created_at,
            resolved_at: value.resolved_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_transfer(batch_id: Option<Uuid>) -> Transfer {
        Transfer::new(NewTransfer {
            from_id: 1,
            to_id: 2,
            amount: 1500,
            fee: TransferFee {
                fee_amount: 105,
                actual_amount: 1395,
            },
            message: None,
            batch_id,
            min_trust_level: None,
            confirm_token: "token".to_string(),
            created_at: Utc::now(),
        })
    }

    #[test]
    fn kind_follows_batch_id() {
        assert_eq!(new_transfer(None).kind, TransferKind::Single);
        assert_eq!(new_transfer(Some(Uuid::new_v4())).kind, TransferKind::Batch);
    }

    #[test]
    fn new_transfer_starts_pending_with_fee_split() {
        let transfer = new_transfer(None);
        assert_eq!(transfer.status, OperationStatus::Pending);
        assert_eq!(transfer.amount - transfer.fee_amount, transfer.actual_amount);
        assert!(transfer.resolved_at.is_none());
    }

    #[test]
    fn model_round_trip_keeps_batch_id() {
        let transfer = new_transfer(Some(Uuid::new_v4()));
        let active = ActiveModel::from(&transfer);
        let model = Model {
            id: transfer.id.to_string(),
            from_id: transfer.from_id,
            to_id: transfer.to_id,
            amount: transfer.amount,
            fee_amount: transfer.fee_amount,
            actual_amount: transfer.actual_amount,
            message: None,
            kind: "batch".to_string(),
            batch_id: active.batch_id.clone().unwrap(),
            min_trust_level: None,
            status: "pending".to_string(),
            confirm_token: transfer.confirm_token.clone(),
            created_at: transfer.created_at,
            resolved_at: None,
        };
        assert_eq!(Transfer::try_from(model).unwrap(), transfer);
    }
}
