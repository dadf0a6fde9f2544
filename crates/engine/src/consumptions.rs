//! Pending consumptions: an app asking to burn points from a user.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, OperationStatus, fees::ConsumptionFee, util::parse_uuid};

pub const DEFAULT_PURPOSE: &str = "unspecified";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consumption {
    pub id: Uuid,
    pub payer_id: i64,
    pub app_id: Uuid,
    /// Gross amount debited from the payer.
    pub amount: i64,
    /// Net share attributed to the app. Informational: apps hold no balance.
    pub developer_amount: i64,
    pub fee_amount: i64,
    pub purpose: String,
    pub status: OperationStatus,
    pub confirm_token: String,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Consumption {
    pub(crate) fn new(
        payer_id: i64,
        app_id: Uuid,
        amount: i64,
        fee: ConsumptionFee,
        purpose: String,
        confirm_token: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            payer_id,
            app_id,
            amount,
            developer_amount: fee.developer_amount,
            fee_amount: fee.fee_amount,
            purpose,
            status: OperationStatus::Pending,
            confirm_token,
            created_at,
            resolved_at: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "pending_consumptions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub payer_id: i64,
    pub app_id: String,
    pub amount: i64,
    pub developer_amount: i64,
    pub fee_amount: i64,
    pub purpose: String,
    pub status: String,
    #[sea_orm(unique)]
    pub confirm_token: String,
    pub created_at: DateTimeUtc,
    pub resolved_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::PayerId",
        to = "super::accounts::Column::ExternalId",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Payer,
    #[sea_orm(
        belongs_to = "super::apps::Entity",
        from = "Column::AppId",
        to = "super::apps::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    App,
}

impl Related<super::apps::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::App.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Consumption> for ActiveModel {
    fn from(value: &Consumption) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            payer_id: ActiveValue::Set(value.payer_id),
            app_id: ActiveValue::Set(value.app_id.to_string()),
            amount: ActiveValue::Set(value.amount),
            developer_amount: ActiveValue::Set(value.developer_amount),
            fee_amount: ActiveValue::Set(value.fee_amount),
            purpose: ActiveValue::Set(value.purpose.clone()),
            status: ActiveValue::Set(value.status.as_str().to_string()),
            confirm_token: ActiveValue::Set(value.confirm_token.clone()),
            created_at: ActiveValue::Set(value.created_at),
            resolved_at: ActiveValue::Set(value.resolved_at),
        }
    }
}

impl TryFrom<Model> for Consumption {
    type Error = EngineError;

    fn try_from(value: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&value.id, "consumption")?,
            payer_id: value.payer_id,
            app_id: parse_uuid(&value.app_id, "app")?,
            amount: value.amount,
            developer_amount: value.developer_amount,
            fee_amount: value.fee_amount,
            purpose: value.purpose,
            status: OperationStatus::try_from(value.status.as_str())?,
            confirm_token: value.confirm_token,
            created_at: value.created_at,
            resolved_at: value.resolved_at,
        })
    }
}
