//! The module contains the `Account` struct and its storage model.
//!
//! An account mirrors a forum identity. Its spendable balance is
//! `actual_score`; `original_score` is only the last externally observed value.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A user account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Stable identifier coming from the identity provider.
    pub external_id: i64,
    pub username: String,
    pub name: String,
    pub trust_level: i32,
    pub original_score: i64,
    pub actual_score: i64,
    pub total_transferred: i64,
    pub total_received: i64,
    pub total_consumed: i64,
    pub total_fee_paid: i64,
    pub show_in_leaderboard: bool,
    pub last_synced_at: DateTime<Utc>,
}

impl Account {
    /// Points consumed or given away since the last sync, as shown on the
    /// dashboard.
    pub fn consumed_score(&self) -> i64 {
        self.original_score - self.actual_score
    }
}

/// Identity tuple yielded by the identity provider on login.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForumIdentity {
    pub external_id: i64,
    pub username: String,
    pub name: String,
    pub trust_level: i32,
}

/// Statistic a leaderboard is ordered by.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardKind {
    #[default]
    Balance,
    Transferred,
    Received,
    Consumed,
}

impl LeaderboardKind {
    pub(crate) fn column(self) -> Column {
        match self {
            Self::Balance => Column::ActualScore,
            Self::Transferred => Column::TotalTransferred,
            Self::Received => Column::TotalReceived,
            Self::Consumed => Column::TotalConsumed,
        }
    }

    /// Value of this statistic for an account.
    pub fn value(self, account: &Account) -> i64 {
        match self {
            Self::Balance => account.actual_score,
            Self::Transferred => account.total_transferred,
            Self::Received => account.total_received,
            Self::Consumed => account.total_consumed,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub external_id: i64,
    #[sea_orm(unique)]
    pub username: String,
    pub name: String,
    pub trust_level: i32,
    pub original_score: i64,
    pub actual_score: i64,
    pub total_transferred: i64,
    pub total_received: i64,
    pub total_consumed: i64,
    pub total_fee_paid: i64,
    pub show_in_leaderboard: bool,
    pub last_synced_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Account {
    fn from(value: Model) -> Self {
        Self {
            external_id: value.external_id,
            username: value.username,
            name: value.name,
            trust_level: value.trust_level,
            original_score: value.original_score,
            actual_score: value.actual_score,
            total_transferred: value.total_transferred,
            total_received: value.total_received,
            total_consumed: value.total_consumed,
            total_fee_paid: value.total_fee_paid,
            show_in_leaderboard: value.show_in_leaderboard,
            last_synced_at: value.last_synced_at,
        }
    }
}

/// First-login seeding rule.
///
/// A known account keeps its balance across syncs unless the balance is still
/// exactly zero, in which case it is re-seeded from the external score. This
/// also re-seeds accounts that legitimately spent down to zero.
pub(crate) fn seeded_balance(current: i64, external_score: i64) -> i64 {
    if current == 0 { external_score } else { current }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_balance_is_reseeded() {
        assert_eq!(seeded_balance(0, 420), 420);
    }

    #[test]
    fn non_zero_balance_is_kept() {
        assert_eq!(seeded_balance(10, 420), 10);
        assert_eq!(seeded_balance(900, 0), 900);
    }

    #[test]
    fn leaderboard_value_follows_kind() {
        let account = Account {
            external_id: 1,
            username: "alice".to_string(),
            name: "Alice".to_string(),
            trust_level: 2,
            original_score: 500,
            actual_score: 300,
            total_transferred: 150,
            total_received: 20,
            total_consumed: 50,
            total_fee_paid: 1,
            show_in_leaderboard: true,
            last_synced_at: Utc::now(),
        };
        assert_eq!(LeaderboardKind::Balance.value(&account), 300);
        assert_eq!(LeaderboardKind::Transferred.value(&account), 150);
        assert_eq!(LeaderboardKind::Received.value(&account), 20);
        assert_eq!(LeaderboardKind::Consumed.value(&account), 50);
        assert_eq!(account.consumed_score(), 200);
    }
}
