use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Terminal or pending state of a consumption or transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pending,
    Confirmed,
    Rejected,
}

pub mod account {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Account {
        pub id: i64,
        pub username: String,
        pub name: String,
        pub trust_level: i32,
        pub original_score: i64,
        pub actual_score: i64,
        /// `original_score - actual_score`.
        pub consumed_score: i64,
        pub total_transferred: i64,
        pub total_received: i64,
        pub total_consumed: i64,
        pub total_fee_paid: i64,
        pub show_in_leaderboard: bool,
        pub last_synced_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LeaderboardVisibility {
        pub show: bool,
    }
}

pub mod auth {
    use super::*;

    /// Identity forwarded by the login front after the forum handshake.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct SyncRequest {
        pub id: i64,
        pub username: String,
        #[serde(default)]
        pub name: String,
        #[serde(default)]
        pub trust_level: i32,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SyncResponse {
        pub session_token: String,
        pub account: super::account::Account,
    }
}

pub mod leaderboard {
    use super::*;

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum LeaderboardKind {
        #[default]
        Balance,
        Transferred,
        Received,
        Consumed,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct LeaderboardQuery {
        #[serde(default)]
        pub kind: LeaderboardKind,
        pub limit: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LeaderboardEntry {
        pub rank: u64,
        pub username: String,
        pub name: String,
        pub value: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Leaderboard {
        pub kind: LeaderboardKind,
        pub entries: Vec<LeaderboardEntry>,
    }
}

pub mod app {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AppNew {
        pub name: String,
        pub description: Option<String>,
        pub redirect_uri: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct App {
        pub id: Uuid,
        pub name: String,
        pub description: String,
        pub redirect_uri: String,
        pub client_id: String,
        /// Shown to the owner only.
        pub client_secret: String,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AppList {
        pub apps: Vec<App>,
    }
}

pub mod consume {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ConsumeRequest {
        pub username: String,
        pub amount: i64,
        pub purpose: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ConsumeCreated {
        pub consumption_id: Uuid,
        pub confirm_url: String,
    }
}

pub mod transfer {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferRequest {
        pub to_username: String,
        pub amount: i64,
        pub message: Option<String>,
        pub min_trust_level: Option<i32>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferCreated {
        pub transfer_id: Uuid,
        pub confirm_url: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BatchRecipient {
        pub username: String,
        pub amount: i64,
        pub message: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BatchTransferRequest {
        pub recipients: Vec<BatchRecipient>,
        pub min_trust_level: Option<i32>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BatchTransferCreated {
        pub batch_id: Uuid,
        pub confirm_url: String,
        pub transfer_ids: Vec<Uuid>,
        /// Receivers dropped from the batch.
        pub skipped: Vec<String>,
    }
}

pub mod confirm {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum ConfirmAction {
        Confirm,
        Reject,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ConfirmRequest {
        pub action: ConfirmAction,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PendingTransfer {
        pub id: Uuid,
        pub to_username: String,
        pub amount: i64,
        pub fee_amount: i64,
        pub actual_amount: i64,
        pub message: Option<String>,
    }

    /// What the confirmation page shows before the user decides.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(tag = "type", rename_all = "snake_case")]
    pub enum PendingView {
        Consumption {
            id: Uuid,
            username: String,
            app_name: String,
            amount: i64,
            fee_amount: i64,
            developer_amount: i64,
            purpose: String,
            created_at: DateTime<Utc>,
        },
        Transfer {
            from_username: String,
            batch_id: Option<Uuid>,
            min_trust_level: Option<i32>,
            transfers: Vec<PendingTransfer>,
            created_at: DateTime<Utc>,
        },
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettledTransfer {
        pub id: Uuid,
        pub to_username: String,
        pub amount: i64,
        pub fee_amount: i64,
        pub actual_amount: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(tag = "result", rename_all = "snake_case")]
    pub enum ConfirmOutcome {
        Consumed {
            id: Uuid,
            username: String,
            consumed: i64,
            fee_amount: i64,
            remaining_score: i64,
        },
        Transferred {
            from_username: String,
            transfers: Vec<SettledTransfer>,
            remaining_score: i64,
            batch_complete: Option<bool>,
        },
        Rejected,
    }
}

pub mod record {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(tag = "type", rename_all = "snake_case")]
    pub enum Record {
        Consumption {
            id: Uuid,
            app_id: Uuid,
            amount: i64,
            fee_amount: i64,
            purpose: String,
            status: Status,
            created_at: DateTime<Utc>,
            resolved_at: Option<DateTime<Utc>>,
        },
        Transfer {
            id: Uuid,
            /// `true` when the requesting account sent it.
            outgoing: bool,
            counterpart_id: i64,
            amount: i64,
            fee_amount: i64,
            actual_amount: i64,
            message: Option<String>,
            batch_id: Option<Uuid>,
            status: Status,
            created_at: DateTime<Utc>,
            resolved_at: Option<DateTime<Utc>>,
        },
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct RecordsQuery {
        pub limit: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RecordList {
        pub records: Vec<Record>,
    }
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub current_score: Option<i64>,
}
