//! Mapping between engine values and the wire types of `api_types`.

use api_types::{
    Status,
    account::Account as AccountView,
    app::App as AppView,
    confirm::{ConfirmOutcome, PendingTransfer, PendingView, SettledTransfer},
    leaderboard::LeaderboardKind as KindView,
    record::Record as RecordView,
};
use engine::{
    Account, App, ConfirmAction, LeaderboardKind, OperationStatus, PendingOperation, Record,
    Settlement,
};

pub(crate) fn account(account: &Account) -> AccountView {
    AccountView {
        id: account.external_id,
        username: account.username.clone(),
        name: account.name.clone(),
        trust_level: account.trust_level,
        original_score: account.original_score,
        actual_score: account.actual_score,
        consumed_score: account.consumed_score(),
        total_transferred: account.total_transferred,
        total_received: account.total_received,
        total_consumed: account.total_consumed,
        total_fee_paid: account.total_fee_paid,
        show_in_leaderboard: account.show_in_leaderboard,
        last_synced_at: account.last_synced_at,
    }
}

pub(crate) fn app(app: App) -> AppView {
    AppView {
        id: app.id,
        name: app.name,
        description: app.description,
        redirect_uri: app.redirect_uri,
        client_id: app.client_id,
        client_secret: app.client_secret,
        created_at: app.created_at,
    }
}

pub(crate) fn leaderboard_kind(kind: KindView) -> LeaderboardKind {
    match kind {
        KindView::Balance => LeaderboardKind::Balance,
        KindView::Transferred => LeaderboardKind::Transferred,
        KindView::Received => LeaderboardKind::Received,
        KindView::Consumed => LeaderboardKind::Consumed,
    }
}

pub(crate) fn confirm_action(action: api_types::confirm::ConfirmAction) -> ConfirmAction {
    match action {
        api_types::confirm::ConfirmAction::Confirm => ConfirmAction::Confirm,
        api_types::confirm::ConfirmAction::Reject => ConfirmAction::Reject,
    }
}

fn status(status: OperationStatus) -> Status {
    match status {
        OperationStatus::Pending => Status::Pending,
        OperationStatus::Confirmed => Status::Confirmed,
        OperationStatus::Rejected => Status::Rejected,
    }
}

pub(crate) fn record(account_id: i64, record: Record) -> RecordView {
    match record {
        Record::Consumption(c) => RecordView::Consumption {
            id: c.id,
            app_id: c.app_id,
            amount: c.amount,
            fee_amount: c.fee_amount,
            purpose: c.purpose,
            status: status(c.status),
            created_at: c.created_at,
            resolved_at: c.resolved_at,
        },
        Record::Transfer(t) => {
            let outgoing = t.from_id == account_id;
            RecordView::Transfer {
                id: t.id,
                outgoing,
                counterpart_id: if outgoing { t.to_id } else { t.from_id },
                amount: t.amount,
                fee_amount: t.fee_amount,
                actual_amount: t.actual_amount,
                message: t.message,
                batch_id: t.batch_id,
                status: status(t.status),
                created_at: t.created_at,
                resolved_at: t.resolved_at,
            }
        }
    }
}

/// `None` for an operation with no rows left to show.
pub(crate) fn pending(operation: PendingOperation) -> Option<PendingView> {
    match operation {
        PendingOperation::Consumption(details) => {
            let c = details.consumption;
            Some(PendingView::Consumption {
                id: c.id,
                username: details.payer_username,
                app_name: details.app_name,
                amount: c.amount,
                fee_amount: c.fee_amount,
                developer_amount: c.developer_amount,
                purpose: c.purpose,
                created_at: c.created_at,
            })
        }
        PendingOperation::Transfer(details) => {
            let first = details.first()?;
            let from_username = first.from_username.clone();
            let batch_id = first.transfer.batch_id;
            let min_trust_level = first.transfer.min_trust_level;
            let created_at = first.transfer.created_at;
            let transfers = details
                .into_iter()
                .map(|d| PendingTransfer {
                    id: d.transfer.id,
                    to_username: d.to_username,
                    amount: d.transfer.amount,
                    fee_amount: d.transfer.fee_amount,
                    actual_amount: d.transfer.actual_amount,
                    message: d.transfer.message,
                })
                .collect();
            Some(PendingView::Transfer {
                from_username,
                batch_id,
                min_trust_level,
                transfers,
                created_at,
            })
        }
    }
}

pub(crate) fn settlement(settlement: Settlement) -> ConfirmOutcome {
    match settlement {
        Settlement::Consumed {
            consumption_id,
            username,
            consumed,
            fee_amount,
            remaining_score,
        } => ConfirmOutcome::Consumed {
            id: consumption_id,
            username,
            consumed,
            fee_amount,
            remaining_score,
        },
        Settlement::Transferred {
            from_username,
            transfers,
            remaining_score,
            batch_complete,
        } => ConfirmOutcome::Transferred {
            from_username,
            transfers: transfers
                .into_iter()
                .map(|t| SettledTransfer {
                    id: t.transfer_id,
                    to_username: t.to_username,
                    amount: t.amount,
                    fee_amount: t.fee_amount,
                    actual_amount: t.actual_amount,
                })
                .collect(),
            remaining_score,
            batch_complete,
        },
        Settlement::Rejected => ConfirmOutcome::Rejected,
    }
}
