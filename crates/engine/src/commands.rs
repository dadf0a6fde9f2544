//! Command structs for ledger operations.
//!
//! These types group parameters for the request operations
//! (consume/transfer/batch transfer), keeping call sites readable and avoiding
//! long argument lists.

/// An application asks to consume points from `username`.
#[derive(Clone, Debug)]
pub struct ConsumeCmd {
    pub username: String,
    pub amount: i64,
    pub purpose: Option<String>,
}

impl ConsumeCmd {
    #[must_use]
    pub fn new(username: impl Into<String>, amount: i64) -> Self {
        Self {
            username: username.into(),
            amount,
            purpose: None,
        }
    }

    #[must_use]
    pub fn purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = Some(purpose.into());
        self
    }
}

/// A user sends points to another user.
#[derive(Clone, Debug)]
pub struct TransferCmd {
    pub sender_id: i64,
    pub receiver: String,
    pub amount: i64,
    pub message: Option<String>,
    pub min_trust_level: Option<i32>,
}

impl TransferCmd {
    #[must_use]
    pub fn new(sender_id: i64, receiver: impl Into<String>, amount: i64) -> Self {
        Self {
            sender_id,
            receiver: receiver.into(),
            amount,
            message: None,
            min_trust_level: None,
        }
    }

    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn min_trust_level(mut self, level: i32) -> Self {
        self.min_trust_level = Some(level);
        self
    }
}

/// One recipient of a batch transfer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchEntry {
    pub receiver: String,
    pub amount: i64,
    pub message: Option<String>,
}

impl BatchEntry {
    #[must_use]
    pub fn new(receiver: impl Into<String>, amount: i64) -> Self {
        Self {
            receiver: receiver.into(),
            amount,
            message: None,
        }
    }

    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// A user sends points to several users under one confirmation.
#[derive(Clone, Debug)]
pub struct BatchTransferCmd {
    pub sender_id: i64,
    pub entries: Vec<BatchEntry>,
    pub min_trust_level: Option<i32>,
}

impl BatchTransferCmd {
    #[must_use]
    pub fn new(sender_id: i64) -> Self {
        Self {
            sender_id,
            entries: Vec::new(),
            min_trust_level: None,
        }
    }

    #[must_use]
    pub fn entry(mut self, entry: BatchEntry) -> Self {
        self.entries.push(entry);
        self
    }

    #[must_use]
    pub fn entries(mut self, entries: impl IntoIterator<Item = BatchEntry>) -> Self {
        self.entries.extend(entries);
        self
    }

    #[must_use]
    pub fn min_trust_level(mut self, level: i32) -> Self {
        self.min_trust_level = Some(level);
        self
    }

    /// Sum of the positive amounts, used for the up-front balance check.
    pub(crate) fn requested_total(&self) -> Option<i64> {
        self.entries
            .iter()
            .filter(|e| e.amount > 0)
            .try_fold(0i64, |acc, e| acc.checked_add(e.amount))
    }
}

/// Register a new application.
#[derive(Clone, Debug)]
pub struct AppNewCmd {
    pub owner_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub redirect_uri: String,
}

impl AppNewCmd {
    #[must_use]
    pub fn new(owner_id: i64, name: impl Into<String>, redirect_uri: impl Into<String>) -> Self {
        Self {
            owner_id,
            name: name.into(),
            description: None,
            redirect_uri: redirect_uri.into(),
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requested_total_ignores_non_positive_entries() {
        let cmd = BatchTransferCmd::new(1)
            .entry(BatchEntry::new("bob", 50))
            .entry(BatchEntry::new("carol", -20))
            .entry(BatchEntry::new("dave", 0))
            .entry(BatchEntry::new("erin", 25));
        assert_eq!(cmd.requested_total(), Some(75));
    }

    #[test]
    fn requested_total_detects_overflow() {
        let cmd = BatchTransferCmd::new(1)
            .entry(BatchEntry::new("bob", i64::MAX))
            .entry(BatchEntry::new("carol", 1));
        assert_eq!(cmd.requested_total(), None);
    }
}
