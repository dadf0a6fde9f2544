//! Lifecycle of pending operations.

use serde::{Deserialize, Serialize};

use crate::EngineError;

/// `pending --confirm--> confirmed`, `pending --reject--> rejected`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    Pending,
    Confirmed,
    Rejected,
}

impl OperationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Rejected => "rejected",
        }
    }
}

impl TryFrom<&str> for OperationStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "rejected" => Ok(Self::Rejected),
            other => Err(EngineError::NotFound(format!(
                "invalid operation status: {other}"
            ))),
        }
    }
}

/// What the token owner decided.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmAction {
    Confirm,
    Reject,
}

impl ConfirmAction {
    pub(crate) fn target_status(self) -> OperationStatus {
        match self {
            Self::Confirm => OperationStatus::Confirmed,
            Self::Reject => OperationStatus::Rejected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_storage_strings() {
        for status in [
            OperationStatus::Pending,
            OperationStatus::Confirmed,
            OperationStatus::Rejected,
        ] {
            assert_eq!(OperationStatus::try_from(status.as_str()), Ok(status));
        }
        assert!(OperationStatus::try_from("cancelled").is_err());
    }
}
