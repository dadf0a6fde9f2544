//! Point ledger engine.
//!
//! Accounts mirror forum users and hold a spendable balance. Applications and
//! users create *pending* consumptions and transfers; nothing moves until the
//! payer confirms the operation through its one-time token.

pub use accounts::{Account, ForumIdentity, LeaderboardKind};
pub use apps::App;
pub use commands::{AppNewCmd, BatchEntry, BatchTransferCmd, ConsumeCmd, TransferCmd};
pub use consumptions::{Consumption, DEFAULT_PURPOSE};
pub use error::EngineError;
pub use fees::{ConsumptionFee, FeePolicy, StandardFees, TransferFee};
pub use ops::{
    BatchReceipt, ConsumptionDetails, Engine, EngineBuilder, PendingOperation, Receipt, Record,
    SettledTransfer, Settlement, TransferDetails,
};
pub use sessions::SESSION_TTL_DAYS;
pub use status::{ConfirmAction, OperationStatus};
pub use transfers::{Transfer, TransferKind};

mod accounts;
mod apps;
mod commands;
mod consumptions;
mod error;
mod fees;
mod ops;
mod sessions;
mod status;
mod transfers;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
