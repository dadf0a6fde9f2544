use std::sync::Arc;

use sea_orm::{DatabaseConnection, DatabaseTransaction, QueryFilter, prelude::*};

use crate::{Account, EngineError, FeePolicy, ResultEngine, StandardFees};

mod accounts;
mod apps;
mod ledger;
mod settlement;

pub use accounts::Record;
pub use ledger::{BatchReceipt, ConsumptionDetails, PendingOperation, Receipt, TransferDetails};
pub use settlement::{SettledTransfer, Settlement};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    fees: Arc<dyn FeePolicy>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    async fn find_account(
        &self,
        db: &DatabaseTransaction,
        account_id: i64,
    ) -> ResultEngine<Option<crate::accounts::Model>> {
        crate::accounts::Entity::find_by_id(account_id)
            .one(db)
            .await
            .map_err(Into::into)
    }

    pub(super) async fn require_account(
        &self,
        db: &DatabaseTransaction,
        account_id: i64,
    ) -> ResultEngine<Account> {
        self.find_account(db, account_id)
            .await?
            .map(Account::from)
            .ok_or_else(|| EngineError::not_found("account"))
    }

    pub(super) async fn find_account_by_username(
        &self,
        db: &DatabaseTransaction,
        username: &str,
    ) -> ResultEngine<Option<Account>> {
        let model = crate::accounts::Entity::find()
            .filter(crate::accounts::Column::Username.eq(username.trim()))
            .one(db)
            .await?;
        Ok(model.map(Account::from))
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    fees: Option<Arc<dyn FeePolicy>>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Replace the default fee schedule.
    pub fn fee_policy(mut self, fees: impl FeePolicy + 'static) -> EngineBuilder {
        self.fees = Some(Arc::new(fees));
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            fees: self
                .fees
                .unwrap_or_else(|| Arc::new(StandardFees::default())),
        })
    }
}
