//! Initial schema migration.
//!
//! - `accounts`: forum users mirrored locally, with balance and statistics
//! - `apps`: third-party applications and their credentials
//! - `pending_consumptions`: app requests to burn a user's points
//! - `pending_transfers`: user to user transfers, single or batched
//! - `sessions`: bearer tokens issued at login

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Accounts {
    Table,
    ExternalId,
    Username,
    Name,
    TrustLevel,
    OriginalScore,
    ActualScore,
    TotalTransferred,
    TotalReceived,
    TotalConsumed,
    TotalFeePaid,
    ShowInLeaderboard,
    LastSyncedAt,
}

#[derive(Iden)]
enum Apps {
    Table,
    Id,
    Name,
    Description,
    RedirectUri,
    OwnerId,
    ClientId,
    ClientSecret,
    CreatedAt,
}

#[derive(Iden)]
enum PendingConsumptions {
    Table,
    Id,
    PayerId,
    AppId,
    Amount,
    DeveloperAmount,
    FeeAmount,
    Purpose,
    Status,
    ConfirmToken,
    CreatedAt,
    ResolvedAt,
}

#[derive(Iden)]
enum PendingTransfers {
    Table,
    Id,
    FromId,
    ToId,
    Amount,
    FeeAmount,
    ActualAmount,
    Message,
    Kind,
    BatchId,
    MinTrustLevel,
    Status,
    ConfirmToken,
    CreatedAt,
    ResolvedAt,
}

#[derive(Iden)]
enum Sessions {
    Table,
    Token,
    AccountId,
    CreatedAt,
    ExpiresAt,
}

fn big_int_zero<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .big_integer()
        .not_null()
        .default(0)
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 1. Accounts
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Accounts::ExternalId)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Accounts::Username)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Accounts::Name).string().not_null().default(""))
                    .col(
                        ColumnDef::new(Accounts::TrustLevel)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(&mut big_int_zero(Accounts::OriginalScore))
                    .col(&mut big_int_zero(Accounts::ActualScore))
                    .col(&mut big_int_zero(Accounts::TotalTransferred))
                    .col(&mut big_int_zero(Accounts::TotalReceived))
                    .col(&mut big_int_zero(Accounts::TotalConsumed))
                    .col(&mut big_int_zero(Accounts::TotalFeePaid))
                    .col(
                        ColumnDef::new(Accounts::ShowInLeaderboard)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Accounts::LastSyncedAt).timestamp().not_null())
                    .check(Expr::col(Accounts::ActualScore).gte(0))
                    .to_owned(),
            )
            .await?;

        // 2. Apps
        manager
            .create_table(
                Table::create()
                    .table(Apps::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Apps::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Apps::Name).string().not_null())
                    .col(ColumnDef::new(Apps::Description).string().not_null().default(""))
                    .col(ColumnDef::new(Apps::RedirectUri).string().not_null())
                    .col(ColumnDef::new(Apps::OwnerId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Apps::ClientId)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Apps::ClientSecret)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Apps::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-apps-owner_id")
                            .from(Apps::Table, Apps::OwnerId)
                            .to(Accounts::Table, Accounts::ExternalId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-apps-owner_id")
                    .table(Apps::Table)
                    .col(Apps::OwnerId)
                    .to_owned(),
            )
            .await?;

        // 3. Pending consumptions
        manager
            .create_table(
                Table::create()
                    .table(PendingConsumptions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PendingConsumptions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PendingConsumptions::PayerId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PendingConsumptions::AppId).string().not_null())
                    .col(
                        ColumnDef::new(PendingConsumptions::Amount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PendingConsumptions::DeveloperAmount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PendingConsumptions::FeeAmount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PendingConsumptions::Purpose)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PendingConsumptions::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(PendingConsumptions::ConfirmToken)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(PendingConsumptions::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PendingConsumptions::ResolvedAt).timestamp())
                    .check(Expr::col(PendingConsumptions::Amount).gt(0))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-pending_consumptions-payer_id")
                            .from(PendingConsumptions::Table, PendingConsumptions::PayerId)
                            .to(Accounts::Table, Accounts::ExternalId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-pending_consumptions-app_id")
                            .from(PendingConsumptions::Table, PendingConsumptions::AppId)
                            .to(Apps::Table, Apps::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-pending_consumptions-payer_id")
                    .table(PendingConsumptions::Table)
                    .col(PendingConsumptions::PayerId)
                    .to_owned(),
            )
            .await?;

        // 4. Pending transfers. Batch siblings share the confirm token.
        manager
            .create_table(
                Table::create()
                    .table(PendingTransfers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PendingTransfers::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PendingTransfers::FromId).big_integer().not_null())
                    .col(ColumnDef::new(PendingTransfers::ToId).big_integer().not_null())
                    .col(ColumnDef::new(PendingTransfers::Amount).big_integer().not_null())
                    .col(
                        ColumnDef::new(PendingTransfers::FeeAmount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PendingTransfers::ActualAmount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PendingTransfers::Message).string())
                    .col(
                        ColumnDef::new(PendingTransfers::Kind)
                            .string()
                            .not_null()
                            .default("single"),
                    )
                    .col(ColumnDef::new(PendingTransfers::BatchId).string())
                    .col(ColumnDef::new(PendingTransfers::MinTrustLevel).integer())
                    .col(
                        ColumnDef::new(PendingTransfers::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(PendingTransfers::ConfirmToken)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PendingTransfers::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PendingTransfers::ResolvedAt).timestamp())
                    .check(Expr::col(PendingTransfers::Amount).gt(0))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-pending_transfers-from_id")
                            .from(PendingTransfers::Table, PendingTransfers::FromId)
                            .to(Accounts::Table, Accounts::ExternalId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-pending_transfers-to_id")
                            .from(PendingTransfers::Table, PendingTransfers::ToId)
                            .to(Accounts::Table, Accounts::ExternalId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-pending_transfers-confirm_token")
                    .table(PendingTransfers::Table)
                    .col(PendingTransfers::ConfirmToken)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-pending_transfers-batch_id")
                    .table(PendingTransfers::Table)
                    .col(PendingTransfers::BatchId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-pending_transfers-from_id")
                    .table(PendingTransfers::Table)
                    .col(PendingTransfers::FromId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-pending_transfers-to_id")
                    .table(PendingTransfers::Table)
                    .col(PendingTransfers::ToId)
                    .to_owned(),
            )
            .await?;

        // 5. Sessions
        manager
            .create_table(
                Table::create()
                    .table(Sessions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Sessions::Token)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Sessions::AccountId).big_integer().not_null())
                    .col(ColumnDef::new(Sessions::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Sessions::ExpiresAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-sessions-account_id")
                            .from(Sessions::Table, Sessions::AccountId)
                            .to(Accounts::Table, Accounts::ExternalId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Reverse order of creation (FK dependencies)
        manager
            .drop_table(Table::drop().table(Sessions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PendingTransfers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PendingConsumptions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Apps::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;
        Ok(())
    }
}
