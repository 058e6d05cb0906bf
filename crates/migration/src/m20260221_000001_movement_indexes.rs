//! Indexes for the per-user listing and KPI queries.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Movements {
    Table,
    UserId,
    Status,
    Date,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx-movements-user_id-created_at")
                    .table(Movements::Table)
                    .col(Movements::UserId)
                    .col(Movements::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-movements-user_id-status")
                    .table(Movements::Table)
                    .col(Movements::UserId)
                    .col(Movements::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-movements-user_id-date")
                    .table(Movements::Table)
                    .col(Movements::UserId)
                    .col(Movements::Date)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for name in [
            "idx-movements-user_id-date",
            "idx-movements-user_id-status",
            "idx-movements-user_id-created_at",
        ] {
            manager
                .drop_index(
                    Index::drop()
                        .name(name)
                        .table(Movements::Table)
                        .to_owned(),
                )
                .await?;
        }
        Ok(())
    }
}
