//! Trips table.
//!
//! One row per saved estimate. Rows are only ever inserted or deleted, and
//! always queried by owner in creation order, hence the
//! `(user_id, created_at)` index.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Trips::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Trips::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Trips::UserId).string().not_null())
                    .col(ColumnDef::new(Trips::Distance).double().not_null())
                    .col(ColumnDef::new(Trips::Efficiency).double().not_null())
                    .col(ColumnDef::new(Trips::State).string().not_null())
                    .col(ColumnDef::new(Trips::FuelPrice).double().not_null())
                    .col(ColumnDef::new(Trips::TotalCost).double().not_null())
                    .col(
                        ColumnDef::new(Trips::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-trips-user_id-created_at")
                    .table(Trips::Table)
                    .col(Trips::UserId)
                    .col(Trips::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx-trips-user_id-created_at")
                    .table(Trips::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(Trips::Table).to_owned())
            .await
    }
}

/// Learn more at https://docs.rs/sea-query#iden
#[derive(Iden)]
pub enum Trips {
    Table,
    Id,
    UserId,
    Distance,
    Efficiency,
    State,
    FuelPrice,
    TotalCost,
    CreatedAt,
}
