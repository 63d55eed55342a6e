//! Create `friendship` table migration.

use sea_orm_migration::prelude::*;

use crate::entities::friendship::PAIR_KEY_INDEX;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Friendship::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Friendship::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Friendship::Sender).integer().not_null())
                    .col(ColumnDef::new(Friendship::Receiver).integer().not_null())
                    .col(ColumnDef::new(Friendship::Status).string_len(10).not_null())
                    .col(
                        ColumnDef::new(Friendship::PairKey)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Friendship::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Friendship::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_friendship_sender")
                            .from(Friendship::Table, Friendship::Sender)
                            .to(User::Table, User::Pid)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_friendship_receiver")
                            .from(Friendship::Table, Friendship::Receiver)
                            .to(User::Table, User::Pid)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .check(Expr::col(Friendship::Sender).ne(Expr::col(Friendship::Receiver)))
                    .to_owned(),
            )
            .await?;

        // Unique index: pair_key - one edge per unordered pair
        manager
            .create_index(
                Index::create()
                    .name(PAIR_KEY_INDEX)
                    .table(Friendship::Table)
                    .col(Friendship::PairKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: (receiver, status) - received requests
        manager
            .create_index(
                Index::create()
                    .name("idx_friendship_receiver_status")
                    .table(Friendship::Table)
                    .col(Friendship::Receiver)
                    .col(Friendship::Status)
                    .to_owned(),
            )
            .await?;

        // Index: (sender, status) - friend lists from the sender side
        manager
            .create_index(
                Index::create()
                    .name("idx_friendship_sender_status")
                    .table(Friendship::Table)
                    .col(Friendship::Sender)
                    .col(Friendship::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Friendship::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Friendship {
    Table,
    Id,
    Sender,
    Receiver,
    Status,
    PairKey,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Pid,
}
