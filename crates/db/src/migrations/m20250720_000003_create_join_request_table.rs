//! Create `join_request` table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(JoinRequest::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(JoinRequest::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(JoinRequest::GroupId).string_len(32).not_null())
                    .col(ColumnDef::new(JoinRequest::UserId).string_len(128).not_null())
                    .col(
                        ColumnDef::new(JoinRequest::Quantity)
                            .integer()
                            .not_null()
                            .check(Expr::col(JoinRequest::Quantity).gte(1)),
                    )
                    .col(
                        ColumnDef::new(JoinRequest::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(JoinRequest::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_join_request_group")
                            .from(JoinRequest::Table, JoinRequest::GroupId)
                            .to(Group::Table, Group::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_join_request_user")
                            .from(JoinRequest::Table, JoinRequest::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One active request per (group, user)
        manager
            .get_connection()
            .execute_unprepared(
                r"
                CREATE UNIQUE INDEX IF NOT EXISTS idx_join_request_active_unique
                ON join_request (group_id, user_id)
                WHERE status IN ('pending', 'accepted');
                ",
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_join_request_user_id")
                    .table(JoinRequest::Table)
                    .col(JoinRequest::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(JoinRequest::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum JoinRequest {
    Table,
    Id,
    GroupId,
    UserId,
    Quantity,
    Status,
    CreatedAt,
}

#[derive(Iden)]
enum Group {
    Table,
    Id,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
