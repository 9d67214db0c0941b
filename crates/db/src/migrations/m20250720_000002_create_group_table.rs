//! Create group table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Group::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Group::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Group::CreatorId).string_len(128).not_null())
                    .col(ColumnDef::new(Group::Product).string_len(256).not_null())
                    .col(
                        ColumnDef::new(Group::Price)
                            .double()
                            .not_null()
                            .check(Expr::col(Group::Price).gt(0)),
                    )
                    .col(
                        ColumnDef::new(Group::TotalQuantity)
                            .integer()
                            .not_null()
                            .check(Expr::col(Group::TotalQuantity).gte(1)),
                    )
                    .col(
                        ColumnDef::new(Group::MinJoinQuantity)
                            .integer()
                            .not_null()
                            .check(Expr::col(Group::MinJoinQuantity).gte(1)),
                    )
                    .col(
                        ColumnDef::new(Group::JoinedQuantity)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Group::PickupPoint).string_len(256).not_null())
                    .col(
                        ColumnDef::new(Group::Status)
                            .string_len(16)
                            .not_null()
                            .default("open"),
                    )
                    .col(
                        ColumnDef::new(Group::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_group_creator")
                            .from(Group::Table, Group::CreatorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Capacity invariant, checked by the store on every write
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                ALTER TABLE "group"
                ADD CONSTRAINT chk_group_joined_quantity
                CHECK (joined_quantity >= 0 AND joined_quantity <= total_quantity);
                "#,
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_group_creator_id")
                    .table(Group::Table)
                    .col(Group::CreatorId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_group_created_at")
                    .table(Group::Table)
                    .col(Group::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Group::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Group {
    Table,
    Id,
    CreatorId,
    Product,
    Price,
    TotalQuantity,
    MinJoinQuantity,
    JoinedQuantity,
    PickupPoint,
    Status,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
