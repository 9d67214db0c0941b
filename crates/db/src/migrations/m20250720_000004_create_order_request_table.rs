//! Create `order_request` table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OrderRequest::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OrderRequest::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OrderRequest::VendorId).string_len(128).not_null())
                    .col(
                        ColumnDef::new(OrderRequest::SupplierId)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(ColumnDef::new(OrderRequest::ProductId).string_len(256).not_null())
                    .col(
                        ColumnDef::new(OrderRequest::Quantity)
                            .integer()
                            .not_null()
                            .check(Expr::col(OrderRequest::Quantity).gte(1)),
                    )
                    .col(
                        ColumnDef::new(OrderRequest::Notes)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(OrderRequest::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(OrderRequest::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(OrderRequest::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_request_supplier")
                            .from(OrderRequest::Table, OrderRequest::SupplierId)
                            .to(User::Table, User::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Supplier dashboard: newest first
        manager
            .create_index(
                Index::create()
                    .name("idx_order_request_supplier_created")
                    .table(OrderRequest::Table)
                    .col(OrderRequest::SupplierId)
                    .col(OrderRequest::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Vendor history: newest first
        manager
            .create_index(
                Index::create()
                    .name("idx_order_request_vendor_created")
                    .table(OrderRequest::Table)
                    .col(OrderRequest::VendorId)
                    .col(OrderRequest::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OrderRequest::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum OrderRequest {
    Table,
    Id,
    VendorId,
    SupplierId,
    ProductId,
    Quantity,
    Notes,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
