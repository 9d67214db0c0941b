//! Create `chat_message` table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ChatMessage::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ChatMessage::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ChatMessage::GroupId).string_len(32).not_null())
                    .col(ColumnDef::new(ChatMessage::SenderId).string_len(128).not_null())
                    .col(
                        ColumnDef::new(ChatMessage::SenderName)
                            .string_len(256)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ChatMessage::Message).text().not_null())
                    .col(
                        ColumnDef::new(ChatMessage::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_chat_message_group")
                            .from(ChatMessage::Table, ChatMessage::GroupId)
                            .to(Group::Table, Group::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // History replay: latest N per room
        manager
            .create_index(
                Index::create()
                    .name("idx_chat_message_group_timestamp")
                    .table(ChatMessage::Table)
                    .col(ChatMessage::GroupId)
                    .col(ChatMessage::Timestamp)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ChatMessage::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ChatMessage {
    Table,
    Id,
    GroupId,
    SenderId,
    SenderName,
    Message,
    Timestamp,
}

#[derive(Iden)]
enum Group {
    Table,
    Id,
}
