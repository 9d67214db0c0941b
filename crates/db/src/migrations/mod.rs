//! Database migrations.
//!
//! Schema migrations for the database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250720_000001_create_user_table;
mod m20250720_000002_create_group_table;
mod m20250720_000003_create_join_request_table;
mod m20250720_000004_create_order_request_table;
mod m20250720_000005_create_chat_message_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250720_000001_create_user_table::Migration),
            Box::new(m20250720_000002_create_group_table::Migration),
            Box::new(m20250720_000003_create_join_request_table::Migration),
            Box::new(m20250720_000004_create_order_request_table::Migration),
            Box::new(m20250720_000005_create_chat_message_table::Migration),
        ]
    }
}
