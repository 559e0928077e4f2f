//! Create `product` table.
//!
//! `sku` is the business key; uniqueness is added with the index migration.
//! SQLite caps decimal precision at 16, Postgres gets the full `decimal(18,2)`.
use sea_orm_migration::sea_orm::DatabaseBackend;
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let (precision, scale) = match manager.get_database_backend() {
            DatabaseBackend::Sqlite => (16, 2),
            _ => (18, 2),
        };
        manager
            .create_table(
                Table::create()
                    .table(Product::Table)
                    .if_not_exists()
                    .col(pk_auto(Product::Id))
                    .col(string_len(Product::Name, 50).not_null())
                    .col(string_len(Product::Sku, 20).not_null())
                    .col(string_len(Product::Description, 50).not_null())
                    .col(string_len(Product::Image, 50).not_null())
                    .col(decimal_len(Product::Price, precision, scale).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Product::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Product { Table, Id, Name, Sku, Description, Image, Price }
