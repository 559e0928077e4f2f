//! Create `user` table.
//!
//! Only a salted password hash (PHC string) is stored, never the password itself.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(pk_auto(User::Id))
                    .col(string_len(User::UserName, 50).not_null())
                    .col(string_len(User::PasswordHash, 255).not_null())
                    .col(string_len(User::FirstName, 50).not_null())
                    .col(string_len(User::LastName, 50).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(User::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum User { Table, Id, UserName, PasswordHash, FirstName, LastName }
