use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Product: SKU is the unique business key
        manager
            .create_index(
                Index::create()
                    .name("uniq_product_sku")
                    .table(Product::Table)
                    .col(Product::Sku)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Product: exact-name search
        manager
            .create_index(
                Index::create()
                    .name("idx_product_name")
                    .table(Product::Table)
                    .col(Product::Name)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uniq_category_name")
                    .table(Category::Table)
                    .col(Category::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ProductCategory: lookups by category (product_id is covered by the PK)
        manager
            .create_index(
                Index::create()
                    .name("idx_product_category_category")
                    .table(ProductCategory::Table)
                    .col(ProductCategory::CategoryId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uniq_user_user_name")
                    .table(User::Table)
                    .col(User::UserName)
                    .unique()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("uniq_role_name")
                    .table(Role::Table)
                    .col(Role::Name)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("uniq_product_sku").table(Product::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_product_name").table(Product::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("uniq_category_name").table(Category::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_product_category_category").table(ProductCategory::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("uniq_user_user_name").table(User::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("uniq_role_name").table(Role::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Product { Table, Sku, Name }

#[derive(DeriveIden)]
enum Category { Table, Name }

#[derive(DeriveIden)]
enum ProductCategory { Table, CategoryId }

#[derive(DeriveIden)]
enum User { Table, UserName }

#[derive(DeriveIden)]
enum Role { Table, Name }
