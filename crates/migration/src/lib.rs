//! Migrator registering entity-specific migrations in dependency order.
//! Indexes are applied last.
pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_category;
mod m20240101_000002_create_product;
mod m20240101_000003_create_product_category;
mod m20240101_000004_create_role;
mod m20240101_000005_create_user;
mod m20240101_000006_create_user_role;
mod m20240101_000010_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_category::Migration),
            Box::new(m20240101_000002_create_product::Migration),
            Box::new(m20240101_000003_create_product_category::Migration),
            Box::new(m20240101_000004_create_role::Migration),
            Box::new(m20240101_000005_create_user::Migration),
            Box::new(m20240101_000006_create_user_role::Migration),
            // Indexes should always be applied last
            Box::new(m20240101_000010_add_indexes::Migration),
        ]
    }
}
