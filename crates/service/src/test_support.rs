#![cfg(test)]
use sea_orm::DatabaseConnection;
use configs::DatabaseConfig;
use models::db::connect_and_migrate;

/// Fresh, fully migrated in-memory SQLite database.
///
/// Every call gets its own database, so tests never observe each other's rows.
pub async fn get_db() -> Result<DatabaseConnection, anyhow::Error> {
    connect_and_migrate(&DatabaseConfig::sqlite_memory()).await
}
