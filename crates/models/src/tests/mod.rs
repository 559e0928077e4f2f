

use configs::DatabaseConfig;
use sea_orm::DatabaseConnection;

/// Fresh in-memory database with all migrations applied.
pub async fn setup_test_db() -> anyhow::Result<DatabaseConnection> {
    crate::db::connect_and_migrate(&DatabaseConfig::sqlite_memory()).await
}
