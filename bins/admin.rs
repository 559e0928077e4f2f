//! `catalog-admin`: schema migrations and user provisioning.

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use migration::MigratorTrait;
use tracing::info;

use configs::AppConfig;
use service::auth::domain::RegisterInput;
use service::auth::password::hash_password;
use service::auth::repo::seaorm::SeaOrmAuthRepository;
use service::auth::service::{AuthConfig, AuthService};
use service::auth::{SigningKey, StaticKeyProvider};

#[derive(Parser)]
#[command(name = "catalog-admin")]
#[command(about = "Administration tool for the catalog API")]
#[command(version)]
struct Cli {
    /// Database URL; overrides config and DATABASE_URL
    #[arg(long)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending migrations, or roll back with --down
    Migrate {
        /// Roll back instead of applying
        #[arg(long)]
        down: bool,
        /// Number of migrations (default: all pending up, one down)
        #[arg(long)]
        steps: Option<u32>,
    },

    /// Register a user with a hashed password and roles
    CreateUser {
        #[arg(long)]
        user_name: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        /// Repeat for several roles, e.g. --role Admin --role User
        #[arg(long = "role")]
        roles: Vec<String>,
    },

    /// Print the Argon2 PHC string for a password
    HashPassword { password: String },
}

fn load_config(database_url: Option<String>) -> Result<AppConfig> {
    let mut cfg = configs::load_default()?;
    if let Some(url) = database_url {
        cfg.database.url = url;
    }
    cfg.database.normalize_from_env();
    cfg.database.validate()?;
    Ok(cfg)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    common::utils::logging::init_logging_from_env();
    let cli = Cli::parse();

    match cli.command {
        Commands::HashPassword { password } => {
            println!("{}", hash_password(&password)?);
        }
        Commands::Migrate { down, steps } => {
            let cfg = load_config(cli.database_url)?;
            let db = models::db::connect_with_config(&cfg.database).await?;
            if down {
                migration::Migrator::down(&db, Some(steps.unwrap_or(1))).await?;
                info!(event = "migrated_down", "rolled back migrations");
            } else {
                migration::Migrator::up(&db, steps).await?;
                info!(event = "migrated_up", "database schema up to date");
            }
        }
        Commands::CreateUser { user_name, password, first_name, last_name, roles } => {
            let cfg = load_config(cli.database_url)?;
            let db = models::db::connect_and_migrate(&cfg.database).await?;
            // registration never signs tokens, so any key will do
            let keys = Arc::new(StaticKeyProvider::new(SigningKey::new("admin-cli", [0u8; 32]), vec![]));
            let svc = AuthService::new(Arc::new(SeaOrmAuthRepository { db }), keys, AuthConfig::default());
            let user = svc
                .register(RegisterInput { user_name, password, first_name, last_name, roles })
                .await?;
            println!("created user {} (id {}) roles={:?}", user.user_name, user.id, user.roles);
        }
    }
    Ok(())
}
