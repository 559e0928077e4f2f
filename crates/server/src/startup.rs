use std::{future::Future, net::SocketAddr, sync::Arc};

use axum::Router;
use common::utils::logging::init_logging_from_env;
use configs::{AppConfig, AuthSettings, ServerConfig};
use dotenvy::dotenv;
use service::auth::{service::AuthConfig, SigningKey, StaticKeyProvider};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::errors::StartupError;
use crate::routes::{self, auth::ServerState};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn load_bind_addr(cfg: &ServerConfig) -> anyhow::Result<SocketAddr> {
    Ok(format!("{}:{}", cfg.host, cfg.port).parse()?)
}

/// Signing keys from `[auth]`. With auth disabled and no secret, an ephemeral
/// key is generated so `/Auth` still issues tokens.
fn load_keys(settings: &AuthSettings) -> Result<StaticKeyProvider, StartupError> {
    if settings.jwt_secret.is_empty() && !settings.enabled {
        warn!("auth disabled and no jwt secret configured; using an ephemeral signing key");
        let secret: [u8; 32] = rand::random();
        return Ok(StaticKeyProvider::new(SigningKey::new(settings.key_id.clone(), secret), vec![]));
    }
    StaticKeyProvider::from_settings(settings).map_err(|e| StartupError::InvalidConfig(e.to_string()))
}

/// Connect (and migrate when configured) and wire services into router state.
pub async fn build_state(cfg: &AppConfig) -> Result<ServerState, StartupError> {
    let db = if cfg.database.auto_migrate {
        models::db::connect_and_migrate(&cfg.database).await?
    } else {
        models::db::connect_with_config(&cfg.database).await?
    };
    let keys = Arc::new(load_keys(&cfg.auth)?);
    if !cfg.auth.enabled {
        warn!("authorization checks are disabled");
    }
    Ok(ServerState::new(db, keys, AuthConfig::from_settings(&cfg.auth), cfg.auth.enabled))
}

pub fn build_app(state: ServerState) -> Router {
    routes::build_router(state, build_cors())
}

/// Serve `cfg` until `shutdown` resolves.
pub async fn serve<F>(cfg: AppConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let state = build_state(&cfg).await?;
    let app = build_app(state);

    let addr = load_bind_addr(&cfg.server)?;
    info!(%addr, "starting catalog api");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;
    info!("server stopped");
    Ok(())
}

/// Public entry: load configuration and run the HTTP server until Ctrl+C.
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging_from_env();
    let cfg = AppConfig::load_and_validate()?;
    serve(cfg, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(err = %e, "failed to listen for ctrl_c");
        }
        info!("shutdown signal received");
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_auth_without_secret_gets_ephemeral_key() {
        let settings = AuthSettings { enabled: false, ..AuthSettings::default() };
        assert!(load_keys(&settings).is_ok());

        let settings = AuthSettings::default();
        assert!(matches!(load_keys(&settings), Err(StartupError::InvalidConfig(_))));
    }

    #[test]
    fn bind_addr_from_config() {
        let addr = load_bind_addr(&ServerConfig { host: "0.0.0.0".into(), port: 9000, worker_threads: None }).unwrap();
        assert_eq!(addr.port(), 9000);
    }
}
