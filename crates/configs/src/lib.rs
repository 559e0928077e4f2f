use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

/// Minimum length of an HMAC signing secret, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
    /// Apply pending migrations when the server starts.
    #[serde(default = "default_true")]
    pub auto_migrate: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            max_lifetime_secs: default_max_lifetime(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
            auto_migrate: true,
        }
    }
}

/// A retired signing key: no longer used to sign, still accepted when verifying.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct KeyEntry {
    pub id: String,
    pub secret: String,
}

/// Token issuance and verification settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_key_id")]
    pub key_id: String,
    #[serde(default)]
    pub retired_keys: Vec<KeyEntry>,
    #[serde(default)]
    pub issuer: Option<String>,
    #[serde(default)]
    pub audience: Option<String>,
    /// Token lifetime; tokens carry no `exp` claim when unset.
    #[serde(default)]
    pub token_ttl_secs: Option<u64>,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            jwt_secret: String::new(),
            key_id: default_key_id(),
            retired_keys: Vec::new(),
            issuer: None,
            audience: None,
            token_ttl_secs: None,
        }
    }
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_max_lifetime() -> u64 { 3600 }
fn default_acquire_timeout() -> u64 { 30 }
fn default_true() -> bool { true }
fn default_key_id() -> String { "primary".into() }

fn default_path() -> String {
    std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string())
}

/// Load `config.toml` (or `CONFIG_PATH`); defaults only when the file is
/// absent. A file that exists but does not parse is an error.
pub fn load_default() -> Result<AppConfig> {
    load_file_or_default(&default_path())
}

pub fn load_file_or_default(path: &str) -> Result<AppConfig> {
    if std::path::Path::new(path).exists() {
        load_from_file(path).map_err(|e| anyhow!("failed to load {path}: {e}"))
    } else {
        Ok(AppConfig::default())
    }
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    /// Load `config.toml` (or `CONFIG_PATH`), falling back to defaults plus
    /// environment variables when no file exists, then validate.
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.normalize_with(env_lookup)?;
        self.validate()
    }

    /// Fill empty settings from `lookup` (normally the process environment).
    pub fn normalize_with(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        self.server.normalize(&lookup)?;
        self.database.normalize_with(&lookup);
        self.auth.normalize_with(&lookup);
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.database.validate()?;
        self.auth.validate()
    }
}

impl ServerConfig {
    fn normalize(&mut self, lookup: &impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(host) = lookup("SERVER_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("SERVER_PORT") {
            self.port = port
                .parse()
                .map_err(|_| anyhow!("SERVER_PORT is not a valid port: {port}"))?;
        }
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }
}

impl DatabaseConfig {
    /// In-memory SQLite settings used by tests and local tooling.
    pub fn sqlite_memory() -> Self {
        Self {
            url: "sqlite::memory:".into(),
            max_connections: 1,
            min_connections: 1,
            ..Self::default()
        }
    }

    pub fn normalize_from_env(&mut self) {
        self.normalize_with(&env_lookup);
    }

    fn normalize_with(&mut self, lookup: &impl Fn(&str) -> Option<String>) {
        if self.url.trim().is_empty() {
            if let Some(url) = lookup("DATABASE_URL") {
                self.url = url;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml or DATABASE_URL"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://") || lower.starts_with("sqlite:")) {
            return Err(anyhow!("database.url must start with postgresql://, postgres:// or sqlite:"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive seconds"));
        }
        Ok(())
    }
}

impl AuthSettings {
    fn normalize_with(&mut self, lookup: &impl Fn(&str) -> Option<String>) {
        if self.jwt_secret.trim().is_empty() {
            if let Some(secret) = lookup("JWT_SECRET") {
                self.jwt_secret = secret;
            }
        }
        if self.key_id.trim().is_empty() {
            self.key_id = default_key_id();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        if self.jwt_secret.len() < MIN_SECRET_LEN {
            return Err(anyhow!(
                "auth.jwt_secret must be at least {MIN_SECRET_LEN} bytes; set it in config.toml or JWT_SECRET"
            ));
        }
        for retired in &self.retired_keys {
            if retired.id == self.key_id {
                return Err(anyhow!("auth.retired_keys reuses the active key id {}", retired.id));
            }
            if retired.secret.len() < MIN_SECRET_LEN {
                return Err(anyhow!("auth.retired_keys[{}] secret is shorter than {MIN_SECRET_LEN} bytes", retired.id));
            }
        }
        if self.token_ttl_secs == Some(0) {
            return Err(anyhow!("auth.token_ttl_secs must be positive when set"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn no_env(_: &str) -> Option<String> { None }

    #[test]
    fn parses_full_toml() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [server]
            host = "0.0.0.0"
            port = 9000

            [database]
            url = "postgres://localhost/catalog"
            auto_migrate = false

            [auth]
            jwt_secret = "0123456789abcdef0123456789abcdef"
            key_id = "k2"
            issuer = "catalog"
            token_ttl_secs = 3600

            [[auth.retired_keys]]
            id = "k1"
            secret = "fedcba9876543210fedcba9876543210"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.server.port, 9000);
        assert!(!cfg.database.auto_migrate);
        assert_eq!(cfg.database.max_connections, 10);
        assert_eq!(cfg.auth.key_id, "k2");
        assert_eq!(cfg.auth.retired_keys.len(), 1);
        assert_eq!(cfg.auth.issuer.as_deref(), Some("catalog"));
        cfg.validate().unwrap();
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let cfg: AppConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert!(cfg.auth.enabled);
        assert!(cfg.database.auto_migrate);
        assert_eq!(cfg.auth.key_id, "primary");
    }

    #[test]
    fn env_fills_missing_values() {
        let mut cfg = AppConfig::default();
        cfg.normalize_with(|k| match k {
            "DATABASE_URL" => Some("sqlite::memory:".into()),
            "JWT_SECRET" => Some(SECRET.into()),
            "SERVER_PORT" => Some("8181".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(cfg.database.url, "sqlite::memory:");
        assert_eq!(cfg.auth.jwt_secret, SECRET);
        assert_eq!(cfg.server.port, 8181);
        cfg.validate().unwrap();
    }

    #[test]
    fn short_secret_rejected_only_when_enabled() {
        let mut cfg = AppConfig::default();
        cfg.database = DatabaseConfig::sqlite_memory();
        cfg.auth.jwt_secret = "short".into();
        cfg.normalize_with(no_env).unwrap();
        assert!(cfg.validate().is_err());

        cfg.auth.enabled = false;
        cfg.validate().unwrap();
    }

    #[test]
    fn rejects_unknown_database_scheme() {
        let mut db = DatabaseConfig::default();
        db.url = "mysql://localhost/catalog".into();
        assert!(db.validate().is_err());
    }

    #[test]
    fn retired_key_cannot_shadow_active_id() {
        let mut auth = AuthSettings { jwt_secret: SECRET.into(), ..AuthSettings::default() };
        auth.retired_keys.push(KeyEntry { id: "primary".into(), secret: SECRET.into() });
        assert!(auth.validate().is_err());
    }

    #[test]
    fn invalid_port_env_is_an_error() {
        let mut cfg = AppConfig::default();
        let res = cfg.normalize_with(|k| (k == "SERVER_PORT").then(|| "http".to_string()));
        assert!(res.is_err());
    }

    #[test]
    fn missing_file_means_defaults_but_broken_file_is_an_error() {
        let dir = std::env::temp_dir().join(format!("catalog-configs-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let missing = dir.join("absent.toml");
        let cfg = load_file_or_default(missing.to_str().unwrap()).unwrap();
        assert_eq!(cfg.server.port, 8080);

        let broken = dir.join("broken.toml");
        std::fs::write(&broken, "[server\nport = \"eighty\"").unwrap();
        let err = load_file_or_default(broken.to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("broken.toml"));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
