//! Configuration module
//!
//! Loads configuration from defaults, a per-deployment TOML file, the
//! deployment's `config.<env>.env` file and environment variables.
//! Priority: ENV > env file > TOML > defaults

use serde::Deserialize;
use std::env;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    #[serde(default = "default_service_name")]
    pub name: String,
    #[serde(default = "default_environment")]
    pub environment: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_workers")]
    pub workers: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_format")]
    pub log_format: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_request_id_header")]
    pub request_id_header: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_host")]
    pub host: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default = "default_ssl_mode")]
    pub ssl_mode: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout_ms")]
    pub acquire_timeout_ms: u64,
    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,
}

// Defaults
fn default_service_name() -> String {
    "ledger-api".to_string()
}

fn default_environment() -> String {
    "testnet".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8500
}

fn default_workers() -> usize {
    0
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_request_id_header() -> String {
    "x-request-id".to_string()
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_port() -> u16 {
    5432
}

fn default_table() -> String {
    "source_1".to_string()
}

fn default_ssl_mode() -> String {
    "require".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout_ms() -> u64 {
    30000
}

fn default_idle_timeout_ms() -> u64 {
    10000
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            environment: default_environment(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: default_workers(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_format: default_log_format(),
            log_level: default_log_level(),
            request_id_header: default_request_id_header(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: default_db_host(),
            port: default_db_port(),
            name: String::new(),
            user: String::new(),
            password: String::new(),
            table: default_table(),
            ssl_mode: default_ssl_mode(),
            max_connections: default_max_connections(),
            acquire_timeout_ms: default_acquire_timeout_ms(),
            idle_timeout_ms: default_idle_timeout_ms(),
        }
    }
}

impl DatabaseConfig {
    /// The table name is spliced into SQL text, so only plain or
    /// schema-qualified identifiers are accepted.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        let parts: Vec<&str> = self.table.split('.').collect();
        let valid = parts.len() <= 2
            && parts.iter().all(|part| {
                let mut chars = part.chars();
                matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                    && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            });

        if valid {
            Ok(())
        } else {
            Err(config::ConfigError::Message(format!(
                "database.table '{}' is not a valid SQL identifier",
                self.table
            )))
        }
    }
}

/// Maps keys of a deployment env file onto configuration paths.
fn env_file_key(key: &str) -> Option<&'static str> {
    match key {
        "PORT" => Some("server.port"),
        "ENVIRONMENT" => Some("service.environment"),
        "DB_HOST" => Some("database.host"),
        "DB_PORT" => Some("database.port"),
        "DB_NAME" => Some("database.name"),
        "DB_USER" => Some("database.user"),
        "DB_PASSWORD" => Some("database.password"),
        "DB_TABLE" => Some("database.table"),
        _ => None,
    }
}

/// Reads a deployment env file into a standalone layer keyed by config path.
fn env_file_source(path: &Path) -> Result<config::Config, config::ConfigError> {
    let entries =
        dotenvy::from_path_iter(path).map_err(|e| config::ConfigError::Foreign(Box::new(e)))?;

    let mut layer = config::Config::builder();
    for entry in entries {
        let (key, value) = entry.map_err(|e| config::ConfigError::Foreign(Box::new(e)))?;
        match env_file_key(key.trim()) {
            Some(key_path) => layer = layer.set_default(key_path, value.trim().to_string())?,
            None => tracing::debug!(key = %key, "Ignoring unknown env file key"),
        }
    }
    layer.build()
}

pub fn load_config() -> Result<Config, config::ConfigError> {
    let env = env::var("APP__ENV").unwrap_or_else(|_| default_environment());
    load_config_for(&env, Path::new("."))
}

/// Loads the configuration of deployment `env`, resolving files relative to `root`.
pub fn load_config_for(env: &str, root: &Path) -> Result<Config, config::ConfigError> {
    let mut builder =
        config::Config::builder().set_default("service.environment", env.to_string())?;

    // Try to load TOML file, but don't fail if it doesn't exist
    let config_path = root.join("configs").join(env).join("default");
    if config_path.with_extension("toml").exists() {
        builder = builder.add_source(
            config::File::with_name(&config_path.to_string_lossy()).required(false),
        );
    }

    // The env file is its own layer so `APP__*` variables still win over it
    let env_file = root.join(format!("config.{}.env", env));
    if env_file.exists() {
        builder = builder.add_source(env_file_source(&env_file)?);
    }

    // Environment variables override with APP__ prefix
    builder = builder.add_source(
        config::Environment::with_prefix("APP")
            .separator("__")
            .try_parsing(true),
    );

    let config: Config = builder.build()?.try_deserialize()?;
    config.database.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    #[test]
    #[serial]
    fn test_defaults_without_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_for("testnet", dir.path()).unwrap();

        assert_eq!(config.service.environment, "testnet");
        assert_eq!(config.server.port, 8500);
        assert_eq!(config.database.table, "source_1");
        assert_eq!(config.database.ssl_mode, "require");
        assert_eq!(config.database.max_connections, 10);
    }

    #[test]
    #[serial]
    fn test_environment_label_follows_deployment_name() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_for("mainnet", dir.path()).unwrap();
        assert_eq!(config.service.environment, "mainnet");
    }

    #[test]
    #[serial]
    fn test_env_file_overrides_toml() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("configs/mainnet")).unwrap();
        fs::write(
            dir.path().join("configs/mainnet/default.toml"),
            "[server]\nport = 9000\n\n[database]\nhost = \"toml-host\"\nmax_connections = 4\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("config.mainnet.env"),
            "PORT=8600\nENVIRONMENT=mainnet\nDB_HOST=db.internal\nDB_PORT=6543\nDB_NAME=ledger\nDB_USER=reader\nDB_PASSWORD=s3cr=t\nUNRELATED=1\n",
        )
        .unwrap();

        let config = load_config_for("mainnet", dir.path()).unwrap();

        assert_eq!(config.server.port, 8600);
        assert_eq!(config.service.environment, "mainnet");
        assert_eq!(config.database.host, "db.internal");
        assert_eq!(config.database.port, 6543);
        assert_eq!(config.database.name, "ledger");
        assert_eq!(config.database.user, "reader");
        assert_eq!(config.database.password, "s3cr=t");
        assert_eq!(config.database.max_connections, 4);
    }

    #[test]
    #[serial]
    fn test_process_env_has_highest_priority() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.testnet.env"), "PORT=8500\n").unwrap();

        env::set_var("APP__SERVER__PORT", "8700");
        let result = load_config_for("testnet", dir.path());
        env::remove_var("APP__SERVER__PORT");

        assert_eq!(result.unwrap().server.port, 8700);
    }

    #[test]
    #[serial]
    fn test_process_env_beats_env_file_and_toml() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("configs/mainnet")).unwrap();
        fs::write(
            dir.path().join("configs/mainnet/default.toml"),
            "[database]\nhost = \"toml-host\"\nname = \"toml-db\"\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("config.mainnet.env"),
            "DB_HOST=file-host\nDB_NAME=file-db\n",
        )
        .unwrap();

        env::set_var("APP__DATABASE__HOST", "env-host");
        let result = load_config_for("mainnet", dir.path());
        env::remove_var("APP__DATABASE__HOST");

        let config = result.unwrap();
        assert_eq!(config.database.host, "env-host");
        assert_eq!(config.database.name, "file-db");
    }

    #[test]
    #[serial]
    fn test_rejects_unsafe_table_name() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("config.testnet.env"),
            "DB_TABLE=source_1; DROP TABLE x\n",
        )
        .unwrap();

        assert!(load_config_for("testnet", dir.path()).is_err());
    }

    #[test]
    fn test_table_name_validation() {
        let mut db = DatabaseConfig::default();
        assert!(db.validate().is_ok());

        db.table = "ledger.source_1".to_string();
        assert!(db.validate().is_ok());

        for bad in ["", "1abc", "a.b.c", "src-1", "x\"y"] {
            db.table = bad.to_string();
            assert!(db.validate().is_err(), "{bad} should be rejected");
        }
    }
}
