use anyhow::{Context, Result};
use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming: `TASKGENIE__SERVER__PORT=9090` overrides
/// `server.port`; file values sit below environment overrides.
const ENV_PREFIX: &str = "TASKGENIE";
const CONFIG_FILE_ENV: &str = "TASKGENIE_CONFIG_FILE";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub app: AppSection,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub logging: LogConfig,
    pub migration: MigrationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSection {
    pub name: String,
    pub debug: bool,
    /// Canonical application data directory; database, logs and caches
    /// live underneath it unless overridden.
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite URL, e.g. `sqlite:///home/user/.taskgenie/data/taskgenie.db`
    /// or `sqlite::memory:`. Defaults to a file under the data dir.
    #[serde(default)]
    pub url: Option<String>,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connection_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
    /// "json" or "pretty"
    pub format: String,
    /// Log file name under `<data_dir>/logs`; console-only when absent.
    pub file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    pub policy: MigrationPolicy,
}

/// What to do when an automatic startup migration fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationPolicy {
    /// Fail startup; the service never starts serving with an unknown
    /// schema. The production setting.
    Strict,
    /// Log the failure and continue against a possibly stale schema.
    /// Development convenience only.
    Permissive,
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_dir = default_data_dir();
        Self {
            app: AppSection {
                name: "TaskGenie".to_string(),
                debug: false,
                data_dir,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 5,
                min_connections: 1,
                connection_timeout_seconds: 30,
            },
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            logging: LogConfig {
                level: "info".to_string(),
                format: "json".to_string(),
                file: Some("taskgenie.log".to_string()),
            },
            migration: MigrationConfig {
                policy: MigrationPolicy::Strict,
            },
        }
    }
}

fn default_data_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".taskgenie")
}

impl AppConfig {
    /// Load configuration with precedence: environment variables over the
    /// TOML file over built-in defaults. An explicitly requested file must
    /// exist; the default file locations are optional.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let defaults = AppConfig::default();
        let mut builder = ConfigBuilder::builder()
            .set_default("app.name", defaults.app.name.clone())?
            .set_default("app.debug", defaults.app.debug)?
            .set_default(
                "app.data_dir",
                defaults.app.data_dir.to_string_lossy().to_string(),
            )?
            .set_default(
                "database.max_connections",
                defaults.database.max_connections as i64,
            )?
            .set_default(
                "database.min_connections",
                defaults.database.min_connections as i64,
            )?
            .set_default(
                "database.connection_timeout_seconds",
                defaults.database.connection_timeout_seconds as i64,
            )?
            .set_default("server.host", defaults.server.host.clone())?
            .set_default("server.port", defaults.server.port as i64)?
            .set_default("logging.level", defaults.logging.level.clone())?
            .set_default("logging.format", defaults.logging.format.clone())?
            .set_default("logging.file", "taskgenie.log")?
            .set_default("migration.policy", "strict")?;

        if let Some(path) = config_path {
            if !Path::new(path).exists() {
                return Err(anyhow::anyhow!("config file does not exist: {path}"));
            }
            builder = builder.add_source(File::new(path, FileFormat::Toml));
        } else if let Some(path) = Self::default_config_file() {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        builder
            .build()
            .context("failed to assemble configuration")?
            .try_deserialize()
            .context("failed to deserialize configuration")
    }

    /// `TASKGENIE_CONFIG_FILE` when set, otherwise `~/.taskgenie/config.toml`
    /// when it exists.
    fn default_config_file() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_FILE_ENV) {
            let path = PathBuf::from(path);
            return path.exists().then_some(path);
        }
        let path = default_data_dir().join("config.toml");
        path.exists().then_some(path)
    }

    /// Resolved database URL, defaulting to the canonical file under the
    /// data directory.
    pub fn database_url_resolved(&self) -> String {
        match &self.database.url {
            Some(url) => url.clone(),
            None => format!(
                "sqlite://{}",
                self.app
                    .data_dir
                    .join("data")
                    .join("taskgenie.db")
                    .display()
            ),
        }
    }

    /// Database file path extracted from the resolved URL. `None` for
    /// in-memory databases.
    pub fn database_path(&self) -> Option<PathBuf> {
        let url = self.database_url_resolved();
        let without_scheme = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))
            .unwrap_or(&url);
        // Strip query parameters (e.g. ?mode=ro) before extracting the path
        let path = without_scheme.split('?').next().unwrap_or(without_scheme);
        if path.is_empty() || path == ":memory:" {
            return None;
        }
        Some(PathBuf::from(path))
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.app.data_dir.join("logs")
    }

    /// Create the canonical application directories. Called once at
    /// process startup, never at load time.
    pub fn ensure_app_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.app.data_dir.join("data"))?;
        std::fs::create_dir_all(self.logs_dir())?;
        if let Some(db_path) = self.database_path() {
            if let Some(parent) = db_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}
