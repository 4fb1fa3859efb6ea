use crate::domain::CascadePolicy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub catalog: CatalogConfig,

    pub checker: CheckerConfig,

    pub sources: SourcesConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Event bus buffer size (default: 100)
    pub event_bus_buffer_size: usize,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    pub max_db_connections: u32,

    pub min_db_connections: u32,

    /// How long a write waits on SQLite's lock before failing (default: 5000)
    pub db_busy_timeout_ms: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/chanarr.db".to_string(),
            log_level: "info".to_string(),
            event_bus_buffer_size: 100,
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
            db_busy_timeout_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub enabled: bool,

    pub port: u16,

    pub cors_allowed_origins: Vec<String>,

    /// Header carrying the user authenticated by the fronting auth proxy.
    /// Requests without it are treated as anonymous.
    pub user_header: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 6790,
            cors_allowed_origins: vec![
                "http://localhost:6790".to_string(),
                "http://127.0.0.1:6790".to_string(),
            ],
            user_header: "X-Forwarded-User".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// What happens to member channels when a playlist is deleted:
    /// "cascade" deletes them, "orphan" detaches them.
    pub playlist_delete_policy: CascadePolicy,

    /// Attempts at a version-checked stats write before giving up with a conflict.
    pub stats_max_attempts: u32,

    /// Rows per INSERT statement during bulk imports.
    pub bulk_chunk_size: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            playlist_delete_policy: CascadePolicy::Cascade,
            stats_max_attempts: 3,
            bulk_chunk_size: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckerConfig {
    pub request_timeout_seconds: u64,

    pub max_concurrent_checks: usize,

    pub user_agent: String,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            request_timeout_seconds: 10,
            max_concurrent_checks: 8,
            user_agent: format!("chanarr/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Request timeout in seconds (default: 30)
    pub request_timeout_seconds: u64,

    /// Largest playlist body accepted from a remote source.
    pub max_body_bytes: usize,

    pub user_agent: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            request_timeout_seconds: 30,
            max_body_bytes: 16 * 1024 * 1024,
            user_agent: format!("chanarr/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,

    pub loki_labels: HashMap<String, String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        let mut labels = HashMap::new();
        labels.insert("app".to_string(), "chanarr".to_string());

        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
            loki_labels: labels,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        for path in Self::config_paths() {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(&path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("chanarr").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".chanarr").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            Self::default().save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.catalog.stats_max_attempts == 0 {
            anyhow::bail!("catalog.stats_max_attempts must be at least 1");
        }

        if self.catalog.bulk_chunk_size == 0 {
            anyhow::bail!("catalog.bulk_chunk_size must be at least 1");
        }

        if self.checker.max_concurrent_checks == 0 {
            anyhow::bail!("checker.max_concurrent_checks must be at least 1");
        }

        if self.server.user_header.trim().is_empty() {
            anyhow::bail!("server.user_header cannot be empty");
        }

        if axum::http::HeaderName::from_bytes(self.server.user_header.as_bytes()).is_err() {
            anyhow::bail!(
                "server.user_header is not a valid header name: {}",
                self.server.user_header
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.catalog.stats_max_attempts, 3);
        assert_eq!(config.catalog.playlist_delete_policy, CascadePolicy::Cascade);
        assert_eq!(config.server.user_header, "X-Forwarded-User");
        assert_eq!(config.general.db_busy_timeout_ms, 5000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[catalog]"));
        assert!(toml_str.contains("playlist_delete_policy = \"cascade\""));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [catalog]
            playlist_delete_policy = "orphan"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.catalog.playlist_delete_policy, CascadePolicy::Orphan);
        assert_eq!(config.catalog.bulk_chunk_size, 200);
        assert_eq!(config.checker.max_concurrent_checks, 8);
    }

    #[test]
    fn test_validate_rejects_zero_bounds() {
        let mut config = Config::default();
        config.catalog.stats_max_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.checker.max_concurrent_checks = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.server.user_header = "bad header".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = std::env::temp_dir().join(format!("chanarr-config-{}", uuid::Uuid::new_v4()));
        let path = dir.join("config.toml");

        let mut config = Config::default();
        config.sources.max_body_bytes = 1024;
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.sources.max_body_bytes, 1024);

        std::fs::remove_dir_all(dir).ok();
    }
}
