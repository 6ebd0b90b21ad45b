use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub uploads: UploadConfig,

    pub rate_limit: RateLimitConfig,

    pub security: SecurityConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// "production" or "development". Development raises the default log
    /// filter to `debug` so internal failures become visible.
    pub environment: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/mangashelf.db".to_string(),
            log_level: "info".to_string(),
            environment: "production".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

impl GeneralConfig {
    #[must_use]
    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    pub cors_allowed_origins: Vec<String>,

    /// Whether to set the Secure flag on session cookies.
    /// Set to false for local development without HTTPS.
    pub secure_cookies: bool,

    /// Session lifetime after the last request, in hours.
    pub session_hours: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            cors_allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            secure_cookies: true,
            session_hours: 24,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Directory served under `/uploads`.
    pub root_path: String,

    /// Ceiling for the decoded payload, in bytes.
    pub max_bytes: usize,

    /// JPEG quality used when re-encoding (1-100).
    pub jpeg_quality: u8,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            root_path: "public/uploads".to_string(),
            max_bytes: 5 * 1024 * 1024,
            jpeg_quality: 80,
        }
    }
}

impl UploadConfig {
    /// Largest JSON body accepted on the upload route: the base64 form of
    /// `max_bytes` plus room for the data URI prefix and the other fields.
    #[must_use]
    pub const fn request_body_limit(&self) -> usize {
        self.max_bytes
            .div_ceil(3)
            .saturating_mul(4)
            .saturating_add(64 * 1024)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RateLimitRule {
    pub max_requests: u32,
    pub window_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Image uploads per client.
    pub uploads: RateLimitRule,

    /// Account registrations per client.
    pub register: RateLimitRule,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            uploads: RateLimitRule {
                max_requests: 10,
                window_seconds: 60,
            },
            register: RateLimitRule {
                max_requests: 5,
                window_seconds: 15 * 60,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,

    /// Minimum length accepted for self-registered passwords.
    pub min_password_length: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
            min_password_length: 8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            uploads: UploadConfig::default(),
            rate_limit: RateLimitConfig::default(),
            security: SecurityConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
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
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("mangashelf").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".mangashelf").join("config.toml"));
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
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.uploads.max_bytes == 0 {
            anyhow::bail!("uploads.max_bytes must be > 0");
        }

        if !(1..=100).contains(&self.uploads.jpeg_quality) {
            anyhow::bail!("uploads.jpeg_quality must be between 1 and 100");
        }

        for (name, rule) in [
            ("uploads", &self.rate_limit.uploads),
            ("register", &self.rate_limit.register),
        ] {
            if rule.max_requests == 0 || rule.window_seconds == 0 {
                anyhow::bail!("rate_limit.{name} needs max_requests > 0 and window_seconds > 0");
            }
        }

        if self.server.session_hours <= 0 {
            anyhow::bail!("server.session_hours must be > 0");
        }

        Ok(())
    }

    /// Log filter to use when `RUST_LOG` is not set.
    #[must_use]
    pub fn effective_log_level(&self) -> String {
        if self.general.is_development() && self.general.log_level == "info" {
            "debug".to_string()
        } else {
            self.general.log_level.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.uploads.max_bytes, 5 * 1024 * 1024);
        assert_eq!(config.uploads.jpeg_quality, 80);
        assert_eq!(config.rate_limit.uploads.max_requests, 10);
        assert_eq!(config.rate_limit.uploads.window_seconds, 60);
        assert_eq!(config.rate_limit.register.max_requests, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_upload_body_limit_covers_base64() {
        let uploads = UploadConfig::default();
        let encoded = (5 * 1024 * 1024usize).div_ceil(3) * 4;
        assert!(uploads.request_body_limit() > encoded);
        assert!(uploads.request_body_limit() > 2 * 1024 * 1024);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[uploads]"));
        assert!(toml_str.contains("[rate_limit.uploads]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [rate_limit.uploads]
            max_requests = 3
            window_seconds = 10
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.rate_limit.uploads.max_requests, 3);

        assert_eq!(config.rate_limit.register.max_requests, 5);
        assert_eq!(config.uploads.root_path, "public/uploads");
    }

    #[test]
    fn test_validate_rejects_zero_window() {
        let mut config = Config::default();
        config.rate_limit.uploads.window_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_development_raises_log_level() {
        let mut config = Config::default();
        assert_eq!(config.effective_log_level(), "info");
        config.general.environment = "development".to_string();
        assert_eq!(config.effective_log_level(), "debug");
    }
}
