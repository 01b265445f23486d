use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Environment variable that overrides `jwt.secret`.
pub const SECRET_KEY_ENV: &str = "QUICKCHECK_SECRET_KEY";

/// Environment variable that overrides `general.database_path`.
pub const DATABASE_URL_ENV: &str = "QUICKCHECK_DATABASE_URL";

/// Environment variable that overrides `server.port`.
pub const PORT_ENV: &str = "QUICKCHECK_PORT";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub security: SecurityConfig,

    pub jwt: JwtConfig,

    pub fraud: FraudConfig,

    pub pagination: PaginationConfig,

    pub notifications: NotificationConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// "pretty" or "json"
    pub log_format: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    pub max_db_connections: u32,

    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/quickcheck.db".to_string(),
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,

    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
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

    pub argon2_parallelism: u32,

    /// Minimum accepted password length
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
pub struct JwtConfig {
    /// HS256 signing secret. Empty until configured; prefer setting
    /// `QUICKCHECK_SECRET_KEY`.
    pub secret: String,

    pub access_token_minutes: i64,

    pub refresh_token_days: i64,

    /// Issue a new refresh token on every refresh call.
    pub rotate_refresh_tokens: bool,

    /// Blacklist the old refresh token once it has been rotated.
    pub blacklist_after_rotation: bool,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            access_token_minutes: 50,
            refresh_token_days: 1,
            rotate_refresh_tokens: true,
            blacklist_after_rotation: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FraudConfig {
    /// Rolling window used by the velocity rule.
    pub velocity_window_hours: i64,

    /// Loans inside the window (the new one included) that trigger the rule.
    pub velocity_threshold: u64,

    /// Amounts strictly above this are flagged.
    pub amount_threshold: i64,

    /// Users sharing an email domain above which the domain rule triggers.
    pub domain_user_threshold: u64,

    pub currency_symbol: String,
}

impl Default for FraudConfig {
    fn default() -> Self {
        Self {
            velocity_window_hours: 24,
            velocity_threshold: 3,
            amount_threshold: 5_000_000,
            domain_user_threshold: 10,
            currency_symbol: "₦".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub default_limit: u64,

    pub max_limit: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub enabled: bool,

    pub from_address: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            from_address: "QuickCheck <no-reply@quickcheck.local>".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
        }
    }
}

impl Config {
    /// Loads `.env`, the first config file found, then applies environment overrides.
    pub fn load() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            info!("Loaded environment from: {}", path.display());
        }

        let mut config = Self::load_file()?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    fn load_file() -> Result<Self> {
        for path in &Self::config_paths() {
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

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(secret) = std::env::var(SECRET_KEY_ENV) {
            self.jwt.secret = secret;
        }

        if let Ok(url) = std::env::var(DATABASE_URL_ENV) {
            self.general.database_path = url;
        }

        if let Ok(port) = std::env::var(PORT_ENV) {
            self.server.port = port
                .parse()
                .with_context(|| format!("{PORT_ENV} is not a valid port: {port}"))?;
        }

        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("quickcheck").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".quickcheck").join("config.toml"));
        }

        paths
    }

    pub fn validate(&self) -> Result<()> {
        if self.jwt.secret.trim().is_empty() {
            anyhow::bail!("JWT secret cannot be empty (set {SECRET_KEY_ENV})");
        }

        if self.jwt.access_token_minutes <= 0 || self.jwt.refresh_token_days <= 0 {
            anyhow::bail!("Token lifetimes must be greater than zero");
        }

        if self.pagination.default_limit == 0
            || self.pagination.default_limit > self.pagination.max_limit
        {
            anyhow::bail!("pagination.default_limit must be between 1 and pagination.max_limit");
        }

        if self.fraud.velocity_window_hours <= 0 {
            anyhow::bail!("fraud.velocity_window_hours must be greater than zero");
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
        assert_eq!(config.jwt.access_token_minutes, 50);
        assert_eq!(config.jwt.refresh_token_days, 1);
        assert_eq!(config.pagination.default_limit, 10);
        assert_eq!(config.fraud.amount_threshold, 5_000_000);
        assert_eq!(config.fraud.velocity_threshold, 3);
        assert_eq!(config.fraud.domain_user_threshold, 10);
        assert!(config.jwt.secret.is_empty());

        let mut config = config;
        config.jwt.secret = "a-real-secret".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[jwt]"));
        assert!(toml_str.contains("[fraud]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [fraud]
            amount_threshold = 1000000
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.fraud.amount_threshold, 1_000_000);

        assert_eq!(config.fraud.velocity_window_hours, 24);
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let configured = || {
            let mut config = Config::default();
            config.jwt.secret = "a-real-secret".to_string();
            config
        };

        let err = Config::default().validate().unwrap_err();
        assert!(err.to_string().contains(SECRET_KEY_ENV));

        let mut config = configured();
        config.jwt.secret = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = configured();
        config.pagination.default_limit = 500;
        assert!(config.validate().is_err());

        let mut config = configured();
        config.jwt.access_token_minutes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load_round_trip_file() {
        let path = std::env::temp_dir()
            .join(format!("quickcheck-config-{}", uuid::Uuid::new_v4()))
            .join("config.toml");

        let mut config = Config::default();
        config.server.port = 9123;
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.server.port, 9123);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
