// ============================
// crates/backend-lib/src/config.rs
// ============================
//! Configuration management.
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Config file read when no explicit path is given
pub const DEFAULT_CONFIG_FILE: &str = "parish.toml";

/// Environment variable prefix, nested keys are separated by `__`
pub const ENV_PREFIX: &str = "PARISH_";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Data directory path
    pub data_dir: PathBuf,
    /// Which store keeps users and students under `data_dir`
    pub storage: StorageBackend,
    /// Log level
    pub log_level: String,
    /// Session TTL in seconds
    pub session_ttl_secs: u64,
    /// Lifetime of anonymous sessions that only carry a flash message
    pub anonymous_session_ttl_secs: u64,
    /// Upper bound on live anonymous sessions
    pub max_anonymous_sessions: usize,
    /// Name of the session cookie
    pub session_cookie: String,
    /// Mark the session cookie `Secure` (HTTPS only)
    pub secure_cookie: bool,
    /// scrypt cost (`log_n`) used for new password hashes
    pub hash_cost: u8,
    /// Upper bound for a single store or hasher call
    pub operation_timeout_ms: u64,
    /// Password requirements applied at registration
    pub password_requirements: PasswordRequirements,
    /// Opt-in lockout after repeated failed logins
    pub login_lockout: LockoutSettings,
}

/// Persistence backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// SQLite database `parish.db`
    #[default]
    Sqlite,
    /// JSON tables `users.json` and `students.json`
    FlatFile,
}

/// Password complexity requirements
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordRequirements {
    /// Minimum password length
    pub min_length: usize,
    /// Require uppercase letters
    pub require_uppercase: bool,
    /// Require lowercase letters
    pub require_lowercase: bool,
    /// Require digits
    pub require_digit: bool,
    /// Require special characters
    pub require_special: bool,
}

/// Per-username login lockout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LockoutSettings {
    pub enabled: bool,
    /// Failed attempts before the username is locked
    pub max_attempts: u32,
    /// How long a lockout lasts
    pub lockout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            data_dir: PathBuf::from("data"),
            storage: StorageBackend::default(),
            log_level: "info".to_string(),
            session_ttl_secs: 60 * 60 * 24 * 7, // 7 days
            anonymous_session_ttl_secs: 5 * 60,
            max_anonymous_sessions: 10_000,
            session_cookie: "parish_session".to_string(),
            secure_cookie: false,
            hash_cost: 10,
            operation_timeout_ms: 5_000,
            password_requirements: PasswordRequirements::default(),
            login_lockout: LockoutSettings::default(),
        }
    }
}

impl Default for PasswordRequirements {
    fn default() -> Self {
        Self {
            min_length: 8,
            require_uppercase: false,
            require_lowercase: false,
            require_digit: false,
            require_special: false,
        }
    }
}

impl Default for LockoutSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            max_attempts: 5,
            lockout_secs: 5 * 60,
        }
    }
}

impl Settings {
    /// Layered sources: defaults, then the TOML file, then `PARISH_*` env vars
    pub fn figment(config_path: Option<&Path>) -> Figment {
        let path = config_path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load and validate settings
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let settings: Settings = Self::figment(config_path).extract()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            bail!("unknown log level `{}`", self.log_level);
        }
        if self.session_ttl_secs == 0 {
            bail!("session_ttl_secs must be greater than zero");
        }
        if self.anonymous_session_ttl_secs == 0 || self.max_anonymous_sessions == 0 {
            bail!("anonymous session limits must be greater than zero");
        }
        if self.operation_timeout_ms == 0 {
            bail!("operation_timeout_ms must be greater than zero");
        }
        if !(1..=20).contains(&self.hash_cost) {
            bail!("hash_cost must be between 1 and 20, got {}", self.hash_cost);
        }
        if self.password_requirements.min_length == 0 {
            bail!("password_requirements.min_length must be at least 1");
        }
        if self.login_lockout.max_attempts == 0 {
            bail!("login_lockout.max_attempts must be at least 1");
        }
        if self.session_cookie.is_empty()
            || !self.session_cookie.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            bail!("session_cookie must be a non-empty token");
        }
        Ok(())
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn anonymous_session_ttl(&self) -> Duration {
        Duration::from_secs(self.anonymous_session_ttl_secs)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }
}
