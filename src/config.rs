// src/config.rs
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::{Result, ServerError};

/// Application configuration, built once at startup and handed to the
/// components that need it.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,

    /// Value of `Access-Control-Allow-Origin`; any origin when unset.
    pub allowed_origin: Option<String>,

    /// Shared secret gating `/compile` and the data-mutating routes.
    /// The gate is open when unset.
    pub confirmation_key: Option<String>,

    /// Base directory under which per-request workspaces are created.
    pub compile_dir: PathBuf,

    /// Directory holding the `qat` executable. Resolved from `PATH` when unset.
    pub compiler_dir: Option<PathBuf>,

    pub compile_timeout_secs: u64,
    pub max_concurrent_compiles: usize,

    pub database_url: String,

    pub token_refresh_interval_secs: u64,
    pub wakatime_api_base: String,
    pub wakatime_redirect_uri: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let cache = dirs::cache_dir().unwrap_or_else(std::env::temp_dir);
        let data = dirs::data_dir().unwrap_or_else(std::env::temp_dir);

        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            allowed_origin: None,
            confirmation_key: None,
            compile_dir: cache.join("qat-server").join("compile"),
            compiler_dir: None,
            compile_timeout_secs: 30,
            max_concurrent_compiles: 8,
            database_url: format!("sqlite:{}", data.join("qat-server").join("qat.db").display()),
            token_refresh_interval_secs: 4 * 60 * 60,
            wakatime_api_base: "https://wakatime.com".to_string(),
            wakatime_redirect_uri: "https://qat.dev".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from any key lookup, falling back to defaults.
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = AppConfig::default();

        if let Some(host) = get("HOST") {
            config.host = host;
        }
        if let Some(port) = get("PORT") {
            config.port = parse_number("PORT", &port)?;
        }
        config.allowed_origin = get("ALLOWED_ORIGIN");
        config.confirmation_key = get("CONFIRMATION_KEY");
        if let Some(dir) = get("COMPILE_DIR") {
            config.compile_dir = PathBuf::from(dir);
        }
        config.compiler_dir = get("COMPILER_DIR").map(PathBuf::from);
        if let Some(secs) = get("COMPILE_TIMEOUT_SECS") {
            config.compile_timeout_secs = parse_number("COMPILE_TIMEOUT_SECS", &secs)?;
        }
        if let Some(max) = get("MAX_CONCURRENT_COMPILES") {
            config.max_concurrent_compiles = parse_number("MAX_CONCURRENT_COMPILES", &max)?;
        }
        if let Some(url) = get("DATABASE_URL") {
            config.database_url = url;
        }
        if let Some(secs) = get("TOKEN_REFRESH_INTERVAL_SECS") {
            config.token_refresh_interval_secs =
                parse_number("TOKEN_REFRESH_INTERVAL_SECS", &secs)?;
        }
        if let Some(base) = get("WAKATIME_API_BASE") {
            config.wakatime_api_base = base;
        }
        if let Some(uri) = get("WAKATIME_REDIRECT_URI") {
            config.wakatime_redirect_uri = uri;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file using snake_case keys.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply the positional `[root_dir] [compiler_dir]` arguments.
    /// A relative compile directory is resolved against `root_dir`.
    pub fn with_args(mut self, root_dir: Option<&Path>, compiler_dir: Option<&Path>) -> Self {
        if let Some(root) = root_dir {
            if self.compile_dir.is_relative() {
                self.compile_dir = root.join(&self.compile_dir);
            }
        }
        if let Some(dir) = compiler_dir {
            self.compiler_dir = Some(dir.to_path_buf());
        }
        self
    }

    pub fn compile_timeout(&self) -> Duration {
        Duration::from_secs(self.compile_timeout_secs)
    }

    pub fn token_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.token_refresh_interval_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.compile_timeout_secs == 0 {
            return Err(ServerError::Config(
                "COMPILE_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }
        if self.max_concurrent_compiles == 0 {
            return Err(ServerError::Config(
                "MAX_CONCURRENT_COMPILES must be greater than zero".to_string(),
            ));
        }
        if self.token_refresh_interval_secs == 0 {
            return Err(ServerError::Config(
                "TOKEN_REFRESH_INTERVAL_SECS must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ServerError::Config(format!("{} must be a number, got '{}'", key, value)))
}
