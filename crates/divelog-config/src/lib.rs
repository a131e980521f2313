use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    pub statement_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5433,
            name: "dive_app".to_string(),
            user: "oltp_user".to_string(),
            password: "oltp_pass".to_string(),
            max_connections: 10,
            acquire_timeout_secs: 5,
            statement_timeout_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub format: LogFormat,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub http: HttpConfig,
    pub log: LogConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid value for {var}: '{value}'")]
    InvalidEnv { var: &'static str, value: String },
}

/// Environment variables that override file settings
pub mod env_vars {
    pub const CONFIG_PATH: &str = "DIVELOG_CONFIG";
    pub const DB_HOST: &str = "OLTP_HOST";
    pub const DB_PORT: &str = "OLTP_PORT";
    pub const DB_NAME: &str = "OLTP_DB";
    pub const DB_USER: &str = "OLTP_USER";
    pub const DB_PASSWORD: &str = "OLTP_PASSWORD";
    pub const HTTP_BIND: &str = "DIVELOG_HTTP_BIND";
    pub const LOG_FORMAT: &str = "DIVELOG_LOG_FORMAT";
}

/// Variables keyed case-insensitively. When both spellings are present
/// the exact upper-case name wins.
#[derive(Debug, Clone, Default)]
pub struct EnvVars {
    vars: HashMap<String, String>,
}

impl EnvVars {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut vars = HashMap::new();
        let mut exact = Vec::new();
        for (key, value) in pairs {
            let key = key.into();
            let upper = key.to_ascii_uppercase();
            if upper == key {
                exact.push((upper, value.into()));
            } else {
                vars.insert(upper, value.into());
            }
        }
        vars.extend(exact);
        Self { vars }
    }

    /// Snapshot of the process environment; non-UTF-8 entries are skipped
    pub fn from_process() -> Self {
        Self::from_pairs(
            std::env::vars_os()
                .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?))),
        )
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.vars.get(&key.to_ascii_uppercase()).cloned()
    }
}

impl AppConfig {
    /// Load configuration from DIVELOG_CONFIG path (TOML) if present, then
    /// apply environment overrides. A `.env` file in the working directory
    /// supplies variables the process does not already set.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let env = EnvVars::from_process();

        let path = env
            .get(env_vars::CONFIG_PATH)
            .unwrap_or_else(|| "divelog.toml".to_string());
        let mut cfg = Self::from_path(&path)?;
        cfg.apply_env(|key| env.get(key))?;
        Ok(cfg)
    }

    /// Read a TOML file, falling back to defaults when it does not exist
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let s = fs::read_to_string(path)?;
        Ok(toml::from_str::<AppConfig>(&s)?)
    }

    /// Override settings from a variable lookup (normally the process
    /// environment). Unset or empty variables leave the setting alone.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = get(env_vars::DB_HOST) {
            self.database.host = host;
        }
        if let Some(port) = get(env_vars::DB_PORT) {
            self.database.port = port.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                var: env_vars::DB_PORT,
                value: port.clone(),
            })?;
        }
        if let Some(name) = get(env_vars::DB_NAME) {
            self.database.name = name;
        }
        if let Some(user) = get(env_vars::DB_USER) {
            self.database.user = user;
        }
        if let Some(password) = get(env_vars::DB_PASSWORD) {
            self.database.password = password;
        }
        if let Some(bind) = get(env_vars::HTTP_BIND) {
            self.http.bind = bind;
        }
        if let Some(format) = get(env_vars::LOG_FORMAT) {
            self.log.format = format.parse().map_err(|_| ConfigError::InvalidEnv {
                var: env_vars::LOG_FORMAT,
                value: format.clone(),
            })?;
        }
        Ok(())
    }

    /// Get HTTP bind address (default 0.0.0.0:8080)
    pub fn http_bind(&self) -> &str {
        &self.http.bind
    }
}
