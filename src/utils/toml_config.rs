//! TOML-based configuration for Warden
//!
//! The server reads one declarative file (`warden.toml` by default). Secrets
//! never live in the file itself: it names the environment variables that
//! hold them, and those are resolved once at startup.
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//!
//! [auth]
//! jwt_secret_env = "JWT_SECRET"
//! token_ttl_secs = 3600
//! signin_failure_status = 401
//!
//! [database]
//! url = "./data/warden.db"
//! ```

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::auth::jwt::DEFAULT_TOKEN_TTL_SECS;

/// Root configuration structure loaded from warden.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WardenConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Fallback tracing filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

// ============= Authentication Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Environment variable name containing the token signing secret
    #[serde(default = "default_jwt_secret_env")]
    pub jwt_secret_env: String,

    /// Lifetime of issued tokens
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: i64,

    /// Status for rejected sign-ins: 401 or 400
    #[serde(default = "default_signin_failure_status")]
    pub signin_failure_status: u16,
}

fn default_jwt_secret_env() -> String {
    "JWT_SECRET".to_string()
}

fn default_token_ttl_secs() -> i64 {
    DEFAULT_TOKEN_TTL_SECS
}

fn default_signin_failure_status() -> u16 {
    401
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret_env: default_jwt_secret_env(),
            token_ttl_secs: default_token_ttl_secs(),
            signin_failure_status: default_signin_failure_status(),
        }
    }
}

impl AuthConfig {
    /// The configured sign-in failure status as a typed code.
    ///
    /// Only 400 and 401 are meaningful; anything else has already been
    /// refused by [`WardenConfig::validate`] and falls back to 401 here.
    pub fn signin_failure_status(&self) -> StatusCode {
        match self.signin_failure_status {
            400 => StatusCode::BAD_REQUEST,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

// ============= Database Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Local database path, or `:memory:`
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Environment variable for Turso URL (optional cloud config)
    pub turso_url_env: Option<String>,

    /// Environment variable for Turso auth token
    pub turso_token_env: Option<String>,
}

fn default_database_url() -> String {
    "./data/warden.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            turso_url_env: None,
            turso_token_env: None,
        }
    }
}

fn resolve_non_empty(env_name: Option<&String>) -> Option<String> {
    env_name
        .and_then(|name| std::env::var(name).ok())
        .filter(|value| !value.is_empty())
}

impl DatabaseConfig {
    /// Remote database URL, when configured and set.
    pub fn resolve_turso_url(&self) -> Option<String> {
        resolve_non_empty(self.turso_url_env.as_ref())
    }

    /// Remote database token, when configured and set.
    pub fn resolve_turso_token(&self) -> Option<String> {
        resolve_non_empty(self.turso_token_env.as_ref())
    }
}

// ============= Configuration Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),

    #[error("Environment variable '{0}' referenced in config is empty")]
    EmptyEnvVar(String),
}

impl WardenConfig {
    /// Load and validate configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config: WardenConfig = toml::from_str(&content)?;

        config.validate()?;

        Ok(config)
    }

    /// Validate value ranges and env var availability
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "server.port must be between 1 and 65535".to_string(),
            ));
        }

        if self.auth.token_ttl_secs <= 0 {
            return Err(ConfigError::ValidationError(format!(
                "auth.token_ttl_secs must be positive, got {}",
                self.auth.token_ttl_secs
            )));
        }

        if !matches!(self.auth.signin_failure_status, 400 | 401) {
            return Err(ConfigError::ValidationError(format!(
                "auth.signin_failure_status must be 400 or 401, got {}",
                self.auth.signin_failure_status
            )));
        }

        self.jwt_secret()?;

        // Remote database settings come as a pair
        if let Some(ref env) = self.database.turso_url_env {
            self.validate_env_var(env)?;
        }
        if let Some(ref env) = self.database.turso_token_env {
            self.validate_env_var(env)?;
        }

        Ok(())
    }

    fn validate_env_var(&self, name: &str) -> Result<(), ConfigError> {
        std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))?;
        Ok(())
    }

    /// Get a resolved value from an env var reference
    pub fn resolve_env(&self, env_name: &str) -> Option<String> {
        std::env::var(env_name).ok()
    }

    /// Get the token signing secret from the environment
    ///
    /// Called once at startup; the value is handed to `TokenService` and not
    /// looked up again.
    pub fn jwt_secret(&self) -> Result<String, ConfigError> {
        let secret = self
            .resolve_env(&self.auth.jwt_secret_env)
            .ok_or_else(|| ConfigError::MissingEnvVar(self.auth.jwt_secret_env.clone()))?;

        if secret.is_empty() {
            return Err(ConfigError::EmptyEnvVar(self.auth.jwt_secret_env.clone()));
        }

        Ok(secret)
    }

    /// Address the HTTP listener binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_parse_full_config() {
        std::env::set_var("WARDEN_TEST_PARSE_SECRET", "test-secret-at-least-32-characters-long");

        let file = write_config(
            r#"
[server]
host = "0.0.0.0"
port = 9000
log_level = "debug"

[auth]
jwt_secret_env = "WARDEN_TEST_PARSE_SECRET"
token_ttl_secs = 600
signin_failure_status = 400

[database]
url = ":memory:"
"#,
        );

        let config = WardenConfig::load(file.path()).expect("config should load");

        assert_eq!(config.bind_address(), "0.0.0.0:9000");
        assert_eq!(config.server.log_level, "debug");
        assert_eq!(config.auth.token_ttl_secs, 600);
        assert_eq!(config.auth.signin_failure_status(), StatusCode::BAD_REQUEST);
        assert_eq!(config.database.url, ":memory:");
        assert_eq!(
            config.jwt_secret().unwrap(),
            "test-secret-at-least-32-characters-long"
        );
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config: WardenConfig = toml::from_str("").unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.auth.jwt_secret_env, "JWT_SECRET");
        assert_eq!(config.auth.token_ttl_secs, 3600);
        assert_eq!(config.auth.signin_failure_status(), StatusCode::UNAUTHORIZED);
        assert_eq!(config.database.url, "./data/warden.db");
    }

    #[test]
    fn test_missing_file() {
        let result = WardenConfig::load("/definitely/not/here/warden.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_invalid_toml() {
        let file = write_config("[server\nport = ");
        assert!(matches!(
            WardenConfig::load(file.path()),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_missing_secret_env_var() {
        std::env::remove_var("WARDEN_TEST_UNSET_SECRET");
        let file = write_config(
            r#"
[auth]
jwt_secret_env = "WARDEN_TEST_UNSET_SECRET"
"#,
        );

        match WardenConfig::load(file.path()) {
            Err(ConfigError::MissingEnvVar(name)) => assert_eq!(name, "WARDEN_TEST_UNSET_SECRET"),
            other => panic!("expected MissingEnvVar, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_secret_rejected() {
        std::env::set_var("WARDEN_TEST_EMPTY_SECRET", "");
        let mut config = WardenConfig::default();
        config.auth.jwt_secret_env = "WARDEN_TEST_EMPTY_SECRET".to_string();

        assert!(matches!(config.validate(), Err(ConfigError::EmptyEnvVar(_))));
    }

    #[test]
    fn test_value_ranges() {
        std::env::set_var("WARDEN_TEST_RANGE_SECRET", "secret");
        let mut config = WardenConfig::default();
        config.auth.jwt_secret_env = "WARDEN_TEST_RANGE_SECRET".to_string();
        assert!(config.validate().is_ok());

        let mut bad_status = config.clone();
        bad_status.auth.signin_failure_status = 403;
        assert!(matches!(
            bad_status.validate(),
            Err(ConfigError::ValidationError(_))
        ));

        let mut bad_ttl = config.clone();
        bad_ttl.auth.token_ttl_secs = 0;
        assert!(matches!(bad_ttl.validate(), Err(ConfigError::ValidationError(_))));

        let mut bad_port = config;
        bad_port.server.port = 0;
        assert!(matches!(bad_port.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_turso_env_resolution() {
        std::env::set_var("WARDEN_TEST_TURSO_URL", "libsql://example.turso.io");
        std::env::set_var("WARDEN_TEST_TURSO_TOKEN", "");

        let database = DatabaseConfig {
            url: ":memory:".to_string(),
            turso_url_env: Some("WARDEN_TEST_TURSO_URL".to_string()),
            turso_token_env: Some("WARDEN_TEST_TURSO_TOKEN".to_string()),
        };

        assert_eq!(
            database.resolve_turso_url().as_deref(),
            Some("libsql://example.turso.io")
        );
        assert_eq!(database.resolve_turso_token(), None);
        assert_eq!(DatabaseConfig::default().resolve_turso_url(), None);
    }
}
