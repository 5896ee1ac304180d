//! Application configuration
//!
//! Loaded from a TOML file (default `~/.config/authors-api/config.toml`).
//! Every section and field is optional; anything left out keeps its default.
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//!
//! [api]
//! version = "1"
//!
//! [pagination]
//! default_page_size = 10
//! max_page_size = 50
//!
//! [authorization.policies]
//! is-admin = ["admin"]
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use axum::http::HeaderName;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::authorization::{default_policies, PolicyAuthorizer, IS_ADMIN};
use crate::domain::pagination::{PaginationPolicy, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::infrastructure::crypto::JwtConfig;
use crate::infrastructure::DatabaseConfig;
use crate::interfaces::http::hateoas::author_link_table;
use crate::interfaces::http::pagination::DEFAULT_TOTAL_COUNT_HEADER;
use crate::interfaces::http::versioning::{is_well_formed, VersionGate, DEFAULT_VERSION_HEADER};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {0} not found")]
    NotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Default location of the config file
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("authors-api")
        .join("config.toml")
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseSettings,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    pub api: ApiConfig,
    pub pagination: PaginationConfig,
    pub authorization: AuthorizationConfig,
    pub hateoas: HateoasConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Seconds to wait for in-flight requests on shutdown
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        let defaults = DatabaseConfig::default();
        Self {
            url: defaults.url,
            max_connections: defaults.max_connections,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `trace`, `debug`, `info`, `warn`, `error` or a full `EnvFilter` directive
    pub level: String,
    /// `text` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub jwt_issuer: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        let defaults = JwtConfig::default();
        Self {
            jwt_secret: defaults.secret,
            jwt_expiration_hours: defaults.expiration_hours,
            jwt_issuer: defaults.issuer,
        }
    }
}

impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("jwt_secret", &"<redacted>")
            .field("jwt_expiration_hours", &self.jwt_expiration_hours)
            .field("jwt_issuer", &self.jwt_issuer)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Exact value the version header must carry
    pub version: String,
    pub version_header: String,
    pub total_count_header: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            version: "1".to_string(),
            version_header: DEFAULT_VERSION_HEADER.to_string(),
            total_count_header: DEFAULT_TOTAL_COUNT_HEADER.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub default_page_size: u64,
    pub max_page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorizationConfig {
    /// Policy name -> roles that satisfy it
    pub policies: HashMap<String, Vec<String>>,
}

impl Default for AuthorizationConfig {
    fn default() -> Self {
        Self {
            policies: default_policies(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HateoasConfig {
    /// When set, links are only added if the request sends this header as `Y`
    pub opt_in_header: Option<String>,
}

fn header_name(field: &str, value: &str) -> Result<HeaderName, ConfigError> {
    HeaderName::try_from(value.to_ascii_lowercase())
        .map_err(|_| ConfigError::Invalid(format!("{} '{}' is not a valid header name", field, value)))
}

impl AppConfig {
    /// Reads and validates the file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::NotFound(path.to_path_buf()))
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_well_formed(&self.api.version) {
            return Err(ConfigError::Invalid(format!(
                "api.version '{}' must be dot separated digits",
                self.api.version
            )));
        }
        header_name("api.version_header", &self.api.version_header)?;
        header_name("api.total_count_header", &self.api.total_count_header)?;
        if let Some(header) = &self.hateoas.opt_in_header {
            header_name("hateoas.opt_in_header", header)?;
        }
        if self.pagination.max_page_size == 0 || self.pagination.default_page_size == 0 {
            return Err(ConfigError::Invalid(
                "pagination sizes must be at least 1".to_string(),
            ));
        }
        if self.security.jwt_secret.is_empty() {
            return Err(ConfigError::Invalid(
                "security.jwt_secret cannot be empty".to_string(),
            ));
        }
        self.check_policies()
    }

    /// Every policy the routes or the link table ask for must be defined.
    fn check_policies(&self) -> Result<(), ConfigError> {
        let links = author_link_table();
        let required = std::iter::once(IS_ADMIN).chain(links.iter().filter_map(|t| t.policy));
        for policy in required {
            if !self.authorization.policies.contains_key(policy) {
                return Err(ConfigError::Invalid(format!(
                    "authorization.policies must define '{}'",
                    policy
                )));
            }
        }
        Ok(())
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            url: self.database.url.clone(),
            max_connections: self.database.max_connections,
        }
    }

    pub fn jwt_config(&self) -> JwtConfig {
        JwtConfig {
            secret: self.security.jwt_secret.clone(),
            expiration_hours: self.security.jwt_expiration_hours,
            issuer: self.security.jwt_issuer.clone(),
        }
    }

    pub fn pagination_policy(&self) -> PaginationPolicy {
        PaginationPolicy::new(
            self.pagination.default_page_size,
            self.pagination.max_page_size,
        )
    }

    pub fn version_gate(&self) -> Result<VersionGate, ConfigError> {
        VersionGate::new(&self.api.version_header, self.api.version.clone()).map_err(|_| {
            ConfigError::Invalid(format!(
                "api.version_header '{}' is not a valid header name",
                self.api.version_header
            ))
        })
    }

    pub fn total_count_header(&self) -> Result<HeaderName, ConfigError> {
        header_name("api.total_count_header", &self.api.total_count_header)
    }

    pub fn opt_in_header(&self) -> Result<Option<HeaderName>, ConfigError> {
        self.hateoas
            .opt_in_header
            .as_deref()
            .map(|h| header_name("hateoas.opt_in_header", h))
            .transpose()
    }

    pub fn authorizer(&self) -> PolicyAuthorizer {
        PolicyAuthorizer::new(self.authorization.policies.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.api.version, "1");
        assert_eq!(config.api.version_header, "x-version");
        assert_eq!(config.api.total_count_header, "x-total-count");
        assert_eq!(config.pagination.default_page_size, 10);
        assert_eq!(config.pagination.max_page_size, 50);
        assert_eq!(
            config.authorization.policies.get("is-admin"),
            Some(&vec!["admin".to_string()])
        );
        assert!(config.hateoas.opt_in_header.is_none());
    }

    #[test]
    fn full_file_is_parsed() {
        let config = AppConfig::from_toml_str(
            r#"
            [server]
            host = "127.0.0.1"
            port = 9090
            shutdown_timeout = 5

            [database]
            url = "sqlite::memory:"

            [logging]
            level = "debug"
            format = "json"

            [security]
            jwt_secret = "s3cret"
            jwt_expiration_hours = 2
            jwt_issuer = "library"

            [api]
            version = "2.1"
            version_header = "X-Api-Version"
            total_count_header = "x-count"

            [pagination]
            default_page_size = 5
            max_page_size = 20

            [authorization.policies]
            is-admin = ["admin", "librarian"]

            [hateoas]
            opt_in_header = "includeHATEOAS"
            "#,
        )
        .unwrap();

        assert_eq!(config.address(), "127.0.0.1:9090");
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.jwt_config().issuer, "library");

        let gate = config.version_gate().unwrap();
        assert_eq!(gate.header().as_str(), "x-api-version");
        assert_eq!(gate.required(), "2.1");

        let policy = config.pagination_policy();
        assert_eq!(policy.default_page_size(), 5);
        assert_eq!(policy.max_page_size(), 20);

        assert_eq!(
            config.opt_in_header().unwrap().map(|h| h.to_string()),
            Some("includehateoas".to_string())
        );
        assert_eq!(
            config.authorization.policies["is-admin"],
            vec!["admin".to_string(), "librarian".to_string()]
        );
    }

    #[test]
    fn invalid_values_are_rejected() {
        for toml in [
            "[api]\nversion = \"v1\"",
            "[api]\nversion_header = \"bad header\"",
            "[pagination]\nmax_page_size = 0",
            "[security]\njwt_secret = \"\"",
            "[hateoas]\nopt_in_header = \"no spaces allowed\"",
        ] {
            assert!(
                matches!(AppConfig::from_toml_str(toml), Err(ConfigError::Invalid(_))),
                "{toml}"
            );
        }
    }

    #[test]
    fn policies_used_by_routes_must_be_defined() {
        let err = AppConfig::from_toml_str("[authorization.policies]\nis-reader = [\"reader\"]")
            .unwrap_err();
        match err {
            ConfigError::Invalid(message) => assert!(message.contains("is-admin"), "{message}"),
            other => panic!("unexpected error: {other}"),
        }

        let mut config = AppConfig::default();
        config.authorization.policies.clear();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config
            .authorization
            .policies
            .insert(IS_ADMIN.to_string(), vec!["admin".to_string()]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn syntax_errors_are_parse_errors() {
        assert!(matches!(
            AppConfig::from_toml_str("[server\nport = 1"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_reported() {
        let path = std::env::temp_dir().join(format!("authors-api-{}.toml", uuid::Uuid::new_v4()));
        assert!(matches!(AppConfig::load(&path), Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn file_on_disk_is_loaded() {
        let path = std::env::temp_dir().join(format!("authors-api-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "[server]\nport = 7001\n").unwrap();
        let config = AppConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.server.port, 7001);
    }

    #[test]
    fn default_path_ends_with_app_dir() {
        assert!(default_config_path().ends_with("authors-api/config.toml"));
    }

    #[test]
    fn debug_hides_jwt_secret() {
        let rendered = format!("{:?}", AppConfig::default());
        assert!(!rendered.contains("change-me"));
    }
}
