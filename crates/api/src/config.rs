//! Process configuration from environment variables.

use std::net::SocketAddr;

use thiserror::Error;

use qsadmin_auth::JwtSettings;
use qsadmin_infra::{DatabaseConfig, DbBackend};
use qsadmin_observability::LogFormat;

const DEV_JWT_SECRET: &str = "qsadmin-dev-secret";

/// Origins allowed by default (the admin front-end dev servers).
pub const DEFAULT_CORS_ORIGINS: &[&str] = &[
    "http://127.0.0.1:1818",
    "http://localhost:8080",
    "http://localhost:8021",
    "http://localhost:8081",
    "http://localhost:1818",
];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database: DatabaseConfig,
    pub jwt: JwtSettings,
    pub cors_allowed_origins: Vec<String>,
    /// Ensure an `Administrator` role holding every function at startup.
    pub seed_admin_role: bool,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Read the process environment.
    ///
    /// Callers that want `.env` support load it with `dotenvy` first.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr = parse_or("BIND_ADDR", get("BIND_ADDR"), "0.0.0.0:8080".parse().ok())?;

        let backend: DbBackend = parse_or("DB_BACKEND", get("DB_BACKEND"), Some(DbBackend::Memory))?;
        let url = get("DATABASE_URL");
        if backend == DbBackend::Postgres && url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }
        let max_connections: u32 = parse_or("DB_MAX_CONNECTIONS", get("DB_MAX_CONNECTIONS"), Some(5))?;
        if max_connections == 0 {
            return Err(ConfigError::Invalid {
                var: "DB_MAX_CONNECTIONS",
                reason: "must be at least 1".into(),
            });
        }

        let secret = match (get("JWT_SECRET"), backend) {
            (Some(secret), _) => secret,
            (None, DbBackend::Memory) => {
                tracing::warn!("JWT_SECRET not set; using insecure dev default");
                DEV_JWT_SECRET.to_string()
            }
            (None, _) => return Err(ConfigError::Missing("JWT_SECRET")),
        };
        let jwt = JwtSettings {
            issuer: get("JWT_ISSUER").unwrap_or_else(|| "qsadmin".into()),
            audience: get("JWT_AUDIENCE").unwrap_or_else(|| "qsadmin-admin".into()),
            secret: secret.into_bytes(),
        };

        let cors_allowed_origins = match get("CORS_ALLOWED_ORIGINS") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect(),
            None => DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect(),
        };

        let seed_admin_role = match get("SEED_ADMIN_ROLE") {
            Some(value) => parse_bool("SEED_ADMIN_ROLE", &value)?,
            None => backend == DbBackend::Memory,
        };

        let log_format = parse_or("LOG_FORMAT", get("LOG_FORMAT"), Some(LogFormat::Json))?;

        Ok(Self {
            bind_addr,
            database: DatabaseConfig {
                backend,
                url,
                max_connections,
            },
            jwt,
            cors_allowed_origins,
            seed_admin_role,
            log_format,
        })
    }
}

fn parse_or<T>(var: &'static str, value: Option<String>, default: Option<T>) -> Result<T, ConfigError>
where
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
{
    match value {
        Some(raw) => raw.parse::<T>().map_err(|e| ConfigError::Invalid {
            var,
            reason: e.to_string(),
        }),
        None => default.ok_or(ConfigError::Missing(var)),
    }
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::Invalid {
            var,
            reason: format!("expected a boolean, got '{other}'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn empty_environment_gives_memory_defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(cfg.database.backend, DbBackend::Memory);
        assert_eq!(cfg.cors_allowed_origins.len(), DEFAULT_CORS_ORIGINS.len());
        assert!(cfg.seed_admin_role);
        assert_eq!(cfg.log_format, LogFormat::Json);
    }

    #[test]
    fn postgres_requires_url_and_secret() {
        assert_eq!(
            config(&[("DB_BACKEND", "postgres")]).unwrap_err(),
            ConfigError::Missing("DATABASE_URL")
        );
        assert_eq!(
            config(&[("DB_BACKEND", "postgres"), ("DATABASE_URL", "postgres://db/qs")]).unwrap_err(),
            ConfigError::Missing("JWT_SECRET")
        );

        let cfg = config(&[
            ("DB_BACKEND", "postgres"),
            ("DATABASE_URL", "postgres://db/qs"),
            ("JWT_SECRET", "s3cret"),
        ])
        .unwrap();
        assert!(!cfg.seed_admin_role);
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let err = config(&[("DB_MAX_CONNECTIONS", "many")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "DB_MAX_CONNECTIONS", .. }));

        let err = config(&[("SEED_ADMIN_ROLE", "maybe")]).unwrap_err();
        assert!(err.to_string().starts_with("invalid SEED_ADMIN_ROLE"));
    }

    #[test]
    fn cors_origins_are_a_comma_list() {
        let cfg = config(&[("CORS_ALLOWED_ORIGINS", "http://a.test, ,http://b.test")]).unwrap();
        assert_eq!(cfg.cors_allowed_origins, vec!["http://a.test", "http://b.test"]);
    }
}
