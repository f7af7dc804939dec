//! Layered configuration.
//!
//! Sources, highest priority first:
//! 1. Environment variables (`EXPERTDESK_*`, `__` separates sections)
//! 2. `expertdesk.toml` in the working directory
//! 3. Built-in defaults
//!
//! `EXPERTDESK_SERVER__BIND_ADDR` maps to `server.bind_addr`,
//! `EXPERTDESK_INCENTIVES__INCENTIVE_PER_CALL_BRL` to
//! `incentives.incentive_per_call_brl`, and so on.

use std::net::SocketAddr;
use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::workflow::IncentivePolicy;

/// Application-level constants
pub const APP_NAME: &str = "Expertdesk";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

const CONFIG_FILE: &str = "expertdesk.toml";
const ENV_PREFIX: &str = "EXPERTDESK_";

const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;
const MAX_LINK_TTL_DAYS: i64 = 365;
const MAX_ELIGIBILITY_WINDOW_DAYS: i64 = 3650;

/// Filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "expertdesk=info,expertdesk_lib=info,tower_http=warn"
}

/// Where data lives when no database path is configured.
pub fn app_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("expertdesk")
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Figment(#[from] figment::Error),

    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

impl ConfigError {
    fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Browser origin allowed by CORS. No CORS headers are sent when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cors_origin: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".into(),
            cors_origin: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: app_data_dir().join("expertdesk.db"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub session_ttl_hours: i64,
    /// Seeded as an admin when the user table is empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bootstrap_admin_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bootstrap_admin_password: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_hours: 12,
            bootstrap_admin_email: None,
            bootstrap_admin_password: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationsConfig {
    /// Applied when a link is created without `expiresInDays`. 0 = never.
    pub link_ttl_days: i64,
}

impl Default for InvitationsConfig {
    fn default() -> Self {
        Self { link_ttl_days: 14 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub invitations: InvitationsConfig,
    #[serde(default)]
    pub incentives: IncentivePolicy,
}

impl AppConfig {
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load and validate configuration from all sources.
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment().extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()?;
        if !(1..=MAX_SESSION_TTL_HOURS).contains(&self.auth.session_ttl_hours) {
            return Err(ConfigError::invalid(
                "auth.session_ttl_hours",
                format!("must be between 1 and {MAX_SESSION_TTL_HOURS}"),
            ));
        }
        if !(0..=MAX_LINK_TTL_DAYS).contains(&self.invitations.link_ttl_days) {
            return Err(ConfigError::invalid(
                "invitations.link_ttl_days",
                format!("must be between 0 and {MAX_LINK_TTL_DAYS}"),
            ));
        }
        if self.incentives.incentive_per_call_brl < 0.0 {
            return Err(ConfigError::invalid(
                "incentives.incentive_per_call_brl",
                "must not be negative",
            ));
        }
        if !(0..=MAX_ELIGIBILITY_WINDOW_DAYS).contains(&self.incentives.eligibility_window_days) {
            return Err(ConfigError::invalid(
                "incentives.eligibility_window_days",
                format!("must be between 0 and {MAX_ELIGIBILITY_WINDOW_DAYS}"),
            ));
        }
        if self.auth.bootstrap_admin_email.is_some() != self.auth.bootstrap_admin_password.is_some() {
            return Err(ConfigError::invalid(
                "auth.bootstrap_admin_password",
                "bootstrap admin needs both email and password",
            ));
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server
            .bind_addr
            .parse()
            .map_err(|e| ConfigError::invalid("server.bind_addr", format!("{e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        config.validate().unwrap();
        assert_eq!(config.invitations.link_ttl_days, 14);
        assert_eq!(config.incentives, IncentivePolicy::default());
        assert!(config.database.path.ends_with("expertdesk.db"));
    }

    #[test]
    fn toml_file_then_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                CONFIG_FILE,
                r#"
                [server]
                bind_addr = "0.0.0.0:9000"

                [incentives]
                incentive_per_call_brl = 250.0
                eligibility_window_days = 60
                "#,
            )?;
            jail.set_env("EXPERTDESK_INCENTIVES__ELIGIBILITY_WINDOW_DAYS", "30");
            jail.set_env("EXPERTDESK_DATABASE__PATH", "/tmp/desk.db");

            let config = AppConfig::load().expect("config loads");
            assert_eq!(config.socket_addr().unwrap().port(), 9000);
            assert_eq!(config.incentives.incentive_per_call_brl, 250.0);
            assert_eq!(config.incentives.eligibility_window_days, 30);
            assert_eq!(config.database.path, PathBuf::from("/tmp/desk.db"));
            assert_eq!(config.auth.session_ttl_hours, 12);
            Ok(())
        });
    }

    #[test]
    fn rejects_bad_bind_address() {
        Jail::expect_with(|jail| {
            jail.set_env("EXPERTDESK_SERVER__BIND_ADDR", "not-an-address");
            let err = AppConfig::load().unwrap_err();
            assert!(matches!(err, ConfigError::InvalidValue { .. }));
            Ok(())
        });
    }

    #[test]
    fn bootstrap_admin_needs_both_fields() {
        let mut config = AppConfig::default();
        config.auth.bootstrap_admin_email = Some("admin@example.com".into());
        assert!(config.validate().is_err());
        config.auth.bootstrap_admin_password = Some("correct horse".into());
        config.validate().unwrap();
    }

    #[test]
    fn durations_are_bounded() {
        let mut config = AppConfig::default();
        config.auth.session_ttl_hours = i64::MAX;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.invitations.link_ttl_days = MAX_LINK_TTL_DAYS + 1;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.incentives.eligibility_window_days = i64::MAX;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.auth.session_ttl_hours = MAX_SESSION_TTL_HOURS;
        config.invitations.link_ttl_days = 0;
        config.incentives.eligibility_window_days = MAX_ELIGIBILITY_WINDOW_DAYS;
        config.validate().unwrap();
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, env!("CARGO_PKG_VERSION"));
    }
}
