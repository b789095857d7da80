//! Process configuration, read from the environment once at startup.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use billjobs_observability::LogFormat;

use crate::session::DEFAULT_SESSION_TTL;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_ISSUER: &str = "billjobs";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error("{set} is set but {missing} is not")]
    Incomplete {
        set: &'static str,
        missing: &'static str,
    },
}

/// Credentials for the admin account created at startup.
#[derive(Clone, PartialEq, Eq)]
pub struct AdminSeed {
    pub username: String,
    pub password: String,
}

impl core::fmt::Debug for AdminSeed {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AdminSeed")
            .field("username", &self.username)
            .field("password", &"****")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// `BIND_ADDR`
    pub bind_addr: SocketAddr,
    /// `BILLJOBS_ADMIN_USERNAME` + `BILLJOBS_ADMIN_PASSWORD`
    pub admin: Option<AdminSeed>,
    /// `BILLJOBS_ISSUER`; a literal `\n` separates address lines.
    pub issuer: String,
    /// `LOG_FORMAT`
    pub log_format: LogFormat,
    /// `BILLJOBS_SESSION_TTL_SECS`
    pub session_ttl: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            admin: None,
            issuer: DEFAULT_ISSUER.to_string(),
            log_format: LogFormat::default(),
            session_ttl: DEFAULT_SESSION_TTL,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source (tests pass a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .trim()
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                var: "BIND_ADDR",
                reason: e.to_string(),
            })?;

        let admin = match (get("BILLJOBS_ADMIN_USERNAME"), get("BILLJOBS_ADMIN_PASSWORD")) {
            (Some(username), Some(password)) => Some(AdminSeed {
                username: username.trim().to_string(),
                password,
            }),
            (Some(_), None) => {
                return Err(ConfigError::Incomplete {
                    set: "BILLJOBS_ADMIN_USERNAME",
                    missing: "BILLJOBS_ADMIN_PASSWORD",
                });
            }
            (None, Some(_)) => {
                return Err(ConfigError::Incomplete {
                    set: "BILLJOBS_ADMIN_PASSWORD",
                    missing: "BILLJOBS_ADMIN_USERNAME",
                });
            }
            (None, None) => None,
        };

        let issuer = get("BILLJOBS_ISSUER")
            .map(|v| v.replace("\\n", "\n"))
            .unwrap_or_else(|| DEFAULT_ISSUER.to_string());

        let log_format = match get("LOG_FORMAT") {
            Some(v) => v.parse::<LogFormat>().map_err(|reason| ConfigError::Invalid {
                var: "LOG_FORMAT",
                reason,
            })?,
            None => LogFormat::default(),
        };

        let session_ttl = match get("BILLJOBS_SESSION_TTL_SECS") {
            Some(v) => v
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or_else(|| ConfigError::Invalid {
                    var: "BILLJOBS_SESSION_TTL_SECS",
                    reason: format!("expected a positive number of seconds, got '{v}'"),
                })?,
            None => DEFAULT_SESSION_TTL,
        };

        Ok(Self {
            bind_addr,
            admin,
            issuer,
            log_format,
            session_ttl,
        })
    }
}
