//! Runtime configuration read from the environment.

use std::net::SocketAddr;

use thiserror::Error;
use tracing::warn;

pub const BIND_ADDR_ENV: &str = "ECHOLEDGER_BIND_ADDR";
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const DEV_FUNDING_ENV: &str = "ECHOLEDGER_DEV_FUNDING";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} is not a valid socket address: {value}")]
    InvalidBindAddr { var: &'static str, value: String },

    #[error("{var} must be true or false, got {value}")]
    InvalidFlag { var: &'static str, value: String },

    #[error("{0} must not be empty")]
    Empty(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    /// Enables `POST /balances/deposit`, which mints balance out of thin air.
    pub dev_funding: bool,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; unset variables take their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_raw = lookup(BIND_ADDR_ENV).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.trim().parse().map_err(|_| ConfigError::InvalidBindAddr {
            var: BIND_ADDR_ENV,
            value: bind_raw.clone(),
        })?;

        let jwt_secret = match lookup(JWT_SECRET_ENV) {
            Some(s) if s.is_empty() => return Err(ConfigError::Empty(JWT_SECRET_ENV)),
            Some(s) => s,
            None => {
                warn!("{JWT_SECRET_ENV} not set; using insecure dev default");
                DEV_JWT_SECRET.to_string()
            }
        };

        let dev_funding = match lookup(DEV_FUNDING_ENV) {
            None => false,
            Some(v) => parse_flag(&v).ok_or(ConfigError::InvalidFlag {
                var: DEV_FUNDING_ENV,
                value: v.clone(),
            })?,
        };
        if dev_funding {
            warn!("dev funding enabled; any authenticated actor can mint balance");
        }

        Ok(Self {
            bind_addr,
            jwt_secret,
            dev_funding,
        })
    }

    /// Config for tests and embedded use: ephemeral loopback port, dev funding on.
    pub fn for_secret(jwt_secret: impl Into<String>) -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            jwt_secret: jwt_secret.into(),
            dev_funding: true,
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
