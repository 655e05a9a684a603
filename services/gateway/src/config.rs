//! Gateway configuration from the environment
//!
//! An optional `.env` file is loaded first; real environment variables win.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_RATE_LIMIT_PER_MIN: u32 = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} is not valid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub listen_addr: SocketAddr,
    pub data_dir: PathBuf,
    /// Shared secret the chat platform presents as a bearer token
    pub platform_token: Option<String>,
    /// Upper bound on a long-poll; unbounded when unset
    pub max_wait: Option<Duration>,
    /// Commands per participant per minute
    pub rate_limit_per_min: u32,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            platform_token: None,
            max_wait: None,
            rate_limit_per_min: DEFAULT_RATE_LIMIT_PER_MIN,
        }
    }
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is normal
        let _ = dotenvy::dotenv();
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let listen_addr = get("EVALBOT_LISTEN_ADDR")
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                var: "EVALBOT_LISTEN_ADDR",
                reason: e.to_string(),
            })?;

        let data_dir = PathBuf::from(get("EVALBOT_DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()));

        let max_wait = match get("EVALBOT_MAX_WAIT_SECS") {
            None => None,
            Some(raw) => Some(Duration::from_secs(parse_positive("EVALBOT_MAX_WAIT_SECS", &raw)?)),
        };

        let rate_limit_per_min = match get("EVALBOT_RATE_LIMIT_PER_MIN") {
            None => DEFAULT_RATE_LIMIT_PER_MIN,
            Some(raw) => {
                let value = parse_positive("EVALBOT_RATE_LIMIT_PER_MIN", &raw)?;
                u32::try_from(value).map_err(|e| ConfigError::Invalid {
                    var: "EVALBOT_RATE_LIMIT_PER_MIN",
                    reason: e.to_string(),
                })?
            }
        };

        Ok(Self {
            listen_addr,
            data_dir,
            platform_token: get("EVALBOT_PLATFORM_TOKEN"),
            max_wait,
            rate_limit_per_min,
        })
    }
}

fn parse_positive(var: &'static str, raw: &str) -> Result<u64, ConfigError> {
    match raw.parse::<u64>() {
        Ok(0) => Err(ConfigError::Invalid {
            var,
            reason: "must be greater than zero".to_string(),
        }),
        Ok(value) => Ok(value),
        Err(e) => Err(ConfigError::Invalid {
            var,
            reason: e.to_string(),
        }),
    }
}
