//! Server configuration.
//!
//! Configuration is loaded from environment variables. The database URL is
//! redacted in Debug output.

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Default HTTP bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default depth of each session's outbound queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Smallest outbound queue that can hold a session's first two frames.
pub const MIN_QUEUE_CAPACITY: usize = 2;

/// Default cap on members per room.
pub const DEFAULT_MAX_ROOM_MEMBERS: usize = 64;

/// Default time a new connection has to send its join message.
pub const DEFAULT_HANDSHAKE_TIMEOUT_SECS: u64 = 10;

/// What fan-out does when a member's outbound queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlowConsumerPolicy {
    /// Discard the frame for that member only.
    Drop,
    /// Discard the frame and terminate that member's session.
    #[default]
    Disconnect,
}

impl FromStr for SlowConsumerPolicy {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "drop" => Ok(Self::Drop),
            "disconnect" => Ok(Self::Disconnect),
            other => Err(ConfigError::InvalidValue(
                "SIGNALING_SLOW_CONSUMER_POLICY".to_string(),
                other.to_string(),
            )),
        }
    }
}

/// Limits applied by the signaling core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalingConfig {
    pub queue_capacity: usize,
    pub max_room_members: usize,
    pub handshake_timeout: Duration,
    pub slow_consumer_policy: SlowConsumerPolicy,
}

impl Default for SignalingConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_room_members: DEFAULT_MAX_ROOM_MEMBERS,
            handshake_timeout: Duration::from_secs(DEFAULT_HANDSHAKE_TIMEOUT_SECS),
            slow_consumer_policy: SlowConsumerPolicy::default(),
        }
    }
}

#[derive(Clone)]
pub struct Config {
    /// Server bind address.
    pub bind_address: String,

    /// PostgreSQL connection URL. Meetings are kept in memory when unset.
    pub database_url: Option<String>,

    pub signaling: SignalingConfig,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[REDACTED]"),
            )
            .field("signaling", &self.signaling)
            .finish()
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = match (vars.get("BIND_ADDRESS"), vars.get("PORT")) {
            (Some(addr), _) => addr.clone(),
            (None, Some(port)) => {
                let port: u16 = parse_var("PORT", port)?;
                format!("0.0.0.0:{}", port)
            }
            (None, None) => DEFAULT_BIND_ADDRESS.to_string(),
        };

        let database_url = vars
            .get("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .cloned();

        let queue_capacity = optional_var(
            vars,
            "SIGNALING_QUEUE_CAPACITY",
            DEFAULT_QUEUE_CAPACITY,
        )?;
        // id and peers are queued together on join
        if queue_capacity < MIN_QUEUE_CAPACITY {
            return Err(ConfigError::InvalidValue(
                "SIGNALING_QUEUE_CAPACITY".to_string(),
                queue_capacity.to_string(),
            ));
        }

        let max_room_members = optional_var(
            vars,
            "SIGNALING_MAX_ROOM_MEMBERS",
            DEFAULT_MAX_ROOM_MEMBERS,
        )?;
        if max_room_members == 0 {
            return Err(ConfigError::InvalidValue(
                "SIGNALING_MAX_ROOM_MEMBERS".to_string(),
                "0".to_string(),
            ));
        }

        let handshake_timeout_secs = optional_var(
            vars,
            "SIGNALING_HANDSHAKE_TIMEOUT_SECS",
            DEFAULT_HANDSHAKE_TIMEOUT_SECS,
        )?;

        let slow_consumer_policy = match vars.get("SIGNALING_SLOW_CONSUMER_POLICY") {
            Some(value) => value.parse()?,
            None => SlowConsumerPolicy::default(),
        };

        Ok(Self {
            bind_address,
            database_url,
            signaling: SignalingConfig {
                queue_capacity,
                max_room_members,
                handshake_timeout: Duration::from_secs(handshake_timeout_secs),
                slow_consumer_policy,
            },
        })
    }
}

fn parse_var<T: FromStr>(name: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(name.to_string(), raw.to_string()))
}

fn optional_var<T: FromStr>(
    vars: &HashMap<String, String>,
    name: &str,
    default: T,
) -> Result<T, ConfigError> {
    match vars.get(name) {
        Some(raw) => parse_var(name, raw),
        None => Ok(default),
    }
}
