use std::str::FromStr;
use std::time::Duration;

use crate::hub::fanout::{DEFAULT_INTAKE_CAPACITY, DEFAULT_WRITE_TIMEOUT};
use crate::hub::heartbeat::DEFAULT_HEARTBEAT_INTERVAL;
use crate::hub::HubConfig;

/// Hub configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port the HTTP server binds to.
    pub port: u16,
    /// How often a `heartbeat` envelope is broadcast.
    pub heartbeat_interval: Duration,
    /// Upper bound on a single write to one connection.
    pub write_timeout: Duration,
    /// Intake channel size; producers wait once this many requests are queued.
    pub intake_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            intake_capacity: DEFAULT_INTAKE_CAPACITY,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Every variable is optional; missing, malformed or zero values fall back
    /// to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: parse_var("PORT", env_var("PORT")).unwrap_or(defaults.port),
            heartbeat_interval: positive_millis("HEARTBEAT_INTERVAL_MS", env_var("HEARTBEAT_INTERVAL_MS"))
                .unwrap_or(defaults.heartbeat_interval),
            write_timeout: positive_millis("WRITE_TIMEOUT_MS", env_var("WRITE_TIMEOUT_MS"))
                .unwrap_or(defaults.write_timeout),
            intake_capacity: parse_var::<usize>("INTAKE_CAPACITY", env_var("INTAKE_CAPACITY"))
                .filter(|n| *n > 0)
                .unwrap_or(defaults.intake_capacity),
        }
    }

    pub fn hub_config(&self) -> HubConfig {
        HubConfig {
            intake_capacity: self.intake_capacity,
            write_timeout: self.write_timeout,
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn parse_var<T: FromStr>(name: &str, raw: Option<String>) -> Option<T> {
    let raw = raw?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(var = name, value = %raw, "ignoring malformed config value");
            None
        }
    }
}

fn positive_millis(name: &str, raw: Option<String>) -> Option<Duration> {
    parse_var::<u64>(name, raw)
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
}
