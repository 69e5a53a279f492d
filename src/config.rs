//! Configuration for the MQTT v5 session demo
//!
//! Loaded from a TOML file. Every default mirrors the compile-time constants
//! of the original demo: 5 connect attempts with a 500 ms base and 5 s cap,
//! a 1 s CONNACK window, a 2 s process-loop window, 200 ms transport
//! timeouts, and three topic filters under `<client_id>/example/topic`.

use crate::session::backoff::RetryPolicy;
use crate::transport::TransportTimeouts;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Top-level demo configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DemoConfig {
    pub broker: BrokerSection,
    #[serde(default)]
    pub retry: RetrySection,
    #[serde(default)]
    pub session: SessionSection,
    #[serde(default)]
    pub topics: TopicSection,
}

/// Broker endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BrokerSection {
    /// Broker hostname or IP address
    pub endpoint: String,
    /// Plaintext MQTT port
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Reconnect retry budget and delay bounds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrySection {
    /// Total connect attempts allowed per reconnect sequence
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Base backoff delay in milliseconds
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Maximum backoff delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

/// Protocol session settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSection {
    /// Client identifier for the production session
    #[serde(default = "default_client_id")]
    pub client_id: String,
    /// Keep-alive period reported to the broker
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u16,
    /// CONNACK receive timeout in milliseconds
    #[serde(default = "default_connack_timeout_ms")]
    pub connack_timeout_ms: u64,
    /// Process-loop window for draining acks, in milliseconds
    #[serde(default = "default_process_loop_timeout_ms")]
    pub process_loop_timeout_ms: u64,
    /// Transport send and receive timeout in milliseconds
    #[serde(default = "default_transport_timeout_ms")]
    pub transport_timeout_ms: u64,
    /// Interval between network-readiness polls, in milliseconds
    #[serde(default = "default_network_poll_interval_ms")]
    pub network_poll_interval_ms: u64,
}

/// Topic filter table settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopicSection {
    /// Number of topic filters to prepare
    #[serde(default = "default_topic_count")]
    pub count: usize,
}

fn default_port() -> u16 {
    1883
}

fn default_max_attempts() -> u32 {
    5
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    5000
}

fn default_client_id() -> String {
    "testClient".to_string()
}

fn default_keep_alive_secs() -> u16 {
    60
}

fn default_connack_timeout_ms() -> u64 {
    1000
}

fn default_process_loop_timeout_ms() -> u64 {
    2000
}

fn default_transport_timeout_ms() -> u64 {
    200
}

fn default_network_poll_interval_ms() -> u64 {
    1000
}

fn default_topic_count() -> usize {
    3
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            client_id: default_client_id(),
            keep_alive_secs: default_keep_alive_secs(),
            connack_timeout_ms: default_connack_timeout_ms(),
            process_loop_timeout_ms: default_process_loop_timeout_ms(),
            transport_timeout_ms: default_transport_timeout_ms(),
            network_poll_interval_ms: default_network_poll_interval_ms(),
        }
    }
}

impl Default for TopicSection {
    fn default() -> Self {
        Self {
            count: default_topic_count(),
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            broker: BrokerSection {
                endpoint: "localhost".to_string(),
                port: default_port(),
            },
            retry: RetrySection::default(),
            session: SessionSection::default(),
            topics: TopicSection::default(),
        }
    }
}

/// Configuration loading and validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl DemoConfig {
    /// Load and validate configuration from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: DemoConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Enforce the invariants the session core relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.broker.endpoint.is_empty() {
            return Err(ConfigError::Invalid(
                "broker.endpoint must not be empty".to_string(),
            ));
        }
        if self.session.client_id.is_empty() {
            return Err(ConfigError::Invalid(
                "session.client_id must not be empty".to_string(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.retry.base_delay_ms == 0 {
            return Err(ConfigError::Invalid(
                "retry.base_delay_ms must be greater than 0".to_string(),
            ));
        }
        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(ConfigError::Invalid(format!(
                "retry.base_delay_ms ({}) must not exceed retry.max_delay_ms ({})",
                self.retry.base_delay_ms, self.retry.max_delay_ms
            )));
        }
        if self.topics.count == 0 {
            return Err(ConfigError::Invalid(
                "topics.count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Topic prefix: the client identifier keeps each demo instance on its
    /// own topic namespace
    pub fn topic_prefix(&self) -> String {
        format!("{}/example/topic", self.session.client_id)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            base_delay_ms: self.retry.base_delay_ms,
            max_delay_ms: self.retry.max_delay_ms,
            max_attempts: self.retry.max_attempts,
        }
    }

    pub fn transport_timeouts(&self) -> TransportTimeouts {
        TransportTimeouts::symmetric(Duration::from_millis(self.session.transport_timeout_ms))
    }

    pub fn connack_timeout(&self) -> Duration {
        Duration::from_millis(self.session.connack_timeout_ms)
    }

    pub fn process_loop_timeout(&self) -> Duration {
        Duration::from_millis(self.session.process_loop_timeout_ms)
    }

    pub fn network_poll_interval(&self) -> Duration {
        Duration::from_millis(self.session.network_poll_interval_ms)
    }
}
