use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::messaging::NOTIFY_TOPIC;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidValue { var: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Scylla,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokerBackend {
    Kafka,
    Log,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub http_addr: SocketAddr,
    pub store_backend: StoreBackend,
    pub scylla_node: String,
    pub scylla_keyspace: String,
    pub broker_backend: BrokerBackend,
    pub kafka_brokers: String,
    pub notify_topic: String,
    pub store_timeout: Duration,
    pub publish_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_addr: SocketAddr::from(([0, 0, 0, 0], 9001)),
            store_backend: StoreBackend::Scylla,
            scylla_node: "127.0.0.1:9042".into(),
            scylla_keyspace: "orders_ks".into(),
            broker_backend: BrokerBackend::Kafka,
            kafka_brokers: "127.0.0.1:9092".into(),
            notify_topic: NOTIFY_TOPIC.into(),
            store_timeout: Duration::from_secs(10),
            publish_timeout: Duration::from_secs(10),
        }
    }
}

impl Config {
    /// Read configuration from the process environment, after loading `.env`
    /// if one exists. Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env file");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            http_addr: parse_or(&lookup, "HTTP_ADDR", defaults.http_addr)?,
            store_backend: match lookup("STORE_BACKEND").as_deref() {
                None | Some("scylla") => StoreBackend::Scylla,
                Some("memory") => StoreBackend::Memory,
                Some(other) => return Err(invalid("STORE_BACKEND", format!("unknown backend '{other}'"))),
            },
            scylla_node: lookup("SCYLLA_NODE").unwrap_or(defaults.scylla_node),
            scylla_keyspace: lookup("SCYLLA_KEYSPACE").unwrap_or(defaults.scylla_keyspace),
            broker_backend: match lookup("BROKER_BACKEND").as_deref() {
                None | Some("kafka") => BrokerBackend::Kafka,
                Some("log") => BrokerBackend::Log,
                Some(other) => return Err(invalid("BROKER_BACKEND", format!("unknown backend '{other}'"))),
            },
            kafka_brokers: lookup("KAFKA_BROKERS").unwrap_or(defaults.kafka_brokers),
            notify_topic: lookup("NOTIFY_TOPIC").unwrap_or(defaults.notify_topic),
            store_timeout: Duration::from_secs(parse_or(
                &lookup,
                "STORE_TIMEOUT_SECS",
                defaults.store_timeout.as_secs(),
            )?),
            publish_timeout: Duration::from_secs(parse_or(
                &lookup,
                "PUBLISH_TIMEOUT_SECS",
                defaults.publish_timeout.as_secs(),
            )?),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.scylla_keyspace.is_empty()
            || !self
                .scylla_keyspace
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(invalid("SCYLLA_KEYSPACE", "must be a plain identifier".into()));
        }
        if self.notify_topic.is_empty() {
            return Err(invalid("NOTIFY_TOPIC", "cannot be empty".into()));
        }
        if self.store_timeout.is_zero() {
            return Err(invalid("STORE_TIMEOUT_SECS", "must be greater than zero".into()));
        }
        if self.publish_timeout.is_zero() {
            return Err(invalid("PUBLISH_TIMEOUT_SECS", "must be greater than zero".into()));
        }
        Ok(())
    }
}

fn invalid(var: &'static str, reason: String) -> ConfigError {
    ConfigError::InvalidValue { var, reason }
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        Some(raw) => raw.parse().map_err(|e: T::Err| invalid(var, e.to_string())),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = from_pairs(&[]).unwrap();
        assert_eq!(config.http_addr.port(), 9001);
        assert_eq!(config.store_backend, StoreBackend::Scylla);
        assert_eq!(config.broker_backend, BrokerBackend::Kafka);
        assert_eq!(config.notify_topic, "email_queue");
        assert_eq!(config.store_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_overrides() {
        let config = from_pairs(&[
            ("HTTP_ADDR", "127.0.0.1:8080"),
            ("STORE_BACKEND", "memory"),
            ("BROKER_BACKEND", "log"),
            ("NOTIFY_TOPIC", "fulfilment"),
            ("PUBLISH_TIMEOUT_SECS", "3"),
        ])
        .unwrap();

        assert_eq!(config.http_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.broker_backend, BrokerBackend::Log);
        assert_eq!(config.notify_topic, "fulfilment");
        assert_eq!(config.publish_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(from_pairs(&[("STORE_BACKEND", "mongo")]).is_err());
        assert!(from_pairs(&[("STORE_TIMEOUT_SECS", "ten")]).is_err());
        assert!(from_pairs(&[("STORE_TIMEOUT_SECS", "0")]).is_err());
        assert!(from_pairs(&[("SCYLLA_KEYSPACE", "orders; DROP")]).is_err());
        assert!(from_pairs(&[("HTTP_ADDR", "nowhere")]).is_err());
    }
}
