use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use chrono::TimeDelta;
use thiserror::Error;

use quill_db::writer::DEFAULT_QUEUE_CAPACITY;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is unset or still a placeholder")]
    MissingSecret(&'static str),

    #[error("{name} has an invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub token_ttl: TimeDelta,
    pub db_path: PathBuf,
    pub addr: SocketAddr,
    pub queue_capacity: usize,
    pub write_timeout: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let jwt_secret = var("QUILL_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            return Err(ConfigError::MissingSecret("QUILL_JWT_SECRET"));
        }

        let hours: i64 = parse_or(&var, "QUILL_JWT_EXPIRATION_HOURS", 24)?;
        if hours <= 0 {
            return Err(ConfigError::Invalid {
                name: "QUILL_JWT_EXPIRATION_HOURS",
                value: hours.to_string(),
            });
        }

        let db_path: PathBuf = var("QUILL_DB_PATH")
            .unwrap_or_else(|| "quill.db".into())
            .into();

        let host = var("QUILL_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = parse_or(&var, "QUILL_PORT", 8080)?;
        let addr: SocketAddr =
            format!("{}:{}", host, port)
                .parse()
                .map_err(|_| ConfigError::Invalid {
                    name: "QUILL_HOST",
                    value: host.clone(),
                })?;

        let queue_capacity: usize = parse_or(&var, "QUILL_QUEUE_CAPACITY", DEFAULT_QUEUE_CAPACITY)?;
        if queue_capacity == 0 {
            return Err(ConfigError::Invalid {
                name: "QUILL_QUEUE_CAPACITY",
                value: "0".into(),
            });
        }

        let write_timeout = match var("QUILL_WRITE_TIMEOUT_SECS") {
            Some(raw) => Some(Duration::from_secs(raw.parse().map_err(|_| {
                ConfigError::Invalid {
                    name: "QUILL_WRITE_TIMEOUT_SECS",
                    value: raw.clone(),
                }
            })?)),
            None => None,
        };

        Ok(Self {
            jwt_secret,
            token_ttl: TimeDelta::hours(hours),
            db_path,
            addr,
            queue_capacity,
            write_timeout,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match var(name) {
        Some(raw) => raw
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| env.get(name).cloned())
    }

    #[test]
    fn defaults() {
        let config = load(&[("QUILL_JWT_SECRET", "a-real-secret")]).unwrap();
        assert_eq!(config.token_ttl, TimeDelta::hours(24));
        assert_eq!(config.db_path, PathBuf::from("quill.db"));
        assert_eq!(config.addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
        assert!(config.write_timeout.is_none());
    }

    #[test]
    fn overrides() {
        let config = load(&[
            ("QUILL_JWT_SECRET", "a-real-secret"),
            ("QUILL_JWT_EXPIRATION_HOURS", "1"),
            ("QUILL_HOST", "127.0.0.1"),
            ("QUILL_PORT", "9000"),
            ("QUILL_QUEUE_CAPACITY", "4"),
            ("QUILL_WRITE_TIMEOUT_SECS", "5"),
        ])
        .unwrap();
        assert_eq!(config.token_ttl, TimeDelta::hours(1));
        assert_eq!(config.addr, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.queue_capacity, 4);
        assert_eq!(config.write_timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn refuses_missing_or_placeholder_secret() {
        assert!(matches!(load(&[]), Err(ConfigError::MissingSecret(_))));
        assert!(matches!(
            load(&[("QUILL_JWT_SECRET", "dev-secret-change-me")]),
            Err(ConfigError::MissingSecret(_))
        ));
    }

    #[test]
    fn rejects_bad_numbers() {
        for (name, value) in [
            ("QUILL_PORT", "http"),
            ("QUILL_QUEUE_CAPACITY", "0"),
            ("QUILL_JWT_EXPIRATION_HOURS", "-3"),
            ("QUILL_WRITE_TIMEOUT_SECS", "soon"),
        ] {
            let err = load(&[("QUILL_JWT_SECRET", "a-real-secret"), (name, value)]).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { .. }), "{name}");
        }
    }
}
