use std::env;
use std::time::Duration;

use thiserror::Error;

const DEFAULT_IP_LOOKUP_URL: &str = "https://ipapi.co/{ip}/json/";
const DEFAULT_REVERSE_GEOCODE_URL: &str = concat!(
    "https://api.bigdatacloud.net/data/reverse-geocode-client",
    "?latitude={lat}&longitude={lng}&localityLanguage=en"
);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Mongo,
    Memory,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host_addr: String,
    pub port: u16,
    pub store_backend: StoreBackend,
    pub mongodb_uri: Option<String>,
    pub database_name: String,
    pub jwt_secret: String,
    pub ip_lookup_url: String,       // `{ip}` is replaced by the visitor address
    pub reverse_geocode_url: String, // `{lat}` / `{lng}` placeholders
    pub http_timeout: Duration,
    pub heartbeat_interval: Duration,
    pub gps_timeout: Duration,
    pub session_max_age: Duration,
    pub session_idle_timeout: Duration, // Sessions that never post a visit are dropped after this
    pub hash_visitor_ips: bool,
    pub ip_hash_salt: String,
    pub handoff_phone: String,
    pub owner_name: String,
    pub allowed_origins: Vec<String>,
}

impl AppConfig {
    /// Read the configuration from the process environment (after `.env` is loaded)
    pub fn from_env() -> Result<Self, ConfigError> {
        let store_backend = match optional("STORE_BACKEND").as_deref() {
            None | Some("mongo") => StoreBackend::Mongo,
            Some("memory") => StoreBackend::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "STORE_BACKEND",
                    value: other.to_string(),
                });
            }
        };

        let mongodb_uri = optional("MONGODB_URI");
        if store_backend == StoreBackend::Mongo && mongodb_uri.is_none() {
            return Err(ConfigError::Missing("MONGODB_URI"));
        }

        Ok(Self {
            host_addr: optional("HOST_ADDR").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parsed("PORT", 8080)?,
            store_backend,
            mongodb_uri,
            database_name: optional("DATABASE_NAME").unwrap_or_else(|| "portfolio".to_string()),
            jwt_secret: optional("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?,
            ip_lookup_url: optional("IP_LOOKUP_URL")
                .unwrap_or_else(|| DEFAULT_IP_LOOKUP_URL.to_string()),
            reverse_geocode_url: optional("REVERSE_GEOCODE_URL")
                .unwrap_or_else(|| DEFAULT_REVERSE_GEOCODE_URL.to_string()),
            http_timeout: seconds("HTTP_TIMEOUT_SECS", 15)?,
            heartbeat_interval: seconds("HEARTBEAT_INTERVAL_SECS", 60)?,
            gps_timeout: seconds("GPS_TIMEOUT_SECS", 10)?,
            session_max_age: seconds("SESSION_MAX_AGE_SECS", 4 * 60 * 60)?,
            session_idle_timeout: seconds("SESSION_IDLE_SECS", 10 * 60)?,
            hash_visitor_ips: parsed("HASH_VISITOR_IPS", false)?,
            ip_hash_salt: optional("IP_HASH_SALT")
                .unwrap_or_else(|| "portfolio_pulse_salt".to_string()),
            handoff_phone: optional("HANDOFF_PHONE").unwrap_or_default(),
            owner_name: optional("OWNER_NAME").unwrap_or_else(|| "there".to_string()),
            allowed_origins: optional("ALLOWED_ORIGINS")
                .map(|origins| split_list(&origins))
                .unwrap_or_else(|| vec!["http://localhost:5173".to_string()]),
        })
    }
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn parsed<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

/// A duration in whole seconds. Zero is rejected: timers built from it panic.
fn seconds(name: &'static str, default: u64) -> Result<Duration, ConfigError> {
    non_zero_seconds(name, parsed(name, default)?)
}

fn non_zero_seconds(name: &'static str, secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::Invalid {
            name,
            value: secs.to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
impl AppConfig {
    pub fn for_tests() -> Self {
        Self {
            host_addr: "127.0.0.1".to_string(),
            port: 0,
            store_backend: StoreBackend::Memory,
            mongodb_uri: None,
            database_name: "portfolio_test".to_string(),
            jwt_secret: "test-secret".to_string(),
            ip_lookup_url: "http://127.0.0.1:9/{ip}".to_string(),
            reverse_geocode_url: "http://127.0.0.1:9/{lat}/{lng}".to_string(),
            http_timeout: Duration::from_secs(1),
            heartbeat_interval: Duration::from_secs(60),
            gps_timeout: Duration::from_secs(10),
            session_max_age: Duration::from_secs(60 * 60),
            session_idle_timeout: Duration::from_secs(10 * 60),
            hash_visitor_ips: false,
            ip_hash_salt: "salt".to_string(),
            handoff_phone: "918000000000".to_string(),
            owner_name: "Nishanth".to_string(),
            allowed_origins: vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_origin_lists() {
        assert_eq!(
            split_list(" http://a.test, ,http://b.test "),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
    }

    #[test]
    fn zero_durations_are_rejected() {
        let err = non_zero_seconds("HEARTBEAT_INTERVAL_SECS", 0).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                name: "HEARTBEAT_INTERVAL_SECS",
                ..
            }
        ));
        assert_eq!(
            err.to_string(),
            "HEARTBEAT_INTERVAL_SECS has an invalid value: 0"
        );

        assert_eq!(
            non_zero_seconds("HTTP_TIMEOUT_SECS", 15).unwrap(),
            Duration::from_secs(15)
        );
    }
}
