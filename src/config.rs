// Environment-driven configuration for the API server and the trainer client.
// Call `dotenv().ok()` before loading either.

use std::env;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_POSE_SERVICE_URL: &str = "http://127.0.0.1:5001";
const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:3000";
const DEFAULT_CAPTURE_INTERVAL_MS: u64 = 1000;
const MIN_CAPTURE_INTERVAL_MS: u64 = 100;
const DEFAULT_HOLD_TICK_MS: u64 = 100;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| "DATABASE_URL must be set".to_string())?;

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            port: parse_or("PORT", env::var("PORT").ok(), DEFAULT_PORT),
            database_url,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone)]
pub struct TrainerConfig {
    pub pose_service_url: String,
    pub api_base_url: String,
    pub capture_interval: Duration,
    pub hold_tick: Duration,
    pub request_timeout: Duration,
    /// External TTS program; `None` narrates to the log.
    pub tts_command: Option<String>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            pose_service_url: DEFAULT_POSE_SERVICE_URL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            capture_interval: Duration::from_millis(DEFAULT_CAPTURE_INTERVAL_MS),
            hold_tick: Duration::from_millis(DEFAULT_HOLD_TICK_MS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            tts_command: None,
        }
    }
}

impl TrainerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup (the environment in
    /// production, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let capture_ms = parse_or(
            "CAPTURE_INTERVAL_MS",
            lookup("CAPTURE_INTERVAL_MS"),
            DEFAULT_CAPTURE_INTERVAL_MS,
        )
        .max(MIN_CAPTURE_INTERVAL_MS);
        let hold_ms = parse_or("HOLD_TICK_MS", lookup("HOLD_TICK_MS"), DEFAULT_HOLD_TICK_MS).max(1);
        let timeout_secs = parse_or(
            "REQUEST_TIMEOUT_SECS",
            lookup("REQUEST_TIMEOUT_SECS"),
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )
        .max(1);

        Self {
            pose_service_url: lookup("POSE_SERVICE_URL").unwrap_or(defaults.pose_service_url),
            api_base_url: lookup("API_BASE_URL").unwrap_or(defaults.api_base_url),
            capture_interval: Duration::from_millis(capture_ms),
            hold_tick: Duration::from_millis(hold_ms),
            request_timeout: Duration::from_secs(timeout_secs),
            tts_command: lookup("TTS_COMMAND").filter(|c| !c.trim().is_empty()),
        }
    }
}

fn parse_or<T: FromStr + Copy + std::fmt::Display>(key: &str, raw: Option<String>, default: T) -> T {
    match raw {
        None => default,
        Some(value) => match value.trim().parse::<T>() {
            Ok(parsed) => parsed,
            Err(_) => {
                log::warn!("⚠️  Invalid {}={:?}, using default {}", key, value, default);
                default
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_trainer_defaults() {
        let config = TrainerConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config.pose_service_url, "http://127.0.0.1:5001");
        assert_eq!(config.capture_interval, Duration::from_millis(1000));
        assert_eq!(config.hold_tick, Duration::from_millis(100));
        assert!(config.tts_command.is_none());
    }

    #[test]
    fn test_trainer_overrides_and_bounds() {
        let config = TrainerConfig::from_lookup(lookup_from(&[
            ("POSE_SERVICE_URL", "http://10.0.0.2:5001"),
            ("CAPTURE_INTERVAL_MS", "20"),
            ("HOLD_TICK_MS", "not-a-number"),
            ("TTS_COMMAND", "  "),
        ]));
        assert_eq!(config.pose_service_url, "http://10.0.0.2:5001");
        assert_eq!(config.capture_interval, Duration::from_millis(100));
        assert_eq!(config.hold_tick, Duration::from_millis(100));
        assert!(config.tts_command.is_none());
    }

    #[test]
    fn test_bind_addr() {
        let config = ServerConfig {
            host: "127.0.0.1".into(),
            port: 8080,
            database_url: "mongodb://localhost/exercia".into(),
        };
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
    }
}
