//! Runtime configuration from environment variables

use std::str::FromStr;
use std::time::Duration;

use inkmix_core::DEFAULT_ITERATIONS;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PORT`
    pub port: u16,
    /// `INKMIX_ITERATIONS`: descent steps when a request doesn't say
    pub iterations: usize,
    /// `INKMIX_TIMEOUT_MS`: budget for a single mix request
    pub timeout: Duration,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            port: parse_or(&lookup, "PORT", defaults.port),
            iterations: parse_or(&lookup, "INKMIX_ITERATIONS", defaults.iterations),
            timeout: Duration::from_millis(parse_or(
                &lookup,
                "INKMIX_TIMEOUT_MS",
                DEFAULT_TIMEOUT_MS,
            )),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            iterations: DEFAULT_ITERATIONS,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring unparsable {}={:?}", key, raw);
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.port, 3000);
        assert_eq!(config.iterations, 450);
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("PORT", "8080"),
            ("INKMIX_ITERATIONS", " 200 "),
            ("INKMIX_TIMEOUT_MS", "250"),
        ]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.iterations, 200);
        assert_eq!(config.timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_bad_values_fall_back() {
        let config = config_from(&[("PORT", "eighty"), ("INKMIX_ITERATIONS", "-1")]);
        assert_eq!(config.port, 3000);
        assert_eq!(config.iterations, 450);
    }
}
