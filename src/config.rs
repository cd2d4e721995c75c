use std::{env, str::FromStr, fmt::Display};

use crate::logger::{micro::*, Level};

pub const ENV_HTTP_PORT: &str = "CRABSTACK_HTTP_PORT";
pub const ENV_MAX_LINES: &str = "CRABSTACK_MAX_LINES";
pub const ENV_LOG_LEVEL: &str = "CRABSTACK_LOG_LEVEL";

const DEFAULT_HTTP_PORT: u16 = 9999;
const DEFAULT_LOG_BUFFER: usize = 64;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Upper bound on worker lines, i.e. requests handled concurrently.
    pub max_lines: usize,
    pub log_level: Level,
    pub log_buffer: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_HTTP_PORT,
            max_lines: num_cpus::get() * 2,
            log_level: Level::Info,
            log_buffer: DEFAULT_LOG_BUFFER,
        }
    }
}

impl Config {
    /// Defaults overridden by whatever the environment sets. Bad values are
    /// logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Config::default();
        if let Some(port) = parse_var(&lookup, ENV_HTTP_PORT) {
            config.port = port;
        }
        if let Some(lines) = parse_var::<usize>(&lookup, ENV_MAX_LINES) {
            if lines == 0 {
                warn!("{} must be positive. using default {}", ENV_MAX_LINES, config.max_lines);
            } else {
                config.max_lines = lines;
            }
        }
        if let Some(level) = parse_var(&lookup, ENV_LOG_LEVEL) {
            config.log_level = level;
        }
        config
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("{}={}: {}. using default", key, raw, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_env() {
        let config = config_with(&[]);
        assert_eq!(config.port, DEFAULT_HTTP_PORT);
        assert_eq!(config.max_lines, num_cpus::get() * 2);
        assert_eq!(config.log_level, Level::Info);
    }

    #[test]
    fn reads_overrides() {
        let config = config_with(&[
            (ENV_HTTP_PORT, "8080"),
            (ENV_MAX_LINES, "3"),
            (ENV_LOG_LEVEL, "trace"),
        ]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.max_lines, 3);
        assert_eq!(config.log_level, Level::Trace);
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = config_with(&[
            (ENV_HTTP_PORT, "99999"),
            (ENV_MAX_LINES, "0"),
            (ENV_LOG_LEVEL, "loud"),
        ]);
        assert_eq!(config.port, DEFAULT_HTTP_PORT);
        assert_eq!(config.max_lines, num_cpus::get() * 2);
        assert_eq!(config.log_level, Level::Info);
    }
}
