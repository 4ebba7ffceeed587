//! Server configuration read from the environment at startup.

use std::path::PathBuf;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 3001;
/// Default report location, relative to the working directory.
pub const DEFAULT_REPORT_PATH: &str = "generated-website-report.txt";

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable was set to a value that could not be parsed.
    #[error("{var}: invalid value '{value}': {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Settings for the generator server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Where each generated report is written, overwriting the last one.
    pub report_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            report_path: PathBuf::from(DEFAULT_REPORT_PATH),
        }
    }
}

impl ServerConfig {
    /// Reads `JALDI_HOST`, `JALDI_PORT` and `JALDI_REPORT_PATH`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds a config from an arbitrary variable lookup. Unset or empty
    /// variables fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let mut config = ServerConfig::default();

        if let Some(host) = get("JALDI_HOST") {
            config.host = host;
        }
        if let Some(port) = get("JALDI_PORT") {
            config.port = port.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidValue {
                    var: "JALDI_PORT",
                    value: port.clone(),
                    reason: e.to_string(),
                }
            })?;
        }
        if let Some(path) = get("JALDI_REPORT_PATH") {
            config.report_path = PathBuf::from(path);
        }
        Ok(config)
    }

    /// `host:port` to bind the listener to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.bind_addr(), "0.0.0.0:3001");
    }

    #[test]
    fn reads_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("JALDI_HOST", "127.0.0.1"),
            ("JALDI_PORT", "8080"),
            ("JALDI_REPORT_PATH", "out/report.txt"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
        assert_eq!(config.report_path, PathBuf::from("out/report.txt"));
    }

    #[test]
    fn empty_values_fall_back() {
        let config = ServerConfig::from_lookup(lookup(&[("JALDI_PORT", "  ")])).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn bad_port_is_an_error() {
        let err = ServerConfig::from_lookup(lookup(&[("JALDI_PORT", "http")])).unwrap_err();
        assert!(err.to_string().contains("JALDI_PORT"));
    }
}
