//! Application-level configuration

use serde::{Deserialize, Serialize};

/// Output format of the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    /// Parse a format name, `None` for unknown names
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "text" => Some(LogFormat::Pretty),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application name
    pub app_name: String,
    /// Environment (development, production, ...)
    pub environment: String,
    /// Log output format
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "portfolio-agents".to_string(),
            environment: "development".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl Config {
    /// Build from `AGENT_ENV` and `AGENT_LOG_FORMAT`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(env) = lookup("AGENT_ENV").filter(|v| !v.trim().is_empty()) {
            config.environment = env.trim().to_string();
        }
        if let Some(format) = lookup("AGENT_LOG_FORMAT").and_then(|v| LogFormat::parse(&v)) {
            config.log_format = format;
        }
        config
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.app_name, "portfolio-agents");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(!config.is_production());
    }

    #[test]
    fn test_lookup_overrides() {
        let vars: HashMap<&str, &str> =
            HashMap::from([("AGENT_ENV", "production"), ("AGENT_LOG_FORMAT", "JSON")]);
        let config = Config::from_lookup(|k| vars.get(k).map(|v| (*v).to_string()));
        assert!(config.is_production());
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_unknown_log_format_ignored() {
        let config = Config::from_lookup(|k| (k == "AGENT_LOG_FORMAT").then(|| "xml".to_string()));
        assert_eq!(config.log_format, LogFormat::Pretty);
    }
}
