//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::time::Duration;

use tracing::warn;

use crate::policy::{default_excluded_paths, default_rule_groups, RuleGroup, DEFAULT_MAX_AGE};

/// Paths the throttle gate ignores unless `RATE_LIMIT_EXCLUDED_PATHS` is set.
const DEFAULT_RATE_LIMIT_EXCLUDED: &[&str] = &["/docs", "/openapi.json", "/redoc", "/favicon.ico"];

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Default TTL in seconds for memoized results
    pub default_ttl: u64,
    /// Background sweep interval in seconds
    pub cleanup_interval: u64,
    /// Requests admitted per client per window by the throttle gate
    pub rate_limit: u32,
    /// Rate window length in seconds
    pub rate_window_seconds: u64,
    /// Per-window budget for administrative endpoints
    pub strict_rate_limit: u32,
    /// Path prefixes the throttle gate ignores
    pub rate_limit_excluded_paths: Vec<String>,
    /// Path prefixes whose responses are never cacheable
    pub cache_excluded_paths: Vec<String>,
    /// `max-age` for paths no rule group claims
    pub cache_default_max_age: u64,
    /// Ordered rule groups for the cache policy selector
    pub path_rule_groups: Vec<RuleGroup>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 8000)
    /// - `DEFAULT_TTL` - Memoization TTL in seconds (default: 300)
    /// - `CLEANUP_INTERVAL` - Sweep frequency in seconds (default: 60)
    /// - `RATE_LIMIT` - Requests per window (default: 100)
    /// - `RATE_WINDOW_SECONDS` - Window length (default: 60)
    /// - `STRICT_RATE_LIMIT` - Requests per window on admin endpoints (default: 10)
    /// - `RATE_LIMIT_EXCLUDED_PATHS` - Comma-separated prefixes
    /// - `CACHE_EXCLUDED_PATHS` - Comma-separated prefixes
    /// - `CACHE_DEFAULT_MAX_AGE` - Fallback max-age in seconds (default: 60)
    /// - `CACHE_PATH_RULES` - JSON array of rule groups
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            default_ttl: parse_var("DEFAULT_TTL").unwrap_or(defaults.default_ttl),
            cleanup_interval: parse_var("CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
            rate_limit: parse_var("RATE_LIMIT").unwrap_or(defaults.rate_limit),
            rate_window_seconds: parse_var("RATE_WINDOW_SECONDS")
                .unwrap_or(defaults.rate_window_seconds),
            strict_rate_limit: parse_var("STRICT_RATE_LIMIT").unwrap_or(defaults.strict_rate_limit),
            rate_limit_excluded_paths: list_var("RATE_LIMIT_EXCLUDED_PATHS")
                .unwrap_or(defaults.rate_limit_excluded_paths),
            cache_excluded_paths: list_var("CACHE_EXCLUDED_PATHS")
                .unwrap_or(defaults.cache_excluded_paths),
            cache_default_max_age: parse_var("CACHE_DEFAULT_MAX_AGE")
                .unwrap_or(defaults.cache_default_max_age),
            path_rule_groups: rules_var("CACHE_PATH_RULES").unwrap_or(defaults.path_rule_groups),
        }
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl)
    }

    pub fn rate_window(&self) -> Duration {
        Duration::from_secs(self.rate_window_seconds)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 8000,
            default_ttl: 300,
            cleanup_interval: 60,
            rate_limit: 100,
            rate_window_seconds: 60,
            strict_rate_limit: 10,
            rate_limit_excluded_paths: DEFAULT_RATE_LIMIT_EXCLUDED
                .iter()
                .map(|p| p.to_string())
                .collect(),
            cache_excluded_paths: default_excluded_paths(),
            cache_default_max_age: DEFAULT_MAX_AGE,
            path_rule_groups: default_rule_groups(),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn list_var(name: &str) -> Option<Vec<String>> {
    env::var(name).ok().map(|raw| parse_list(&raw))
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

fn rules_var(name: &str) -> Option<Vec<RuleGroup>> {
    let raw = env::var(name).ok()?;
    match serde_json::from_str(&raw) {
        Ok(groups) => Some(groups),
        Err(err) => {
            warn!(var = name, error = %err, "ignoring malformed cache rules, using defaults");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 8000);
        assert_eq!(config.default_ttl, 300);
        assert_eq!(config.rate_limit, 100);
        assert_eq!(config.rate_window(), Duration::from_secs(60));
        assert_eq!(config.strict_rate_limit, 10);
        assert!(config.rate_limit_excluded_paths.contains(&"/docs".to_string()));
        assert_eq!(config.path_rule_groups.len(), 4);
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(parse_list(" /docs, /redoc ,,/static"), ["/docs", "/redoc", "/static"]);
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn test_config_from_env() {
        // Single test touches the environment to avoid races between tests
        env::remove_var("SERVER_PORT");
        env::set_var("RATE_LIMIT", "250");
        env::set_var("RATE_LIMIT_EXCLUDED_PATHS", "/health,/metrics");
        env::set_var(
            "CACHE_PATH_RULES",
            r#"[{"name":"reports","path_prefixes":["/reports"],"max_age":120,"stale_while_revalidate":5}]"#,
        );

        let config = Config::from_env();
        assert_eq!(config.server_port, 8000);
        assert_eq!(config.rate_limit, 250);
        assert_eq!(config.rate_limit_excluded_paths, ["/health", "/metrics"]);
        assert_eq!(config.path_rule_groups.len(), 1);
        assert_eq!(config.path_rule_groups[0].max_age, 120);

        env::set_var("CACHE_PATH_RULES", "not json");
        let config = Config::from_env();
        assert_eq!(config.path_rule_groups, default_rule_groups());

        env::remove_var("RATE_LIMIT");
        env::remove_var("RATE_LIMIT_EXCLUDED_PATHS");
        env::remove_var("CACHE_PATH_RULES");
    }
}
