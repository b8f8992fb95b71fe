//! Cache Policy Rules
//!
//! Path-class rule groups and the built-in defaults for the ticket backend.

use serde::{Deserialize, Serialize};

// == Rule Group ==
/// One class of paths sharing a client cache lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleGroup {
    /// Label used in logs
    pub name: String,
    /// Paths starting with any of these belong to the group
    pub path_prefixes: Vec<String>,
    /// `max-age` in seconds
    pub max_age: u64,
    /// `stale-while-revalidate` in seconds
    pub stale_while_revalidate: u64,
}

impl RuleGroup {
    pub fn new(
        name: impl Into<String>,
        path_prefixes: &[&str],
        max_age: u64,
        stale_while_revalidate: u64,
    ) -> Self {
        Self {
            name: name.into(),
            path_prefixes: path_prefixes.iter().map(|p| p.to_string()).collect(),
            max_age,
            stale_while_revalidate,
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        self.path_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }
}

/// Default `max-age` for paths no group claims.
pub const DEFAULT_MAX_AGE: u64 = 60;

/// `stale-while-revalidate` paired with the default group.
pub const DEFAULT_STALE_WHILE_REVALIDATE: u64 = 30;

/// Built-in groups in priority order: static, semi-static, statistics,
/// monitoring.
pub fn default_rule_groups() -> Vec<RuleGroup> {
    vec![
        RuleGroup::new(
            "static",
            &["/docs", "/redoc", "/static", "/favicon.ico", "/api/v1/categories"],
            86_400,
            60,
        ),
        RuleGroup::new(
            "semi-static",
            &["/api/v1/equipment", "/api/v1/tickets/categories"],
            3_600,
            60,
        ),
        RuleGroup::new(
            "statistics",
            &[
                "/api/v1/statistics/tickets-summary",
                "/api/v1/statistics/agent-performance",
                "/api/v1/statistics/tickets-by-period",
                "/api/v1/statistics/user-activity",
            ],
            300,
            60,
        ),
        RuleGroup::new(
            "monitoring",
            &["/api/v1/monitoring/system", "/api/v1/monitoring/database"],
            30,
            10,
        ),
    ]
}

/// Paths whose responses are never cacheable: auth, the current user and
/// every ticket mutation route.
pub fn default_excluded_paths() -> Vec<String> {
    [
        "/api/v1/auth",
        "/api/v1/users/me",
        "/api/v1/tickets/",
        "/api/v1/tickets/assign",
        "/api/v1/tickets/status",
        "/api/v1/tickets/close",
    ]
    .iter()
    .map(|p| p.to_string())
    .collect()
}
