//! Cache Policy Selector
//!
//! Chooses the Cache-Control treatment for a response from its request
//! method, path and status.

use std::collections::HashMap;

use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use chrono::{DateTime, Utc};

use crate::policy::rules::{
    default_excluded_paths, default_rule_groups, RuleGroup, DEFAULT_MAX_AGE,
    DEFAULT_STALE_WHILE_REVALIDATE,
};

/// Cache-Control sent with responses that must not be stored.
pub const NO_STORE: &str = "no-store, no-cache, must-revalidate, max-age=0";

// == Cache Directive ==
/// Header treatment chosen for one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheDirective {
    /// Client opted out; response left untouched
    Bypass,
    /// Mutating, failing or excluded response
    NoStore,
    /// Exact-path override, sent verbatim
    Custom(String),
    /// Publicly cacheable for `max_age` seconds
    Public {
        group: String,
        max_age: u64,
        stale_while_revalidate: u64,
    },
}

impl CacheDirective {
    /// Writes the directive's headers, computing `Expires` from `now`.
    pub fn apply(&self, headers: &mut HeaderMap, now: DateTime<Utc>) {
        match self {
            CacheDirective::Bypass => {}
            CacheDirective::NoStore => {
                headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(NO_STORE));
                headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
            }
            CacheDirective::Custom(value) => {
                if let Ok(value) = HeaderValue::from_str(value) {
                    headers.insert(header::CACHE_CONTROL, value);
                }
            }
            CacheDirective::Public {
                max_age,
                stale_while_revalidate,
                ..
            } => {
                let control =
                    format!("public, max-age={max_age}, stale-while-revalidate={stale_while_revalidate}");
                let expires = http_date(now + chrono::Duration::seconds(*max_age as i64));

                if let Ok(value) = HeaderValue::from_str(&control) {
                    headers.insert(header::CACHE_CONTROL, value);
                }
                if let Ok(value) = HeaderValue::from_str(&expires) {
                    headers.insert(header::EXPIRES, value);
                }
            }
        }
    }
}

/// Formats `at` as an HTTP IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
pub fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Whether the request asked intermediaries not to serve it from cache.
pub fn client_opted_out(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::CACHE_CONTROL)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| value.contains("no-cache") || value.contains("no-store"))
}

// == Cache Policy Selector ==
/// Ordered path-class rules mapping responses to cache directives.
#[derive(Debug, Clone)]
pub struct CachePolicySelector {
    groups: Vec<RuleGroup>,
    default_max_age: u64,
    excluded_paths: Vec<String>,
    overrides: HashMap<String, String>,
}

impl CachePolicySelector {
    // == Constructor ==
    /// Creates a selector; `groups` are consulted in the given order.
    pub fn new(groups: Vec<RuleGroup>, excluded_paths: Vec<String>, default_max_age: u64) -> Self {
        Self {
            groups,
            default_max_age,
            excluded_paths,
            overrides: HashMap::new(),
        }
    }

    /// Sends `cache_control` verbatim for GET 2xx responses on exactly `path`.
    pub fn with_override(mut self, path: impl Into<String>, cache_control: impl Into<String>) -> Self {
        self.overrides.insert(path.into(), cache_control.into());
        self
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        self.excluded_paths
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// First group in priority order claiming `path`.
    pub fn group_for(&self, path: &str) -> Option<&RuleGroup> {
        self.groups.iter().find(|group| group.matches(path))
    }

    // == Select ==
    /// Picks the directive for a response.
    ///
    /// # Arguments
    /// * `method` - Request method
    /// * `path` - Request path
    /// * `status` - Response status
    /// * `bypass` - Request carried a no-cache/no-store directive
    pub fn select(&self, method: &Method, path: &str, status: StatusCode, bypass: bool) -> CacheDirective {
        if *method != Method::GET || !status.is_success() || self.is_excluded(path) {
            return CacheDirective::NoStore;
        }

        // A client opt-out only suppresses the public directive
        if bypass {
            return CacheDirective::Bypass;
        }

        if let Some(value) = self.overrides.get(path) {
            return CacheDirective::Custom(value.clone());
        }

        match self.group_for(path) {
            Some(group) => CacheDirective::Public {
                group: group.name.clone(),
                max_age: group.max_age,
                stale_while_revalidate: group.stale_while_revalidate,
            },
            None => CacheDirective::Public {
                group: "default".to_string(),
                max_age: self.default_max_age,
                stale_while_revalidate: DEFAULT_STALE_WHILE_REVALIDATE,
            },
        }
    }
}

impl Default for CachePolicySelector {
    fn default() -> Self {
        Self::new(default_rule_groups(), default_excluded_paths(), DEFAULT_MAX_AGE)
    }
}
