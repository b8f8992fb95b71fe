//! Cache Policy Module
//!
//! Selects HTTP Cache-Control headers per path class and applies them at the
//! response boundary.

mod annotator;
mod rules;
mod selector;

pub use annotator::annotate;
pub use rules::{
    default_excluded_paths, default_rule_groups, RuleGroup, DEFAULT_MAX_AGE,
    DEFAULT_STALE_WHILE_REVALIDATE,
};
pub use selector::{client_opted_out, http_date, CacheDirective, CachePolicySelector, NO_STORE};
