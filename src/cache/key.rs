//! Cache Key Module
//!
//! Builds deterministic, collision-free keys for memoized handler calls.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

/// Separator between key components.
pub const KEY_SEPARATOR: char = ':';

// == Cache Key ==
/// Structured key identifying one logical handler call.
///
/// Rendering escapes `\`, `:` and `=` inside every component, so an argument
/// value containing the separator cannot collide with a different argument
/// list. Keyword arguments are kept sorted by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    prefix: String,
    handler: String,
    args: Vec<String>,
    kwargs: BTreeMap<String, String>,
}

impl CacheKey {
    // == Constructor ==
    /// Starts a key for `handler` inside the `prefix` namespace.
    pub fn new(prefix: impl Into<String>, handler: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            handler: handler.into(),
            args: Vec::new(),
            kwargs: BTreeMap::new(),
        }
    }

    /// Appends a positional argument.
    pub fn arg(mut self, value: impl Display) -> Self {
        self.args.push(value.to_string());
        self
    }

    /// Adds a keyword argument. Insertion order does not affect the key.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Display) -> Self {
        self.kwargs.insert(name.into(), value.to_string());
        self
    }

    // == Namespace ==
    /// The rendered prefix every key of `prefix` starts with.
    ///
    /// Pass it to `TtlStore::invalidate_by_prefix` to drop a whole namespace.
    pub fn namespace(prefix: &str) -> String {
        let mut out = escape(prefix);
        out.push(KEY_SEPARATOR);
        out
    }

    /// Renders the key into its storage form.
    pub fn render(&self) -> String {
        let mut out = Self::namespace(&self.prefix);
        out.push_str(&escape(&self.handler));

        for arg in &self.args {
            out.push(KEY_SEPARATOR);
            out.push_str(&escape(arg));
        }

        for (name, value) in &self.kwargs {
            out.push(KEY_SEPARATOR);
            out.push_str(&escape(name));
            out.push('=');
            out.push_str(&escape(value));
        }

        out
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

fn escape(component: &str) -> String {
    let mut out = String::with_capacity(component.len());
    for c in component.chars() {
        if matches!(c, '\\' | KEY_SEPARATOR | '=') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_layout() {
        let key = CacheKey::new("stats", "tickets_summary")
            .arg(7)
            .kwarg("status", "open");

        assert_eq!(key.render(), "stats:tickets_summary:7:status=open");
    }

    #[test]
    fn test_kwarg_order_does_not_matter() {
        let a = CacheKey::new("stats", "by_period")
            .kwarg("from", "2024-01-01")
            .kwarg("to", "2024-02-01");
        let b = CacheKey::new("stats", "by_period")
            .kwarg("to", "2024-02-01")
            .kwarg("from", "2024-01-01");

        assert_eq!(a, b);
        assert_eq!(a.render(), b.render());
    }

    #[test]
    fn test_separator_in_argument_does_not_collide() {
        let joined = CacheKey::new("p", "h").arg("a:b");
        let split = CacheKey::new("p", "h").arg("a").arg("b");

        assert_ne!(joined.render(), split.render());
    }

    #[test]
    fn test_equals_in_argument_does_not_mimic_kwarg() {
        let positional = CacheKey::new("p", "h").arg("k=v");
        let keyword = CacheKey::new("p", "h").kwarg("k", "v");

        assert_ne!(positional.render(), keyword.render());
    }

    #[test]
    fn test_distinct_handlers_never_collide() {
        let a = CacheKey::new("stats", "agent_performance").arg(1);
        let b = CacheKey::new("stats", "user_activity").arg(1);

        assert_ne!(a.render(), b.render());
    }

    #[test]
    fn test_namespace_is_key_prefix() {
        let key = CacheKey::new("tickets", "list").arg(42);
        assert!(key.render().starts_with(&CacheKey::namespace("tickets")));
        assert!(!key.render().starts_with(&CacheKey::namespace("tickets_archive")));
    }
}
