//! Key/value property sources for variable substitution.
//!
//! The session's own substitution table sits in front of a wider,
//! externally-owned source (typically process- or context-scoped defaults).
//! Lookups during substitution consult the local tier first so that values
//! set for one interpretation run shadow longer-lived defaults without
//! mutating them.

use std::collections::HashMap;

/// Read-only access to string properties.
pub trait PropertySource {
    /// Look up a property by key.
    fn property(&self, key: &str) -> Option<String>;
}

impl PropertySource for HashMap<String, String> {
    fn property(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// A property source with no entries.
///
/// Default wider tier for sessions created without one.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyProperties;

impl PropertySource for EmptyProperties {
    fn property(&self, _key: &str) -> Option<String> {
        None
    }
}

/// Two ordered tiers: `local` consulted first, then `fallback`.
pub struct Layered<'a> {
    local: &'a HashMap<String, String>,
    fallback: &'a dyn PropertySource,
}

impl<'a> Layered<'a> {
    /// Layer a local table in front of a fallback source.
    #[must_use]
    pub fn new(local: &'a HashMap<String, String>, fallback: &'a dyn PropertySource) -> Self {
        Self { local, fallback }
    }
}

impl PropertySource for Layered<'_> {
    fn property(&self, key: &str) -> Option<String> {
        self.local
            .get(key)
            .cloned()
            .or_else(|| self.fallback.property(key))
    }
}
