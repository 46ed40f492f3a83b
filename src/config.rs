//! Tunable constants for the session core.

/// Maximum recursion depth for variable expansion.
///
/// A property whose value references another property is expanded
/// recursively; a self-referential chain would otherwise loop forever.
/// Past this depth the default expander stops and leaves the remaining
/// reference literal.
pub const MAX_EXPANSION_DEPTH: usize = 32;
