//! Variable expansion over a property source.
//!
//! The session delegates the actual `${...}` rewriting to an injected
//! [`VarExpander`]; it only supplies the two ordered lookup tiers. The
//! [`BraceExpander`] provided here is the default: recursive expansion where
//! references may nest (`${prefix.${which}}`) and substituted values are
//! themselves expanded, capped by [`config::MAX_EXPANSION_DEPTH`].

use crate::config;
use crate::properties::PropertySource;

/// Expands variable references embedded in configuration text.
///
/// Implementations must be total: whatever they do with an unresolvable or
/// malformed reference (leave it literal, substitute empty, or anything
/// else), they return a string rather than fail.
pub trait VarExpander {
    /// Expand every variable reference in `text`, looking names up in
    /// `properties`.
    fn expand(&self, text: &str, properties: &dyn PropertySource) -> String;
}

/// Default `${name}` expander.
///
/// - References may nest; the inner reference is expanded first to form
///   the name looked up.
/// - A substituted value is expanded again, so properties can be defined
///   in terms of other properties.
/// - An unresolved reference is left literal, as written.
/// - An unterminated `${` is left literal.
/// - Expansion deeper than [`config::MAX_EXPANSION_DEPTH`] stops, leaving
///   the remaining text literal, so a self-referential property terminates.
#[derive(Debug, Clone, Copy, Default)]
pub struct BraceExpander;

impl VarExpander for BraceExpander {
    fn expand(&self, text: &str, properties: &dyn PropertySource) -> String {
        expand_at_depth(text, properties, 0)
    }
}

fn expand_at_depth(text: &str, properties: &dyn PropertySource, depth: usize) -> String {
    if depth >= config::MAX_EXPANSION_DEPTH {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let Some(end) = find_closing_brace(after) else {
            // Unterminated reference: keep the tail as written.
            out.push_str("${");
            out.push_str(after);
            return out;
        };

        let raw_name = &after[..end];
        let name = expand_at_depth(raw_name, properties, depth + 1);
        match properties.property(&name) {
            Some(value) => out.push_str(&expand_at_depth(&value, properties, depth + 1)),
            None => {
                out.push_str("${");
                out.push_str(raw_name);
                out.push('}');
            }
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

/// Index of the `}` closing the reference that starts at the beginning of
/// `s`, skipping over nested `${...}` pairs.
fn find_closing_brace(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut nested = 0_usize;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'$' && bytes.get(i + 1) == Some(&b'{') {
            nested += 1;
            i += 2;
            continue;
        }
        if bytes[i] == b'}' {
            if nested == 0 {
                return Some(i);
            }
            nested -= 1;
        }
        i += 1;
    }
    None
}
