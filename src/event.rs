//! Structural events and source positions.
//!
//! The interpreter consumes a flat sequence of structural events produced by
//! parsing a configuration document: element-open, element-close, character
//! data. The session never inspects events itself; it forwards them opaquely
//! to registered listeners after the handlers have acted on them. Events are
//! plain serializable data so the surrounding machinery can record a parse
//! and replay it later.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A position in the source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Line number, 1-based.
    pub line: u64,
    /// Column number, 1-based.
    pub column: u64,
}

impl Location {
    /// Create a new location.
    #[must_use]
    pub fn new(line: u64, column: u64) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The structural content of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// An element was opened, with its attributes.
    ElementOpen {
        name: String,
        attributes: HashMap<String, String>,
    },
    /// An element was closed.
    ElementClose { name: String },
    /// Character data between elements.
    Characters { text: String },
}

/// One unit of document structure fed to the interpreter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// What happened.
    pub kind: EventKind,
    /// Where in the document it happened, if the parser tracks positions.
    pub location: Option<Location>,
}

impl Event {
    /// Create an element-open event without attributes.
    #[must_use]
    pub fn open(name: impl Into<String>) -> Self {
        Self {
            kind: EventKind::ElementOpen {
                name: name.into(),
                attributes: HashMap::new(),
            },
            location: None,
        }
    }

    /// Create an element-open event with attributes.
    #[must_use]
    pub fn open_with_attributes(
        name: impl Into<String>,
        attributes: HashMap<String, String>,
    ) -> Self {
        Self {
            kind: EventKind::ElementOpen {
                name: name.into(),
                attributes,
            },
            location: None,
        }
    }

    /// Create an element-close event.
    #[must_use]
    pub fn close(name: impl Into<String>) -> Self {
        Self {
            kind: EventKind::ElementClose { name: name.into() },
            location: None,
        }
    }

    /// Create a character-data event.
    #[must_use]
    pub fn characters(text: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Characters { text: text.into() },
            location: None,
        }
    }

    /// Attach a source position.
    #[must_use]
    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// The element name, for open and close events.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            EventKind::ElementOpen { name, .. } | EventKind::ElementClose { name } => Some(name),
            EventKind::Characters { .. } => None,
        }
    }
}

/// Pull-based access to the current parse position.
///
/// Implemented by the event source driving the interpretation loop. The
/// session queries it on demand to decorate diagnostics and never caches
/// the answer; `None` means position tracking is unavailable or the parse
/// has not started.
pub trait LocationSource {
    /// The current position, if one is obtainable.
    fn location(&self) -> Option<Location>;
}
