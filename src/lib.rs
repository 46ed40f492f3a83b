//! Confplay - session state core for a declarative configuration interpreter.
//!
//! A tree-structured configuration document is parsed into a sequence of
//! structural events (element-open, element-close, character data) that an
//! interpretation loop dispatches to pluggable handlers. The handlers build
//! and configure a running object graph, and they share one [`Session`]:
//! a nesting stack of in-construction objects, a registry of named objects,
//! a layered substitution table for `${...}` variable expansion, and a set
//! of listeners notified as each event is played.
//!
//! This crate supplies the state and coordination primitives only. The
//! parser, the dispatch loop, the handlers and the substitution algorithm
//! are external collaborators reached through the traits in [`event`],
//! [`properties`], [`expand`] and [`listener`].
//!
//! # Example
//!
//! ```
//! use confplay::{Event, Object, Session};
//!
//! let mut session = Session::new();
//!
//! // An element-open handler pushes the object it starts building.
//! session.push(Object::new("appender under construction".to_string()));
//! session.set_property(Some("log.dir"), Some(" /var/log "));
//!
//! // Attribute values go through two-tier variable expansion.
//! assert_eq!(
//!     session.resolve(Some("${log.dir}/app.log")),
//!     Some("/var/log/app.log".to_string()),
//! );
//!
//! // The matching element-close handler pops it again.
//! let built = session.pop().unwrap();
//! assert!(built.is::<String>());
//! ```
//!
//! # Architecture
//!
//! - [`config`]: Tunable constants
//! - [`error`]: Error types and Result alias
//! - [`event`]: Structural events, source locations, the location source trait
//! - [`object`]: Heterogeneous shared object values
//! - [`properties`]: Property source trait and the two-tier layered view
//! - [`expand`]: Variable expansion trait and the default `${...}` expander
//! - [`listener`]: Playback listener trait
//! - [`session`]: The session aggregate itself

pub mod config;
pub mod error;
pub mod event;
pub mod expand;
pub mod listener;
pub mod object;
pub mod properties;
pub mod session;

// Re-export commonly used items
pub use error::{Result, SessionError};
pub use event::{Event, EventKind, Location, LocationSource};
pub use expand::{BraceExpander, VarExpander};
pub use listener::PlayListener;
pub use object::Object;
pub use properties::{EmptyProperties, Layered, PropertySource};
pub use session::Session;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
