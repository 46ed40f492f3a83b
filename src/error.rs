//! Error types for the session core.
//!
//! Stack-bounds violations indicate a handler pairing bug (an element-close
//! handler popping an object its element-open counterpart never pushed) and
//! are always propagated to the interpretation loop. Lookups that find
//! nothing return `Option` instead of an error.

use thiserror::Error;

/// Main error type for session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Pop or peek attempted on an empty nesting stack.
    #[error("Object stack is empty during {operation}: unbalanced push/pop in handlers")]
    EmptyStack { operation: &'static str },

    /// Indexed stack access outside `[0, depth)`.
    #[error("Object stack index {index} out of range (depth {depth})")]
    StackIndex { index: usize, depth: usize },

    /// A handler retrieved an object of a different type than it pushed
    /// or registered.
    #[error("Expected an object of type {expected}, found {actual}")]
    ObjectType {
        expected: &'static str,
        actual: &'static str,
    },
}

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
