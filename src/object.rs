//! Heterogeneous object values for the nesting stack and registry.
//!
//! Handlers build objects of arbitrary concrete types; the session stores
//! them behind a single [`Object`] value. Cloning an `Object` clones a
//! shared handle, not the underlying value: the session references the
//! objects handlers create, it never owns their lifecycle.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::error::{Result, SessionError};

/// A shared reference to an arbitrary handler-built object.
///
/// Retrieval is by checked downcast: a handler that pairs with the wrong
/// element gets a reported [`SessionError::ObjectType`] instead of
/// undefined behavior or a panic.
#[derive(Clone)]
pub struct Object {
    inner: Rc<dyn Any>,
    type_name: &'static str,
}

impl Object {
    /// Wrap a concrete value.
    #[must_use]
    pub fn new<T: 'static>(value: T) -> Self {
        Self {
            inner: Rc::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Wrap an already-shared value without copying it.
    #[must_use]
    pub fn from_rc<T: 'static>(value: Rc<T>) -> Self {
        Self {
            inner: value,
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Check whether the wrapped value is a `T`.
    #[must_use]
    pub fn is<T: 'static>(&self) -> bool {
        self.inner.is::<T>()
    }

    /// Borrow the wrapped value as a `T`.
    ///
    /// # Errors
    /// Returns `SessionError::ObjectType` naming both types when the
    /// wrapped value is not a `T`.
    pub fn downcast_ref<T: 'static>(&self) -> Result<&T> {
        self.inner
            .downcast_ref::<T>()
            .ok_or(SessionError::ObjectType {
                expected: std::any::type_name::<T>(),
                actual: self.type_name,
            })
    }

    /// The type name of the wrapped value, for diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether two handles refer to the same underlying value.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}
