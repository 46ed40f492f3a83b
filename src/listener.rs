//! Playback listeners.

use std::fmt;

use crate::event::Event;

/// Observer of structural events as they are played.
///
/// The session notifies every registered listener once per event, in
/// registration order, strictly after the handlers for that event have run
/// ("in play" means already acted upon, not merely seen). Notification is
/// synchronous on the interpretation loop: a slow listener stalls
/// interpretation. Listeners needing mutable state use interior mutability;
/// `played` takes `&self`.
///
/// The `Debug` bound is what the duplicate-registration warning uses to
/// name the listener.
pub trait PlayListener: fmt::Debug {
    /// Called once per played event.
    fn played(&self, event: &Event);
}
