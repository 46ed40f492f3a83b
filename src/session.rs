//! The interpretation session: shared state threaded through every handler.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::error::{Result, SessionError};
use crate::event::{Event, LocationSource};
use crate::expand::{BraceExpander, VarExpander};
use crate::listener::PlayListener;
use crate::object::Object;
use crate::properties::{EmptyProperties, Layered, PropertySource};

/// Contextual state of one interpretation run.
///
/// Handlers depend on the session to exchange and store information: the
/// nesting stack mirrors the open-element nesting of the document, the
/// object map publishes objects by name across the session, and the
/// substitution table shadows a wider property source during variable
/// expansion. One session per document; handlers receive it explicitly on
/// every call.
///
/// The session is single-threaded by design (it holds `Rc` handles and has
/// no internal synchronization); the intended caller is one sequential
/// event-driven loop.
pub struct Session {
    object_stack: Vec<Object>,
    object_map: HashMap<String, Object>,
    properties: HashMap<String, String>,
    listeners: Vec<Rc<dyn PlayListener>>,
    wider: Rc<dyn PropertySource>,
    expander: Box<dyn VarExpander>,
    location_source: Option<Rc<dyn LocationSource>>,
}

impl Session {
    /// Create a session with an empty wider tier, the default `${...}`
    /// expander and no location source.
    #[must_use]
    pub fn new() -> Self {
        Self {
            object_stack: Vec::new(),
            object_map: HashMap::new(),
            properties: HashMap::new(),
            listeners: Vec::new(),
            wider: Rc::new(EmptyProperties),
            expander: Box::new(BraceExpander),
            location_source: None,
        }
    }

    /// Set the wider, externally-owned property source consulted when a
    /// variable is not found in the session-local table.
    #[must_use]
    pub fn with_property_source(mut self, source: Rc<dyn PropertySource>) -> Self {
        self.wider = source;
        self
    }

    /// Replace the variable expansion algorithm.
    #[must_use]
    pub fn with_expander(mut self, expander: Box<dyn VarExpander>) -> Self {
        self.expander = expander;
        self
    }

    /// Set the event source queried for the current parse position.
    #[must_use]
    pub fn with_location_source(mut self, source: Rc<dyn LocationSource>) -> Self {
        self.location_source = Some(source);
        self
    }

    // -------------------------------------------------------------------
    // Nesting stack
    // -------------------------------------------------------------------

    /// Push an in-construction object.
    ///
    /// Called by a handler on element-open; the matching element-close
    /// handler pops. The session never pushes autonomously.
    pub fn push(&mut self, object: Object) {
        self.object_stack.push(object);
    }

    /// Remove and return the top of the stack.
    ///
    /// # Errors
    /// `SessionError::EmptyStack` when the stack is empty: a mismatched
    /// open/close pair in the handlers, fatal to the run.
    pub fn pop(&mut self) -> Result<Object> {
        self.object_stack
            .pop()
            .ok_or(SessionError::EmptyStack { operation: "pop" })
    }

    /// Borrow the top of the stack without removing it.
    ///
    /// # Errors
    /// `SessionError::EmptyStack` when the stack is empty.
    pub fn peek(&self) -> Result<&Object> {
        self.object_stack
            .last()
            .ok_or(SessionError::EmptyStack { operation: "peek" })
    }

    /// Whether the stack has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.object_stack.is_empty()
    }

    /// Number of objects currently on the stack.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.object_stack.len()
    }

    /// Borrow the object at a stack position, 0 being the bottom.
    ///
    /// Lets a handler inspect an ancestor rather than only the immediate
    /// parent.
    ///
    /// # Errors
    /// `SessionError::StackIndex` when `index` is outside `[0, depth)`.
    pub fn object_at(&self, index: usize) -> Result<&Object> {
        let depth = self.object_stack.len();
        self.object_stack
            .get(index)
            .ok_or(SessionError::StackIndex { index, depth })
    }

    // -------------------------------------------------------------------
    // Named object registry
    // -------------------------------------------------------------------

    /// Publish an object under a name, overwriting any previous holder.
    ///
    /// Entries persist for the lifetime of the session.
    pub fn put_object(&mut self, key: impl Into<String>, object: Object) {
        self.object_map.insert(key.into(), object);
    }

    /// Retrieve a named object.
    ///
    /// `None` is the normal outcome for an object not yet registered
    /// during multi-pass configuration, not a fault.
    #[must_use]
    pub fn get_object(&self, key: &str) -> Option<&Object> {
        self.object_map.get(key)
    }

    // -------------------------------------------------------------------
    // Substitution table
    // -------------------------------------------------------------------

    /// Add a property to the session-local substitution table, overwriting
    /// any prior value.
    ///
    /// No-op when either argument is absent. Values are trimmed on insert;
    /// leading or trailing whitespace in configuration values is noise.
    pub fn set_property(&mut self, key: Option<&str>, value: Option<&str>) {
        let (Some(key), Some(value)) = (key, value) else {
            return;
        };
        self.properties
            .insert(key.to_string(), value.trim().to_string());
    }

    /// Apply [`Session::set_property`] for every entry of a bag.
    ///
    /// No-op when the bag is absent. Entries are independent; application
    /// order is unspecified.
    pub fn set_properties(&mut self, bag: Option<&HashMap<String, String>>) {
        let Some(bag) = bag else {
            return;
        };
        for (key, value) in bag {
            self.set_property(Some(key), Some(value));
        }
    }

    /// Look a property up in the session-local table only.
    ///
    /// The wider source is deliberately not consulted here; it takes part
    /// in [`Session::resolve`] only.
    #[must_use]
    pub fn get_property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Expand every variable reference in `text`.
    ///
    /// Absent text passes through unchanged. Names are looked up in the
    /// session-local table first, then the wider source. What happens to an
    /// unresolved reference is the injected expander's contract.
    #[must_use]
    pub fn resolve(&self, text: Option<&str>) -> Option<String> {
        let text = text?;
        let layered = Layered::new(&self.properties, self.wider.as_ref());
        Some(self.expander.expand(text, &layered))
    }

    // -------------------------------------------------------------------
    // Playback listeners
    // -------------------------------------------------------------------

    /// Register a listener for played events.
    ///
    /// A listener already registered (same allocation, not merely equal
    /// state) is not added again; the duplicate registration is reported as
    /// a warning and ignored.
    pub fn add_listener(&mut self, listener: Rc<dyn PlayListener>) {
        if self.listeners.iter().any(|l| Rc::ptr_eq(l, &listener)) {
            tracing::warn!(
                listener = ?listener,
                "Listener has already been registered, ignoring"
            );
            return;
        }
        self.listeners.push(listener);
    }

    /// Remove a listener, by identity.
    ///
    /// Returns whether the listener was present. A removed listener
    /// receives no further notifications.
    pub fn remove_listener(&mut self, listener: &Rc<dyn PlayListener>) -> bool {
        match self.listeners.iter().position(|l| Rc::ptr_eq(l, listener)) {
            Some(index) => {
                self.listeners.remove(index);
                true
            }
            None => false,
        }
    }

    /// Deliver a played event to every listener, in registration order.
    ///
    /// The interpretation loop calls this exactly once per structural
    /// event, after the handlers for that event have run. Notification is
    /// synchronous; listeners cannot re-register or remove themselves here
    /// since that would need a second borrow of the session.
    pub fn notify_played(&self, event: &Event) {
        for listener in &self.listeners {
            listener.played(event);
        }
    }

    // -------------------------------------------------------------------
    // Diagnostics
    // -------------------------------------------------------------------

    /// Append the current parse position to a message, when one is
    /// obtainable from the event source.
    ///
    /// Returns the message unchanged when no location source is configured
    /// or the source has no position (interpretation not started, or the
    /// parser does not track positions). The caller supplies any separator
    /// it wants at the end of `message`.
    #[must_use]
    pub fn decorate_with_location(&self, message: &str) -> String {
        match self.location_source.as_ref().and_then(|s| s.location()) {
            Some(location) => format!("{message}{location}"),
            None => message.to_string(),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("depth", &self.object_stack.len())
            .field("named_objects", &self.object_map.len())
            .field("properties", &self.properties.len())
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Location;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    // ---------------------------------------------------------------
    // Nesting stack
    // ---------------------------------------------------------------

    #[test]
    fn test_stack_lifo_order() {
        let mut session = Session::new();
        session.push(Object::new("first".to_string()));
        session.push(Object::new("second".to_string()));
        session.push(Object::new("third".to_string()));
        assert_eq!(session.depth(), 3);

        let a = session.pop().unwrap();
        let b = session.pop().unwrap();
        let c = session.pop().unwrap();
        assert_eq!(a.downcast_ref::<String>().unwrap(), "third");
        assert_eq!(b.downcast_ref::<String>().unwrap(), "second");
        assert_eq!(c.downcast_ref::<String>().unwrap(), "first");
        assert!(session.is_empty());
    }

    #[test]
    fn test_pop_empty_fails_and_leaves_stack_usable() {
        let mut session = Session::new();
        assert!(matches!(
            session.pop(),
            Err(SessionError::EmptyStack { operation: "pop" })
        ));

        // A failed pop must not corrupt the stack.
        session.push(Object::new(1_i64));
        assert_eq!(session.depth(), 1);
        assert_eq!(session.pop().unwrap().downcast_ref::<i64>().unwrap(), &1);
    }

    #[test]
    fn test_peek_does_not_remove() {
        let mut session = Session::new();
        session.push(Object::new(10_i64));

        assert_eq!(session.peek().unwrap().downcast_ref::<i64>().unwrap(), &10);
        assert_eq!(session.depth(), 1);
    }

    #[test]
    fn test_peek_empty_fails() {
        let session = Session::new();
        assert!(matches!(
            session.peek(),
            Err(SessionError::EmptyStack { operation: "peek" })
        ));
    }

    #[test]
    fn test_object_at_bottom_survives_traffic_above() {
        let mut session = Session::new();
        session.push(Object::new("bottom".to_string()));
        session.push(Object::new("mid".to_string()));
        session.pop().unwrap();
        session.push(Object::new("top".to_string()));

        let bottom = session.object_at(0).unwrap();
        assert_eq!(bottom.downcast_ref::<String>().unwrap(), "bottom");
    }

    #[test]
    fn test_object_at_out_of_range() {
        let mut session = Session::new();
        session.push(Object::new(1_i64));

        assert!(session.object_at(0).is_ok());
        assert!(matches!(
            session.object_at(1),
            Err(SessionError::StackIndex { index: 1, depth: 1 })
        ));
    }

    // ---------------------------------------------------------------
    // Named object registry
    // ---------------------------------------------------------------

    #[test]
    fn test_object_map_put_get() {
        let mut session = Session::new();
        session.put_object("appender", Object::new("console".to_string()));

        let found = session.get_object("appender").unwrap();
        assert_eq!(found.downcast_ref::<String>().unwrap(), "console");
        assert!(session.get_object("missing").is_none());
    }

    #[test]
    fn test_object_map_last_write_wins() {
        let mut session = Session::new();
        session.put_object("a", Object::new(1_i64));
        session.put_object("a", Object::new(2_i64));

        let found = session.get_object("a").unwrap();
        assert_eq!(found.downcast_ref::<i64>().unwrap(), &2);
    }

    // ---------------------------------------------------------------
    // Substitution table
    // ---------------------------------------------------------------

    #[test]
    fn test_set_property_trims_at_write() {
        let mut session = Session::new();
        session.set_property(Some("k"), Some(" v "));
        assert_eq!(session.get_property("k"), Some("v"));
    }

    #[test]
    fn test_set_property_absent_is_noop() {
        let mut session = Session::new();
        session.set_property(None, Some("v"));
        session.set_property(Some("k"), None);
        assert_eq!(session.get_property("k"), None);
    }

    #[test]
    fn test_set_property_overwrites() {
        let mut session = Session::new();
        session.set_property(Some("k"), Some("old"));
        session.set_property(Some("k"), Some("new"));
        assert_eq!(session.get_property("k"), Some("new"));
    }

    #[test]
    fn test_set_properties_bag() {
        let mut session = Session::new();
        let bag: HashMap<String, String> = [("a", " 1 "), ("b", "2")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        session.set_properties(Some(&bag));
        assert_eq!(session.get_property("a"), Some("1"));
        assert_eq!(session.get_property("b"), Some("2"));

        session.set_properties(None);
        assert_eq!(session.get_property("a"), Some("1"));
    }

    #[test]
    fn test_get_property_ignores_wider_source() {
        let wider: HashMap<String, String> =
            [("w".to_string(), "1".to_string())].into_iter().collect();
        let session = Session::new().with_property_source(Rc::new(wider));

        // Direct lookup is local-tier only; substitution is not.
        assert_eq!(session.get_property("w"), None);
        assert_eq!(session.resolve(Some("${w}")), Some("1".to_string()));
    }

    #[test]
    fn test_resolve_local_shadows_wider() {
        let wider: HashMap<String, String> = [("x", "2"), ("y", "3")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let mut session = Session::new().with_property_source(Rc::new(wider));
        session.set_property(Some("x"), Some("1"));

        assert_eq!(session.resolve(Some("${x}")), Some("1".to_string()));
        assert_eq!(session.resolve(Some("${y}")), Some("3".to_string()));
    }

    #[test]
    fn test_resolve_absent_passes_through() {
        let session = Session::new();
        assert_eq!(session.resolve(None), None);
    }

    // ---------------------------------------------------------------
    // Listeners
    // ---------------------------------------------------------------

    #[derive(Debug, Default)]
    struct Recorder {
        label: &'static str,
        seen: RefCell<Vec<Option<String>>>,
    }

    impl Recorder {
        fn named(label: &'static str) -> Self {
            Self {
                label,
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl PlayListener for Recorder {
        fn played(&self, event: &Event) {
            self.seen
                .borrow_mut()
                .push(event.name().map(|n| format!("{}:{n}", self.label)));
        }
    }

    #[test]
    fn test_duplicate_listener_registered_once() {
        let mut session = Session::new();
        let recorder = Rc::new(Recorder::named("a"));
        let handle: Rc<dyn PlayListener> = recorder.clone();

        session.add_listener(handle.clone());
        session.add_listener(handle);
        session.notify_played(&Event::open("root"));

        assert_eq!(recorder.seen.borrow().len(), 1);
    }

    #[test]
    fn test_notification_order_is_registration_order() {
        let order = Rc::new(RefCell::new(Vec::new()));

        #[derive(Debug)]
        struct Tagger {
            tag: &'static str,
            order: Rc<RefCell<Vec<&'static str>>>,
        }

        impl PlayListener for Tagger {
            fn played(&self, _event: &Event) {
                self.order.borrow_mut().push(self.tag);
            }
        }

        let mut session = Session::new();
        session.add_listener(Rc::new(Tagger {
            tag: "a",
            order: order.clone(),
        }));
        session.add_listener(Rc::new(Tagger {
            tag: "b",
            order: order.clone(),
        }));

        session.notify_played(&Event::characters("x"));
        assert_eq!(*order.borrow(), vec!["a", "b"]);
    }

    #[test]
    fn test_remove_listener_reports_presence() {
        let mut session = Session::new();
        let recorder = Rc::new(Recorder::named("a"));
        let handle: Rc<dyn PlayListener> = recorder.clone();

        assert!(!session.remove_listener(&handle));
        session.add_listener(handle.clone());
        assert!(session.remove_listener(&handle));

        session.notify_played(&Event::open("root"));
        assert!(recorder.seen.borrow().is_empty());
    }

    #[test]
    fn test_listener_identity_not_structure() {
        let mut session = Session::new();
        // Two structurally identical recorders are distinct registrations.
        session.add_listener(Rc::new(Recorder::named("same")));
        session.add_listener(Rc::new(Recorder::named("same")));

        let counter = Rc::new(RefCell::new(0_usize));

        #[derive(Debug)]
        struct Counting(Rc<RefCell<usize>>);
        impl PlayListener for Counting {
            fn played(&self, _event: &Event) {
                *self.0.borrow_mut() += 1;
            }
        }

        session.add_listener(Rc::new(Counting(counter.clone())));
        session.notify_played(&Event::close("root"));
        assert_eq!(*counter.borrow(), 1);
    }

    // ---------------------------------------------------------------
    // Diagnostics
    // ---------------------------------------------------------------

    #[derive(Debug)]
    struct FixedLocation(Option<Location>);

    impl LocationSource for FixedLocation {
        fn location(&self) -> Option<Location> {
            self.0
        }
    }

    #[test]
    fn test_decorate_with_location() {
        let session =
            Session::new().with_location_source(Rc::new(FixedLocation(Some(Location::new(4, 9)))));
        assert_eq!(
            session.decorate_with_location("bad value at line "),
            "bad value at line 4:9"
        );
    }

    #[test]
    fn test_decorate_without_location() {
        let no_source = Session::new();
        assert_eq!(no_source.decorate_with_location("msg"), "msg");

        let untracked = Session::new().with_location_source(Rc::new(FixedLocation(None)));
        assert_eq!(untracked.decorate_with_location("msg"), "msg");
    }
}
