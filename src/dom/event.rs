//! Events and listeners.
//!
//! [`Event`] is the payload handed to listeners. [`Handler`] is a cheaply
//! clonable, identity-comparable callback. Listener registrations are keyed by
//! [`ListenerId`] in the [`Dom`](super::tree::Dom) arena.

use std::fmt;
use std::rc::Rc;

use slotmap::new_key_type;

use super::node::NodeId;

new_key_type! {
    /// Identifies one listener registration.
    pub struct ListenerId;
}

/// Name of the notification delivered to every node of a detached subtree.
pub const REMOVE_EVENT: &str = "remove";

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// An event travelling through the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Event name (`click`, `keydown`, `remove`, ...).
    pub name: String,
    /// The node the event was dispatched at.
    pub target: NodeId,
    /// The node whose listener is currently running.
    pub current: NodeId,
    /// Key name for keyboard events (`Enter`, `Escape`, ...).
    pub key: Option<String>,
    /// Whether the event bubbles to ancestors.
    pub bubbles: bool,
    stopped: bool,
}

impl Event {
    /// A bubbling event with no key.
    pub fn new(name: impl Into<String>, target: NodeId) -> Self {
        Self {
            name: name.into(),
            target,
            current: target,
            key: None,
            bubbles: true,
            stopped: false,
        }
    }

    /// A bubbling `keydown` event carrying `key`.
    pub fn key_down(target: NodeId, key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            ..Self::new("keydown", target)
        }
    }

    /// The non-bubbling detach notification for `target`.
    pub fn removed(target: NodeId) -> Self {
        Self {
            bubbles: false,
            ..Self::new(REMOVE_EVENT, target)
        }
    }

    /// Stop delivery to further ancestors.
    pub fn stop_propagation(&mut self) {
        self.stopped = true;
    }

    /// Whether a listener stopped propagation.
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

// ---------------------------------------------------------------------------
// Handler
// ---------------------------------------------------------------------------

/// A shared event callback.
///
/// Two handlers are equal when they wrap the same allocation.
#[derive(Clone)]
pub struct Handler(Rc<dyn Fn(&mut Event)>);

impl Handler {
    /// Wrap a closure.
    pub fn new(f: impl Fn(&mut Event) + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Invoke the callback.
    pub fn call(&self, event: &mut Event) {
        (self.0)(event)
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Handler) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler(<fn>)")
    }
}

/// A registered listener as stored in the arena.
#[derive(Debug, Clone)]
pub(crate) struct Listener {
    pub node: NodeId,
    pub event: String,
    pub handler: Handler,
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;
    use std::cell::Cell;

    fn node() -> NodeId {
        let mut sm: SlotMap<NodeId, ()> = SlotMap::with_key();
        sm.insert(())
    }

    #[test]
    fn new_event_bubbles() {
        let n = node();
        let ev = Event::new("click", n);
        assert!(ev.bubbles);
        assert_eq!(ev.target, n);
        assert_eq!(ev.current, n);
        assert!(!ev.is_stopped());
    }

    #[test]
    fn removed_event_does_not_bubble() {
        let ev = Event::removed(node());
        assert_eq!(ev.name, REMOVE_EVENT);
        assert!(!ev.bubbles);
    }

    #[test]
    fn key_down_carries_key() {
        let ev = Event::key_down(node(), "Enter");
        assert_eq!(ev.name, "keydown");
        assert_eq!(ev.key.as_deref(), Some("Enter"));
    }

    #[test]
    fn handler_call_and_identity() {
        let hits = Rc::new(Cell::new(0));
        let h = {
            let hits = hits.clone();
            Handler::new(move |ev| {
                hits.set(hits.get() + 1);
                ev.stop_propagation();
            })
        };
        let same = h.clone();
        let other = Handler::new(|_| {});
        assert_eq!(h, same);
        assert_ne!(h, other);

        let mut ev = Event::new("click", node());
        h.call(&mut ev);
        assert_eq!(hits.get(), 1);
        assert!(ev.is_stopped());
    }
}
