//! Shared document handle.
//!
//! [`Document`] owns the node arena, the binding configuration, and the
//! listener bookkeeping used by listener directives. It is a cheap `Rc` handle:
//! every [`View`](crate::view::View) over the same tree holds a clone.
//!
//! Event handlers are always invoked with no outstanding borrow of the arena,
//! so a handler may push data into views re-entrantly.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::trace;

use crate::config::BindingConfig;
use crate::directive::ListenerBook;
use crate::dom::{Dom, ElementBuilder, Event, Handler, NodeId, NodeKind};
use crate::error::DomError;

struct DocumentInner {
    dom: RefCell<Dom>,
    book: RefCell<ListenerBook>,
    config: BindingConfig,
}

/// A node tree plus the binding layer's per-document state.
#[derive(Clone)]
pub struct Document {
    inner: Rc<DocumentInner>,
}

impl Document {
    /// Create a document with a `body` root and the default config.
    pub fn new() -> Self {
        Self::with_config(BindingConfig::default())
    }

    /// Create a document with a `body` root and the given config.
    pub fn with_config(config: BindingConfig) -> Self {
        let mut dom = Dom::new();
        let body = dom.create_element("body");
        dom.set_root(body);
        Self {
            inner: Rc::new(DocumentInner {
                dom: RefCell::new(dom),
                book: RefCell::new(ListenerBook::default()),
                config,
            }),
        }
    }

    /// The binding configuration.
    pub fn config(&self) -> &BindingConfig {
        &self.inner.config
    }

    /// The document root (`body`).
    pub fn body(&self) -> NodeId {
        self.with(|dom| dom.root()).unwrap_or_default()
    }

    /// Run `f` with shared access to the arena.
    ///
    /// # Panics
    ///
    /// Panics if called from inside [`with_mut`](Self::with_mut).
    pub fn with<R>(&self, f: impl FnOnce(&Dom) -> R) -> R {
        f(&self.inner.dom.borrow())
    }

    /// Run `f` with exclusive access to the arena.
    ///
    /// # Panics
    ///
    /// Panics if called while the arena is already borrowed.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut Dom) -> R) -> R {
        f(&mut self.inner.dom.borrow_mut())
    }

    /// Materialize a builder as a detached subtree.
    pub fn build(&self, builder: &ElementBuilder) -> NodeId {
        self.with_mut(|dom| dom.build(builder))
    }

    /// Whether two handles point at the same document.
    pub fn ptr_eq(&self, other: &Document) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // ── Events ───────────────────────────────────────────────────────

    /// Deliver `event` to its target and, if it bubbles, to each ancestor
    /// until a handler stops propagation. Returns the event as last seen.
    pub fn dispatch(&self, mut event: Event) -> Event {
        let path = self.with(|dom| {
            if !dom.contains(event.target) {
                return Vec::new();
            }
            let mut path = vec![event.target];
            if event.bubbles {
                path.extend(dom.ancestors(event.target));
            }
            path
        });
        for node in path {
            let handlers = self.with(|dom| dom.handlers(node, &event.name));
            event.current = node;
            for handler in handlers {
                handler.call(&mut event);
            }
            if event.is_stopped() {
                trace!(event = %event.name, ?node, "propagation stopped");
                break;
            }
        }
        event
    }

    /// Register, replace or (with `None`) remove the listener bound for
    /// `event` on `node` through a listener directive.
    pub(crate) fn rebind_listener(
        &self,
        node: NodeId,
        event: &str,
        handler: Option<Handler>,
    ) -> Result<(), DomError> {
        let mut book = self.inner.book.borrow_mut();
        self.with_mut(|dom| book.rebind(dom, node, event, handler))
    }

    // ── Structural changes with notification ─────────────────────────

    /// Detach `node` from its parent and notify the detached subtree.
    pub fn detach(&self, node: NodeId) -> Result<(), DomError> {
        self.with_mut(|dom| dom.detach(node))?;
        self.notify_removed(node);
        Ok(())
    }

    /// Detach every child of `node`, notifying each detached subtree.
    ///
    /// Returns the detached children; they stay allocated.
    pub fn clear_children(&self, node: NodeId) -> Vec<NodeId> {
        let children = self.with_mut(|dom| dom.take_children(node));
        for &child in &children {
            self.notify_removed(child);
        }
        children
    }

    /// Like [`clear_children`](Self::clear_children), but frees detached text
    /// nodes. Elements may still back a caller's view and are kept.
    pub fn discard_children(&self, node: NodeId) {
        for child in self.clear_children(node) {
            let is_text = self.with(|dom| {
                dom.get(child)
                    .is_some_and(|data| matches!(data.kind, NodeKind::Text(_)))
            });
            if is_text {
                self.release(child);
            }
        }
    }

    /// Free a subtree and forget its listener bookkeeping.
    pub fn release(&self, node: NodeId) {
        let ids = self.with(|dom| dom.walk_depth_first(node));
        {
            let mut book = self.inner.book.borrow_mut();
            for &id in &ids {
                book.forget(id);
            }
        }
        self.with_mut(|dom| dom.remove(node));
    }

    fn notify_removed(&self, node: NodeId) {
        let subtree = self.with(|dom| dom.walk_depth_first(node));
        for id in subtree {
            self.dispatch(Event::removed(id));
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.with(Dom::len))
            .field("config", &self.inner.config)
            .finish()
    }
}
