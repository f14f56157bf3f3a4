//! Keyed list bindings.
//!
//! A node whose naming attribute carries a `[]` name becomes the template of a
//! [`ListBinding`]. The template is detached and replaced by a comment anchor;
//! every pushed item becomes a clone of the template, inserted before the
//! anchor and wrapped in its own [`View`].
//!
//! Each push runs one reconciliation pass:
//!
//! 1. [`begin`](ListBinding::begin) clears the touched set.
//! 2. [`reconcile`](ListBinding::reconcile) is called once per item, in order.
//!    Existing keys reuse their sub-view (moved before the anchor), new keys
//!    clone the template.
//! 3. [`end`](ListBinding::end) destroys every sub-view not touched this pass.
//!
//! Because each touched item is re-inserted immediately before the anchor,
//! the final sibling order equals the pass order.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::mem;

use tracing::{debug, trace, warn};

use crate::document::Document;
use crate::dom::{Dom, NodeId};
use crate::error::{BindError, DomError};
use crate::pending::Pending;
use crate::value::{ItemKey, Record, Value};
use crate::view::View;

/// Text of the comment node standing in for a list template.
pub const ANCHOR_TEXT: &str = "><";

/// Counts from the most recent reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassStats {
    pub created: usize,
    pub reused: usize,
    pub destroyed: usize,
}

#[derive(Debug, Default)]
struct ListState {
    items: HashMap<ItemKey, View>,
    order: Vec<ItemKey>,
    touched: Vec<ItemKey>,
    touched_set: HashSet<ItemKey>,
    pending: Vec<Pending>,
    created: usize,
    reused: usize,
    last: PassStats,
}

/// A list placeholder: template, anchor and keyed sub-views.
#[derive(Debug)]
pub struct ListBinding {
    names: Vec<String>,
    template: NodeId,
    anchor: NodeId,
    key_field: String,
    readonly_attribute: String,
    in_pass: Cell<bool>,
    state: RefCell<ListState>,
}

impl ListBinding {
    /// Turn `template` into a list binding: insert the anchor before it,
    /// detach it, and strip its naming attributes.
    pub(crate) fn attach(
        dom: &mut Dom,
        template: NodeId,
        names: Vec<String>,
        name_attributes: &[&str],
        key_field: &str,
        readonly_attribute: &str,
    ) -> Result<Self, DomError> {
        let parent = dom.parent(template).ok_or(DomError::NotAttached(template))?;
        let anchor = dom.create_comment(ANCHOR_TEXT);
        dom.insert_before(parent, anchor, template)?;
        dom.detach(template)?;
        if let Some(data) = dom.get_mut(template) {
            for attr in name_attributes {
                data.remove_attribute(attr);
            }
        }
        debug!(list = %names.join(","), ?anchor, "list binding created");
        Ok(Self {
            names,
            template,
            anchor,
            key_field: key_field.to_owned(),
            readonly_attribute: readonly_attribute.to_owned(),
            in_pass: Cell::new(false),
            state: RefCell::new(ListState::default()),
        })
    }

    /// Every name this binding is registered under.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The detached template node.
    pub fn template(&self) -> NodeId {
        self.template
    }

    /// The comment node marking the insertion point.
    pub fn anchor(&self) -> NodeId {
        self.anchor
    }

    /// Number of live items.
    pub fn len(&self) -> usize {
        self.state.borrow().items.len()
    }

    /// Whether there are no live items.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys of the live items, in the order of the last pass.
    pub fn keys(&self) -> Vec<ItemKey> {
        self.state.borrow().order.clone()
    }

    /// The sub-view for `key`, if live.
    pub fn view(&self, key: &ItemKey) -> Option<View> {
        self.state.borrow().items.get(key).cloned()
    }

    /// Counts from the most recent pass.
    pub fn last_pass(&self) -> PassStats {
        self.state.borrow().last
    }

    /// Root nodes of the live items. Empty while a pass holds the state.
    pub(crate) fn item_roots(&self) -> Vec<NodeId> {
        match self.state.try_borrow() {
            Ok(state) => state.items.values().map(View::root).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Whether the template carries a non-empty readonly marker.
    pub fn is_readonly(&self, doc: &Document) -> bool {
        doc.with(|dom| {
            dom.get(self.template)
                .and_then(|data| data.attribute(&self.readonly_attribute))
                .is_some_and(|marker| !marker.is_empty())
        })
    }

    // ── Reconciliation ───────────────────────────────────────────────

    /// Start a pass.
    pub fn begin(&self) {
        let mut state = self.state.borrow_mut();
        state.touched.clear();
        state.touched_set.clear();
        state.pending.clear();
        state.created = 0;
        state.reused = 0;
    }

    /// Reuse or create the item for `key`, move it before the anchor and push
    /// `data` into it.
    pub fn reconcile(&self, doc: &Document, key: ItemKey, data: &Record) -> Result<(), BindError> {
        let parent = doc
            .with(|dom| dom.parent(self.anchor))
            .ok_or(DomError::NotAttached(self.anchor))?;
        let existing = self.state.borrow().items.get(&key).cloned();
        let view = match existing {
            Some(view) => {
                doc.with_mut(|dom| dom.insert_before(parent, view.root(), self.anchor))?;
                trace!(%key, "reusing list item");
                self.state.borrow_mut().reused += 1;
                view
            }
            None => {
                let root = doc.with_mut(|dom| {
                    let root = dom.clone_subtree(self.template)?;
                    dom.insert_before(parent, root, self.anchor)?;
                    Ok::<_, DomError>(root)
                })?;
                trace!(%key, "creating list item");
                let view = View::from_root(doc, root);
                let mut state = self.state.borrow_mut();
                state.items.insert(key.clone(), view.clone());
                state.created += 1;
                view
            }
        };

        let pending = view.set_data(data);

        let mut state = self.state.borrow_mut();
        if !state.touched_set.insert(key.clone()) {
            state.touched.retain(|touched| touched != &key);
        }
        state.touched.push(key);
        state.pending.extend(pending);
        Ok(())
    }

    /// Finish a pass: destroy untouched items and hand back the deferred
    /// values started by sub-views during the pass.
    pub fn end(&self, doc: &Document) -> Vec<Pending> {
        let (stale, pending, created, reused) = {
            let mut state = self.state.borrow_mut();
            let touched = mem::take(&mut state.touched);
            let keep = mem::take(&mut state.touched_set);
            let stale: Vec<View> = state
                .items
                .iter()
                .filter(|(key, _)| !keep.contains(*key))
                .map(|(_, view)| view.clone())
                .collect();
            state.items.retain(|key, _| keep.contains(key));
            state.order = touched;
            (stale, mem::take(&mut state.pending), state.created, state.reused)
        };
        let destroyed = stale.len();
        self.state.borrow_mut().last = PassStats {
            created,
            reused,
            destroyed,
        };
        for view in stale {
            if let Err(err) = doc.detach(view.root()) {
                trace!(%err, "stale list item was already detached");
            }
            doc.release(view.root());
        }
        debug!(
            list = %self.names.join(","),
            created,
            reused,
            destroyed,
            "list pass finished"
        );
        pending
    }

    /// Run a full pass for a pushed value.
    ///
    /// A list value reconciles each item, keyed by its key field when truthy
    /// and by its position otherwise. Any other value runs an empty pass,
    /// which clears the list.
    ///
    /// A push issued while this list is already mid-pass (from a handler or
    /// adapter run by the pass) is dropped with a warning.
    pub fn push(&self, doc: &Document, value: &Value) -> Vec<Pending> {
        if self.in_pass.replace(true) {
            warn!(list = %self.names.join(","), "list is mid-pass; nested push dropped");
            return Vec::new();
        }
        let pending = self.run_pass(doc, value);
        self.in_pass.set(false);
        pending
    }

    fn run_pass(&self, doc: &Document, value: &Value) -> Vec<Pending> {
        self.begin();
        if let Value::List(items) = value {
            let empty = Record::new();
            for (position, item) in items.iter().enumerate() {
                let data = item.as_record().unwrap_or(&empty);
                let key = data
                    .get(&self.key_field)
                    .and_then(ItemKey::from_value)
                    .unwrap_or_else(|| ItemKey::from(position));
                if let Err(err) = self.reconcile(doc, key, data) {
                    warn!(%err, list = %self.names.join(","), "could not place list item");
                }
            }
        } else {
            trace!(list = %self.names.join(","), "non-list value clears list");
        }
        self.end(doc)
    }

    /// Read every live item, in order, tagging each record with its key.
    pub fn read_all(&self) -> Vec<Record> {
        let views: Vec<(ItemKey, View)> = {
            let state = self.state.borrow();
            state
                .order
                .iter()
                .filter_map(|key| state.items.get(key).map(|view| (key.clone(), view.clone())))
                .collect()
        };
        views
            .into_iter()
            .map(|(key, view)| {
                let mut record = view.read_all();
                record.insert(self.key_field.clone(), key.to_value());
                record
            })
            .collect()
    }
}
