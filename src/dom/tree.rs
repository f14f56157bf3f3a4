//! Tree operations: create, attach, detach, clone, walk.

use slotmap::{SecondaryMap, SlotMap};

use super::event::{Handler, Listener, ListenerId};
use super::node::{NodeData, NodeId, NodeKind};
use crate::error::DomError;

/// Empty slice constant for returning when a node has no children.
const EMPTY_CHILDREN: &[NodeId] = &[];

/// The node arena, backed by a slotmap.
///
/// All nodes live in a single `SlotMap`, attached or not. Parent/child
/// relationships are stored in secondary maps so that detaching is O(siblings)
/// and lookup is O(1). Freed ids stay invalid forever (generational keys), so
/// a stale `NodeId` held by a caller is harmless.
pub struct Dom {
    pub(crate) nodes: SlotMap<NodeId, NodeData>,
    children: SecondaryMap<NodeId, Vec<NodeId>>,
    parent: SecondaryMap<NodeId, NodeId>,
    listeners: SlotMap<ListenerId, Listener>,
    node_listeners: SecondaryMap<NodeId, Vec<ListenerId>>,
    root: Option<NodeId>,
}

impl Dom {
    /// Create an empty DOM.
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            children: SecondaryMap::new(),
            parent: SecondaryMap::new(),
            listeners: SlotMap::with_key(),
            node_listeners: SecondaryMap::new(),
            root: None,
        }
    }

    // ── Creation ─────────────────────────────────────────────────────

    /// Create a detached node.
    pub fn create(&mut self, data: NodeData) -> NodeId {
        let id = self.nodes.insert(data);
        self.children.insert(id, Vec::new());
        id
    }

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.create(NodeData::element(tag))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.create(NodeData::text(text))
    }

    /// Create a detached comment node.
    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.create(NodeData::comment(text))
    }

    /// Create a node and append it to `parent`.
    pub fn insert_child(&mut self, parent: NodeId, data: NodeData) -> Result<NodeId, DomError> {
        if !self.contains(parent) {
            return Err(DomError::UnknownNode(parent));
        }
        let id = self.create(data);
        self.append_child(parent, id)?;
        Ok(id)
    }

    /// Deep-clone `node` and its descendants into a new detached subtree.
    ///
    /// Attributes, classes and properties are copied; listeners are not.
    pub fn clone_subtree(&mut self, node: NodeId) -> Result<NodeId, DomError> {
        let data = self.get(node).cloned().ok_or(DomError::UnknownNode(node))?;
        let copy = self.create(data);
        let kids = self.children(node).to_vec();
        for child in kids {
            let child_copy = self.clone_subtree(child)?;
            self.attach_last(copy, child_copy);
        }
        Ok(copy)
    }

    // ── Attaching and detaching ──────────────────────────────────────

    /// Append `child` as the last child of `parent`, moving it if attached.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.check_insert(parent, child)?;
        let _ = self.detach(child);
        self.attach_last(parent, child);
        Ok(())
    }

    /// Insert `child` into `parent` immediately before `reference`, moving it
    /// if attached. `reference` must be a child of `parent`.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: NodeId,
    ) -> Result<(), DomError> {
        self.check_insert(parent, child)?;
        if child == reference {
            return Ok(());
        }
        if self.parent(reference) != Some(parent) {
            return Err(DomError::NotAChild {
                parent,
                child: reference,
            });
        }
        let _ = self.detach(child);
        let siblings = self
            .children
            .get_mut(parent)
            .ok_or(DomError::UnknownNode(parent))?;
        let at = siblings
            .iter()
            .position(|&c| c == reference)
            .unwrap_or(siblings.len());
        siblings.insert(at, child);
        self.parent.insert(child, parent);
        Ok(())
    }

    /// Detach `node` from its parent. Returns the former parent.
    ///
    /// The subtree stays in the arena and can be reinserted.
    pub fn detach(&mut self, node: NodeId) -> Result<NodeId, DomError> {
        if !self.contains(node) {
            return Err(DomError::UnknownNode(node));
        }
        let parent = self.parent.remove(node).ok_or(DomError::NotAttached(node))?;
        if let Some(siblings) = self.children.get_mut(parent) {
            siblings.retain(|&c| c != node);
        }
        Ok(parent)
    }

    /// Detach every child of `node`, returning them in order.
    pub fn take_children(&mut self, node: NodeId) -> Vec<NodeId> {
        let kids = match self.children.get_mut(node) {
            Some(kids) => std::mem::take(kids),
            None => return Vec::new(),
        };
        for &child in &kids {
            self.parent.remove(child);
        }
        kids
    }

    /// Free a node and all its descendants, along with their listeners.
    ///
    /// Returns the `NodeData` for the removed node, or `None` if it didn't exist.
    pub fn remove(&mut self, id: NodeId) -> Option<NodeData> {
        if !self.contains(id) {
            return None;
        }
        let _ = self.detach(id);
        if self.root == Some(id) {
            self.root = None;
        }

        let mut removed_root_data = None;
        for current in self.walk_depth_first(id) {
            self.children.remove(current);
            self.parent.remove(current);
            if let Some(ids) = self.node_listeners.remove(current) {
                for lid in ids {
                    self.listeners.remove(lid);
                }
            }
            let data = self.nodes.remove(current);
            if current == id {
                removed_root_data = data;
            }
        }
        removed_root_data
    }

    fn check_insert(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        if !self.contains(parent) {
            return Err(DomError::UnknownNode(parent));
        }
        if !self.contains(child) {
            return Err(DomError::UnknownNode(child));
        }
        if parent == child || self.is_ancestor_of(child, parent) {
            return Err(DomError::Cycle { node: child });
        }
        Ok(())
    }

    fn attach_last(&mut self, parent: NodeId, child: NodeId) {
        if let Some(kids) = self.children.get_mut(parent) {
            kids.push(child);
            self.parent.insert(child, parent);
        }
    }

    // ── Navigation ───────────────────────────────────────────────────

    /// Get the parent of a node, if it has one.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parent.get(id).copied()
    }

    /// Get the children of a node. Returns an empty slice if the node has no children
    /// or does not exist.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.children
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or(EMPTY_CHILDREN)
    }

    /// Walk from `id` up to the topmost ancestor, collecting ancestor node ids.
    ///
    /// The returned vec does **not** include `id` itself; it starts with the
    /// immediate parent.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut current = id;
        while let Some(p) = self.parent.get(current).copied() {
            result.push(p);
            current = p;
        }
        result
    }

    /// Whether `ancestor` is a strict ancestor of `node`.
    pub fn is_ancestor_of(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = node;
        while let Some(p) = self.parent.get(current).copied() {
            if p == ancestor {
                return true;
            }
            current = p;
        }
        false
    }

    /// Pre-order depth-first traversal starting from `start` (inclusive).
    pub fn walk_depth_first(&self, start: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if !self.nodes.contains_key(current) {
                continue;
            }
            result.push(current);
            // Push children in reverse so the first child is visited first.
            for &child in self.children(current).iter().rev() {
                stack.push(child);
            }
        }
        result
    }

    /// Concatenated text of every text node under `node`.
    pub fn text_content(&self, node: NodeId) -> String {
        self.walk_depth_first(node)
            .into_iter()
            .filter_map(|id| match &self.nodes.get(id)?.kind {
                NodeKind::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    // ── Data access ──────────────────────────────────────────────────

    /// Immutable access to a node's data.
    pub fn get(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id)
    }

    /// Mutable access to a node's data.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.nodes.get_mut(id)
    }

    /// The document root, if set.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Explicitly set the document root.
    pub fn set_root(&mut self, id: NodeId) {
        self.root = Some(id);
    }

    /// Number of nodes in the arena, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether the arena contains a node with the given id.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    // ── Listeners ────────────────────────────────────────────────────

    /// Register `handler` for `event` on `node`.
    pub fn add_listener(
        &mut self,
        node: NodeId,
        event: &str,
        handler: Handler,
    ) -> Result<ListenerId, DomError> {
        if !self.contains(node) {
            return Err(DomError::UnknownNode(node));
        }
        let id = self.listeners.insert(Listener {
            node,
            event: event.to_owned(),
            handler,
        });
        match self.node_listeners.get_mut(node) {
            Some(ids) => ids.push(id),
            None => {
                self.node_listeners.insert(node, vec![id]);
            }
        }
        Ok(id)
    }

    /// Unregister a listener. Returns `false` if it was already gone.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let Some(listener) = self.listeners.remove(id) else {
            return false;
        };
        if let Some(ids) = self.node_listeners.get_mut(listener.node) {
            ids.retain(|&l| l != id);
        }
        true
    }

    /// Handlers registered for `event` on `node`, in registration order.
    pub fn handlers(&self, node: NodeId, event: &str) -> Vec<Handler> {
        self.node_listeners
            .get(node)
            .map(|ids| {
                ids.iter()
                    .filter_map(|&id| self.listeners.get(id))
                    .filter(|l| l.event == event)
                    .map(|l| l.handler.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of listeners registered on `node` for `event`.
    pub fn listener_count(&self, node: NodeId, event: &str) -> usize {
        self.handlers(node, event).len()
    }
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}
