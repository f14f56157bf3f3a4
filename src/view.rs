//! Views: a root node plus the index of named placeholders under it.
//!
//! Push data with [`View::set_data`], read it back with [`View::read_data`].
//! Names are resolved when a value is applied, so a rebuild between a push
//! and the resolution of a deferred value is honored.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::Value as Json;
use tracing::{debug, trace, warn};

use crate::adapter;
use crate::directive::{self, VALUE_KEY};
use crate::document::Document;
use crate::dom::{Event, Handler, ListenerId, NodeId};
use crate::error::BindError;
use crate::index::{PlaceholderIndex, Target};
use crate::list::ListBinding;
use crate::pending::Pending;
use crate::record;
use crate::template::TemplateStore;
use crate::value::{Record, Value};

/// Tag of the host element created by [`View::new`].
pub const VIEW_HOST_TAG: &str = "toplevel-view";

const KEY_ENTER: &str = "Enter";
const KEY_ESCAPE: &str = "Escape";

/// Callback run for the default (`Enter`) or cancel (`Escape`) key. Returning
/// `true` stops the key event from propagating.
pub type KeyAction = Rc<dyn Fn(&View) -> bool>;

/// Content accepted by [`View::set_content`].
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Node(NodeId),
    View(View),
}

impl From<NodeId> for Content {
    fn from(node: NodeId) -> Self {
        Content::Node(node)
    }
}

impl From<View> for Content {
    fn from(view: View) -> Self {
        Content::View(view)
    }
}

impl From<&View> for Content {
    fn from(view: &View) -> Self {
        Content::View(view.clone())
    }
}

impl Content {
    fn node(&self) -> NodeId {
        match self {
            Content::Node(node) => *node,
            Content::View(view) => view.root(),
        }
    }
}

/// How a node is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Present and visible.
    Visible,
    /// Takes up space but is not drawn.
    Transparent,
    /// Not rendered at all.
    Hidden,
}

impl Visibility {
    fn directives(self) -> Record {
        match self {
            Visibility::Visible => record! { ".hidden" => false, ".style.visibility" => "" },
            Visibility::Transparent => record! { ".hidden" => false, ".style.visibility" => "hidden" },
            Visibility::Hidden => record! { ".hidden" => true },
        }
    }
}

#[derive(Default)]
struct KeyActions {
    default: Option<KeyAction>,
    cancel: Option<KeyAction>,
    listener: Option<ListenerId>,
}

struct ViewInner {
    doc: Document,
    root: NodeId,
    index: RefCell<PlaceholderIndex>,
    marked: RefCell<Vec<NodeId>>,
    keys: RefCell<KeyActions>,
}

/// A bindable subtree.
///
/// Cloning is cheap and yields a handle to the same view; equality is
/// identity.
#[derive(Clone)]
pub struct View {
    inner: Rc<ViewInner>,
}

impl View {
    /// Create a view over a new, detached host element.
    pub fn new(doc: &Document) -> Self {
        let root = doc.with_mut(|dom| dom.create_element(VIEW_HOST_TAG));
        Self::from_root(doc, root)
    }

    /// Create a view over an existing subtree and index it.
    pub fn from_root(doc: &Document, root: NodeId) -> Self {
        let index = PlaceholderIndex::build(doc, root, &PlaceholderIndex::default());
        Self {
            inner: Rc::new(ViewInner {
                doc: doc.clone(),
                root,
                index: RefCell::new(index),
                marked: RefCell::new(Vec::new()),
                keys: RefCell::new(KeyActions::default()),
            }),
        }
    }

    /// Create a view over a fresh instance of template `id`.
    pub fn from_template(doc: &Document, store: &TemplateStore, id: &str) -> Result<Self, BindError> {
        let root = store.instantiate(doc, id, None)?;
        Ok(Self::from_root(doc, root))
    }

    pub fn root(&self) -> NodeId {
        self.inner.root
    }

    pub fn document(&self) -> &Document {
        &self.inner.doc
    }

    /// Whether two handles refer to the same view.
    pub fn ptr_eq(&self, other: &View) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn downgrade(&self) -> Weak<ViewInner> {
        Rc::downgrade(&self.inner)
    }

    fn upgrade(weak: &Weak<ViewInner>) -> Option<View> {
        weak.upgrade().map(|inner| View { inner })
    }

    // ── Index ────────────────────────────────────────────────────────

    /// Re-index the subtree, keeping list bindings whose anchors are still
    /// inside it.
    pub fn rebuild(&self) {
        let next = PlaceholderIndex::build(&self.inner.doc, self.inner.root, &self.inner.index.borrow());
        *self.inner.index.borrow_mut() = next;
    }

    /// Indexed names in tree order.
    pub fn names(&self) -> Vec<String> {
        self.inner.index.borrow().names().to_vec()
    }

    /// The targets currently registered under `name`.
    pub fn targets(&self, name: &str) -> Option<Vec<Target>> {
        self.inner.index.borrow().lookup(name).map(<[Target]>::to_vec)
    }

    /// The first list binding registered under `name`.
    pub fn list(&self, name: &str) -> Option<Rc<ListBinding>> {
        self.targets(name)?
            .into_iter()
            .find_map(|target| target.list().cloned())
    }

    // ── Content ──────────────────────────────────────────────────────

    /// Replace the root's children with `content` and re-index.
    pub fn set_content(&self, content: impl Into<Content>) -> Result<(), BindError> {
        let content = content.into();
        self.clear_content();
        let doc = &self.inner.doc;
        doc.with_mut(|dom| dom.append_child(self.inner.root, content.node()))?;
        self.rebuild();
        Ok(())
    }

    /// Remove the root's children and forget every placeholder and key action.
    pub fn clear_content(&self) {
        self.inner.doc.discard_children(self.inner.root);
        *self.inner.index.borrow_mut() = PlaceholderIndex::default();
        self.inner.marked.borrow_mut().clear();
        let mut keys = self.inner.keys.borrow_mut();
        keys.default = None;
        keys.cancel = None;
    }

    /// Replace the content with a fresh instance of template `id`.
    pub fn load_template(&self, store: &TemplateStore, id: &str) -> Result<(), BindError> {
        let host = store.instantiate(&self.inner.doc, id, None)?;
        self.set_content(host)
    }

    // ── Push ─────────────────────────────────────────────────────────

    /// Push each entry of `data` to the placeholders of the same name.
    ///
    /// Unknown names are skipped. Deferred values are spawned on the current
    /// `LocalSet` and applied when they resolve; the returned handles track
    /// them, including deferred values pushed into list items.
    ///
    /// # Panics
    ///
    /// Panics if `data` holds a [`Deferred`](crate::value::Deferred) and this
    /// is not called inside a `tokio::task::LocalSet`.
    pub fn set_data(&self, data: &Record) -> Vec<Pending> {
        let mut pending = Vec::new();
        for (name, value) in data.iter() {
            match value {
                Value::Deferred(deferred) => match deferred.take() {
                    Some(future) => {
                        let view = self.clone();
                        let owned = name.to_owned();
                        pending.push(Pending::spawn(name, async move {
                            let mut value = future.await;
                            while let Value::Deferred(next) = &value {
                                match next.take() {
                                    Some(future) => value = future.await,
                                    None => {
                                        warn!(name = %owned, "deferred value resolved to a consumed deferred");
                                        return;
                                    }
                                }
                            }
                            for nested in view.apply(&owned, &value) {
                                if let Err(err) = nested.await {
                                    warn!(%err, "nested deferred value failed");
                                }
                            }
                        }));
                    }
                    None => warn!(name, "deferred value already consumed; skipped"),
                },
                other => pending.extend(self.apply(name, other)),
            }
        }
        pending
    }

    /// Push the entries of a JSON object.
    pub fn set_json(&self, data: Json) -> Vec<Pending> {
        match Record::from_json(data) {
            Some(record) => self.set_data(&record),
            None => {
                warn!("pushed JSON is not an object; ignored");
                Vec::new()
            }
        }
    }

    fn apply(&self, name: &str, value: &Value) -> Vec<Pending> {
        let Some(targets) = self.targets(name) else {
            trace!(name, "no placeholder for name");
            return Vec::new();
        };
        let doc = &self.inner.doc;
        let mut pending = Vec::new();
        for target in &targets {
            let mut effective = value;
            if let Value::Record(object) = value {
                match target {
                    Target::Node(node) => directive::apply_all(doc, *node, object),
                    Target::List(_) => trace!(name, "directives ignored on list placeholder"),
                }
                match object.get(VALUE_KEY) {
                    Some(inner) => effective = inner,
                    None => continue,
                }
            }
            match (target, effective) {
                (Target::Node(node), Value::Node(_) | Value::View(_)) => {
                    let content = match effective {
                        Value::View(view) => view.root(),
                        Value::Node(node) => *node,
                        _ => continue,
                    };
                    doc.discard_children(*node);
                    if let Err(err) = doc.with_mut(|dom| dom.append_child(*node, content)) {
                        warn!(%err, name, "could not insert content");
                    }
                    self.rebuild();
                }
                (Target::List(_), Value::Node(_) | Value::View(_)) => {
                    debug!(name, "content cannot be inserted into a list placeholder");
                }
                (_, Value::Deferred(_)) => {
                    warn!(name, "nested deferred values are not applied");
                }
                (Target::List(list), _) => pending.extend(list.push(doc, effective)),
                (Target::Node(node), _) => adapter::write(doc, *node, effective),
            }
        }
        pending
    }

    // ── Read ─────────────────────────────────────────────────────────

    /// Read the given names, or every indexed name.
    ///
    /// Readonly nodes and lists are skipped. A list name reads as the records
    /// of its items; repeated names accumulate.
    pub fn read_data(&self, names: Option<&[&str]>) -> Record {
        let names: Vec<String> = match names {
            Some(names) => names.iter().map(|&name| name.to_owned()).collect(),
            None => self.names(),
        };
        let doc = &self.inner.doc;
        let readonly_attribute = &doc.config().readonly_attribute;
        let mut out = Record::new();
        for name in names {
            let Some(targets) = self.targets(&name) else {
                trace!(name = %name, "no placeholder to read");
                continue;
            };
            for target in targets {
                match target {
                    Target::List(list) => {
                        if list.is_readonly(doc) {
                            continue;
                        }
                        let items = list.read_all().into_iter().map(Value::Record);
                        match out.get_mut(&name) {
                            Some(Value::List(existing)) => existing.extend(items),
                            Some(other) => {
                                let first = std::mem::replace(other, Value::Null);
                                *other = Value::List(std::iter::once(first).chain(items).collect());
                            }
                            None => {
                                out.insert(name.clone(), Value::List(items.collect()));
                            }
                        }
                    }
                    Target::Node(node) => {
                        let readonly = doc.with(|dom| {
                            dom.get(node)
                                .and_then(|data| data.attribute(readonly_attribute))
                                .is_some_and(|marker| !marker.is_empty())
                        });
                        if readonly {
                            continue;
                        }
                        if let Some(value) = adapter::read(doc, node, out.get(&name)) {
                            out.insert(name.clone(), value);
                        }
                    }
                }
            }
        }
        out
    }

    /// Read every indexed name.
    pub fn read_all(&self) -> Record {
        self.read_data(None)
    }

    /// Read every indexed name as a JSON object.
    pub fn read_json(&self) -> Json {
        self.read_all().to_json()
    }

    // ── Scoping and lifecycle ────────────────────────────────────────

    /// A new view rooted at the single node named `name`.
    pub fn create_scoped(&self, name: &str) -> Result<View, BindError> {
        let index = self.inner.index.borrow();
        match index.unique(name)? {
            Target::Node(node) => Ok(View::from_root(&self.inner.doc, *node)),
            Target::List(_) => Err(BindError::NotANode(name.to_owned())),
        }
    }

    /// Attach the root to the document body.
    pub fn open(&self) -> Result<(), BindError> {
        let doc = &self.inner.doc;
        let body = doc.body();
        doc.with_mut(|dom| dom.append_child(body, self.inner.root))?;
        Ok(())
    }

    /// Detach the root from its parent.
    pub fn close(&self) -> Result<(), BindError> {
        self.inner.doc.detach(self.inner.root)?;
        Ok(())
    }

    // ── Presentation ─────────────────────────────────────────────────

    pub fn set_visibility(&self, visibility: Visibility) {
        directive::apply_all(&self.inner.doc, self.inner.root, &visibility.directives());
    }

    pub fn show(&self) {
        self.set_visibility(Visibility::Visible);
    }

    pub fn hide(&self) {
        self.set_visibility(Visibility::Hidden);
    }

    /// Whether the root is hidden.
    pub fn is_hidden(&self) -> bool {
        self.inner
            .doc
            .with(|dom| dom.get(self.inner.root).is_some_and(|data| data.flag("hidden")))
    }

    /// Add the mark class to every node named `name`, clearing earlier marks.
    pub fn mark(&self, name: &str) {
        self.unmark();
        let nodes: Vec<NodeId> = self
            .targets(name)
            .unwrap_or_default()
            .iter()
            .filter_map(Target::node)
            .collect();
        let class = &self.inner.doc.config().mark_class;
        self.inner.doc.with_mut(|dom| {
            for &node in &nodes {
                if let Some(data) = dom.get_mut(node) {
                    data.add_class(class);
                }
            }
        });
        *self.inner.marked.borrow_mut() = nodes;
    }

    /// Remove the mark class from marked nodes.
    pub fn unmark(&self) {
        let marked = std::mem::take(&mut *self.inner.marked.borrow_mut());
        let class = &self.inner.doc.config().mark_class;
        self.inner.doc.with_mut(|dom| {
            for node in marked {
                if let Some(data) = dom.get_mut(node) {
                    data.remove_class(class);
                }
            }
        });
    }

    // ── Per-item helpers ─────────────────────────────────────────────

    /// Remove (`true`) or set (`false`) the `disabled` attribute on `name`.
    pub fn enable_item(&self, name: &str, enabled: bool) -> Vec<Pending> {
        let disabled = if enabled { Value::Null } else { Value::from("") };
        self.set_data(&record! { name => record! { "disabled" => disabled } })
    }

    pub fn show_item(&self, name: &str, visibility: Visibility) -> Vec<Pending> {
        self.set_data(&record! { name => visibility.directives() })
    }

    /// Bind (`Some`) or unbind (`None`) the directive listener for `event`.
    pub fn set_item_event(&self, name: &str, event: &str, handler: Option<Handler>) -> Vec<Pending> {
        let handler = handler.map_or(Value::Null, Value::Handler);
        self.set_data(&record! { name => record! { format!("!{event}") => handler } })
    }

    pub fn set_item_value(&self, name: &str, value: impl Into<Value>) -> Vec<Pending> {
        self.set_data(&record! { name => value })
    }

    /// Push null to `name`, emptying text placeholders.
    pub fn clear_item(&self, name: &str) -> Vec<Pending> {
        self.set_item_value(name, Value::Null)
    }

    /// Instantiate template `id` into the single node named `name` and return
    /// a view over the instance.
    pub fn load_item_template(&self, name: &str, store: &TemplateStore, id: &str) -> Result<View, BindError> {
        let node = {
            let index = self.inner.index.borrow();
            match index.unique(name)? {
                Target::Node(node) => *node,
                Target::List(_) => return Err(BindError::NotANode(name.to_owned())),
            }
        };
        let host = store.instantiate(&self.inner.doc, id, None)?;
        let sub = View::from_root(&self.inner.doc, host);
        self.inner.doc.discard_children(node);
        self.inner.doc.with_mut(|dom| dom.append_child(node, host))?;
        self.rebuild();
        Ok(sub)
    }

    // ── Keyboard actions ─────────────────────────────────────────────

    /// Run `action` when `Enter` is pressed inside the view. With `button`,
    /// clicking the node of that name runs it too.
    pub fn set_default_action(&self, action: impl Fn(&View) -> bool + 'static, button: Option<&str>) {
        let action: KeyAction = Rc::new(action);
        self.inner.keys.borrow_mut().default = Some(action.clone());
        self.install_key_listener();
        if let Some(button) = button {
            self.bind_button(button, action);
        }
    }

    /// Run `action` when `Escape` is pressed inside the view. With `button`,
    /// clicking the node of that name runs it too.
    pub fn set_cancel_action(&self, action: impl Fn(&View) -> bool + 'static, button: Option<&str>) {
        let action: KeyAction = Rc::new(action);
        self.inner.keys.borrow_mut().cancel = Some(action.clone());
        self.install_key_listener();
        if let Some(button) = button {
            self.bind_button(button, action);
        }
    }

    fn bind_button(&self, button: &str, action: KeyAction) {
        let weak = self.downgrade();
        let handler = Handler::new(move |_ev| {
            if let Some(view) = View::upgrade(&weak) {
                action(&view);
            }
        });
        self.set_item_event(button, "click", Some(handler));
    }

    fn install_key_listener(&self) {
        if self.inner.keys.borrow().listener.is_some() {
            return;
        }
        let weak = self.downgrade();
        let handler = Handler::new(move |ev: &mut Event| {
            let Some(view) = View::upgrade(&weak) else {
                return;
            };
            let action = {
                let keys = view.inner.keys.borrow();
                match ev.key.as_deref() {
                    Some(KEY_ENTER) => keys.default.clone(),
                    Some(KEY_ESCAPE) => keys.cancel.clone(),
                    _ => None,
                }
            };
            if let Some(action) = action {
                if action(&view) {
                    ev.stop_propagation();
                }
            }
        });
        let root = self.inner.root;
        match self.inner.doc.with_mut(|dom| dom.add_listener(root, "keydown", handler)) {
            Ok(id) => self.inner.keys.borrow_mut().listener = Some(id),
            Err(err) => warn!(%err, "could not install key listener"),
        }
    }
}

impl PartialEq for View {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = self
            .inner
            .index
            .try_borrow()
            .map(|index| index.names().to_vec())
            .unwrap_or_default();
        f.debug_struct("View")
            .field("root", &self.inner.root)
            .field("names", &names)
            .finish()
    }
}
