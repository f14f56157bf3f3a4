//! Type adapters: per-kind write and read of node values.
//!
//! A node's kind is its type attribute (`data-type`) when present, otherwise
//! its tag, upper-cased. Adapters are looked up in a process-wide (per
//! thread) registry; nodes with no adapter fall back to text content.
//!
//! Built-in adapters:
//!
//! - `INPUT`, `TEXTAREA`: the `value` property, or the checked state for
//!   checkboxes and radios. Reading several checkables under one name
//!   accumulates their values into a list.
//! - `SELECT`: the selected option; a list or record value rebuilds the
//!   options, keeping the selection if it is still offered.
//! - `IMG`, `IFRAME`: the `src` attribute.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value as Json;
use tracing::trace;

use crate::config::BindingConfig;
use crate::document::Document;
use crate::dom::{Dom, NodeData, NodeId};
use crate::value::Value;

/// Writes values to and reads values from one kind of node.
pub trait TypeAdapter {
    /// Push `value` into `node`.
    fn write(&self, dom: &mut Dom, node: NodeId, value: &Value);

    /// Read the value of `node`. `current` is what earlier targets under the
    /// same name produced in this read, if anything.
    fn read(&self, dom: &Dom, node: NodeId, current: Option<&Value>) -> Option<Value>;
}

/// Adapter built from a pair of closures.
pub struct FnAdapter<W, R> {
    write: W,
    read: R,
}

impl<W, R> FnAdapter<W, R>
where
    W: Fn(&mut Dom, NodeId, &Value),
    R: Fn(&Dom, NodeId, Option<&Value>) -> Option<Value>,
{
    pub fn new(write: W, read: R) -> Self {
        Self { write, read }
    }
}

impl<W, R> TypeAdapter for FnAdapter<W, R>
where
    W: Fn(&mut Dom, NodeId, &Value),
    R: Fn(&Dom, NodeId, Option<&Value>) -> Option<Value>,
{
    fn write(&self, dom: &mut Dom, node: NodeId, value: &Value) {
        (self.write)(dom, node, value);
    }

    fn read(&self, dom: &Dom, node: NodeId, current: Option<&Value>) -> Option<Value> {
        (self.read)(dom, node, current)
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Kind to adapter map.
#[derive(Clone, Default)]
pub struct TypeAdapterRegistry {
    adapters: HashMap<String, Rc<dyn TypeAdapter>>,
}

thread_local! {
    static REGISTRY: RefCell<TypeAdapterRegistry> = RefCell::new(TypeAdapterRegistry::with_defaults());
}

impl TypeAdapterRegistry {
    /// A registry holding the built-in adapters.
    pub fn with_defaults() -> Self {
        let mut registry = Self::default();
        let input: Rc<dyn TypeAdapter> = Rc::new(InputAdapter);
        registry.insert("INPUT", input.clone());
        registry.insert("TEXTAREA", input);
        registry.insert("SELECT", Rc::new(SelectAdapter));
        let source: Rc<dyn TypeAdapter> = Rc::new(SourceAdapter);
        registry.insert("IMG", source.clone());
        registry.insert("IFRAME", source);
        registry
    }

    /// Add or replace the adapter for `kind`.
    pub fn insert(&mut self, kind: &str, adapter: Rc<dyn TypeAdapter>) -> Option<Rc<dyn TypeAdapter>> {
        self.adapters.insert(kind.to_uppercase(), adapter)
    }

    pub fn get(&self, kind: &str) -> Option<Rc<dyn TypeAdapter>> {
        self.adapters.get(&kind.to_uppercase()).cloned()
    }

    /// Register an adapter in the thread's global registry. Affects every
    /// view created before or after.
    pub fn register(kind: &str, adapter: impl TypeAdapter + 'static) {
        REGISTRY.with(|registry| registry.borrow_mut().insert(kind, Rc::new(adapter)));
    }

    /// Look up an adapter in the thread's global registry.
    pub fn resolve(kind: &str) -> Option<Rc<dyn TypeAdapter>> {
        REGISTRY.with(|registry| registry.borrow().get(kind))
    }

    /// Restore the global registry to the built-in adapters.
    pub fn reset() {
        REGISTRY.with(|registry| *registry.borrow_mut() = Self::with_defaults());
    }
}

impl fmt::Debug for TypeAdapterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<&String> = self.adapters.keys().collect();
        kinds.sort();
        f.debug_struct("TypeAdapterRegistry").field("kinds", &kinds).finish()
    }
}

/// Upper-cased adapter kind of `node`.
pub fn node_kind(dom: &Dom, node: NodeId, config: &BindingConfig) -> Option<String> {
    let data = dom.get(node)?;
    data.attribute(&config.type_attribute)
        .or_else(|| data.tag().map(str::to_owned))
        .map(|kind| kind.to_uppercase())
}

/// Push `value` into `node` through its adapter, or as text content.
pub(crate) fn write(doc: &Document, node: NodeId, value: &Value) {
    let adapter = doc
        .with(|dom| node_kind(dom, node, doc.config()))
        .and_then(|kind| TypeAdapterRegistry::resolve(&kind));
    match adapter {
        Some(adapter) => doc.with_mut(|dom| adapter.write(dom, node, value)),
        None => {
            doc.discard_children(node);
            if let Some(text) = value.to_text() {
                doc.with_mut(|dom| {
                    let text = dom.create_text(&text);
                    let _ = dom.append_child(node, text);
                });
            }
        }
    }
}

/// Read `node` through its adapter, or as editable content.
pub(crate) fn read(doc: &Document, node: NodeId, current: Option<&Value>) -> Option<Value> {
    let config = doc.config();
    doc.with(|dom| {
        let adapter = node_kind(dom, node, config).and_then(|kind| TypeAdapterRegistry::resolve(&kind));
        match adapter {
            Some(adapter) => adapter.read(dom, node, current),
            None => read_editable(dom, node, config),
        }
    })
}

fn read_editable(dom: &Dom, node: NodeId, config: &BindingConfig) -> Option<Value> {
    let data = dom.get(node)?;
    if !data.is_content_editable() {
        trace!(?node, "no adapter and not editable; nothing to read");
        return None;
    }
    let html = data
        .attribute(&config.format_attribute)
        .is_some_and(|format| format.eq_ignore_ascii_case("html"));
    Some(Value::String(if html {
        dom.inner_markup(node)
    } else {
        dom.text_content(node)
    }))
}

// ---------------------------------------------------------------------------
// Built-in adapters
// ---------------------------------------------------------------------------

struct InputAdapter;

impl TypeAdapter for InputAdapter {
    fn write(&self, dom: &mut Dom, node: NodeId, value: &Value) {
        let Some(data) = dom.get_mut(node) else {
            return;
        };
        if !data.is_checkable() {
            data.set_value(value.to_text().unwrap_or_default());
            return;
        }
        let own = data.value();
        let checked = match value {
            Value::Bool(on) => *on,
            Value::List(items) => items.iter().any(|item| item.to_text().as_deref() == Some(own.as_str())),
            Value::Null => false,
            other => other.to_text().as_deref() == Some(own.as_str()),
        };
        data.set_checked(checked);
    }

    fn read(&self, dom: &Dom, node: NodeId, current: Option<&Value>) -> Option<Value> {
        let data = dom.get(node)?;
        if !data.is_checkable() {
            return Some(Value::String(data.value()));
        }
        let checked = data.checked();
        let own = Value::String(data.value());
        Some(match current {
            None if checked => own,
            None => Value::Bool(false),
            Some(Value::Bool(false)) if checked => Value::List(vec![own]),
            Some(Value::Bool(false)) => Value::List(Vec::new()),
            Some(Value::List(items)) => {
                let mut items = items.clone();
                if checked {
                    items.push(own);
                }
                Value::List(items)
            }
            Some(other) if checked => Value::List(vec![other.clone(), own]),
            Some(other) => Value::List(vec![other.clone()]),
        })
    }
}

struct SelectAdapter;

impl SelectAdapter {
    fn options(dom: &Dom, select: NodeId) -> Vec<NodeId> {
        dom.query_all(select, |data| data.tag() == Some("option"))
    }

    fn option_value(dom: &Dom, option: NodeId) -> String {
        dom.get(option)
            .and_then(|data| data.attribute("value"))
            .unwrap_or_else(|| dom.text_content(option))
    }

    fn selected(data: &NodeData) -> Option<bool> {
        data.property(&["selected"]).and_then(Json::as_bool)
    }

    /// The select's current value, following form-control defaults: an
    /// explicitly selected option, else a `selected` attribute, else the
    /// first option. Empty when every option was explicitly deselected.
    fn current(dom: &Dom, select: NodeId) -> String {
        let options = Self::options(dom, select);
        let explicit = options
            .iter()
            .find(|&&option| dom.get(option).and_then(Self::selected) == Some(true));
        if let Some(&option) = explicit {
            return Self::option_value(dom, option);
        }
        let any_explicit = options
            .iter()
            .any(|&option| dom.get(option).and_then(Self::selected).is_some());
        if any_explicit {
            return String::new();
        }
        options
            .iter()
            .find(|&&option| dom.get(option).is_some_and(|data| data.has_attribute("selected")))
            .or_else(|| options.first())
            .map(|&option| Self::option_value(dom, option))
            .unwrap_or_default()
    }

    fn select(dom: &mut Dom, select: NodeId, wanted: &str) {
        let mut found = false;
        for option in Self::options(dom, select) {
            let on = !found && Self::option_value(dom, option) == wanted;
            found |= on;
            if let Some(data) = dom.get_mut(option) {
                data.set_property(&["selected"], Json::Bool(on));
            }
        }
    }

    fn replace_options(dom: &mut Dom, select: NodeId, options: Vec<(Option<String>, String)>) {
        let previous = Self::current(dom, select);
        for old in dom.take_children(select) {
            dom.remove(old);
        }
        for (value, label) in options {
            let mut data = NodeData::element("option");
            if let Some(value) = value {
                data.set_attribute("value", &value);
            }
            if let Ok(option) = dom.insert_child(select, data) {
                let text = dom.create_text(&label);
                let _ = dom.append_child(option, text);
            }
        }
        let still_offered = Self::options(dom, select)
            .into_iter()
            .any(|option| Self::option_value(dom, option) == previous);
        if still_offered {
            Self::select(dom, select, &previous);
        }
    }
}

impl TypeAdapter for SelectAdapter {
    fn write(&self, dom: &mut Dom, node: NodeId, value: &Value) {
        match value {
            Value::List(items) => {
                let options = items
                    .iter()
                    .map(|item| (None, item.to_text().unwrap_or_default()))
                    .collect();
                Self::replace_options(dom, node, options);
            }
            Value::Record(entries) => {
                let options = entries
                    .iter()
                    .map(|(key, label)| (Some(key.to_owned()), label.to_text().unwrap_or_default()))
                    .collect();
                Self::replace_options(dom, node, options);
            }
            other => Self::select(dom, node, &other.to_text().unwrap_or_default()),
        }
    }

    fn read(&self, dom: &Dom, node: NodeId, _current: Option<&Value>) -> Option<Value> {
        Some(Value::String(Self::current(dom, node)))
    }
}

struct SourceAdapter;

impl TypeAdapter for SourceAdapter {
    fn write(&self, dom: &mut Dom, node: NodeId, value: &Value) {
        let Some(data) = dom.get_mut(node) else {
            return;
        };
        match value.to_text() {
            Some(src) => data.set_attribute("src", &src),
            None => data.remove_attribute("src"),
        }
    }

    fn read(&self, dom: &Dom, node: NodeId, _current: Option<&Value>) -> Option<Value> {
        dom.get(node)?.attribute("src").map(Value::String)
    }
}
