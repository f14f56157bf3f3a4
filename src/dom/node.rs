//! Node types: NodeId, NodeKind, NodeData.

use std::collections::BTreeMap;

use serde_json::{Map, Value as Json};
use slotmap::new_key_type;

new_key_type! {
    /// Unique identifier for a DOM node. Copy, lightweight (u64).
    pub struct NodeId;
}

/// What a node is: an element with a tag, a text run, or a comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Element node; the tag is stored as written (usually lowercase).
    Element(String),
    /// Text node.
    Text(String),
    /// Comment node. Used for list anchors.
    Comment(String),
}

/// Data associated with a single DOM node.
#[derive(Debug, Clone)]
pub struct NodeData {
    /// Element, text, or comment.
    pub kind: NodeKind,
    /// Attributes other than `class`.
    pub attributes: BTreeMap<String, String>,
    /// Class list. Reads and writes of the `class` attribute go through here.
    pub classes: Vec<String>,
    /// Property bag (`node.value`, `node.style.visibility`, ...).
    pub properties: Map<String, Json>,
}

impl NodeData {
    /// Create element data with the given tag.
    pub fn element(tag: impl Into<String>) -> Self {
        Self::with_kind(NodeKind::Element(tag.into()))
    }

    /// Create a text node holding `text`.
    pub fn text(text: impl Into<String>) -> Self {
        Self::with_kind(NodeKind::Text(text.into()))
    }

    /// Create a comment node.
    pub fn comment(text: impl Into<String>) -> Self {
        Self::with_kind(NodeKind::Comment(text.into()))
    }

    fn with_kind(kind: NodeKind) -> Self {
        Self {
            kind,
            attributes: BTreeMap::new(),
            classes: Vec::new(),
            properties: Map::new(),
        }
    }

    /// Set an attribute (builder).
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(&name.into(), &value.into());
        self
    }

    /// Add a single CSS class (builder).
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        let class = class.into();
        self.add_class(&class);
        self
    }

    /// Element tag, or `None` for text and comment nodes.
    pub fn tag(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element(tag) => Some(tag),
            _ => None,
        }
    }

    /// Whether this is an element node.
    pub fn is_element(&self) -> bool {
        matches!(self.kind, NodeKind::Element(_))
    }

    // ── Attributes ───────────────────────────────────────────────────

    /// Read an attribute. `class` is synthesized from the class list.
    pub fn attribute(&self, name: &str) -> Option<String> {
        if name == "class" {
            if self.classes.is_empty() {
                return None;
            }
            return Some(self.classes.join(" "));
        }
        self.attributes.get(name).cloned()
    }

    /// Whether the attribute is present.
    pub fn has_attribute(&self, name: &str) -> bool {
        if name == "class" {
            return !self.classes.is_empty();
        }
        self.attributes.contains_key(name)
    }

    /// Write an attribute. Writing `class` replaces the class list.
    pub fn set_attribute(&mut self, name: &str, value: &str) {
        if name == "class" {
            self.classes.clear();
            for class in value.split_whitespace() {
                self.add_class(class);
            }
            return;
        }
        self.attributes.insert(name.to_owned(), value.to_owned());
    }

    /// Remove an attribute. No-op if absent.
    pub fn remove_attribute(&mut self, name: &str) {
        if name == "class" {
            self.classes.clear();
        } else {
            self.attributes.remove(name);
        }
    }

    // ── Classes ──────────────────────────────────────────────────────

    /// Check whether this node has a given CSS class.
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Add a CSS class. No-op if already present.
    pub fn add_class(&mut self, class: &str) {
        if !self.has_class(class) {
            self.classes.push(class.to_owned());
        }
    }

    /// Remove a CSS class. No-op if not present.
    pub fn remove_class(&mut self, class: &str) {
        self.classes.retain(|c| c != class);
    }

    /// Add the class when `on`, remove it otherwise.
    pub fn toggle_class(&mut self, class: &str, on: bool) {
        if on {
            self.add_class(class);
        } else {
            self.remove_class(class);
        }
    }

    // ── Properties ───────────────────────────────────────────────────

    /// Read a property by dotted path segments.
    pub fn property(&self, path: &[&str]) -> Option<&Json> {
        let (last, parents) = path.split_last()?;
        let mut map = &self.properties;
        for segment in parents {
            map = map.get(*segment)?.as_object()?;
        }
        map.get(*last)
    }

    /// Assign a property by path, creating intermediate objects as needed.
    ///
    /// A non-object value sitting on an intermediate segment is replaced.
    pub fn set_property(&mut self, path: &[&str], value: Json) {
        let Some((last, parents)) = path.split_last() else {
            return;
        };
        let mut map = &mut self.properties;
        for segment in parents {
            let slot = map
                .entry(segment.to_string())
                .or_insert_with(|| Json::Object(Map::new()));
            if !slot.is_object() {
                *slot = Json::Object(Map::new());
            }
            let Json::Object(inner) = slot else {
                return;
            };
            map = inner;
        }
        map.insert(last.to_string(), value);
    }

    /// Delete a property by path. Missing intermediates are a no-op.
    pub fn delete_property(&mut self, path: &[&str]) {
        let Some((last, parents)) = path.split_last() else {
            return;
        };
        let mut map = &mut self.properties;
        for segment in parents {
            map = match map.get_mut(*segment) {
                Some(Json::Object(inner)) => inner,
                _ => return,
            };
        }
        map.remove(*last);
    }

    /// Truthiness of a boolean-ish property (`hidden`, `disabled`, ...).
    pub fn flag(&self, name: &str) -> bool {
        match self.property(&[name]) {
            Some(Json::Bool(b)) => *b,
            Some(Json::Null) | None => false,
            Some(Json::String(s)) => !s.is_empty(),
            Some(Json::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
            Some(_) => true,
        }
    }

    // ── Form-control state ───────────────────────────────────────────

    /// Whether this is a checkbox or radio input.
    pub fn is_checkable(&self) -> bool {
        matches!(
            self.attributes.get("type").map(String::as_str),
            Some("checkbox") | Some("radio")
        )
    }

    /// The control's current value: the `value` property, then the `value`
    /// attribute, then `on` for checkables.
    pub fn value(&self) -> String {
        match self.property(&["value"]) {
            Some(Json::String(s)) => return s.clone(),
            Some(Json::Null) => return String::new(),
            Some(other) => return other.to_string(),
            None => {}
        }
        if let Some(v) = self.attributes.get("value") {
            return v.clone();
        }
        if self.is_checkable() {
            "on".to_owned()
        } else {
            String::new()
        }
    }

    /// Set the control's value property.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.properties
            .insert("value".to_owned(), Json::String(value.into()));
    }

    /// Checked state: the `checked` property, falling back to the attribute.
    pub fn checked(&self) -> bool {
        match self.property(&["checked"]) {
            Some(Json::Bool(b)) => *b,
            Some(_) => self.flag("checked"),
            None => self.attributes.contains_key("checked"),
        }
    }

    /// Set the checked property.
    pub fn set_checked(&mut self, checked: bool) {
        self.properties
            .insert("checked".to_owned(), Json::Bool(checked));
    }

    /// Whether the element's content is user-editable.
    pub fn is_content_editable(&self) -> bool {
        self.attributes
            .get("contenteditable")
            .is_some_and(|v| v.is_empty() || v == "true")
    }
}
