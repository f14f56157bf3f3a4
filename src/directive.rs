//! Directive objects.
//!
//! When a record is pushed to a node placeholder, each of its keys is a
//! directive:
//!
//! | key            | effect                                                |
//! |----------------|-------------------------------------------------------|
//! | `classList`    | toggle each named class by the truthiness of its value |
//! | `!event`       | replace the directive-bound listener (`null` removes) |
//! | `.a.b`         | set a nested property (`null` deletes)                |
//! | `value`        | pushed as an ordinary value after the directives run  |
//! | anything else  | set the attribute (`null` removes)                    |

use std::collections::HashMap;

use serde_json::Value as Json;
use slotmap::SecondaryMap;
use tracing::{trace, warn};

use crate::document::Document;
use crate::dom::{Dom, Handler, ListenerId, NodeId};
use crate::error::DomError;
use crate::value::{Record, Value};

/// Key carrying the value pushed after directives.
pub const VALUE_KEY: &str = "value";
const CLASS_LIST_KEY: &str = "classList";

/// One parsed directive.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    /// Set (`Some`) or remove (`None`) an attribute.
    Attribute { name: String, value: Option<String> },
    /// Set (`Some`) or delete (`None`) a nested property.
    Property { path: Vec<String>, value: Option<Json> },
    /// Bind (`Some`) or unbind (`None`) the directive listener for an event.
    Listener { event: String, handler: Option<Handler> },
    /// Add or remove a class.
    ClassToggle { class: String, on: bool },
}

impl Directive {
    /// Parse the directive keys of `record`, in order. The `value` key is
    /// skipped; entries whose value has no usable form are dropped.
    pub fn parse(record: &Record) -> Vec<Directive> {
        let mut out = Vec::new();
        for (key, value) in record.iter() {
            if key == VALUE_KEY {
                continue;
            }
            if key == CLASS_LIST_KEY {
                if let Value::Record(classes) = value {
                    out.extend(classes.iter().map(|(class, on)| Directive::ClassToggle {
                        class: class.to_owned(),
                        on: on.is_truthy(),
                    }));
                    continue;
                }
            }
            if let Some(event) = key.strip_prefix('!') {
                match value {
                    Value::Handler(handler) => out.push(Directive::Listener {
                        event: event.to_owned(),
                        handler: Some(handler.clone()),
                    }),
                    Value::Null => out.push(Directive::Listener {
                        event: event.to_owned(),
                        handler: None,
                    }),
                    other => trace!(key, ?other, "listener directive needs a handler"),
                }
                continue;
            }
            if let Some(path) = key.strip_prefix('.') {
                let path: Vec<String> = path
                    .split('.')
                    .filter(|segment| !segment.is_empty())
                    .map(str::to_owned)
                    .collect();
                if path.is_empty() {
                    continue;
                }
                match value.to_json() {
                    Some(Json::Null) => out.push(Directive::Property { path, value: None }),
                    Some(json) => out.push(Directive::Property {
                        path,
                        value: Some(json),
                    }),
                    None => trace!(key, "property directive value has no JSON form"),
                }
                continue;
            }
            match value {
                Value::Null => out.push(Directive::Attribute {
                    name: key.to_owned(),
                    value: None,
                }),
                other => match other.to_text() {
                    Some(text) => out.push(Directive::Attribute {
                        name: key.to_owned(),
                        value: Some(text),
                    }),
                    None => trace!(key, "attribute directive value has no text form"),
                },
            }
        }
        out
    }

    /// Apply this directive to `node`.
    pub fn apply(&self, doc: &Document, node: NodeId) {
        match self {
            Directive::Listener { event, handler } => {
                if let Err(err) = doc.rebind_listener(node, event, handler.clone()) {
                    warn!(%err, event = %event, "listener directive failed");
                }
            }
            other => doc.with_mut(|dom| {
                let Some(data) = dom.get_mut(node) else {
                    return;
                };
                match other {
                    Directive::Attribute { name, value: Some(v) } => data.set_attribute(name, v),
                    Directive::Attribute { name, value: None } => data.remove_attribute(name),
                    Directive::Property { path, value } => {
                        let path: Vec<&str> = path.iter().map(String::as_str).collect();
                        match value {
                            Some(json) => data.set_property(&path, json.clone()),
                            None => data.delete_property(&path),
                        }
                    }
                    Directive::ClassToggle { class, on } => data.toggle_class(class, *on),
                    Directive::Listener { .. } => {}
                }
            }),
        }
    }
}

/// Parse and apply every directive of `record` to `node`.
pub fn apply_all(doc: &Document, node: NodeId, record: &Record) {
    for directive in Directive::parse(record) {
        directive.apply(doc, node);
    }
}

/// Listener ids bound through directives, per node and event, so a later
/// directive for the same event replaces the earlier one.
#[derive(Debug, Default)]
pub(crate) struct ListenerBook {
    bound: SecondaryMap<NodeId, HashMap<String, ListenerId>>,
}

impl ListenerBook {
    pub(crate) fn rebind(
        &mut self,
        dom: &mut Dom,
        node: NodeId,
        event: &str,
        handler: Option<Handler>,
    ) -> Result<(), DomError> {
        if let Some(previous) = self.bound.get_mut(node).and_then(|events| events.remove(event)) {
            dom.remove_listener(previous);
        }
        let Some(handler) = handler else {
            return Ok(());
        };
        let id = dom.add_listener(node, event, handler)?;
        match self.bound.get_mut(node) {
            Some(events) => {
                events.insert(event.to_owned(), id);
            }
            None => {
                self.bound.insert(node, HashMap::from([(event.to_owned(), id)]));
            }
        }
        Ok(())
    }

    pub(crate) fn forget(&mut self, node: NodeId) {
        self.bound.remove(node);
    }
}
