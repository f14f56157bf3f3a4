//! Template lookup and instantiation.
//!
//! A template is a detached element whose children are copied into a fresh
//! host element on each instantiation. The host is shaped by attributes on
//! the template:
//!
//! - `data-tag`: host tag (default `div`, overridable per call)
//! - `data-class`: host class (default `templ_<id>`)
//! - `data-style`: host style

use std::collections::HashMap;

use tracing::debug;

use crate::document::Document;
use crate::dom::{ElementBuilder, NodeData, NodeId};
use crate::error::{BindError, DomError};

const DEFAULT_HOST_TAG: &str = "div";

/// Named templates living in one document.
#[derive(Debug, Clone, Default)]
pub struct TemplateStore {
    templates: HashMap<String, NodeId>,
}

impl TemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an existing node as template `id`.
    pub fn register(&mut self, id: impl Into<String>, node: NodeId) {
        self.templates.insert(id.into(), node);
    }

    /// Build `builder` as a detached node and register it as template `id`.
    pub fn define(&mut self, doc: &Document, id: impl Into<String>, builder: &ElementBuilder) -> NodeId {
        let node = doc.build(builder);
        self.register(id, node);
        node
    }

    /// The template node registered as `id`.
    pub fn get(&self, id: &str) -> Option<NodeId> {
        self.templates.get(id).copied()
    }

    /// Resolve `id` in the store, falling back to an element with that `id`
    /// attribute anywhere in the document.
    pub fn resolve(&self, doc: &Document, id: &str) -> Option<NodeId> {
        self.get(id).or_else(|| doc.with(|dom| dom.query_by_id(id)))
    }

    /// Create a detached host element holding a copy of the template's
    /// children.
    pub fn instantiate(&self, doc: &Document, id: &str, tag: Option<&str>) -> Result<NodeId, BindError> {
        let template = self
            .resolve(doc, id)
            .ok_or_else(|| BindError::TemplateNotFound(id.to_owned()))?;
        let prefix = &doc.config().template_class_prefix;
        let host = doc.with_mut(|dom| {
            let data = dom.get(template).ok_or(DomError::UnknownNode(template))?;
            let tag = tag
                .map(str::to_owned)
                .or_else(|| data.attribute("data-tag"))
                .unwrap_or_else(|| DEFAULT_HOST_TAG.to_owned());
            let mut host = NodeData::element(tag);
            match data.attribute("data-class") {
                Some(class) => host.set_attribute("class", &class),
                None => host.add_class(&format!("{prefix}{id}")),
            }
            if let Some(style) = data.attribute("data-style") {
                host.set_attribute("style", &style);
            }
            let host = dom.create(host);
            for child in dom.children(template).to_vec() {
                let copy = dom.clone_subtree(child)?;
                dom.append_child(host, copy)?;
            }
            Ok::<_, DomError>(host)
        })?;
        debug!(template = id, "template instantiated");
        Ok(host)
    }
}
