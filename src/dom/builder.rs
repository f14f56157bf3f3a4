//! Declarative subtree construction.
//!
//! [`ElementBuilder`] describes an element, its attributes and children; it is
//! turned into live nodes with [`Dom::build`]. The `markup!` macro (feature
//! `macros`) expands to these builder calls.

use super::node::{NodeData, NodeId};
use super::tree::Dom;

/// A child in an [`ElementBuilder`].
#[derive(Debug, Clone, PartialEq)]
pub enum Child {
    /// Nested element.
    Element(ElementBuilder),
    /// Text node.
    Text(String),
}

/// Builder for an element subtree.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementBuilder {
    tag: String,
    attributes: Vec<(String, String)>,
    children: Vec<Child>,
}

impl ElementBuilder {
    /// Start an element with the given tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Set an attribute (builder).
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Shorthand for the `name` attribute (builder).
    pub fn name(self, name: impl Into<String>) -> Self {
        self.attr("name", name)
    }

    /// Append a child element (builder).
    pub fn child(mut self, child: ElementBuilder) -> Self {
        self.children.push(Child::Element(child));
        self
    }

    /// Append several child elements (builder).
    pub fn children(mut self, children: impl IntoIterator<Item = ElementBuilder>) -> Self {
        self.children
            .extend(children.into_iter().map(Child::Element));
        self
    }

    /// Append a text child (builder).
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Child::Text(text.into()));
        self
    }

    /// The element tag.
    pub fn tag(&self) -> &str {
        &self.tag
    }
}

impl Dom {
    /// Materialize a builder into a new detached subtree, returning its root.
    pub fn build(&mut self, builder: &ElementBuilder) -> NodeId {
        let mut data = NodeData::element(builder.tag.as_str());
        for (name, value) in &builder.attributes {
            data.set_attribute(name, value);
        }
        let id = self.create(data);
        for child in &builder.children {
            let child_id = match child {
                Child::Element(element) => self.build(element),
                Child::Text(text) => self.create_text(text),
            };
            // Both ids are fresh, so this cannot fail.
            let _ = self.append_child(id, child_id);
        }
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_nested_tree() {
        let mut dom = Dom::new();
        let ul = dom.build(
            &ElementBuilder::new("ul")
                .attr("class", "people")
                .child(ElementBuilder::new("li").name("rows[]").text("row"))
                .text("tail"),
        );
        let data = dom.get(ul).unwrap();
        assert_eq!(data.tag(), Some("ul"));
        assert!(data.has_class("people"));
        assert_eq!(dom.children(ul).len(), 2);
        let li = dom.children(ul)[0];
        assert_eq!(dom.get(li).unwrap().attribute("name").as_deref(), Some("rows[]"));
        assert_eq!(dom.text_content(ul), "rowtail");
    }

    #[test]
    fn build_is_detached() {
        let mut dom = Dom::new();
        let id = dom.build(&ElementBuilder::new("div"));
        assert_eq!(dom.parent(id), None);
    }

    #[test]
    fn children_appends_all() {
        let builder = ElementBuilder::new("select").children(
            ["a", "b"].map(|v| ElementBuilder::new("option").text(v)),
        );
        let mut dom = Dom::new();
        let id = dom.build(&builder);
        assert_eq!(dom.children(id).len(), 2);
        assert_eq!(builder.tag(), "select");
    }
}
