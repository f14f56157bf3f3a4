//! Markup serialization.
//!
//! Produces HTML-like text for a subtree. Used for `innerHTML`-style reads of
//! content-editable nodes and for snapshot assertions in tests. Attributes are
//! emitted in sorted order, with `class` first, so output is deterministic.

use super::node::{NodeId, NodeKind};
use super::tree::Dom;

impl Dom {
    /// Serialize the children of `node`.
    pub fn inner_markup(&self, node: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(node) {
            self.write_markup(child, &mut out);
        }
        out
    }

    /// Serialize `node` itself and its children.
    pub fn outer_markup(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_markup(node, &mut out);
        out
    }

    fn write_markup(&self, node: NodeId, out: &mut String) {
        let Some(data) = self.get(node) else {
            return;
        };
        match &data.kind {
            NodeKind::Text(text) => out.push_str(&escape(text, false)),
            NodeKind::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            NodeKind::Element(tag) => {
                out.push('<');
                out.push_str(tag);
                if !data.classes.is_empty() {
                    out.push_str(&format!(" class=\"{}\"", escape(&data.classes.join(" "), true)));
                }
                for (name, value) in &data.attributes {
                    out.push_str(&format!(" {}=\"{}\"", name, escape(value, true)));
                }
                out.push('>');
                for &child in self.children(node) {
                    self.write_markup(child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }
}

fn escape(text: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}
