//! Snapshot helpers.
//!
//! Render a subtree as an indented outline: one node per line, elements with
//! their classes and attributes, text nodes quoted, comments as `<!--..-->`.
//! Stable across runs, so suitable for `insta` snapshots.

use crate::document::Document;
use crate::dom::{Dom, NodeId, NodeKind};

const INDENT: &str = "  ";

/// Outline of `node` and its descendants.
///
/// # Examples
///
/// ```ignore
/// let text = outline(&doc, view.root());
/// insta::assert_snapshot!(text, @r#"
/// ul
///   li "a"
///   <!--><-->
/// "#);
/// ```
pub fn outline(doc: &Document, node: NodeId) -> String {
    doc.with(|dom| {
        let mut lines = Vec::new();
        write_outline(dom, node, 0, &mut lines);
        lines.join("\n")
    })
}

/// Markup of the children of `node`.
pub fn inner_markup(doc: &Document, node: NodeId) -> String {
    doc.with(|dom| dom.inner_markup(node))
}

fn write_outline(dom: &Dom, node: NodeId, depth: usize, lines: &mut Vec<String>) {
    let Some(data) = dom.get(node) else {
        return;
    };
    let pad = INDENT.repeat(depth);
    match &data.kind {
        NodeKind::Text(text) => lines.push(format!("{pad}{text:?}")),
        NodeKind::Comment(text) => lines.push(format!("{pad}<!--{text}-->")),
        NodeKind::Element(tag) => {
            let mut line = format!("{pad}{tag}");
            if !data.classes.is_empty() {
                line.push_str(&format!(".{}", data.classes.join(".")));
            }
            for (name, value) in &data.attributes {
                line.push_str(&format!(" {name}={value:?}"));
            }
            // A lone text child goes on the element's line.
            let children = dom.children(node);
            if let [only] = children {
                if let Some(NodeKind::Text(text)) = dom.get(*only).map(|d| &d.kind) {
                    line.push_str(&format!(" {text:?}"));
                    lines.push(line);
                    return;
                }
            }
            lines.push(line);
            for &child in children {
                write_outline(dom, child, depth + 1, lines);
            }
        }
    }
}
