//! DOM queries: by id, by attribute, by class.

use super::node::{NodeData, NodeId};
use super::tree::Dom;

impl Dom {
    /// Find the first node whose `id` attribute matches.
    ///
    /// Searches the whole arena, detached nodes included, so templates kept
    /// outside the live tree are found too.
    pub fn query_by_id(&self, id: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(_, data)| data.attributes.get("id").map(String::as_str) == Some(id))
            .map(|(node_id, _)| node_id)
    }

    /// Descendants of `root` (excluding `root`) carrying any of `attributes`,
    /// in tree order.
    pub fn query_by_attribute(&self, root: NodeId, attributes: &[&str]) -> Vec<NodeId> {
        self.query_all(root, |data| {
            attributes.iter().any(|name| data.has_attribute(name))
        })
    }

    /// Descendants of `root` (excluding `root`) having `class`, in tree order.
    pub fn query_by_class(&self, root: NodeId, class: &str) -> Vec<NodeId> {
        self.query_all(root, |data| data.has_class(class))
    }

    /// Descendants of `root` (excluding `root`) matching a predicate, in tree order.
    pub fn query_all(&self, root: NodeId, predicate: impl Fn(&NodeData) -> bool) -> Vec<NodeId> {
        self.walk_depth_first(root)
            .into_iter()
            .skip(1)
            .filter(|&id| self.get(id).is_some_and(&predicate))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::dom::node::NodeData;
    use crate::dom::tree::Dom;

    /// Build a test tree for queries:
    /// ```text
    ///   form (#signup)
    ///    ├── input name="first" .field
    ///    ├── div data-name="extra"
    ///    │    └── input name="second" .field
    ///    └── button .btn
    /// ```
    fn build_query_tree() -> Dom {
        let mut dom = Dom::new();
        let form = dom.create(NodeData::element("form").with_attr("id", "signup"));
        dom.insert_child(
            form,
            NodeData::element("input")
                .with_attr("name", "first")
                .with_class("field"),
        )
        .unwrap();
        let extra = dom
            .insert_child(form, NodeData::element("div").with_attr("data-name", "extra"))
            .unwrap();
        dom.insert_child(
            extra,
            NodeData::element("input")
                .with_attr("name", "second")
                .with_class("field"),
        )
        .unwrap();
        dom.insert_child(form, NodeData::element("button").with_class("btn"))
            .unwrap();
        dom.set_root(form);
        dom
    }

    #[test]
    fn query_by_id_found() {
        let dom = build_query_tree();
        let id = dom.query_by_id("signup").unwrap();
        assert_eq!(dom.get(id).unwrap().tag(), Some("form"));
    }

    #[test]
    fn query_by_id_finds_detached() {
        let mut dom = build_query_tree();
        let tpl = dom.create(NodeData::element("template").with_attr("id", "row"));
        assert_eq!(dom.query_by_id("row"), Some(tpl));
    }

    #[test]
    fn query_by_id_not_found() {
        let dom = build_query_tree();
        assert!(dom.query_by_id("nonexistent").is_none());
    }

    #[test]
    fn query_by_attribute_tree_order() {
        let dom = build_query_tree();
        let root = dom.root().unwrap();
        let named = dom.query_by_attribute(root, &["name", "data-name"]);
        let names: Vec<_> = named
            .iter()
            .map(|&id| {
                let data = dom.get(id).unwrap();
                data.attribute("name")
                    .or_else(|| data.attribute("data-name"))
                    .unwrap()
            })
            .collect();
        assert_eq!(names, vec!["first", "extra", "second"]);
    }

    #[test]
    fn query_excludes_root() {
        let mut dom = build_query_tree();
        let root = dom.root().unwrap();
        dom.get_mut(root).unwrap().set_attribute("name", "form");
        assert_eq!(dom.query_by_attribute(root, &["name"]).len(), 2);
    }

    #[test]
    fn query_by_class() {
        let dom = build_query_tree();
        let root = dom.root().unwrap();
        assert_eq!(dom.query_by_class(root, "field").len(), 2);
        assert_eq!(dom.query_by_class(root, "btn").len(), 1);
        assert!(dom.query_by_class(root, "missing").is_empty());
    }

    #[test]
    fn query_all_custom_predicate() {
        let dom = build_query_tree();
        let root = dom.root().unwrap();
        let inputs = dom.query_all(root, |data| data.tag() == Some("input"));
        assert_eq!(inputs.len(), 2);
    }

    #[test]
    fn query_on_empty_dom() {
        let dom = Dom::new();
        assert!(dom.query_by_id("x").is_none());
    }
}
