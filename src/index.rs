//! Placeholder index: logical name to binding targets.
//!
//! Built by walking a view's subtree (the root itself excluded) in tree
//! order. Named nodes register under each of their names and the walk
//! continues into them. A node with any `[]` name becomes a list binding and
//! the walk does not descend into the template.
//!
//! On rebuild, list bindings whose anchor is still inside the root are kept
//! (with their live items) and re-registered at the anchor's position; their
//! item subtrees belong to the sub-views and are skipped.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use tracing::{debug, warn};

use crate::document::Document;
use crate::dom::NodeId;
use crate::error::BindError;
use crate::list::ListBinding;
use crate::names::parse_names;

/// Something a name can resolve to.
#[derive(Debug, Clone)]
pub enum Target {
    Node(NodeId),
    List(Rc<ListBinding>),
}

impl Target {
    /// The node, for node targets.
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Target::Node(node) => Some(*node),
            Target::List(_) => None,
        }
    }

    /// The list binding, for list targets.
    pub fn list(&self) -> Option<&Rc<ListBinding>> {
        match self {
            Target::List(list) => Some(list),
            Target::Node(_) => None,
        }
    }
}

impl PartialEq for Target {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Target::Node(a), Target::Node(b)) => a == b,
            (Target::List(a), Target::List(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Map from logical name to its targets, in tree order.
#[derive(Debug, Clone, Default)]
pub struct PlaceholderIndex {
    by_name: HashMap<String, Vec<Target>>,
    order: Vec<String>,
    lists: Vec<Rc<ListBinding>>,
}

impl PlaceholderIndex {
    /// Index the subtree under `root`, keeping list bindings from `previous`
    /// whose anchors are still inside it.
    pub fn build(doc: &Document, root: NodeId, previous: &PlaceholderIndex) -> Self {
        let config = doc.config();
        let name_attributes = config.name_attribute_refs();
        let mut index = PlaceholderIndex::default();

        doc.with_mut(|dom| {
            let retained: HashMap<NodeId, Rc<ListBinding>> = previous
                .lists
                .iter()
                .filter(|list| dom.is_ancestor_of(root, list.anchor()))
                .map(|list| (list.anchor(), list.clone()))
                .collect();
            let item_roots: HashSet<NodeId> =
                retained.values().flat_map(|list| list.item_roots()).collect();

            let mut stack: Vec<NodeId> = dom.children(root).iter().rev().copied().collect();
            while let Some(node) = stack.pop() {
                if let Some(list) = retained.get(&node) {
                    index.register_list(list.clone());
                    continue;
                }
                if item_roots.contains(&node) {
                    continue;
                }
                let raw = dom
                    .get(node)
                    .and_then(|data| name_attributes.iter().find_map(|attr| data.attribute(attr)));
                if let Some(raw) = raw {
                    let names = parse_names(&raw);
                    if names.iter().any(|name| name.list) {
                        let all = names.into_iter().map(|name| name.name).collect();
                        match ListBinding::attach(
                            dom,
                            node,
                            all,
                            &name_attributes,
                            &config.key_field,
                            &config.readonly_attribute,
                        ) {
                            Ok(list) => index.register_list(Rc::new(list)),
                            Err(err) => warn!(%err, "could not turn node into a list binding"),
                        }
                        continue;
                    }
                    for name in names {
                        index.register(name.name, Target::Node(node));
                    }
                }
                stack.extend(dom.children(node).iter().rev().copied());
            }
        });

        debug!(
            ?root,
            names = index.order.len(),
            lists = index.lists.len(),
            "placeholder index built"
        );
        index
    }

    fn register(&mut self, name: String, target: Target) {
        match self.by_name.get_mut(&name) {
            Some(targets) => targets.push(target),
            None => {
                self.order.push(name.clone());
                self.by_name.insert(name, vec![target]);
            }
        }
    }

    fn register_list(&mut self, list: Rc<ListBinding>) {
        for name in list.names() {
            self.register(name.clone(), Target::List(list.clone()));
        }
        self.lists.push(list);
    }

    /// Targets registered under `name`.
    pub fn lookup(&self, name: &str) -> Option<&[Target]> {
        self.by_name.get(name).map(Vec::as_slice)
    }

    /// The single target registered under `name`.
    pub fn unique(&self, name: &str) -> Result<&Target, BindError> {
        match self.lookup(name) {
            None => Err(BindError::NotFound(name.to_owned())),
            Some([target]) => Ok(target),
            Some(targets) => Err(BindError::NotUnique {
                name: name.to_owned(),
                count: targets.len(),
            }),
        }
    }

    /// Names in first-seen tree order.
    pub fn names(&self) -> &[String] {
        &self.order
    }

    /// List bindings in tree order.
    pub fn lists(&self) -> &[Rc<ListBinding>] {
        &self.lists
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
