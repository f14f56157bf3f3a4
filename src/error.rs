//! Error types.

use crate::dom::NodeId;

/// Errors from tree mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("node {0:?} does not exist")]
    UnknownNode(NodeId),
    #[error("node {0:?} has no parent")]
    NotAttached(NodeId),
    #[error("node {child:?} is not a child of {parent:?}")]
    NotAChild { parent: NodeId, child: NodeId },
    #[error("inserting {node:?} would make it its own ancestor")]
    Cycle { node: NodeId },
}

/// Errors surfaced by views and templates.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindError {
    #[error("placeholder not found: {0}")]
    NotFound(String),
    #[error("placeholder {name} must be unique, found {count} targets")]
    NotUnique { name: String, count: usize },
    #[error("placeholder {0} is a list binding, not a node")]
    NotANode(String),
    #[error("template not found: {0}")]
    TemplateNotFound(String),
    #[error("deferred value for {0} was not applied")]
    Deferred(String),
    #[error(transparent)]
    Dom(#[from] DomError),
}
