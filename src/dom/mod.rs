//! Node arena: the render tree the binding layer mutates.
//!
//! A slotmap-backed stand-in for a host UI substrate: elements with attributes,
//! classes and a property bag, text and comment nodes, listeners, queries and
//! markup serialization.

pub mod builder;
pub mod event;
pub mod markup;
pub mod node;
pub mod query;
pub mod tree;

pub use builder::{Child, ElementBuilder};
pub use event::{Event, Handler, ListenerId, REMOVE_EVENT};
pub use node::{NodeData, NodeId, NodeKind};
pub use tree::Dom;
