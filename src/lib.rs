//! # bindery
//!
//! Declarative data binding for a retained node tree.
//!
//! Mark nodes with a naming attribute (`name="title"`, `data-name="rows[]"`),
//! wrap a subtree in a [`View`], and push plain records into it. Each name is
//! routed to its placeholders: text content, form controls through type
//! adapters, directive objects for attributes, properties, classes and
//! listeners, and keyed list bindings that reuse item subtrees across pushes.
//! Reading a view collects the current values back into a record.
//!
//! ## Core Systems
//!
//! - **[`dom`]**: Slotmap-backed node arena: elements, text, comments, listeners
//! - **[`document`]**: Shared tree handle with event dispatch and removal notices
//! - **[`names`]**: logos lexer for naming attributes
//! - **[`index`]**: Placeholder index: name to node or list targets
//! - **[`view`]**: Push, read, scoping, presentation and keyboard helpers
//! - **[`list`]**: Keyed list reconciliation
//! - **[`directive`]**: Attribute, property, class and listener directives
//! - **[`adapter`]**: Per-kind value adapters and their registry
//! - **[`template`]**: Template lookup and instantiation
//! - **[`pending`]**: Handles for deferred values in flight
//!
//! ## Example
//!
//! ```ignore
//! use bindery::{record, Document, ElementBuilder, View};
//!
//! let doc = Document::new();
//! let root = doc.build(
//!     &ElementBuilder::new("form")
//!         .child(ElementBuilder::new("h1").name("title"))
//!         .child(ElementBuilder::new("input").name("first_name")),
//! );
//! let view = View::from_root(&doc, root);
//! view.set_data(&record! { "title" => "Edit", "first_name" => "Ada" });
//! assert_eq!(view.read_all(), record! { "first_name" => "Ada" });
//! ```

// Foundation
pub mod config;
pub mod error;
pub mod value;

// Tree
pub mod document;
pub mod dom;

// Binding
pub mod adapter;
pub mod directive;
pub mod index;
pub mod list;
pub mod names;
pub mod pending;
pub mod template;
pub mod view;

// Testing
pub mod testing;

pub use adapter::{FnAdapter, TypeAdapter, TypeAdapterRegistry};
pub use config::BindingConfig;
pub use document::Document;
pub use dom::{ElementBuilder, Event, Handler, NodeId};
pub use error::{BindError, DomError};
pub use list::{ListBinding, PassStats};
pub use pending::{settle, Pending};
pub use template::TemplateStore;
pub use value::{Deferred, ItemKey, Record, Value};
pub use view::{Content, View, Visibility};

// Proc macros (feature-gated)
#[cfg(feature = "macros")]
pub use bindery_macros::markup;
