//! Pilot: programmatic interaction with a view.
//!
//! The `Pilot` wraps a [`View`] and simulates user input against its named
//! placeholders: clicks, key presses, typing and toggling checkables. Events
//! are dispatched through the document so listeners and bubbling behave as
//! they do for real input.

use crate::dom::{Event, NodeId};
use crate::index::Target;
use crate::view::View;

use super::snapshot;

/// A headless input driver for a view.
///
/// # Examples
///
/// ```ignore
/// use bindery::testing::Pilot;
///
/// let pilot = Pilot::new(&view);
/// pilot.type_text("first_name", "Ada");
/// pilot.press_key("first_name", "Enter");
/// ```
pub struct Pilot {
    view: View,
}

impl Pilot {
    pub fn new(view: &View) -> Self {
        Self { view: view.clone() }
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    /// The first node registered under `name`.
    ///
    /// # Panics
    ///
    /// Panics if `name` has no node target.
    pub fn node(&self, name: &str) -> NodeId {
        self.view
            .targets(name)
            .unwrap_or_default()
            .iter()
            .find_map(Target::node)
            .unwrap_or_else(|| panic!("no node named {name:?}"))
    }

    // ── Input simulation ─────────────────────────────────────────────

    /// Dispatch a `click` at the node named `name`.
    pub fn click(&self, name: &str) -> Event {
        let node = self.node(name);
        self.view.document().dispatch(Event::new("click", node))
    }

    /// Dispatch a `keydown` for `key` at the node named `name`.
    pub fn press_key(&self, name: &str, key: &str) -> Event {
        let node = self.node(name);
        self.view.document().dispatch(Event::key_down(node, key))
    }

    /// Replace the value of the control named `name` and dispatch `input`.
    pub fn type_text(&self, name: &str, text: &str) -> Event {
        let node = self.node(name);
        let doc = self.view.document();
        doc.with_mut(|dom| {
            if let Some(data) = dom.get_mut(node) {
                data.set_value(text);
            }
        });
        doc.dispatch(Event::new("input", node))
    }

    /// Set the checked state of the checkable named `name` and dispatch
    /// `change`.
    pub fn set_checked(&self, name: &str, checked: bool) -> Event {
        let node = self.node(name);
        let doc = self.view.document();
        doc.with_mut(|dom| {
            if let Some(data) = dom.get_mut(node) {
                data.set_checked(checked);
            }
        });
        doc.dispatch(Event::new("change", node))
    }

    // ── Inspection ───────────────────────────────────────────────────

    /// Text content of the node named `name`.
    pub fn text(&self, name: &str) -> String {
        let node = self.node(name);
        self.view.document().with(|dom| dom.text_content(node))
    }

    /// Outline of the whole view, for snapshots.
    pub fn outline(&self) -> String {
        snapshot::outline(self.view.document(), self.view.root())
    }
}
