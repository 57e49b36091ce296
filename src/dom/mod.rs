//! Document interface and the slotmap-backed reference document.
//!
//! The compiler only ever talks to a [`Document`]; [`Dom`] is the in-memory
//! implementation used by the renderer's tests and the [`testing`](crate::testing)
//! harness.

pub mod node;
pub mod query;
pub mod tree;

pub use node::{NodeData, NodeId, NodeKind};
pub use tree::Dom;

use crate::event::Listener;

/// Minimal node-construction interface the compiler renders into.
///
/// Every operation on a missing node is a no-op.
pub trait Document {
    fn create_element(&mut self, tag: &str) -> NodeId;
    fn create_text(&mut self, text: &str) -> NodeId;
    /// An invisible position marker. `label` is kept for debugging output.
    fn create_anchor(&mut self, label: Option<&str>) -> NodeId;
    /// Set an attribute, or remove it with `None`.
    fn set_attribute(&mut self, node: NodeId, name: &str, value: Option<&str>);
    /// Set an inline style property, or remove it with `None`.
    fn set_style(&mut self, node: NodeId, property: &str, value: Option<&str>);
    fn set_text(&mut self, node: NodeId, text: &str);
    fn add_listener(&mut self, node: NodeId, event: &str, listener: Listener);
    fn append_child(&mut self, parent: NodeId, node: NodeId);
    /// Place `node` directly after `reference` under the same parent.
    fn insert_after(&mut self, reference: NodeId, node: NodeId);
    /// Remove `node` and its subtree.
    fn remove(&mut self, node: NodeId);
}

impl Document for Dom {
    fn create_element(&mut self, tag: &str) -> NodeId {
        self.insert(NodeData::element(tag))
    }

    fn create_text(&mut self, text: &str) -> NodeId {
        self.insert(NodeData::text(text))
    }

    fn create_anchor(&mut self, label: Option<&str>) -> NodeId {
        self.insert(NodeData::anchor(label))
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: Option<&str>) {
        if let Some(data) = self.get_mut(node) {
            data.set_attribute(name, value);
        }
    }

    fn set_style(&mut self, node: NodeId, property: &str, value: Option<&str>) {
        if let Some(data) = self.get_mut(node) {
            data.set_style(property, value);
        }
    }

    fn set_text(&mut self, node: NodeId, text: &str) {
        if let Some(NodeData {
            kind: NodeKind::Text(current),
            ..
        }) = self.get_mut(node)
        {
            text.clone_into(current);
        }
    }

    fn add_listener(&mut self, node: NodeId, event: &str, listener: Listener) {
        if let Some(data) = self.get_mut(node) {
            data.listeners.push((event.to_owned(), listener));
        }
    }

    fn append_child(&mut self, parent: NodeId, node: NodeId) {
        Dom::append_child(self, parent, node);
    }

    fn insert_after(&mut self, reference: NodeId, node: NodeId) {
        Dom::insert_after(self, reference, node);
    }

    fn remove(&mut self, node: NodeId) {
        Dom::remove(self, node);
    }
}
