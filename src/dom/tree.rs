//! Tree operations: insert, attach, remove, walk.

use std::collections::VecDeque;

use slotmap::{SecondaryMap, SlotMap};

use super::node::{NodeData, NodeId, NodeKind};
use crate::event::Listener;

/// Empty slice constant for returning when a node has no children.
const EMPTY_CHILDREN: &[NodeId] = &[];

/// The in-memory document, backed by a slotmap arena.
///
/// All nodes live in a single `SlotMap`. Parent/child relationships are stored
/// in secondary maps so that node removal is O(subtree size) and lookup is O(1).
/// A freshly created node is detached until it is appended or inserted.
pub struct Dom {
    pub(crate) nodes: SlotMap<NodeId, NodeData>,
    children: SecondaryMap<NodeId, Vec<NodeId>>,
    parent: SecondaryMap<NodeId, NodeId>,
}

impl Dom {
    /// Create an empty document.
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            children: SecondaryMap::new(),
            parent: SecondaryMap::new(),
        }
    }

    /// Insert a detached node.
    pub fn insert(&mut self, data: NodeData) -> NodeId {
        let id = self.nodes.insert(data);
        self.children.insert(id, Vec::new());
        id
    }

    /// Insert a node as the last child of `parent`.
    pub fn insert_child(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        let id = self.insert(data);
        self.append_child(parent, id);
        id
    }

    /// Move `node` to the end of `parent`'s children, detaching it first.
    /// Does nothing if either node is missing.
    pub fn append_child(&mut self, parent: NodeId, node: NodeId) {
        if !self.nodes.contains_key(parent) || !self.nodes.contains_key(node) {
            return;
        }
        self.detach(node);
        self.parent.insert(node, parent);
        if let Some(siblings) = self.children.get_mut(parent) {
            siblings.push(node);
        }
    }

    /// Move `node` to directly after `reference` under the same parent.
    ///
    /// If `reference` is detached, `node` is only detached.
    pub fn insert_after(&mut self, reference: NodeId, node: NodeId) {
        if !self.nodes.contains_key(reference) || !self.nodes.contains_key(node) {
            return;
        }
        self.detach(node);
        let Some(parent) = self.parent(reference) else {
            return;
        };
        self.parent.insert(node, parent);
        if let Some(siblings) = self.children.get_mut(parent) {
            let index = siblings
                .iter()
                .position(|&child| child == reference)
                .map_or(siblings.len(), |i| i + 1);
            siblings.insert(index, node);
        }
    }

    /// Unlink `node` from its parent, keeping its subtree.
    pub fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.parent.remove(node) {
            if let Some(siblings) = self.children.get_mut(parent) {
                siblings.retain(|&child| child != node);
            }
        }
    }

    /// Remove a node and all its descendants recursively.
    ///
    /// Returns the `NodeData` for the removed node, or `None` if it didn't exist.
    pub fn remove(&mut self, id: NodeId) -> Option<NodeData> {
        if !self.nodes.contains_key(id) {
            return None;
        }
        self.detach(id);

        // Collect all descendants (BFS) to remove them.
        let mut to_remove = VecDeque::new();
        to_remove.push_back(id);
        let mut removed_root_data = None;

        while let Some(current) = to_remove.pop_front() {
            if let Some(kids) = self.children.remove(current) {
                to_remove.extend(kids);
            }
            self.parent.remove(current);
            let data = self.nodes.remove(current);
            if current == id {
                removed_root_data = data;
            }
        }

        removed_root_data
    }

    /// Get the parent of a node, if it has one.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parent.get(id).copied()
    }

    /// Get the children of a node. Returns an empty slice if the node has no children
    /// or does not exist.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.children
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or(EMPTY_CHILDREN)
    }

    /// Walk from `id` up to the topmost ancestor, collecting ancestor node ids.
    ///
    /// The returned vec does **not** include `id` itself; it starts with the
    /// immediate parent.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut current = id;
        while let Some(p) = self.parent.get(current).copied() {
            result.push(p);
            current = p;
        }
        result
    }

    /// Immutable access to a node's data.
    pub fn get(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id)
    }

    /// Mutable access to a node's data.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.nodes.get_mut(id)
    }

    /// Number of nodes in the document, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether the document contains a node with the given id.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Pre-order depth-first traversal starting from `start`.
    pub fn walk_depth_first(&self, start: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if !self.nodes.contains_key(current) {
                continue;
            }
            result.push(current);
            // Push children in reverse so the first child is visited first.
            stack.extend(self.children(current).iter().rev());
        }
        result
    }

    /// Concatenated text of every text node under `id`, in tree order.
    pub fn text_content(&self, id: NodeId) -> String {
        self.walk_depth_first(id)
            .into_iter()
            .filter_map(|node| match &self.nodes[node].kind {
                NodeKind::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Listeners registered on `id` for `event`, cloned out so the caller
    /// can release its borrow before invoking them.
    pub fn listeners(&self, id: NodeId, event: &str) -> Vec<Listener> {
        self.nodes.get(id).map_or_else(Vec::new, |data| {
            data.listeners
                .iter()
                .filter(|(name, _)| name == event)
                .map(|(_, listener)| listener.clone())
                .collect()
        })
    }
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}
