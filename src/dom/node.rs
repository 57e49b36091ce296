//! Node types: NodeId, NodeKind, NodeData.

use std::fmt;

use slotmap::new_key_type;

use crate::event::Listener;

new_key_type! {
    /// Unique identifier for a document node. Copy, lightweight (u64).
    pub struct NodeId;
}

/// What a node is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// A tagged element (`div`, `li`, ...).
    Element { tag: String },
    /// A text node.
    Text(String),
    /// An invisible position marker used by control directives. An optional
    /// label is kept for debugging output.
    Anchor(Option<String>),
}

/// Data associated with a single document node.
#[derive(Clone)]
pub struct NodeData {
    pub kind: NodeKind,
    /// Attributes in the order they were first set.
    pub attributes: Vec<(String, String)>,
    /// Inline style properties in the order they were first set.
    pub styles: Vec<(String, String)>,
    /// Event listeners in registration order.
    pub listeners: Vec<(String, Listener)>,
}

impl NodeData {
    fn with_kind(kind: NodeKind) -> Self {
        Self {
            kind,
            attributes: Vec::new(),
            styles: Vec::new(),
            listeners: Vec::new(),
        }
    }

    pub fn element(tag: impl Into<String>) -> Self {
        Self::with_kind(NodeKind::Element { tag: tag.into() })
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::with_kind(NodeKind::Text(text.into()))
    }

    pub fn anchor(label: Option<&str>) -> Self {
        Self::with_kind(NodeKind::Anchor(label.map(str::to_owned)))
    }

    /// Set an attribute (builder).
    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.set_attribute(name, Some(value));
        self
    }

    /// The element tag, if this is an element.
    pub fn tag(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element { tag } => Some(tag),
            _ => None,
        }
    }

    pub fn is_anchor(&self) -> bool {
        matches!(self.kind, NodeKind::Anchor(_))
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        lookup(&self.attributes, name)
    }

    pub fn style(&self, property: &str) -> Option<&str> {
        lookup(&self.styles, property)
    }

    /// Set or, with `None`, remove an attribute. An existing attribute keeps
    /// its position.
    pub fn set_attribute(&mut self, name: &str, value: Option<&str>) {
        assign(&mut self.attributes, name, value);
    }

    pub fn set_style(&mut self, property: &str, value: Option<&str>) {
        assign(&mut self.styles, property, value);
    }

    /// Whether the space-separated `class` attribute contains `class`.
    pub fn has_class(&self, class: &str) -> bool {
        self.attribute("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }
}

fn lookup<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

fn assign(pairs: &mut Vec<(String, String)>, key: &str, value: Option<&str>) {
    let existing = pairs.iter().position(|(k, _)| k == key);
    match (existing, value) {
        (Some(index), Some(value)) => pairs[index].1 = value.to_owned(),
        (Some(index), None) => {
            pairs.remove(index);
        }
        (None, Some(value)) => pairs.push((key.to_owned(), value.to_owned())),
        (None, None) => {}
    }
}

impl fmt::Debug for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeData")
            .field("kind", &self.kind)
            .field("attributes", &self.attributes)
            .field("styles", &self.styles)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
