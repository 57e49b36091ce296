//! Live bound nodes and their subscription ledgers.
//!
//! Every render produces a tree of [`BoundNode`]s in a [`BoundTree`] arena.
//! A bound node owns the document nodes it created, the ids of its child
//! bound nodes, and a ledger of every subscription it registered. Tearing a
//! node down flushes its ledger, tears down its children, and only then
//! removes its own document nodes.

use std::fmt;
use std::rc::Rc;

use slotmap::{new_key_type, SlotMap};

use crate::dom::{Document, NodeId};
use crate::reactive::{Collection, Model, SubscriptionId};
use crate::view::controller::Controller;

new_key_type! {
    /// Identifier of a bound node within one render.
    pub struct BoundId;
}

/// Channel name used in ledgers for a collection's structural channel.
pub const STRUCTURE_CHANNEL: &str = "structure";

/// What a bound node was compiled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundKind {
    Element,
    Text,
    /// A control directive: anchor, own subscription, rebuildable content.
    Switch,
    /// A live collection: anchor, structural subscription, one child per item.
    List,
    /// Sibling fragments with no document node of their own.
    Group,
    /// Subscriptions for the tail of a nested property path.
    Watch,
    /// A subview with its own scope.
    View,
}

/// The object a subscription was registered on.
#[derive(Clone)]
pub enum Source {
    Model(Rc<dyn Model>),
    Collection(Collection),
}

/// One ledger entry.
#[derive(Clone)]
pub struct Subscription {
    pub source: Source,
    pub channel: String,
    pub id: SubscriptionId,
}

impl Subscription {
    pub fn cancel(&self) {
        match &self.source {
            Source::Model(model) => model.unsubscribe(&self.channel, self.id),
            Source::Collection(collection) => collection.unsubscribe(self.id),
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("channel", &self.channel)
            .field("id", &self.id)
            .finish()
    }
}

/// Model and controller a node was compiled against.
#[derive(Clone)]
pub struct Scope {
    pub model: Rc<dyn Model>,
    pub controller: Rc<dyn Controller>,
    /// Number of enclosing subviews.
    pub depth: usize,
}

impl Scope {
    pub fn new(model: Rc<dyn Model>, controller: Rc<dyn Controller>) -> Self {
        Self {
            model,
            controller,
            depth: 0,
        }
    }

    /// Same controller and depth, different model.
    pub fn with_model(&self, model: Rc<dyn Model>) -> Self {
        Self {
            model,
            controller: self.controller.clone(),
            depth: self.depth,
        }
    }
}

pub struct BoundNode {
    pub kind: BoundKind,
    /// The document node this bound node created: the element, the text
    /// node, or the anchor of a switch or list.
    pub dom: Option<NodeId>,
    pub parent: Option<BoundId>,
    pub children: Vec<BoundId>,
    pub ledger: Vec<Subscription>,
    pub scope: Scope,
}

impl BoundNode {
    pub fn new(kind: BoundKind, dom: Option<NodeId>, scope: Scope) -> Self {
        Self {
            kind,
            dom,
            parent: None,
            children: Vec::new(),
            ledger: Vec::new(),
            scope,
        }
    }
}

impl fmt::Debug for BoundNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundNode")
            .field("kind", &self.kind)
            .field("dom", &self.dom)
            .field("children", &self.children)
            .field("ledger", &self.ledger)
            .finish()
    }
}

/// Arena of the bound nodes of one render.
#[derive(Debug, Default)]
pub struct BoundTree {
    nodes: SlotMap<BoundId, BoundNode>,
}

impl BoundTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node with no parent.
    pub fn insert(&mut self, node: BoundNode) -> BoundId {
        self.nodes.insert(node)
    }

    /// Insert `node` as the last child of `parent`.
    pub fn adopt(&mut self, parent: BoundId, node: BoundNode) -> BoundId {
        let index = self.nodes.get(parent).map_or(0, |p| p.children.len());
        self.adopt_at(parent, index, node)
    }

    /// Insert `node` as child `index` of `parent` (clamped). If `parent` is
    /// gone the node is inserted unparented.
    pub fn adopt_at(&mut self, parent: BoundId, index: usize, mut node: BoundNode) -> BoundId {
        let has_parent = self.nodes.contains_key(parent);
        if has_parent {
            node.parent = Some(parent);
        }
        let id = self.nodes.insert(node);
        if let Some(p) = self.nodes.get_mut(parent) {
            let index = index.min(p.children.len());
            p.children.insert(index, id);
        }
        id
    }

    /// Add a subscription to `owner`'s ledger. If `owner` no longer exists
    /// the subscription is cancelled on the spot.
    pub fn record(&mut self, owner: BoundId, subscription: Subscription) {
        match self.nodes.get_mut(owner) {
            Some(node) => node.ledger.push(subscription),
            None => subscription.cancel(),
        }
    }

    pub fn contains(&self, id: BoundId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get(&self, id: BoundId) -> Option<&BoundNode> {
        self.nodes.get(id)
    }

    pub fn children(&self, id: BoundId) -> &[BoundId] {
        self.nodes
            .get(id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Tear `id` down: cancel its ledger, tear down its children, remove its
    /// document node, unlink it from its parent. Missing ids are ignored.
    pub fn teardown(&mut self, id: BoundId, doc: &mut dyn Document) {
        let Some(node) = self.nodes.remove(id) else {
            return;
        };
        for subscription in &node.ledger {
            subscription.cancel();
        }
        for &child in &node.children {
            self.teardown(child, doc);
        }
        if let Some(dom) = node.dom {
            doc.remove(dom);
        }
        if let Some(parent) = node.parent.and_then(|p| self.nodes.get_mut(p)) {
            parent.children.retain(|&c| c != id);
        }
    }

    /// The last document node in tree order produced by `id`, if any.
    /// Watch nodes produce none.
    pub fn last_node(&self, id: BoundId) -> Option<NodeId> {
        let node = self.nodes.get(id)?;
        match node.kind {
            BoundKind::Element | BoundKind::Text => node.dom,
            BoundKind::Watch => None,
            BoundKind::Switch | BoundKind::List => self.last_of(&node.children).or(node.dom),
            BoundKind::Group | BoundKind::View => self.last_of(&node.children),
        }
    }

    /// Last document node among `ids`, scanning from the end.
    pub fn last_of(&self, ids: &[BoundId]) -> Option<NodeId> {
        ids.iter().rev().find_map(|&child| self.last_node(child))
    }

    /// Ledger entries held by `id` and every descendant.
    pub fn subscription_count(&self, id: BoundId) -> usize {
        self.nodes.get(id).map_or(0, |node| {
            node.ledger.len()
                + node
                    .children
                    .iter()
                    .map(|&c| self.subscription_count(c))
                    .sum::<usize>()
        })
    }

    /// `id` plus all its descendants.
    pub fn bound_count(&self, id: BoundId) -> usize {
        self.nodes.get(id).map_or(0, |node| {
            1 + node
                .children
                .iter()
                .map(|&c| self.bound_count(c))
                .sum::<usize>()
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
