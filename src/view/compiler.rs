//! Directive compiler.
//!
//! Turns template nodes into bound nodes inside one render's [`Runtime`],
//! creating document nodes and wiring model subscriptions as it goes.
//!
//! Every callback registered here holds a `Weak` reference to the runtime and
//! the id of the bound node that owns it. A callback whose runtime is gone, or
//! whose owner has been torn down, does nothing. Arena and document borrows
//! are never held while model code runs, so callbacks may trigger further
//! `set`s.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::bound::{BoundId, BoundKind, BoundNode, BoundTree, Scope, Source, Subscription, STRUCTURE_CHANNEL};
use super::controller::{Controller, ControllerLinks, Inert};
use super::registry::ViewRegistry;
use super::RenderError;
use crate::config::RenderConfig;
use crate::dom::{Document, NodeId};
use crate::event::{DomEvent, Listener};
use crate::reactive::{change_channel, Callback, Collection, CollectionChange, Model, Value};
use crate::template::{Attribute, ConditionKind, Element, Expr, IterationKind, Node, PropertyPath};

/// Where the next document node goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Cursor {
    /// Left unattached (the root element of a render).
    Detached,
    /// Appended as the last child of an element.
    Append(NodeId),
    /// Inserted directly after a sibling.
    After(NodeId),
}

impl Cursor {
    fn place(self, doc: &mut dyn Document, node: NodeId) {
        match self {
            Cursor::Detached => {}
            Cursor::Append(parent) => doc.append_child(parent, node),
            Cursor::After(reference) => doc.insert_after(reference, node),
        }
    }

    /// The cursor for the sibling following one whose last node is `last`.
    fn advance(self, last: Option<NodeId>) -> Cursor {
        match (self, last) {
            (Cursor::After(_), Some(last)) => Cursor::After(last),
            _ => self,
        }
    }
}

/// Walk `path` from `model`. Intermediate segments must hold models; the
/// last segment is read through [`Model::display`]. Any miss is `Null`.
pub fn resolve(model: &Rc<dyn Model>, path: &PropertyPath) -> Value {
    lookup(model, path, |model, property| model.display(property))
}

/// Like [`resolve`], but the last segment is read with [`Model::get`], so
/// formatters do not apply. Directives decide on raw values.
pub fn resolve_raw(model: &Rc<dyn Model>, path: &PropertyPath) -> Value {
    lookup(model, path, |model, property| model.get(property))
}

fn lookup(model: &Rc<dyn Model>, path: &PropertyPath, read: impl Fn(&Rc<dyn Model>, &str) -> Value) -> Value {
    let Some((last, init)) = path.segments().split_last() else {
        return Value::Null;
    };
    let mut current = model.clone();
    for segment in init {
        match current.get(segment) {
            Value::Model(next) => current = next,
            _ => return Value::Null,
        }
    }
    read(&current, last)
}

/// Attribute text for a bound value: `Null` and `false` remove the attribute.
fn attribute_text(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        other => Some(other.to_string()),
    }
}

/// Items a `- in` (or a non-collection `- collection`) renders one fragment
/// for.
fn iteration_items(value: &Value) -> Vec<Value> {
    match value {
        Value::List(items) => items.clone(),
        Value::Collection(collection) => collection.items(),
        other if other.is_truthy() => vec![other.clone()],
        _ => Vec::new(),
    }
}

/// The rebuildable control directives.
enum SwitchKind {
    Condition { invert: bool, body: Rc<[Node]> },
    Each { body: Rc<[Node]> },
    Collection { body: Rc<[Node]> },
    View { name: String },
}

struct SwitchState {
    kind: SwitchKind,
    path: PropertyPath,
    anchor: NodeId,
    content: Cell<Option<BoundId>>,
    /// Last truthiness a condition rendered with.
    shown: Cell<Option<bool>>,
}

/// State of one render: its document, arena, registry and configuration.
pub(crate) struct Runtime {
    document: Rc<RefCell<dyn Document>>,
    tree: RefCell<BoundTree>,
    registry: Rc<ViewRegistry>,
    config: RenderConfig,
}

impl Runtime {
    pub(crate) fn new(
        document: Rc<RefCell<dyn Document>>,
        registry: Rc<ViewRegistry>,
        config: RenderConfig,
    ) -> Rc<Self> {
        Rc::new(Self {
            document,
            tree: RefCell::new(BoundTree::new()),
            registry,
            config,
        })
    }

    pub(crate) fn is_live(&self, id: BoundId) -> bool {
        self.tree.borrow().contains(id)
    }

    pub(crate) fn teardown(&self, id: BoundId) {
        let mut doc = self.document.borrow_mut();
        self.tree.borrow_mut().teardown(id, &mut *doc);
    }

    pub(crate) fn subscription_count(&self, id: BoundId) -> usize {
        self.tree.borrow().subscription_count(id)
    }

    pub(crate) fn bound_count(&self, id: BoundId) -> usize {
        self.tree.borrow().bound_count(id)
    }

    /// Compile the root element of a render under a fresh group. On failure
    /// everything built so far is torn down again.
    pub(crate) fn compile_root(
        self: &Rc<Self>,
        scope: &Scope,
        element: &Element,
    ) -> Result<(BoundId, NodeId), RenderError> {
        let root = self
            .tree
            .borrow_mut()
            .insert(BoundNode::new(BoundKind::Group, None, scope.clone()));
        match self.compile_element(root, scope, element, Cursor::Detached) {
            Ok((_, node)) => Ok((root, node)),
            Err(err) => {
                self.teardown(root);
                Err(err)
            }
        }
    }

    fn with_doc<R>(&self, f: impl FnOnce(&mut dyn Document) -> R) -> R {
        f(&mut *self.document.borrow_mut())
    }

    fn adopt(&self, parent: BoundId, node: BoundNode) -> BoundId {
        self.tree.borrow_mut().adopt(parent, node)
    }

    fn last_node(&self, id: BoundId) -> Option<NodeId> {
        self.tree.borrow().last_node(id)
    }

    fn scope_of(&self, id: BoundId) -> Option<Scope> {
        self.tree.borrow().get(id).map(|node| node.scope.clone())
    }

    fn anchor(&self, cursor: Cursor) -> NodeId {
        let label = self.config.anchor_label.as_deref();
        self.with_doc(|doc| {
            let anchor = doc.create_anchor(label);
            cursor.place(doc, anchor);
            anchor
        })
    }

    /// Subscribe to `change:<property>` on `model`, recording the
    /// subscription in `owner`'s ledger.
    fn subscribe(&self, owner: BoundId, model: &Rc<dyn Model>, property: &str, callback: Callback<Value>) {
        let channel = change_channel(property);
        let id = model.subscribe(&channel, callback);
        self.tree.borrow_mut().record(
            owner,
            Subscription {
                source: Source::Model(model.clone()),
                channel,
                id,
            },
        );
    }

    /// Compile sibling nodes in order, advancing the cursor past each.
    fn compile_nodes(
        self: &Rc<Self>,
        parent: BoundId,
        scope: &Scope,
        nodes: &[Node],
        cursor: Cursor,
    ) -> Result<(), RenderError> {
        let mut cursor = cursor;
        for node in nodes {
            let id = self.compile_node(parent, scope, node, cursor)?;
            cursor = cursor.advance(self.last_node(id));
        }
        Ok(())
    }

    fn compile_node(
        self: &Rc<Self>,
        parent: BoundId,
        scope: &Scope,
        node: &Node,
        cursor: Cursor,
    ) -> Result<BoundId, RenderError> {
        match node {
            Node::Element(element) => self
                .compile_element(parent, scope, element, cursor)
                .map(|(id, _)| id),
            Node::Text(expr) => Ok(self.compile_text(parent, scope, expr, cursor)),
            Node::Conditional { kind, path, body } => {
                let kind = SwitchKind::Condition {
                    invert: *kind == ConditionKind::Unless,
                    body: body.clone(),
                };
                self.compile_switch(parent, scope, path, kind, cursor)
            }
            Node::Iteration { kind, path, body } => {
                let body = body.clone();
                let kind = match kind {
                    IterationKind::In => SwitchKind::Each { body },
                    IterationKind::Collection => SwitchKind::Collection { body },
                };
                self.compile_switch(parent, scope, path, kind, cursor)
            }
            Node::SubView { name, path: None } => {
                self.compile_view(parent, scope, scope.model.clone(), name, cursor)
            }
            Node::SubView {
                name,
                path: Some(path),
            } => {
                let kind = SwitchKind::View { name: name.clone() };
                self.compile_switch(parent, scope, path, kind, cursor)
            }
        }
    }

    fn compile_element(
        self: &Rc<Self>,
        parent: BoundId,
        scope: &Scope,
        element: &Element,
        cursor: Cursor,
    ) -> Result<(BoundId, NodeId), RenderError> {
        let node = self.with_doc(|doc| {
            let node = doc.create_element(&element.tag);
            cursor.place(doc, node);
            node
        });
        let id = self.adopt(parent, BoundNode::new(BoundKind::Element, Some(node), scope.clone()));
        for attribute in &element.attributes {
            self.bind_attribute(id, scope, node, attribute);
        }
        self.compile_nodes(id, scope, &element.children, Cursor::Append(node))?;
        Ok((id, node))
    }

    fn compile_text(self: &Rc<Self>, parent: BoundId, scope: &Scope, expr: &Expr, cursor: Cursor) -> BoundId {
        let node = self.with_doc(|doc| {
            let node = doc.create_text("");
            cursor.place(doc, node);
            node
        });
        let id = self.adopt(parent, BoundNode::new(BoundKind::Text, Some(node), scope.clone()));
        self.bind(id, scope, node, expr, |doc, node, value| {
            doc.set_text(node, &value.to_string());
        });
        id
    }

    fn bind_attribute(self: &Rc<Self>, owner: BoundId, scope: &Scope, node: NodeId, attribute: &Attribute) {
        match attribute {
            Attribute::Property { name, value } => {
                let name = name.clone();
                self.bind(owner, scope, node, value, move |doc, node, value| {
                    doc.set_attribute(node, &name, attribute_text(value).as_deref());
                });
            }
            Attribute::Style { property, value } => {
                let property = property.clone();
                self.bind(owner, scope, node, value, move |doc, node, value| {
                    doc.set_style(node, &property, attribute_text(value).as_deref());
                });
            }
            Attribute::Event {
                event,
                action,
                prevent_default,
            } => self.bind_event(owner, scope, node, event, action, *prevent_default),
        }
    }

    /// Apply `expr` to `node` now and, when it is bound, again on every change
    /// along its property path.
    fn bind(
        self: &Rc<Self>,
        owner: BoundId,
        scope: &Scope,
        node: NodeId,
        expr: &Expr,
        apply: impl Fn(&mut dyn Document, NodeId, &Value) + 'static,
    ) {
        let path = match expr {
            Expr::Literal(text) => {
                let value = Value::from(text.as_str());
                self.with_doc(|doc| apply(doc, node, &value));
                return;
            }
            Expr::Bound(path) => path,
        };
        let value = resolve(&scope.model, path);
        self.with_doc(|doc| apply(doc, node, &value));

        let runtime = Rc::downgrade(self);
        let model = Rc::downgrade(&scope.model);
        let watched = path.clone();
        let on_change: Rc<dyn Fn()> = Rc::new(move || {
            let (Some(runtime), Some(model)) = (runtime.upgrade(), model.upgrade()) else {
                return;
            };
            let value = resolve(&model, &watched);
            runtime.with_doc(|doc| apply(doc, node, &value));
        });
        self.watch_path(owner, &scope.model, path.segments(), on_change);
    }

    fn bind_event(
        self: &Rc<Self>,
        owner: BoundId,
        scope: &Scope,
        node: NodeId,
        event: &str,
        action: &str,
        prevent_default: bool,
    ) {
        let runtime = Rc::downgrade(self);
        let model = scope.model.clone();
        let controller = scope.controller.clone();
        let action = action.to_owned();
        let listener: Listener = Rc::new(move |event: &mut DomEvent| {
            if !runtime.upgrade().is_some_and(|rt| rt.is_live(owner)) {
                return;
            }
            if prevent_default {
                event.prevent_default();
            }
            if !controller.handle(&action, event, &model) {
                tracing::warn!(action = %action, event = %event.name, "no controller handled action");
            }
        });
        self.with_doc(|doc| doc.add_listener(node, event, listener));
    }

    /// Call `on_change` whenever any segment of `segments` (walked from
    /// `model`) is reassigned.
    ///
    /// The last segment is subscribed directly in `owner`'s ledger. For
    /// longer paths the head subscription lives in `owner`'s ledger and the
    /// tail is watched by a child watch node, which is rebuilt whenever the
    /// head changes.
    fn watch_path(self: &Rc<Self>, owner: BoundId, model: &Rc<dyn Model>, segments: &[String], on_change: Rc<dyn Fn()>) {
        let Some((head, rest)) = segments.split_first() else {
            return;
        };
        let runtime = Rc::downgrade(self);
        if rest.is_empty() {
            self.subscribe(
                owner,
                model,
                head,
                Rc::new(move |_: &Value| {
                    if runtime.upgrade().is_some_and(|rt| rt.is_live(owner)) {
                        on_change();
                    }
                }),
            );
            return;
        }

        let link: Rc<Cell<Option<BoundId>>> = Rc::new(Cell::new(None));
        let rest: Rc<[String]> = rest.into();
        self.relink(owner, &link, model.get(head), &rest, on_change.clone());
        self.subscribe(
            owner,
            model,
            head,
            Rc::new(move |value: &Value| {
                let Some(rt) = runtime.upgrade() else {
                    return;
                };
                if !rt.is_live(owner) {
                    return;
                }
                rt.relink(owner, &link, value.clone(), &rest, on_change.clone());
                on_change();
            }),
        );
    }

    fn relink(
        self: &Rc<Self>,
        owner: BoundId,
        link: &Cell<Option<BoundId>>,
        value: Value,
        rest: &[String],
        on_change: Rc<dyn Fn()>,
    ) {
        if let Some(old) = link.take() {
            self.teardown(old);
        }
        let Value::Model(inner) = value else {
            return;
        };
        let Some(scope) = self.scope_of(owner) else {
            return;
        };
        let watch = self.adopt(owner, BoundNode::new(BoundKind::Watch, None, scope.with_model(inner.clone())));
        link.set(Some(watch));
        self.watch_path(watch, &inner, rest, on_change);
    }

    fn compile_switch(
        self: &Rc<Self>,
        parent: BoundId,
        scope: &Scope,
        path: &PropertyPath,
        kind: SwitchKind,
        cursor: Cursor,
    ) -> Result<BoundId, RenderError> {
        let anchor = self.anchor(cursor);
        let id = self.adopt(parent, BoundNode::new(BoundKind::Switch, Some(anchor), scope.clone()));
        let state = Rc::new(SwitchState {
            kind,
            path: path.clone(),
            anchor,
            content: Cell::new(None),
            shown: Cell::new(None),
        });

        let runtime = Rc::downgrade(self);
        let rebuild_state = state.clone();
        let on_change: Rc<dyn Fn()> = Rc::new(move || {
            let Some(rt) = runtime.upgrade() else {
                return;
            };
            if let Err(err) = rt.fill_switch(id, &rebuild_state) {
                tracing::error!(%err, "failed to rebuild directive");
            }
        });
        self.watch_path(id, &scope.model, path.segments(), on_change);
        self.fill_switch(id, &state)?;
        Ok(id)
    }

    /// (Re)build a switch's content: tear the old content down first, then
    /// compile whatever the current value calls for.
    fn fill_switch(self: &Rc<Self>, id: BoundId, state: &Rc<SwitchState>) -> Result<(), RenderError> {
        let Some(scope) = self.scope_of(id) else {
            return Ok(());
        };
        let value = resolve_raw(&scope.model, &state.path);
        if let SwitchKind::Condition { invert, .. } = &state.kind {
            let show = value.is_truthy() != *invert;
            if state.shown.replace(Some(show)) == Some(show) {
                return Ok(());
            }
        }
        if let Some(old) = state.content.take() {
            self.teardown(old);
        }
        tracing::trace!(path = %state.path, "building directive content");

        let group = self.adopt(id, BoundNode::new(BoundKind::Group, None, scope.clone()));
        state.content.set(Some(group));
        let cursor = Cursor::After(state.anchor);
        match &state.kind {
            SwitchKind::Condition { body, .. } => {
                if state.shown.get() == Some(true) {
                    self.compile_nodes(group, &scope, body, cursor)?;
                }
            }
            SwitchKind::Each { body } => {
                if let Value::Collection(collection) = &value {
                    self.watch_items(id, group, state, collection);
                }
                self.compile_items(group, &scope, body, &iteration_items(&value), cursor)?;
            }
            SwitchKind::Collection { body } => match &value {
                Value::Collection(collection) => {
                    self.compile_list(group, &scope, collection, body, cursor)?;
                }
                other => {
                    self.compile_items(group, &scope, body, &iteration_items(other), cursor)?;
                }
            },
            SwitchKind::View { name } => {
                if let Value::Model(model) = value {
                    self.compile_view(group, &scope, model, name, cursor)?;
                }
            }
        }
        Ok(())
    }

    /// Rebuild switch `id` whenever `collection` changes shape. The
    /// subscription lives in `group`, the switch's current content.
    fn watch_items(self: &Rc<Self>, id: BoundId, group: BoundId, state: &Rc<SwitchState>, collection: &Collection) {
        let runtime = Rc::downgrade(self);
        let state = state.clone();
        let subscription = collection.subscribe(Rc::new(move |_: &CollectionChange| {
            let Some(rt) = runtime.upgrade() else {
                return;
            };
            if !rt.is_live(group) {
                return;
            }
            if let Err(err) = rt.fill_switch(id, &state) {
                tracing::error!(%err, "failed to rebuild directive");
            }
        }));
        self.tree.borrow_mut().record(
            group,
            Subscription {
                source: Source::Collection(collection.clone()),
                channel: STRUCTURE_CHANNEL.to_owned(),
                id: subscription,
            },
        );
    }

    fn compile_items(
        self: &Rc<Self>,
        parent: BoundId,
        scope: &Scope,
        body: &[Node],
        items: &[Value],
        cursor: Cursor,
    ) -> Result<(), RenderError> {
        let mut cursor = cursor;
        for item in items {
            let group = self.compile_item(parent, usize::MAX, scope, body, item, cursor)?;
            cursor = cursor.advance(self.last_node(group));
        }
        Ok(())
    }

    /// One fragment per item, scoped to the item when it is a model and to
    /// the enclosing model otherwise.
    fn compile_item(
        self: &Rc<Self>,
        parent: BoundId,
        index: usize,
        scope: &Scope,
        body: &[Node],
        item: &Value,
        cursor: Cursor,
    ) -> Result<BoundId, RenderError> {
        let scope = match item {
            Value::Model(model) => scope.with_model(model.clone()),
            _ => scope.clone(),
        };
        let group = self
            .tree
            .borrow_mut()
            .adopt_at(parent, index, BoundNode::new(BoundKind::Group, None, scope.clone()));
        self.compile_nodes(group, &scope, body, cursor)?;
        Ok(group)
    }

    fn compile_list(
        self: &Rc<Self>,
        parent: BoundId,
        scope: &Scope,
        collection: &Collection,
        body: &Rc<[Node]>,
        cursor: Cursor,
    ) -> Result<BoundId, RenderError> {
        let anchor = self.anchor(cursor);
        let list = self.adopt(parent, BoundNode::new(BoundKind::List, Some(anchor), scope.clone()));
        self.compile_items(list, scope, body, &collection.items(), Cursor::After(anchor))?;

        let runtime = Rc::downgrade(self);
        let body = body.clone();
        let id = collection.subscribe(Rc::new(move |change: &CollectionChange| {
            let Some(rt) = runtime.upgrade() else {
                return;
            };
            if !rt.is_live(list) {
                return;
            }
            if let Err(err) = rt.splice(list, anchor, &body, change) {
                tracing::error!(%err, "failed to apply collection change");
            }
        }));
        self.tree.borrow_mut().record(
            list,
            Subscription {
                source: Source::Collection(collection.clone()),
                channel: STRUCTURE_CHANNEL.to_owned(),
                id,
            },
        );
        Ok(list)
    }

    /// Cursor for the item that will sit at `index` in `list`.
    fn item_cursor(&self, list: BoundId, anchor: NodeId, index: usize) -> Cursor {
        let tree = self.tree.borrow();
        let children = tree.children(list);
        let before = &children[..index.min(children.len())];
        Cursor::After(tree.last_of(before).unwrap_or(anchor))
    }

    fn item_at(&self, list: BoundId, index: usize) -> Option<BoundId> {
        self.tree.borrow().children(list).get(index).copied()
    }

    /// Apply one structural change to a live list. Untouched items keep
    /// their document nodes.
    fn splice(
        self: &Rc<Self>,
        list: BoundId,
        anchor: NodeId,
        body: &[Node],
        change: &CollectionChange,
    ) -> Result<(), RenderError> {
        let Some(scope) = self.scope_of(list) else {
            return Ok(());
        };
        tracing::trace!(?change, "splicing list");
        match change {
            CollectionChange::Insert { index, item } => {
                let cursor = self.item_cursor(list, anchor, *index);
                self.compile_item(list, *index, &scope, body, item, cursor)?;
            }
            CollectionChange::Remove { index, .. } => {
                if let Some(child) = self.item_at(list, *index) {
                    self.teardown(child);
                }
            }
            CollectionChange::Update { index, item } => {
                if let Some(child) = self.item_at(list, *index) {
                    self.teardown(child);
                }
                let cursor = self.item_cursor(list, anchor, *index);
                self.compile_item(list, *index, &scope, body, item, cursor)?;
            }
            CollectionChange::Replace { items } => {
                let children = self.tree.borrow().children(list).to_vec();
                for child in children {
                    self.teardown(child);
                }
                self.compile_items(list, &scope, body, items, Cursor::After(anchor))?;
            }
        }
        Ok(())
    }

    fn compile_view(
        self: &Rc<Self>,
        parent: BoundId,
        scope: &Scope,
        model: Rc<dyn Model>,
        name: &str,
        cursor: Cursor,
    ) -> Result<BoundId, RenderError> {
        let depth = scope.depth + 1;
        if depth > self.config.max_view_depth {
            return Err(RenderError::ViewDepthExceeded {
                name: name.to_owned(),
                depth: self.config.max_view_depth,
            });
        }
        let template = self
            .registry
            .lookup_view(name)
            .ok_or_else(|| RenderError::UnknownView { name: name.to_owned() })?;

        let (controller, fresh) = match self.registry.lookup_controller(name) {
            Some(controller) => (controller, true),
            None if self.config.inherit_controller => (scope.controller.clone(), false),
            None => (Rc::new(Inert) as Rc<dyn Controller>, false),
        };
        let view_scope = Scope {
            model: model.clone(),
            controller: controller.clone(),
            depth,
        };
        let view = self.adopt(parent, BoundNode::new(BoundKind::View, None, view_scope.clone()));
        let (_, root) = self.compile_element(view, &view_scope, template.root(), cursor)?;
        if fresh {
            controller.attach(ControllerLinks {
                model,
                view: root,
                parent: Some(Rc::downgrade(&scope.controller)),
            });
        }
        tracing::debug!(view = name, depth, "rendered subview");
        Ok(view)
    }
}
