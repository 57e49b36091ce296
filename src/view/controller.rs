//! Controllers: the receivers of bound event actions.
//!
//! A template's `event:click=save` attribute registers a listener that calls
//! [`Controller::handle`] with `"save"`, the event, and the model the element
//! was rendered against. The controller for a render is given at render time;
//! subviews either get their own (registered by view name) or share the
//! enclosing one.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::dom::NodeId;
use crate::event::DomEvent;
use crate::reactive::Model;

/// Non-owning context handed to a controller when its view is rendered.
#[derive(Clone)]
pub struct ControllerLinks {
    /// The model the view was rendered against.
    pub model: Rc<dyn Model>,
    /// The view's root element.
    pub view: NodeId,
    /// The enclosing view's controller, for subview controllers.
    pub parent: Option<Weak<dyn Controller>>,
}

impl fmt::Debug for ControllerLinks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerLinks")
            .field("view", &self.view)
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

pub trait Controller {
    /// Run `action`. Returns `false` when the action is unknown.
    fn handle(&self, action: &str, event: &mut DomEvent, model: &Rc<dyn Model>) -> bool;

    /// Called once per render of the view this controller drives.
    fn attach(&self, _links: ControllerLinks) {}
}

/// A controller that handles nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Inert;

impl Controller for Inert {
    fn handle(&self, _action: &str, _event: &mut DomEvent, _model: &Rc<dyn Model>) -> bool {
        false
    }
}

/// A named action handler.
pub type Action = Rc<dyn Fn(&mut DomEvent, &Rc<dyn Model>)>;

/// A controller built from named closures.
///
/// Actions it does not know are forwarded to the parent controller it was
/// attached with, if that is still alive.
#[derive(Default)]
pub struct Actions {
    actions: HashMap<String, Action>,
    links: RefCell<Option<ControllerLinks>>,
}

impl Actions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an action (builder).
    pub fn on(
        mut self,
        action: impl Into<String>,
        handler: impl Fn(&mut DomEvent, &Rc<dyn Model>) + 'static,
    ) -> Self {
        self.actions.insert(action.into(), Rc::new(handler));
        self
    }

    /// Links from the most recent render, if any.
    pub fn links(&self) -> Option<ControllerLinks> {
        self.links.borrow().clone()
    }

    fn parent(&self) -> Option<Rc<dyn Controller>> {
        self.links
            .borrow()
            .as_ref()
            .and_then(|links| links.parent.as_ref())
            .and_then(Weak::upgrade)
    }
}

impl Controller for Actions {
    fn handle(&self, action: &str, event: &mut DomEvent, model: &Rc<dyn Model>) -> bool {
        if let Some(handler) = self.actions.get(action).cloned() {
            handler(event, model);
            return true;
        }
        match self.parent() {
            Some(parent) => parent.handle(action, event, model),
            None => false,
        }
    }

    fn attach(&self, links: ControllerLinks) {
        *self.links.borrow_mut() = Some(links);
    }
}

impl fmt::Debug for Actions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.actions.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("Actions").field("actions", &names).finish()
    }
}
