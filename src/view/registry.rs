//! The view registry: named templates and controller factories.
//!
//! Registries are plain values injected into a [`Renderer`](crate::renderer::Renderer),
//! so every test (or application) can build its own.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use super::controller::Controller;
use super::RenderError;
use crate::template::{ParseError, Template};

/// Builds a fresh controller for each render of a view.
pub type ControllerFactory = Rc<dyn Fn() -> Rc<dyn Controller>>;

#[derive(Default)]
pub struct ViewRegistry {
    views: RefCell<HashMap<String, Rc<Template>>>,
    controllers: RefCell<HashMap<String, ControllerFactory>>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `source` once and register it under `name`, replacing any
    /// earlier view of that name.
    pub fn register_view(&self, name: impl Into<String>, source: &str) -> Result<(), ParseError> {
        let template = Template::parse(source)?;
        self.register_template(name, Rc::new(template));
        Ok(())
    }

    pub fn register_template(&self, name: impl Into<String>, template: Rc<Template>) {
        let name = name.into();
        tracing::debug!(view = %name, "registering view");
        self.views.borrow_mut().insert(name, template);
    }

    /// Register a controller factory for the view called `name`.
    pub fn register_controller(
        &self,
        name: impl Into<String>,
        factory: impl Fn() -> Rc<dyn Controller> + 'static,
    ) {
        self.controllers
            .borrow_mut()
            .insert(name.into(), Rc::new(factory));
    }

    pub fn lookup_view(&self, name: &str) -> Option<Rc<Template>> {
        self.views.borrow().get(name).cloned()
    }

    /// A fresh controller for `name`, if one is registered.
    pub fn lookup_controller(&self, name: &str) -> Option<Rc<dyn Controller>> {
        let factory = self.controllers.borrow().get(name).cloned()?;
        Some(factory())
    }

    pub fn contains_view(&self, name: &str) -> bool {
        self.views.borrow().contains_key(name)
    }

    /// Check that every view reachable from `template` is registered.
    pub fn validate(&self, template: &Template) -> Result<(), RenderError> {
        let mut visited = HashSet::new();
        let mut pending: Vec<String> = template.view_names().into_iter().map(str::to_owned).collect();
        while let Some(name) = pending.pop() {
            if !visited.insert(name.clone()) {
                continue;
            }
            let view = self
                .lookup_view(&name)
                .ok_or_else(|| RenderError::UnknownView { name: name.clone() })?;
            pending.extend(view.view_names().into_iter().map(str::to_owned));
        }
        Ok(())
    }
}

impl fmt::Debug for ViewRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut views: Vec<String> = self.views.borrow().keys().cloned().collect();
        views.sort_unstable();
        let mut controllers: Vec<String> = self.controllers.borrow().keys().cloned().collect();
        controllers.sort_unstable();
        f.debug_struct("ViewRegistry")
            .field("views", &views)
            .field("controllers", &controllers)
            .finish()
    }
}
