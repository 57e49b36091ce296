//! Render entry point: [`Renderer`] and the [`Rendered`] handle.
//!
//! A `Renderer` ties together a document, a view registry, and a
//! [`RenderConfig`]. Each [`Renderer::render`] call is independent: it gets its
//! own bound-node arena, and the returned [`Rendered`] handle is the only way
//! to reach it. Tearing the handle down (or dropping it) removes every
//! document node and every model subscription the render created.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::instrument;

use crate::config::RenderConfig;
use crate::dom::{Document, NodeId};
use crate::reactive::Model;
use crate::template::Template;
use crate::view::compiler::Runtime;
use crate::view::{BoundId, Controller, ControllerLinks, Inert, RenderError, Scope, ViewRegistry};

/// Compiles templates against models into a document.
pub struct Renderer {
    document: Rc<RefCell<dyn Document>>,
    registry: Rc<ViewRegistry>,
    config: RenderConfig,
}

impl Renderer {
    pub fn new(document: Rc<RefCell<dyn Document>>, registry: Rc<ViewRegistry>) -> Self {
        Self {
            document,
            registry,
            config: RenderConfig::default(),
        }
    }

    /// Replace the configuration (builder).
    pub fn with_config(mut self, config: RenderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn registry(&self) -> &Rc<ViewRegistry> {
        &self.registry
    }

    /// Render `template` against `model`, dispatching events to `controller`.
    ///
    /// Every `view` directive reachable from the template is checked against
    /// the registry before anything is built. The root element is left
    /// detached; attach [`Rendered::root`] wherever it belongs.
    #[instrument(skip_all, fields(root = %template.root().tag))]
    pub fn render(
        &self,
        template: &Rc<Template>,
        model: Rc<dyn Model>,
        controller: Rc<dyn Controller>,
    ) -> Result<Rendered, RenderError> {
        self.registry.validate(template)?;
        let runtime = Runtime::new(self.document.clone(), self.registry.clone(), self.config.clone());
        let scope = Scope::new(model.clone(), controller.clone());
        let (root, node) = runtime.compile_root(&scope, template.root())?;
        controller.attach(ControllerLinks {
            model,
            view: node,
            parent: None,
        });
        tracing::debug!(
            bound = runtime.bound_count(root),
            subscriptions = runtime.subscription_count(root),
            "rendered"
        );
        Ok(Rendered { runtime, root, node })
    }

    /// Parse `source` and render it.
    pub fn render_source(
        &self,
        source: &str,
        model: Rc<dyn Model>,
        controller: Rc<dyn Controller>,
    ) -> Result<Rendered, RenderError> {
        let template = Rc::new(Template::parse(source)?);
        self.render(&template, model, controller)
    }

    /// Render the registered view `name` with its registered controller, or
    /// an inert one.
    pub fn render_view(&self, name: &str, model: Rc<dyn Model>) -> Result<Rendered, RenderError> {
        let template = self
            .registry
            .lookup_view(name)
            .ok_or_else(|| RenderError::UnknownView { name: name.to_owned() })?;
        let controller = self
            .registry
            .lookup_controller(name)
            .unwrap_or_else(|| Rc::new(Inert) as Rc<dyn Controller>);
        self.render(&template, model, controller)
    }
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish()
    }
}

/// A live render. Dropping it tears it down.
pub struct Rendered {
    runtime: Rc<Runtime>,
    root: BoundId,
    node: NodeId,
}

impl Rendered {
    /// The root element in the document.
    pub fn root(&self) -> NodeId {
        self.node
    }

    pub fn is_live(&self) -> bool {
        self.runtime.is_live(self.root)
    }

    /// Remove every subscription and document node this render created.
    /// Calling it again does nothing.
    pub fn teardown(&self) {
        if self.is_live() {
            tracing::debug!(bound = self.bound_count(), "tearing down render");
            self.runtime.teardown(self.root);
        }
    }

    /// Subscriptions currently held by this render.
    pub fn subscription_count(&self) -> usize {
        self.runtime.subscription_count(self.root)
    }

    /// Live bound nodes in this render.
    pub fn bound_count(&self) -> usize {
        self.runtime.bound_count(self.root)
    }
}

impl Drop for Rendered {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl fmt::Debug for Rendered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rendered")
            .field("root", &self.node)
            .field("live", &self.is_live())
            .finish()
    }
}
