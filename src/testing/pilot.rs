//! Pilot: programmatic interaction with headless renders.
//!
//! The `Pilot` owns an in-memory [`Dom`], a [`ViewRegistry`] and a
//! [`Renderer`] over them. It mounts templates, finds nodes, fires events at
//! them, and serializes the result for assertions.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use crate::config::RenderConfig;
use crate::dom::{Dom, NodeId};
use crate::event::{self, DomEvent};
use crate::reactive::Model;
use crate::renderer::{Rendered, Renderer};
use crate::template::Template;
use crate::view::{Controller, RenderError, ViewRegistry};

use super::snapshot::to_html;

// ---------------------------------------------------------------------------
// Pilot
// ---------------------------------------------------------------------------

/// A headless render driver for testing.
///
/// Everything mounted through the pilot stays live until [`Pilot::teardown`]
/// is called or the pilot is dropped.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
///
/// use weft::reactive::Schema;
/// use weft::testing::Pilot;
/// use weft::view::Inert;
///
/// let mut pilot = Pilot::new();
/// let model = Schema::new().property("label", "Go").build();
/// let root = pilot.mount_source("button @label\n", model, Rc::new(Inert)).unwrap();
/// assert_eq!(pilot.html(root), "<button>Go</button>");
/// ```
pub struct Pilot {
    dom: Rc<RefCell<Dom>>,
    registry: Rc<ViewRegistry>,
    renderer: Renderer,
    mounted: Vec<Rendered>,
}

impl Pilot {
    /// A pilot with an empty document, an empty registry and default config.
    pub fn new() -> Self {
        Self::with_config(RenderConfig::default())
    }

    pub fn with_config(config: RenderConfig) -> Self {
        let dom = Rc::new(RefCell::new(Dom::new()));
        let registry = Rc::new(ViewRegistry::new());
        let renderer = Renderer::new(dom.clone(), registry.clone()).with_config(config);
        Self {
            dom,
            registry,
            renderer,
            mounted: Vec::new(),
        }
    }

    /// The registry views and controllers are resolved from.
    pub fn registry(&self) -> &ViewRegistry {
        &self.registry
    }

    /// Borrow the document. Release the borrow before firing events.
    pub fn dom(&self) -> Ref<'_, Dom> {
        self.dom.borrow()
    }

    // -- Mounting ----------------------------------------------------------

    /// Render `template` and keep it live. Returns its root element.
    pub fn mount(
        &mut self,
        template: &Rc<Template>,
        model: Rc<dyn Model>,
        controller: Rc<dyn Controller>,
    ) -> Result<NodeId, RenderError> {
        let rendered = self.renderer.render(template, model, controller)?;
        Ok(self.keep(rendered))
    }

    /// Parse `source`, render it and keep it live.
    pub fn mount_source(
        &mut self,
        source: &str,
        model: Rc<dyn Model>,
        controller: Rc<dyn Controller>,
    ) -> Result<NodeId, RenderError> {
        let rendered = self.renderer.render_source(source, model, controller)?;
        Ok(self.keep(rendered))
    }

    /// Render the registered view `name` and keep it live.
    pub fn mount_view(&mut self, name: &str, model: Rc<dyn Model>) -> Result<NodeId, RenderError> {
        let rendered = self.renderer.render_view(name, model)?;
        Ok(self.keep(rendered))
    }

    fn keep(&mut self, rendered: Rendered) -> NodeId {
        let root = rendered.root();
        self.mounted.push(rendered);
        root
    }

    /// Tear down every mounted render.
    pub fn teardown(&mut self) {
        for rendered in self.mounted.drain(..) {
            rendered.teardown();
        }
    }

    /// Subscriptions held across every mounted render.
    pub fn subscription_count(&self) -> usize {
        self.mounted.iter().map(Rendered::subscription_count).sum()
    }

    // -- Inspection --------------------------------------------------------

    /// Serialize the subtree under `node`.
    pub fn html(&self, node: NodeId) -> String {
        to_html(&self.dom.borrow(), node)
    }

    pub fn text(&self, node: NodeId) -> String {
        self.dom.borrow().text_content(node)
    }

    /// First element with `tag` in any mounted render, in mount order.
    pub fn find(&self, tag: &str) -> Option<NodeId> {
        let dom = self.dom.borrow();
        self.mounted
            .iter()
            .find_map(|rendered| dom.query_by_tag(rendered.root(), tag))
    }

    /// Every element with `tag` in any mounted render.
    pub fn find_all(&self, tag: &str) -> Vec<NodeId> {
        let dom = self.dom.borrow();
        self.mounted
            .iter()
            .flat_map(|rendered| dom.query_all_by_tag(rendered.root(), tag))
            .collect()
    }

    pub fn find_by_attribute(&self, name: &str, value: &str) -> Option<NodeId> {
        let dom = self.dom.borrow();
        self.mounted
            .iter()
            .find_map(|rendered| dom.query_by_attribute(rendered.root(), name, value))
    }

    // -- Events ------------------------------------------------------------

    /// Dispatch a `click` at `node`.
    pub fn click(&self, node: NodeId) -> DomEvent {
        self.fire(node, "click")
    }

    /// Dispatch `event` at `node` and return it after bubbling.
    pub fn fire(&self, node: NodeId, event: &str) -> DomEvent {
        tracing::trace!(?node, event, "pilot dispatch");
        event::dispatch(&self.dom, node, event)
    }

    /// Click the first element with `tag`, if any.
    pub fn click_tag(&self, tag: &str) -> Option<DomEvent> {
        let node = self.find(tag)?;
        Some(self.click(node))
    }
}

impl Default for Pilot {
    fn default() -> Self {
        Self::new()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
