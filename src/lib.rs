//! # weft
//!
//! A logic-less, indentation-based template language compiled into live,
//! model-bound document fragments.
//!
//! Templates declare structure, property bindings and event actions. They are
//! parsed once, then rendered any number of times against reactive models.
//! Every render records the subscriptions it makes, so tearing down a render
//! (or a conditional branch, list item or subview inside it) releases all of
//! them along with the document nodes it created.
//!
//! ## Core Systems
//!
//! - **[`template`]**: tokenizer, syntax tree and parser for template source
//! - **[`reactive`]**: models, change channels, observable collections
//! - **[`dom`]**: slotmap-backed document arena and the [`Document`] trait
//! - **[`event`]**: DOM events and bubbling dispatch
//! - **[`view`]**: the compiler, bound-node arena, controllers, view registry
//! - **[`renderer`]**: the entry point tying a document, a registry and a config together
//! - **[`testing`]**: headless pilot and HTML snapshots
//!
//! ## Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use weft::{Dom, Inert, Model, Renderer, Schema, ViewRegistry};
//! use weft::testing::to_html;
//!
//! let dom = Rc::new(RefCell::new(Dom::new()));
//! let renderer = Renderer::new(dom.clone(), Rc::new(ViewRegistry::new()));
//! let model = Schema::new().property("name", "Ada").build();
//!
//! let rendered = renderer
//!     .render_source("p \"Hello \" @name\n", model.clone(), Rc::new(Inert))
//!     .unwrap();
//! model.set("name", "Grace".into()).unwrap();
//! assert_eq!(to_html(&dom.borrow(), rendered.root()), "<p>Hello Grace</p>");
//!
//! rendered.teardown();
//! assert_eq!(model.total_subscribers(), 0);
//! ```

// Source language
pub mod template;

// Data
pub mod reactive;

// Document
pub mod dom;
pub mod event;

// Rendering
pub mod config;
pub mod renderer;
pub mod view;

// Test harness
pub mod testing;

pub use config::RenderConfig;
pub use dom::{Document, Dom, NodeData, NodeId, NodeKind};
pub use event::DomEvent;
pub use reactive::{Collection, CollectionChange, Model, ModelError, PropertyHolder, Schema, Value};
pub use renderer::{Rendered, Renderer};
pub use template::{ParseError, Template};
pub use view::{Actions, Controller, ControllerLinks, Inert, RenderError, ViewRegistry};
