//! Compiling templates into live, model-bound document fragments.
//!
//! - [`compiler`] turns directive nodes into [`bound`] nodes and wires their
//!   subscriptions.
//! - [`bound`] holds the per-render arena and the teardown logic.
//! - [`registry`] resolves `view` directives.
//! - [`controller`] receives event actions.

pub mod bound;
pub mod compiler;
pub mod controller;
pub mod registry;

pub use bound::{BoundId, BoundKind, BoundNode, BoundTree, Scope, Source, Subscription};
pub use controller::{Action, Actions, Controller, ControllerLinks, Inert};
pub use registry::{ControllerFactory, ViewRegistry};

use crate::template::ParseError;

/// Errors from rendering.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("unknown view `{name}`")]
    UnknownView { name: String },
    #[error("view `{name}` exceeds the maximum nesting depth of {depth}")]
    ViewDepthExceeded { name: String, depth: usize },
    #[error(transparent)]
    Parse(#[from] ParseError),
}
