//! Document events: the event object, listeners, bubbling dispatch.

pub mod dom_event;
pub mod handler;

pub use dom_event::{DomEvent, Listener};
pub use handler::{bubble_path, dispatch, dispatch_event};
