//! The event object handed to listeners.

use std::rc::Rc;

use crate::dom::NodeId;
use crate::reactive::Value;

/// A DOM listener. Listeners receive the event mutably so they can stop
/// propagation or prevent the default action.
pub type Listener = Rc<dyn Fn(&mut DomEvent)>;

/// An event travelling from its target up through the target's ancestors.
#[derive(Debug, Clone)]
pub struct DomEvent {
    /// Event name (`click`, `submit`, ...).
    pub name: String,
    /// The node the event was fired on.
    pub target: NodeId,
    /// The node whose listeners are currently running.
    pub current: NodeId,
    /// Arbitrary payload supplied by whoever fired the event.
    pub detail: Value,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl DomEvent {
    pub fn new(name: impl Into<String>, target: NodeId) -> Self {
        Self {
            name: name.into(),
            target,
            current: target,
            detail: Value::Null,
            default_prevented: false,
            propagation_stopped: false,
        }
    }

    /// Attach a payload (builder).
    pub fn with_detail(mut self, detail: impl Into<Value>) -> Self {
        self.detail = detail.into();
        self
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    /// Stop the event after the current node's listeners have run.
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}
