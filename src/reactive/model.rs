//! The model capability contract and its schema-backed implementation.
//!
//! Anything implementing [`Model`] can be rendered against. The contract is the
//! property-holder protocol: raw `get`, display `get` (formatter applied),
//! `set` with synchronous change notification, and explicit subscription
//! management on named channels.
//!
//! [`PropertyHolder`] is the stock implementation. Its fields are declared up
//! front through a [`Schema`]; setting a field that was never declared is an
//! error rather than silently growing the model.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use super::channel::{Callback, Channel, SubscriptionId};
use super::value::Value;

/// Name of the channel that fires when `property` is set.
pub fn change_channel(property: &str) -> String {
    format!("change:{property}")
}

/// Errors from model writes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("property `{property}` is not declared on this model")]
    UndeclaredProperty { property: String },
}

/// Reactive property-holder capability.
pub trait Model {
    /// Raw current value, `Value::Null` for unknown properties.
    fn get(&self, property: &str) -> Value;

    /// Value as it should be shown to a user. Render paths always read this.
    fn display(&self, property: &str) -> Value {
        self.get(property)
    }

    /// Store `value`, then synchronously notify every subscriber of
    /// `change:<property>` in subscription order.
    fn set(&self, property: &str, value: Value) -> Result<(), ModelError>;

    /// Register one callback on one channel.
    fn subscribe(&self, channel: &str, callback: Callback<Value>) -> SubscriptionId;

    /// Remove one callback. A no-op if it is not registered.
    fn unsubscribe(&self, channel: &str, id: SubscriptionId);

    /// Number of callbacks currently registered on `channel`.
    fn subscriber_count(&self, channel: &str) -> usize;
}

/// Display transformation applied by [`Model::display`].
pub type Formatter = Rc<dyn Fn(&Value) -> Value>;

#[derive(Clone)]
struct FieldSpec {
    name: String,
    initial: Value,
    formatter: Option<Formatter>,
}

/// Declares the reactive fields of a [`PropertyHolder`].
#[derive(Clone, Default)]
pub struct Schema {
    fields: Vec<FieldSpec>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a field with an initial value (builder). Redeclaring a name
    /// replaces the earlier declaration.
    pub fn property(mut self, name: impl Into<String>, initial: impl Into<Value>) -> Self {
        self.declare(FieldSpec {
            name: name.into(),
            initial: initial.into(),
            formatter: None,
        });
        self
    }

    /// Declare a field whose display value goes through `formatter` (builder).
    pub fn formatted(
        mut self,
        name: impl Into<String>,
        initial: impl Into<Value>,
        formatter: impl Fn(&Value) -> Value + 'static,
    ) -> Self {
        self.declare(FieldSpec {
            name: name.into(),
            initial: initial.into(),
            formatter: Some(Rc::new(formatter)),
        });
        self
    }

    fn declare(&mut self, spec: FieldSpec) {
        self.fields.retain(|f| f.name != spec.name);
        self.fields.push(spec);
    }

    /// Declared field names, in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Instantiate a fresh model with every field at its initial value.
    pub fn build(&self) -> Rc<PropertyHolder> {
        Rc::new(PropertyHolder::new(self))
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Schema-backed reactive model.
pub struct PropertyHolder {
    values: RefCell<HashMap<String, Value>>,
    formatters: HashMap<String, Formatter>,
    channels: RefCell<HashMap<String, Rc<Channel<Value>>>>,
}

impl PropertyHolder {
    pub fn new(schema: &Schema) -> Self {
        let mut values = HashMap::new();
        let mut formatters = HashMap::new();
        for field in &schema.fields {
            values.insert(field.name.clone(), field.initial.clone());
            if let Some(formatter) = &field.formatter {
                formatters.insert(field.name.clone(), formatter.clone());
            }
        }
        Self {
            values: RefCell::new(values),
            formatters,
            channels: RefCell::new(HashMap::new()),
        }
    }

    pub fn declares(&self, property: &str) -> bool {
        self.values.borrow().contains_key(property)
    }

    /// Total callbacks across every channel. Zero once every render bound to
    /// this model has been torn down.
    pub fn total_subscribers(&self) -> usize {
        self.channels.borrow().values().map(|c| c.len()).sum()
    }

    fn channel(&self, name: &str) -> Option<Rc<Channel<Value>>> {
        self.channels.borrow().get(name).cloned()
    }
}

impl Model for PropertyHolder {
    fn get(&self, property: &str) -> Value {
        self.values
            .borrow()
            .get(property)
            .cloned()
            .unwrap_or_default()
    }

    fn display(&self, property: &str) -> Value {
        let raw = self.get(property);
        match self.formatters.get(property) {
            Some(formatter) => formatter(&raw),
            None => raw,
        }
    }

    fn set(&self, property: &str, value: Value) -> Result<(), ModelError> {
        {
            let mut values = self.values.borrow_mut();
            let slot = values
                .get_mut(property)
                .ok_or_else(|| ModelError::UndeclaredProperty {
                    property: property.to_owned(),
                })?;
            *slot = value.clone();
        }
        // Clone the channel handle out so no borrow is held while callbacks run.
        if let Some(channel) = self.channel(&change_channel(property)) {
            tracing::trace!(property, subscribers = channel.len(), "notifying change");
            channel.notify(&value);
        }
        Ok(())
    }

    fn subscribe(&self, channel: &str, callback: Callback<Value>) -> SubscriptionId {
        let handle = self
            .channels
            .borrow_mut()
            .entry(channel.to_owned())
            .or_default()
            .clone();
        handle.subscribe(callback)
    }

    fn unsubscribe(&self, channel: &str, id: SubscriptionId) {
        if let Some(handle) = self.channel(channel) {
            handle.unsubscribe(id);
        }
    }

    fn subscriber_count(&self, channel: &str) -> usize {
        self.channel(channel).map_or(0, |c| c.len())
    }
}

impl fmt::Debug for PropertyHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyHolder")
            .field("values", &self.values.borrow())
            .field("subscribers", &self.total_subscribers())
            .finish()
    }
}
