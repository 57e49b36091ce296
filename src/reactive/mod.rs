//! Reactive state: models, collections, change channels.
//!
//! Synchronous, single-threaded, and unbatched: every `set` notifies its
//! subscribers before returning.
//!
//! - [`Model`]: the property-holder capability (get/set/subscribe).
//! - [`Schema`] / [`PropertyHolder`]: declared fields backed by channels.
//! - [`Collection`]: ordered list with structural change events.
//! - [`Channel`]: the ordered subscriber list both are built on.

pub mod channel;
pub mod collection;
pub mod model;
pub mod value;

pub use channel::{Callback, Channel, SubscriptionId};
pub use collection::{Collection, CollectionChange};
pub use model::{change_channel, Formatter, Model, ModelError, PropertyHolder, Schema};
pub use value::Value;
