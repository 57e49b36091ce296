//! Headless testing framework: Pilot, snapshot helpers.
//!
//! Use the [`Pilot`] to mount templates into an in-memory [`Dom`](crate::dom::Dom)
//! and fire events at them. Use [`to_html`] and [`render_to_string`] to capture
//! rendered output as deterministic HTML for snapshot-style assertions.

pub mod pilot;
pub mod snapshot;

pub use pilot::Pilot;
pub use snapshot::{render_to_string, to_html};
