//! Snapshot rendering helpers.
//!
//! Deterministic HTML serialization of a [`Dom`] subtree, suitable for
//! `insta` snapshots and plain string assertions. Attributes come out in the
//! order they were first set and inline styles are folded into a trailing
//! `style="..."` attribute. Unlabelled anchors are invisible; labelled ones
//! (see [`RenderConfig::anchor_label`](crate::config::RenderConfig)) appear
//! as comments.

use std::cell::RefCell;
use std::fmt::Write;
use std::rc::Rc;

use crate::dom::{Dom, NodeId, NodeKind};
use crate::reactive::Model;
use crate::renderer::Renderer;
use crate::view::{Inert, RenderError, ViewRegistry};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Serialize the subtree rooted at `node`. A missing node yields `""`.
pub fn to_html(dom: &Dom, node: NodeId) -> String {
    let mut out = String::new();
    write_node(dom, node, &mut out);
    out
}

/// Render `source` against `model` into a scratch document and serialize it.
///
/// # Examples
///
/// ```
/// use weft::reactive::Schema;
/// use weft::testing::render_to_string;
///
/// let model = Schema::new().property("name", "Ada").build();
/// let html = render_to_string("p \"Hi \" @name\n", model).unwrap();
/// assert_eq!(html, "<p>Hi Ada</p>");
/// ```
pub fn render_to_string(source: &str, model: Rc<dyn Model>) -> Result<String, RenderError> {
    let dom = Rc::new(RefCell::new(Dom::new()));
    let renderer = Renderer::new(dom.clone(), Rc::new(ViewRegistry::new()));
    let rendered = renderer.render_source(source, model, Rc::new(Inert))?;
    let html = to_html(&dom.borrow(), rendered.root());
    Ok(html)
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

fn write_node(dom: &Dom, node: NodeId, out: &mut String) {
    let Some(data) = dom.get(node) else {
        return;
    };
    match &data.kind {
        NodeKind::Text(text) => out.push_str(&escape(text, false)),
        NodeKind::Anchor(None) => {}
        NodeKind::Anchor(Some(label)) => {
            let _ = write!(out, "<!--{label}-->");
        }
        NodeKind::Element { tag } => {
            let _ = write!(out, "<{tag}");
            for (name, value) in &data.attributes {
                let _ = write!(out, " {name}=\"{}\"", escape(value, true));
            }
            if !data.styles.is_empty() {
                let styles: Vec<String> = data
                    .styles
                    .iter()
                    .map(|(property, value)| format!("{property}: {value}"))
                    .collect();
                let _ = write!(out, " style=\"{}\"", escape(&styles.join("; "), true));
            }
            out.push('>');
            for &child in dom.children(node) {
                write_node(dom, child, out);
            }
            let _ = write!(out, "</{tag}>");
        }
    }
}

fn escape(text: &str, attribute: bool) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' if attribute => escaped.push_str("&quot;"),
            other => escaped.push(other),
        }
    }
    escaped
}

// ===========================================================================
// Tests
// ===========================================================================
