//! Directive tree: the immutable output of the parser.
//!
//! Control-directive bodies are stored as `Rc<[Node]>` so that the closures a
//! render registers on a model can hold on to the body they rebuild without
//! borrowing the template.

use std::fmt;
use std::rc::Rc;

use super::parser::{self, ParseError};

/// A dotted property reference such as `author.name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyPath {
    segments: Rc<[String]>,
}

impl PropertyPath {
    /// Split `a.b.c` into its segments.
    pub fn parse(text: &str) -> Self {
        Self {
            segments: text.split('.').map(str::to_owned).collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The property read on the binding's own model.
    pub fn head(&self) -> &str {
        self.segments.first().map(String::as_str).unwrap_or_default()
    }

    /// The property read on the innermost model.
    pub fn last(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

/// A value position in the template: either fixed text or a bound property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Literal(String),
    Bound(PropertyPath),
}

impl Expr {
    pub fn bound(path: &str) -> Self {
        Expr::Bound(PropertyPath::parse(path))
    }

    pub fn literal(text: impl Into<String>) -> Self {
        Expr::Literal(text.into())
    }
}

/// One entry inside an element's `[...]` attribute list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attribute {
    /// `name="literal"` or `name=@bound`.
    Property { name: String, value: Expr },
    /// `style:property=value`.
    Style { property: String, value: Expr },
    /// `event:name=action` (trailing `!` prevents the default action).
    Event {
        event: String,
        action: String,
        prevent_default: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
    /// Source line of the tag.
    pub line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionKind {
    If,
    Unless,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationKind {
    In,
    Collection,
}

/// A directive node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(Expr),
    Conditional {
        kind: ConditionKind,
        path: PropertyPath,
        body: Rc<[Node]>,
    },
    Iteration {
        kind: IterationKind,
        path: PropertyPath,
        body: Rc<[Node]>,
    },
    SubView {
        name: String,
        path: Option<PropertyPath>,
    },
}

/// A parsed template: exactly one root element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    root: Element,
}

impl Template {
    pub(crate) fn new(root: Element) -> Self {
        Self { root }
    }

    /// Parse template source. Equivalent to [`parser::parse`].
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        parser::parse(source)
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Names of every subview referenced anywhere in this template, in
    /// document order (duplicates included).
    pub fn view_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        collect_views(&self.root.children, &mut names);
        names
    }
}

fn collect_views<'a>(nodes: &'a [Node], names: &mut Vec<&'a str>) {
    for node in nodes {
        match node {
            Node::Element(element) => collect_views(&element.children, names),
            Node::Conditional { body, .. } | Node::Iteration { body, .. } => {
                collect_views(body, names)
            }
            Node::SubView { name, .. } => names.push(name),
            Node::Text(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_segments() {
        let path = PropertyPath::parse("author.address.city");
        assert_eq!(path.segments(), ["author", "address", "city"]);
        assert_eq!(path.head(), "author");
        assert_eq!(path.last(), "city");
        assert_eq!(path.to_string(), "author.address.city");
    }

    #[test]
    fn single_segment_path() {
        let path = PropertyPath::parse("title");
        assert_eq!(path.head(), path.last());
    }

    #[test]
    fn view_names_are_collected_through_directives() {
        let template = Template::parse(
            "div\n  - view \"header\"\n  - if @open\n    ul\n      - collection @items\n        - view \"item\"\n",
        )
        .unwrap();
        assert_eq!(template.view_names(), vec!["header", "item"]);
    }
}
