//! Render configuration.

/// Configuration for a [`Renderer`](crate::renderer::Renderer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    /// Maximum number of nested `view` directives. Guards against a view that
    /// (directly or through others) includes itself.
    pub max_view_depth: usize,
    /// Whether a subview without a registered controller reuses the
    /// enclosing controller. When `false` its events go to an inert one.
    pub inherit_controller: bool,
    /// When set, control-directive anchors carry this label and show up as
    /// comments in serialized output.
    pub anchor_label: Option<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_view_depth: 32,
            inherit_controller: true,
            anchor_label: None,
        }
    }
}

impl RenderConfig {
    /// Create a new default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum subview nesting depth (builder).
    pub fn with_max_view_depth(mut self, depth: usize) -> Self {
        self.max_view_depth = depth;
        self
    }

    /// Set whether subviews inherit the parent controller (builder).
    pub fn with_inherit_controller(mut self, inherit: bool) -> Self {
        self.inherit_controller = inherit;
        self
    }

    /// Label anchors for debugging (builder).
    pub fn with_anchor_label(mut self, label: impl Into<String>) -> Self {
        self.anchor_label = Some(label.into());
        self
    }
}
