//! Document queries: by tag, attribute, generic predicate. Results are in
//! tree order beneath the given root.

use super::node::{NodeData, NodeId};
use super::tree::Dom;

impl Dom {
    /// First element under `root` (inclusive) with the given tag.
    pub fn query_by_tag(&self, root: NodeId, tag: &str) -> Option<NodeId> {
        self.query_all(root, |data| data.tag() == Some(tag))
            .into_iter()
            .next()
    }

    /// All elements under `root` with the given tag.
    pub fn query_all_by_tag(&self, root: NodeId, tag: &str) -> Vec<NodeId> {
        self.query_all(root, |data| data.tag() == Some(tag))
    }

    /// First node under `root` whose attribute `name` equals `value`.
    pub fn query_by_attribute(&self, root: NodeId, name: &str, value: &str) -> Option<NodeId> {
        self.query_all(root, |data| data.attribute(name) == Some(value))
            .into_iter()
            .next()
    }

    /// Find all nodes under `root` matching an arbitrary predicate.
    pub fn query_all(&self, root: NodeId, predicate: impl Fn(&NodeData) -> bool) -> Vec<NodeId> {
        self.walk_depth_first(root)
            .into_iter()
            .filter(|&id| predicate(&self.nodes[id]))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::dom::node::{NodeData, NodeId};
    use crate::dom::tree::Dom;

    /// ```text
    ///        ul#list
    ///      /    |    \
    ///    li     li    li.done
    ///   "a"   "b"    "c"
    /// ```
    fn build_query_tree() -> (Dom, NodeId) {
        let mut dom = Dom::new();
        let root = dom.insert(NodeData::element("ul").with_attribute("id", "list"));
        for (text, class) in [("a", None), ("b", None), ("c", Some("done"))] {
            let mut li = NodeData::element("li");
            if let Some(class) = class {
                li = li.with_attribute("class", class);
            }
            let li = dom.insert_child(root, li);
            dom.insert_child(li, NodeData::text(text));
        }
        (dom, root)
    }

    #[test]
    fn query_by_tag_finds_first_in_tree_order() {
        let (dom, root) = build_query_tree();
        let li = dom.query_by_tag(root, "li").unwrap();
        assert_eq!(dom.text_content(li), "a");
        assert_eq!(dom.query_by_tag(root, "ul"), Some(root));
        assert!(dom.query_by_tag(root, "table").is_none());
    }

    #[test]
    fn query_all_by_tag() {
        let (dom, root) = build_query_tree();
        let items = dom.query_all_by_tag(root, "li");
        let texts: Vec<String> = items.iter().map(|&id| dom.text_content(id)).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
    }

    #[test]
    fn query_by_attribute() {
        let (dom, root) = build_query_tree();
        let done = dom.query_by_attribute(root, "class", "done").unwrap();
        assert_eq!(dom.text_content(done), "c");
        assert_eq!(dom.query_by_attribute(root, "id", "list"), Some(root));
        assert!(dom.query_by_attribute(root, "id", "nope").is_none());
    }

    #[test]
    fn query_is_scoped_to_root() {
        let (mut dom, root) = build_query_tree();
        let other = dom.insert(NodeData::element("li"));
        assert!(!dom.query_all_by_tag(root, "li").contains(&other));
    }

    #[test]
    fn query_all_custom_predicate() {
        let (dom, root) = build_query_tree();
        let texts = dom.query_all(root, |data| data.tag().is_none());
        assert_eq!(texts.len(), 3);
    }
}
