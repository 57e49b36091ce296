//! Event dispatch: bubble path computation and listener invocation.
//!
//! [`dispatch`] walks the bubble path from the target up to the topmost
//! ancestor. At each node it clones that node's listeners out of the
//! document and releases the borrow before running them, so a listener may
//! freely mutate the document (and the models bound to it).

use std::cell::RefCell;

use super::dom_event::DomEvent;
use crate::dom::{Dom, NodeId};

/// Compute the bubble path from `start` up to the topmost ancestor (inclusive).
///
/// Returns `[start, parent, grandparent, ...]`.
/// If `start` does not exist in the document, returns an empty vec.
pub fn bubble_path(dom: &Dom, start: NodeId) -> Vec<NodeId> {
    if !dom.contains(start) {
        return Vec::new();
    }
    let mut path = vec![start];
    path.extend(dom.ancestors(start));
    path
}

/// Fire `name` on `target` and return the event after propagation finished.
pub fn dispatch(dom: &RefCell<Dom>, target: NodeId, name: &str) -> DomEvent {
    dispatch_event(dom, DomEvent::new(name, target))
}

/// Fire a prepared event (for instance one carrying a `detail` payload).
pub fn dispatch_event(dom: &RefCell<Dom>, mut event: DomEvent) -> DomEvent {
    let path = bubble_path(&dom.borrow(), event.target);
    tracing::trace!(event = %event.name, depth = path.len(), "dispatching");
    for node in path {
        let listeners = {
            let dom = dom.borrow();
            // Removed by a listener further down the path.
            if !dom.contains(node) {
                continue;
            }
            dom.listeners(node, &event.name)
        };
        event.current = node;
        for listener in listeners {
            listener(&mut event);
        }
        if event.propagation_stopped() {
            break;
        }
    }
    event
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    use crate::dom::{Document, NodeData};
    use crate::event::Listener;

    /// Build a small test tree:
    /// ```text
    ///       root
    ///      /    \
    ///    a        b
    ///   / \
    ///  c   d
    /// ```
    fn build_tree() -> (Dom, NodeId, NodeId, NodeId, NodeId, NodeId) {
        let mut dom = Dom::new();
        let root = dom.insert(NodeData::element("main"));
        let a = dom.insert_child(root, NodeData::element("form"));
        let b = dom.insert_child(root, NodeData::element("aside"));
        let c = dom.insert_child(a, NodeData::element("button"));
        let d = dom.insert_child(a, NodeData::element("input"));
        (dom, root, a, b, c, d)
    }

    fn recorder(log: &Rc<RefCell<Vec<String>>>, label: &'static str) -> Listener {
        let log = log.clone();
        Rc::new(move |event: &mut DomEvent| {
            log.borrow_mut().push(format!("{label}:{}", event.name));
        })
    }

    #[test]
    fn bubble_path_from_leaf() {
        let (dom, root, a, _, c, _) = build_tree();
        assert_eq!(bubble_path(&dom, c), vec![c, a, root]);
    }

    #[test]
    fn bubble_path_from_root() {
        let (dom, root, ..) = build_tree();
        assert_eq!(bubble_path(&dom, root), vec![root]);
    }

    #[test]
    fn bubble_path_nonexistent_node() {
        let (mut dom, ..) = build_tree();
        let stale = dom.insert(NodeData::element("ghost"));
        dom.remove(stale);
        assert!(bubble_path(&dom, stale).is_empty());
    }

    #[test]
    fn dispatch_bubbles_to_ancestors() {
        let (mut dom, root, a, b, c, _) = build_tree();
        let log = Rc::new(RefCell::new(Vec::new()));
        dom.add_listener(c, "click", recorder(&log, "button"));
        dom.add_listener(a, "click", recorder(&log, "form"));
        dom.add_listener(b, "click", recorder(&log, "aside"));
        dom.add_listener(root, "click", recorder(&log, "main"));
        dom.add_listener(root, "submit", recorder(&log, "main"));
        let dom = RefCell::new(dom);

        dispatch(&dom, c, "click");
        assert_eq!(*log.borrow(), vec!["button:click", "form:click", "main:click"]);
    }

    #[test]
    fn stop_propagation_finishes_current_node() {
        let (mut dom, root, a, _, c, _) = build_tree();
        let log = Rc::new(RefCell::new(Vec::new()));
        dom.add_listener(c, "click", Rc::new(|event: &mut DomEvent| event.stop_propagation()));
        dom.add_listener(c, "click", recorder(&log, "button"));
        dom.add_listener(a, "click", recorder(&log, "form"));
        dom.add_listener(root, "click", recorder(&log, "main"));
        let dom = RefCell::new(dom);

        let event = dispatch(&dom, c, "click");
        assert!(event.propagation_stopped());
        assert_eq!(*log.borrow(), vec!["button:click"]);
    }

    #[test]
    fn listeners_may_mutate_the_document() {
        let (mut dom, _, a, _, c, d) = build_tree();
        let dom_cell: Rc<RefCell<Dom>> = Rc::new(RefCell::new(Dom::new()));
        let weak = Rc::downgrade(&dom_cell);
        dom.add_listener(
            c,
            "click",
            Rc::new(move |_: &mut DomEvent| {
                if let Some(dom) = weak.upgrade() {
                    Document::remove(&mut *dom.borrow_mut(), d);
                }
            }),
        );
        *dom_cell.borrow_mut() = dom;

        let event = dispatch(&dom_cell, c, "click");
        assert_eq!(event.current, dom_cell.borrow().ancestors(c)[1]);
        assert_eq!(dom_cell.borrow().children(a), &[c]);
    }

    #[test]
    fn prevent_default_is_reported() {
        let (mut dom, _, _, _, c, _) = build_tree();
        dom.add_listener(c, "submit", Rc::new(|event: &mut DomEvent| event.prevent_default()));
        let dom = RefCell::new(dom);
        assert!(dispatch(&dom, c, "submit").default_prevented());
        assert!(!dispatch(&dom, c, "click").default_prevented());
    }
}
