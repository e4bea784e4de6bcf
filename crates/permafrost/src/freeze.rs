//! Freeze utilities.
//!
//! Freezing flips the per-container flag that the checked mutation API
//! honors; it never clones. Primitives are trivially frozen.

use crate::node::Node;

/// Freeze one container, leaving children alone.
pub(crate) fn freeze_shallow(node: &Node) {
    match node {
        Node::Array(arr) => arr.set_frozen(),
        Node::Object(obj) => obj.set_frozen(),
        _ => {}
    }
}

/// Recursively freeze `node` and every container reachable from it.
pub fn deep_freeze(node: Node) -> Node {
    freeze_recur(&node);
    node
}

fn freeze_recur(node: &Node) {
    match node {
        Node::Array(arr) => {
            for child in arr.elems() {
                freeze_recur(child);
            }
            arr.set_frozen();
        }
        Node::Object(obj) => {
            for child in obj.entries().values() {
                freeze_recur(child);
            }
            obj.set_frozen();
        }
        _ => {}
    }
}

/// Whether this node's own entries are unwritable.
pub fn is_frozen(node: &Node) -> bool {
    match node {
        Node::Array(arr) => arr.is_frozen(),
        Node::Object(obj) => obj.is_frozen(),
        _ => true,
    }
}

/// Whether this node and every container reachable from it are frozen.
pub fn is_deep_frozen(node: &Node) -> bool {
    match node {
        Node::Array(arr) => arr.is_frozen() && arr.elems().iter().all(is_deep_frozen),
        Node::Object(obj) => obj.is_frozen() && obj.entries().values().all(is_deep_frozen),
        _ => true,
    }
}
