//! Clone utilities.
//!
//! `deep_clone` is the policy-driven clone underneath the merge and array
//! operations: it decouples a source subtree from whatever mutable
//! references the caller may still hold, and freezes the copies when the
//! policy asks for it. The mutable variants are caller-facing escape
//! hatches for handing a tree back to imperative code.

use indexmap::IndexMap;

use crate::freeze::freeze_shallow;
use crate::node::Node;

/// Deep structural clone.
///
/// Marker children never make it into the copy: a `REMOVE` child is dropped
/// (it means the entry is gone) and a `HOLE` child becomes `null`. These
/// only occur when a patch subtree is cloned wholesale into a slot whose
/// previous value had a different type.
pub(crate) fn deep_clone(node: &Node, freeze: bool) -> Node {
    match node {
        Node::Array(arr) => {
            let mut elems = Vec::with_capacity(arr.len());
            for child in arr.elems() {
                if child.is_remove() {
                    continue;
                }
                elems.push(if child.is_hole() {
                    Node::Null
                } else {
                    deep_clone(child, freeze)
                });
            }
            seal_if(Node::array(elems), freeze)
        }
        Node::Object(obj) => {
            let mut entries = IndexMap::with_capacity(obj.len());
            for (key, child) in obj.entries() {
                if child.is_remove() {
                    continue;
                }
                entries.insert(
                    key.clone(),
                    if child.is_hole() {
                        Node::Null
                    } else {
                        deep_clone(child, freeze)
                    },
                );
            }
            seal_if(Node::object(entries), freeze)
        }
        other => other.clone(),
    }
}

fn seal_if(node: Node, freeze: bool) -> Node {
    if freeze {
        freeze_shallow(&node);
    }
    node
}

/// Deep clone with every container left unfrozen.
pub fn clone_mutable(node: &Node) -> Node {
    deep_clone(node, false)
}

/// One-level clone: a fresh unfrozen container whose children are shared
/// with the original.
pub fn shallow_clone_mutable(node: &Node) -> Node {
    match node {
        Node::Array(arr) => Node::array(arr.elems().to_vec()),
        Node::Object(obj) => Node::object(obj.entries().clone()),
        other => other.clone(),
    }
}
