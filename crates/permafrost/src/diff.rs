//! Tree differ.
//!
//! Produces the nested patch consumed by diff-apply semantics: object
//! patches carry sub-diffs, literal values for new keys, and `REMOVE` for
//! dropped keys; array patches are sparse, with `HOLE` at agreeing indices
//! and `REMOVE` past the new length.

use indexmap::IndexMap;

use crate::engine::Engine;
use crate::node::{Node, HOLE, REMOVE};

/// `None` when the trees are the same reference; otherwise the patch that
/// rewrites `old_tree` into `new_tree`.
pub(crate) fn diff_nodes(engine: &Engine, new_tree: &Node, old_tree: &Node) -> Option<Node> {
    if Node::same(new_tree, old_tree) {
        return None;
    }
    Some(diff_recur(engine, new_tree, old_tree))
}

fn diff_recur(engine: &Engine, new_tree: &Node, old_tree: &Node) -> Node {
    if new_tree.kind() != old_tree.kind() {
        return new_tree.clone();
    }

    match (new_tree, old_tree) {
        (Node::Object(new_obj), Node::Object(old_obj)) => {
            let mut patch = IndexMap::new();
            for (key, child) in new_obj.entries() {
                match old_obj.get(key) {
                    None => {
                        patch.insert(key.clone(), child.clone());
                    }
                    Some(old_child) if Node::same(child, old_child) => {}
                    Some(old_child) => {
                        patch.insert(key.clone(), diff_recur(engine, child, old_child));
                    }
                }
            }
            for key in old_obj.entries().keys() {
                if !new_obj.entries().contains_key(key) {
                    patch.insert(key.clone(), REMOVE);
                }
            }
            engine.seal(Node::object(patch))
        }
        (Node::Array(new_arr), Node::Array(old_arr)) => {
            let mut patch = Vec::with_capacity(new_arr.len().max(old_arr.len()));
            for (i, child) in new_arr.elems().iter().enumerate() {
                match old_arr.elems().get(i) {
                    None => patch.push(child.clone()),
                    Some(old_child) if Node::same(child, old_child) => patch.push(HOLE),
                    Some(old_child) => patch.push(diff_recur(engine, child, old_child)),
                }
            }
            for _ in new_arr.len()..old_arr.len() {
                patch.push(REMOVE);
            }
            engine.seal(Node::array(patch))
        }
        _ => new_tree.clone(),
    }
}
