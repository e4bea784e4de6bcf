//! The modify-at-path engine.
//!
//! One walk serves every update operation: descend the path, fabricating
//! missing intermediate containers, compute the new leaf with the selected
//! semantics, then ascend cloning only the ancestors whose child actually
//! changed. Everything above an unchanged child is passed through by
//! reference.

use std::rc::Rc;

use permafrost_path::PathStep;

use crate::clone::deep_clone;
use crate::engine::Engine;
use crate::merge::{cmp_and_set_or_merge, MergeFlags};
use crate::node::Node;

/// Leaf update semantics.
#[derive(Debug, Clone)]
pub(crate) enum UpdateOp {
    Merge(MergeFlags),
    Increment,
    Join { at_front: bool },
    Slice { start: i64, end: Option<i64> },
    Splice { index: i64, delete_count: usize },
}

/// The new leaf: a literal value, or a computation over the current leaf.
pub(crate) enum NewValue<F>
where
    F: FnOnce(Option<&Node>) -> Node,
{
    Literal(Node),
    Compute(F),
}

/// `NewValue` instantiation for plain literals.
pub(crate) fn literal(value: Node) -> NewValue<fn(Option<&Node>) -> Node> {
    NewValue::Literal(value)
}

/// How a recorded ancestor addresses its child.
enum Slot<'p> {
    Index(usize),
    Key(&'p str),
}

fn child_at<'n>(container: &'n Node, slot: &Slot<'_>) -> Option<&'n Node> {
    match (container, slot) {
        (Node::Array(arr), Slot::Index(i)) => arr.elems().get(*i),
        (Node::Object(obj), Slot::Key(k)) => obj.get(k),
        _ => None,
    }
}

/// The core update primitive: apply `op` with `value` at `path` in `root`,
/// returning the new root.
pub(crate) fn modify<F>(
    engine: &Engine,
    root: &Node,
    path: &[PathStep],
    value: NewValue<F>,
    op: &UpdateOp,
) -> Node
where
    F: FnOnce(Option<&Node>) -> Node,
{
    let deleting = matches!(&value, NewValue::Literal(v) if v.is_remove());

    // Downward pass, recording the (possibly coerced) container per level.
    let mut parents: Vec<(Node, Slot<'_>)> = Vec::with_capacity(path.len());
    let mut cursor = Some(root.clone());
    for step in path {
        let current = cursor.take();
        let descended = match (current, step) {
            (Some(n), PathStep::Index(i)) if n.is_array() => Some((n, Slot::Index(*i))),
            (Some(n), PathStep::Key(k)) if n.is_object() => Some((n, Slot::Key(k.as_str()))),
            // An integer-looking key steps into an array as an index.
            (Some(n), PathStep::Key(k)) if n.is_array() => {
                k.parse::<usize>().ok().map(|i| (n, Slot::Index(i)))
            }
            _ => None,
        };
        let (container, slot) = match descended {
            Some(pair) => pair,
            None => {
                if deleting {
                    // Deleting something that is not there must not
                    // fabricate structure; the whole operation is a no-op.
                    return root.clone();
                }
                match step {
                    PathStep::Index(i) => (Node::empty_array(), Slot::Index(*i)),
                    PathStep::Key(k) => (Node::empty_object(), Slot::Key(k.as_str())),
                }
            }
        };
        cursor = child_at(&container, &slot).cloned();
        parents.push((container, slot));
    }

    // Leaf computation.
    let leaf = cursor;
    let resolved = match value {
        NewValue::Literal(v) => v,
        NewValue::Compute(f) => f(leaf.as_ref()),
    };
    let mut new_val = if resolved.is_remove() {
        resolved
    } else {
        apply_op(engine, leaf.as_ref(), resolved, op)
    };

    // Upward pass, cloning only where the child changed.
    for (parent, slot) in parents.into_iter().rev() {
        let changed = match child_at(&parent, &slot) {
            None => !new_val.is_remove(),
            Some(existing) => !Node::same(existing, &new_val),
        };
        new_val = if !changed {
            parent
        } else {
            let built = match (&parent, &slot) {
                (Node::Array(arr), Slot::Index(i)) => {
                    let mut elems = arr.elems().to_vec();
                    if new_val.is_remove() {
                        if *i < elems.len() {
                            elems.remove(*i);
                        }
                    } else {
                        if *i >= elems.len() {
                            // No holes in data arrays; pad the gap.
                            elems.resize(*i + 1, Node::Null);
                        }
                        elems[*i] = new_val;
                    }
                    Node::array(elems)
                }
                (Node::Object(obj), Slot::Key(k)) => {
                    let mut entries = obj.entries().clone();
                    if new_val.is_remove() {
                        entries.shift_remove(*k);
                    } else {
                        entries.insert((*k).to_string(), new_val);
                    }
                    Node::object(entries)
                }
                // Descent never records a mismatched slot.
                _ => parent.clone(),
            };
            engine.seal(built)
        };
    }

    new_val
}

fn apply_op(engine: &Engine, dst: Option<&Node>, src: Node, op: &UpdateOp) -> Node {
    match op {
        UpdateOp::Merge(flags) => cmp_and_set_or_merge(engine, dst, &src, *flags),
        UpdateOp::Increment => increment_number(dst, src),
        UpdateOp::Join { at_front } => array_join(engine, dst, &src, *at_front),
        UpdateOp::Slice { start, end } => array_slice(engine, dst, *start, *end),
        UpdateOp::Splice {
            index,
            delete_count,
        } => array_splice(engine, dst, &src, *index, *delete_count),
    }
}

/// Add to a numeric destination; a missing or non-numeric destination takes
/// the delta as a fresh write.
fn increment_number(dst: Option<&Node>, src: Node) -> Node {
    match (dst, &src) {
        (Some(Node::Number(n)), Node::Number(delta)) => Node::Number(n + delta),
        _ => src,
    }
}

fn array_join(engine: &Engine, dst: Option<&Node>, src: &Node, at_front: bool) -> Node {
    // Inserted values are decoupled from the caller's tree.
    let added = deep_clone(src, engine.freeze_enabled());
    let add_arr = match added {
        Node::Array(ref arr) => Rc::clone(arr),
        other => return other,
    };
    let dst_arr = match dst {
        Some(Node::Array(arr)) => arr,
        _ => return Node::Array(add_arr),
    };
    let mut elems = Vec::with_capacity(dst_arr.len() + add_arr.len());
    if at_front {
        elems.extend(add_arr.elems().iter().cloned());
        elems.extend(dst_arr.elems().iter().cloned());
    } else {
        elems.extend(dst_arr.elems().iter().cloned());
        elems.extend(add_arr.elems().iter().cloned());
    }
    engine.seal(Node::array(elems))
}

fn array_slice(engine: &Engine, dst: Option<&Node>, start: i64, end: Option<i64>) -> Node {
    let elems = match dst {
        Some(Node::Array(arr)) => {
            let len = arr.len();
            let from = clamp_index(start, len);
            let to = end.map_or(len, |e| clamp_index(e, len));
            if from < to {
                arr.elems()[from..to].to_vec()
            } else {
                Vec::new()
            }
        }
        _ => Vec::new(),
    };
    engine.seal(Node::array(elems))
}

fn array_splice(
    engine: &Engine,
    dst: Option<&Node>,
    src: &Node,
    index: i64,
    delete_count: usize,
) -> Node {
    let added = deep_clone(src, engine.freeze_enabled());
    let add_arr = match added {
        Node::Array(ref arr) => Rc::clone(arr),
        other => return other,
    };
    let dst_arr = match dst {
        Some(Node::Array(arr)) => arr,
        _ => return Node::Array(add_arr),
    };
    let len = dst_arr.len();
    let at = clamp_index(index, len);
    let tail = at.saturating_add(delete_count).min(len);
    let mut elems = Vec::with_capacity(len - (tail - at) + add_arr.len());
    elems.extend(dst_arr.elems()[..at].iter().cloned());
    elems.extend(add_arr.elems().iter().cloned());
    elems.extend(dst_arr.elems()[tail..].iter().cloned());
    engine.seal(Node::array(elems))
}

/// Signed, end-relative index clamped to `[0, len]`.
fn clamp_index(i: i64, len: usize) -> usize {
    if i < 0 {
        len.saturating_sub(i.unsigned_abs() as usize)
    } else {
        (i as usize).min(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamping_matches_slice_semantics() {
        assert_eq!(clamp_index(0, 5), 0);
        assert_eq!(clamp_index(7, 5), 5);
        assert_eq!(clamp_index(-1, 5), 4);
        assert_eq!(clamp_index(-9, 5), 0);
    }

    #[test]
    fn increment_falls_back_to_the_delta() {
        let three = Node::from(3);
        assert_eq!(
            increment_number(Some(&Node::from(4)), three.clone()),
            Node::from(7)
        );
        assert_eq!(increment_number(None, three.clone()), three);
        assert_eq!(
            increment_number(Some(&Node::from("x")), three.clone()),
            three
        );
    }
}
