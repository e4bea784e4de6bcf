//! Structural compare-and-merge.
//!
//! [`cmp_and_set_or_merge`] recursively combines a destination and a source
//! value under one of four semantics and returns the minimally different
//! result: the destination's own reference when nothing changed, otherwise
//! a freshly built container whose unchanged children are shared with the
//! destination. The four independent flags make replace, shallow merge,
//! deep merge, and diff application variations of one walk.

use indexmap::IndexMap;

use crate::clone::deep_clone;
use crate::engine::Engine;
use crate::node::{ArrayNode, Kind, Node, ObjectNode, HOLE};

/// The four merge switches.
///
/// `merge_*` control whether the top-level container unions/extends rather
/// than replaces; `deep_merge_*` control whether that behavior propagates
/// into nested containers. Recursion rewrites the `merge_*` pair from the
/// `deep_merge_*` pair, so shallow merge extends the top container while
/// replacing children wholesale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MergeFlags {
    pub merge_objects: bool,
    pub merge_arrays: bool,
    pub deep_merge_objects: bool,
    pub deep_merge_arrays: bool,
}

impl MergeFlags {
    /// Replace semantics: keys absent from the source are deleted, arrays
    /// take the source length.
    pub const SET: MergeFlags = MergeFlags {
        merge_objects: false,
        merge_arrays: false,
        deep_merge_objects: false,
        deep_merge_arrays: false,
    };

    /// Shallow merge: object union / elementwise array extension at the top,
    /// children replaced wholesale.
    pub const MERGE: MergeFlags = MergeFlags {
        merge_objects: true,
        merge_arrays: true,
        deep_merge_objects: false,
        deep_merge_arrays: false,
    };

    /// Deep merge: object conflicts recurse with merge semantics; nested
    /// arrays still replace.
    pub const DEEP_MERGE: MergeFlags = MergeFlags {
        merge_objects: true,
        merge_arrays: true,
        deep_merge_objects: true,
        deep_merge_arrays: false,
    };

    /// Diff application: deep merge on both containers, honoring REMOVE
    /// markers and sparse holes anywhere in the source.
    pub const APPLY_DIFF: MergeFlags = MergeFlags {
        merge_objects: true,
        merge_arrays: true,
        deep_merge_objects: true,
        deep_merge_arrays: true,
    };

    fn child(self) -> MergeFlags {
        MergeFlags {
            merge_objects: self.deep_merge_objects,
            merge_arrays: self.deep_merge_arrays,
            deep_merge_objects: self.deep_merge_objects,
            deep_merge_arrays: self.deep_merge_arrays,
        }
    }
}

/// Combine `dst` and `src` under `flags`.
///
/// `dst` is `None` when the destination slot does not exist. Returns the
/// destination reference untouched when the source brings no change.
pub(crate) fn cmp_and_set_or_merge(
    engine: &Engine,
    dst: Option<&Node>,
    src: &Node,
    flags: MergeFlags,
) -> Node {
    let dst = match dst {
        Some(d) if Node::same(d, src) => return d.clone(),
        Some(d) if d.kind() == src.kind() => d,
        _ => {
            // Kind mismatch or missing destination: the source wins wholesale.
            return match src.kind() {
                Kind::Array | Kind::Object => deep_clone(src, engine.freeze_enabled()),
                _ => src.clone(),
            };
        }
    };

    match (dst, src) {
        (Node::Array(d), Node::Array(s)) => merge_arrays(engine, dst, d, s, flags),
        (Node::Object(d), Node::Object(s)) => merge_objects(engine, dst, d, s, flags),
        _ => src.clone(),
    }
}

fn merge_arrays(
    engine: &Engine,
    dst_node: &Node,
    dst: &ArrayNode,
    src: &ArrayNode,
    flags: MergeFlags,
) -> Node {
    let desired = if flags.merge_arrays {
        dst.len().max(src.len())
    } else {
        src.len()
    };
    let child_flags = flags.child();

    // Clone-on-first-write; a length change forces the clone up front, with
    // holes padding indices the destination does not cover yet.
    let mut out: Option<Vec<Node>> = if dst.len() == desired {
        None
    } else {
        let mut elems = dst.elems()[..dst.len().min(desired)].to_vec();
        elems.resize(desired, HOLE);
        Some(elems)
    };

    // Back to front so removals do not shift unvisited indices.
    for i in (0..desired).rev() {
        let src_child = match src.elems().get(i) {
            // Sparse or absent source position: the destination value stays.
            None => continue,
            Some(c) if c.is_hole() => continue,
            Some(c) => c,
        };
        let existing = dst.elems().get(i);
        let new_val = cmp_and_set_or_merge(engine, existing, src_child, child_flags);
        let changed = match existing {
            None => !new_val.is_remove(),
            Some(e) => !Node::same(e, &new_val),
        };
        if !changed {
            continue;
        }
        let elems = out.get_or_insert_with(|| dst.elems().to_vec());
        if new_val.is_remove() {
            if i < elems.len() {
                elems.remove(i);
            }
        } else {
            elems[i] = new_val;
        }
    }

    match out {
        None => dst_node.clone(),
        Some(mut elems) => {
            // Pad positions never covered by the source would otherwise leak.
            elems.retain(|n| !n.is_hole());
            engine.seal(Node::array(elems))
        }
    }
}

fn merge_objects(
    engine: &Engine,
    dst_node: &Node,
    dst: &ObjectNode,
    src: &ObjectNode,
    flags: MergeFlags,
) -> Node {
    let child_flags = flags.child();
    let mut out: Option<IndexMap<String, Node>> = None;

    for (key, src_child) in src.entries() {
        if src_child.is_hole() {
            continue;
        }
        let existing = dst.get(key);
        let new_val = cmp_and_set_or_merge(engine, existing, src_child, child_flags);
        let changed = match existing {
            None => !new_val.is_remove(),
            Some(e) => !Node::same(e, &new_val),
        };
        if !changed {
            continue;
        }
        let entries = out.get_or_insert_with(|| dst.entries().clone());
        if new_val.is_remove() {
            entries.shift_remove(key.as_str());
        } else {
            entries.insert(key.clone(), new_val);
        }
    }

    if !flags.merge_objects {
        // Replace semantics: keys the source does not mention are deleted.
        for key in dst.entries().keys() {
            if src.entries().contains_key(key) {
                continue;
            }
            out.get_or_insert_with(|| dst.entries().clone())
                .shift_remove(key.as_str());
        }
    }

    match out {
        None => dst_node.clone(),
        Some(entries) => engine.seal(Node::object(entries)),
    }
}
