//! The public operation surface.
//!
//! Every update operation hangs off [`Engine`], the freeze-policy handle.
//! Operations never mutate their inputs: each takes a root by reference and
//! returns a new root sharing every untouched subtree with the original.

use indexmap::IndexMap;
use permafrost_path::Path;

use crate::clone::deep_clone;
use crate::context::ModifyContext;
use crate::diff::diff_nodes;
use crate::freeze::freeze_shallow;
use crate::merge::{cmp_and_set_or_merge, MergeFlags};
use crate::modify::{literal, modify, NewValue, UpdateOp};
use crate::node::{Node, REMOVE};

/// Key handed to the [`Engine::map`] callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKey<'a> {
    Index(usize),
    Key(&'a str),
}

/// Configuration handle and operation surface.
///
/// The freeze policy is fixed at construction: with freezing on (the
/// default) every container a mutating operation builds is frozen before it
/// is returned, so results are unwritable through the checked mutation API.
/// [`Engine::with_freeze`] with `false` opts out; results are then ordinary
/// mutable containers and the safety guarantee is the caller's problem.
///
/// # Examples
///
/// ```
/// use permafrost::{path, Engine, Node};
/// use serde_json::json;
///
/// let engine = Engine::new();
/// let root = Node::from(json!({"users": [{"name": "ada"}]}));
/// let updated = engine.replace(&root, &path!["users", 0, "name"], "grace");
/// assert_eq!(updated.to_value(), json!({"users": [{"name": "grace"}]}));
/// ```
#[derive(Debug, Clone)]
pub struct Engine {
    freeze: bool,
}

impl Default for Engine {
    fn default() -> Self {
        Engine { freeze: true }
    }
}

impl Engine {
    /// Engine with output freezing enabled.
    pub fn new() -> Self {
        Engine::default()
    }

    /// Engine with an explicit freeze policy.
    pub fn with_freeze(freeze: bool) -> Self {
        Engine { freeze }
    }

    pub fn freeze_enabled(&self) -> bool {
        self.freeze
    }

    /// Freeze a freshly built container per policy and hand it back.
    pub(crate) fn seal(&self, node: Node) -> Node {
        if self.freeze {
            freeze_shallow(&node);
        }
        node
    }

    // ── Path updates ──────────────────────────────────────────────────────

    /// Replace semantics at `path`: the value is taken wholesale, object
    /// keys absent from it are deleted, arrays take its length.
    pub fn replace(&self, root: &Node, path: &Path, value: impl Into<Node>) -> Node {
        modify(
            self,
            root,
            path,
            literal(value.into()),
            &UpdateOp::Merge(MergeFlags::SET),
        )
    }

    /// Replace with a computed leaf; `f` receives the current leaf value,
    /// or `None` when the path does not resolve yet. Returning [`REMOVE`]
    /// deletes the leaf.
    pub fn replace_with<F>(&self, root: &Node, path: &Path, f: F) -> Node
    where
        F: FnOnce(Option<&Node>) -> Node,
    {
        modify(
            self,
            root,
            path,
            NewValue::Compute(f),
            &UpdateOp::Merge(MergeFlags::SET),
        )
    }

    /// Shallow-merge semantics at `path`: object keys union, arrays extend
    /// elementwise to the longer length, nested containers replace.
    pub fn update(&self, root: &Node, path: &Path, value: impl Into<Node>) -> Node {
        modify(
            self,
            root,
            path,
            literal(value.into()),
            &UpdateOp::Merge(MergeFlags::MERGE),
        )
    }

    /// [`Engine::update`] with a computed leaf.
    pub fn update_with<F>(&self, root: &Node, path: &Path, f: F) -> Node
    where
        F: FnOnce(Option<&Node>) -> Node,
    {
        modify(
            self,
            root,
            path,
            NewValue::Compute(f),
            &UpdateOp::Merge(MergeFlags::MERGE),
        )
    }

    /// Deep-merge semantics at `path`: like [`Engine::update`], but nested
    /// object conflicts keep merging instead of replacing.
    pub fn deep_update(&self, root: &Node, path: &Path, value: impl Into<Node>) -> Node {
        modify(
            self,
            root,
            path,
            literal(value.into()),
            &UpdateOp::Merge(MergeFlags::DEEP_MERGE),
        )
    }

    /// [`Engine::deep_update`] with a computed leaf.
    pub fn deep_update_with<F>(&self, root: &Node, path: &Path, f: F) -> Node
    where
        F: FnOnce(Option<&Node>) -> Node,
    {
        modify(
            self,
            root,
            path,
            NewValue::Compute(f),
            &UpdateOp::Merge(MergeFlags::DEEP_MERGE),
        )
    }

    /// Apply a patch produced by [`Engine::diff`] at `path`, honoring
    /// `REMOVE` markers and sparse holes anywhere inside it.
    pub fn apply_diff(&self, root: &Node, path: &Path, patch: impl Into<Node>) -> Node {
        modify(
            self,
            root,
            path,
            literal(patch.into()),
            &UpdateOp::Merge(MergeFlags::APPLY_DIFF),
        )
    }

    /// Delete the key/index at `path`. A path that does not resolve to an
    /// existing location is a no-op returning the original root reference.
    pub fn remove(&self, root: &Node, path: &Path) -> Node {
        modify(
            self,
            root,
            path,
            literal(REMOVE),
            &UpdateOp::Merge(MergeFlags::SET),
        )
    }

    /// Add `delta` to the number at `path`; a missing or non-numeric target
    /// takes `delta` as a fresh write.
    pub fn increment(&self, root: &Node, path: &Path, delta: f64) -> Node {
        modify(
            self,
            root,
            path,
            literal(Node::Number(delta)),
            &UpdateOp::Increment,
        )
    }

    // ── Array surgery ─────────────────────────────────────────────────────

    /// Append `values` to the array at `path`, creating it if absent.
    pub fn array_push<I>(&self, root: &Node, path: &Path, values: I) -> Node
    where
        I: IntoIterator,
        I::Item: Into<Node>,
    {
        let values: Vec<Node> = values.into_iter().map(Into::into).collect();
        modify(
            self,
            root,
            path,
            literal(Node::array(values)),
            &UpdateOp::Join { at_front: false },
        )
    }

    /// Append every element of `values` to the array at `path`; same
    /// semantics as [`Engine::array_push`].
    pub fn array_concat<I>(&self, root: &Node, path: &Path, values: I) -> Node
    where
        I: IntoIterator,
        I::Item: Into<Node>,
    {
        self.array_push(root, path, values)
    }

    /// Prepend `values` to the array at `path`, creating it if absent.
    pub fn array_unshift<I>(&self, root: &Node, path: &Path, values: I) -> Node
    where
        I: IntoIterator,
        I::Item: Into<Node>,
    {
        let values: Vec<Node> = values.into_iter().map(Into::into).collect();
        modify(
            self,
            root,
            path,
            literal(Node::array(values)),
            &UpdateOp::Join { at_front: true },
        )
    }

    /// Drop the last element of the array at `path`; a missing array
    /// becomes an empty one.
    pub fn array_pop(&self, root: &Node, path: &Path) -> Node {
        modify(
            self,
            root,
            path,
            literal(Node::Null),
            &UpdateOp::Slice {
                start: 0,
                end: Some(-1),
            },
        )
    }

    /// Drop the first element of the array at `path`; a missing array
    /// becomes an empty one.
    pub fn array_shift(&self, root: &Node, path: &Path) -> Node {
        modify(
            self,
            root,
            path,
            literal(Node::Null),
            &UpdateOp::Slice {
                start: 1,
                end: None,
            },
        )
    }

    /// Keep `[start, end)` of the array at `path`. Negative indices count
    /// from the end; `None` runs to the end.
    pub fn array_slice(&self, root: &Node, path: &Path, start: i64, end: Option<i64>) -> Node {
        modify(
            self,
            root,
            path,
            literal(Node::Null),
            &UpdateOp::Slice { start, end },
        )
    }

    /// Replace `delete_count` elements at `index` with `values`.
    pub fn array_splice<I>(
        &self,
        root: &Node,
        path: &Path,
        index: i64,
        delete_count: usize,
        values: I,
    ) -> Node
    where
        I: IntoIterator,
        I::Item: Into<Node>,
    {
        let values: Vec<Node> = values.into_iter().map(Into::into).collect();
        modify(
            self,
            root,
            path,
            literal(Node::array(values)),
            &UpdateOp::Splice {
                index,
                delete_count,
            },
        )
    }

    // ── Whole-tree operations ─────────────────────────────────────────────

    /// Deep structural clone, decoupled from the source and frozen per
    /// policy.
    pub fn clone_tree(&self, node: &Node) -> Node {
        deep_clone(node, self.freeze)
    }

    /// Keep only the entries/elements satisfying `pred`. Returns the
    /// original reference when nothing was dropped.
    pub fn filter<F>(&self, container: &Node, mut pred: F) -> Node
    where
        F: FnMut(&Node) -> bool,
    {
        match container {
            Node::Array(arr) => {
                let mut out = Vec::with_capacity(arr.len());
                for child in arr.elems() {
                    if pred(child) {
                        out.push(child.clone());
                    }
                }
                if out.len() == arr.len() {
                    container.clone()
                } else {
                    self.seal(Node::array(out))
                }
            }
            Node::Object(obj) => {
                let mut changed = false;
                let mut out = IndexMap::with_capacity(obj.len());
                for (key, child) in obj.entries() {
                    if pred(child) {
                        out.insert(key.clone(), child.clone());
                    } else {
                        changed = true;
                    }
                }
                if changed {
                    self.seal(Node::object(out))
                } else {
                    container.clone()
                }
            }
            other => other.clone(),
        }
    }

    /// Rebuild every entry/element through `f`. Runs through replace
    /// semantics, so children `f` returns unchanged keep their identity,
    /// and a callback that changes nothing returns the original reference.
    pub fn map<F>(&self, container: &Node, mut f: F) -> Node
    where
        F: FnMut(&Node, EntryKey<'_>) -> Node,
    {
        let mapped = match container {
            Node::Array(arr) => Node::array(
                arr.elems()
                    .iter()
                    .enumerate()
                    .map(|(i, child)| f(child, EntryKey::Index(i)))
                    .collect(),
            ),
            Node::Object(obj) => Node::object(
                obj.entries()
                    .iter()
                    .map(|(key, child)| (key.clone(), f(child, EntryKey::Key(key))))
                    .collect(),
            ),
            other => return other.clone(),
        };
        cmp_and_set_or_merge(self, Some(container), &mapped, MergeFlags::SET)
    }

    /// Structural difference from `old_tree` to `new_tree`; `None` when
    /// they are the same reference. Feed the patch to
    /// [`Engine::apply_diff`].
    pub fn diff(&self, new_tree: &Node, old_tree: &Node) -> Option<Node> {
        diff_nodes(self, new_tree, old_tree)
    }

    /// Batch several operations against one base tree.
    pub fn batch(&self, root: &Node) -> ModifyContext<'_> {
        ModifyContext::new(self, root.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::freeze::{deep_freeze, is_deep_frozen};
    use permafrost_path::path;
    use serde_json::json;

    fn frozen(v: serde_json::Value) -> Node {
        deep_freeze(Node::from(v))
    }

    #[test]
    fn replace_of_equal_value_returns_the_original() {
        let engine = Engine::new();
        let obj = frozen(json!({"foo": [{"bar": "hello"}]}));
        let out = engine.replace(&obj, &path!["foo", 0, "bar"], "hello");
        assert!(Node::same(&out, &obj));
    }

    #[test]
    fn replace_is_idempotent() {
        let engine = Engine::new();
        let obj = frozen(json!({"foo": [{"bar": "hello"}]}));
        let once = engine.replace(&obj, &path!["foo", 0, "bar"], "changed");
        let twice = engine.replace(&once, &path!["foo", 0, "bar"], "changed");
        assert!(Node::same(&twice, &once));
    }

    #[test]
    fn filter_objects_keeps_surviving_references() {
        let engine = Engine::new();
        let obj = frozen(json!({"a": 1, "b": {"foo": 2}, "c": 2, "d": 3, "e": {"bar": 4}}));
        let out = engine.filter(&obj, |v| v.is_object());
        assert!(!Node::same(&out, &obj));
        assert_eq!(out, Node::from(json!({"b": {"foo": 2}, "e": {"bar": 4}})));
        assert!(Node::same(
            out.as_object().unwrap().get("b").unwrap(),
            obj.as_object().unwrap().get("b").unwrap()
        ));
        assert!(is_deep_frozen(&out));
    }

    #[test]
    fn filter_arrays_keeps_surviving_references() {
        let engine = Engine::new();
        let arr = frozen(json!([1, {"foo": 2}, 2, 3, {"bar": 4}]));
        let out = engine.filter(&arr, |v| v.is_object());
        assert_eq!(out, Node::from(json!([{"foo": 2}, {"bar": 4}])));
        assert!(Node::same(
            out.get(&0usize.into()).unwrap(),
            arr.get(&1usize.into()).unwrap()
        ));
        assert!(is_deep_frozen(&out));
    }

    #[test]
    fn filter_that_drops_nothing_is_a_no_op() {
        let engine = Engine::new();
        let arr = frozen(json!([1, 2, 3]));
        let out = engine.filter(&arr, |_| true);
        assert!(Node::same(&out, &arr));
    }

    #[test]
    fn map_objects_shares_unchanged_children() {
        let engine = Engine::new();
        let obj = frozen(json!({"a": 1, "b": {"foo": 2}, "c": 2, "d": 3, "e": {"bar": 4}}));
        let out = engine.map(&obj, |v, _k| match v.as_f64() {
            Some(n) => Node::from(n + 1.0),
            None => v.clone(),
        });
        assert_eq!(
            out,
            Node::from(json!({"a": 2, "b": {"foo": 2}, "c": 3, "d": 4, "e": {"bar": 4}}))
        );
        assert!(Node::same(
            out.as_object().unwrap().get("e").unwrap(),
            obj.as_object().unwrap().get("e").unwrap()
        ));
        assert!(is_deep_frozen(&out));
    }

    #[test]
    fn map_arrays_shares_unchanged_children() {
        let engine = Engine::new();
        let arr = frozen(json!([1, {"foo": 2}, 2, 3, {"bar": 4}]));
        let out = engine.map(&arr, |v, _k| match v.as_f64() {
            Some(n) => Node::from(n + 1.0),
            None => v.clone(),
        });
        assert_eq!(out, Node::from(json!([2, {"foo": 2}, 3, 4, {"bar": 4}])));
        assert!(Node::same(
            out.get(&1usize.into()).unwrap(),
            arr.get(&1usize.into()).unwrap()
        ));
    }

    #[test]
    fn map_sees_keys_and_indices() {
        let engine = Engine::new();
        let obj = frozen(json!({"a": 0, "b": 0}));
        let out = engine.map(&obj, |_v, k| match k {
            EntryKey::Key(name) => Node::from(name),
            EntryKey::Index(i) => Node::from(i as f64),
        });
        assert_eq!(out, Node::from(json!({"a": "a", "b": "b"})));
    }

    #[test]
    fn unfrozen_engine_leaves_results_writable() {
        let engine = Engine::with_freeze(false);
        let root = Node::from(json!({}));
        let mut out = engine.replace(&root, &path!["a"], 1);
        assert!(!is_deep_frozen(&out));
        out.as_object_mut()
            .unwrap()
            .insert("b".to_string(), Node::from(2));
        assert_eq!(out, Node::from(json!({"a": 1, "b": 2})));
    }
}
