//! Batching several updates against one base tree.

use permafrost_path::Path;

use crate::engine::Engine;
use crate::node::Node;

/// Accumulates a sequence of update operations against one evolving tree.
///
/// Each call rebinds the working tree to the operation's result, so later
/// operations see earlier ones; [`ModifyContext::finish`] hands back the
/// final root. Composes exactly like the equivalent chain of single
/// [`Engine`] calls.
///
/// # Examples
///
/// ```
/// use permafrost::{path, Engine, Node};
/// use serde_json::json;
///
/// let engine = Engine::new();
/// let root = Node::from(json!({"count": 1}));
/// let mut batch = engine.batch(&root);
/// batch.increment(&path!["count"], 2.0);
/// batch.replace(&path!["tag"], "ready");
/// assert_eq!(batch.finish().to_value(), json!({"count": 3, "tag": "ready"}));
/// ```
pub struct ModifyContext<'e> {
    engine: &'e Engine,
    data: Node,
}

impl<'e> ModifyContext<'e> {
    pub(crate) fn new(engine: &'e Engine, data: Node) -> Self {
        ModifyContext { engine, data }
    }

    /// The tree as modified so far.
    pub fn modified(&self) -> &Node {
        &self.data
    }

    /// Finish the batch and return the final tree.
    pub fn finish(self) -> Node {
        self.data
    }

    pub fn replace(&mut self, path: &Path, value: impl Into<Node>) -> &mut Self {
        self.data = self.engine.replace(&self.data, path, value);
        self
    }

    pub fn update(&mut self, path: &Path, value: impl Into<Node>) -> &mut Self {
        self.data = self.engine.update(&self.data, path, value);
        self
    }

    pub fn deep_update(&mut self, path: &Path, value: impl Into<Node>) -> &mut Self {
        self.data = self.engine.deep_update(&self.data, path, value);
        self
    }

    pub fn apply_diff(&mut self, path: &Path, patch: impl Into<Node>) -> &mut Self {
        self.data = self.engine.apply_diff(&self.data, path, patch);
        self
    }

    pub fn remove(&mut self, path: &Path) -> &mut Self {
        self.data = self.engine.remove(&self.data, path);
        self
    }

    pub fn increment(&mut self, path: &Path, delta: f64) -> &mut Self {
        self.data = self.engine.increment(&self.data, path, delta);
        self
    }

    pub fn array_push<I>(&mut self, path: &Path, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<Node>,
    {
        self.data = self.engine.array_push(&self.data, path, values);
        self
    }

    pub fn array_concat<I>(&mut self, path: &Path, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<Node>,
    {
        self.data = self.engine.array_concat(&self.data, path, values);
        self
    }

    pub fn array_unshift<I>(&mut self, path: &Path, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<Node>,
    {
        self.data = self.engine.array_unshift(&self.data, path, values);
        self
    }

    pub fn array_pop(&mut self, path: &Path) -> &mut Self {
        self.data = self.engine.array_pop(&self.data, path);
        self
    }

    pub fn array_shift(&mut self, path: &Path) -> &mut Self {
        self.data = self.engine.array_shift(&self.data, path);
        self
    }

    pub fn array_slice(&mut self, path: &Path, start: i64, end: Option<i64>) -> &mut Self {
        self.data = self.engine.array_slice(&self.data, path, start, end);
        self
    }

    pub fn array_splice<I>(
        &mut self,
        path: &Path,
        index: i64,
        delete_count: usize,
        values: I,
    ) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<Node>,
    {
        self.data = self
            .engine
            .array_splice(&self.data, path, index, delete_count, values);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::freeze::is_deep_frozen;
    use permafrost_path::path;
    use serde_json::json;

    #[test]
    fn batch_composes_like_single_operations() {
        let engine = Engine::new();
        let root = Node::from(json!({"a": {"n": 1}, "list": [1, 2]}));

        let mut batch = engine.batch(&root);
        batch
            .increment(&path!["a", "n"], 4.0)
            .array_push(&path!["list"], [Node::from(3)])
            .remove(&path!["a", "gone"]);
        let batched = batch.finish();

        let mut stepped = engine.increment(&root, &path!["a", "n"], 4.0);
        stepped = engine.array_push(&stepped, &path!["list"], [Node::from(3)]);
        stepped = engine.remove(&stepped, &path!["a", "gone"]);

        assert_eq!(batched, stepped);
        assert_eq!(
            batched.to_value(),
            json!({"a": {"n": 5}, "list": [1, 2, 3]})
        );
    }

    #[test]
    fn untouched_subtrees_survive_the_batch_by_reference() {
        let engine = Engine::new();
        let root = Node::from(json!({"keep": {"deep": true}, "n": 0}));
        let mut batch = engine.batch(&root);
        batch.increment(&path!["n"], 1.0);
        let out = batch.finish();
        assert!(Node::same(
            out.as_object().unwrap().get("keep").unwrap(),
            root.as_object().unwrap().get("keep").unwrap()
        ));
    }

    #[test]
    fn finished_batch_is_frozen_per_policy() {
        let engine = Engine::new();
        let root = crate::freeze::deep_freeze(Node::from(json!({"n": 0})));
        let mut batch = engine.batch(&root);
        batch.replace(&path!["n"], 1);
        assert!(is_deep_frozen(&batch.finish()));
    }
}
