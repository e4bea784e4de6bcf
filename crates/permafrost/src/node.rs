//! The tree node model.
//!
//! A [`Node`] is a JSON-like value: null, boolean, number, string, array, or
//! object. Containers are reference-counted, so cloning a `Node` is cheap
//! and untouched subtrees of an updated tree are shared with the original.
//! Two sealed marker variants ride along for patch trees: [`REMOVE`]
//! (delete this key/index) and [`HOLE`] (sparse-patch position, index
//! untouched). Markers cannot be built from ordinary values and never
//! appear in data trees produced by this crate.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::Value;
use thiserror::Error;

use permafrost_path::PathStep;

mod sealed {
    /// Keeps the marker variants unconstructible outside this crate.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MarkerTag(pub(crate) ());
}

use sealed::MarkerTag;

/// Deletion sentinel.
///
/// Passed through merge results and diffs to mean "delete this key/index on
/// apply". Never stored in a data tree.
pub const REMOVE: Node = Node::Remove(MarkerTag(()));

/// Sparse-patch hole.
///
/// Marks an array-patch index as untouched; merge semantics skip it. Never
/// stored in a data tree.
pub const HOLE: Node = Node::Hole(MarkerTag(()));

/// Broad classification of a node, used by the merge semantics to decide
/// between recursing and replacing wholesale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Null,
    Primitive,
    Array,
    Object,
}

/// Array container: elements plus the per-container frozen flag.
#[derive(Debug)]
pub struct ArrayNode {
    frozen: Cell<bool>,
    elems: Vec<Node>,
}

impl ArrayNode {
    pub(crate) fn new(elems: Vec<Node>) -> Self {
        ArrayNode {
            frozen: Cell::new(false),
            elems,
        }
    }

    /// The elements, in order.
    pub fn elems(&self) -> &[Node] {
        &self.elems
    }

    pub fn len(&self) -> usize {
        self.elems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.get()
    }

    pub(crate) fn set_frozen(&self) {
        self.frozen.set(true);
    }
}

/// Object container: ordered entries plus the per-container frozen flag.
///
/// Entries keep insertion order; updating an existing key keeps its
/// position, new keys append.
#[derive(Debug)]
pub struct ObjectNode {
    frozen: Cell<bool>,
    entries: IndexMap<String, Node>,
}

impl ObjectNode {
    pub(crate) fn new(entries: IndexMap<String, Node>) -> Self {
        ObjectNode {
            frozen: Cell::new(false),
            entries,
        }
    }

    /// The entries, in insertion order.
    pub fn entries(&self) -> &IndexMap<String, Node> {
        &self.entries
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.get()
    }

    pub(crate) fn set_frozen(&self) {
        self.frozen.set(true);
    }
}

/// Error returned by the checked in-place mutation API.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MutateError {
    #[error("container is frozen")]
    Frozen,
    #[error("container is shared; clone it before mutating")]
    Shared,
    #[error("value is not a container")]
    NotAContainer,
}

/// A JSON-like tree value.
#[derive(Debug, Clone)]
pub enum Node {
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Array(Rc<ArrayNode>),
    Object(Rc<ObjectNode>),
    /// Deletion marker; use the [`REMOVE`] constant.
    Remove(MarkerTag),
    /// Sparse-patch hole; use the [`HOLE`] constant.
    Hole(MarkerTag),
}

impl Node {
    /// Build an array node from elements.
    pub fn array(elems: Vec<Node>) -> Node {
        Node::Array(Rc::new(ArrayNode::new(elems)))
    }

    /// Build an object node from ordered entries.
    pub fn object(entries: IndexMap<String, Node>) -> Node {
        Node::Object(Rc::new(ObjectNode::new(entries)))
    }

    /// Build an object node from key/value pairs.
    pub fn from_entries<K, I>(entries: I) -> Node
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Node)>,
    {
        Node::object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn empty_array() -> Node {
        Node::array(Vec::new())
    }

    pub fn empty_object() -> Node {
        Node::object(IndexMap::new())
    }

    /// Classify this node.
    pub fn kind(&self) -> Kind {
        match self {
            Node::Null => Kind::Null,
            Node::Array(_) => Kind::Array,
            Node::Object(_) => Kind::Object,
            _ => Kind::Primitive,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Node::Null)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Node::Array(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Node::Object(_))
    }

    pub fn is_remove(&self) -> bool {
        matches!(self, Node::Remove(_))
    }

    pub fn is_hole(&self) -> bool {
        matches!(self, Node::Hole(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Node::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Node::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayNode> {
        match self {
            Node::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectNode> {
        match self {
            Node::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Child lookup by path step.
    ///
    /// An integer-looking key steps into an array as an index; everything
    /// else that does not line up returns `None`.
    pub fn get(&self, step: &PathStep) -> Option<&Node> {
        match (self, step) {
            (Node::Array(arr), PathStep::Index(i)) => arr.elems.get(*i),
            (Node::Array(arr), PathStep::Key(k)) => {
                k.parse::<usize>().ok().and_then(|i| arr.elems.get(i))
            }
            (Node::Object(obj), PathStep::Key(k)) => obj.entries.get(k.as_str()),
            _ => None,
        }
    }

    /// Reference identity: the "unchanged, return the original" fast path.
    ///
    /// Containers compare by pointer, primitives by value. This is never a
    /// deep comparison; use `==` for structural equality.
    pub fn same(a: &Node, b: &Node) -> bool {
        match (a, b) {
            (Node::Null, Node::Null) => true,
            (Node::Bool(x), Node::Bool(y)) => x == y,
            (Node::Number(x), Node::Number(y)) => x == y,
            (Node::String(x), Node::String(y)) => Rc::ptr_eq(x, y) || x == y,
            (Node::Array(x), Node::Array(y)) => Rc::ptr_eq(x, y),
            (Node::Object(x), Node::Object(y)) => Rc::ptr_eq(x, y),
            (Node::Remove(_), Node::Remove(_)) => true,
            (Node::Hole(_), Node::Hole(_)) => true,
            _ => false,
        }
    }

    /// Checked mutable access to array elements.
    ///
    /// Rejected with [`MutateError::Frozen`] once the container has been
    /// frozen, and with [`MutateError::Shared`] while any other tree still
    /// shares it. Only meaningful with freezing disabled.
    pub fn as_array_mut(&mut self) -> Result<&mut Vec<Node>, MutateError> {
        match self {
            Node::Array(arr) => {
                if arr.is_frozen() {
                    return Err(MutateError::Frozen);
                }
                Rc::get_mut(arr)
                    .map(|a| &mut a.elems)
                    .ok_or(MutateError::Shared)
            }
            _ => Err(MutateError::NotAContainer),
        }
    }

    /// Checked mutable access to object entries. See [`Node::as_array_mut`].
    pub fn as_object_mut(&mut self) -> Result<&mut IndexMap<String, Node>, MutateError> {
        match self {
            Node::Object(obj) => {
                if obj.is_frozen() {
                    return Err(MutateError::Frozen);
                }
                Rc::get_mut(obj)
                    .map(|o| &mut o.entries)
                    .ok_or(MutateError::Shared)
            }
            _ => Err(MutateError::NotAContainer),
        }
    }

    /// Convert to a `serde_json::Value`.
    ///
    /// Markers have no JSON rendering and map to `null`.
    pub fn to_value(&self) -> Value {
        match self {
            Node::Null | Node::Remove(_) | Node::Hole(_) => Value::Null,
            Node::Bool(b) => Value::Bool(*b),
            Node::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Node::String(s) => Value::String(s.to_string()),
            Node::Array(arr) => Value::Array(arr.elems.iter().map(Node::to_value).collect()),
            Node::Object(obj) => Value::Object(
                obj.entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_value()))
                    .collect(),
            ),
        }
    }
}

/// Deep structural equality. The frozen flag does not participate; shared
/// containers short-circuit by pointer.
impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Node::Null, Node::Null) => true,
            (Node::Bool(x), Node::Bool(y)) => x == y,
            (Node::Number(x), Node::Number(y)) => x == y,
            (Node::String(x), Node::String(y)) => x == y,
            (Node::Array(x), Node::Array(y)) => Rc::ptr_eq(x, y) || x.elems == y.elems,
            (Node::Object(x), Node::Object(y)) => Rc::ptr_eq(x, y) || x.entries == y.entries,
            (Node::Remove(_), Node::Remove(_)) => true,
            (Node::Hole(_), Node::Hole(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_value())
    }
}

impl From<bool> for Node {
    fn from(v: bool) -> Node {
        Node::Bool(v)
    }
}

impl From<f64> for Node {
    fn from(v: f64) -> Node {
        Node::Number(v)
    }
}

impl From<i32> for Node {
    fn from(v: i32) -> Node {
        Node::Number(v as f64)
    }
}

impl From<i64> for Node {
    fn from(v: i64) -> Node {
        Node::Number(v as f64)
    }
}

impl From<&str> for Node {
    fn from(v: &str) -> Node {
        Node::String(Rc::from(v))
    }
}

impl From<String> for Node {
    fn from(v: String) -> Node {
        Node::String(Rc::from(v.as_str()))
    }
}

impl From<Vec<Node>> for Node {
    fn from(elems: Vec<Node>) -> Node {
        Node::array(elems)
    }
}

impl From<&Value> for Node {
    fn from(value: &Value) -> Node {
        match value {
            Value::Null => Node::Null,
            Value::Bool(b) => Node::Bool(*b),
            Value::Number(n) => Node::Number(n.as_f64().unwrap_or_default()),
            Value::String(s) => Node::String(Rc::from(s.as_str())),
            Value::Array(arr) => Node::array(arr.iter().map(Node::from).collect()),
            Value::Object(map) => Node::object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Node::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Node {
        Node::from(&value)
    }
}

impl From<&Node> for Value {
    fn from(node: &Node) -> Value {
        node.to_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kinds() {
        assert_eq!(Node::Null.kind(), Kind::Null);
        assert_eq!(Node::from(true).kind(), Kind::Primitive);
        assert_eq!(Node::from(1.5).kind(), Kind::Primitive);
        assert_eq!(Node::from("x").kind(), Kind::Primitive);
        assert_eq!(Node::empty_array().kind(), Kind::Array);
        assert_eq!(Node::empty_object().kind(), Kind::Object);
        assert_eq!(REMOVE.kind(), Kind::Primitive);
        assert_eq!(HOLE.kind(), Kind::Primitive);
    }

    #[test]
    fn value_round_trip_preserves_structure_and_order() {
        let v = json!({"b": 1, "a": [true, null, "s", 2.5]});
        let node = Node::from(&v);
        assert_eq!(node.to_value(), v);
        let keys: Vec<_> = node.as_object().unwrap().entries().keys().collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn same_is_identity_not_deep_equality() {
        let a = Node::from(json!({"x": 1}));
        let b = Node::from(json!({"x": 1}));
        assert_eq!(a, b);
        assert!(!Node::same(&a, &b));
        assert!(Node::same(&a, &a.clone()));
        // Primitives carry value semantics.
        assert!(Node::same(&Node::from(3), &Node::from(3)));
        assert!(Node::same(&Node::from("s"), &Node::from("s")));
        assert!(!Node::same(&Node::from(3), &Node::from(4)));
    }

    #[test]
    fn markers_compare_by_variant() {
        assert!(Node::same(&REMOVE, &REMOVE));
        assert!(!Node::same(&REMOVE, &HOLE));
        assert!(REMOVE.is_remove());
        assert!(HOLE.is_hole());
    }

    #[test]
    fn get_steps_into_containers() {
        let node = Node::from(json!({"a": [10, 20]}));
        let a = node.get(&PathStep::Key("a".into())).unwrap();
        assert_eq!(a.get(&PathStep::Index(1)), Some(&Node::from(20)));
        // Integer-looking keys index arrays.
        assert_eq!(a.get(&PathStep::Key("0".into())), Some(&Node::from(10)));
        assert_eq!(a.get(&PathStep::Key("x".into())), None);
        assert_eq!(node.get(&PathStep::Index(0)), None);
    }

    #[test]
    fn checked_mutation_rejects_frozen_and_shared() {
        let mut node = Node::from(json!([1, 2]));
        node.as_array_mut().unwrap().push(Node::from(3));
        assert_eq!(node, Node::from(json!([1, 2, 3])));

        let alias = node.clone();
        assert_eq!(node.as_array_mut(), Err(MutateError::Shared));
        drop(alias);

        if let Node::Array(arr) = &node {
            arr.set_frozen();
        }
        assert_eq!(node.as_array_mut(), Err(MutateError::Frozen));
        assert_eq!(Node::from(1).as_array_mut(), Err(MutateError::NotAContainer));
    }
}
