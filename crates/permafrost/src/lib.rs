//! Structural-sharing copy-on-write updates for JSON-like trees.
//!
//! Given an immutable tree, a path, and a new value, every operation here
//! returns a new tree in which only the spine from the root to the changed
//! leaf is new; all untouched subtrees are shared by reference with the
//! original. The "unchanged" check is reference identity, never deep
//! equality, so a no-op update costs one walk and returns the original
//! root itself.
//!
//! ```
//! use permafrost::{path, Engine, Node};
//! use serde_json::json;
//!
//! let engine = Engine::new();
//! let root = Node::from(json!({"settings": {"theme": "dark"}, "todo": ["a"]}));
//!
//! let next = engine.array_push(&root, &path!["todo"], [Node::from("b")]);
//! assert_eq!(next.to_value(), json!({"settings": {"theme": "dark"}, "todo": ["a", "b"]}));
//!
//! // The untouched subtree is the very same node as before.
//! let before = root.as_object().unwrap().get("settings").unwrap();
//! let after = next.as_object().unwrap().get("settings").unwrap();
//! assert!(Node::same(before, after));
//!
//! // A change that changes nothing returns the original root.
//! assert!(Node::same(&engine.replace(&root, &path!["todo", 0], "a"), &root));
//! ```
//!
//! Updates come in four merge semantics (replace, shallow merge, deep
//! merge, diff application) plus increment and array surgery; [`Engine`]
//! holds the freeze policy, [`Engine::diff`] produces patches for
//! [`Engine::apply_diff`], and [`Engine::batch`] chains several operations
//! against one base tree.

mod clone;
mod context;
mod diff;
mod engine;
mod freeze;
mod merge;
mod modify;
mod node;

pub use clone::{clone_mutable, shallow_clone_mutable};
pub use context::ModifyContext;
pub use engine::{Engine, EntryKey};
pub use freeze::{deep_freeze, is_deep_frozen, is_frozen};
pub use node::{ArrayNode, Kind, MutateError, Node, ObjectNode, HOLE, REMOVE};

pub use permafrost_path::{
    path, Accessor, AccessorError, AccessorStep, Path, PathStep,
};
