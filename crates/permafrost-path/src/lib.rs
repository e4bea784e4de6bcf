//! Path model for permafrost trees.
//!
//! A [`Path`] is an ordered sequence of object keys and array indices
//! locating one node inside a tree. Paths are built three ways: the fluent
//! builder (`Path::root().key("a").index(0)`), the [`path!`] macro, or by
//! parsing an accessor expression such as `"(root, i) => root.a.b[i].c"`
//! with [`Accessor::parse`].

mod parse;
mod types;

pub use parse::{parse_params, parse_return_path, Accessor, AccessorError, AccessorStep};
pub use types::{Path, PathStep};
