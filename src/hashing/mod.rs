//! Content hashing.
//!
//! [`ContentHasher`] turns bytes, strings and filesystem paths into MD5 hex
//! digests. [`GraphContentHasher`] builds on it to compute one hash per
//! target of a [`Graph`](crate::graph::Graph); those hashes are the keys of
//! the binary cache.

pub mod content;
pub mod graph;

pub use content::{ContentHasher, ContentHashing};
pub use graph::{is_cacheable, GraphContentHasher};
