//! Record primitives shared by every retrieval step
//!
//! Query rows arrive as JSON objects. This module provides the scalar view of
//! those rows, the dot-path resolver used for projections and foreign keys,
//! the catalog set registry and the query template expansion.

pub mod path;
pub mod sets;
pub mod template;
pub mod value;

pub use path::{record_id, resolve_path};
pub use sets::CatalogSets;
pub use template::{build_query, expand_template, in_list, placeholders, CHUNK_SIZE};
pub use value::Value;
