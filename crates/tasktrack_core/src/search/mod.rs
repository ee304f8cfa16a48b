//! Task query entry points.
//!
//! # Responsibility
//! - Define the structured filter (`TaskFilter`) and sort specification.
//! - Evaluate filters against the entity store indexes.
//! - Parse free-text query strings into filters.
//!
//! # See also
//! - crate::store::TaskIndex for the buckets this module intersects.

pub mod engine;
pub mod filter;
pub mod parser;

pub use engine::{search, TaskView};
pub use filter::{SortDirection, SortField, SortSpec, TaskFilter};
pub use parser::{parse_due_cutoff, parse_query};
