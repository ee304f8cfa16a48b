//! In-memory entity store and secondary indexes.
//!
//! # Responsibility
//! - Hold the single owned copy of all entities for one process.
//! - Maintain lookup buckets used by the query engine.
//!
//! # Invariants
//! - Mutation requires `&mut EntityStore`; there is no internal locking.
//!   Embedders sharing a store across threads must serialize access.

mod entity_store;
mod index;

pub use entity_store::EntityStore;
pub use index::{Bucket, TaskIndex};
