//! Taskdeck Search - In-memory indexing and querying over workspace entities
//!
//! This crate provides:
//! - Text normalization and tokenization
//! - Adapters from tasks, pages and members to indexable records
//! - An index store keyed by entity kind and id
//! - A query engine with substring and token-set matching and relevance ranking

pub mod adapter;
pub mod engine;
pub mod error;
pub mod index;
pub mod normalize;
pub mod query;
pub mod record;

pub use adapter::*;
pub use engine::*;
pub use error::*;
pub use index::*;
pub use normalize::*;
pub use query::*;
pub use record::*;
