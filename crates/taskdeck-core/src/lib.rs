//! Taskdeck Core - Entity types shared by the search crates
//!
//! This crate defines the upstream data the search service consumes:
//! - `Workspace`: the tenant boundary every entity belongs to
//! - `Task`, `Page`, `Member`: the entity kinds that get indexed
//! - `WorkspaceSnapshot`: one workspace's entity collections at a point in time

pub mod entity;
pub mod workspace;
pub mod error;

pub use entity::*;
pub use workspace::*;
pub use error::*;
