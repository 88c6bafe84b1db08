//! Taskdeck Server - Search server
//!
//! This crate provides:
//! - JSON-RPC server over HTTP and WebSocket
//! - A search session fed by pushed workspace snapshots
//! - Recent-search persistence in a data directory

pub mod error;
pub mod handler;
pub mod server;

pub use error::*;
pub use handler::*;
pub use server::*;
