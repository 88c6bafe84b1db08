//! Taskdeck Client - Client library for connecting to Taskdeck search servers
//!
//! This crate provides:
//! - JSON-RPC client for communicating with servers
//! - High-level API for indexing, searching and recent searches

pub mod client;
pub mod error;

pub use client::*;
pub use error::*;
