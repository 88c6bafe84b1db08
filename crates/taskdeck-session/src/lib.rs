//! Taskdeck Session - Search session controller
//!
//! This crate provides:
//! - `SearchSession`: keeps the index in step with registered workspaces,
//!   runs searches and remembers recent ones
//! - `IndexWorker`: a background thread applying queued index commands
//! - Keyboard shortcuts for opening and closing the search surface
//! - Key-value persistence for recent searches

pub mod config;
pub mod error;
pub mod keyboard;
pub mod recent;
pub mod session;
pub mod source;
pub mod storage;
pub mod worker;

pub use config::*;
pub use error::*;
pub use keyboard::*;
pub use recent::*;
pub use session::*;
pub use source::*;
pub use storage::*;
pub use worker::*;
