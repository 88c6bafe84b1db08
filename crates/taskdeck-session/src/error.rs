//! Error types for taskdeck-session

use taskdeck_core::WorkspaceId;
use taskdeck_search::SearchError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Upstream source error: {0}")]
    Source(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid session config: {0}")]
    InvalidConfig(String),

    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    #[error("Unknown workspace: {0}")]
    UnknownWorkspace(WorkspaceId),

    #[error("A keyboard listener is already attached")]
    ListenerAttached,

    #[error("Index worker stopped")]
    WorkerStopped,

    #[error("Index command queue is full")]
    QueueFull,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SessionError>;
