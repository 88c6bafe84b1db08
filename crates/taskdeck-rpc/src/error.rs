//! Error types for taskdeck-rpc

use jsonrpsee::types::ErrorObjectOwned;
use taskdeck_search::SearchError;
use taskdeck_session::SessionError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RpcError {
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Unknown workspace: {0}")]
    UnknownWorkspace(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Source error: {0}")]
    Source(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RpcError {
    pub fn code(&self) -> i32 {
        match self {
            RpcError::InvalidParams(_) => -32602,
            RpcError::Internal(_) => -32603,
            RpcError::UnknownWorkspace(_) => -32001,
            RpcError::Storage(_) => -32002,
            RpcError::Source(_) => -32003,
            RpcError::Serialization(_) => -32700,
        }
    }
}

impl From<SessionError> for RpcError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::UnknownWorkspace(id) => RpcError::UnknownWorkspace(id.to_string()),
            SessionError::Search(e) => RpcError::InvalidParams(e.to_string()),
            SessionError::Storage(_) | SessionError::Io(_) => RpcError::Storage(e.to_string()),
            SessionError::Source(_) => RpcError::Source(e.to_string()),
            SessionError::Serialization(e) => RpcError::Serialization(e),
            other => RpcError::Internal(other.to_string()),
        }
    }
}

impl From<SearchError> for RpcError {
    fn from(e: SearchError) -> Self {
        RpcError::InvalidParams(e.to_string())
    }
}

impl From<RpcError> for ErrorObjectOwned {
    fn from(e: RpcError) -> Self {
        ErrorObjectOwned::owned(e.code(), e.to_string(), None::<()>)
    }
}

pub type Result<T> = std::result::Result<T, RpcError>;
