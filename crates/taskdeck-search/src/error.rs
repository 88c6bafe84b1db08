//! Error types for taskdeck-search

use taskdeck_core::EntityKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Unknown {option}: {value}")]
    UnknownOption { option: &'static str, value: String },
}

/// A single upstream entity that could not be turned into a record
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    #[error("{kind} '{label}' has no identifier")]
    MissingId { kind: EntityKind, label: String },
}

pub type Result<T> = std::result::Result<T, SearchError>;
