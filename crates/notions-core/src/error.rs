//! Error handling
//!
//! Every core operation fails with exactly one [`NotionError`]. None of them
//! are retried internally; callers decide whether to re-fetch and try again
//! after a [`NotionError::VersionConflict`].

use thiserror::Error;

use crate::capability::Action;
use crate::command::CommandLogError;
use crate::node::{NodeId, Version};

/// Errors returned by documents, nodes and sessions
#[derive(Error, Debug)]
pub enum NotionError {
    /// Node ID is not in the lookup index
    #[error("No node with ID: {0}")]
    NotFound(NodeId),

    /// Caller's version snapshot is stale
    #[error("Node {id} has changed: your version {yours}, current version is {current}")]
    VersionConflict {
        id: NodeId,
        yours: Version,
        current: Version,
    },

    /// Capability check denied the action
    #[error("{action} denied on node {id}")]
    Forbidden { action: Action, id: NodeId },

    /// Expected text does not match what is stored at the offset
    #[error("Text mismatch at offset {offset}: expected {expected:?}, found {found:?}")]
    Mismatch {
        offset: usize,
        expected: String,
        found: String,
    },

    /// Offset lies past the end of the text
    #[error("Offset {offset} is past the end of the text (length {len})")]
    OutOfRange { offset: usize, len: usize },

    /// Marker range ends before it starts
    #[error("Invalid marker range: start {start} is after end {end}")]
    InvalidRange { start: usize, end: usize },

    /// Truncation is longer than the text itself
    #[error("Cannot truncate {requested} characters from text of length {len}")]
    TooLong { requested: usize, len: usize },

    /// The capability service refused to authenticate the actor
    #[error("Authentication failed for account '{account}': {reason}")]
    Unauthenticated { account: String, reason: String },

    /// The mutation was applied but could not be recorded
    #[error("Command log error: {0}")]
    CommandLog(#[from] CommandLogError),

    /// Writing a dump or outline failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Flat classification of [`NotionError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    VersionConflict,
    Forbidden,
    Mismatch,
    OutOfRange,
    InvalidRange,
    TooLong,
    Unauthenticated,
    CommandLog,
    Io,
}

impl NotionError {
    /// The kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            NotionError::NotFound(_) => ErrorKind::NotFound,
            NotionError::VersionConflict { .. } => ErrorKind::VersionConflict,
            NotionError::Forbidden { .. } => ErrorKind::Forbidden,
            NotionError::Mismatch { .. } => ErrorKind::Mismatch,
            NotionError::OutOfRange { .. } => ErrorKind::OutOfRange,
            NotionError::InvalidRange { .. } => ErrorKind::InvalidRange,
            NotionError::TooLong { .. } => ErrorKind::TooLong,
            NotionError::Unauthenticated { .. } => ErrorKind::Unauthenticated,
            NotionError::CommandLog(_) => ErrorKind::CommandLog,
            NotionError::Io(_) => ErrorKind::Io,
        }
    }

    /// Check if the caller may re-fetch the node and try again
    pub fn is_conflict(&self) -> bool {
        matches!(self, NotionError::VersionConflict { .. })
    }

    /// Check if the in-memory mutation went through despite the error
    ///
    /// Command log failures do not roll back the change they were recording.
    pub fn is_applied(&self) -> bool {
        matches!(self, NotionError::CommandLog(_))
    }
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, NotionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        let err = NotionError::NotFound(NodeId::new(9));
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(!err.is_conflict());

        let err = NotionError::VersionConflict {
            id: NodeId::ROOT,
            yours: Version::new(0),
            current: Version::new(2),
        };
        assert_eq!(err.kind(), ErrorKind::VersionConflict);
        assert!(err.is_conflict());
    }

    #[test]
    fn test_command_log_error_is_applied() {
        let err: NotionError = CommandLogError::ReplayUnsupported.into();
        assert_eq!(err.kind(), ErrorKind::CommandLog);
        assert!(err.is_applied());

        let err: NotionError = std::io::Error::other("closed").into();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(!err.is_applied());
    }

    #[test]
    fn test_error_display() {
        let err = NotionError::VersionConflict {
            id: NodeId::new(4),
            yours: Version::new(1),
            current: Version::new(3),
        };
        let msg = err.to_string();
        assert!(msg.contains("your version 1"));
        assert!(msg.contains("current version is 3"));

        let err = NotionError::Forbidden {
            action: Action::Modify,
            id: NodeId::new(4),
        };
        assert_eq!(err.to_string(), "modify denied on node 4");
    }
}
