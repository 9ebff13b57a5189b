//! Error types for cell encoding, coverage planning, and proximity search.

use std::time::Duration;
use thiserror::Error;

/// Boxed error returned by external collaborators (range queries, record mapping).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T> = std::result::Result<T, GeoCellError>;

#[derive(Debug, Error)]
pub enum GeoCellError {
    /// A numeric argument is outside its valid domain.
    #[error("{parameter} out of range: {message}")]
    OutOfRange {
        parameter: &'static str,
        message: String,
    },

    /// A textual argument could not be parsed.
    #[error("invalid {argument}: {message}")]
    InvalidFormat {
        argument: &'static str,
        message: String,
    },

    /// Navigation past the top or bottom of the hierarchy.
    #[error("precondition failed: {0}")]
    Precondition(String),

    #[error(
        "covering at level {level} needs {required} cells, exceeding the cap of {cap}; \
         shrink the radius or coarsen the level"
    )]
    CoverageTooLarge {
        required: usize,
        cap: usize,
        level: u8,
    },

    #[error("range query for cell {token} failed: {source}")]
    RangeQuery {
        token: String,
        #[source]
        source: BoxError,
    },

    #[error("mapping record {key} failed: {source}")]
    RecordMapping {
        key: String,
        #[source]
        source: BoxError,
    },

    #[error("search cancelled")]
    Cancelled,

    #[error("search timed out after {0:?}")]
    Timeout(Duration),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Coarse classification of [`GeoCellError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller-correctable argument error, never retried internally.
    Range,
    /// Programmer misuse of the navigation API.
    Precondition,
    /// The planner refused to issue an unbounded number of queries.
    CoverageTooLarge,
    /// A range query or record mapping failed.
    Collaborator,
    Cancelled,
    Timeout,
    Config,
}

impl GeoCellError {
    pub(crate) fn out_of_range(parameter: &'static str, message: impl Into<String>) -> Self {
        Self::OutOfRange {
            parameter,
            message: message.into(),
        }
    }

    pub(crate) fn invalid_format(argument: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            argument,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::OutOfRange { .. } | Self::InvalidFormat { .. } => ErrorKind::Range,
            Self::Precondition(_) => ErrorKind::Precondition,
            Self::CoverageTooLarge { .. } => ErrorKind::CoverageTooLarge,
            Self::RangeQuery { .. } | Self::RecordMapping { .. } => ErrorKind::Collaborator,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::InvalidConfig(_) | Self::Serialization(_) => ErrorKind::Config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            GeoCellError::out_of_range("level", "31 > 30").kind(),
            ErrorKind::Range
        );
        assert_eq!(
            GeoCellError::invalid_format("token", "empty").kind(),
            ErrorKind::Range
        );
        assert_eq!(
            GeoCellError::Precondition("leaf".into()).kind(),
            ErrorKind::Precondition
        );
        assert_eq!(GeoCellError::Cancelled.kind(), ErrorKind::Cancelled);
    }

    #[test]
    fn test_messages_name_the_parameter() {
        let err = GeoCellError::out_of_range("level", "expected 0..=30, got 31");
        assert_eq!(err.to_string(), "level out of range: expected 0..=30, got 31");

        let err = GeoCellError::invalid_format("token", "non-hex character 'z'");
        assert!(err.to_string().contains("token"));
    }

    #[test]
    fn test_collaborator_source_is_preserved() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        let err = GeoCellError::RangeQuery {
            token: "89c25".into(),
            source: Box::new(io),
        };
        assert_eq!(err.kind(), ErrorKind::Collaborator);
        let source = err.source().expect("source attached");
        let io = source
            .downcast_ref::<std::io::Error>()
            .expect("original error type");
        assert_eq!(io.kind(), std::io::ErrorKind::ConnectionReset);
    }
}
