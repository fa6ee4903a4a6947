//! Error type shared by the decoder and the anonymizer

use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TwixError>;

#[derive(Debug, Error)]
pub enum TwixError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Stream ended (or a record's declared length ended) in the middle of a field group.
    #[error("unexpected end of data at offset {offset} while reading {context}")]
    Truncated { offset: usize, context: &'static str },

    #[error("invalid twix data: {0}")]
    Format(String),

    #[error("required header parameter {name} found {count} times, expected exactly one")]
    MissingParameter { name: String, count: usize },

    #[error("inconsistent {what} across scans: first saw {expected}, now {actual}")]
    Consistency {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("anonymization pattern {pattern} matched {count} times, expected exactly one")]
    PatternNotFound { pattern: String, count: usize },

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("invalid options: {0}")]
    Config(#[from] serde_json::Error),

    #[error("tensor shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

impl TwixError {
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        TwixError::Format(msg.into())
    }

    /// Maps a winnow failure at `offset` to a truncation error.
    pub(crate) fn truncated(offset: usize, context: &'static str) -> impl FnOnce(winnow::error::ContextError) -> Self {
        move |_| TwixError::Truncated { offset, context }
    }
}
