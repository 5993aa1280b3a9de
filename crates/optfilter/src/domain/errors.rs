//! Domain-specific errors.

use thiserror::Error;

/// Failure to parse markup into a document. Offsets are byte positions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MarkupError {
    #[error("unclosed comment starting at byte {offset}")]
    UnclosedComment { offset: usize },
    #[error("unclosed tag starting at byte {offset}")]
    UnclosedTag { offset: usize },
    #[error("unclosed quoted attribute value at byte {offset}")]
    UnclosedQuote { offset: usize },
    #[error("missing tag name at byte {offset}")]
    EmptyTagName { offset: usize },
}

/// Errors raised when driving a page from the outside.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PageError {
    #[error("no filter binding matches '{0}'")]
    UnknownBinding(String),
    #[error("expected KEY=TEXT, got '{0}'")]
    MalformedAssignment(String),
    #[error("option index {index} out of range for binding '{key}'")]
    OptionOutOfRange { key: String, index: usize },
}
