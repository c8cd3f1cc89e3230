use thiserror::Error;

/// Errors raised while building a [`MarkdownMode`](crate::MarkdownMode).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModeError {
    #[error("Unknown style name '{0}' in style overrides")]
    UnknownStyleKey(String),
}

/// Errors raised by [`HighlightedDocument`](crate::document::HighlightedDocument).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("Edit range {start}..{end} is outside the document (length {len})")]
    RangeOutOfBounds { start: usize, end: usize, len: usize },

    #[error("Edit offset {offset} does not fall on a character boundary")]
    NotCharBoundary { offset: usize },

    #[error("Document is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}
