//! Line-oriented incremental markdown tokenizer.
//!
//! [`MarkdownMode`] turns one line at a time into styled tokens and carries a
//! cloneable [`MarkdownState`] between lines, so hosts can checkpoint and
//! resume anywhere. Fenced code and raw HTML are handed to other [`Mode`]s
//! looked up in a [`ModeRegistry`].

pub mod config;
pub mod document;
pub mod driver;
pub mod error;
pub mod markdown;
pub mod markup;
pub mod mode;
pub mod stream;

// Re-export key types for easier usage
pub use config::{ModeConfig, StyleKey, StyleNames};
pub use document::{HighlightedDocument, HighlightedLine};
pub use driver::{StyledToken, run_line, tokenize_line};
pub use error::{DocumentError, ModeError};
pub use markdown::{Handler, LineKind, MarkdownMode, MarkdownState};
pub use markup::{MarkupMode, MarkupState};
pub use mode::{Delegate, Mode, ModeRegistry, ModeState};
pub use stream::LineStream;
