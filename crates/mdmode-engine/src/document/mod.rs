//! # Incremental highlighting
//!
//! [`HighlightedDocument`] keeps markdown text in an [`xi_rope::Rope`] along
//! with the tokens of every line and a clone of the tokenizer state after
//! each line. An edit re-tokenizes from the first line it can have changed,
//! resuming from the saved state of the line before it.
//!
//! A line's tokens depend on the line after it (setext underlines), so the
//! restart point is one line above the edit.

mod lines;
mod span;

use std::ops::Range;
use std::sync::Arc;

use log::debug;
use xi_rope::Rope;

use crate::driver::StyledToken;
use crate::error::DocumentError;
use crate::markdown::{MarkdownMode, MarkdownState};

pub use lines::{LineRef, lines_from};
pub use span::Span;

/// One tokenized line of a [`HighlightedDocument`].
#[derive(Debug, Clone)]
pub struct HighlightedLine {
    /// Byte span in the document, including the line terminator.
    pub span: Span,
    /// Line text without its terminator.
    pub text: String,
    /// Tokens with offsets relative to the start of the line.
    pub tokens: Vec<StyledToken>,
    /// Tokenizer state after this line; the checkpoint for the next one.
    pub state_after: MarkdownState,
}

/// Markdown text with per-line tokens kept current across edits.
#[derive(Debug, Clone)]
pub struct HighlightedDocument {
    mode: Arc<MarkdownMode>,
    rope: Rope,
    lines: Vec<HighlightedLine>,
    version: u64,
}

impl HighlightedDocument {
    pub fn new(mode: Arc<MarkdownMode>, text: &str) -> Self {
        let mut doc = Self {
            mode,
            rope: Rope::from(text),
            lines: Vec::new(),
            version: 0,
        };
        doc.retokenize_from(0);
        doc
    }

    /// Creates a document from raw bytes, which must be UTF-8.
    pub fn from_bytes(mode: Arc<MarkdownMode>, bytes: &[u8]) -> Result<Self, DocumentError> {
        let text = std::str::from_utf8(bytes)?;
        Ok(Self::new(mode, text))
    }

    pub fn mode(&self) -> &MarkdownMode {
        &self.mode
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    pub fn len(&self) -> usize {
        self.rope.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rope.len() == 0
    }

    /// Incremented on every successful edit.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn line(&self, idx: usize) -> Option<&HighlightedLine> {
        self.lines.get(idx)
    }

    pub fn lines(&self) -> &[HighlightedLine] {
        &self.lines
    }

    /// Tokenizer state at the start of line `idx`.
    ///
    /// Line 0 starts from a fresh state; `None` past the last line.
    pub fn state_before(&self, idx: usize) -> Option<MarkdownState> {
        match idx {
            0 => Some(self.mode.start_state()),
            _ => self.lines.get(idx - 1).map(|line| line.state_after.clone()),
        }
    }

    /// Replaces `range` with `text` and re-tokenizes the affected lines.
    ///
    /// Returns the index of the first re-tokenized line.
    pub fn edit(&mut self, range: Range<usize>, text: &str) -> Result<usize, DocumentError> {
        let len = self.rope.len();
        if range.start > range.end || range.end > len {
            return Err(DocumentError::RangeOutOfBounds {
                start: range.start,
                end: range.end,
                len,
            });
        }
        let current = self.rope.to_string();
        for offset in [range.start, range.end] {
            if !current.is_char_boundary(offset) {
                return Err(DocumentError::NotCharBoundary { offset });
            }
        }

        let mut builder = xi_rope::delta::Builder::new(len);
        builder.replace(range.clone(), Rope::from(text));
        let delta = builder.build();
        self.rope = delta.apply(&self.rope);
        self.version += 1;

        let first = self.first_affected_line(range.start);
        self.retokenize_from(first);
        debug!(
            "Edit {:?} (+{} bytes) re-tokenized lines {}..{}",
            range,
            text.len(),
            first,
            self.lines.len()
        );
        Ok(first)
    }

    /// Index of the line to restart from after an edit at `offset`.
    fn first_affected_line(&self, offset: usize) -> usize {
        let containing = self
            .lines
            .iter()
            .position(|line| line.span.end > offset)
            .unwrap_or(self.lines.len());
        containing.saturating_sub(1)
    }

    fn retokenize_from(&mut self, first: usize) {
        let first = first.min(self.lines.len());
        let start = self.lines.get(first).map_or_else(
            || self.lines.last().map_or(0, |line| line.span.end),
            |line| line.span.start,
        );
        let mut state = self
            .state_before(first)
            .unwrap_or_else(|| self.mode.start_state());
        self.lines.truncate(first);

        let refs: Vec<LineRef> = lines_from(&self.rope, start).collect();
        for (idx, line) in refs.iter().enumerate() {
            let next = refs.get(idx + 1).map(|next| next.text.as_str());
            let tokens = self.mode.tokenize_line(&mut state, &line.text, next);
            self.lines.push(HighlightedLine {
                span: line.span,
                text: line.text.clone(),
                tokens,
                state_after: state.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModeConfig;
    use pretty_assertions::assert_eq;

    fn doc(text: &str) -> HighlightedDocument {
        let mode = MarkdownMode::with_config(ModeConfig::default()).unwrap();
        HighlightedDocument::new(Arc::new(mode), text)
    }

    fn styles(doc: &HighlightedDocument, idx: usize) -> Vec<Option<String>> {
        doc.line(idx)
            .unwrap()
            .tokens
            .iter()
            .map(|t| t.style.clone())
            .collect()
    }

    fn fresh_styles(text: &str) -> Vec<Vec<Option<String>>> {
        let d = doc(text);
        (0..d.line_count()).map(|idx| styles(&d, idx)).collect()
    }

    #[test]
    fn new_document_tokenizes_every_line() {
        let d = doc("# Title\n\ntext\n");
        assert_eq!(d.line_count(), 3);
        let header = Some("header header-1".to_string());
        assert_eq!(styles(&d, 0), vec![header.clone(), header]);
        assert!(d.line(1).unwrap().tokens.is_empty());
        assert_eq!(d.line(2).unwrap().span, Span { start: 9, end: 14 });
    }

    #[test]
    fn empty_document_has_no_lines() {
        let d = doc("");
        assert!(d.is_empty());
        assert_eq!(d.line_count(), 0);
        assert!(d.state_before(0).is_some());
        assert!(d.state_before(1).is_none());
    }

    #[test]
    fn edit_matches_fresh_tokenization() {
        let mut d = doc("plain\n```\ncode\n");
        let first = d.edit(6..9, "~~~").unwrap();
        assert_eq!(first, 0);
        assert_eq!(d.text(), "plain\n~~~\ncode\n");
        assert_eq!(d.version(), 1);

        let all: Vec<_> = (0..d.line_count()).map(|idx| styles(&d, idx)).collect();
        assert_eq!(all, fresh_styles("plain\n~~~\ncode\n"));
    }

    #[test]
    fn opening_a_fence_restyles_following_lines() {
        let mut d = doc("a\nb\n*c*\n");
        d.edit(0..0, "```\n").unwrap();
        assert_eq!(d.text(), "```\na\nb\n*c*\n");
        assert!(d.line(3).unwrap().state_after.in_fenced_code());
    }

    #[test]
    fn setext_underline_restyles_previous_line() {
        let mut d = doc("Title\nbody\n");
        let first = d.edit(6..10, "===").unwrap();
        assert_eq!(first, 0);
        assert_eq!(styles(&d, 0), vec![Some("header header-1".to_string())]);
    }

    #[test]
    fn state_before_is_checkpoint_of_previous_line() {
        let d = doc("- item\n  more\n");
        let state = d.state_before(1).unwrap();
        assert_eq!(state.list_stack(), d.line(0).unwrap().state_after.list_stack());
    }

    #[test]
    fn edit_rejects_bad_ranges() {
        let mut d = doc("héllo");
        assert_eq!(
            d.edit(3..9, "x"),
            Err(DocumentError::RangeOutOfBounds {
                start: 3,
                end: 9,
                len: 6
            })
        );
        assert_eq!(
            d.edit(2..3, "x"),
            Err(DocumentError::NotCharBoundary { offset: 2 })
        );
        assert_eq!(d.version(), 0);
    }

    #[test]
    fn from_bytes_rejects_invalid_utf8() {
        let mode = Arc::new(MarkdownMode::with_config(ModeConfig::default()).unwrap());
        assert!(matches!(
            HighlightedDocument::from_bytes(mode, &[0xff, 0xfe]),
            Err(DocumentError::InvalidUtf8(_))
        ));
    }
}
