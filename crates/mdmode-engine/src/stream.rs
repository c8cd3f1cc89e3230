//! Character cursor over a single line of text.
//!
//! [`LineStream`] is the input handed to every [`Mode::token`] call. A host
//! creates one stream per line, marks the start of each token with
//! [`LineStream::start_token`], and calls the mode until the stream reaches
//! the end of the line.
//!
//! Positions are byte offsets into the line. Columns are visual columns with
//! tabs expanded to [`LineStream::TAB_SIZE`].
//!
//! [`Mode::token`]: crate::mode::Mode::token

use std::sync::atomic::{AtomicU64, Ordering};

use regex::{Captures, Regex};

static NEXT_LINE_ID: AtomicU64 = AtomicU64::new(1);

/// A cursor over one line with one line of lookahead.
#[derive(Debug, Clone)]
pub struct LineStream<'a> {
    line: &'a str,
    next_line: Option<&'a str>,
    /// Current byte index into `line`.
    pos: usize,
    /// Byte index where the current token started.
    start: usize,
    /// Identity of this line, distinct for every stream constructed.
    id: u64,
}

impl<'a> LineStream<'a> {
    /// Width of a tab stop when measuring columns.
    pub const TAB_SIZE: usize = 4;

    /// Creates a stream at the start of `line`.
    pub fn new(line: &'a str) -> Self {
        Self {
            line,
            next_line: None,
            pos: 0,
            start: 0,
            id: NEXT_LINE_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Attaches the raw text of the following line for lookahead.
    pub fn with_next_line(mut self, next_line: Option<&'a str>) -> Self {
        self.next_line = next_line;
        self
    }

    /// Identity of the line this stream walks. Two streams never share one.
    pub fn line_id(&self) -> u64 {
        self.id
    }

    /// The full line text.
    pub fn string(&self) -> &'a str {
        self.line
    }

    /// Current byte position.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Byte position where the current token started.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Marks the current position as the start of a new token.
    pub fn start_token(&mut self) {
        self.start = self.pos;
    }

    /// True when nothing has been consumed on this line.
    pub fn sol(&self) -> bool {
        self.pos == 0
    }

    /// True when the whole line has been consumed.
    pub fn eol(&self) -> bool {
        self.pos >= self.line.len()
    }

    /// Text consumed by the current token.
    pub fn current(&self) -> &'a str {
        &self.line[self.start..self.pos]
    }

    /// Unconsumed remainder of the line.
    pub fn rest(&self) -> &'a str {
        &self.line[self.pos..]
    }

    /// Peeks at the next character without consuming it.
    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Consumes and returns the next character.
    pub fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    /// Advances by `n` bytes, clamped to the end of the line.
    ///
    /// Callers pass lengths of matched text, so `n` lands on a char boundary.
    pub fn bump_n(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.line.len());
    }

    /// Consumes `ch` if it is next.
    pub fn eat(&mut self, ch: char) -> bool {
        if self.peek() == Some(ch) {
            self.pos += ch.len_utf8();
            true
        } else {
            false
        }
    }

    /// Consumes characters while `pred` holds, returning how many were eaten.
    pub fn eat_while(&mut self, pred: impl Fn(char) -> bool) -> usize {
        let mut eaten = 0;
        while let Some(ch) = self.peek() {
            if !pred(ch) {
                break;
            }
            self.pos += ch.len_utf8();
            eaten += 1;
        }
        eaten
    }

    /// Consumes a run of whitespace. Returns true if anything was eaten.
    pub fn eat_space(&mut self) -> bool {
        self.eat_while(char::is_whitespace) > 0
    }

    /// Consumes the rest of the line.
    pub fn skip_to_end(&mut self) {
        self.pos = self.line.len();
    }

    /// Steps back `n` bytes. Only used to undo ASCII characters just consumed.
    pub fn back_up(&mut self, n: usize) {
        self.pos = self.pos.saturating_sub(n);
    }

    /// Tests whether the remainder starts with `pat`, optionally consuming it.
    pub fn match_str(&mut self, pat: &str, consume: bool) -> bool {
        if self.rest().starts_with(pat) {
            if consume {
                self.pos += pat.len();
            }
            true
        } else {
            false
        }
    }

    /// Matches `re` at the current position, optionally consuming the match.
    ///
    /// Patterns are expected to be anchored with `^`; a match that does not
    /// begin at the cursor is rejected either way.
    pub fn match_regex(&mut self, re: &Regex, consume: bool) -> Option<Captures<'a>> {
        let rest: &'a str = &self.line[self.pos..];
        let caps = re.captures(rest)?;
        let whole = caps.get(0)?;
        if whole.start() != 0 {
            return None;
        }
        if consume {
            self.pos += whole.end();
        }
        Some(caps)
    }

    /// Visual column at which the current token starts.
    pub fn column(&self) -> usize {
        count_column(self.line, self.start)
    }

    /// The character immediately before byte offset `at`, if any.
    pub fn char_before(&self, at: usize) -> Option<char> {
        self.line.get(..at)?.chars().next_back()
    }

    /// Raw text of a following line without consuming anything.
    ///
    /// Only one line of lookahead is carried, so `n` other than 1 yields `None`.
    pub fn look_ahead(&self, n: usize) -> Option<&'a str> {
        if n == 1 { self.next_line } else { None }
    }
}

/// Visual width of `text[..end]` with tabs expanded to [`LineStream::TAB_SIZE`].
pub fn count_column(text: &str, end: usize) -> usize {
    let mut column = 0;
    for ch in text[..end.min(text.len())].chars() {
        if ch == '\t' {
            column += LineStream::TAB_SIZE - column % LineStream::TAB_SIZE;
        } else {
            column += 1;
        }
    }
    column
}
