//! Line driver: runs a tokenizer over a whole line and collects spans.

use log::warn;

use crate::markdown::{MarkdownMode, MarkdownState};
use crate::mode::{Mode, ModeState};
use crate::stream::LineStream;

/// Calls without progress tolerated before the driver skips a character.
const MAX_STALLED_CALLS: usize = 10;

/// One token of a line: a byte range and its style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledToken {
    pub start: usize,
    pub end: usize,
    pub style: Option<String>,
}

impl StyledToken {
    pub fn text<'a>(&self, line: &'a str) -> &'a str {
        &line[self.start..self.end]
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Drives `next_token` to the end of `line`.
///
/// Calls that consume nothing are retried; their style is dropped. After
/// [`MAX_STALLED_CALLS`] such calls in a row one character is skipped so a
/// misbehaving tokenizer cannot hang the host.
pub fn run_line<F>(line: &str, next_line: Option<&str>, mut next_token: F) -> Vec<StyledToken>
where
    F: FnMut(&mut LineStream<'_>) -> Option<String>,
{
    let mut stream = LineStream::new(line).with_next_line(next_line);
    let mut tokens = Vec::new();
    let mut stalled = 0;

    while !stream.eol() {
        stream.start_token();
        let style = next_token(&mut stream);
        if stream.pos() > stream.start() {
            stalled = 0;
            tokens.push(StyledToken {
                start: stream.start(),
                end: stream.pos(),
                style,
            });
            continue;
        }

        stalled += 1;
        if stalled >= MAX_STALLED_CALLS {
            warn!(
                "Tokenizer made no progress at byte {} of {:?}, skipping a character",
                stream.pos(),
                line
            );
            stalled = 0;
            stream.bump();
            tokens.push(StyledToken {
                start: stream.start(),
                end: stream.pos(),
                style: None,
            });
        }
    }
    tokens
}

/// Tokenizes one line with any [`Mode`], notifying it of blank lines.
pub fn tokenize_line(
    mode: &dyn Mode,
    state: &mut dyn ModeState,
    line: &str,
    next_line: Option<&str>,
) -> Vec<StyledToken> {
    if line.is_empty() {
        mode.blank_line(state);
        return Vec::new();
    }
    run_line(line, next_line, |stream| mode.token(stream, state))
}

impl MarkdownMode {
    /// Tokenizes one full line, advancing `state` past it.
    ///
    /// `next_line` is the raw text of the following line, used for setext
    /// headers.
    pub fn tokenize_line(
        &self,
        state: &mut MarkdownState,
        line: &str,
        next_line: Option<&str>,
    ) -> Vec<StyledToken> {
        if line.is_empty() {
            self.blank_line(state);
            return Vec::new();
        }
        run_line(line, next_line, |stream| self.token(stream, state))
    }

    /// Tokenizes `text` from a fresh state, one entry per line.
    pub fn tokenize_str(&self, text: &str) -> Vec<Vec<StyledToken>> {
        let mut state = self.start_state();
        let lines: Vec<&str> = text.lines().collect();
        lines
            .iter()
            .enumerate()
            .map(|(idx, line)| self.tokenize_line(&mut state, line, lines.get(idx + 1).copied()))
            .collect()
    }
}
