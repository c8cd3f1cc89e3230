//! # Block classifier
//!
//! Runs at the start of each line (and again after each quote marker) to
//! decide which block construct the line belongs to. The first matching rule
//! wins:
//!
//! 1. Indented code, after a blank line, header, fence end or more code.
//! 2. Leading whitespace, as an unstyled token.
//! 3. ATX header (`#` to `######`).
//! 4. Blockquote marker (`>`).
//! 5. List marker (`-`, `*`, `+`, `1.`, `1)`), with an optional task box.
//! 6. Fenced code opener.
//! 7. Setext header, using one line of lookahead.
//! 8. Horizontal rule.
//! 9. Link or footnote definition (`[label]:`).
//!
//! Anything else is handed to the inline classifier.
//!
//! List items are closed once per line: while the line is indented less
//! than the innermost item's content column, that item is popped.

use log::debug;

use crate::config::StyleKey;
use crate::mode::Delegate;
use crate::stream::LineStream;

use super::MarkdownMode;
use super::patterns::{
    ATX_HEADER, ATX_HEADER_NO_SPACE, FENCE_OPEN, LINK_DEFINITION, LIST_MARKER, SETEXT_UNDERLINE,
    is_horizontal_rule, task_checkbox,
};
use super::state::{
    CodeRun, Delegation, FenceClose, Formatting, Handler, LineKind, ListPosition, MarkdownState,
};

/// Deepest ATX header level.
const MAX_HEADER_LEVEL: usize = 6;

impl MarkdownMode {
    pub(super) fn block_normal(
        &self,
        stream: &mut LineStream<'_>,
        state: &mut MarkdownState,
    ) -> Option<String> {
        let first_token_on_line = stream.column() == state.indentation;
        let prev_blank = state.prev_line == LineKind::Blank;
        let prev_indented_code = state.indented_code;
        let prev_rule = state.prev_line == LineKind::Rule;
        let prev_in_list = state.list.in_list();
        let max_non_code_indentation = state.list_top() + 3;

        state.indented_code = false;

        let line_indentation = state.indentation;
        if state.indentation_diff.is_none() {
            state.indentation_diff = Some(signed(state.indentation));
            if prev_in_list {
                state.list = ListPosition::Continuing;
                while state
                    .list_stack
                    .last()
                    .is_some_and(|&top| line_indentation < top)
                {
                    state.list_stack.pop();
                    match state.list_stack.last() {
                        Some(&top) => state.indentation = top,
                        None => state.list = ListPosition::Outside,
                    }
                }
                if state.list.in_list() {
                    state.indentation_diff =
                        Some(signed(line_indentation) - signed(state.list_top()));
                }
            }
        }

        let allows_inline_continuation = !prev_blank
            && !prev_rule
            && state.prev_line != LineKind::Header
            && (!prev_in_list || !prev_indented_code)
            && state.prev_line != LineKind::FenceEnd;

        let is_hr = (!state.list.in_list() || prev_rule || prev_blank)
            && state.indentation <= max_non_code_indentation
            && is_horizontal_rule(stream.rest());

        let follows_code_boundary = prev_indented_code
            || state.prev_line == LineKind::FenceEnd
            || state.prev_line == LineKind::Header
            || prev_blank;
        if state.indentation_diff.is_some_and(|diff| diff >= 4) && follows_code_boundary {
            stream.skip_to_end();
            state.indented_code = true;
            return Some(self.label(StyleKey::Code));
        }

        if stream.eat_space() {
            return None;
        }

        let shallow = state.indentation <= max_non_code_indentation;

        if first_token_on_line && shallow {
            if let Some(level) = self.match_atx_header(stream) {
                state.quote = 0;
                state.header = level;
                state.this_line = LineKind::Header;
                state.set_formatting(self.formatting_enabled(), Formatting::Header);
                state.active = state.inline;
                return self.style(state);
            }
        }

        if shallow && stream.eat('>') {
            state.quote = if first_token_on_line { 1 } else { state.quote + 1 };
            state.set_formatting(self.formatting_enabled(), Formatting::Quote);
            stream.eat(' ');
            return self.style(state);
        }

        if !is_hr && state.setext == 0 && first_token_on_line && shallow {
            if let Some(caps) = stream.match_regex(&LIST_MARKER, true) {
                let ordered = caps.get(1).is_some();
                state.indentation = line_indentation + stream.current().len();
                state.list = ListPosition::MarkerPending;
                state.quote = 0;
                state.list_stack.push(state.indentation);

                state.em = None;
                state.strong = None;
                state.code = CodeRun::Inactive;
                state.strikethrough = false;

                if self.config.task_lists && task_checkbox(stream.rest()).is_some() {
                    state.task_list = true;
                }
                state.active = state.inline;
                if self.formatting_enabled() {
                    let kind = if ordered {
                        Formatting::ListOrdered
                    } else {
                        Formatting::ListUnordered
                    };
                    state.formatting = vec![Formatting::List, kind];
                }
                return self.style(state);
            }
        }

        if first_token_on_line && shallow {
            if let Some(caps) = stream.match_regex(&FENCE_OPEN, true) {
                state.quote = 0;
                let run = caps.get(1).map_or("```", |m| m.as_str());
                let language = caps
                    .get(2)
                    .map(|m| m.as_str())
                    .filter(|lang| !lang.is_empty())
                    .unwrap_or(self.config.fenced_code_default_language.as_str());
                self.open_fence(state, run, language);
                state.set_formatting(self.formatting_enabled(), Formatting::CodeBlock);
                return self.style(state);
            }
        }

        let underline = if state.setext == 0
            && (!allows_inline_continuation || !prev_in_list)
            && state.quote == 0
            && !state.list.in_list()
            && !state.code.is_active()
            && !is_hr
            && !LINK_DEFINITION.is_match(stream.string())
        {
            stream
                .look_ahead(1)
                .filter(|next| SETEXT_UNDERLINE.is_match(next))
        } else {
            None
        };

        if state.setext > 0 || underline.is_some() {
            match underline {
                Some(next) if state.setext == 0 => {
                    let level = if next.trim_start().starts_with('=') { 1 } else { 2 };
                    state.header = level;
                    state.setext = level;
                }
                _ => {
                    state.header = state.setext;
                    state.setext = 0;
                    stream.skip_to_end();
                    state.set_formatting(self.formatting_enabled(), Formatting::Header);
                }
            }
            state.this_line = LineKind::Header;
            state.active = state.inline;
            return self.style(state);
        }

        if is_hr {
            stream.skip_to_end();
            state.hr = true;
            state.this_line = LineKind::Rule;
            return Some(self.label(StyleKey::Hr));
        }

        if stream.peek() == Some('[') {
            return self.switch_inline(stream, state, Handler::FootnoteLink);
        }

        self.switch_inline(stream, state, state.inline)
    }

    /// Consumes an ATX header marker and returns its level.
    ///
    /// Runs longer than six `#` are left unconsumed.
    fn match_atx_header(&self, stream: &mut LineStream<'_>) -> Option<u8> {
        let pattern = if self.config.allow_atx_header_without_space {
            &ATX_HEADER_NO_SPACE
        } else {
            &ATX_HEADER
        };
        let caps = stream.match_regex(pattern, false)?;
        let hashes = caps.get(1)?.len();
        if hashes > MAX_HEADER_LEVEL {
            return None;
        }
        stream.bump_n(caps.get(0)?.len());
        u8::try_from(hashes).ok()
    }

    /// Starts fenced delegation for a fence opened with `run`.
    fn open_fence(&self, state: &mut MarkdownState, run: &str, language: &str) {
        let Some(close) = FenceClose::from_opener(run) else {
            return;
        };
        let inner = if self.config.fenced_code_highlighting {
            self.registry().get(language).map(Delegate::start)
        } else {
            None
        };
        match &inner {
            Some(delegate) => debug!(
                "Fenced block opened: language '{language}' handled by {}",
                delegate.mode().name()
            ),
            None => debug!("Fenced block opened: no mode for language '{language}'"),
        }
        state.delegation = Delegation::Fence { close, inner };
        state.active = Handler::DelegateFence;
        state.block = Handler::DelegateFence;
        state.code = CodeRun::Fence;
    }
}

fn signed(value: usize) -> isize {
    isize::try_from(value).unwrap_or(isize::MAX)
}
