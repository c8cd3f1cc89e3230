//! Delegation to fenced-code and markup modes.

use log::{debug, trace};

use crate::config::StyleKey;
use crate::stream::LineStream;

use super::MarkdownMode;
use super::state::{CodeRun, Delegation, Formatting, Handler, LineKind, MarkdownState};

impl MarkdownMode {
    /// Handles a line inside a fenced code block.
    pub(super) fn fenced_block(
        &self,
        stream: &mut LineStream<'_>,
        state: &mut MarkdownState,
    ) -> Option<String> {
        let Delegation::Fence { close, .. } = &state.delegation else {
            return self.switch_block(stream, state, Handler::BlockNormal);
        };
        let close = *close;

        let list_top = state.list_top();
        let at_line_start = stream.string()[..stream.pos()]
            .chars()
            .all(char::is_whitespace);

        if at_line_start && state.indentation <= list_top + 3 {
            if state.indentation < list_top {
                trace!("Fenced block closed by leaving its list item");
                self.close_fence(state);
                return self.switch_block(stream, state, Handler::BlockNormal);
            }
            if close.matches(stream.rest()) {
                state.set_formatting(self.formatting_enabled(), Formatting::CodeBlock);
                let style = self.style(state);
                stream.skip_to_end();
                self.close_fence(state);
                state.active = Handler::InlineNormal;
                return style;
            }
        }

        match &mut state.delegation {
            Delegation::Fence {
                inner: Some(inner), ..
            } => inner.token(stream),
            _ => {
                stream.skip_to_end();
                Some(self.label(StyleKey::Code))
            }
        }
    }

    fn close_fence(&self, state: &mut MarkdownState) {
        state.delegation = Delegation::None;
        state.block = Handler::BlockNormal;
        state.code = CodeRun::Inactive;
        state.this_line = LineKind::FenceEnd;
    }

    /// Handles a token inside a raw markup region.
    pub(super) fn markup_block(
        &self,
        stream: &mut LineStream<'_>,
        state: &mut MarkdownState,
    ) -> Option<String> {
        let Delegation::Markup { inner } = &mut state.delegation else {
            return self.switch_block(stream, state, Handler::BlockNormal);
        };
        let style = inner.token(stream);
        let done = inner.is_top_level_text()
            || (state.markdown_inside && stream.current().contains('>'));
        if done {
            self.leave_markup(state);
        }
        style
    }

    pub(super) fn leave_markup(&self, state: &mut MarkdownState) {
        debug!("Leaving markup region");
        state.delegation = Delegation::None;
        state.active = Handler::InlineNormal;
        state.block = Handler::BlockNormal;
    }
}
