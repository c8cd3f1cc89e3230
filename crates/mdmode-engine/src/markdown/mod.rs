//! # Markdown tokenizer
//!
//! [`MarkdownMode`] classifies markdown one token at a time. The host feeds it
//! a [`LineStream`] per line and a [`MarkdownState`] that survives between
//! lines; each call consumes one token and returns its composite style.
//!
//! ## Control flow
//!
//! Every call first clears the transient formatting markers. When the stream
//! belongs to a line the state has not seen yet, new-line bookkeeping runs:
//!
//! 1. A whitespace-only line is handled as a blank line and yields no style.
//! 2. The previous/current line kinds rotate and per-line flags reset.
//! 3. Leading indentation is measured (tabs expand to four columns) and,
//!    unless a delegate owns the line, consumed as an unstyled token.
//!
//! The call then dispatches on the active [`Handler`]:
//!
//! - [`block`](self::block) decides which block construct the line opens.
//! - [`inline`](self::inline) handles prose, links and emphasis.
//! - [`delegate`](self::delegate) forwards fenced code and raw markup to
//!   other modes from the [`ModeRegistry`].
//!
//! Styles come from [`style::resolve`], a pure function of the state.
//!
//! ## Checkpoints
//!
//! [`MarkdownState`] is `Clone`. Saving a clone after each line lets a host
//! resume tokenization at any line after an edit; see
//! [`HighlightedDocument`](crate::document::HighlightedDocument).

mod block;
mod delegate;
mod inline;
pub mod patterns;
pub mod state;
pub(crate) mod style;

use std::sync::Arc;

use log::trace;

use crate::config::{ModeConfig, StyleKey, StyleNames};
use crate::error::ModeError;
use crate::mode::{Mode, ModeRegistry, ModeState};
use crate::stream::{LineStream, count_column};

pub use state::{Handler, LineKind, MarkdownState};
use state::Delegation;

/// The markdown tokenizer. Immutable once built and shareable across threads.
#[derive(Debug, Clone)]
pub struct MarkdownMode {
    config: ModeConfig,
    names: StyleNames,
    registry: Arc<ModeRegistry>,
}

impl MarkdownMode {
    /// Builds a tokenizer, validating the style overrides in `config`.
    pub fn new(config: ModeConfig, registry: Arc<ModeRegistry>) -> Result<Self, ModeError> {
        let names = StyleNames::with_overrides(&config.style_overrides)?;
        Ok(Self {
            config,
            names,
            registry,
        })
    }

    /// A tokenizer with `config` and the built-in markup modes.
    pub fn with_config(config: ModeConfig) -> Result<Self, ModeError> {
        Self::new(config, Arc::new(ModeRegistry::with_builtin_modes()))
    }

    pub fn config(&self) -> &ModeConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ModeRegistry> {
        &self.registry
    }

    pub fn start_state(&self) -> MarkdownState {
        MarkdownState::default()
    }

    /// The composite style for `state` as it stands.
    pub fn style(&self, state: &MarkdownState) -> Option<String> {
        style::resolve(state, &self.config, &self.names)
    }

    /// Consumes one token from `stream` and returns its style.
    pub fn token(&self, stream: &mut LineStream<'_>, state: &mut MarkdownState) -> Option<String> {
        state.formatting.clear();

        if state.line_id != Some(stream.line_id()) {
            state.line_id = Some(stream.line_id());
            state.header = 0;
            state.hr = false;

            if stream.match_regex(&patterns::BLANK_LINE, true).is_some() {
                self.blank_line(state);
                return None;
            }

            state.prev_line = state.this_line;
            state.this_line = LineKind::Ordinary;
            state.task_list = false;
            state.trailing_space = 0;
            state.trailing_space_new_line = false;
            state.quote = 0;

            let leading = stream.rest().len() - stream.rest().trim_start().len();
            let indentation = count_column(stream.string(), leading);

            state.active = state.block;
            if let Delegation::Fence { inner: Some(_), .. } = state.delegation {
                // The delegate sees the whitespace; only the list check needs the width.
                state.indentation = indentation;
                state.indentation_diff = None;
            } else if state.active != Handler::MarkupDelegate {
                state.indentation = indentation;
                state.indentation_diff = None;
                if leading > 0 {
                    stream.bump_n(leading);
                    return None;
                }
            }
        }

        self.dispatch(stream, state)
    }

    /// Resets span state at an empty line.
    pub fn blank_line(&self, state: &mut MarkdownState) {
        state.link_title = false;
        state.link_href = false;
        state.link_text = false;
        state.em = None;
        state.strong = None;
        state.strikethrough = false;
        state.quote = 0;
        state.indented_code = false;

        let markup_done = match &mut state.delegation {
            Delegation::Markup { inner } => inner.is_top_level_text(),
            Delegation::Fence {
                inner: Some(inner), ..
            } => {
                inner.blank_line();
                false
            }
            _ => false,
        };
        if markup_done {
            trace!("Blank line closes markup region");
            self.leave_markup(state);
        }

        state.trailing_space = 0;
        state.trailing_space_new_line = false;
        state.prev_line = state.this_line;
        state.this_line = LineKind::Blank;
    }

    pub(crate) fn dispatch(
        &self,
        stream: &mut LineStream<'_>,
        state: &mut MarkdownState,
    ) -> Option<String> {
        match state.active {
            Handler::BlockNormal => self.block_normal(stream, state),
            Handler::MarkupDelegate => self.markup_block(stream, state),
            Handler::DelegateFence => self.fenced_block(stream, state),
            Handler::InlineNormal => self.inline_normal(stream, state),
            Handler::LinkInline => self.link_inline(stream, state),
            Handler::LinkHref => self.link_href(stream, state),
            Handler::LinkHrefInside(close) => self.link_href_inside(stream, state, close),
            Handler::FootnoteLink => self.footnote_link(stream, state),
            Handler::FootnoteLinkInside => self.footnote_link_inside(stream, state),
            Handler::FootnoteUrl => self.footnote_url(stream, state),
        }
    }

    /// Makes `handler` the inline handler and runs it on the current token.
    pub(crate) fn switch_inline(
        &self,
        stream: &mut LineStream<'_>,
        state: &mut MarkdownState,
        handler: Handler,
    ) -> Option<String> {
        state.active = handler;
        state.inline = handler;
        self.dispatch(stream, state)
    }

    /// Makes `handler` the block handler and runs it on the current token.
    pub(crate) fn switch_block(
        &self,
        stream: &mut LineStream<'_>,
        state: &mut MarkdownState,
        handler: Handler,
    ) -> Option<String> {
        state.active = handler;
        state.block = handler;
        self.dispatch(stream, state)
    }

    fn label(&self, key: StyleKey) -> String {
        self.names.get(key).to_string()
    }

    fn formatting_enabled(&self) -> bool {
        self.config.highlight_formatting
    }
}

impl Mode for MarkdownMode {
    fn name(&self) -> &str {
        "markdown"
    }

    fn start_state(&self) -> Box<dyn ModeState> {
        Box::new(MarkdownState::default())
    }

    fn token(&self, stream: &mut LineStream<'_>, state: &mut dyn ModeState) -> Option<String> {
        match state.as_any_mut().downcast_mut::<MarkdownState>() {
            Some(state) => MarkdownMode::token(self, stream, state),
            None => {
                stream.skip_to_end();
                None
            }
        }
    }

    fn blank_line(&self, state: &mut dyn ModeState) {
        if let Some(state) = state.as_any_mut().downcast_mut::<MarkdownState>() {
            MarkdownMode::blank_line(self, state);
        }
    }

    fn is_top_level_text(&self, state: &dyn ModeState) -> bool {
        state
            .as_any()
            .downcast_ref::<MarkdownState>()
            .is_none_or(|state| {
                matches!(state.delegation, Delegation::None) && !state.code.is_active()
            })
    }
}
