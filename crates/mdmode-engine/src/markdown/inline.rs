//! # Inline classifier
//!
//! Each call consumes one unit of prose: a run of plain text or a single
//! significant character (plus whatever that character opens or closes).
//!
//! Emphasis follows the flanking rules: a marker run can open when the
//! next character is not whitespace, and close when the previous one is not.
//! Underscore runs additionally refuse to open or close inside a word.
//!
//! Links move through dedicated handlers. After link text closes,
//! [`Handler::LinkHref`] expects `(` or `[`, and
//! [`Handler::LinkHrefInside`] styles the target up to its close character.
//! Definitions (`[label]: url "title"`) use the three footnote handlers; a
//! title on the following line is picked up through the `link_title` flag.

use log::debug;

use crate::config::StyleKey;
use crate::mode::{Delegate, ModeRegistry};
use crate::stream::LineStream;

use super::MarkdownMode;
use super::patterns::{
    AUTOLINK_BODY, AUTOLINK_EMAIL, AUTOLINK_URL, BARE_CLOSE_TAG, CLOSING_HASHES,
    DEFINITION_TITLE, EMOJI, FOOTNOTE_DEFINITION_AHEAD, FOOTNOTE_LABEL, IMAGE_ALT_AHEAD,
    IMAGE_AHEAD, LINK_TARGET_AHEAD, MARKDOWN_ATTRIBUTE, MARKUP_START, NESTED_LINK_TEXT,
    NON_SPACE, NON_SPACE_RUN, TEXT_RUN, TRAILING_SPACES, is_punctuation, link_target_len,
    link_title_len, task_checkbox,
};
use super::state::{CodeRun, Delegation, Formatting, Handler, ListPosition, MarkdownState};

impl MarkdownMode {
    pub(super) fn inline_normal(
        &self,
        stream: &mut LineStream<'_>,
        state: &mut MarkdownState,
    ) -> Option<String> {
        if stream.match_regex(&TEXT_RUN, true).is_some() {
            return self.style(state);
        }

        if state.list == ListPosition::MarkerPending {
            state.list = ListPosition::Continuing;
            return self.style(state);
        }

        if state.task_list {
            state.task_list = false;
            if let Some(open) = task_checkbox(stream.rest()) {
                stream.bump_n(3);
                if open {
                    state.task_open = true;
                } else {
                    state.task_closed = true;
                }
                state.set_formatting(self.formatting_enabled(), Formatting::Task);
                return self.style(state);
            }
        }

        state.task_open = false;
        state.task_closed = false;

        if state.header > 0 && stream.match_regex(&CLOSING_HASHES, true).is_some() {
            state.set_formatting(self.formatting_enabled(), Formatting::Header);
            return self.style(state);
        }

        let Some(ch) = stream.bump() else {
            return self.style(state);
        };

        if state.link_title {
            state.link_title = false;
            let close = if ch == '(' { ')' } else { ch };
            if let Some(len) = link_title_len(stream.rest(), close) {
                stream.bump_n(len);
                return Some(self.label(StyleKey::LinkHref));
            }
        }

        if ch == '`' {
            state.set_formatting(self.formatting_enabled(), Formatting::Code);
            let count = 1 + stream.eat_while(|c| c == '`');
            match state.code {
                CodeRun::Inactive if state.quote == 0 || count == 1 => {
                    state.code = CodeRun::Span(count);
                    return self.style(state);
                }
                CodeRun::Span(open) if open == count => {
                    let style = self.style(state);
                    state.code = CodeRun::Inactive;
                    return style;
                }
                _ => {
                    // A run of the wrong length is literal text.
                    state.formatting.clear();
                    return self.style(state);
                }
            }
        } else if state.code.is_active() {
            return self.style(state);
        }

        if ch == '\\' {
            stream.bump();
            if self.formatting_enabled() {
                let escape = format!("{}-escape", self.label(StyleKey::Formatting));
                return Some(join_label(self.style(state), &escape));
            }
        }

        if ch == '!' && stream.match_regex(&IMAGE_AHEAD, false).is_some() {
            state.image_marker = true;
            state.image = true;
            state.set_formatting(self.formatting_enabled(), Formatting::Image);
            return self.style(state);
        }

        if ch == '[' && state.image_marker && stream.match_regex(&IMAGE_ALT_AHEAD, false).is_some()
        {
            state.image_marker = false;
            state.image_alt_text = true;
            state.set_formatting(self.formatting_enabled(), Formatting::Image);
            return self.style(state);
        }

        if ch == ']' && state.image_alt_text {
            state.set_formatting(self.formatting_enabled(), Formatting::Image);
            let style = self.style(state);
            state.image_alt_text = false;
            state.image = false;
            state.active = Handler::LinkHref;
            state.inline = Handler::LinkHref;
            return style;
        }

        if ch == '[' && !state.image {
            if state.link_text && stream.match_regex(&NESTED_LINK_TEXT, true).is_some() {
                return self.style(state);
            }
            state.link_text = true;
            state.set_formatting(self.formatting_enabled(), Formatting::Link);
            return self.style(state);
        }

        if ch == ']' && state.link_text {
            state.set_formatting(self.formatting_enabled(), Formatting::Link);
            let style = self.style(state);
            state.link_text = false;
            let next = if stream.match_regex(&LINK_TARGET_AHEAD, false).is_some() {
                Handler::LinkHref
            } else {
                Handler::InlineNormal
            };
            state.active = next;
            state.inline = next;
            return style;
        }

        if ch == '<' {
            if stream.match_regex(&AUTOLINK_URL, false).is_some() {
                return Some(self.open_autolink(state, StyleKey::LinkInline));
            }
            if stream.match_regex(&AUTOLINK_EMAIL, false).is_some() {
                return Some(self.open_autolink(state, StyleKey::LinkEmail));
            }
        }

        if ch == '<' && self.config.embedded_markup {
            if stream.match_regex(&MARKUP_START, false).is_some() {
                if let Some(markup) = self.registry().get(ModeRegistry::MARKUP) {
                    let line = stream.string();
                    if let Some(end) = line[stream.pos()..].find('>') {
                        let attributes = &line[stream.start()..stream.pos() + end];
                        if MARKDOWN_ATTRIBUTE.is_match(attributes) {
                            state.markdown_inside = true;
                        }
                    }
                    stream.back_up(1);
                    debug!("Entering markup region with {}", markup.name());
                    state.delegation = Delegation::Markup {
                        inner: Delegate::start(markup),
                    };
                    return self.switch_block(stream, state, Handler::MarkupDelegate);
                }
            }
            if stream.match_regex(&BARE_CLOSE_TAG, true).is_some() {
                state.markdown_inside = false;
                return Some("tag".to_string());
            }
        }

        if ch == '*' || ch == '_' {
            if let Some(style) = self.emphasis(stream, state, ch) {
                return style;
            }
        } else if ch == ' ' && (stream.eat('*') || stream.eat('_')) {
            if stream.peek() == Some(' ') {
                // A lone marker between spaces is literal.
                return self.style(state);
            }
            stream.back_up(1);
        }

        if self.config.strikethrough {
            if ch == '~' && stream.eat_while(|c| c == '~') > 0 {
                if state.strikethrough {
                    state.set_formatting(self.formatting_enabled(), Formatting::Strikethrough);
                    let style = self.style(state);
                    state.strikethrough = false;
                    return style;
                } else if stream.match_regex(&NON_SPACE, false).is_some() {
                    state.strikethrough = true;
                    state.set_formatting(self.formatting_enabled(), Formatting::Strikethrough);
                    return self.style(state);
                }
            } else if ch == ' ' && stream.match_str("~~", true) {
                if stream.peek() == Some(' ') {
                    return self.style(state);
                }
                stream.back_up(2);
            }
        }

        if self.config.emoji && ch == ':' && stream.match_regex(&EMOJI, true).is_some() {
            state.emoji = true;
            state.set_formatting(self.formatting_enabled(), Formatting::Emoji);
            let style = self.style(state);
            state.emoji = false;
            return style;
        }

        if ch == ' ' {
            if stream.match_regex(&TRAILING_SPACES, false).is_some() {
                state.trailing_space += 1;
            } else if state.trailing_space > 0 {
                state.trailing_space_new_line = true;
            }
        }

        self.style(state)
    }

    /// Toggles emphasis for a run of `marker` whose first character was consumed.
    ///
    /// Returns `None` when the run neither opens nor closes anything.
    fn emphasis(
        &self,
        stream: &mut LineStream<'_>,
        state: &mut MarkdownState,
        marker: char,
    ) -> Option<Option<String>> {
        let before = stream.char_before(stream.start()).unwrap_or(' ');
        let mut len = 1;
        while len < 3 && stream.eat(marker) {
            len += 1;
        }
        let after = stream.peek().unwrap_or(' ');

        let left_flanking = !after.is_whitespace()
            && (!is_punctuation(after) || before.is_whitespace() || is_punctuation(before));
        let right_flanking = !before.is_whitespace()
            && (!is_punctuation(before) || after.is_whitespace() || is_punctuation(after));
        let can_open =
            left_flanking && (marker == '*' || !right_flanking || is_punctuation(before));
        let can_close =
            right_flanking && (marker == '*' || !left_flanking || is_punctuation(after));

        let toggle = |current: Option<char>| {
            if current.is_none() && can_open {
                Some(true)
            } else if current == Some(marker) && can_close {
                Some(false)
            } else {
                None
            }
        };
        let set_em = if len % 2 == 1 { toggle(state.em) } else { None };
        let set_strong = if len > 1 { toggle(state.strong) } else { None };

        if set_em.is_none() && set_strong.is_none() {
            return None;
        }

        if self.formatting_enabled() {
            state.formatting = match (set_strong, set_em) {
                (Some(_), None) => vec![Formatting::Strong],
                (None, Some(_)) => vec![Formatting::Em],
                _ => vec![Formatting::Strong, Formatting::Em],
            };
        }
        if set_em == Some(true) {
            state.em = Some(marker);
        }
        if set_strong == Some(true) {
            state.strong = Some(marker);
        }
        let style = self.style(state);
        if set_em == Some(false) {
            state.em = None;
        }
        if set_strong == Some(false) {
            state.strong = None;
        }
        Some(style)
    }

    fn open_autolink(&self, state: &mut MarkdownState, key: StyleKey) -> String {
        state.active = Handler::LinkInline;
        state.inline = Handler::LinkInline;
        state.set_formatting(self.formatting_enabled(), Formatting::Link);
        join_label(self.style(state), &self.label(key))
    }

    /// Inside `<...>` of an autolink.
    pub(super) fn link_inline(
        &self,
        stream: &mut LineStream<'_>,
        state: &mut MarkdownState,
    ) -> Option<String> {
        if stream.bump() == Some('>') {
            state.active = Handler::InlineNormal;
            state.inline = Handler::InlineNormal;
            state.set_formatting(self.formatting_enabled(), Formatting::Link);
            return Some(join_label(
                self.style(state),
                &self.label(StyleKey::LinkInline),
            ));
        }
        stream.match_regex(&AUTOLINK_BODY, true);
        Some(self.label(StyleKey::LinkInline))
    }

    /// Expects the opener of a link target after link or image text.
    pub(super) fn link_href(
        &self,
        stream: &mut LineStream<'_>,
        state: &mut MarkdownState,
    ) -> Option<String> {
        if stream.eat_space() {
            return None;
        }
        match stream.bump() {
            Some(open @ ('(' | '[')) => {
                let close = if open == '(' { ')' } else { ']' };
                state.active = Handler::LinkHrefInside(close);
                state.inline = Handler::LinkHrefInside(close);
                state.set_formatting(self.formatting_enabled(), Formatting::LinkString);
                state.link_href = true;
                self.style(state)
            }
            _ => {
                state.active = Handler::InlineNormal;
                state.inline = Handler::InlineNormal;
                Some("error".to_string())
            }
        }
    }

    pub(super) fn link_href_inside(
        &self,
        stream: &mut LineStream<'_>,
        state: &mut MarkdownState,
        close: char,
    ) -> Option<String> {
        if stream.bump() == Some(close) {
            state.active = Handler::InlineNormal;
            state.inline = Handler::InlineNormal;
            state.set_formatting(self.formatting_enabled(), Formatting::LinkString);
            let style = self.style(state);
            state.link_href = false;
            return style;
        }
        if let Some(len) = link_target_len(stream.rest(), close) {
            stream.bump_n(len);
        }
        state.link_href = true;
        self.style(state)
    }

    /// At a `[` that starts a line: a definition label or ordinary prose.
    pub(super) fn footnote_link(
        &self,
        stream: &mut LineStream<'_>,
        state: &mut MarkdownState,
    ) -> Option<String> {
        if stream
            .match_regex(&FOOTNOTE_DEFINITION_AHEAD, false)
            .is_some()
        {
            state.active = Handler::FootnoteLinkInside;
            stream.bump();
            state.set_formatting(self.formatting_enabled(), Formatting::Link);
            state.link_text = true;
            return self.style(state);
        }
        self.switch_inline(stream, state, Handler::InlineNormal)
    }

    pub(super) fn footnote_link_inside(
        &self,
        stream: &mut LineStream<'_>,
        state: &mut MarkdownState,
    ) -> Option<String> {
        if stream.match_str("]:", true) {
            state.active = Handler::FootnoteUrl;
            state.inline = Handler::FootnoteUrl;
            state.set_formatting(self.formatting_enabled(), Formatting::Link);
            let style = self.style(state);
            state.link_text = false;
            return style;
        }
        stream.match_regex(&FOOTNOTE_LABEL, true);
        Some(self.label(StyleKey::LinkText))
    }

    pub(super) fn footnote_url(
        &self,
        stream: &mut LineStream<'_>,
        state: &mut MarkdownState,
    ) -> Option<String> {
        if stream.eat_space() {
            return None;
        }
        stream.match_regex(&NON_SPACE_RUN, true);
        if stream.eol() {
            state.link_title = true;
        } else {
            stream.match_regex(&DEFINITION_TITLE, true);
        }
        state.active = Handler::InlineNormal;
        state.inline = Handler::InlineNormal;
        Some(format!("{} url", self.label(StyleKey::LinkHref)))
    }
}

/// Appends `label` to an optional composite style.
fn join_label(style: Option<String>, label: &str) -> String {
    match style {
        Some(style) => format!("{style} {label}"),
        None => label.to_string(),
    }
}
