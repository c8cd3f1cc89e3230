//! Composite style resolution.
//!
//! [`resolve`] turns a state snapshot into the space-joined label for the
//! token just consumed. It never touches the stream.

use std::borrow::Cow;

use crate::config::{ModeConfig, StyleKey, StyleNames};

use super::state::{Formatting, MarkdownState};

pub(crate) fn resolve(
    state: &MarkdownState,
    config: &ModeConfig,
    names: &StyleNames,
) -> Option<String> {
    let mut styles: Vec<Cow<'_, str>> = Vec::new();
    let depth_limit = config.max_blockquote_depth;
    let within_limit = depth_limit == 0 || depth_limit >= state.quote;

    if !state.formatting.is_empty() {
        let formatting = names.get(StyleKey::Formatting);
        styles.push(Cow::Borrowed(formatting));
        for marker in &state.formatting {
            styles.push(Cow::Owned(format!("{formatting}-{}", marker.as_str())));
            match marker {
                Formatting::Header => {
                    styles.push(Cow::Owned(format!("{formatting}-header-{}", state.header)));
                }
                Formatting::Quote if within_limit => {
                    styles.push(Cow::Owned(format!("{formatting}-quote-{}", state.quote)));
                }
                Formatting::Quote => styles.push(Cow::Borrowed("error")),
                _ => {}
            }
        }
    }

    if state.task_open {
        styles.push(Cow::Borrowed("meta"));
        return Some(join(&styles));
    }
    if state.task_closed {
        styles.push(Cow::Borrowed("property"));
        return Some(join(&styles));
    }

    if state.link_href {
        styles.push(Cow::Borrowed(names.get(StyleKey::LinkHref)));
        styles.push(Cow::Borrowed("url"));
    } else {
        let flags = [
            (state.strong.is_some(), StyleKey::Strong),
            (state.em.is_some(), StyleKey::Em),
            (state.strikethrough, StyleKey::Strikethrough),
            (state.emoji, StyleKey::Emoji),
            (state.link_text, StyleKey::LinkText),
            (state.code.is_active(), StyleKey::Code),
            (state.image, StyleKey::Image),
        ];
        for (on, key) in flags {
            if on {
                styles.push(Cow::Borrowed(names.get(key)));
            }
        }
        if state.image_alt_text {
            styles.push(Cow::Borrowed(names.get(StyleKey::ImageAltText)));
            styles.push(Cow::Borrowed("link"));
        }
        if state.image_marker {
            styles.push(Cow::Borrowed(names.get(StyleKey::ImageMarker)));
        }
    }

    if state.header > 0 {
        let header = names.get(StyleKey::Header);
        styles.push(Cow::Borrowed(header));
        styles.push(Cow::Owned(format!("{header}-{}", state.header)));
    }

    if state.quote > 0 {
        let quote = names.get(StyleKey::Quote);
        let depth = if within_limit { state.quote } else { depth_limit };
        styles.push(Cow::Borrowed(quote));
        styles.push(Cow::Owned(format!("{quote}-{depth}")));
    }

    if state.list.in_list() {
        let key = match state.list_stack.len().saturating_sub(1) % 3 {
            0 => StyleKey::List1,
            1 => StyleKey::List2,
            _ => StyleKey::List3,
        };
        styles.push(Cow::Borrowed(names.get(key)));
    }

    if state.trailing_space_new_line {
        styles.push(Cow::Borrowed("trailing-space-new-line"));
    } else if state.trailing_space > 0 {
        let parity = if state.trailing_space % 2 == 1 { "a" } else { "b" };
        styles.push(Cow::Owned(format!("trailing-space-{parity}")));
    }

    (!styles.is_empty()).then(|| join(&styles))
}

fn join(styles: &[Cow<'_, str>]) -> String {
    styles.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::state::{CodeRun, ListPosition};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn plain(state: &MarkdownState) -> Option<String> {
        resolve(state, &ModeConfig::default(), &StyleNames::default())
    }

    #[test]
    fn empty_state_has_no_style() {
        assert_eq!(plain(&MarkdownState::default()), None);
    }

    #[test]
    fn fragments_follow_fixed_order() {
        let state = MarkdownState {
            strong: Some('*'),
            em: Some('_'),
            code: CodeRun::Span(1),
            header: 2,
            quote: 1,
            ..MarkdownState::default()
        };
        assert_eq!(
            plain(&state).as_deref(),
            Some("strong em comment header header-2 quote quote-1")
        );
    }

    #[test]
    fn href_suppresses_inline_styles() {
        let state = MarkdownState {
            link_href: true,
            strong: Some('*'),
            ..MarkdownState::default()
        };
        assert_eq!(plain(&state).as_deref(), Some("string url"));
    }

    #[test]
    fn task_markers_short_circuit() {
        let state = MarkdownState {
            task_closed: true,
            list: ListPosition::Continuing,
            list_stack: vec![2],
            ..MarkdownState::default()
        };
        assert_eq!(plain(&state).as_deref(), Some("property"));
    }

    #[test]
    fn list_class_rotates_with_depth() {
        let mut state = MarkdownState {
            list: ListPosition::Continuing,
            ..MarkdownState::default()
        };
        let mut seen = Vec::new();
        for depth in 1..=4 {
            state.list_stack = (1..=depth).map(|d| d * 2).collect();
            seen.push(plain(&state).unwrap_or_default());
        }
        assert_eq!(seen, ["variable-2", "variable-3", "keyword", "variable-2"]);
    }

    #[test]
    fn quote_depth_beyond_limit() {
        let config = ModeConfig {
            max_blockquote_depth: 2,
            ..ModeConfig::default()
        };
        let state = MarkdownState {
            quote: 3,
            formatting: vec![Formatting::Quote],
            ..MarkdownState::default()
        };
        assert_eq!(
            resolve(&state, &config, &StyleNames::default()).as_deref(),
            Some("formatting formatting-quote error quote quote-2")
        );
    }

    #[test]
    fn trailing_space_parity() {
        let mut state = MarkdownState {
            trailing_space: 1,
            ..MarkdownState::default()
        };
        assert_eq!(plain(&state).as_deref(), Some("trailing-space-a"));
        state.trailing_space = 2;
        assert_eq!(plain(&state).as_deref(), Some("trailing-space-b"));
        state.trailing_space_new_line = true;
        assert_eq!(plain(&state).as_deref(), Some("trailing-space-new-line"));
    }

    #[test]
    fn overrides_only_touch_their_slot() {
        let names = StyleNames::with_overrides(&BTreeMap::from([(
            "header".to_string(),
            "title".to_string(),
        )]))
        .unwrap();
        let state = MarkdownState {
            header: 1,
            formatting: vec![Formatting::Header],
            ..MarkdownState::default()
        };
        assert_eq!(
            resolve(&state, &ModeConfig::default(), &names).as_deref(),
            Some("formatting formatting-header formatting-header-1 title title-1")
        );
    }
}
