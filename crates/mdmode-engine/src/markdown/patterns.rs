//! Compiled patterns shared by the block and inline classifiers.
//!
//! Every pattern is anchored with `^` and applied to the unconsumed rest of
//! the line through [`LineStream::match_regex`](crate::stream::LineStream::match_regex).
//! Constructs that need lookahead or backreferences are scanned by hand in
//! the classifiers instead.

use std::sync::LazyLock;

use regex::Regex;

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("Invalid built-in pattern")
}

/// A run of characters with no markup meaning.
pub static TEXT_RUN: LazyLock<Regex> = LazyLock::new(|| compile(r#"^[^#!\[\]*_\\<>` "'(~:]+"#));

pub static ATX_HEADER: LazyLock<Regex> = LazyLock::new(|| compile(r"^(#+)(?: |$)"));
pub static ATX_HEADER_NO_SPACE: LazyLock<Regex> = LazyLock::new(|| compile(r"^(#+)"));

/// Group 1 is set for ordered markers.
pub static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^(?:[*\-+]|[0-9]+([.)]))\s+"));

/// Group 1 is the fence run, group 2 the language tag.
pub static FENCE_OPEN: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^(~~~+|```+)[ \t]*([\w/+#-]*)[^\n`]*$"));

pub static SETEXT_UNDERLINE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^ {0,3}(?:=+|-{2,})\s*$"));

pub static LINK_DEFINITION: LazyLock<Regex> = LazyLock::new(|| compile(r"^\s*\[[^\]]+?\]:.*$"));

pub static CLOSING_HASHES: LazyLock<Regex> = LazyLock::new(|| compile(r"^#+$"));

/// After `!`: alt text followed by a link target opener.
pub static IMAGE_AHEAD: LazyLock<Regex> = LazyLock::new(|| compile(r"^\[[^\]]*\] ?(?:\(|\[)"));

/// After the image `[`: alt text and a complete target.
pub static IMAGE_ALT_AHEAD: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^[^\]]*\](?:\(.*?\)| ?\[.*?\])"));

pub static NESTED_LINK_TEXT: LazyLock<Regex> = LazyLock::new(|| compile(r"^.*?\]"));

pub static LINK_TARGET_AHEAD: LazyLock<Regex> = LazyLock::new(|| compile(r"^(?:\(.*?\)| ?\[.*?\])"));

pub static AUTOLINK_URL: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^(?:https?|ftps?)://(?:[^\\>]|\\.)+>"));

pub static AUTOLINK_EMAIL: LazyLock<Regex> = LazyLock::new(|| compile(r"^[^> \\]+@(?:[^\\>]|\\.)+>"));

/// Comment, processing instruction, CDATA or an opening tag, after the `<`.
pub static MARKUP_START: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"(?i)^(?:!--|\?|!\[CDATA\[|[a-z][a-z0-9-]*(?:\s+[a-z_:.\-]+(?:\s*=\s*[^>]+)?)*\s*(?:>|$))",
    )
});

pub static MARKDOWN_ATTRIBUTE: LazyLock<Regex> =
    LazyLock::new(|| compile(r#"markdown\s*=\s*['"]?1['"]?"#));

/// A closing tag after the `<`.
pub static BARE_CLOSE_TAG: LazyLock<Regex> = LazyLock::new(|| compile(r"^/\w*?>"));

pub static AUTOLINK_BODY: LazyLock<Regex> = LazyLock::new(|| compile(r"^[^>]+"));

/// A `[label]:` definition starting at the `[`.
pub static FOOTNOTE_DEFINITION_AHEAD: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^(?:[^\]\\]|\\.)*\]:"));

pub static FOOTNOTE_LABEL: LazyLock<Regex> = LazyLock::new(|| compile(r"^(?:[^\]\\]|\\.)+"));

pub static NON_SPACE_RUN: LazyLock<Regex> = LazyLock::new(|| compile(r"^\S+"));

/// Optional quoted or parenthesised title after a definition URL.
pub static DEFINITION_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    compile(r#"^(?:\s+(?:"(?:[^"\\]|\\.)+"|'(?:[^'\\]|\\.)+'|\((?:[^)\\]|\\.)+\)))?"#)
});

/// Shortcode body and closing colon, after the opening `:`.
pub static EMOJI: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^(?:[a-z_\d+][a-z_\d+-]*|-[a-z_\d+][a-z_\d+-]*):"));

pub static TRAILING_SPACES: LazyLock<Regex> = LazyLock::new(|| compile(r"^ +$"));

pub static NON_SPACE: LazyLock<Regex> = LazyLock::new(|| compile(r"^\S"));

pub static BLANK_LINE: LazyLock<Regex> = LazyLock::new(|| compile(r"^\s*$"));

static PUNCTUATION: LazyLock<Regex> = LazyLock::new(|| compile(r"^\p{P}$"));

/// Punctuation as used by the emphasis flanking rules.
pub fn is_punctuation(ch: char) -> bool {
    if ch.is_ascii() {
        return ch.is_ascii_punctuation();
    }
    let mut buf = [0u8; 4];
    PUNCTUATION.is_match(ch.encode_utf8(&mut buf))
}

/// A horizontal rule: 3+ of one of `*`, `-`, `_` with optional whitespace.
pub fn is_horizontal_rule(rest: &str) -> bool {
    let mut chars = rest.chars();
    let Some(marker @ ('*' | '-' | '_')) = chars.next() else {
        return false;
    };
    let mut count = 1;
    for ch in chars {
        if ch == marker {
            count += 1;
        } else if !ch.is_whitespace() {
            return false;
        }
    }
    count >= 3
}

/// A task checkbox `[ ]`, `[x]` or `[X]` followed by whitespace.
///
/// Returns `Some(true)` for an open box and `Some(false)` for a checked one.
pub fn task_checkbox(rest: &str) -> Option<bool> {
    let bytes = rest.as_bytes();
    if bytes.len() < 4 || bytes[0] != b'[' || bytes[2] != b']' {
        return None;
    }
    if !(bytes[3] as char).is_ascii_whitespace() {
        return None;
    }
    match bytes[1] {
        b' ' => Some(true),
        b'x' | b'X' => Some(false),
        _ => None,
    }
}

/// Length of a link target body up to (not including) `close`.
///
/// Escapes are skipped and one level of nested brackets of the same kind is
/// allowed. Returns `None` when the target is not closed on this line.
pub fn link_target_len(rest: &str, close: char) -> Option<usize> {
    let open = if close == ')' { '(' } else { '[' };
    let mut chars = rest.char_indices();
    while let Some((i, ch)) = chars.next() {
        match ch {
            c if c == close => return Some(i),
            '\\' => {
                chars.next()?;
            }
            c if c == open => loop {
                let (_, inner) = chars.next()?;
                match inner {
                    c if c == close => break,
                    '\\' => {
                        chars.next()?;
                    }
                    c if c == open => return None,
                    _ => {}
                }
            },
            _ => {}
        }
    }
    None
}

/// Length of a link title continuing on the line after a definition.
///
/// `rest` starts just after the opening delimiter; `close` is the delimiter
/// that ends the title. The match includes `close`.
pub fn link_title_len(rest: &str, close: char) -> Option<usize> {
    let body_start = rest.len() - rest.trim_start().len();
    let body = &rest[body_start..];
    let mut chars = body.char_indices();
    let (_, first) = chars.next()?;
    let after_body = if first == '\\' {
        let (i, escaped) = chars.next()?;
        i + escaped.len_utf8()
    } else if first == close {
        return None;
    } else {
        body.find(|c: char| c == close || c == '\\')
            .unwrap_or(body.len())
    };
    body[after_body..]
        .starts_with(close)
        .then(|| body_start + after_body + close.len_utf8())
}
