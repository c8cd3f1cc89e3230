use xi_rope::Rope;

use super::span::Span;

/// One line of the rope with its byte span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRef {
    /// Byte span of the line, including its terminator if present.
    pub span: Span,
    /// The line text without its `\n` or `\r\n` terminator.
    pub text: String,
}

/// Returns the lines of `rope` from byte offset `from`, with their spans.
///
/// Uses `lines_raw` so spans keep their newline characters and consecutive
/// spans tile the document. `from` must be the start of a line.
pub fn lines_from(rope: &Rope, from: usize) -> impl Iterator<Item = LineRef> + '_ {
    let mut offset = from;
    rope.lines_raw(from..rope.len()).map(move |raw| {
        let start = offset;
        offset += raw.len();
        let text = raw
            .strip_suffix('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .unwrap_or(&raw)
            .to_string();
        LineRef {
            span: Span { start, end: offset },
            text,
        }
    })
}
