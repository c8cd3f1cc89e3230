//! # Markup lexer
//!
//! Two [Logos] token sets drive the markup mode: one for text content and
//! one for the inside of a tag. The mode lexes only the first token of the
//! unconsumed line and advances the stream by its length, so the lexers stay
//! context-free and the region tracking lives in the mode's state.
//!
//! [Logos]: https://docs.rs/logos
//!
//! Comments, CDATA sections and processing instructions are recognised by
//! their openers only; their bodies may span lines and are scanned by the
//! mode.

use logos::Logos;

/// Tokens in text content, outside any tag.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextToken {
    #[token("<!--")]
    CommentOpen,

    #[token("<![CDATA[")]
    CDataOpen,

    /// `<?xml ...` and friends
    #[token("<?")]
    InstructionOpen,

    /// `<!DOCTYPE ...`
    #[regex(r"<![A-Za-z]")]
    DeclarationOpen,

    #[regex(r"</[A-Za-z_:][A-Za-z0-9_:.\-]*")]
    CloseTagOpen,

    #[regex(r"<[A-Za-z_:][A-Za-z0-9_:.\-]*")]
    TagOpen,

    /// `&amp;`, `&#38;`, `&#x26;`
    #[regex(r"&(?:[A-Za-z][A-Za-z0-9]*|#[0-9]+|#[xX][0-9A-Fa-f]+);")]
    Entity,

    #[regex(r"[^<&]+")]
    Text,
}

/// Tokens between `<name` and the closing `>`.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagToken {
    #[regex(r"[ \t\r\n\x0C]+")]
    Whitespace,

    #[token(">")]
    Close,

    #[token("/>")]
    SelfClose,

    #[token("=")]
    Equals,

    #[token("\"")]
    DoubleQuote,

    #[token("'")]
    SingleQuote,

    /// An attribute name or an unquoted value
    #[regex(r#"[^ \t\r\n\x0C=<>"'/]+"#)]
    Word,
}

/// Lexes the first token of `input` and returns it with its byte length.
///
/// `Err(())` marks input neither token set recognises; its length covers
/// the offending bytes.
pub fn first_token<'a, T>(input: &'a str) -> Option<(Result<T, ()>, usize)>
where
    T: Logos<'a, Source = str, Error = ()>,
    T::Extras: Default,
{
    let mut lexer = T::lexer(input);
    let result = lexer.next()?;
    Some((result, lexer.span().len()))
}
