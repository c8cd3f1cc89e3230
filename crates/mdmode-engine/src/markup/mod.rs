//! # Markup mode
//!
//! A small HTML/XML tokenizer used for raw markup embedded in markdown and
//! for fenced blocks tagged `html` or `xml`. It tracks just enough to answer
//! the one question the markdown tokenizer asks of it: is the stream back in
//! plain text with no element left open?
//!
//! Styles follow the usual editor vocabulary: `tag` for element names,
//! `tag bracket` for `>` and `/>`, `attribute`, `string` for quoted values,
//! `comment`, `atom` for entities and CDATA, `meta` for processing
//! instructions and declarations, and `error` for stray characters.

pub mod lexer;

use crate::mode::{Mode, ModeState};
use crate::stream::LineStream;

use lexer::{TagToken, TextToken, first_token};

/// HTML elements that never take a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "keygen", "link", "meta", "param",
    "source", "track", "wbr",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupFlavor {
    Html,
    Xml,
}

/// What the next character belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Region {
    #[default]
    Text,
    Tag {
        name: String,
        closing: bool,
        /// The previous token was `=`.
        expects_value: bool,
    },
    /// A quoted attribute value continuing on a later line.
    AttributeValue {
        name: String,
        closing: bool,
        quote: char,
    },
    Comment,
    CData,
    Instruction,
    Declaration,
}

/// Per-stream state of a [`MarkupMode`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MarkupState {
    pub region: Region,
    /// Open elements, outermost first.
    pub context: Vec<String>,
}

impl MarkupState {
    pub fn open_elements(&self) -> &[String] {
        &self.context
    }
}

#[derive(Debug, Clone)]
pub struct MarkupMode {
    flavor: MarkupFlavor,
}

impl MarkupMode {
    pub fn html() -> Self {
        Self {
            flavor: MarkupFlavor::Html,
        }
    }

    pub fn xml() -> Self {
        Self {
            flavor: MarkupFlavor::Xml,
        }
    }

    pub fn flavor(&self) -> MarkupFlavor {
        self.flavor
    }

    pub fn start_state(&self) -> MarkupState {
        MarkupState::default()
    }

    pub fn token(&self, stream: &mut LineStream<'_>, state: &mut MarkupState) -> Option<String> {
        match std::mem::take(&mut state.region) {
            Region::Text => self.text_token(stream, state),
            Region::Tag {
                name,
                closing,
                expects_value,
            } => self.tag_token(stream, state, name, closing, expects_value),
            Region::AttributeValue {
                name,
                closing,
                quote,
            } => {
                if !finish_quoted(stream, quote) {
                    state.region = Region::AttributeValue {
                        name,
                        closing,
                        quote,
                    };
                } else {
                    state.region = Region::Tag {
                        name,
                        closing,
                        expects_value: false,
                    };
                }
                Some("string".to_string())
            }
            Region::Comment => self.until(stream, state, "-->", Region::Comment, "comment"),
            Region::CData => self.until(stream, state, "]]>", Region::CData, "atom"),
            Region::Instruction => self.until(stream, state, "?>", Region::Instruction, "meta"),
            Region::Declaration => self.until(stream, state, ">", Region::Declaration, "meta"),
        }
    }

    /// True when in text content with no open element.
    pub fn is_top_level_text(&self, state: &MarkupState) -> bool {
        state.region == Region::Text && state.context.is_empty()
    }

    fn text_token(&self, stream: &mut LineStream<'_>, state: &mut MarkupState) -> Option<String> {
        let rest = stream.rest();
        let (result, len) = first_token::<TextToken>(rest)?;
        stream.bump_n(len.max(1));
        let style = match result {
            Ok(TextToken::Text) => return None,
            Ok(TextToken::Entity) => "atom",
            Ok(TextToken::CommentOpen) => {
                return self.until(stream, state, "-->", Region::Comment, "comment");
            }
            Ok(TextToken::CDataOpen) => {
                return self.until(stream, state, "]]>", Region::CData, "atom");
            }
            Ok(TextToken::InstructionOpen) => {
                return self.until(stream, state, "?>", Region::Instruction, "meta");
            }
            Ok(TextToken::DeclarationOpen) => {
                return self.until(stream, state, ">", Region::Declaration, "meta");
            }
            Ok(TextToken::TagOpen) => {
                state.region = Region::Tag {
                    name: self.normalize(&rest[1..len]),
                    closing: false,
                    expects_value: false,
                };
                "tag"
            }
            Ok(TextToken::CloseTagOpen) => {
                state.region = Region::Tag {
                    name: self.normalize(&rest[2..len]),
                    closing: true,
                    expects_value: false,
                };
                "tag"
            }
            Err(()) if rest.starts_with('&') => return None,
            Err(()) => "error",
        };
        Some(style.to_string())
    }

    fn tag_token(
        &self,
        stream: &mut LineStream<'_>,
        state: &mut MarkupState,
        name: String,
        closing: bool,
        expects_value: bool,
    ) -> Option<String> {
        let rest = stream.rest();
        let Some((result, len)) = first_token::<TagToken>(rest) else {
            state.region = Region::Tag {
                name,
                closing,
                expects_value,
            };
            return None;
        };
        stream.bump_n(len.max(1));

        let stay = |expects_value: bool| Region::Tag {
            name: name.clone(),
            closing,
            expects_value,
        };
        let (region, style) = match result {
            Ok(TagToken::Whitespace) => (stay(expects_value), None),
            Ok(TagToken::Equals) => (stay(true), None),
            Ok(TagToken::Word) if expects_value => (stay(false), Some("string")),
            Ok(TagToken::Word) => (stay(false), Some("attribute")),
            Ok(TagToken::DoubleQuote | TagToken::SingleQuote) => {
                let quote = rest.chars().next().unwrap_or('"');
                if finish_quoted(stream, quote) {
                    (stay(false), Some("string"))
                } else {
                    (
                        Region::AttributeValue {
                            name: name.clone(),
                            closing,
                            quote,
                        },
                        Some("string"),
                    )
                }
            }
            Ok(TagToken::Close) => {
                if closing {
                    if let Some(open) = state.context.iter().rposition(|el| *el == name) {
                        state.context.truncate(open);
                    }
                } else if !self.is_void(&name) {
                    state.context.push(name.clone());
                }
                (Region::Text, Some("tag bracket"))
            }
            Ok(TagToken::SelfClose) => (Region::Text, Some("tag bracket")),
            Err(()) => (stay(expects_value), Some("error")),
        };
        state.region = region;
        style.map(str::to_string)
    }

    /// Consumes up to and including `terminator`, or the whole line if absent.
    fn until(
        &self,
        stream: &mut LineStream<'_>,
        state: &mut MarkupState,
        terminator: &str,
        open: Region,
        style: &str,
    ) -> Option<String> {
        match stream.rest().find(terminator) {
            Some(at) => {
                stream.bump_n(at + terminator.len());
                state.region = Region::Text;
            }
            None => {
                stream.skip_to_end();
                state.region = open;
            }
        }
        Some(style.to_string())
    }

    fn normalize(&self, name: &str) -> String {
        match self.flavor {
            MarkupFlavor::Html => name.to_ascii_lowercase(),
            MarkupFlavor::Xml => name.to_string(),
        }
    }

    fn is_void(&self, name: &str) -> bool {
        self.flavor == MarkupFlavor::Html && VOID_ELEMENTS.contains(&name)
    }
}

/// Consumes a quoted value body through `quote`. False if the line ends first.
fn finish_quoted(stream: &mut LineStream<'_>, quote: char) -> bool {
    match stream.rest().find(quote) {
        Some(at) => {
            stream.bump_n(at + quote.len_utf8());
            true
        }
        None => {
            stream.skip_to_end();
            false
        }
    }
}

impl Mode for MarkupMode {
    fn name(&self) -> &str {
        match self.flavor {
            MarkupFlavor::Html => "html",
            MarkupFlavor::Xml => "xml",
        }
    }

    fn start_state(&self) -> Box<dyn ModeState> {
        Box::new(MarkupState::default())
    }

    fn token(&self, stream: &mut LineStream<'_>, state: &mut dyn ModeState) -> Option<String> {
        match state.as_any_mut().downcast_mut::<MarkupState>() {
            Some(state) => MarkupMode::token(self, stream, state),
            None => {
                stream.skip_to_end();
                None
            }
        }
    }

    fn is_top_level_text(&self, state: &dyn ModeState) -> bool {
        state
            .as_any()
            .downcast_ref::<MarkupState>()
            .is_none_or(|state| MarkupMode::is_top_level_text(self, state))
    }
}
