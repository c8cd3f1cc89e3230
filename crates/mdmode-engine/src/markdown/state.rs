//! # Tokenizer state
//!
//! [`MarkdownState`] is everything the tokenizer remembers between calls.
//! It is a plain value: cloning it produces an independent checkpoint from
//! which tokenization can resume at the next line, including a deep copy of
//! the list stack and any delegate state.
//!
//! The fields fall into four groups:
//!
//! - **Dispatch**: which [`Handler`] owns the next token, and which block and
//!   inline handler a new line starts from.
//! - **Line memory**: what kind of line the previous and current lines were,
//!   their indentation, and the open list items.
//! - **Span flags**: emphasis, code spans, links and the other constructs
//!   that decide the composite style.
//! - **Delegation**: an open fenced block or markup region and the opaque
//!   state of the mode handling it.

use crate::mode::Delegate;

/// The function that owns the next token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Handler {
    #[default]
    BlockNormal,
    MarkupDelegate,
    DelegateFence,
    InlineNormal,
    /// Inside `<...>` of an autolink.
    LinkInline,
    /// Right after link text, expecting `(` or `[`.
    LinkHref,
    /// Inside a link target, up to the given close character.
    LinkHrefInside(char),
    FootnoteLink,
    FootnoteLinkInside,
    FootnoteUrl,
}

/// What a finished line turned out to be, for decisions on the next line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineKind {
    #[default]
    Blank,
    Ordinary,
    Header,
    Rule,
    FenceEnd,
}

/// Relationship of the current line to the innermost list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListPosition {
    #[default]
    Outside,
    /// Inside a list item, marker already styled.
    Continuing,
    /// A list marker was just consumed on this line.
    MarkerPending,
}

impl ListPosition {
    pub fn in_list(self) -> bool {
        self != ListPosition::Outside
    }
}

/// Inline code tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CodeRun {
    #[default]
    Inactive,
    /// A backtick span closed only by a run of exactly this length.
    Span(usize),
    /// Inside a fenced code block.
    Fence,
}

impl CodeRun {
    pub fn is_active(self) -> bool {
        self != CodeRun::Inactive
    }
}

/// The syntax marker being styled by the current token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Formatting {
    Header,
    Quote,
    List,
    ListUnordered,
    ListOrdered,
    CodeBlock,
    Code,
    Task,
    Image,
    Link,
    LinkString,
    Strong,
    Em,
    Strikethrough,
    Emoji,
}

impl Formatting {
    pub fn as_str(self) -> &'static str {
        match self {
            Formatting::Header => "header",
            Formatting::Quote => "quote",
            Formatting::List => "list",
            Formatting::ListUnordered => "list-ul",
            Formatting::ListOrdered => "list-ol",
            Formatting::CodeBlock => "code-block",
            Formatting::Code => "code",
            Formatting::Task => "task",
            Formatting::Image => "image",
            Formatting::Link => "link",
            Formatting::LinkString => "link-string",
            Formatting::Strong => "strong",
            Formatting::Em => "em",
            Formatting::Strikethrough => "strikethrough",
            Formatting::Emoji => "emoji",
        }
    }
}

/// How a fenced code block is closed: a run of `marker` at least `len` long.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FenceClose {
    pub marker: char,
    pub len: usize,
}

impl FenceClose {
    /// Builds the close rule from the opening fence run (e.g. "````").
    pub fn from_opener(run: &str) -> Option<Self> {
        let marker = run.chars().next()?;
        Some(Self {
            marker,
            len: run.chars().count(),
        })
    }

    /// True when `text` is a closing fence, ignoring leading indentation.
    pub fn matches(&self, text: &str) -> bool {
        let body = text.trim_start_matches([' ', '\t']);
        let run = body.chars().take_while(|&c| c == self.marker).count();
        run >= self.len && body[run * self.marker.len_utf8()..].trim().is_empty()
    }
}

/// The active delegation, if any. At most one can be open.
#[derive(Debug, Clone, Default)]
pub enum Delegation {
    #[default]
    None,
    /// A fenced code block. `inner` is `None` when no mode was resolved.
    Fence {
        close: FenceClose,
        inner: Option<Delegate>,
    },
    /// A raw markup region handed to the markup mode.
    Markup { inner: Delegate },
}

/// State carried between [`MarkdownMode::token`](crate::MarkdownMode::token) calls.
#[derive(Debug, Clone)]
pub struct MarkdownState {
    pub(crate) active: Handler,
    pub(crate) block: Handler,
    pub(crate) inline: Handler,

    /// Identity of the line being tokenized, used to detect a new line.
    pub(crate) line_id: Option<u64>,
    pub(crate) prev_line: LineKind,
    pub(crate) this_line: LineKind,

    pub(crate) indentation: usize,
    pub(crate) indentation_diff: Option<isize>,
    pub(crate) list_stack: Vec<usize>,
    pub(crate) list: ListPosition,

    pub(crate) quote: usize,
    pub(crate) header: u8,
    pub(crate) setext: u8,
    pub(crate) hr: bool,
    pub(crate) indented_code: bool,

    pub(crate) em: Option<char>,
    pub(crate) strong: Option<char>,
    pub(crate) strikethrough: bool,
    pub(crate) code: CodeRun,

    pub(crate) link_text: bool,
    pub(crate) link_href: bool,
    pub(crate) link_title: bool,
    pub(crate) image: bool,
    pub(crate) image_marker: bool,
    pub(crate) image_alt_text: bool,

    pub(crate) task_list: bool,
    pub(crate) task_open: bool,
    pub(crate) task_closed: bool,
    pub(crate) emoji: bool,

    pub(crate) trailing_space: usize,
    pub(crate) trailing_space_new_line: bool,

    pub(crate) delegation: Delegation,
    /// A `markdown="1"` attribute was seen on the markup region being entered.
    pub(crate) markdown_inside: bool,

    /// Markers styled by the current token. Cleared before every token.
    pub(crate) formatting: Vec<Formatting>,
}

impl Default for MarkdownState {
    /// A fresh document: block handling first, then inline text.
    fn default() -> Self {
        Self {
            active: Handler::BlockNormal,
            block: Handler::BlockNormal,
            inline: Handler::InlineNormal,
            line_id: None,
            prev_line: LineKind::default(),
            this_line: LineKind::default(),
            indentation: 0,
            indentation_diff: None,
            list_stack: Vec::new(),
            list: ListPosition::default(),
            quote: 0,
            header: 0,
            setext: 0,
            hr: false,
            indented_code: false,
            em: None,
            strong: None,
            strikethrough: false,
            code: CodeRun::default(),
            link_text: false,
            link_href: false,
            link_title: false,
            image: false,
            image_marker: false,
            image_alt_text: false,
            task_list: false,
            task_open: false,
            task_closed: false,
            emoji: false,
            trailing_space: 0,
            trailing_space_new_line: false,
            delegation: Delegation::default(),
            markdown_inside: false,
            formatting: Vec::new(),
        }
    }
}

impl MarkdownState {
    /// Continuation columns of the open list items, outermost first.
    pub fn list_stack(&self) -> &[usize] {
        &self.list_stack
    }

    pub fn in_list(&self) -> bool {
        self.list.in_list()
    }

    /// Blockquote depth of the current line.
    pub fn quote_depth(&self) -> usize {
        self.quote
    }

    /// Header level of the current line, 0 when not a header.
    pub fn header_level(&self) -> u8 {
        self.header
    }

    /// Level recorded for a setext underline on the next line.
    pub fn setext_pending(&self) -> u8 {
        self.setext
    }

    pub fn handler(&self) -> Handler {
        self.active
    }

    pub fn in_fenced_code(&self) -> bool {
        matches!(self.delegation, Delegation::Fence { .. })
    }

    pub fn in_markup(&self) -> bool {
        matches!(self.delegation, Delegation::Markup { .. })
    }

    /// Length of the open inline code span, if any.
    pub fn code_span(&self) -> Option<usize> {
        match self.code {
            CodeRun::Span(len) => Some(len),
            _ => None,
        }
    }

    pub fn in_emphasis(&self) -> bool {
        self.em.is_some()
    }

    pub fn in_strong(&self) -> bool {
        self.strong.is_some()
    }

    pub fn in_strikethrough(&self) -> bool {
        self.strikethrough
    }

    pub fn previous_line(&self) -> LineKind {
        self.prev_line
    }

    pub fn current_line(&self) -> LineKind {
        self.this_line
    }

    pub(crate) fn set_formatting(&mut self, enabled: bool, marker: Formatting) {
        if enabled {
            self.formatting.clear();
            self.formatting.push(marker);
        }
    }

    pub(crate) fn list_top(&self) -> usize {
        self.list_stack.last().copied().unwrap_or(0)
    }
}
