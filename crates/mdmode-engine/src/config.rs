//! Tokenizer options and the style name table.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModeError;

/// Options recognised by [`MarkdownMode`](crate::MarkdownMode).
///
/// Every field has a default, so a partial TOML table deserializes cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeConfig {
    /// Emit `formatting` labels on syntax markers (`#`, `>`, `*`, backticks...).
    pub highlight_formatting: bool,
    /// Quote depths beyond this are reported as `error`. Zero disables the limit.
    pub max_blockquote_depth: usize,
    pub task_lists: bool,
    pub strikethrough: bool,
    pub emoji: bool,
    /// Accept `#Title` as a header.
    pub allow_atx_header_without_space: bool,
    /// Hand raw `<tag>` regions to the registered markup mode.
    pub embedded_markup: bool,
    /// Hand fenced code contents to a mode resolved from the info string.
    pub fenced_code_highlighting: bool,
    /// Mode name used for fences without a language tag.
    pub fenced_code_default_language: String,
    /// Canonical style key → replacement label.
    pub style_overrides: BTreeMap<String, String>,
}

impl Default for ModeConfig {
    fn default() -> Self {
        Self {
            highlight_formatting: false,
            max_blockquote_depth: 0,
            task_lists: false,
            strikethrough: false,
            emoji: false,
            allow_atx_header_without_space: false,
            embedded_markup: true,
            fenced_code_highlighting: true,
            fenced_code_default_language: "text/plain".to_string(),
            style_overrides: BTreeMap::new(),
        }
    }
}

/// A style slot whose label can be overridden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StyleKey {
    Header,
    Code,
    Quote,
    List1,
    List2,
    List3,
    Hr,
    Image,
    ImageAltText,
    ImageMarker,
    Formatting,
    LinkInline,
    LinkEmail,
    LinkText,
    LinkHref,
    Em,
    Strong,
    Strikethrough,
    Emoji,
}

impl StyleKey {
    pub const ALL: [StyleKey; 19] = [
        StyleKey::Header,
        StyleKey::Code,
        StyleKey::Quote,
        StyleKey::List1,
        StyleKey::List2,
        StyleKey::List3,
        StyleKey::Hr,
        StyleKey::Image,
        StyleKey::ImageAltText,
        StyleKey::ImageMarker,
        StyleKey::Formatting,
        StyleKey::LinkInline,
        StyleKey::LinkEmail,
        StyleKey::LinkText,
        StyleKey::LinkHref,
        StyleKey::Em,
        StyleKey::Strong,
        StyleKey::Strikethrough,
        StyleKey::Emoji,
    ];

    /// The key as written in `style_overrides`.
    pub fn canonical_name(self) -> &'static str {
        match self {
            StyleKey::Header => "header",
            StyleKey::Code => "code",
            StyleKey::Quote => "quote",
            StyleKey::List1 => "list1",
            StyleKey::List2 => "list2",
            StyleKey::List3 => "list3",
            StyleKey::Hr => "hr",
            StyleKey::Image => "image",
            StyleKey::ImageAltText => "imageAltText",
            StyleKey::ImageMarker => "imageMarker",
            StyleKey::Formatting => "formatting",
            StyleKey::LinkInline => "linkInline",
            StyleKey::LinkEmail => "linkEmail",
            StyleKey::LinkText => "linkText",
            StyleKey::LinkHref => "linkHref",
            StyleKey::Em => "em",
            StyleKey::Strong => "strong",
            StyleKey::Strikethrough => "strikethrough",
            StyleKey::Emoji => "emoji",
        }
    }

    pub fn default_style(self) -> &'static str {
        match self {
            StyleKey::Header => "header",
            StyleKey::Code => "comment",
            StyleKey::Quote => "quote",
            StyleKey::List1 => "variable-2",
            StyleKey::List2 => "variable-3",
            StyleKey::List3 => "keyword",
            StyleKey::Hr => "hr",
            StyleKey::Image => "image",
            StyleKey::ImageAltText => "image-alt-text",
            StyleKey::ImageMarker => "image-marker",
            StyleKey::Formatting => "formatting",
            StyleKey::LinkInline => "link",
            StyleKey::LinkEmail => "link",
            StyleKey::LinkText => "link",
            StyleKey::LinkHref => "string",
            StyleKey::Em => "em",
            StyleKey::Strong => "strong",
            StyleKey::Strikethrough => "strikethrough",
            StyleKey::Emoji => "builtin",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for StyleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

impl FromStr for StyleKey {
    type Err = ModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StyleKey::ALL
            .into_iter()
            .find(|key| key.canonical_name() == s)
            .ok_or_else(|| ModeError::UnknownStyleKey(s.to_string()))
    }
}

/// Resolved label for every [`StyleKey`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleNames {
    names: [String; StyleKey::ALL.len()],
}

impl Default for StyleNames {
    fn default() -> Self {
        Self {
            names: StyleKey::ALL.map(|key| key.default_style().to_string()),
        }
    }
}

impl StyleNames {
    /// Applies `overrides` on top of the defaults.
    ///
    /// Empty replacement values leave the default in place. Unknown keys are
    /// rejected.
    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> Result<Self, ModeError> {
        let mut names = Self::default();
        for (key, value) in overrides {
            let key: StyleKey = key.parse()?;
            if !value.is_empty() {
                names.names[key.index()] = value.clone();
            }
        }
        Ok(names)
    }

    pub fn get(&self, key: StyleKey) -> &str {
        &self.names[key.index()]
    }
}
