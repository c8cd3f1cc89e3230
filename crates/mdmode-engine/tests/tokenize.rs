use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use mdmode_engine::{
    LineStream, MarkdownMode, MarkdownState, Mode, ModeConfig, ModeError, ModeRegistry,
    ModeState, StyledToken,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

/// Styles alphanumeric runs as `variable` and counts blank lines it is shown.
#[derive(Debug, Default)]
struct WordMode {
    blank_lines: AtomicUsize,
}

impl Mode for WordMode {
    fn name(&self) -> &str {
        "words"
    }

    fn start_state(&self) -> Box<dyn ModeState> {
        Box::new(())
    }

    fn token(&self, stream: &mut LineStream<'_>, _state: &mut dyn ModeState) -> Option<String> {
        if stream.eat_while(char::is_alphanumeric) > 0 {
            return Some("variable".to_string());
        }
        stream.bump();
        None
    }

    fn blank_line(&self, _state: &mut dyn ModeState) {
        self.blank_lines.fetch_add(1, Ordering::SeqCst);
    }
}

fn mode(config: ModeConfig) -> MarkdownMode {
    MarkdownMode::with_config(config).unwrap()
}

fn formatting() -> ModeConfig {
    ModeConfig {
        highlight_formatting: true,
        ..ModeConfig::default()
    }
}

fn with_words(config: ModeConfig) -> (MarkdownMode, Arc<WordMode>) {
    let words = Arc::new(WordMode::default());
    let mut registry = ModeRegistry::with_builtin_modes();
    registry.register(["js", "javascript"], words.clone());
    (MarkdownMode::new(config, Arc::new(registry)).unwrap(), words)
}

/// (text, style) pairs for one line.
fn pairs<'a>(line: &'a str, tokens: &[StyledToken]) -> Vec<(&'a str, Option<String>)> {
    tokens.iter().map(|t| (t.text(line), t.style.clone())).collect()
}

fn line_pairs(mode: &MarkdownMode, text: &str) -> Vec<Vec<(String, Option<String>)>> {
    text.lines()
        .zip(mode.tokenize_str(text))
        .map(|(line, tokens)| {
            tokens
                .iter()
                .map(|t| (t.text(line).to_string(), t.style.clone()))
                .collect()
        })
        .collect()
}

fn render(mode: &MarkdownMode, text: &str) -> String {
    let mut out = Vec::new();
    for (idx, (line, tokens)) in text.lines().zip(mode.tokenize_str(text)).enumerate() {
        for token in tokens {
            out.push(format!(
                "{idx}:{}-{} [{}] {:?}",
                token.start,
                token.end,
                token.style.as_deref().unwrap_or(""),
                token.text(line)
            ));
        }
    }
    out.join("\n")
}

fn s(style: &str) -> Option<String> {
    Some(style.to_string())
}

/// Expected (text, style) pairs, with `""` standing for no style.
fn styled(expected: &[(&str, &str)]) -> Vec<(String, Option<String>)> {
    expected
        .iter()
        .map(|(text, style)| (text.to_string(), (!style.is_empty()).then(|| style.to_string())))
        .collect()
}

fn strikethrough() -> ModeConfig {
    ModeConfig {
        strikethrough: true,
        ..ModeConfig::default()
    }
}

fn emoji() -> ModeConfig {
    ModeConfig {
        emoji: true,
        ..ModeConfig::default()
    }
}

#[test]
fn plain_prose_from_start_state() {
    let mode = mode(ModeConfig::default());
    let tokens = mode.tokenize_line(&mut mode.start_state(), "Title", None);
    assert_eq!(pairs("Title", &tokens), vec![("Title", None)]);
}

#[test]
fn atx_header_with_formatting() {
    let mode = mode(formatting());
    let mut state = mode.start_state();
    let tokens = mode.tokenize_line(&mut state, "# Hello", None);
    assert_eq!(
        pairs("# Hello", &tokens),
        vec![
            (
                "# ",
                s("formatting formatting-header formatting-header-1 header header-1")
            ),
            ("Hello", s("header header-1")),
        ]
    );
    assert_eq!(state.header_level(), 1);
}

#[test]
fn strong_emphasis_with_formatting() {
    let mode = mode(formatting());
    let mut state = mode.start_state();
    let tokens = mode.tokenize_line(&mut state, "**bold**", None);
    assert_eq!(
        pairs("**bold**", &tokens),
        vec![
            ("**", s("formatting formatting-strong strong")),
            ("bold", s("strong")),
            ("**", s("formatting formatting-strong strong")),
        ]
    );
    assert!(!state.in_strong());
}

#[test]
fn setext_header_uses_next_line() {
    let mode = mode(formatting());
    assert_eq!(
        line_pairs(&mode, "Title\n==="),
        vec![
            vec![("Title".to_string(), s("header header-1"))],
            vec![(
                "===".to_string(),
                s("formatting formatting-header formatting-header-1 header header-1")
            )],
        ]
    );
}

#[test]
fn setext_level_two() {
    let mode = mode(ModeConfig::default());
    let mut state = mode.start_state();
    mode.tokenize_line(&mut state, "Title", Some("---"));
    assert_eq!(state.setext_pending(), 2);
    let tokens = mode.tokenize_line(&mut state, "---", None);
    assert_eq!(pairs("---", &tokens), vec![("---", s("header header-2"))]);
    assert_eq!(state.setext_pending(), 0);
}

#[rstest]
#[case::open("- [ ] todo", "[ ]", "meta")]
#[case::closed("- [x] done", "[x]", "property")]
fn task_checkboxes(#[case] line: &str, #[case] checkbox: &str, #[case] style: &str) {
    let mode = mode(ModeConfig {
        task_lists: true,
        ..ModeConfig::default()
    });
    let mut state = mode.start_state();
    let tokens = mode.tokenize_line(&mut state, line, None);
    let pairs = pairs(line, &tokens);
    assert_eq!(pairs[0], ("- ", s("variable-2")));
    assert_eq!(pairs[1], (checkbox, s(style)));
    assert_eq!(pairs.last().map(|p| p.1.clone()), Some(s("variable-2")));
}

#[test]
fn task_checkbox_needs_task_lists_enabled() {
    let mode = mode(ModeConfig::default());
    let mut state = mode.start_state();
    let tokens = mode.tokenize_line(&mut state, "- [ ] todo", None);
    assert!(tokens.iter().all(|t| t.style.as_deref() != Some("meta")));
}

#[rstest]
#[case::quote("> quote", vec![("> ", "quote quote-1"), ("quote", "quote quote-1")])]
#[case::rule("---", vec![("---", "hr")])]
#[case::code_span("`code`", vec![("`", "comment"), ("code", "comment"), ("`", "comment")])]
#[case::em("*em*", vec![("*", "em"), ("em", "em"), ("*", "em")])]
#[case::link("[a](b)", vec![
    ("[", "link"),
    ("a", "link"),
    ("]", "link"),
    ("(", "string url"),
    ("b", "string url"),
    (")", "string url"),
])]
#[case::image("![alt](src)", vec![
    ("!", "image image-marker"),
    ("[", "image image-alt-text link"),
    ("alt", "image image-alt-text link"),
    ("]", "image image-alt-text link"),
    ("(", "string url"),
    ("src", "string url"),
    (")", "string url"),
])]
#[case::autolink_url("<http://a.b>", vec![("<", "link"), ("http://a.b", "link"), (">", "link")])]
#[case::autolink_email("<user@host>", vec![("<", "link"), ("user@host", "link"), (">", "link")])]
#[case::spaced_rule_beats_list("* * *", vec![("* * *", "hr")])]
fn single_line_styles(#[case] line: &str, #[case] expected: Vec<(&str, &str)>) {
    let mode = mode(ModeConfig::default());
    let mut state = mode.start_state();
    let tokens = mode.tokenize_line(&mut state, line, None);
    let expected: Vec<_> = expected.into_iter().map(|(t, st)| (t, s(st))).collect();
    assert_eq!(pairs(line, &tokens), expected);
}

#[rstest]
#[case::strikethrough(strikethrough(), "~~x~~", vec![
    ("~~", "strikethrough"),
    ("x", "strikethrough"),
    ("~~", "strikethrough"),
])]
#[case::lone_tildes(strikethrough(), "a ~~ b", vec![("a", ""), (" ~~", ""), (" ", ""), ("b", "")])]
#[case::tildes_disabled(ModeConfig::default(), "~~x~~", vec![("~", ""), ("~", ""), ("x", ""), ("~", ""), ("~", "")])]
#[case::emoji(emoji(), ":smile: hi", vec![(":smile:", "builtin"), (" ", ""), ("hi", "")])]
#[case::escape(formatting(), r"\*x", vec![(r"\*", "formatting-escape"), ("x", "")])]
#[case::escape_unformatted(ModeConfig::default(), r"\*x", vec![(r"\*", ""), ("x", "")])]
#[case::trailing_spaces(ModeConfig::default(), "a   ", vec![
    ("a", ""),
    (" ", "trailing-space-a"),
    (" ", "trailing-space-b"),
    (" ", "trailing-space-new-line"),
])]
#[case::intraword_underscores(ModeConfig::default(), "foo_bar_baz", vec![
    ("foo", ""),
    ("_", ""),
    ("bar", ""),
    ("_", ""),
    ("baz", ""),
])]
#[case::code_run_length_mismatch(formatting(), "`a``b`", vec![
    ("`", "formatting formatting-code comment"),
    ("a", "comment"),
    ("``", "comment"),
    ("b", "comment"),
    ("`", "formatting formatting-code comment"),
])]
#[case::definition_with_title(ModeConfig::default(), "[x]: http://a \"t\"", vec![
    ("[", "link"),
    ("x", "link"),
    ("]:", "link"),
    (" ", ""),
    ("http://a \"t\"", "string url"),
])]
fn inline_styles(
    #[case] config: ModeConfig,
    #[case] line: &str,
    #[case] expected: Vec<(&str, &str)>,
) {
    let mode = mode(config);
    let mut state = mode.start_state();
    let tokens = mode.tokenize_line(&mut state, line, None);
    let tokens: Vec<_> = pairs(line, &tokens)
        .into_iter()
        .map(|(text, style)| (text.to_string(), style))
        .collect();
    assert_eq!(tokens, styled(&expected));
    assert!(!state.in_strikethrough());
    assert_eq!(state.code_span(), None);
}

#[test]
fn definition_title_on_next_line() {
    let mode = mode(ModeConfig::default());
    assert_eq!(
        line_pairs(&mode, "[x]: http://a\n\"t\""),
        vec![
            styled(&[
                ("[", "link"),
                ("x", "link"),
                ("]:", "link"),
                (" ", ""),
                ("http://a", "string url"),
            ]),
            styled(&[("\"t\"", "string")]),
        ]
    );
}

#[rstest]
#[case::first_line("    code", vec![("    ", ""), ("code", "comment")])]
#[case::after_blank("para\n\n    code", vec![("    ", ""), ("code", "comment")])]
#[case::lazy_continuation("para\n    code", vec![("    ", ""), ("code", "")])]
fn indented_code_needs_a_boundary(#[case] text: &str, #[case] last: Vec<(&str, &str)>) {
    let mode = mode(ModeConfig::default());
    let mut lines = line_pairs(&mode, text);
    assert_eq!(lines.pop(), Some(styled(&last)));
}

#[test]
fn rule_after_list_and_blank_line() {
    let mode = mode(ModeConfig::default());
    assert_eq!(
        line_pairs(&mode, "- a\n\n---"),
        vec![
            styled(&[("- ", "variable-2"), ("a", "variable-2")]),
            vec![],
            styled(&[("---", "hr")]),
        ]
    );
}

#[test]
fn missing_link_target_is_an_error() {
    let mode = mode(ModeConfig::default());
    // The escaped bracket hides the real close, so the line ends still expecting a target.
    let lines = line_pairs(&mode, "![a\\](b)]\nx");
    assert_eq!(
        lines[0].last(),
        Some(&("]".to_string(), s("image image-alt-text link")))
    );
    assert_eq!(lines[1], styled(&[("x", "error")]));
}

#[test]
fn fenced_block_delegates_to_language_mode() {
    let (mode, _) = with_words(ModeConfig::default());
    assert_eq!(
        line_pairs(&mode, "```js\nlet x\n```\nafter"),
        vec![
            vec![("```js".to_string(), s("comment"))],
            vec![
                ("let".to_string(), s("variable")),
                (" ".to_string(), None),
                ("x".to_string(), s("variable")),
            ],
            vec![("```".to_string(), s("comment"))],
            vec![("after".to_string(), None)],
        ]
    );
}

#[test]
fn fence_close_needs_same_marker_and_length() {
    let (mode, _) = with_words(ModeConfig::default());
    let mut state = mode.start_state();
    let lines = ["````js", "```", "~~~~", "````"];
    let mut open = Vec::new();
    for line in lines {
        mode.tokenize_line(&mut state, line, None);
        open.push(state.in_fenced_code());
    }
    assert_eq!(open, vec![true, true, true, false]);
}

#[test]
fn fence_without_mode_is_styled_as_code() {
    let mode = mode(ModeConfig::default());
    assert_eq!(
        line_pairs(&mode, "~~~\n*not em*\n~~~"),
        vec![
            vec![("~~~".to_string(), s("comment"))],
            vec![("*not em*".to_string(), s("comment"))],
            vec![("~~~".to_string(), s("comment"))],
        ]
    );
}

#[test]
fn blank_lines_reach_fence_delegate() {
    let (mode, words) = with_words(ModeConfig::default());
    mode.tokenize_str("```js\na\n\n\nb\n```\n\n");
    assert_eq!(words.blank_lines.load(Ordering::SeqCst), 2);
}

#[test]
fn fence_closes_when_list_item_ends() {
    let (mode, _) = with_words(ModeConfig::default());
    let mut state = mode.start_state();
    mode.tokenize_line(&mut state, "- item", None);
    mode.tokenize_line(&mut state, "  ```js", None);
    assert!(state.in_fenced_code());
    mode.tokenize_line(&mut state, "  code", None);
    assert!(state.in_fenced_code());
    mode.tokenize_line(&mut state, "outside", None);
    assert!(!state.in_fenced_code());
    assert!(!state.in_list());
}

#[test]
fn fenced_markdown_uses_nested_tokenizer() {
    let mut registry = ModeRegistry::with_builtin_modes();
    registry.register(["markdown", "md"], Arc::new(mode(ModeConfig::default())));
    let outer = MarkdownMode::new(ModeConfig::default(), Arc::new(registry)).unwrap();
    let lines = line_pairs(&outer, "```markdown\n# Inner\n```");
    assert_eq!(
        lines[1],
        vec![
            ("# ".to_string(), s("header header-1")),
            ("Inner".to_string(), s("header header-1")),
        ]
    );
}

#[test]
fn raw_markup_is_delegated_until_top_level() {
    let mode = mode(ModeConfig::default());
    insta::assert_snapshot!(render(&mode, "<div class=\"x\">hi</div>\nafter"), @r#"
    0:0-4 [tag] "<div"
    0:4-5 [] " "
    0:5-10 [attribute] "class"
    0:10-11 [] "="
    0:11-14 [string] "\"x\""
    0:14-15 [tag bracket] ">"
    0:15-17 [] "hi"
    0:17-22 [tag] "</div"
    0:22-23 [tag bracket] ">"
    1:0-5 [] "after"
    "#);
}

#[test]
fn markup_region_spans_lines() {
    let mode = mode(ModeConfig::default());
    let mut state = mode.start_state();
    mode.tokenize_line(&mut state, "<div>", None);
    assert!(state.in_markup());
    mode.tokenize_line(&mut state, "*still markup*", None);
    assert!(state.in_markup());
    mode.tokenize_line(&mut state, "</div>", None);
    assert!(!state.in_markup());
}

#[test]
fn markup_disabled_leaves_tags_inline() {
    let mode = mode(ModeConfig {
        embedded_markup: false,
        ..ModeConfig::default()
    });
    let mut state = mode.start_state();
    mode.tokenize_line(&mut state, "<div>", None);
    assert!(!state.in_markup());
}

#[test]
fn cloned_state_tokenizes_identically() {
    let mode = mode(ModeConfig {
        highlight_formatting: true,
        strikethrough: true,
        ..ModeConfig::default()
    });
    let head = ["- *open emphasis", "  ```", "  code"];
    let tail = ["  ```", "> **bold** ~~gone~~", "[x]: http://a \"t\""];

    let mut state = mode.start_state();
    for line in head {
        mode.tokenize_line(&mut state, line, None);
    }
    let mut copy: MarkdownState = state.clone();

    for line in tail {
        let original = mode.tokenize_line(&mut state, line, None);
        let cloned = mode.tokenize_line(&mut copy, line, None);
        assert_eq!(original, cloned);
    }
}

#[test]
fn list_stack_strictly_increases_and_pops() {
    let mode = mode(ModeConfig::default());
    let mut state = mode.start_state();
    mode.tokenize_line(&mut state, "- a", None);
    mode.tokenize_line(&mut state, "  - b", None);
    mode.tokenize_line(&mut state, "    - c", None);
    assert_eq!(state.list_stack(), &[2, 4, 6]);

    let tokens = mode.tokenize_line(&mut state, "  x", None);
    assert_eq!(state.list_stack(), &[2]);
    assert_eq!(pairs("  x", &tokens), vec![("  ", None), ("x", s("variable-2"))]);
}

#[test]
fn nested_list_levels_cycle_styles() {
    let mode = mode(ModeConfig::default());
    let styles: Vec<_> = line_pairs(&mode, "- a\n  - b\n    - c\n      - d")
        .into_iter()
        .map(|line| line.last().and_then(|(_, style)| style.clone()))
        .collect();
    assert_eq!(
        styles,
        vec![
            s("variable-2"),
            s("variable-3"),
            s("keyword"),
            s("variable-2")
        ]
    );
}

#[test]
fn quote_depth_resets_each_line() {
    let mode = mode(ModeConfig::default());
    let mut state = mode.start_state();
    mode.tokenize_line(&mut state, "> > deep", None);
    assert_eq!(state.quote_depth(), 2);
    let tokens = mode.tokenize_line(&mut state, "plain", None);
    assert_eq!(state.quote_depth(), 0);
    assert_eq!(pairs("plain", &tokens), vec![("plain", None)]);
}

#[test]
fn quote_beyond_limit_is_capped() {
    let mode = mode(ModeConfig {
        max_blockquote_depth: 1,
        ..ModeConfig::default()
    });
    let mut state = mode.start_state();
    let tokens = mode.tokenize_line(&mut state, "> > x", None);
    assert_eq!(tokens.last().unwrap().style, s("quote quote-1"));
}

#[test]
fn style_overrides_rename_labels() {
    let mut config = ModeConfig::default();
    config
        .style_overrides
        .insert("header".to_string(), "heading".to_string());
    let first = mode(config.clone());
    let second = mode(config);
    let text = "# T\n\n> q";
    assert_eq!(first.tokenize_str(text), second.tokenize_str(text));
    assert_eq!(
        line_pairs(&first, "# T")[0][1],
        ("T".to_string(), s("heading heading-1"))
    );
}

#[test]
fn unknown_style_override_is_rejected() {
    let mut config = ModeConfig::default();
    config
        .style_overrides
        .insert("headline".to_string(), "x".to_string());
    assert_eq!(
        MarkdownMode::with_config(config).unwrap_err(),
        ModeError::UnknownStyleKey("headline".to_string())
    );
}

#[test]
fn markdown_mode_is_a_mode() {
    let markdown = mode(ModeConfig::default());
    let as_mode: &dyn Mode = &markdown;
    let mut state = as_mode.start_state();
    let tokens = mdmode_engine::tokenize_line(as_mode, state.as_mut(), "# Hi", None);
    assert_eq!(tokens.len(), 2);
    assert!(as_mode.is_top_level_text(state.as_ref()));
}
