//! # Modes and the mode registry
//!
//! A [`Mode`] is an independent line tokenizer with its own opaque state. The
//! markdown tokenizer is one mode; fenced code blocks and embedded markup are
//! handed to other modes looked up by name in a [`ModeRegistry`].
//!
//! The markdown tokenizer never looks inside a delegate's state. It only
//! creates it, feeds it lines, clones it for checkpoints and asks the single
//! exit question [`Mode::is_top_level_text`].

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::markup::MarkupMode;
use crate::stream::LineStream;

/// Opaque per-stream state owned by a [`Mode`].
///
/// Implemented for every `Clone + Debug + Send + Sync` type, so a mode only
/// has to pick a state struct. Always call these methods on `&dyn ModeState`
/// (not on a `Box<dyn ModeState>`) so they reach the concrete state.
pub trait ModeState: Any + fmt::Debug + Send + Sync {
    fn box_clone(&self) -> Box<dyn ModeState>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T> ModeState for T
where
    T: Any + Clone + fmt::Debug + Send + Sync,
{
    fn box_clone(&self) -> Box<dyn ModeState> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Clone for Box<dyn ModeState> {
    fn clone(&self) -> Self {
        (**self).box_clone()
    }
}

/// A line tokenizer that can be driven on its own or as a delegate.
pub trait Mode: fmt::Debug + Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Fresh state for a new stream.
    fn start_state(&self) -> Box<dyn ModeState>;

    /// Consumes one token from `stream` and returns its style.
    ///
    /// The caller marks the token start with [`LineStream::start_token`]
    /// before each call. `None` means the token carries no style.
    fn token(&self, stream: &mut LineStream<'_>, state: &mut dyn ModeState) -> Option<String>;

    /// Notifies the mode of an empty line.
    fn blank_line(&self, _state: &mut dyn ModeState) {}

    /// True when the mode sits in plain text with no open construct.
    ///
    /// Used as the exit condition for embedded markup regions.
    fn is_top_level_text(&self, _state: &dyn ModeState) -> bool {
        true
    }
}

/// A resolved delegate: the mode plus the state it owns for this stream.
#[derive(Debug, Clone)]
pub struct Delegate {
    mode: Arc<dyn Mode>,
    state: Box<dyn ModeState>,
}

impl Delegate {
    /// Starts a delegate with the mode's initial state.
    pub fn start(mode: Arc<dyn Mode>) -> Self {
        let state = mode.start_state();
        Self { mode, state }
    }

    pub fn mode(&self) -> &Arc<dyn Mode> {
        &self.mode
    }

    pub fn state(&self) -> &dyn ModeState {
        self.state.as_ref()
    }

    pub fn token(&mut self, stream: &mut LineStream<'_>) -> Option<String> {
        self.mode.token(stream, self.state.as_mut())
    }

    pub fn blank_line(&mut self) {
        self.mode.blank_line(self.state.as_mut());
    }

    pub fn is_top_level_text(&self) -> bool {
        self.mode.is_top_level_text(self.state.as_ref())
    }
}

/// Name → mode lookup used for fenced code languages and embedded markup.
///
/// Names are matched case-insensitively. Later registrations override
/// earlier ones.
#[derive(Debug, Default, Clone)]
pub struct ModeRegistry {
    modes: HashMap<String, Arc<dyn Mode>>,
}

impl ModeRegistry {
    /// Name under which the embedded markup delegate is looked up.
    pub const MARKUP: &'static str = "text/html";

    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the markup modes shipped with this crate.
    pub fn with_builtin_modes() -> Self {
        let mut registry = Self::new();
        registry.register(["html", "htm", "text/html"], Arc::new(MarkupMode::html()));
        registry.register(
            ["xml", "text/xml", "application/xml"],
            Arc::new(MarkupMode::xml()),
        );
        registry
    }

    /// Registers `mode` under every name in `names`.
    pub fn register<I, S>(&mut self, names: I, mode: Arc<dyn Mode>)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.modes
                .insert(name.as_ref().to_ascii_lowercase(), Arc::clone(&mode));
        }
    }

    /// Looks up a mode by name or alias.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Mode>> {
        self.modes.get(&name.trim().to_ascii_lowercase()).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.modes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
