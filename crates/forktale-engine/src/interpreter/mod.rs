//! The interpreter: walks a fork's block tree, drives the console, owns the
//! variable store and every live timer and submit handler.

mod commands;
mod conditions;

use std::path::{Path, PathBuf};

use forktale_script::{
    Evaluator, GameFile, NodeId, Value, normalize_fork_name, parse_file,
};

use crate::console::{Console, OptionAction, Rgb, Speech, StyledRun, TextStyle};
use crate::error::{EngineError, EngineResult, InterpretError};
use crate::prefs::Preferences;
use crate::timer::{Grammar, SubmitHandler, TimerSet};
use crate::vars::VarStore;

/// Global error policy.
#[derive(Debug, Clone, Copy)]
pub struct Settings {
    /// Raise faults as typed errors instead of silently skipping the
    /// offending construct.
    pub strict_errors: bool,
    /// Catch faults at each entry point, clear the screen, and display the
    /// message instead of propagating to the host.
    pub print_errors: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            strict_errors: true,
            print_errors: true,
        }
    }
}

/// The color errors are displayed in when `print_errors` is set.
const DIAGNOSTIC_COLOR: Rgb = Rgb::new(0xff, 0xff, 0x00);

/// The scripted-fiction interpreter.
///
/// Single-threaded and host-driven: the host feeds user events and time
/// through the public entry points ([`Interpreter::submit`],
/// [`Interpreter::activate`], [`Interpreter::tick`],
/// [`Interpreter::speech_heard`]), each of which runs the affected part of
/// the current fork synchronously before returning.
pub struct Interpreter<C: Console, S: Speech> {
    console: C,
    speech: S,
    settings: Settings,
    prefs: Preferences,
    game: Option<GameFile>,
    tree: forktale_script::ForkTree,
    current_fork: String,
    vars: VarStore,
    evaluator: Evaluator,
    timers: TimerSet,
    submit_handlers: Vec<SubmitHandler>,
    grammars: Vec<Grammar>,
    stop: bool,
    options_emitted: usize,
    text_color: Option<Rgb>,
    now_ms: u64,
}

impl<C: Console, S: Speech> Interpreter<C, S> {
    /// Create an interpreter around a console and speech facade.
    pub fn new(console: C, speech: S, settings: Settings) -> Self {
        Self {
            console,
            speech,
            settings,
            prefs: Preferences::default(),
            game: None,
            tree: forktale_script::ForkTree::new(),
            current_fork: String::new(),
            vars: VarStore::new(),
            evaluator: Evaluator::new(),
            timers: TimerSet::default(),
            submit_handlers: Vec::new(),
            grammars: Vec::new(),
            stop: false,
            options_emitted: 0,
            text_color: None,
            now_ms: 0,
        }
    }

    /// Borrow the console, e.g. for drawing.
    pub fn console(&self) -> &C {
        &self.console
    }

    /// Borrow the console mutably.
    pub fn console_mut(&mut self) -> &mut C {
        &mut self.console
    }

    /// Borrow the speech facade.
    pub fn speech(&self) -> &S {
        &self.speech
    }

    /// Borrow the speech facade mutably.
    pub fn speech_mut(&mut self) -> &mut S {
        &mut self.speech
    }

    /// The current fork's normalized name.
    pub fn current_fork(&self) -> &str {
        &self.current_fork
    }

    /// The variable store.
    pub fn vars(&self) -> &VarStore {
        &self.vars
    }

    /// Active presentation preferences.
    pub fn prefs(&self) -> &Preferences {
        &self.prefs
    }

    /// True once a game file has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.game.is_some()
    }

    /// Host time at which the next timer fires, if any.
    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.next_deadline()
    }

    /// Number of live submit handlers. Exposed for hosts that want to show
    /// whether typed input currently goes anywhere.
    pub fn submit_handler_count(&self) -> usize {
        self.submit_handlers.len()
    }

    // --- public entry points -----------------------------------------------

    /// Load and run a game file from disk. Clears the variable store.
    pub fn load_file(
        &mut self,
        path: &Path,
        initial_fork: Option<&str>,
        now_ms: u64,
    ) -> EngineResult<()> {
        self.enter(now_ms);
        let result = self.load_path_inner(path, initial_fork, true);
        self.leave(result)
    }

    /// Run an already-parsed game file. Clears the variable store.
    pub fn load_game(
        &mut self,
        game: GameFile,
        initial_fork: Option<&str>,
        now_ms: u64,
    ) -> EngineResult<()> {
        self.enter(now_ms);
        self.vars.clear();
        let result = self.install_game(game, initial_fork);
        self.leave(result)
    }

    /// Navigate to a fork.
    pub fn set_fork(&mut self, name: &str, now_ms: u64) -> EngineResult<()> {
        self.enter(now_ms);
        let result = self.set_fork_inner(name);
        self.leave(result)
    }

    /// Deliver a clicked option or inline link.
    pub fn activate(&mut self, action: &OptionAction, now_ms: u64) -> EngineResult<()> {
        self.enter(now_ms);
        let result = self.activate_inner(action);
        self.leave(result)
    }

    /// Deliver text the user submitted in the input line.
    pub fn submit(&mut self, text: &str, now_ms: u64) -> EngineResult<()> {
        if text.is_empty() {
            return Ok(());
        }
        self.enter(now_ms);
        let result = self.submit_inner(text);
        self.leave(result)
    }

    /// Deliver a phrase the speech recognizer heard.
    pub fn speech_heard(&mut self, phrase: &str, now_ms: u64) -> EngineResult<()> {
        self.enter(now_ms);
        let result = self.speech_heard_inner(phrase);
        self.leave(result)
    }

    /// Advance host time, firing every timer due at or before `now_ms`.
    pub fn tick(&mut self, now_ms: u64) -> EngineResult<()> {
        self.enter(now_ms);
        let result = self.tick_inner();
        self.leave(result)
    }

    // --- entry plumbing ----------------------------------------------------

    /// Record host time and reset the stop flag for a fresh callback stack.
    fn enter(&mut self, now_ms: u64) {
        self.now_ms = now_ms;
        self.stop = false;
    }

    /// Apply the `print_errors` policy at the entry-point boundary.
    fn leave(&mut self, result: EngineResult<()>) -> EngineResult<()> {
        match result {
            Err(e) if self.settings.print_errors => {
                self.display_error(&e);
                Ok(())
            }
            other => other,
        }
    }

    /// Clear the screen, print the fault, and offer a way back in.
    fn display_error(&mut self, error: &EngineError) {
        self.console.clear();
        self.console.add_text(StyledRun {
            text: format!("{error}\n"),
            style: TextStyle::Regular,
            color: Some(DIAGNOSTIC_COLOR),
        });
        self.console.add_option(
            StyledRun {
                text: "load file".to_string(),
                style: TextStyle::Regular,
                color: Some(self.prefs.option_color),
            },
            OptionAction::LoadFile,
        );
        self.console.set_input_enabled(true);
    }

    /// Suppress or raise an interpreter fault per the strict-errors flag.
    fn fail(&self, error: InterpretError) -> EngineResult<()> {
        if self.settings.strict_errors {
            Err(error.into())
        } else {
            Ok(())
        }
    }

    /// As [`Self::fail`], for faults already wrapped as engine errors.
    fn fail_engine(&self, error: EngineError) -> EngineResult<()> {
        if self.settings.strict_errors {
            Err(error)
        } else {
            Ok(())
        }
    }

    // --- loading -----------------------------------------------------------

    fn load_path_inner(
        &mut self,
        path: &Path,
        initial_fork: Option<&str>,
        clear_vars: bool,
    ) -> EngineResult<()> {
        let game = parse_file(path)?;
        if clear_vars {
            self.vars.clear();
        }
        self.install_game(game, initial_fork)
    }

    fn install_game(&mut self, game: GameFile, initial_fork: Option<&str>) -> EngineResult<()> {
        self.process_header_options(&game.header);
        if let Some(stem) = game.path.file_stem() {
            self.console.set_title(&stem.to_string_lossy());
        }

        let start = match initial_fork {
            Some(name) => normalize_fork_name(name),
            None => game.first_fork().unwrap_or_default().to_string(),
        };
        self.game = Some(game);
        self.set_fork_inner(&start)
    }

    /// Parse the options header, resetting preferences to defaults first.
    fn process_header_options(&mut self, header: &str) {
        self.prefs = Preferences::from_header(header);
        self.console
            .set_size(self.prefs.window_width, self.prefs.window_height);
        self.console.apply_preferences(&self.prefs);
    }

    // --- fork evaluation ---------------------------------------------------

    /// Enter a fork: the atomic clear, then the pre-order walk.
    fn set_fork_inner(&mut self, name: &str) -> EngineResult<()> {
        let name = normalize_fork_name(name);

        self.console.clear();
        self.console.set_input_enabled(false);
        self.speech.unload_all();
        self.speech.stop_listening();
        self.speech.stop_speaking();
        self.timers.clear();
        self.submit_handlers.clear();
        self.grammars.clear();
        self.stop = false;
        self.options_emitted = 0;
        self.text_color = None;
        self.current_fork = name.clone();

        let tree = self
            .game
            .as_ref()
            .and_then(|g| g.fork(&name))
            .cloned()
            .ok_or_else(|| InterpretError::UnknownFork(name.clone()))?;
        self.tree = tree;

        self.walk(self.tree.root(), "")?;

        if !self.stop {
            self.vars
                .set(format!("visited{name}"), Value::Boolean(true));
            if self.options_emitted == 0 && !self.prefs.option_default_disable {
                let label = self.prefs.option_default_text.clone();
                self.console.add_option(
                    StyledRun {
                        text: label,
                        style: TextStyle::Regular,
                        color: Some(self.prefs.option_color),
                    },
                    OptionAction::Restart,
                );
            }
        }

        Ok(())
    }

    /// Pre-order walk: condition, own text, then children, unless a deferred
    /// condition claims the subtree or the stop flag short-circuits.
    fn walk(&mut self, id: NodeId, textbox: &str) -> EngineResult<()> {
        if self.stop {
            return Ok(());
        }
        if self.process_if(id, textbox)? {
            self.process_text(id)?;
            self.walk_children(id, textbox)?;
        }
        Ok(())
    }

    fn walk_children(&mut self, id: NodeId, textbox: &str) -> EngineResult<()> {
        if self.stop {
            return Ok(());
        }
        let children = self.tree.node(id).children.clone();
        for child in children {
            if self.stop {
                break;
            }
            self.walk(child, textbox)?;
        }
        Ok(())
    }

    /// Run a deferred node: its text, then its subtree.
    fn resume_node(&mut self, id: NodeId, textbox: &str) -> EngineResult<()> {
        self.process_text(id)?;
        self.walk_children(id, textbox)
    }

    // --- event dispatch ----------------------------------------------------

    fn activate_inner(&mut self, action: &OptionAction) -> EngineResult<()> {
        if self.game.is_none() {
            return Ok(());
        }
        match action {
            OptionAction::Goto(fork) => self.set_fork_inner(fork),
            OptionAction::Restart => {
                self.vars.clear();
                let first = self
                    .game
                    .as_ref()
                    .and_then(|g| g.first_fork())
                    .unwrap_or_default()
                    .to_string();
                self.set_fork_inner(&first)
            }
            OptionAction::LoadFile => {
                let path = self.game.as_ref().map(|g| g.path.clone()).unwrap_or_default();
                self.load_path_inner(&path, None, true)
            }
        }
    }

    fn submit_inner(&mut self, text: &str) -> EngineResult<()> {
        let handlers = self.submit_handlers.clone();
        for handler in handlers {
            if self.stop {
                break;
            }
            if handler.query.matches(text) {
                self.resume_node(handler.node, text)?;
            }
        }
        Ok(())
    }

    fn speech_heard_inner(&mut self, phrase: &str) -> EngineResult<()> {
        let grammars = self.grammars.clone();
        for grammar in grammars {
            if self.stop {
                break;
            }
            if grammar.phrase.trim().eq_ignore_ascii_case(phrase.trim()) {
                self.resume_node(grammar.node, "")?;
            }
        }
        Ok(())
    }

    fn tick_inner(&mut self) -> EngineResult<()> {
        use crate::timer::{Timer, TimerPayload};

        while let Some(timer) = self.timers.pop_due(self.now_ms) {
            let Timer {
                id,
                interval_ms,
                due_at,
                payload,
            } = timer;

            match payload {
                TimerPayload::Block { node } => {
                    self.resume_node(node, "")?;
                }
                TimerPayload::Typewriter {
                    node,
                    chars,
                    pos,
                    style,
                    color,
                } => {
                    if pos < chars.len() {
                        self.console.add_text(StyledRun {
                            text: chars[pos].to_string(),
                            style,
                            color,
                        });
                        self.timers.reinsert(Timer {
                            id,
                            interval_ms,
                            due_at: due_at + interval_ms,
                            payload: TimerPayload::Typewriter {
                                node,
                                chars,
                                pos: pos + 1,
                                style,
                                color,
                            },
                        });
                    } else {
                        self.console.add_text(StyledRun {
                            text: "\n".to_string(),
                            style,
                            color,
                        });
                        if let Some(node) = node {
                            self.resume_node(node, "")?;
                        }
                    }
                }
            }

            if self.stop {
                break;
            }
        }
        Ok(())
    }

    // --- shared helpers ----------------------------------------------------

    /// Reset and re-populate the evaluator's symbol table: every variable,
    /// plus the synthetic `visited` flag for the current fork.
    fn prepare_evaluator(&mut self) {
        self.evaluator.reset();
        for (name, value) in self.vars.iter() {
            self.evaluator.register(name, value.clone());
        }
        let visited = self
            .vars
            .get(&format!("visited{}", self.current_fork))
            .is_some_and(|v| *v == Value::Boolean(true));
        self.evaluator.register("visited", Value::Boolean(visited));
    }

    /// Resolve a script-relative resource path against the game file's
    /// directory.
    fn resolve_resource(&self, relative: &str) -> PathBuf {
        let base = self
            .game
            .as_ref()
            .and_then(|g| g.path.parent())
            .unwrap_or_else(|| Path::new("."));
        base.join(relative)
    }
}

/// Split off the first whitespace-delimited word; the remainder keeps its
/// interior spacing.
pub(crate) fn split_first_word(s: &str) -> (&str, &str) {
    match s.split_once(char::is_whitespace) {
        Some((first, rest)) => (first, rest.trim_start()),
        None => (s, ""),
    }
}

/// Position of the first `@` that sits outside `{ }` on the line.
pub(crate) fn find_at_outside_braces(line: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, c) in line.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            '@' if depth == 0 => return Some(idx),
            _ => {}
        }
    }
    None
}

/// Map a `type` keyword's asterisk suffix to a text style.
pub(crate) fn style_from_asterisks(suffix: &str) -> Option<TextStyle> {
    match suffix {
        "" => Some(TextStyle::Regular),
        "*" => Some(TextStyle::Italic),
        "**" => Some(TextStyle::Bold),
        "***" => Some(TextStyle::BoldItalic),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_first_word_keeps_interior_spacing() {
        assert_eq!(split_first_word("type 10 two  words"), ("type", "10 two  words"));
        assert_eq!(split_first_word("solo"), ("solo", ""));
        assert_eq!(split_first_word("a   b c"), ("a", "b c"));
    }

    #[test]
    fn at_search_skips_braced_text() {
        assert_eq!(find_at_outside_braces("Go north@cave"), Some(8));
        assert_eq!(find_at_outside_braces("{a@b} go@cave"), Some(8));
        assert_eq!(find_at_outside_braces("{a@b}"), None);
    }

    #[test]
    fn asterisk_styles() {
        assert_eq!(style_from_asterisks(""), Some(TextStyle::Regular));
        assert_eq!(style_from_asterisks("*"), Some(TextStyle::Italic));
        assert_eq!(style_from_asterisks("**"), Some(TextStyle::Bold));
        assert_eq!(style_from_asterisks("***"), Some(TextStyle::BoldItalic));
        assert_eq!(style_from_asterisks("****"), None);
    }
}
