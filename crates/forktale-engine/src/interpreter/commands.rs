//! Line-level command dispatch for a node's body text.

use forktale_script::{NodeId, Value, eval, normalize_fork_name};

use crate::console::{Console, OptionAction, Rgb, Speech, StyledRun, TextStyle};
use crate::error::{EngineResult, InterpretError};
use crate::escape::decode_escapes;
use crate::timer::TimerPayload;

use super::{Interpreter, find_at_outside_braces, split_first_word, style_from_asterisks};

impl<C: Console, S: Speech> Interpreter<C, S> {
    /// Run a node's body text line by line, top-down.
    pub(super) fn process_text(&mut self, id: NodeId) -> EngineResult<()> {
        let text = self.tree.node(id).text.clone();
        for raw_line in text.split('\n') {
            if self.stop {
                return Ok(());
            }
            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }
            self.dispatch_line(line)?;
        }
        Ok(())
    }

    /// Classify and execute one line.
    fn dispatch_line(&mut self, line: &str) -> EngineResult<()> {
        // Output literal: {text}, with up to three trailing asterisks for
        // emphasis inside the braces.
        if line.len() >= 2 && line.starts_with('{') && line.ends_with('}') {
            let content = &line[1..line.len() - 1];
            let (content, style) = split_output_style(content);
            self.console.add_text(StyledRun {
                text: format!("{}\n", decode_escapes(content)),
                style,
                color: self.text_color,
            });
            return Ok(());
        }

        // Inline link: link@display@fork.
        if let Some(rest) = line.strip_prefix("link@") {
            return self.emit_link(line, rest);
        }

        // Option line: any remaining line with an @ outside braces.
        if let Some(at) = find_at_outside_braces(line) {
            return self.emit_option(line, at);
        }

        let (command, args) = split_first_word(line);
        match command {
            "type" | "type*" | "type**" | "type***" => {
                self.schedule_typewriter(command, args, None, line)
            }
            "set" => self.command_set(line, args),
            "get" => self.command_get(line, args),
            "goto" => self.command_goto(args),
            "img" => self.command_img(args),
            "snd" => self.command_snd(args),
            "speak" => {
                self.speech.speak(&decode_escapes(args));
                Ok(())
            }
            "load" => self.command_load(line, args),
            "color" => self.command_color(line, args),
            _ => self.fail(InterpretError::MalformedCommand(line.to_string())),
        }
    }

    fn emit_link(&mut self, line: &str, rest: &str) -> EngineResult<()> {
        let Some(at) = find_at_outside_braces(rest) else {
            return self.fail(InterpretError::MalformedCommand(line.to_string()));
        };
        let display = &rest[..at];
        let fork = normalize_fork_name(&rest[at + 1..]);
        if fork.is_empty() {
            return self.fail(InterpretError::MalformedCommand(line.to_string()));
        }

        // link-style-text renders the anchor like ordinary output; it still
        // navigates, it just does not advertise itself.
        let color = if self.prefs.link_style_text {
            self.text_color
        } else {
            Some(self.prefs.option_color)
        };
        self.console.add_link(
            StyledRun {
                text: format!("{display}\n"),
                style: TextStyle::Regular,
                color,
            },
            OptionAction::Goto(fork),
        );
        Ok(())
    }

    fn emit_option(&mut self, line: &str, at: usize) -> EngineResult<()> {
        let display = &line[..at];
        let fork = normalize_fork_name(&line[at + 1..]);
        if fork.is_empty() {
            return self.fail(InterpretError::MalformedCommand(line.to_string()));
        }
        self.console.add_option(
            StyledRun {
                text: display.to_string(),
                style: TextStyle::Regular,
                color: Some(self.prefs.option_color),
            },
            OptionAction::Goto(fork),
        );
        self.options_emitted += 1;
        Ok(())
    }

    /// Shared by the `type` command and the `if type` condition; the latter
    /// passes the node whose subtree resumes when typing finishes.
    pub(super) fn schedule_typewriter(
        &mut self,
        keyword: &str,
        args: &str,
        node: Option<NodeId>,
        line: &str,
    ) -> EngineResult<()> {
        let Some(style) = style_from_asterisks(&keyword[4..]) else {
            return self.fail(InterpretError::MalformedCommand(line.to_string()));
        };
        let (delay, text_raw) = split_first_word(args);
        let interval_ms: u64 = match delay.parse() {
            Ok(n) if n > 0 => n,
            _ => return self.fail(InterpretError::MalformedCommand(line.to_string())),
        };
        let text = decode_escapes(text_raw);

        self.timers.schedule(
            self.now_ms,
            interval_ms,
            TimerPayload::Typewriter {
                node,
                chars: text.chars().collect(),
                pos: 0,
                style,
                color: self.text_color,
            },
        );
        Ok(())
    }

    fn command_set(&mut self, line: &str, args: &str) -> EngineResult<()> {
        // Full form: set <lhs> = <rhs>
        if let Some((lhs, rhs)) = args.split_once('=') {
            let name = lhs.trim().to_lowercase();
            if !valid_variable_name(&name) {
                return self.fail(InterpretError::MalformedCommand(line.to_string()));
            }
            if let Some(value) = self.eval_assignment(line, rhs.trim())? {
                self.vars.set(name, value);
            }
            return Ok(());
        }

        let tokens: Vec<&str> = args.split_whitespace().collect();
        match tokens.as_slice() {
            [] => self.fail(InterpretError::MalformedCommand(line.to_string())),

            // Shorthand: set <name> / set !<name>
            [single] => {
                let (name, value) = match single.strip_prefix('!') {
                    Some(name) => (name.to_lowercase(), false),
                    None => (single.to_lowercase(), true),
                };
                if !valid_variable_name(&name) {
                    return self.fail(InterpretError::MalformedCommand(line.to_string()));
                }
                self.vars.set(name, Value::Boolean(value));
                Ok(())
            }

            // Expression form: set <expr> where the first token is an
            // existing variable, read as set <first> = <expr>.
            [first, ..] => {
                let name = first.to_lowercase();
                if !self.vars.contains(&name) {
                    return self.fail(InterpretError::MalformedCommand(line.to_string()));
                }
                if let Some(value) = self.eval_assignment(line, args)? {
                    self.vars.set(name, value);
                }
                Ok(())
            }
        }
    }

    /// Evaluate a `set` right-hand side to a decimal or boolean. Returns
    /// `None` when a lenient fault skipped the assignment.
    fn eval_assignment(&mut self, line: &str, expr: &str) -> EngineResult<Option<Value>> {
        self.prepare_evaluator();
        match self.evaluator.evaluate(expr) {
            Ok(Value::Unknown) => Ok(Some(Value::Boolean(false))),
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                self.fail(InterpretError::Eval {
                    line: line.to_string(),
                    source: e,
                })?;
                Ok(None)
            }
        }
    }

    fn command_get(&mut self, line: &str, args: &str) -> EngineResult<()> {
        let name = args.trim().to_lowercase();
        match self.vars.get(&name) {
            Some(value) => {
                self.console.add_text(StyledRun {
                    text: format!("{value}\n"),
                    style: TextStyle::Regular,
                    color: self.text_color,
                });
                Ok(())
            }
            None => self.fail(InterpretError::MalformedCommand(line.to_string())),
        }
    }

    fn command_goto(&mut self, args: &str) -> EngineResult<()> {
        let target = normalize_fork_name(args);
        self.vars.set(
            format!("visited{}", self.current_fork),
            Value::Boolean(true),
        );
        match self.set_fork_inner(&target) {
            Ok(()) => {
                self.stop = true;
                Ok(())
            }
            Err(e) => self.fail_engine(e),
        }
    }

    fn command_img(&mut self, args: &str) -> EngineResult<()> {
        let path = self.resolve_resource(&decode_escapes(args.trim()));
        if !path.is_file() {
            return self.fail(InterpretError::MissingResource(path));
        }
        self.console.add_image(&path);
        Ok(())
    }

    fn command_snd(&mut self, args: &str) -> EngineResult<()> {
        let path = self.resolve_resource(&decode_escapes(args.trim()));
        if !path.is_file() {
            return self.fail(InterpretError::MissingResource(path));
        }
        self.console.play_sound(&path);
        Ok(())
    }

    fn command_load(&mut self, line: &str, args: &str) -> EngineResult<()> {
        let (first, remainder) = split_first_word(args);
        let (clear_vars, path_arg) = if first == "new" {
            (true, remainder)
        } else {
            (false, args)
        };
        if path_arg.trim().is_empty() {
            return self.fail(InterpretError::MalformedCommand(line.to_string()));
        }

        let path = self.resolve_resource(path_arg.trim());
        if !path.is_file() {
            return self.fail(InterpretError::MissingResource(path));
        }
        match self.load_path_inner(&path, None, clear_vars) {
            Ok(()) => {
                self.stop = true;
                Ok(())
            }
            Err(e) => self.fail_engine(e),
        }
    }

    fn command_color(&mut self, line: &str, args: &str) -> EngineResult<()> {
        match Rgb::parse_hex(args.trim()) {
            Some(color) => {
                self.text_color = Some(color);
                Ok(())
            }
            None => self.fail(InterpretError::MalformedCommand(line.to_string())),
        }
    }
}

/// Strip up to three trailing asterisks and map them to a style.
fn split_output_style(content: &str) -> (&str, TextStyle) {
    let trailing = content
        .chars()
        .rev()
        .take_while(|c| *c == '*')
        .count()
        .min(3);
    let style = match trailing {
        1 => TextStyle::Italic,
        2 => TextStyle::Bold,
        3 => TextStyle::BoldItalic,
        _ => TextStyle::Regular,
    };
    (&content[..content.len() - trailing], style)
}

/// A variable name must be a single word that does not start with a digit
/// and does not shadow an evaluator keyword or the synthetic `visited`.
fn valid_variable_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains(char::is_whitespace)
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && !eval::KEYWORDS.contains(&name)
        && name != "visited"
}
