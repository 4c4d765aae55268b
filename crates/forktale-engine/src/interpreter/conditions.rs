//! Condition dispatch for `if` blocks.
//!
//! Most conditions are boolean expressions, evaluated against the variable
//! store. The rest (`timer is`, `speak`, `text …`, `type …`) defer the
//! node's subtree behind a timer, grammar, or submit handler and return
//! false so the walk skips it for now.

use forktale_script::{NodeId, Value};

use crate::console::{Console, Speech};
use crate::error::{EngineResult, InterpretError};
use crate::escape::decode_escapes;
use crate::query::TextQuery;
use crate::timer::{Grammar, SubmitHandler, TimerPayload};

use super::{Interpreter, split_first_word, style_from_asterisks};

impl<C: Console, S: Speech> Interpreter<C, S> {
    /// Decide whether to walk a node now.
    ///
    /// Returns true to proceed into the node's text and children. A false
    /// return either failed a boolean condition or deferred the subtree;
    /// deferring conditions take over any further recursion themselves.
    pub(super) fn process_if(&mut self, id: NodeId, textbox: &str) -> EngineResult<bool> {
        let condition = self.tree.node(id).condition.clone();
        let trimmed = condition.trim();
        if trimmed.is_empty() {
            return Ok(true);
        }

        let rest = trimmed.strip_prefix("if").unwrap_or(trimmed).trim_start();
        if rest.is_empty() {
            return Ok(true);
        }

        let (head, args) = split_first_word(rest);
        match head {
            "timer" => self.condition_timer(id, rest, args),
            "speak" => self.condition_speak(id, args),
            "text" => self.condition_text(id, rest, args, textbox),
            _ if head.starts_with("type") => match style_from_asterisks(&head[4..]) {
                Some(_) => {
                    self.schedule_typewriter(head, args, Some(id), rest)?;
                    Ok(false)
                }
                None => self.condition_expression(rest),
            },
            _ => self.condition_expression(rest),
        }
    }

    /// `if timer is <seconds>`: one-shot deferral of the subtree.
    fn condition_timer(&mut self, id: NodeId, line: &str, args: &str) -> EngineResult<bool> {
        let (keyword, seconds) = split_first_word(args);
        if keyword != "is" {
            return self.fail_condition(InterpretError::MalformedCommand(line.to_string()));
        }
        let seconds: f64 = match seconds.parse() {
            Ok(n) => n,
            Err(_) => {
                return self.fail_condition(InterpretError::MalformedCommand(line.to_string()));
            }
        };
        if !seconds.is_finite() || seconds <= 0.0 {
            return self.fail_condition(InterpretError::MalformedCommand(line.to_string()));
        }

        let interval_ms = ((seconds * 1000.0).round() as u64).max(1);
        self.timers
            .schedule(self.now_ms, interval_ms, TimerPayload::Block { node: id });
        Ok(false)
    }

    /// `if speak <phrase>`: register a recognizer grammar for the subtree.
    fn condition_speak(&mut self, id: NodeId, args: &str) -> EngineResult<bool> {
        let phrase = decode_escapes(args.trim());
        self.speech.listen_for(&phrase);
        self.speech.start_listening();
        self.grammars.push(Grammar { node: id, phrase });
        Ok(false)
    }

    /// `if text is|!is|has|!has|pick <query>`: enable the textbox and either
    /// register a submit handler (initial walk) or check the forwarded
    /// submission right away (re-entrant walk).
    fn condition_text(
        &mut self,
        id: NodeId,
        line: &str,
        args: &str,
        textbox: &str,
    ) -> EngineResult<bool> {
        let (kind, query_raw) = split_first_word(args);
        let query_text = match kind {
            "has" | "!has" | "pick" => decode_escapes(query_raw),
            _ => query_raw.to_string(),
        };
        let Some(query) = TextQuery::parse(kind, &query_text) else {
            return self.fail_condition(InterpretError::MalformedCommand(line.to_string()));
        };

        self.console.set_input_enabled(true);

        if textbox.is_empty() {
            self.submit_handlers.push(SubmitHandler { node: id, query });
        } else if query.matches(textbox) {
            self.resume_node(id, textbox)?;
        }
        Ok(false)
    }

    /// Anything else is a boolean expression over the variable store.
    fn condition_expression(&mut self, expr: &str) -> EngineResult<bool> {
        self.prepare_evaluator();
        match self.evaluator.evaluate(expr) {
            Ok(Value::Boolean(b)) => Ok(b),
            // An unresolved identifier reads as false in a boolean context.
            Ok(Value::Unknown) => Ok(false),
            Ok(other) => self.fail_condition(InterpretError::NonBooleanCondition {
                condition: expr.to_string(),
                value: other.to_string(),
            }),
            Err(e) => self.fail_condition(InterpretError::Eval {
                line: expr.to_string(),
                source: e,
            }),
        }
    }

    /// Strict mode raises; lenient mode treats the condition as false.
    fn fail_condition(&self, error: InterpretError) -> EngineResult<bool> {
        if self.settings.strict_errors {
            Err(error.into())
        } else {
            Ok(false)
        }
    }
}
