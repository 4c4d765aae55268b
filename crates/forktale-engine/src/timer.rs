//! Timers and submit handlers owned by the interpreter.
//!
//! Nothing here touches the OS clock. The host observes
//! [`TimerSet::next_deadline`] and calls the interpreter's `tick` with its
//! own notion of now; due timers then run their continuations synchronously.
//! Entering a fork drops the whole set, which is the only cancellation
//! mechanism.

use forktale_script::NodeId;

use crate::console::{Rgb, TextStyle};
use crate::query::TextQuery;

/// Owned handle to a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimerId(pub u64);

/// What a timer does when it fires.
#[derive(Debug, Clone)]
pub enum TimerPayload {
    /// An `if timer is N` block: run the node's text, then its children.
    Block {
        /// The deferred node.
        node: NodeId,
    },
    /// A typewriter: append one decoded character per tick.
    Typewriter {
        /// Deferred node to continue with once the text is exhausted, when
        /// the typewriter came from an `if type …` block.
        node: Option<NodeId>,
        /// The decoded text.
        chars: Vec<char>,
        /// Next character to emit.
        pos: usize,
        /// Emphasis for the emitted characters.
        style: TextStyle,
        /// Color for the emitted characters.
        color: Option<Rgb>,
    },
}

/// A scheduled timer.
#[derive(Debug, Clone)]
pub struct Timer {
    /// Handle, unique within the owning set's lifetime.
    pub id: TimerId,
    /// Tick interval in milliseconds.
    pub interval_ms: u64,
    /// Host time at which the timer next fires.
    pub due_at: u64,
    /// The continuation.
    pub payload: TimerPayload,
}

/// The interpreter's live timers.
#[derive(Debug, Clone, Default)]
pub struct TimerSet {
    timers: Vec<Timer>,
    next_id: u64,
}

impl TimerSet {
    /// Schedule a timer `interval_ms` from `now_ms`.
    pub fn schedule(&mut self, now_ms: u64, interval_ms: u64, payload: TimerPayload) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.push(Timer {
            id,
            interval_ms,
            due_at: now_ms + interval_ms,
            payload,
        });
        id
    }

    /// Re-insert a timer, keeping its id (and therefore its scheduling
    /// order on ties).
    pub fn reinsert(&mut self, timer: Timer) {
        self.timers.push(timer);
    }

    /// Drop every timer.
    pub fn clear(&mut self) {
        self.timers.clear();
    }

    /// The earliest due time, if any timer is live.
    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.iter().map(|t| t.due_at).min()
    }

    /// Remove and return the next timer due at or before `now_ms`.
    /// Ties fire in scheduling order.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<Timer> {
        let idx = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due_at <= now_ms)
            .min_by_key(|(_, t)| (t.due_at, t.id))
            .map(|(i, _)| i)?;
        Some(self.timers.remove(idx))
    }

    /// Number of live timers.
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    /// True when no timers are live.
    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}

/// A registered `OnSubmit` handler, detached when the fork is left.
#[derive(Debug, Clone)]
pub struct SubmitHandler {
    /// The deferred node.
    pub node: NodeId,
    /// The query the submitted text must satisfy.
    pub query: TextQuery,
}

/// A registered speech grammar.
#[derive(Debug, Clone)]
pub struct Grammar {
    /// The deferred node.
    pub node: NodeId,
    /// The phrase the recognizer listens for.
    pub phrase: String,
}
