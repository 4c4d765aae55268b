//! The Forktale interpreter and its console contract.
//!
//! `forktale-script` turns a game file into forks; this crate walks them.
//! The interpreter owns the variable store, timers, submit handlers, and
//! speech grammars, and drives a [`console::Console`] implementation
//! supplied by the host. Hosts feed user events and time back through the
//! interpreter's public entry points; nothing here blocks or sleeps.

pub mod console;
pub mod error;
pub mod escape;
pub mod interpreter;
pub mod prefs;
pub mod query;
pub mod timer;
pub mod vars;

pub use console::{Console, NullSpeech, OptionAction, Rgb, Speech, StyledRun, TextStyle};
pub use error::{EngineError, EngineResult, InterpretError};
pub use interpreter::{Interpreter, Settings};
pub use prefs::Preferences;
pub use vars::VarStore;
