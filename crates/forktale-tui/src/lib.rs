//! Terminal frontend for the Forktale engine.
//!
//! Implements the engine's console contract over ratatui: a scrolling
//! output pane, a numbered options pane, and a one-line input box. The
//! event loop wakes for user input or the engine's next timer deadline,
//! whichever comes first.

pub mod app;
pub mod console;

pub use app::{TuiInterpreter, run};
pub use console::TuiConsole;
