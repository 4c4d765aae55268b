//! Parsing and evaluation for Forktale game files.
//!
//! This crate is the front half of the engine: the expression evaluator
//! used by `if` conditions and `set` assignments, and the file parser that
//! turns a game file into an ordered table of forks, each a tree of
//! conditional blocks. It knows nothing about presentation — the
//! interpreter in `forktale-engine` walks what this crate produces.

pub mod diagnostics;
pub mod error;
pub mod eval;
pub mod parser;
pub mod tree;
pub mod value;

pub use error::{EvalError, EvalResult, ScriptError, ScriptResult};
pub use eval::Evaluator;
pub use parser::{GameFile, normalize_fork_name, parse_file, parse_source};
pub use tree::{ForkTree, NodeId, ParseNode};
pub use value::Value;
