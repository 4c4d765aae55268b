//! Error types for the interpreter.

use std::path::PathBuf;

use thiserror::Error;

use forktale_script::{EvalError, ScriptError};

/// Alias for `Result<T, EngineError>`.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors raised while interpreting a fork.
#[derive(Debug, Error)]
pub enum InterpretError {
    /// Navigation to a fork that does not exist.
    #[error("unknown fork: \"{0}\"")]
    UnknownFork(String),

    /// An `img`, `snd`, or `load` target that does not exist.
    #[error("missing resource: {}", .0.display())]
    MissingResource(PathBuf),

    /// A line that names a command but cannot be carried out.
    #[error("malformed command: {0}")]
    MalformedCommand(String),

    /// An `if` expression that evaluated to something other than a boolean.
    #[error("condition \"{condition}\" is not a boolean: {value}")]
    NonBooleanCondition {
        /// The condition source text.
        condition: String,
        /// Canonical string form of the value it produced.
        value: String,
    },

    /// An evaluator fault, reclassified at the interpreter boundary.
    #[error("expression error in \"{line}\": {source}")]
    Eval {
        /// The line whose expression failed.
        line: String,
        /// The underlying evaluator error.
        source: EvalError,
    },
}

/// Any fault the engine can surface: a parse-stage error or an
/// interpret-stage error.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The parser rejected a game file.
    #[error(transparent)]
    Parse(#[from] ScriptError),

    /// The interpreter rejected a fork, line, or resource.
    #[error(transparent)]
    Interpret(#[from] InterpretError),
}
