//! Error types for the script pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Alias for `Result<T, ScriptError>`.
pub type ScriptResult<T> = Result<T, ScriptError>;

/// Errors raised while parsing a game file into forks.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The game file does not exist or could not be read.
    #[error("cannot read game file {path}: {source}")]
    FileNotFound {
        /// The path that failed to open.
        path: PathBuf,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// The game file contains no forks.
    #[error("game file {path} declares no forks")]
    EmptyFile {
        /// The offending file.
        path: PathBuf,
    },

    /// Two fork headers normalize to the same name.
    #[error("duplicate fork: \"{name}\"")]
    DuplicateFork {
        /// The normalized fork name.
        name: String,
        /// Byte span of the second header line.
        span: std::ops::Range<usize>,
    },

    /// A fork header with nothing after the `@`.
    #[error("fork header has an empty name")]
    EmptyForkName {
        /// Byte span of the header line.
        span: std::ops::Range<usize>,
    },

    /// `if` and `endif` counts differ, or an `endif` closes nothing.
    #[error("unbalanced if/endif in fork \"{fork}\"")]
    UnbalancedIf {
        /// The fork whose body failed to nest.
        fork: String,
        /// Byte span of the offending token within the entry.
        span: std::ops::Range<usize>,
    },

    /// Two `if`/`endif` tokens share one line.
    #[error("multiple if/endif on one line in fork \"{fork}\"")]
    MultiplePerLine {
        /// The fork whose body failed to nest.
        fork: String,
        /// Byte span of the second token within the entry.
        span: std::ops::Range<usize>,
    },
}

/// Alias for `Result<T, EvalError>`.
pub type EvalResult<T> = Result<T, EvalError>;

/// Errors raised while evaluating an expression.
#[derive(Debug, Clone, Error)]
pub enum EvalError {
    /// The expression failed to lex or parse.
    #[error("invalid expression: {message}")]
    Parse {
        /// Description of the syntax fault.
        message: String,
        /// Byte span within the expression source.
        span: std::ops::Range<usize>,
    },

    /// An identifier with no registered value, with unknowns disallowed.
    #[error("unknown identifier: {0}")]
    UnknownIdentifier(String),

    /// An operator applied to operands of the wrong type.
    #[error("type mismatch: cannot apply `{op}` to {lhs} and {rhs}")]
    TypeMismatch {
        /// The operator's source form.
        op: &'static str,
        /// Canonical form of the left operand.
        lhs: String,
        /// Canonical form of the right operand.
        rhs: String,
    },

    /// A unary operator applied to an operand of the wrong type.
    #[error("type mismatch: cannot apply `{op}` to {operand}")]
    UnaryMismatch {
        /// The operator's source form.
        op: &'static str,
        /// Canonical form of the operand.
        operand: String,
    },

    /// Division by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// Arithmetic overflowed the decimal range.
    #[error("decimal overflow")]
    Overflow,
}
