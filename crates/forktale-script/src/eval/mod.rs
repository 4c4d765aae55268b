//! The expression evaluator used by `if` conditions and `set` assignments.
//!
//! A small infix language: decimal arithmetic, comparisons, and the boolean
//! connectives `and`/`or`/`not`. Identifiers are resolved against a symbol
//! table that the caller resets and re-registers before every evaluation.

pub mod ast;
pub mod lexer;
pub mod parser;

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::error::{EvalError, EvalResult};
use crate::value::Value;
use ast::{BinaryOp, Expr, UnaryOp};

/// Words the expression language reserves; they can never name a variable.
pub const KEYWORDS: &[&str] = &["true", "false", "and", "or", "not"];

/// An expression evaluator with an owned symbol table.
///
/// The caller owns exactly one of these and treats the table as scratch
/// state: [`Evaluator::reset`] then [`Evaluator::register`] for every
/// identifier, then [`Evaluator::evaluate`].
#[derive(Debug, Clone)]
pub struct Evaluator {
    symbols: HashMap<String, Value>,
    /// When true, an unregistered identifier resolves to [`Value::Unknown`]
    /// instead of raising an error.
    pub include_unknowns: bool,
    /// The value an `Unknown` stands in for once an operator touches it.
    pub unknown_default: Value,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self {
            symbols: HashMap::new(),
            include_unknowns: true,
            unknown_default: Value::Boolean(false),
        }
    }
}

impl Evaluator {
    /// Create an evaluator with the default flags.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every registered identifier.
    pub fn reset(&mut self) {
        self.symbols.clear();
    }

    /// Bind an identifier to a value for the next evaluation.
    pub fn register(&mut self, name: impl Into<String>, value: Value) {
        self.symbols.insert(name.into(), value);
    }

    /// Evaluate an expression against the current symbol table.
    pub fn evaluate(&self, source: &str) -> EvalResult<Value> {
        let tokens = lexer::lex(source)?;
        let ast = parser::parse(&tokens)?;
        self.eval_expr(&ast)
    }

    fn eval_expr(&self, expr: &Expr) -> EvalResult<Value> {
        match expr {
            Expr::Number(n) => Ok(Value::Decimal(*n)),
            Expr::Boolean(b) => Ok(Value::Boolean(*b)),
            Expr::Identifier(name) => match self.symbols.get(name) {
                Some(value) => Ok(value.clone()),
                None if self.include_unknowns => Ok(Value::Unknown),
                None => Err(EvalError::UnknownIdentifier(name.clone())),
            },
            Expr::Unary { op, operand } => {
                let value = self.settle(self.eval_expr(operand)?);
                self.apply_unary(*op, value)
            }
            Expr::Binary { op, lhs, rhs } => {
                let lhs = self.settle(self.eval_expr(lhs)?);
                let rhs = self.settle(self.eval_expr(rhs)?);
                self.apply_binary(*op, lhs, rhs)
            }
        }
    }

    /// Replace the `Unknown` sentinel with the configured default before an
    /// operator touches it.
    fn settle(&self, value: Value) -> Value {
        match value {
            Value::Unknown => self.unknown_default.clone(),
            other => other,
        }
    }

    fn apply_unary(&self, op: UnaryOp, value: Value) -> EvalResult<Value> {
        match (op, &value) {
            (UnaryOp::Neg, Value::Decimal(d)) => Ok(Value::Decimal(-d)),
            (UnaryOp::Not, Value::Boolean(b)) => Ok(Value::Boolean(!b)),
            _ => Err(EvalError::UnaryMismatch {
                op: op.symbol(),
                operand: value.to_string(),
            }),
        }
    }

    fn apply_binary(&self, op: BinaryOp, lhs: Value, rhs: Value) -> EvalResult<Value> {
        use BinaryOp::*;

        match (&lhs, &rhs) {
            (Value::Decimal(a), Value::Decimal(b)) => match op {
                Add => self.arithmetic(a.checked_add(*b)),
                Sub => self.arithmetic(a.checked_sub(*b)),
                Mul => self.arithmetic(a.checked_mul(*b)),
                Div => {
                    if b.is_zero() {
                        Err(EvalError::DivisionByZero)
                    } else {
                        self.arithmetic(a.checked_div(*b))
                    }
                }
                Eq => Ok(Value::Boolean(a == b)),
                Ne => Ok(Value::Boolean(a != b)),
                Lt => Ok(Value::Boolean(a < b)),
                Le => Ok(Value::Boolean(a <= b)),
                Gt => Ok(Value::Boolean(a > b)),
                Ge => Ok(Value::Boolean(a >= b)),
                And | Or => self.mismatch(op, lhs, rhs),
            },
            (Value::Boolean(a), Value::Boolean(b)) => match op {
                Eq => Ok(Value::Boolean(a == b)),
                Ne => Ok(Value::Boolean(a != b)),
                And => Ok(Value::Boolean(*a && *b)),
                Or => Ok(Value::Boolean(*a || *b)),
                _ => self.mismatch(op, lhs, rhs),
            },
            _ => self.mismatch(op, lhs, rhs),
        }
    }

    fn arithmetic(&self, result: Option<Decimal>) -> EvalResult<Value> {
        result.map(Value::Decimal).ok_or(EvalError::Overflow)
    }

    fn mismatch(&self, op: BinaryOp, lhs: Value, rhs: Value) -> EvalResult<Value> {
        Err(EvalError::TypeMismatch {
            op: op.symbol(),
            lhs: lhs.to_string(),
            rhs: rhs.to_string(),
        })
    }
}
