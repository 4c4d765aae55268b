use std::fmt;
use std::str::FromStr;

use logos::Logos;
use rust_decimal::Decimal;

use crate::error::EvalError;

/// Token type for the expression language.
///
/// The lexer stays simple — the word operators `and`, `or`, `not` and the
/// literals `true`/`false` all lex as `Token::Word` and are recognized by
/// the parser, the same way multi-word keywords are handled in the file
/// format.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Left parenthesis `(`.
    LParen,
    /// Right parenthesis `)`.
    RParen,
    /// Addition `+`.
    Plus,
    /// Subtraction or negation `-`.
    Minus,
    /// Multiplication `*`.
    Star,
    /// Division `/`.
    Slash,
    /// Comparison `=` (assignment is split off before the lexer runs).
    Eq,
    /// Comparison `!=`.
    Ne,
    /// Comparison `<`.
    Lt,
    /// Comparison `<=`.
    Le,
    /// Comparison `>`.
    Gt,
    /// Comparison `>=`.
    Ge,
    /// Decimal literal. Stores the parsed value and the source text.
    Number(Decimal, String),
    /// Bare word (identifier or keyword, disambiguated by the parser).
    Word(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Eq => write!(f, "="),
            Token::Ne => write!(f, "!="),
            Token::Lt => write!(f, "<"),
            Token::Le => write!(f, "<="),
            Token::Gt => write!(f, ">"),
            Token::Ge => write!(f, ">="),
            Token::Number(_, s) => write!(f, "{s}"),
            Token::Word(w) => write!(f, "{w}"),
        }
    }
}

/// Internal logos token — borrows from source, converted to owned `Token`.
#[derive(Logos, Debug)]
#[logos(skip r"[ \t\r\n]+")]
enum RawToken {
    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("!=")]
    Ne,

    #[token("<=")]
    Le,

    #[token(">=")]
    Ge,

    #[token("=")]
    Eq,

    #[token("<")]
    Lt,

    #[token(">")]
    Gt,

    #[regex(r"[0-9]+(\.[0-9]+)?")]
    Number,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Word,
}

/// Lex an expression into `(Token, Span)` pairs.
///
/// Stops at the first lexer fault; unlike a source file, a one-line
/// expression has nothing useful to recover to.
pub fn lex(source: &str) -> Result<Vec<(Token, std::ops::Range<usize>)>, EvalError> {
    let mut tokens = Vec::new();
    let mut lexer = RawToken::lexer(source);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let token = match result {
            Ok(RawToken::LParen) => Token::LParen,
            Ok(RawToken::RParen) => Token::RParen,
            Ok(RawToken::Plus) => Token::Plus,
            Ok(RawToken::Minus) => Token::Minus,
            Ok(RawToken::Star) => Token::Star,
            Ok(RawToken::Slash) => Token::Slash,
            Ok(RawToken::Eq) => Token::Eq,
            Ok(RawToken::Ne) => Token::Ne,
            Ok(RawToken::Lt) => Token::Lt,
            Ok(RawToken::Le) => Token::Le,
            Ok(RawToken::Gt) => Token::Gt,
            Ok(RawToken::Ge) => Token::Ge,
            Ok(RawToken::Number) => {
                let raw = lexer.slice().to_string();
                match Decimal::from_str(&raw) {
                    Ok(n) => Token::Number(n, raw),
                    Err(_) => {
                        return Err(EvalError::Parse {
                            message: format!("invalid number literal: {raw}"),
                            span,
                        });
                    }
                }
            }
            Ok(RawToken::Word) => Token::Word(lexer.slice().to_string()),
            Err(()) => {
                return Err(EvalError::Parse {
                    message: format!("unexpected character: {:?}", &source[span.clone()]),
                    span,
                });
            }
        };
        tokens.push((token, span));
    }

    Ok(tokens)
}
