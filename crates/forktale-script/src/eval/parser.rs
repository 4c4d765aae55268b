use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::error::EvalError;
use crate::eval::ast::{BinaryOp, Expr, UnaryOp};
use crate::eval::lexer::Token;

type Span = SimpleSpan;

/// Build the expression parser.
///
/// Precedence, loosest first: `or`, `and`, `not`, comparison, `+ -`, `* /`,
/// unary minus. Comparison does not chain.
fn expr_parser<'a, I>() -> impl Parser<'a, I, Expr, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = Span>,
{
    let kw = |k: &'static str| select! { Token::Word(ref w) if w.as_str() == k => () }.labelled(k);

    recursive(|expr| {
        let atom = choice((
            select! { Token::Number(n, _) => Expr::Number(n) },
            kw("true").to(Expr::Boolean(true)),
            kw("false").to(Expr::Boolean(false)),
            select! { Token::Word(w) => Expr::Identifier(w) },
            expr.delimited_by(just(Token::LParen), just(Token::RParen)),
        ))
        .labelled("value");

        let negated = just(Token::Minus)
            .to(UnaryOp::Neg)
            .repeated()
            .foldr(atom, |op, operand| Expr::Unary {
                op,
                operand: Box::new(operand),
            });

        let product = negated.clone().foldl(
            choice((
                just(Token::Star).to(BinaryOp::Mul),
                just(Token::Slash).to(BinaryOp::Div),
            ))
            .then(negated)
            .repeated(),
            |lhs, (op, rhs)| Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
        );

        let sum = product.clone().foldl(
            choice((
                just(Token::Plus).to(BinaryOp::Add),
                just(Token::Minus).to(BinaryOp::Sub),
            ))
            .then(product)
            .repeated(),
            |lhs, (op, rhs)| Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
        );

        let comparison = sum
            .clone()
            .then(
                choice((
                    just(Token::Eq).to(BinaryOp::Eq),
                    just(Token::Ne).to(BinaryOp::Ne),
                    just(Token::Le).to(BinaryOp::Le),
                    just(Token::Lt).to(BinaryOp::Lt),
                    just(Token::Ge).to(BinaryOp::Ge),
                    just(Token::Gt).to(BinaryOp::Gt),
                ))
                .then(sum)
                .or_not(),
            )
            .map(|(lhs, rest)| match rest {
                Some((op, rhs)) => Expr::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                None => lhs,
            });

        let negation = kw("not")
            .to(UnaryOp::Not)
            .repeated()
            .foldr(comparison, |op, operand| Expr::Unary {
                op,
                operand: Box::new(operand),
            });

        let conjunction = negation.clone().foldl(
            kw("and").to(BinaryOp::And).then(negation).repeated(),
            |lhs, (op, rhs)| Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
        );

        conjunction.clone().foldl(
            kw("or").to(BinaryOp::Or).then(conjunction).repeated(),
            |lhs, (op, rhs)| Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
        )
    })
}

/// Parse a lexed token stream into an expression tree.
pub fn parse(tokens: &[(Token, std::ops::Range<usize>)]) -> Result<Expr, EvalError> {
    let token_iter = tokens
        .iter()
        .map(|(tok, span)| (tok.clone(), Span::from(span.clone())));

    let len = tokens.last().map_or(0, |(_, s)| s.end);
    let eoi: Span = (len..len).into();
    let stream = Stream::from_iter(token_iter).map(eoi, |(t, s): (_, _)| (t, s));

    let (output, errors) = expr_parser().parse(stream).into_output_errors();

    if let Some(ast) = output
        && errors.is_empty()
    {
        return Ok(ast);
    }

    let first = errors.into_iter().next();
    Err(match first {
        Some(e) => EvalError::Parse {
            span: e.span().into_range(),
            message: e.to_string(),
        },
        None => EvalError::Parse {
            span: 0..0,
            message: "empty expression".to_string(),
        },
    })
}
