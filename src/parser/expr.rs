// Expression grammar shared by `format` rules and expression footers
//
// expression  := or ( "?" expression ":" expression )?
// or          := and ( "||" and )*
// and         := comparison ( "&&" comparison )*
// comparison  := concat ( ("==" | "!=" | "<=" | ">=" | "<" | ">") concat )?
// concat      := additive ( "~" additive )*
// additive    := term ( ("+" | "-") term )*
// term        := unary ( ("*" | "/" | "%") unary )*
// unary       := ("-" | "!") unary | primary
// primary     := number | "string" | 'column' | name ( "(" args ")" )? | "(" expression ")"

use super::ast::{BinaryOp, Expr, UnaryOp};
use super::lexer::{column_key, identifier, number_literal, string_literal, ws};
use crate::error::TableError;
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::char,
    combinator::{all_consuming, map, opt, value},
    error::{Error, ErrorKind},
    multi::{many0, separated_list0},
    sequence::{delimited, pair, preceded},
    IResult,
};

/// Longest accepted expression source, in bytes
pub const MAX_SOURCE_LEN: usize = 1024;

/// Deepest nesting of parentheses, unary operators, conditionals and call arguments
pub const MAX_NESTING: usize = 32;

/// Parse a complete expression, rejecting trailing input
pub fn parse_expression(input: &str) -> crate::Result<Expr> {
    if input.len() > MAX_SOURCE_LEN {
        return Err(TableError::expression(
            input,
            format!("expression is longer than {} bytes", MAX_SOURCE_LEN),
        ));
    }

    match all_consuming(ws(expression))(input) {
        Ok((_, expr)) => Ok(expr),
        Err(nom::Err::Failure(e)) if e.code == ErrorKind::TooLarge => Err(TableError::expression(
            input,
            format!("expression is nested deeper than {} levels", MAX_NESTING),
        )),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            let reason = if e.input.trim().is_empty() {
                "unexpected end of expression".to_string()
            } else {
                format!("cannot parse from {:?}", e.input)
            };
            Err(TableError::expression(input, reason))
        }
        Err(nom::Err::Incomplete(_)) => {
            Err(TableError::expression(input, "unexpected end of expression"))
        }
    }
}

pub fn expression(input: &str) -> IResult<&str, Expr> {
    nested(input, 0)
}

// Hard failure past MAX_NESTING; `alt` must not try other branches
fn check_depth(input: &str, depth: usize) -> IResult<&str, ()> {
    if depth > MAX_NESTING {
        return Err(nom::Err::Failure(Error::new(input, ErrorKind::TooLarge)));
    }
    Ok((input, ()))
}

fn nested(input: &str, depth: usize) -> IResult<&str, Expr> {
    let (input, _) = check_depth(input, depth)?;
    let (input, cond) = or_expr(input, depth)?;
    let (input, branches) = opt(pair(
        preceded(ws(char('?')), |i| nested(i, depth + 1)),
        preceded(ws(char(':')), |i| nested(i, depth + 1)),
    ))(input)?;

    Ok((
        input,
        match branches {
            Some((then, otherwise)) => {
                Expr::Conditional(Box::new(cond), Box::new(then), Box::new(otherwise))
            }
            None => cond,
        },
    ))
}

fn fold(first: Expr, rest: Vec<(BinaryOp, Expr)>) -> Expr {
    rest.into_iter().fold(first, |lhs, (op, rhs)| {
        Expr::Binary(op, Box::new(lhs), Box::new(rhs))
    })
}

fn or_expr(input: &str, depth: usize) -> IResult<&str, Expr> {
    let (input, first) = and_expr(input, depth)?;
    let (input, rest) = many0(pair(value(BinaryOp::Or, ws(tag("||"))), |i| {
        and_expr(i, depth)
    }))(input)?;
    Ok((input, fold(first, rest)))
}

fn and_expr(input: &str, depth: usize) -> IResult<&str, Expr> {
    let (input, first) = comparison(input, depth)?;
    let (input, rest) = many0(pair(value(BinaryOp::And, ws(tag("&&"))), |i| {
        comparison(i, depth)
    }))(input)?;
    Ok((input, fold(first, rest)))
}

fn comparison(input: &str, depth: usize) -> IResult<&str, Expr> {
    let (input, lhs) = concat_expr(input, depth)?;
    let (input, rhs) = opt(pair(
        ws(alt((
            value(BinaryOp::Eq, tag("==")),
            value(BinaryOp::Ne, tag("!=")),
            value(BinaryOp::Le, tag("<=")),
            value(BinaryOp::Ge, tag(">=")),
            value(BinaryOp::Lt, tag("<")),
            value(BinaryOp::Gt, tag(">")),
        ))),
        |i| concat_expr(i, depth),
    ))(input)?;

    Ok((
        input,
        match rhs {
            Some((op, rhs)) => Expr::Binary(op, Box::new(lhs), Box::new(rhs)),
            None => lhs,
        },
    ))
}

fn concat_expr(input: &str, depth: usize) -> IResult<&str, Expr> {
    let (input, first) = additive(input, depth)?;
    let (input, rest) = many0(pair(value(BinaryOp::Concat, ws(char('~'))), |i| {
        additive(i, depth)
    }))(input)?;
    Ok((input, fold(first, rest)))
}

fn additive(input: &str, depth: usize) -> IResult<&str, Expr> {
    let (input, first) = term(input, depth)?;
    let (input, rest) = many0(pair(
        ws(alt((
            value(BinaryOp::Add, char('+')),
            value(BinaryOp::Sub, char('-')),
        ))),
        |i| term(i, depth),
    ))(input)?;
    Ok((input, fold(first, rest)))
}

fn term(input: &str, depth: usize) -> IResult<&str, Expr> {
    let (input, first) = unary(input, depth)?;
    let (input, rest) = many0(pair(
        ws(alt((
            value(BinaryOp::Mul, char('*')),
            value(BinaryOp::Div, char('/')),
            value(BinaryOp::Rem, char('%')),
        ))),
        |i| unary(i, depth),
    ))(input)?;
    Ok((input, fold(first, rest)))
}

fn unary(input: &str, depth: usize) -> IResult<&str, Expr> {
    let (input, _) = check_depth(input, depth)?;
    alt((
        map(preceded(ws(char('-')), |i| unary(i, depth + 1)), |e| {
            Expr::Unary(UnaryOp::Neg, Box::new(e))
        }),
        map(preceded(ws(char('!')), |i| unary(i, depth + 1)), |e| {
            Expr::Unary(UnaryOp::Not, Box::new(e))
        }),
        |i| primary(i, depth),
    ))(input)
}

fn primary(input: &str, depth: usize) -> IResult<&str, Expr> {
    ws(alt((
        map(number_literal, Expr::Number),
        map(string_literal, Expr::Str),
        map(column_key, Expr::Column),
        |i| call_or_name(i, depth),
        delimited(char('('), |i| nested(i, depth + 1), ws(char(')'))),
    )))(input)
}

fn call_or_name(input: &str, depth: usize) -> IResult<&str, Expr> {
    let (input, name) = identifier(input)?;
    let (input, args) = opt(delimited(
        ws(char('(')),
        separated_list0(ws(char(',')), |i| nested(i, depth + 1)),
        ws(char(')')),
    ))(input)?;

    let expr = match args {
        Some(args) => Expr::Call(name, args),
        None => match name.as_str() {
            "true" => Expr::Bool(true),
            "false" => Expr::Bool(false),
            _ => Expr::Var(name),
        },
    };
    Ok((input, expr))
}
