//! Minimal logic expressions for filters and conditions.
//!
//! Supports what the in-memory store needs and nothing more:
//!
//! ```text
//! [field] = 'value'
//! [a] <> "x" and ([b] = '1' or [c] != '')
//! true
//! ```
//!
//! `and` binds tighter than `or`. A field missing from the row compares as
//! the empty string.

use nom::IResult;
use nom::branch::alt;
use nom::bytes::complete::{is_not, tag, tag_no_case, take_while, take_while1};
use nom::character::complete::{char as pchar, multispace0, satisfy};
use nom::combinator::{all_consuming, map, map_opt, not, peek, value, verify};
use nom::multi::separated_list1;
use nom::sequence::{delimited, terminated, tuple};
use repeatkit_core::FieldMap;

use crate::error::StoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Logic {
    Literal(bool),
    Compare {
        field: String,
        op: CompareOp,
        value: String,
    },
    And(Box<Logic>, Box<Logic>),
    Or(Box<Logic>, Box<Logic>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
}

impl Logic {
    pub fn parse(expression: &str) -> Result<Self, StoreError> {
        all_consuming(or_expr)(expression)
            .map(|(_, logic)| logic)
            .map_err(|e| StoreError::Logic(format!("cannot parse {expression:?}: {e}")))
    }

    pub fn evaluate(&self, row: &FieldMap) -> bool {
        match self {
            Logic::Literal(b) => *b,
            Logic::Compare { field, op, value } => {
                let actual = row.get(field).map(String::as_str).unwrap_or("");
                match op {
                    CompareOp::Eq => actual == value,
                    CompareOp::Ne => actual != value,
                }
            }
            Logic::And(a, b) => a.evaluate(row) && b.evaluate(row),
            Logic::Or(a, b) => a.evaluate(row) || b.evaluate(row),
        }
    }
}

type Res<'a, T> = IResult<&'a str, T>;

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '.' | '-')
}

fn ws<'a, T, F>(inner: F) -> impl FnMut(&'a str) -> Res<'a, T>
where
    F: FnMut(&'a str) -> Res<'a, T>,
{
    delimited(multispace0, inner, multispace0)
}

/// `and` / `or`, case-insensitive, not followed by more word characters.
fn keyword<'a>(word: &'static str) -> impl FnMut(&'a str) -> Res<'a, &'a str> {
    ws(terminated(tag_no_case(word), not(peek(satisfy(is_word_char)))))
}

fn or_expr(input: &str) -> Res<'_, Logic> {
    map_opt(separated_list1(keyword("or"), and_expr), |terms| {
        terms
            .into_iter()
            .reduce(|a, b| Logic::Or(Box::new(a), Box::new(b)))
    })(input)
}

fn and_expr(input: &str) -> Res<'_, Logic> {
    map_opt(separated_list1(keyword("and"), term), |terms| {
        terms
            .into_iter()
            .reduce(|a, b| Logic::And(Box::new(a), Box::new(b)))
    })(input)
}

fn term(input: &str) -> Res<'_, Logic> {
    ws(alt((
        delimited(pchar('('), or_expr, pchar(')')),
        comparison,
        literal,
    )))(input)
}

fn comparison(input: &str) -> Res<'_, Logic> {
    map(
        tuple((field, ws(compare_op), text)),
        |(field, op, value)| Logic::Compare { field, op, value },
    )(input)
}

fn field(input: &str) -> Res<'_, String> {
    map(
        verify(
            delimited(pchar('['), is_not("]"), pchar(']')),
            |name: &str| !name.trim().is_empty(),
        ),
        |name: &str| name.trim().to_string(),
    )(input)
}

fn compare_op(input: &str) -> Res<'_, CompareOp> {
    alt((
        value(CompareOp::Eq, pchar('=')),
        value(CompareOp::Ne, tag("<>")),
        value(CompareOp::Ne, tag("!=")),
    ))(input)
}

/// Quoted with either quote character, or a bare word such as `1`.
fn text(input: &str) -> Res<'_, String> {
    map(
        alt((
            delimited(pchar('\''), take_while(|c: char| c != '\''), pchar('\'')),
            delimited(pchar('"'), take_while(|c: char| c != '"'), pchar('"')),
            take_while1(is_word_char),
        )),
        str::to_string,
    )(input)
}

fn literal(input: &str) -> Res<'_, Logic> {
    map_opt(take_while1(is_word_char), |word: &str| {
        if word.eq_ignore_ascii_case("true") {
            Some(Logic::Literal(true))
        } else if word.eq_ignore_ascii_case("false") {
            Some(Logic::Literal(false))
        } else {
            None
        }
    })(input)
}
