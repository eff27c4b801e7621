//! Token-level grammars for access-list entries and service-object members.
//!
//! Both grammars work on whitespace-separated tokens. Keywords are matched as
//! whole tokens so that `any` never matches the front of `any4`, and
//! `object-group` never matches the front of `object-group-user`.

use nom::{
    branch::alt,
    bytes::complete::take_while1,
    character::complete::space1,
    combinator::{recognize, verify},
    sequence::tuple,
    IResult,
};

pub mod ace;
pub mod service;

pub use ace::{parse_ace, AccessListEntry};
pub use service::{parse_service, ServiceObject};

/// Port comparison operators taking a single value.
const PORT_OPERATORS: &[&str] = &["eq", "gt", "lt", "neq"];

/// Join non-empty fields with single spaces, collapsing any whitespace runs
/// inside the fields themselves.
pub fn join_fields<'a, I>(fields: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    fields
        .into_iter()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// One whitespace-delimited token.
pub(crate) fn word(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| !c.is_whitespace())(input)
}

/// A token equal to `kw`.
pub(crate) fn keyword<'a>(kw: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    verify(word, move |token: &str| token == kw)
}

/// A token equal to any of `kws`.
pub(crate) fn any_keyword<'a>(
    kws: &'static [&'static str],
) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    verify(word, move |token: &str| kws.contains(&token))
}

/// `(eq|gt|lt|neq) <port>` or `range <low> <high>`.
pub(crate) fn port_clause(input: &str) -> IResult<&str, &str> {
    alt((
        recognize(tuple((any_keyword(PORT_OPERATORS), space1, word))),
        recognize(tuple((keyword("range"), space1, word, space1, word))),
    ))(input)
}

/// `object <name>` or `object-group <name>`.
pub(crate) fn object_ref(input: &str) -> IResult<&str, &str> {
    recognize(tuple((
        any_keyword(&["object", "object-group"]),
        space1,
        word,
    )))(input)
}
