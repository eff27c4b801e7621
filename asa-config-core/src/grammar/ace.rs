//! Extended access-list entry grammar.
//!
//! ```text
//! access-list <name> extended (permit|deny) <proto> [<user>] [<security>]
//!     <source> [<source ports>] [<security>] <destination> [<ports>] [<options>]
//! ```
//!
//! Every optional field that is absent parses to an empty string, so a record
//! can always be rendered back positionally.

use std::net::{Ipv4Addr, Ipv6Addr};

use nom::{
    branch::alt,
    character::complete::space1,
    combinator::{all_consuming, opt, recognize, rest, verify},
    sequence::{preceded, tuple},
    IResult,
};
use serde::Serialize;

use super::{any_keyword, join_fields, keyword, object_ref, port_clause, word};

/// Structural fields of one `access-list ... extended ...` command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AccessListEntry {
    pub name: String,
    pub action: String,
    pub proto: String,
    pub user: String,
    pub source_security_group: String,
    pub source: String,
    pub source_ports: String,
    pub dest_security_group: String,
    pub destination: String,
    pub ports: String,
    pub options: String,
}

impl AccessListEntry {
    /// Render the entry as a single-spaced command line. Empty fields
    /// contribute nothing.
    pub fn render(&self) -> String {
        join_fields([
            "access-list",
            self.name.as_str(),
            "extended",
            self.action.as_str(),
            self.proto.as_str(),
            self.user.as_str(),
            self.source_security_group.as_str(),
            self.source.as_str(),
            self.source_ports.as_str(),
            self.dest_security_group.as_str(),
            self.destination.as_str(),
            self.ports.as_str(),
            self.options.as_str(),
        ])
    }
}

/// Parse an extended access-list command.
///
/// Returns `None` when the line does not follow the extended grammar
/// (standard, webtype and remark entries included).
pub fn parse_ace(line: &str) -> Option<AccessListEntry> {
    all_consuming(access_list)(line.trim())
        .ok()
        .map(|(_, entry)| entry)
}

fn access_list(input: &str) -> IResult<&str, AccessListEntry> {
    let (input, _) = keyword("access-list")(input)?;
    let (input, name) = preceded(space1, word)(input)?;
    let (input, _) = preceded(space1, keyword("extended"))(input)?;
    let (input, action) = preceded(space1, any_keyword(&["permit", "deny"]))(input)?;
    let (input, proto) = preceded(space1, protocol)(input)?;
    let (input, user) = opt(preceded(space1, user_clause))(input)?;
    let (input, source_security_group) = opt(preceded(space1, security_clause))(input)?;
    let (input, source) = preceded(space1, network)(input)?;
    let (input, source_ports) = opt(preceded(space1, port_clause))(input)?;
    let (input, dest_security_group) = opt(preceded(space1, security_clause))(input)?;
    let (input, destination) = preceded(space1, network)(input)?;
    let (input, ports) = opt(preceded(space1, alt((port_clause, object_ref))))(input)?;
    let (input, options) = opt(preceded(space1, rest))(input)?;

    Ok((
        input,
        AccessListEntry {
            name: name.to_string(),
            action: action.to_string(),
            proto: field(Some(proto)),
            user: field(user),
            source_security_group: field(source_security_group),
            source: field(Some(source)),
            source_ports: field(source_ports),
            dest_security_group: field(dest_security_group),
            destination: field(Some(destination)),
            ports: field(ports),
            options: field(options),
        },
    ))
}

fn field(raw: Option<&str>) -> String {
    join_fields(raw)
}

fn protocol(input: &str) -> IResult<&str, &str> {
    alt((object_ref, word))(input)
}

/// `object-group-user <name>`, `user <who>` or `user-group <who>`.
fn user_clause(input: &str) -> IResult<&str, &str> {
    alt((
        recognize(tuple((keyword("object-group-user"), space1, word))),
        recognize(tuple((any_keyword(&["user", "user-group"]), space1, word))),
    ))(input)
}

/// `object-group-security <name>` or `security-group (name|tag) <value>`.
fn security_clause(input: &str) -> IResult<&str, &str> {
    alt((
        recognize(tuple((keyword("object-group-security"), space1, word))),
        recognize(tuple((
            keyword("security-group"),
            space1,
            any_keyword(&["name", "tag"]),
            space1,
            word,
        ))),
    ))(input)
}

fn network(input: &str) -> IResult<&str, &str> {
    alt((
        recognize(tuple((keyword("host"), space1, word))),
        recognize(tuple((ipv4, space1, ipv4))),
        ipv6,
        any_keyword(&["any", "any4", "any6"]),
        object_ref,
        recognize(tuple((keyword("interface"), space1, word))),
    ))(input)
}

fn ipv4(input: &str) -> IResult<&str, &str> {
    verify(word, |token: &str| token.parse::<Ipv4Addr>().is_ok())(input)
}

fn ipv6(input: &str) -> IResult<&str, &str> {
    verify(word, is_ipv6_literal)(input)
}

fn is_ipv6_literal(token: &str) -> bool {
    let (addr, prefix) = match token.split_once('/') {
        Some((addr, prefix)) => (addr, Some(prefix)),
        None => (token, None),
    };
    if addr.parse::<Ipv6Addr>().is_err() {
        return false;
    }
    match prefix {
        Some(len) => len.parse::<u8>().is_ok_and(|len| len <= 128),
        None => true,
    }
}
