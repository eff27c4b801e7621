//! Service-object member grammar.
//!
//! Members are tried against three shapes, first match wins:
//!
//! 1. `(tcp-udp|tcp|udp) [source <port>] [destination <port>]`
//! 2. `(icmp6|icmp) [<type> [<code>]]`
//! 3. any other single token, taken as a bare protocol

use nom::{
    branch::alt,
    character::complete::space1,
    combinator::{all_consuming, map, opt, recognize},
    sequence::{pair, preceded, tuple},
    IResult,
};
use serde::Serialize;

use super::{any_keyword, join_fields, keyword, port_clause, word};

/// Parsed form of one service-object member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ServiceObject {
    /// TCP and/or UDP with optional port clauses (without their direction keyword).
    TcpUdp {
        protocol: String,
        source: String,
        destination: String,
    },
    /// ICMP or ICMPv6 with an optional type and code.
    Icmp { protocol: String, type_code: String },
    /// Any other protocol, with no ports.
    Protocol { protocol: String },
}

impl ServiceObject {
    pub fn protocol(&self) -> &str {
        match self {
            ServiceObject::TcpUdp { protocol, .. }
            | ServiceObject::Icmp { protocol, .. }
            | ServiceObject::Protocol { protocol } => protocol,
        }
    }

    /// True when the member carries qualifiers that must be placed at fixed
    /// positions of an access-list entry rather than substituted in place.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            ServiceObject::TcpUdp { .. } | ServiceObject::Icmp { .. }
        )
    }
}

/// Parse a normalized service-object member.
///
/// Returns `None` for multi-token text that matches none of the shapes, such
/// as network members (`host 10.0.0.1`).
pub fn parse_service(member: &str) -> Option<ServiceObject> {
    all_consuming(alt((tcp_udp, icmp, bare_protocol)))(member.trim())
        .ok()
        .map(|(_, service)| service)
}

fn tcp_udp(input: &str) -> IResult<&str, ServiceObject> {
    let (input, protocol) = any_keyword(&["tcp-udp", "tcp", "udp"])(input)?;
    let (input, source) = opt(preceded(
        tuple((space1, keyword("source"), space1)),
        port_clause,
    ))(input)?;
    // A port clause without a direction keyword is the legacy destination form.
    let (input, destination) = opt(preceded(
        space1,
        alt((
            preceded(pair(keyword("destination"), space1), port_clause),
            port_clause,
        )),
    ))(input)?;

    Ok((
        input,
        ServiceObject::TcpUdp {
            protocol: protocol.to_string(),
            source: join_fields(source),
            destination: join_fields(destination),
        },
    ))
}

fn icmp(input: &str) -> IResult<&str, ServiceObject> {
    let (input, protocol) = any_keyword(&["icmp6", "icmp"])(input)?;
    let (input, type_code) = opt(preceded(
        space1,
        recognize(pair(word, opt(preceded(space1, word)))),
    ))(input)?;

    Ok((
        input,
        ServiceObject::Icmp {
            protocol: protocol.to_string(),
            type_code: join_fields(type_code),
        },
    ))
}

fn bare_protocol(input: &str) -> IResult<&str, ServiceObject> {
    map(word, |token: &str| ServiceObject::Protocol {
        protocol: token.to_string(),
    })(input)
}
