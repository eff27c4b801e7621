//! Recursive access-list expansion.
//!
//! An access-list entry that mentions `object <name>` or `object-group <name>`
//! stands for one entry per member of that object. The expander resolves the
//! leftmost reference, member by member, and recurses on every candidate until
//! no reference is left. Leaves are emitted depth-first with a leading space.
//!
//! Most members are substituted in place. Service members that carry port or
//! ICMP qualifiers (`tcp destination eq 80`, `icmp echo`) cannot be pasted
//! into the protocol slot; for those the entry is parsed and rebuilt with the
//! qualifiers moved to their grammatical positions. `tcp-udp` members produce
//! a `tcp` branch followed by a `udp` branch.

use asa_config_core::catalog::DEFAULT_MAX_DEPTH;
use asa_config_core::{
    join_fields, parse_ace, parse_service, AccessListEntry, Catalog, ObjectRef, RefKind,
    ServiceObject,
};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpandError {
    #[error("reference to undefined object '{0}'")]
    UnknownObject(String),
    #[error("expansion of '{name}' exceeded {depth} nested references (cyclic object-group?)")]
    DepthExceeded { name: String, depth: usize },
}

/// A reference located in a line, with the index of its keyword token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Located<'a> {
    pub reference: ObjectRef<'a>,
    pub token: usize,
}

/// Index of the first token that may hold a reference. The name of an
/// access-list is free text, so `access-list object extended ...` is valid.
fn scan_start(tokens: &[&str]) -> usize {
    if tokens.first() == Some(&"access-list") {
        2
    } else {
        0
    }
}

/// Find the leftmost `object <name>` / `object-group <name>` token pair.
pub fn find_reference(line: &str) -> Option<Located<'_>> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let start = scan_start(&tokens);
    tokens
        .get(start..)?
        .windows(2)
        .enumerate()
        .find_map(|(idx, pair)| {
            RefKind::from_keyword(pair[0]).map(|kind| Located {
                reference: ObjectRef {
                    kind,
                    name: pair[1],
                },
                token: start + idx,
            })
        })
}

/// Every reference in a line, left to right.
pub fn find_references(line: &str) -> Vec<ObjectRef<'_>> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let start = scan_start(&tokens).min(tokens.len());
    tokens[start..]
        .windows(2)
        .filter_map(|pair| {
            RefKind::from_keyword(pair[0]).map(|kind| ObjectRef {
                kind,
                name: pair[1],
            })
        })
        .collect()
}

/// True when `member` brings a reference of its own into the line, i.e. one
/// more level of group nesting.
fn nests(member: &str) -> bool {
    member
        .split_whitespace()
        .any(|token| RefKind::from_keyword(token).is_some())
}

/// Replace the located reference with `member`, single-spacing the result.
fn substitute(line: &str, at: &Located<'_>, member: &str) -> String {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    join_fields(
        tokens[..at.token]
            .iter()
            .copied()
            .chain(std::iter::once(member))
            .chain(tokens[at.token + 2..].iter().copied()),
    )
}

/// The ACE field holding the reference being resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Protocol,
    Ports,
}

fn slot_of(entry: &AccessListEntry, reference: &str) -> Option<Slot> {
    if entry.proto == reference {
        Some(Slot::Protocol)
    } else if entry.ports == reference {
        Some(Slot::Ports)
    } else {
        None
    }
}

/// Expands access-list entries against a read-only catalog.
#[derive(Debug, Clone, Copy)]
pub struct Expander<'a> {
    catalog: &'a Catalog,
    max_depth: usize,
}

impl<'a> Expander<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Expand one line into the concrete lines it denotes.
    pub fn expand(&self, line: &str) -> Result<Vec<String>, ExpandError> {
        let mut out = Vec::new();
        self.expand_into(line, 0, &mut out)?;
        Ok(out)
    }

    fn expand_into(
        &self,
        line: &str,
        depth: usize,
        out: &mut Vec<String>,
    ) -> Result<(), ExpandError> {
        let Some(at) = find_reference(line) else {
            out.push(format!(" {line}"));
            return Ok(());
        };
        let name = at.reference.name;
        if depth >= self.max_depth {
            return Err(ExpandError::DepthExceeded {
                name: name.to_string(),
                depth: self.max_depth,
            });
        }
        let members = self
            .catalog
            .members(name)
            .ok_or_else(|| ExpandError::UnknownObject(name.to_string()))?;
        debug!(depth, reference = %at.reference, members = members.len(), "expanding reference");

        for member in members {
            match parse_service(member).filter(ServiceObject::is_structural) {
                Some(service) => {
                    self.expand_structural(line, &at, &service, member, depth, out)?
                }
                None => {
                    let next = if nests(member) { depth + 1 } else { depth };
                    self.expand_into(&substitute(line, &at, member), next, out)?
                }
            }
        }
        Ok(())
    }

    fn expand_structural(
        &self,
        line: &str,
        at: &Located<'_>,
        service: &ServiceObject,
        member: &str,
        depth: usize,
        out: &mut Vec<String>,
    ) -> Result<(), ExpandError> {
        let reference = at.reference.to_string();
        let parsed = parse_ace(line)
            .and_then(|entry| slot_of(&entry, &reference).map(|slot| (entry, slot)));
        let Some((entry, slot)) = parsed else {
            warn!(
                %line,
                %member,
                "service member outside a protocol or port field; substituting in place"
            );
            return self.expand_into(&substitute(line, at, member), depth, out);
        };

        let protocols: Vec<&str> = match service.protocol() {
            "tcp-udp" => vec!["tcp", "udp"],
            other => vec![other],
        };
        for protocol in protocols {
            let candidate = rebuild(&entry, slot, protocol, service);
            self.expand_into(&candidate, depth, out)?;
        }
        Ok(())
    }
}

/// Rebuild `entry` with `protocol` and the service qualifiers in place of the
/// reference held in `slot`.
fn rebuild(
    entry: &AccessListEntry,
    slot: Slot,
    protocol: &str,
    service: &ServiceObject,
) -> String {
    let mut next = entry.clone();
    if slot == Slot::Ports {
        next.ports.clear();
    }
    let (source, destination) = match service {
        ServiceObject::TcpUdp {
            source,
            destination,
            ..
        } => (source.as_str(), destination.as_str()),
        ServiceObject::Icmp { type_code, .. } => ("", type_code.as_str()),
        ServiceObject::Protocol { .. } => ("", ""),
    };
    next.proto = protocol.to_string();
    next.source_ports = join_fields([source, entry.source_ports.as_str()]);
    next.ports = join_fields([destination, next.ports.as_str()]);
    next.render()
}

#[cfg(test)]
mod tests {
    use asa_config_core::Catalog;
    use pretty_assertions::assert_eq;

    use super::{find_reference, find_references, ExpandError, Expander};

    fn catalog(entries: Vec<(&str, Vec<&str>)>) -> Catalog {
        let mut catalog = Catalog::new();
        for (name, members) in entries {
            catalog.declare(name, "object-group");
            for member in members {
                catalog.push_member(name, member);
            }
        }
        catalog
    }

    #[test]
    fn line_without_reference_is_terminal() {
        let catalog = Catalog::new();
        let out = Expander::new(&catalog)
            .expand("access-list OUT extended permit tcp any any eq 22")
            .expect("expand");
        assert_eq!(out, vec![" access-list OUT extended permit tcp any any eq 22"]);
    }

    #[test]
    fn finds_leftmost_reference_only() {
        let at = find_reference("access-list A extended permit ip object-group SRC object DST")
            .expect("reference");
        assert_eq!(at.reference.name, "SRC");
        assert_eq!(at.token, 5);
        let user_only = "access-list A extended permit ip object-group-user U any any";
        assert!(find_reference(user_only).is_none());
    }

    #[test]
    fn service_group_members_are_restructured() {
        let catalog = catalog(vec![(
            "WEBSVC",
            vec!["tcp destination eq 80", "tcp destination eq 443"],
        )]);
        let out = Expander::new(&catalog)
            .expand("access-list OUT extended permit object-group WEBSVC any any")
            .expect("expand");
        assert_eq!(
            out,
            vec![
                " access-list OUT extended permit tcp any any eq 80",
                " access-list OUT extended permit tcp any any eq 443",
            ]
        );
    }

    #[test]
    fn tcp_udp_member_yields_two_branches() {
        let catalog = catalog(vec![("SRV", vec!["tcp-udp destination eq 53"])]);
        let out = Expander::new(&catalog)
            .expand("access-list A extended permit object SRV any any")
            .expect("expand");
        assert_eq!(
            out,
            vec![
                " access-list A extended permit tcp any any eq 53",
                " access-list A extended permit udp any any eq 53",
            ]
        );
    }

    #[test]
    fn source_ports_and_icmp_types_land_in_their_slots() {
        let catalog = catalog(vec![
            ("MIXED", vec!["udp source eq 123 destination eq 123", "icmp echo-reply"]),
            ("NETS", vec!["10.0.0.0 255.0.0.0"]),
        ]);
        let out = Expander::new(&catalog)
            .expand("access-list A extended permit object-group MIXED object-group NETS any log")
            .expect("expand");
        assert_eq!(
            out,
            vec![
                " access-list A extended permit udp 10.0.0.0 255.0.0.0 eq 123 any eq 123 log",
                " access-list A extended permit icmp 10.0.0.0 255.0.0.0 any echo-reply log",
            ]
        );
    }

    #[test]
    fn port_group_in_destination_port_slot() {
        let catalog = catalog(vec![
            ("PORTS", vec!["eq 80", "range 8000 8080"]),
            ("SVC", vec!["tcp destination eq 443"]),
        ]);
        let expander = Expander::new(&catalog);
        let out = expander
            .expand("access-list A extended permit tcp any host 10.0.0.1 object-group PORTS")
            .expect("expand");
        assert_eq!(
            out,
            vec![
                " access-list A extended permit tcp any host 10.0.0.1 eq 80",
                " access-list A extended permit tcp any host 10.0.0.1 range 8000 8080",
            ]
        );
        let out = expander
            .expand("access-list A extended permit tcp any any object-group SVC")
            .expect("expand");
        assert_eq!(out, vec![" access-list A extended permit tcp any any eq 443"]);
    }

    #[test]
    fn fan_out_matches_member_count() {
        let catalog = catalog(vec![(
            "HOSTS",
            vec!["host 10.0.0.1", "host 10.0.0.2", "host 10.0.0.3", "10.1.0.0 255.255.0.0"],
        )]);
        let out = Expander::new(&catalog)
            .expand("access-list A extended deny ip object-group HOSTS any")
            .expect("expand");
        assert_eq!(out.len(), 4);
        assert!(out.iter().all(|line| !line.contains("object-group HOSTS")));
    }

    #[test]
    fn nested_groups_resolve_in_one_more_step() {
        let catalog = catalog(vec![
            ("G1", vec!["object-group G2"]),
            ("G2", vec!["10.0.0.0 255.0.0.0"]),
        ]);
        let out = Expander::new(&catalog)
            .expand("access-list A extended permit ip object-group G1 any")
            .expect("expand");
        assert_eq!(out, vec![" access-list A extended permit ip 10.0.0.0 255.0.0.0 any"]);
    }

    #[test]
    fn repeated_group_expands_as_cross_product() {
        let catalog = catalog(vec![("N", vec!["host 10.0.0.1", "host 10.0.0.2"])]);
        let out = Expander::new(&catalog)
            .expand("access-list A extended permit ip object-group N object-group N")
            .expect("expand");
        assert_eq!(out.len(), 4);
        assert_eq!(out[1], " access-list A extended permit ip host 10.0.0.1 host 10.0.0.2");
    }

    #[test]
    fn access_list_named_like_a_keyword_is_not_a_reference() {
        let catalog = catalog(vec![("N", vec!["host 10.0.0.1"])]);
        let line = "access-list object extended permit ip object-group N any";
        let at = find_reference(line).expect("reference");
        assert_eq!(at.reference.name, "N");
        assert_eq!(at.token, 5);
        assert_eq!(find_references(line).len(), 1);

        let out = Expander::new(&catalog).expand(line).expect("expand");
        assert_eq!(out, vec![" access-list object extended permit ip host 10.0.0.1 any"]);

        let out = Expander::new(&catalog)
            .expand("access-list object-group extended permit ip any any")
            .expect("expand");
        assert_eq!(out, vec![" access-list object-group extended permit ip any any"]);
    }

    #[test]
    fn sibling_references_do_not_count_as_nesting() {
        let catalog = catalog(vec![
            ("A", vec!["host 10.0.0.1"]),
            ("B", vec!["host 10.0.0.2"]),
            ("P", vec!["eq 22", "eq 443"]),
            ("LOOP_A", vec!["object-group LOOP_B"]),
            ("LOOP_B", vec!["object-group LOOP_A"]),
        ]);
        let expander = Expander::new(&catalog).with_max_depth(2);
        let out = expander
            .expand("access-list X extended permit tcp object-group A object-group B object-group P")
            .expect("expand");
        assert_eq!(
            out,
            vec![
                " access-list X extended permit tcp host 10.0.0.1 host 10.0.0.2 eq 22",
                " access-list X extended permit tcp host 10.0.0.1 host 10.0.0.2 eq 443",
            ]
        );

        let err = expander
            .expand("access-list X extended permit ip object-group LOOP_A any")
            .expect_err("cycle");
        assert!(matches!(err, ExpandError::DepthExceeded { depth: 2, .. }));
    }

    #[test]
    fn nesting_deeper_than_the_limit_fails() {
        let catalog = catalog(vec![
            ("G1", vec!["object-group G2"]),
            ("G2", vec!["object-group G3"]),
            ("G3", vec!["host 10.0.0.1"]),
        ]);
        let line = "access-list X extended permit ip object-group G1 any";
        assert!(Expander::new(&catalog).with_max_depth(3).expand(line).is_ok());
        let err = Expander::new(&catalog)
            .with_max_depth(2)
            .expand(line)
            .expect_err("too deep");
        assert_eq!(
            err,
            ExpandError::DepthExceeded {
                name: "G3".to_string(),
                depth: 2,
            }
        );
    }

    #[test]
    fn unparsed_entry_falls_back_to_textual_substitution() {
        let catalog = catalog(vec![("S", vec!["tcp destination eq 80"])]);
        let out = Expander::new(&catalog)
            .expand("access-list A extended permit object-group S any")
            .expect("expand");
        assert_eq!(out, vec![" access-list A extended permit tcp destination eq 80 any"]);
    }

    #[test]
    fn unknown_reference_is_an_error() {
        let catalog = Catalog::new();
        let err = Expander::new(&catalog)
            .expand("access-list A extended permit ip object-group NOPE any")
            .expect_err("unknown");
        assert_eq!(err, ExpandError::UnknownObject("NOPE".to_string()));
    }

    #[test]
    fn cycles_hit_the_depth_guard() {
        let catalog = catalog(vec![
            ("A", vec!["object-group B"]),
            ("B", vec!["object-group A"]),
        ]);
        let err = Expander::new(&catalog)
            .with_max_depth(16)
            .expand("access-list X extended permit ip object-group A any")
            .expect_err("cycle");
        assert!(matches!(err, ExpandError::DepthExceeded { depth: 16, .. }));
    }
}
