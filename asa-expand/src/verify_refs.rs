//! Object reference validation.
//!
//! Checks a configuration for reference problems that would stop or distort
//! expansion, without expanding anything:
//!
//! - **Missing objects**: access-lists or object-group members naming an
//!   undefined object
//! - **Cycles**: object-groups that reach themselves through `group-object`
//! - **Unused objects**: definitions nothing else in the document mentions
//! - **Unparsed entries**: extended access-lists with references that the
//!   access-list grammar cannot read, so service members will be pasted in
//!   place instead of restructured

use std::collections::{BTreeMap, BTreeSet};

use asa_config_core::{parse_ace, reference_of, Catalog, ConfigLine};
use serde::Serialize;

use crate::builder::{build_catalog, object_header, BuildError, BuildOptions};
use crate::expand::find_references;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingSeverity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifyFinding {
    pub severity: FindingSeverity,
    pub code: String,
    pub message: String,
}

/// Find all reference problems in a configuration.
///
/// # Returns
///
/// The catalog (empty if it could not be built) and the findings, errors
/// before warnings in document order.
pub fn reference_findings(lines: &[ConfigLine]) -> (Catalog, Vec<VerifyFinding>) {
    let options = BuildOptions {
        annotate_nat: false,
        ..BuildOptions::default()
    };
    let catalog = match build_catalog(lines, options) {
        Ok(built) => built.catalog,
        Err(err) => return (Catalog::new(), vec![build_finding(&err)]),
    };

    let mut out = Vec::new();
    out.extend(member_findings(&catalog));
    out.extend(cycle_findings(&catalog));
    out.extend(access_list_findings(lines, &catalog));
    out.extend(unused_findings(lines, &catalog));
    out.sort_by_key(|finding| finding.severity == FindingSeverity::Warning);
    (catalog, out)
}

fn build_finding(err: &BuildError) -> VerifyFinding {
    let code = match err {
        BuildError::UnknownObject { .. } => "missing_object_reference",
        BuildError::EmptyObject { .. } => "empty_object",
        BuildError::Catalog { .. } => "invalid_catalog",
    };
    error(code, err.to_string())
}

/// Object-group members that name an undefined object.
fn member_findings(catalog: &Catalog) -> Vec<VerifyFinding> {
    let mut out = Vec::new();
    for entry in catalog.entries() {
        for reference in entry.members.iter().filter_map(|m| reference_of(m)) {
            if !catalog.contains(reference.name) {
                out.push(error(
                    "missing_object_reference",
                    format!(
                        "{} '{}' member references '{}' that does not exist",
                        entry.kind, entry.name, reference.name
                    ),
                ));
            }
        }
    }
    out
}

/// Object-groups that reach themselves through nested references.
fn cycle_findings(catalog: &Catalog) -> Vec<VerifyFinding> {
    let edges: BTreeMap<&str, Vec<&str>> = catalog
        .entries()
        .iter()
        .map(|entry| {
            let targets = entry
                .members
                .iter()
                .filter_map(|m| reference_of(m))
                .map(|reference| reference.name)
                .filter(|name| catalog.contains(name))
                .collect();
            (entry.name.as_str(), targets)
        })
        .collect();

    let mut out = Vec::new();
    for name in catalog.names() {
        if reaches(&edges, name, name) {
            out.push(error(
                "cyclic_object_group",
                format!("object-group '{name}' contains itself through nested group-object references"),
            ));
        }
    }
    out
}

/// True when `target` is reachable from `start` by at least one edge.
fn reaches(edges: &BTreeMap<&str, Vec<&str>>, start: &str, target: &str) -> bool {
    let mut visited = BTreeSet::new();
    let mut stack: Vec<&str> = edges.get(start).cloned().unwrap_or_default();
    while let Some(next) = stack.pop() {
        if next == target {
            return true;
        }
        if visited.insert(next) {
            stack.extend(edges.get(next).into_iter().flatten().copied());
        }
    }
    false
}

fn access_list_findings(lines: &[ConfigLine], catalog: &Catalog) -> Vec<VerifyFinding> {
    let mut out = Vec::new();
    for line in lines.iter().filter(|l| is_access_list_rule(&l.text)) {
        let references = find_references(&line.text);
        if references.is_empty() {
            continue;
        }
        for reference in &references {
            if !catalog.contains(reference.name) {
                out.push(error(
                    "missing_object_reference",
                    format!(
                        "access-list at line {} references '{}' that does not exist",
                        line.number, reference.name
                    ),
                ));
            }
        }
        let extended = line.text.split_whitespace().nth(2) == Some("extended");
        if extended && parse_ace(&line.text).is_none() {
            out.push(warning(
                "unparsed_access_list",
                format!(
                    "access-list at line {} does not follow the extended grammar; service members will be substituted in place",
                    line.number
                ),
            ));
        }
    }
    out
}

/// Definitions never mentioned outside their own declaration header.
fn unused_findings(lines: &[ConfigLine], catalog: &Catalog) -> Vec<VerifyFinding> {
    let mut used = BTreeSet::new();
    let mut current: Option<&str> = None;
    for line in lines {
        if let Some((_, name)) = object_header(&line.text) {
            current = Some(name);
            continue;
        }
        if !line.is_indented() {
            current = None;
        }
        let mut tokens = line.text.split_whitespace().peekable();
        if tokens.peek() == Some(&"nat") {
            // object NAT uses the object it is declared in
            if let Some(name) = current {
                used.insert(name);
            }
        }
        used.extend(tokens.filter(|token| catalog.contains(token)));
    }

    catalog
        .names()
        .filter(|name| !used.contains(name))
        .map(|name| {
            warning(
                "unused_object",
                format!("object '{name}' is defined but never referenced"),
            )
        })
        .collect()
}

fn is_access_list_rule(text: &str) -> bool {
    text.starts_with("access-list ") && text.split_whitespace().nth(2) != Some("remark")
}

fn error(code: &str, message: String) -> VerifyFinding {
    VerifyFinding {
        severity: FindingSeverity::Error,
        code: code.to_string(),
        message,
    }
}

fn warning(code: &str, message: String) -> VerifyFinding {
    VerifyFinding {
        severity: FindingSeverity::Warning,
        code: code.to_string(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use asa_config_core::parse;

    use super::{reference_findings, FindingSeverity};

    fn codes(text: &str) -> Vec<String> {
        let (_, findings) = reference_findings(&parse(text));
        findings.into_iter().map(|f| f.code).collect()
    }

    #[test]
    fn clean_config_has_no_findings() {
        let (catalog, findings) = reference_findings(&parse(
            "object-group network WEB\n network-object host 10.0.0.1\naccess-list A extended permit tcp any object-group WEB eq 443\n",
        ));
        assert_eq!(catalog.len(), 1);
        assert!(findings.is_empty(), "{findings:?}");
    }

    #[test]
    fn detects_missing_access_list_reference() {
        let found = codes("access-list A extended permit ip object-group NOPE any\n");
        assert_eq!(found, vec!["missing_object_reference"]);
    }

    #[test]
    fn detects_missing_group_member_reference() {
        let found = codes(
            "object-group network OUTER\n group-object INNER\naccess-list A extended permit ip object-group OUTER any\n",
        );
        assert!(found.contains(&"missing_object_reference".to_string()));
    }

    #[test]
    fn detects_cycles() {
        let (_, findings) = reference_findings(&parse(
            "object-group network A\n group-object B\nobject-group network B\n group-object A\naccess-list X extended permit ip object-group A any\n",
        ));
        let cycles: Vec<_> = findings
            .iter()
            .filter(|f| f.code == "cyclic_object_group")
            .collect();
        assert_eq!(cycles.len(), 2);
        assert!(cycles.iter().all(|f| f.severity == FindingSeverity::Error));
    }

    #[test]
    fn warns_on_unused_objects_but_counts_nat_use() {
        let found = codes(
            "object network SPARE\n host 10.0.0.9\nobject network NATTED\n host 10.0.0.8\n nat (inside,outside) dynamic interface\n",
        );
        assert_eq!(found, vec!["unused_object"]);
    }

    #[test]
    fn reports_unknown_nested_object_from_builder() {
        let found = codes("object-group network G\n network-object object NOPE\n");
        assert_eq!(found, vec!["missing_object_reference"]);
    }

    #[test]
    fn warns_on_unparsed_extended_entries() {
        let found = codes(
            "object-group network N\n network-object host 10.0.0.1\naccess-list A extended permit tcp object-group N\n",
        );
        assert_eq!(found, vec!["unparsed_access_list"]);
    }
}
