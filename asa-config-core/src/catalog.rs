//! Object catalog: named object and object-group members, and the member flattener.

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

use serde::Serialize;
use thiserror::Error;

/// Nesting limit used by [`Catalog::flatten`].
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Errors raised while resolving catalog references.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// A member references a name that was never declared.
    #[error("reference to undefined object '{0}'")]
    UnknownObject(String),
    /// Nesting went deeper than the configured limit, usually a cycle.
    #[error("object '{name}' nests deeper than {depth} levels (cyclic object-group?)")]
    DepthExceeded { name: String, depth: usize },
}

/// Which keyword introduced a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RefKind {
    Object,
    ObjectGroup,
}

impl RefKind {
    pub fn from_keyword(token: &str) -> Option<Self> {
        match token {
            "object" => Some(RefKind::Object),
            "object-group" => Some(RefKind::ObjectGroup),
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            RefKind::Object => "object",
            RefKind::ObjectGroup => "object-group",
        }
    }
}

/// A textual `object <name>` or `object-group <name>` reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectRef<'a> {
    pub kind: RefKind,
    pub name: &'a str,
}

impl Display for ObjectRef<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind.keyword(), self.name)
    }
}

/// Return the reference when `member` is exactly `object[-group] <name>`.
pub fn reference_of(member: &str) -> Option<ObjectRef<'_>> {
    let mut tokens = member.split_whitespace();
    let kind = RefKind::from_keyword(tokens.next()?)?;
    let name = tokens.next()?;
    if tokens.next().is_some() {
        return None;
    }
    Some(ObjectRef { kind, name })
}

/// One named definition and its members in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub name: String,
    /// Declaration keyword, e.g. `object network` or `object-group service`.
    pub kind: String,
    pub members: Vec<String>,
}

/// Name to ordered-members store built from object and object-group blocks.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    #[serde(skip)]
    index: BTreeMap<String, usize>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name`; a name declared twice keeps its first kind and
    /// accumulates members across both blocks.
    pub fn declare(&mut self, name: &str, kind: &str) {
        if self.index.contains_key(name) {
            return;
        }
        self.index.insert(name.to_string(), self.entries.len());
        self.entries.push(CatalogEntry {
            name: name.to_string(),
            kind: kind.to_string(),
            members: Vec::new(),
        });
    }

    /// Append a member, declaring the name with an empty kind if needed.
    pub fn push_member(&mut self, name: &str, member: impl Into<String>) {
        if !self.index.contains_key(name) {
            self.declare(name, "");
        }
        if let Some(&idx) = self.index.get(name) {
            self.entries[idx].members.push(member.into());
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&CatalogEntry> {
        self.index.get(name).map(|&idx| &self.entries[idx])
    }

    pub fn members(&self, name: &str) -> Option<&[String]> {
        self.get(name).map(|entry| entry.members.as_slice())
    }

    pub fn first_member(&self, name: &str) -> Option<&str> {
        self.members(name)?.first().map(String::as_str)
    }

    /// Entries in declaration order.
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace every `object[-group] <name>` member, recursively, with the
    /// members of the referenced entry.
    pub fn flatten(&self, members: &[String]) -> Result<Vec<String>, CatalogError> {
        self.flatten_with_limit(members, DEFAULT_MAX_DEPTH)
    }

    pub fn flatten_with_limit(
        &self,
        members: &[String],
        max_depth: usize,
    ) -> Result<Vec<String>, CatalogError> {
        let mut out = Vec::new();
        self.flatten_into(members, 0, max_depth, &mut out)?;
        Ok(out)
    }

    /// Flatten the members of the entry called `name`.
    pub fn flatten_object(&self, name: &str) -> Result<Vec<String>, CatalogError> {
        let members = self
            .members(name)
            .ok_or_else(|| CatalogError::UnknownObject(name.to_string()))?;
        self.flatten(members)
    }

    fn flatten_into(
        &self,
        members: &[String],
        depth: usize,
        max_depth: usize,
        out: &mut Vec<String>,
    ) -> Result<(), CatalogError> {
        for member in members {
            let Some(reference) = reference_of(member) else {
                out.push(member.clone());
                continue;
            };
            if depth >= max_depth {
                return Err(CatalogError::DepthExceeded {
                    name: reference.name.to_string(),
                    depth: max_depth,
                });
            }
            let nested = self
                .members(reference.name)
                .ok_or_else(|| CatalogError::UnknownObject(reference.name.to_string()))?;
            self.flatten_into(nested, depth + 1, max_depth, out)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{reference_of, Catalog, CatalogError, RefKind};

    fn sample() -> Catalog {
        let mut catalog = Catalog::new();
        catalog.declare("G1", "object-group network");
        catalog.push_member("G1", "host 10.0.0.1");
        catalog.push_member("G1", "object-group G2");
        catalog.declare("G2", "object-group network");
        catalog.push_member("G2", "10.1.0.0 255.255.0.0");
        catalog.push_member("G2", "object-group G3");
        catalog.declare("G3", "object-group network");
        catalog.push_member("G3", "host 10.2.2.2");
        catalog
    }

    #[test]
    fn reference_of_requires_exact_shape() {
        let reference = reference_of("object-group WEB").expect("reference");
        assert_eq!(reference.kind, RefKind::ObjectGroup);
        assert_eq!(reference.name, "WEB");
        assert_eq!(reference.to_string(), "object-group WEB");
        assert!(reference_of("object-group-user USERS").is_none());
        assert!(reference_of("object WEB extra").is_none());
        assert!(reference_of("host 10.0.0.1").is_none());
    }

    #[test]
    fn redeclared_name_appends_members() {
        let mut catalog = Catalog::new();
        catalog.declare("WEB", "object network");
        catalog.push_member("WEB", "host 10.0.0.1");
        catalog.declare("WEB", "object network");
        catalog.push_member("WEB", "host 10.0.0.2");
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.first_member("WEB"), Some("host 10.0.0.1"));
        assert_eq!(catalog.members("WEB").map(<[String]>::len), Some(2));
    }

    #[test]
    fn flatten_resolves_nested_groups_in_order() {
        let catalog = sample();
        let flat = catalog.flatten_object("G1").expect("flatten");
        assert_eq!(
            flat,
            vec![
                "host 10.0.0.1".to_string(),
                "10.1.0.0 255.255.0.0".to_string(),
                "host 10.2.2.2".to_string(),
            ]
        );
    }

    #[test]
    fn flatten_reports_unknown_reference() {
        let mut catalog = Catalog::new();
        catalog.push_member("G1", "object-group MISSING");
        assert_eq!(
            catalog.flatten_object("G1"),
            Err(CatalogError::UnknownObject("MISSING".to_string()))
        );
    }

    #[test]
    fn flatten_stops_on_cycles() {
        let mut catalog = Catalog::new();
        catalog.push_member("A", "object-group B");
        catalog.push_member("B", "object-group A");
        let err = catalog
            .flatten_with_limit(&["object-group A".to_string()], 8)
            .expect_err("cycle");
        assert!(matches!(err, CatalogError::DepthExceeded { depth: 8, .. }));
    }
}
