//! Object catalog builder.
//!
//! Walks the configuration once, recording every `object network`,
//! `object service` and `object-group` block into a [`Catalog`] while copying
//! the lines to a new output stream. Along the way it:
//!
//! - inlines nested `object <name>` members as `! OBJECT DEFINITION:` comments
//! - annotates object NAT (`nat` inside an `object network` block) with the
//!   translated subnet and the flattened members of any object it names
//! - annotates global/manual NAT the same way
//!
//! `object-group <name>` members are kept as references; the expander
//! resolves them later.

use std::collections::BTreeSet;
use std::net::IpAddr;

use asa_config_core::catalog::DEFAULT_MAX_DEPTH;
use asa_config_core::{reference_of, Catalog, CatalogError, ConfigLine, RefKind};
use thiserror::Error;
use tracing::{debug, warn};

/// Member keywords dropped during normalization, besides the `*-object` family.
const QUALIFIER_KEYWORDS: &[&str] = &["subnet", "service"];

/// Errors raised while building the catalog.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("line {line}: object '{name}' is referenced before it is defined")]
    UnknownObject { name: String, line: usize },
    #[error("line {line}: object '{name}' is referenced but has no members")]
    EmptyObject { name: String, line: usize },
    #[error("line {line}: {source}")]
    Catalog {
        line: usize,
        #[source]
        source: CatalogError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    /// Emit `! NAT ...` annotation comments after NAT commands.
    pub annotate_nat: bool,
    /// Nesting limit when flattening objects named by NAT commands.
    pub max_depth: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            annotate_nat: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Annotated line stream plus the catalog it declared.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub lines: Vec<String>,
    pub catalog: Catalog,
    pub nat_annotations: usize,
    pub inlined_objects: usize,
}

/// Where a NAT command was found, which decides its annotation header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NatScope {
    Object,
    Global,
}

impl NatScope {
    fn header(self) -> &'static str {
        match self {
            NatScope::Object => "! NAT TO OBJECT:",
            NatScope::Global => "! GLOBAL NAT OBJECT:",
        }
    }
}

/// Incremental catalog builder. Feed lines in document order with
/// [`CatalogBuilder::push`], then call [`CatalogBuilder::finish`].
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    options: BuildOptions,
    catalog: Catalog,
    current_group: Option<String>,
    out: Vec<String>,
    nat_annotations: usize,
    inlined_objects: usize,
}

/// Build the catalog for a whole document.
pub fn build_catalog(
    lines: &[ConfigLine],
    options: BuildOptions,
) -> Result<BuildOutput, BuildError> {
    let mut builder = CatalogBuilder::new(options);
    for line in lines {
        builder.push(line)?;
    }
    Ok(builder.finish())
}

/// Recognize an object declaration header, returning `(kind, name)`.
///
/// The name is always the third token: `object-group network NAME ...`,
/// `object network NAME`, `object service NAME`.
pub fn object_header(text: &str) -> Option<(String, &str)> {
    if text.starts_with(char::is_whitespace) {
        return None;
    }
    let mut tokens = text.split_whitespace();
    let keyword = tokens.next()?;
    let kind = tokens.next()?;
    let name = tokens.next()?;
    match keyword {
        "object-group" => Some((format!("object-group {kind}"), name)),
        "object" if matches!(kind, "network" | "service") => {
            Some((format!("object {kind}"), name))
        }
        _ => None,
    }
}

/// Normalize an object member line into its catalog form.
pub fn normalize_member(text: &str) -> String {
    let text = text.trim();
    let (head, tail) = match text.split_once(char::is_whitespace) {
        Some((head, tail)) => (head, tail.trim()),
        None => (text, ""),
    };
    if head == "group-object" {
        return format!("object-group {tail}").trim().to_string();
    }
    if head.ends_with("-object") || QUALIFIER_KEYWORDS.contains(&head) {
        return tail.to_string();
    }
    text.to_string()
}

impl CatalogBuilder {
    pub fn new(options: BuildOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Process one line, appending it (and any annotations) to the output.
    pub fn push(&mut self, line: &ConfigLine) -> Result<(), BuildError> {
        let text = line.text.as_str();

        if let Some((kind, name)) = object_header(text) {
            debug!(line = line.number, name, kind = kind.as_str(), "object declaration");
            self.catalog.declare(name, &kind);
            self.current_group = Some(name.to_string());
            self.out.push(text.to_string());
            return Ok(());
        }

        if line.is_indented() {
            if let Some(group) = self.current_group.clone() {
                return self.push_member(&group, line);
            }
        } else {
            self.current_group = None;
            if first_token(text) == Some("nat") {
                self.out.push(text.to_string());
                return self.annotate_nat_objects(text, NatScope::Global, line.number);
            }
        }

        self.out.push(text.to_string());
        Ok(())
    }

    pub fn finish(self) -> BuildOutput {
        BuildOutput {
            lines: self.out,
            catalog: self.catalog,
            nat_annotations: self.nat_annotations,
            inlined_objects: self.inlined_objects,
        }
    }

    fn push_member(&mut self, group: &str, line: &ConfigLine) -> Result<(), BuildError> {
        let trimmed = line.text.trim();
        match first_token(trimmed) {
            Some("nat") => {
                self.out.push(line.text.clone());
                return self.annotate_object_nat(group, trimmed, line.number);
            }
            Some("description") => {
                self.out.push(line.text.clone());
                return Ok(());
            }
            _ => {}
        }

        let member = normalize_member(trimmed);
        match reference_of(&member).filter(|reference| reference.kind == RefKind::Object) {
            Some(reference) => {
                if !self.catalog.contains(reference.name) {
                    return Err(BuildError::UnknownObject {
                        name: reference.name.to_string(),
                        line: line.number,
                    });
                }
                let resolved = self
                    .catalog
                    .first_member(reference.name)
                    .ok_or_else(|| BuildError::EmptyObject {
                        name: reference.name.to_string(),
                        line: line.number,
                    })?
                    .to_string();
                debug!(group, object = reference.name, %resolved, "inlined nested object");
                self.out.push(format!(
                    "! OBJECT DEFINITION: {} = {resolved}",
                    reference.name
                ));
                self.catalog.push_member(group, resolved);
                self.inlined_objects += 1;
            }
            None => {
                self.out.push(line.text.clone());
                self.catalog.push_member(group, member);
            }
        }
        Ok(())
    }

    fn annotate_object_nat(
        &mut self,
        group: &str,
        nat: &str,
        line: usize,
    ) -> Result<(), BuildError> {
        if !self.options.annotate_nat {
            return Ok(());
        }
        match self.catalog.first_member(group) {
            Some(member) => {
                let from = nat_source(member);
                self.out.push(format!("! NAT FROM: {from}"));
                self.nat_annotations += 1;
            }
            None => warn!(line, object = group, "object NAT declared before any address"),
        }
        self.annotate_nat_objects(nat, NatScope::Object, line)
    }

    /// Annotate each catalog name appearing from the fourth token onward.
    fn annotate_nat_objects(
        &mut self,
        nat: &str,
        scope: NatScope,
        line: usize,
    ) -> Result<(), BuildError> {
        if !self.options.annotate_nat {
            return Ok(());
        }
        let mut seen = BTreeSet::new();
        for token in nat.split_whitespace().skip(3) {
            if !self.catalog.contains(token) || !seen.insert(token) {
                continue;
            }
            let members = self
                .catalog
                .flatten_with_limit(
                    self.catalog.members(token).unwrap_or_default(),
                    self.options.max_depth,
                )
                .map_err(|source| BuildError::Catalog { line, source })?;
            self.out.push(format!("{} {token}", scope.header()));
            self.out
                .extend(members.iter().map(|member| format!("!   {member}")));
            self.nat_annotations += 1;
        }
        Ok(())
    }
}

/// Render the real address of an object NAT: plain `host` members stay as
/// they are, bare address/mask or prefix members get a `subnet` prefix.
fn nat_source(member: &str) -> String {
    let starts_with_address = first_token(member)
        .is_some_and(|token| token.parse::<IpAddr>().is_ok() || token.contains('/'));
    if starts_with_address {
        format!("subnet {member}")
    } else {
        member.to_string()
    }
}

fn first_token(text: &str) -> Option<&str> {
    text.split_whitespace().next()
}
