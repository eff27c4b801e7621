//! Whole-document normalization: catalog building followed by access-list
//! expansion.

use asa_config_core::{Catalog, ConfigLine};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::builder::{build_catalog, BuildError};
use crate::expand::{find_reference, ExpandError, Expander};
use crate::settings::Settings;

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error("failed to expand '{ace}': {source}")]
    Expand {
        ace: String,
        #[source]
        source: ExpandError,
    },
}

/// Counters describing one normalization run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeSummary {
    pub input_lines: usize,
    pub output_lines: usize,
    pub objects: usize,
    pub inlined_objects: usize,
    pub nat_annotations: usize,
    pub rewritten_access_lists: usize,
    pub generated_access_lists: usize,
}

#[derive(Debug, Clone)]
pub struct Normalized {
    pub lines: Vec<String>,
    pub catalog: Catalog,
    pub summary: NormalizeSummary,
}

/// Normalize a configuration document.
///
/// Every access-list carrying an object reference is replaced by an optional
/// `remark ORIGINAL:` line and the fully expanded entries; all other lines
/// keep their order.
pub fn normalize(lines: &[ConfigLine], settings: &Settings) -> Result<Normalized, NormalizeError> {
    let built = build_catalog(lines, settings.build_options())?;
    let expander = Expander::new(&built.catalog).with_max_depth(settings.max_depth);

    let mut summary = NormalizeSummary {
        input_lines: lines.len(),
        objects: built.catalog.len(),
        inlined_objects: built.inlined_objects,
        nat_annotations: built.nat_annotations,
        ..NormalizeSummary::default()
    };
    let mut out = Vec::with_capacity(built.lines.len());

    for line in &built.lines {
        if !needs_expansion(line) {
            out.push(line.clone());
            continue;
        }
        let expanded = expander
            .expand(line)
            .map_err(|source| NormalizeError::Expand {
                ace: line.clone(),
                source,
            })?;
        debug!(ace = %line, generated = expanded.len(), "expanded access-list");
        if settings.keep_original {
            out.push(original_remark(line));
        }
        summary.rewritten_access_lists += 1;
        summary.generated_access_lists += expanded.len();
        out.extend(expanded);
    }

    summary.output_lines = out.len();
    Ok(Normalized {
        lines: out,
        catalog: built.catalog,
        summary,
    })
}

/// True for a non-remark access-list that still references an object.
pub fn needs_expansion(line: &str) -> bool {
    if !line.starts_with("access-list ") {
        return false;
    }
    let is_remark = line.split_whitespace().nth(2) == Some("remark");
    !is_remark && find_reference(line).is_some()
}

/// `access-list <name> remark ORIGINAL:<line>`.
pub fn original_remark(line: &str) -> String {
    let name = line.split_whitespace().nth(1).unwrap_or_default();
    format!("access-list {name} remark ORIGINAL:{line}")
}

#[cfg(test)]
mod tests {
    use asa_config_core::parse;
    use pretty_assertions::assert_eq;

    use super::{needs_expansion, normalize, NormalizeError};
    use crate::settings::Settings;

    const CONFIG: &str = "\
object-group service WEBSVC
 service-object tcp destination eq 80
 service-object tcp destination eq 443
access-list OUT remark object-group WEBSVC is for the web farm
access-list OUT extended permit object-group WEBSVC any any
access-list OUT extended deny ip any any
";

    #[test]
    fn rewrites_access_lists_with_references() {
        let normalized = normalize(&parse(CONFIG), &Settings::default()).expect("normalize");
        assert_eq!(
            normalized.lines,
            vec![
                "object-group service WEBSVC",
                " service-object tcp destination eq 80",
                " service-object tcp destination eq 443",
                "access-list OUT remark object-group WEBSVC is for the web farm",
                "access-list OUT remark ORIGINAL:access-list OUT extended permit object-group WEBSVC any any",
                " access-list OUT extended permit tcp any any eq 80",
                " access-list OUT extended permit tcp any any eq 443",
                "access-list OUT extended deny ip any any",
            ]
        );
        assert_eq!(normalized.summary.rewritten_access_lists, 1);
        assert_eq!(normalized.summary.generated_access_lists, 2);
        assert_eq!(normalized.summary.input_lines, 6);
        assert_eq!(normalized.summary.output_lines, 8);
        assert_eq!(normalized.summary.objects, 1);
    }

    #[test]
    fn original_remark_can_be_suppressed() {
        let settings = Settings {
            keep_original: false,
            ..Settings::default()
        };
        let normalized = normalize(&parse(CONFIG), &settings).expect("normalize");
        assert_eq!(normalized.lines.len(), 7);
        assert!(!normalized.lines.iter().any(|l| l.contains("ORIGINAL:")));
    }

    #[test]
    fn expansion_errors_name_the_access_list() {
        let err = normalize(
            &parse("access-list A extended permit ip object-group MISSING any\n"),
            &Settings::default(),
        )
        .expect_err("missing");
        assert!(matches!(err, NormalizeError::Expand { .. }));
        assert!(err.to_string().contains("MISSING"));
    }

    #[test]
    fn only_referencing_access_lists_need_expansion() {
        assert!(needs_expansion("access-list A extended permit ip object N any"));
        assert!(!needs_expansion("access-list A extended permit ip any any"));
        assert!(!needs_expansion("access-list A remark see object-group N"));
        assert!(!needs_expansion(" access-list A extended permit ip object N any"));
        assert!(!needs_expansion("access-group A in interface inside"));
        assert!(!needs_expansion("access-list object extended permit ip any any"));
    }
}
