use asa_config_core::{Catalog, CatalogError};
use colored::Colorize;

use crate::normalize::NormalizeSummary;

/// Render normalized lines for terminal output.
pub fn render_text(lines: &[String]) -> String {
    let mut out = Vec::new();

    for line in lines {
        let colored = if line.starts_with(" access-list ") {
            line.green().to_string()
        } else if line.contains(" remark ORIGINAL:") {
            line.yellow().to_string()
        } else if line.starts_with('!') {
            line.magenta().to_string()
        } else {
            line.to_string()
        };
        out.push(colored);
    }

    out.join("\n")
}

/// Render summary counts for terminal output.
pub fn render_summary(summary: &NormalizeSummary) -> String {
    format!(
        "lines in={} out={} objects={} inlined={} nat_annotations={} access_lists rewritten={} generated={}",
        summary.input_lines,
        summary.output_lines,
        summary.objects,
        summary.inlined_objects,
        summary.nat_annotations,
        summary.rewritten_access_lists,
        summary.generated_access_lists
    )
    .cyan()
    .to_string()
}

/// Render the catalog one entry per block. With `flatten_depth` set, nested
/// groups are flattened into their concrete members up to that depth.
pub fn render_catalog(
    catalog: &Catalog,
    flatten_depth: Option<usize>,
) -> Result<String, CatalogError> {
    let mut out = Vec::new();
    for entry in catalog.entries() {
        out.push(format!("{} {}", entry.kind, entry.name).trim().to_string());
        let members = match flatten_depth {
            Some(depth) => catalog.flatten_with_limit(&entry.members, depth)?,
            None => entry.members.clone(),
        };
        for member in members {
            out.push(format!("  {member}"));
        }
    }
    Ok(out.join("\n"))
}
