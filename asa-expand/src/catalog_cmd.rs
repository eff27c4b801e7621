use anyhow::{bail, Context, Result};
use asa_config_core::catalog::DEFAULT_MAX_DEPTH;
use asa_config_core::{parse_file, Catalog, CatalogError};
use asa_expand::builder::{build_catalog, BuildOptions};
use asa_expand::report::render_catalog;
use serde::Serialize;

use crate::cli::{CatalogArgs, OutputFormat};

#[derive(Debug, Serialize)]
struct FlatEntry<'a> {
    name: &'a str,
    kind: &'a str,
    members: Vec<String>,
}

pub fn run_catalog(args: CatalogArgs) -> Result<()> {
    let max_depth = args.max_depth.unwrap_or(DEFAULT_MAX_DEPTH);
    if max_depth == 0 {
        bail!("--max-depth must be at least 1");
    }
    let lines = parse_file(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let options = BuildOptions {
        annotate_nat: false,
        max_depth,
    };
    let built = build_catalog(&lines, options)
        .with_context(|| format!("failed to build catalog for {}", args.file.display()))?;

    match args.format {
        OutputFormat::Text => {
            let flatten_depth = args.flatten.then_some(max_depth);
            println!("{}", render_catalog(&built.catalog, flatten_depth)?);
        }
        OutputFormat::Json if args.flatten => {
            let flat = flatten_entries(&built.catalog, max_depth)?;
            println!("{}", serde_json::to_string_pretty(&flat)?);
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&built.catalog)?),
    }
    Ok(())
}

fn flatten_entries(
    catalog: &Catalog,
    max_depth: usize,
) -> Result<Vec<FlatEntry<'_>>, CatalogError> {
    let mut out = Vec::with_capacity(catalog.len());
    for entry in catalog.entries() {
        out.push(FlatEntry {
            name: &entry.name,
            kind: &entry.kind,
            members: catalog.flatten_with_limit(&entry.members, max_depth)?,
        });
    }
    Ok(out)
}
