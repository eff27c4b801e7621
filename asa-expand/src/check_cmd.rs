use anyhow::{bail, Context, Result};
use asa_config_core::parse_file;
use asa_expand::verify::{build_verify_report, render_verify_text};

use crate::cli::{CheckArgs, OutputFormat};

pub fn run_check(args: CheckArgs) -> Result<()> {
    let lines = parse_file(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let report = build_verify_report(&lines);

    match args.format {
        OutputFormat::Text => println!("{}", render_verify_text(&report)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    if report.errors > 0 {
        bail!("check failed: {} errors", report.errors);
    }
    if args.strict && report.warnings > 0 {
        bail!("check failed in strict mode: {} warnings", report.warnings);
    }
    Ok(())
}
