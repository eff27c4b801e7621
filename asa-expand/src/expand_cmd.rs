use std::io::IsTerminal;

use anyhow::{bail, Context, Result};
use asa_config_core::{parse_file, write_file};
use asa_expand::normalize::normalize;
use asa_expand::report::{render_summary, render_text};
use asa_expand::settings::{default_settings, load_settings, Settings};
use tracing::info;

use crate::cli::{ExpandArgs, OutputFormat};
use crate::path_guard;

pub fn run_expand(args: ExpandArgs) -> Result<()> {
    let settings = resolve_settings(&args)?;
    let lines = parse_file(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;

    let normalized = normalize(&lines, &settings)
        .with_context(|| format!("failed to expand {}", args.file.display()))?;
    info!(
        rewritten = normalized.summary.rewritten_access_lists,
        generated = normalized.summary.generated_access_lists,
        "expansion complete"
    );

    match &args.output {
        Some(out_path) => {
            path_guard::ensure_output_not_input(out_path, &args.file)?;
            write_file(&normalized.lines, out_path)
                .with_context(|| format!("failed to write output {}", out_path.display()))?;
        }
        None if std::io::stdout().is_terminal() => {
            println!("{}", render_text(&normalized.lines));
        }
        None => print!("{}", asa_config_core::write(&normalized.lines)),
    }

    if args.summary {
        match args.format {
            OutputFormat::Text => eprintln!("{}", render_summary(&normalized.summary)),
            OutputFormat::Json => {
                eprintln!("{}", serde_json::to_string_pretty(&normalized.summary)?)
            }
        }
    }
    Ok(())
}

/// Embedded defaults, then the settings file, then command-line flags.
fn resolve_settings(args: &ExpandArgs) -> Result<Settings> {
    let mut settings = match &args.settings {
        Some(path) => load_settings(path)?,
        None => default_settings(),
    };
    if let Some(depth) = args.max_depth {
        if depth == 0 {
            bail!("--max-depth must be at least 1");
        }
        settings.max_depth = depth;
    }
    if args.no_original {
        settings.keep_original = false;
    }
    if args.no_nat_annotations {
        settings.annotate_nat = false;
    }
    Ok(settings)
}
