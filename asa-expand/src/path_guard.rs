use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

/// Refuse to write the expanded document over the configuration it came from.
pub fn ensure_output_not_input(output: &Path, input: &Path) -> Result<()> {
    let input_norm = input
        .canonicalize()
        .with_context(|| format!("failed to resolve input path {}", input.display()))?;
    let output_norm = resolve_output(output)
        .with_context(|| format!("failed to resolve output path {}", output.display()))?;

    if input_norm == output_norm {
        bail!(
            "refusing to overwrite source file: output {} matches input {}",
            output.display(),
            input.display()
        );
    }
    Ok(())
}

/// Canonicalize an output path that may not exist yet by resolving its
/// parent directory and re-attaching the file name.
fn resolve_output(path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return Ok(path.canonicalize()?);
    }
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().context("current_dir")?,
    };
    let Some(file_name) = path.file_name() else {
        bail!("output path {} has no file name", path.display());
    };
    Ok(parent.canonicalize()?.join(file_name))
}
