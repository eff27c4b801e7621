//! Configuration documents as numbered command lines.

use std::fmt::{self, Display, Formatter};
use std::fs;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

/// One command line of a configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigLine {
    /// 1-indexed position in the source document.
    pub number: usize,
    /// Line text without its terminator.
    pub text: String,
}

impl ConfigLine {
    pub fn new(number: usize, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
        }
    }

    /// True when the line starts with whitespace, i.e. it belongs to the
    /// sub-block opened by the previous header line.
    pub fn is_indented(&self) -> bool {
        self.text.starts_with(char::is_whitespace)
    }
}

impl Display for ConfigLine {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Errors that can occur while reading a configuration document.
#[derive(Debug, Error)]
pub enum ReadError {
    /// Failed to read input file.
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),
    /// The document holds no lines at all.
    #[error("configuration document is empty")]
    Empty,
}

/// Errors that can occur while writing a configuration document.
#[derive(Debug, Error)]
pub enum WriteError {
    /// Failed to write output file.
    #[error("failed to write configuration file: {0}")]
    Io(#[from] std::io::Error),
}

/// Split document text into numbered lines.
///
/// Both `\n` and `\r\n` terminators are accepted; line content is kept as-is.
pub fn parse(text: &str) -> Vec<ConfigLine> {
    text.lines()
        .enumerate()
        .map(|(idx, line)| ConfigLine::new(idx + 1, line))
        .collect()
}

/// Read and split a configuration file.
pub fn parse_file(path: &Path) -> Result<Vec<ConfigLine>, ReadError> {
    let raw = fs::read_to_string(path)?;
    let lines = parse(&raw);
    if lines.is_empty() {
        return Err(ReadError::Empty);
    }
    Ok(lines)
}

/// Join lines into document text with a trailing newline.
pub fn write<S: AsRef<str>>(lines: &[S]) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(line.as_ref());
        out.push('\n');
    }
    out
}

/// Join lines and write them to `path`.
pub fn write_file<S: AsRef<str>>(lines: &[S], path: &Path) -> Result<(), WriteError> {
    fs::write(path, write(lines))?;
    Ok(())
}
