use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "asa-expand")]
#[command(about = "Expand object-group references in ASA-style firewall configurations")]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Rewrite a configuration with every object reference expanded.
    Expand(ExpandArgs),
    /// Print the object catalog declared by a configuration.
    Catalog(CatalogArgs),
    /// Check object references without expanding.
    Check(CheckArgs),
    /// Parse one access-list command and print its fields.
    ParseAce(ParseAceArgs),
}

#[derive(Parser, Debug)]
pub struct ExpandArgs {
    /// Configuration file to expand.
    pub file: PathBuf,
    /// Output file path. Defaults to stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Optional settings TOML file.
    #[arg(long)]
    pub settings: Option<PathBuf>,
    /// Override the nesting limit for object-group references.
    #[arg(long)]
    pub max_depth: Option<usize>,
    /// Do not emit `remark ORIGINAL:` lines.
    #[arg(long)]
    pub no_original: bool,
    /// Do not emit NAT annotation comments.
    #[arg(long)]
    pub no_nat_annotations: bool,
    /// Print run counters to stderr.
    #[arg(long)]
    pub summary: bool,
    /// Format of the summary.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Parser, Debug)]
pub struct CatalogArgs {
    /// Configuration file to read.
    pub file: PathBuf,
    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    /// Resolve nested object-groups into concrete members.
    #[arg(long)]
    pub flatten: bool,
    /// Override the nesting limit used by --flatten.
    #[arg(long)]
    pub max_depth: Option<usize>,
}

#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Configuration file to check.
    pub file: PathBuf,
    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    /// Treat warnings as failures.
    #[arg(long)]
    pub strict: bool,
}

#[derive(Parser, Debug)]
pub struct ParseAceArgs {
    /// The access-list command, quoted as one argument.
    pub line: String,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
