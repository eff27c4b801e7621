use anyhow::{Context, Result};
use asa_config_core::parse_ace;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod catalog_cmd;
mod check_cmd;
mod cli;
mod expand_cmd;
mod path_guard;

use cli::{Cli, Command, ParseAceArgs};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Expand(args) => expand_cmd::run_expand(args),
        Command::Catalog(args) => catalog_cmd::run_catalog(args),
        Command::Check(args) => check_cmd::run_check(args),
        Command::ParseAce(args) => run_parse_ace(args),
    }
}

/// Logs go to stderr; stdout carries the configuration.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run_parse_ace(args: ParseAceArgs) -> Result<()> {
    let entry = parse_ace(&args.line)
        .with_context(|| format!("not an extended access-list command: {}", args.line))?;
    println!("{}", serde_json::to_string_pretty(&entry)?);
    Ok(())
}
