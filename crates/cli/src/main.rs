mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{CheckCommand, FmtCommand, RunCommand};

/// rulekit CLI - parse, check and evaluate rule sources
#[derive(Debug, Parser)]
#[command(
    name = "rulekit",
    version,
    about = "Parse, check and evaluate rule sources"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Evaluate a rule source against a data record
    Run(RunCommand),
    /// Parse a rule source and report diagnostics
    Check(CheckCommand),
    /// Rewrite a rule source in canonical form
    Fmt(FmtCommand),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Run(cmd) => cmd.execute()?,
        Commands::Check(cmd) => cmd.execute()?,
        Commands::Fmt(cmd) => cmd.execute()?,
    };

    std::process::exit(exit_code);
}
