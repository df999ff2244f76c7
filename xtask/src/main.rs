//! xtask automation tool for Beacon
//!
//! This tool provides development automation tasks like schema generation.

mod gen_schemas;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Development automation tool for Beacon")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate JSON schemas for the attention data model
    GenSchemas {
        /// Output directory
        #[arg(long, default_value = "schemas")]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::GenSchemas { out } => gen_schemas::run(&out),
    }
}
