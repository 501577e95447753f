//! Command-line arguments of the `schematic` binary.

use std::path::PathBuf;

use clap::Parser;

/// Validate, flatten and lay out a Schematic diagram description.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Diagram description (JSON, flat or hierarchical)
    pub input: PathBuf,

    /// Write the position document to FILE after a successful layout
    #[arg(short, long, value_name = "FILE", conflicts_with = "check")]
    pub output: Option<PathBuf>,

    /// Layout settings (TOML); searched for when omitted
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Only validate the description
    #[arg(long)]
    pub check: bool,

    #[arg(
        long,
        default_value = "info",
        value_parser = ["off", "error", "warn", "info", "debug", "trace"],
    )]
    pub log_level: String,
}
