//! CLI argument definitions for the Palimpsest binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

/// Inspect and edit encoded documents
#[derive(Parser, Debug)]
#[command(name = "palimpsest")]
#[command(about = "Palimpsest: copy-on-write editing of encoded documents")]
#[command(version)]
pub struct Cli {
    /// Output format
    #[arg(
        short,
        long,
        global = true,
        default_value = "human",
        env = "PALIMPSEST_FORMAT"
    )]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Encode a JSON file as a block
    FromJson(FromJsonArgs),
    /// Print a block (or part of it) as JSON
    Dump(DumpArgs),
    /// Show the shape and size of a block
    Info(InfoArgs),
    /// Set the value at a path
    Set(SetArgs),
    /// Remove the value at a path
    Remove(RemoveArgs),
}

/// Arguments for the from-json command
#[derive(clap::Args, Debug)]
pub struct FromJsonArgs {
    /// JSON file to read
    pub input: PathBuf,

    /// Block file to write
    #[arg(short, long)]
    pub output: PathBuf,
}

/// Arguments for the dump command
#[derive(clap::Args, Debug)]
pub struct DumpArgs {
    /// Block file to read
    pub file: PathBuf,

    /// Dotted path of the value to print, e.g. `items.0.name`
    #[arg(short, long)]
    pub path: Option<String>,
}

/// Arguments for the info command
#[derive(clap::Args, Debug)]
pub struct InfoArgs {
    /// Block file to read
    pub file: PathBuf,
}

/// Arguments for the set command
#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Block file to edit
    pub file: PathBuf,

    /// Dotted path to set. A sequence index equal to its length appends.
    pub path: String,

    /// New value as JSON
    pub value: String,

    /// Where to write the result (defaults to editing in place)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the remove command
#[derive(clap::Args, Debug)]
pub struct RemoveArgs {
    /// Block file to edit
    pub file: PathBuf,

    /// Dotted path to remove
    pub path: String,

    /// Where to write the result (defaults to editing in place)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
