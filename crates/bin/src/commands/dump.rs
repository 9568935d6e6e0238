//! Print a block as JSON.

use super::{CliResult, load};
use crate::cli::DumpArgs;
use crate::output::OutputFormat;
use crate::path;

/// Run the dump command
pub fn run(args: &DumpArgs, format: OutputFormat) -> CliResult<()> {
    let root = load(&args.file)?;
    let value = match &args.path {
        Some(p) => path::resolve(&root, &path::split(p))?,
        None => root.as_native()?,
    };
    format.print_json(&value.to_json()?)?;
    Ok(())
}
