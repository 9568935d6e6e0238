//! In-place edits through the overlay.
//!
//! Only the path being edited is materialized; every other subtree is copied
//! from the original file unchanged.

use std::path::Path;

use palimpsest::{Block, Slot};

use super::{CliResult, load, save};
use crate::cli::{RemoveArgs, SetArgs};
use crate::output::OutputFormat;
use crate::path::{self, Target};

/// Run the set command
pub fn set(args: &SetArgs, format: OutputFormat) -> CliResult<()> {
    let root = load(&args.file)?;
    let json: serde_json::Value = serde_json::from_str(&args.value)?;
    let slot = Slot::from_encoded(Block::from_json(&json)?.root());

    match path::target(&root, &args.path)? {
        Target::Map(map, key) => map.set_slot(&key, slot)?,
        Target::Seq(seq, index) if index == seq.count() => seq.append_slot(slot)?,
        Target::Seq(seq, index) => seq.set_slot(index, slot)?,
    }

    let output = args.output.as_deref().unwrap_or(&args.file);
    let block = save(&root, output)?;
    report(format, "set", &args.path, output, &block)
}

/// Run the remove command
pub fn remove(args: &RemoveArgs, format: OutputFormat) -> CliResult<()> {
    let root = load(&args.file)?;

    match path::target(&root, &args.path)? {
        Target::Map(map, key) => {
            if !map.contains(&key) {
                return Err(format!("no key {key:?}").into());
            }
            map.remove(&key)?;
        }
        Target::Seq(seq, index) => seq.remove(index)?,
    }

    let output = args.output.as_deref().unwrap_or(&args.file);
    let block = save(&root, output)?;
    report(format, "remove", &args.path, output, &block)
}

fn report(
    format: OutputFormat,
    operation: &str,
    path: &str,
    output: &Path,
    block: &Block,
) -> CliResult<()> {
    match format {
        OutputFormat::Human => {
            println!(
                "{operation} {path}: wrote {} bytes to {}",
                block.len(),
                output.display()
            );
        }
        OutputFormat::Json => {
            let value = serde_json::json!({
                "operation": operation,
                "path": path,
                "output": output.display().to_string(),
                "bytes": block.len(),
            });
            println!("{}", serde_json::to_string(&value)?);
        }
    }
    Ok(())
}
