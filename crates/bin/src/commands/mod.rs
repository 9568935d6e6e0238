//! Subcommand implementations.

use std::path::Path;

use palimpsest::{Block, Root};

pub mod dump;
pub mod edit;
pub mod from_json;
pub mod info;

pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Read and verify a block file.
pub fn load(file: &Path) -> CliResult<Root> {
    let bytes = std::fs::read(file)?;
    let root = Root::from_bytes(&bytes)?;
    tracing::debug!(file = %file.display(), size = bytes.len(), "Loaded block");
    Ok(root)
}

/// Encode `root` and write it to `file`.
pub fn save(root: &Root, file: &Path) -> CliResult<Block> {
    let block = root.encode()?;
    std::fs::write(file, block.as_bytes())?;
    tracing::info!(file = %file.display(), size = block.len(), "Wrote block");
    Ok(block)
}
