//! Block info command - shows root kind, entry count, size and top-level children.

use palimpsest::{Block, EncodedValue, codec::ValueKind};

use super::CliResult;
use crate::cli::InfoArgs;
use crate::output::{OutputFormat, print_table};

/// Run the info command
pub fn run(args: &InfoArgs, format: OutputFormat) -> CliResult<()> {
    let block = Block::from_bytes(std::fs::read(&args.file)?)?;
    let root = block.root();
    let kind = root.kind();
    let count = kind.is_container().then(|| root.count());
    let children = children(&root);

    match format {
        OutputFormat::Human => {
            println!("File:      {}", args.file.display());
            println!("Size:      {} bytes", block.len());
            println!("Root kind: {}", kind.name());
            if let Some(count) = count {
                println!("Entries:   {count}");
                println!();
                let header = if kind == ValueKind::Map { "KEY" } else { "INDEX" };
                let rows: Vec<Vec<String>> = children
                    .iter()
                    .map(|(name, value)| {
                        vec![name.clone(), value.kind().name().to_string(), value.span().to_string()]
                    })
                    .collect();
                print_table(&[header, "KIND", "BYTES"], &rows);
            }
        }
        OutputFormat::Json => {
            let children: Vec<_> = children
                .iter()
                .map(|(name, value)| {
                    serde_json::json!({
                        "name": name,
                        "kind": value.kind().name(),
                        "bytes": value.span(),
                    })
                })
                .collect();
            let value = serde_json::json!({
                "file": args.file.display().to_string(),
                "bytes": block.len(),
                "kind": kind.name(),
                "count": count,
                "children": children,
            });
            println!("{}", serde_json::to_string(&value)?);
        }
    }
    Ok(())
}

fn children(value: &EncodedValue) -> Vec<(String, EncodedValue)> {
    match value.kind() {
        ValueKind::Map => value
            .entries()
            .map(|(key, child)| (key.to_string(), child))
            .collect(),
        ValueKind::Seq => value
            .elements()
            .enumerate()
            .map(|(index, child)| (index.to_string(), child))
            .collect(),
        _ => Vec::new(),
    }
}
