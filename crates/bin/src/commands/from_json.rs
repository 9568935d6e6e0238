//! Encode a JSON file as a block.

use palimpsest::Block;

use super::CliResult;
use crate::cli::FromJsonArgs;
use crate::output::OutputFormat;

/// Run the from-json command
pub fn run(args: &FromJsonArgs, format: OutputFormat) -> CliResult<()> {
    let text = std::fs::read_to_string(&args.input)?;
    let json: serde_json::Value = serde_json::from_str(&text)?;
    let block = Block::from_json(&json)?;
    std::fs::write(&args.output, block.as_bytes())?;
    tracing::info!(file = %args.output.display(), size = block.len(), "Wrote block");

    match format {
        OutputFormat::Human => {
            println!(
                "Encoded {} ({} bytes of JSON) into {} ({} bytes)",
                args.input.display(),
                text.len(),
                args.output.display(),
                block.len()
            );
        }
        OutputFormat::Json => {
            let value = serde_json::json!({
                "input": args.input.display().to_string(),
                "output": args.output.display().to_string(),
                "bytes": block.len(),
            });
            println!("{}", serde_json::to_string(&value)?);
        }
    }
    Ok(())
}
