// retime-cli/src/commands/probe.rs
//
// Implementation of the `probe` command.

use crate::cli::ProbeArgs;
use crate::output;
use anyhow::Context;
use retime_core::EngineConfig;

/// Probes the input and prints its metadata, as text or JSON.
pub fn run_probe(args: ProbeArgs, config: &EngineConfig) -> anyhow::Result<()> {
    config.validate()?;
    let metadata = retime_core::probe(&args.input, config)
        .with_context(|| format!("Failed to probe '{}'", args.input.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&metadata)?);
    } else {
        output::print_metadata(&args.input, &metadata);
    }
    Ok(())
}
