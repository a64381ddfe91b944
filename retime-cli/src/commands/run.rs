// retime-cli/src/commands/run.rs
//
// Implementation of the `run` command: re-encodes the input at the requested
// speed, reporting progress until the engine finishes or is stopped.
//
// Stopping happens from other threads: the Ctrl-C handler and the optional
// `--stop-after` timer both call `Transcoder::stop`, while this thread keeps
// consuming progress until the engine exits.

use crate::cli::RunArgs;
use crate::output;
use anyhow::{Context, anyhow};
use log::{debug, info};
use retime_core::{CoreError, EngineConfig, RunSummary, Transcoder, check_dependency};
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Exit status reported by the binary after an interrupted run.
pub const STOPPED_EXIT_CODE: u8 = 130;

/// How a run ended, when it did not fail.
#[derive(Debug)]
pub enum RunOutcome {
    Finished(RunSummary),
    Stopped,
}

impl RunOutcome {
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        match self {
            RunOutcome::Finished(_) => ExitCode::SUCCESS,
            RunOutcome::Stopped => ExitCode::from(STOPPED_EXIT_CODE),
        }
    }
}

/// Runs the `run` command.
pub fn run_retime(args: RunArgs, config: EngineConfig) -> anyhow::Result<RunOutcome> {
    let destination = args.output_path();
    check_dependency(&config.ffmpeg_path)?;
    let transcoder = Arc::new(
        Transcoder::new(&args.input, config)
            .with_context(|| format!("Failed to open '{}'", args.input.display()))?,
    );

    install_interrupt_handler(Arc::clone(&transcoder))?;

    let total = transcoder.metadata().output_duration(args.speed);
    let mut run = transcoder.run(destination, args.speed, args.format)?;
    info!(
        "Re-encoding {} into {} at {}x speed ({} expected)",
        transcoder.input().display(),
        run.destination().display(),
        args.speed,
        retime_core::format_duration(total)
    );

    if let Some(secs) = args.stop_after {
        schedule_stop(Arc::clone(&transcoder), Duration::from_secs_f64(secs));
    }

    let bar = (!args.json).then(|| output::create_progress_bar(total));
    for progress in &mut run {
        let progress = progress?;
        match &bar {
            Some(bar) => output::update_progress_bar(bar, &progress),
            None => println!("{}", serde_json::to_string(&progress)?),
        }
    }
    let result = run.finish();
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    match result {
        Ok(summary) => {
            report(args.json, "Processing finished");
            info!("Output written to {}", summary.output.display());
            Ok(RunOutcome::Finished(summary))
        }
        Err(e) if e.is_interrupted() => {
            report(args.json, "Processing stopped");
            Ok(RunOutcome::Stopped)
        }
        Err(CoreError::EngineExit { code, detail }) => Err(anyhow!(
            "Error while processing video (code {code}): {detail}"
        )),
        Err(e) => Err(e.into()),
    }
}

/// Forwards Ctrl-C to the engine. Outside a run it exits right away.
fn install_interrupt_handler(transcoder: Arc<Transcoder>) -> anyhow::Result<()> {
    ctrlc::set_handler(move || match transcoder.stop() {
        Ok(()) => debug!("Interrupt forwarded to ffmpeg"),
        Err(CoreError::NotRunning) => std::process::exit(i32::from(STOPPED_EXIT_CODE)),
        Err(e) => debug!("Could not forward interrupt: {e}"),
    })
    .context("Failed to install Ctrl-C handler")
}

fn schedule_stop(transcoder: Arc<Transcoder>, after: Duration) {
    thread::spawn(move || {
        thread::sleep(after);
        match transcoder.stop() {
            Ok(()) => info!("Stopping after {:.1}s as requested", after.as_secs_f64()),
            Err(e) => debug!("Timed stop skipped: {e}"),
        }
    });
}

/// Status lines go to stdout, or stderr when stdout carries JSON.
fn report(json: bool, message: &str) {
    if json {
        eprintln!("{message}");
    } else {
        println!("{message}");
    }
}
