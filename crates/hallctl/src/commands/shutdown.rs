//! Shutdown sequence handler.

use serde::Serialize;
use tabled::Tabled;

use hallctl_core::{RunOutcome, SessionEvent, ShutdownRun, StepOutcome, StepResult};

use crate::cli::{OutputFormat, ShutdownArgs};
use crate::error::CliError;
use crate::output;

use super::{AppContext, util};

#[derive(Tabled)]
struct StepRow {
    #[tabled(rename = "#")]
    ordinal: usize,
    #[tabled(rename = "Step")]
    step: String,
    #[tabled(rename = "Result")]
    outcome: String,
    #[tabled(rename = "Detail")]
    message: String,
}

impl StepRow {
    fn new(result: &StepResult, color: bool) -> Self {
        let outcome = result.outcome.to_string();
        Self {
            ordinal: result.name.ordinal(),
            step: result.name.to_string(),
            outcome: match result.outcome {
                StepOutcome::Success => output::paint(&outcome, true, color),
                StepOutcome::Failure => output::paint(&outcome, false, color),
                StepOutcome::Skipped => output::dim(&outcome, color),
            },
            message: result.message.clone().unwrap_or_default(),
        }
    }
}

#[derive(Serialize)]
struct RunView<'a> {
    outcome: RunOutcome,
    #[serde(flatten)]
    run: &'a ShutdownRun,
}

pub async fn handle(ctx: &AppContext, args: ShutdownArgs) -> Result<(), CliError> {
    let session = ctx.session()?;
    let venue = session.venue(&args.venue)?;

    let prompt = format!(
        "Shut down {} ({})? Playback stops and the lamp goes off.",
        venue.name, venue.id
    );
    if !util::confirm(&prompt, "shutdown", ctx.yes)? {
        return Ok(());
    }

    let live = ctx.output == OutputFormat::Table && !ctx.quiet;
    let mut events = session.events();
    let run = session.shutdown_venue(&venue.id);
    tokio::pin!(run);

    let run = loop {
        tokio::select! {
            result = &mut run => break result?,
            Ok(event) = events.recv(), if live => {
                if let SessionEvent::ShutdownStep { result, .. } = event {
                    eprintln!("  {}. {}: {}", result.name.ordinal(), result.name, result.outcome);
                }
            }
        }
    };

    let outcome = run.outcome();
    let view = RunView { outcome, run: &run };
    let out = output::render_single(ctx.output, &view, |v| {
        let rows: Vec<StepRow> = v.run.steps.iter().map(|s| StepRow::new(s, ctx.color)).collect();
        format!(
            "{}\n{} ({}): {}",
            output::render_table(&rows),
            venue.name,
            venue.id,
            output::paint(&v.outcome.to_string(), v.outcome == RunOutcome::Success, ctx.color)
        )
    })?;
    output::print_output(&out, ctx.quiet);

    match outcome {
        RunOutcome::Success => Ok(()),
        RunOutcome::CompletedWithErrors => Err(CliError::ShutdownIncomplete {
            venue: venue.id.clone(),
            failed: run.failures().count(),
        }),
    }
}
