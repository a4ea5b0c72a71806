use std::io::{BufRead, Write};

use tracing::{info, warn};

use crate::backend::JobBackend;
use crate::cli::args::{StateAction, StateArgs};
use crate::cli::commands::{confirm_jobs, report_missing};
use crate::error::{Result, VbrError};
use crate::job::Job;
use crate::report::status_table;
use crate::types::RunMode;

impl StateAction {
    fn verb(&self) -> &'static str {
        match self {
            StateAction::Status => "Show",
            StateAction::Enable => "Enable",
            StateAction::Disable => "Disable",
        }
    }

    fn past(&self) -> &'static str {
        match self {
            StateAction::Status => "shown",
            StateAction::Enable => "enabled",
            StateAction::Disable => "disabled",
        }
    }
}

pub fn run_state<B: JobBackend, R: BufRead, W: Write>(
    backend: &B,
    args: StateArgs,
    run_mode: RunMode,
    input: &mut R,
    out: &mut W,
) -> Result<()> {
    let action = args.action.action();
    let selection = args.select.selection(args.all);
    if action != StateAction::Status {
        selection.require_scope(&action.verb().to_ascii_lowercase())?;
    }
    // Fetch everything so list-file names of another type are not reported missing.
    let jobs = backend.list_jobs(None)?;
    let selected = selection.apply(jobs)?;
    report_missing(out, &selected.missing)?;

    if action == StateAction::Status {
        write!(out, "{}", status_table(&selected.jobs))?;
        return Ok(());
    }

    let enable = action == StateAction::Enable;
    let (pending, settled): (Vec<Job>, Vec<Job>) = selected
        .jobs
        .into_iter()
        .partition(|job| job.enabled != enable);
    for job in &settled {
        writeln!(out, "already {}: {}", action.past(), job.name)?;
    }
    if pending.is_empty() {
        writeln!(out, "nothing to change")?;
        return Ok(());
    }

    confirm_jobs(
        action.verb(),
        &pending,
        run_mode.assume_yes || run_mode.dry_run,
        input,
        out,
    )?;

    let verb = action.verb().to_ascii_lowercase();
    let mut failed = 0;
    for job in &pending {
        if run_mode.dry_run {
            writeln!(out, "dry-run: would {} job {}", verb, job.name)?;
            continue;
        }
        let result = if enable {
            backend.enable(job)
        } else {
            backend.disable(job)
        };
        match result {
            Ok(()) => {
                info!(job = %job.name, action = %verb, "job state changed");
                writeln!(out, "{}: {}", action.past(), job.name)?;
            }
            Err(err) => {
                warn!(job = %job.name, action = %verb, error = %err, "job state change failed");
                writeln!(out, "failed to {} {}: {}", verb, job.name, err)?;
                failed += 1;
            }
        }
    }
    if failed > 0 {
        return Err(VbrError::message(format!(
            "{} of {} job(s) could not be {}",
            failed,
            pending.len(),
            action.past()
        )));
    }
    Ok(())
}
