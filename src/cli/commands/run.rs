use std::io::{BufRead, Write};
use std::path::PathBuf;

use chrono::{Local, Utc};
use tracing::{info, warn};

use crate::backend::{JobBackend, StartOptions};
use crate::cli::args::RunArgs;
use crate::cli::commands::{confirm_jobs, report_missing, EXIT_JOB_FAILED, EXIT_JOB_WARNING};
use crate::error::{Result, SelectionError};
use crate::job::{format_duration, Job};
use crate::report::log::{append_line, run_log_line, start_failure_line};
use crate::types::{RunMode, SessionResult};

/// Starts the selected jobs one after another and returns the process exit
/// code for the worst outcome.
pub fn run_jobs<B: JobBackend, R: BufRead, W: Write>(
    backend: &B,
    args: RunArgs,
    log_file: Option<PathBuf>,
    run_mode: RunMode,
    input: &mut R,
    out: &mut W,
) -> Result<i32> {
    let options = StartOptions {
        full: args.full,
        retry: args.retry,
        wait: !args.no_wait,
    };
    let log_file = args.log.clone().or(log_file);
    let selection = args.select.selection(args.all);
    selection.require_scope("run")?;
    // Fetch everything so list-file names of another type are not reported missing.
    let jobs = backend.list_jobs(None)?;
    let selected = selection.apply(jobs)?;
    report_missing(out, &selected.missing)?;

    let (runnable, disabled): (Vec<Job>, Vec<Job>) =
        selected.jobs.into_iter().partition(|job| job.enabled);
    for job in &disabled {
        writeln!(out, "job disabled: {}; skipping", job.name)?;
    }
    if runnable.is_empty() {
        return Err(SelectionError::NoMatch.into());
    }

    confirm_jobs(
        "Start",
        &runnable,
        run_mode.assume_yes || run_mode.dry_run,
        input,
        out,
    )?;

    let mut outcomes = Vec::with_capacity(runnable.len());
    for job in &runnable {
        if run_mode.dry_run {
            writeln!(out, "dry-run: would start job {}{}", job.name, mode_suffix(&options))?;
            continue;
        }
        writeln!(out, "starting {}{}", job.name, mode_suffix(&options))?;
        info!(job = %job.name, full = options.full, retry = options.retry, wait = options.wait, "starting job");
        let line = match backend.start(job, &options) {
            Ok(Some(session)) => {
                let duration = session
                    .duration(Utc::now())
                    .map(format_duration)
                    .unwrap_or_default();
                writeln!(out, "{}: {} {}", job.name, session.result.as_str(), duration)?;
                outcomes.push(session.result);
                run_log_line(job, Some(&session), Local::now())
            }
            Ok(None) => {
                writeln!(out, "{}: started", job.name)?;
                outcomes.push(SessionResult::Success);
                run_log_line(job, None, Local::now())
            }
            Err(err) => {
                warn!(job = %job.name, error = %err, "start failed");
                writeln!(out, "failed to start {}: {}", job.name, err)?;
                outcomes.push(SessionResult::Failed);
                start_failure_line(job, Local::now())
            }
        };
        if let Some(path) = &log_file {
            if let Err(err) = append_line(path, &line) {
                warn!(job = %job.name, error = %err, "could not write run log");
                writeln!(out, "warning: {}", err)?;
            }
        }
    }
    Ok(exit_code_for(&outcomes))
}

fn mode_suffix(options: &StartOptions) -> &'static str {
    match (options.full, options.retry) {
        (true, _) => " (active full)",
        (_, true) => " (retry)",
        _ => "",
    }
}

pub fn exit_code_for(outcomes: &[SessionResult]) -> i32 {
    if outcomes.contains(&SessionResult::Failed) {
        EXIT_JOB_FAILED
    } else if outcomes.contains(&SessionResult::Warning) {
        EXIT_JOB_WARNING
    } else {
        0
    }
}
