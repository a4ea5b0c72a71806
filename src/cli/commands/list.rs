use std::io::Write;

use chrono::Utc;
use tracing::warn;

use crate::backend::JobBackend;
use crate::cli::args::ListArgs;
use crate::cli::commands::report_missing;
use crate::config::model::RuntimeConfig;
use crate::error::Result;
use crate::report::csv::write_csv;
use crate::report::{job_table, JobRow};

pub fn run_list<B: JobBackend, W: Write>(
    backend: &B,
    cfg: &RuntimeConfig,
    args: ListArgs,
    out: &mut W,
) -> Result<()> {
    let csv_path = args.csv.clone();
    let selection = args.select.selection(false);
    // Fetch everything so list-file names of another type are not reported missing.
    let jobs = backend.list_jobs(None)?;
    let selected = selection.apply(jobs)?;
    report_missing(out, &selected.missing)?;

    let now = Utc::now();
    let mut rows = Vec::with_capacity(selected.jobs.len());
    for job in &selected.jobs {
        let row = match backend.last_session(job) {
            Ok(session) => JobRow::new(job, session.as_ref(), now, &cfg.time_format),
            Err(err) => {
                warn!(job = %job.name, error = %err, "could not read last session");
                JobRow::session_unknown(job, now, &cfg.time_format)
            }
        };
        rows.push(row);
    }

    match csv_path {
        Some(path) => {
            write_csv(&path, &rows, cfg.csv_delimiter)?;
            writeln!(out, "exported {} job(s) to {}", rows.len(), path.display())?;
        }
        None => write!(out, "{}", job_table(&rows))?,
    }
    Ok(())
}
