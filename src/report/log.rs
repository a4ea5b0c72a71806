use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Local};

use crate::error::{Result, VbrError};
use crate::job::{format_duration, Job, Session};

/// One `;`-separated line per started job.
pub fn run_log_line(job: &Job, session: Option<&Session>, at: DateTime<Local>) -> String {
    let (result, duration) = match session {
        Some(session) => (
            session.result.as_str().to_string(),
            session
                .duration(at.with_timezone(&chrono::Utc))
                .map(format_duration)
                .unwrap_or_default(),
        ),
        None => ("Started".to_string(), String::new()),
    };
    format!(
        "{};{};{};{};{}",
        at.format("%Y-%m-%d %H:%M:%S"),
        job.name,
        job.job_type.label(),
        result,
        duration
    )
}

pub fn start_failure_line(job: &Job, at: DateTime<Local>) -> String {
    format!(
        "{};{};{};Failed;",
        at.format("%Y-%m-%d %H:%M:%S"),
        job.name,
        job.job_type.label()
    )
}

pub fn append_line(path: &Path, line: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| VbrError::message(format!("open log {}: {}", path.display(), e)))?;
    writeln!(file, "{}", line)
        .map_err(|e| VbrError::message(format!("write log {}: {}", path.display(), e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::Schedule;
    use crate::types::{JobType, SessionResult, SessionState};
    use chrono::{TimeZone, Utc};

    fn job() -> Job {
        Job {
            id: "a".to_string(),
            name: "Exchange".to_string(),
            job_type: JobType::Replication,
            description: String::new(),
            enabled: true,
            schedule: Schedule::Manual,
            next_run: None,
        }
    }

    #[test]
    fn line_for_finished_session() {
        let at = Local.with_ymd_and_hms(2026, 3, 1, 23, 0, 0).unwrap();
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let session = Session {
            result: SessionResult::Failed,
            state: SessionState::Stopped,
            start,
            end: Some(start + chrono::Duration::seconds(3725)),
        };
        assert_eq!(
            run_log_line(&job(), Some(&session), at),
            "2026-03-01 23:00:00;Exchange;Replication;Failed;01:02:05"
        );
    }

    #[test]
    fn line_for_async_start() {
        let at = Local.with_ymd_and_hms(2026, 3, 1, 23, 0, 0).unwrap();
        assert_eq!(
            run_log_line(&job(), None, at),
            "2026-03-01 23:00:00;Exchange;Replication;Started;"
        );
    }

    #[test]
    fn appends_lines() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("run.log");
        append_line(&path, "one").expect("append");
        append_line(&path, "two").expect("append");
        assert_eq!(std::fs::read_to_string(&path).expect("read"), "one\ntwo\n");
    }
}
