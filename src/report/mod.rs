use std::fmt::Write as _;

use chrono::{DateTime, Local, Utc};
use serde::Serialize;

use crate::job::{format_duration, Job, Session};

pub mod csv;
pub mod log;

/// One job with its last session, flattened to display strings.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct JobRow {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Type")]
    pub job_type: String,
    #[serde(rename = "Enabled")]
    pub enabled: String,
    #[serde(rename = "Schedule")]
    pub schedule: String,
    #[serde(rename = "LastResult")]
    pub last_result: String,
    #[serde(rename = "LastStart")]
    pub last_start: String,
    #[serde(rename = "LastEnd")]
    pub last_end: String,
    #[serde(rename = "Duration")]
    pub duration: String,
    #[serde(rename = "NextRun")]
    pub next_run: String,
    #[serde(rename = "Description")]
    pub description: String,
}

impl JobRow {
    pub fn new(job: &Job, session: Option<&Session>, now: DateTime<Utc>, time_format: &str) -> Self {
        let (last_result, last_start, last_end, duration) = match session {
            Some(session) => {
                let result = if session.state.is_running() {
                    "Running".to_string()
                } else {
                    session.result.as_str().to_string()
                };
                (
                    result,
                    format_time(session.start, time_format),
                    session
                        .end
                        .map(|end| format_time(end, time_format))
                        .unwrap_or_default(),
                    session
                        .duration(now)
                        .map(format_duration)
                        .unwrap_or_default(),
                )
            }
            None => ("Never run".to_string(), String::new(), String::new(), String::new()),
        };
        JobRow {
            name: job.name.clone(),
            job_type: job.job_type.label().to_string(),
            enabled: enabled_label(job.enabled).to_string(),
            schedule: job.schedule.describe(),
            last_result,
            last_start,
            last_end,
            duration,
            next_run: job.next_run.clone().unwrap_or_default(),
            description: job.description.clone(),
        }
    }
}

impl JobRow {
    /// Row for a job whose last session could not be queried.
    pub fn session_unknown(job: &Job, now: DateTime<Utc>, time_format: &str) -> Self {
        let mut row = JobRow::new(job, None, now, time_format);
        row.last_result = "Unknown".to_string();
        row
    }
}

pub fn enabled_label(enabled: bool) -> &'static str {
    if enabled {
        "Enabled"
    } else {
        "Disabled"
    }
}

/// Formats in local time. An invalid format yields an empty string instead of
/// panicking; config loading rejects such formats up front.
pub fn format_time(time: DateTime<Utc>, time_format: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", time.with_timezone(&Local).format(time_format)).is_err() {
        return String::new();
    }
    out
}

/// Renders rows as a left-aligned text table.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }
    let mut out = String::new();
    let header: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    push_line(&mut out, &header, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_line(&mut out, &rule, &widths);
    for row in rows {
        push_line(&mut out, row, &widths);
    }
    out
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect();
    out.push_str(padded.join("  ").trim_end());
    out.push('\n');
}

pub fn job_table(rows: &[JobRow]) -> String {
    let headers = [
        "Name",
        "Type",
        "Enabled",
        "Schedule",
        "Last result",
        "Last start",
        "Duration",
        "Next run",
    ];
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            vec![
                row.name.clone(),
                row.job_type.clone(),
                row.enabled.clone(),
                row.schedule.clone(),
                row.last_result.clone(),
                row.last_start.clone(),
                row.duration.clone(),
                row.next_run.clone(),
            ]
        })
        .collect();
    render_table(&headers, &cells)
}

pub fn status_table(jobs: &[Job]) -> String {
    let cells: Vec<Vec<String>> = jobs
        .iter()
        .map(|job| {
            vec![
                job.name.clone(),
                job.job_type.label().to_string(),
                enabled_label(job.enabled).to_string(),
            ]
        })
        .collect();
    render_table(&["Name", "Type", "State"], &cells)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::Schedule;
    use crate::types::{JobType, SessionResult, SessionState};
    use chrono::TimeZone;

    fn job() -> Job {
        Job {
            id: "a".to_string(),
            name: "SQL Nightly".to_string(),
            job_type: JobType::BackupCopy,
            description: "databases".to_string(),
            enabled: false,
            schedule: Schedule::Continuous,
            next_run: None,
        }
    }

    #[test]
    fn row_without_session() {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap();
        let row = JobRow::new(&job(), None, now, "%Y-%m-%d");
        assert_eq!(row.job_type, "Backup Copy");
        assert_eq!(row.enabled, "Disabled");
        assert_eq!(row.schedule, "Continuously");
        assert_eq!(row.last_result, "Never run");
        assert!(row.duration.is_empty());
    }

    #[test]
    fn row_for_running_session() {
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 7, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 8, 30, 0).unwrap();
        let session = Session {
            result: SessionResult::None,
            state: SessionState::Working,
            start,
            end: None,
        };
        let row = JobRow::new(&job(), Some(&session), now, "%Y");
        assert_eq!(row.last_result, "Running");
        assert_eq!(row.duration, "01:30:00");
        assert_eq!(row.last_end, "");
    }

    #[test]
    fn bad_time_format_does_not_panic() {
        let t = Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap();
        assert_eq!(format_time(t, "%Q"), "");
    }

    #[test]
    fn table_pads_columns() {
        let table = render_table(
            &["Name", "State"],
            &[
                vec!["A".to_string(), "Enabled".to_string()],
                vec!["Longer".to_string(), "Disabled".to_string()],
            ],
        );
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "Name    State");
        assert_eq!(lines[1], "------  --------");
        assert_eq!(lines[2], "A       Enabled");
        assert_eq!(lines[3], "Longer  Disabled");
    }
}
