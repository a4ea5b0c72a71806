use chrono::{DateTime, Duration, Utc};

use crate::types::{JobType, SessionResult, SessionState};

pub mod schedule;
pub mod select;

pub use schedule::Schedule;

#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub id: String,
    pub name: String,
    pub job_type: JobType,
    pub description: String,
    pub enabled: bool,
    pub schedule: Schedule,
    pub next_run: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub result: SessionResult,
    pub state: SessionState,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

impl Session {
    /// Elapsed time of the session. Running sessions are measured up to `now`.
    pub fn duration(&self, now: DateTime<Utc>) -> Option<Duration> {
        let end = match self.end {
            Some(end) => end,
            None if self.state.is_running() => now,
            None => return None,
        };
        if end < self.start {
            return None;
        }
        Some(end - self.start)
    }
}

pub fn format_duration(duration: Duration) -> String {
    let total = duration.num_seconds().max(0);
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}
