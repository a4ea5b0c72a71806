use crate::error::Result;
use crate::job::{Job, Session};
use crate::types::JobType;

pub mod powershell;

#[cfg(test)]
pub mod mock;

pub use powershell::PowerShellBackend;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StartOptions {
    /// Force an active full instead of an incremental run.
    pub full: bool,
    /// Retry only the objects that failed last time.
    pub retry: bool,
    /// Block until the session finishes.
    pub wait: bool,
}

/// The backup product's automation surface. Everything this tool knows about
/// jobs comes through these calls.
pub trait JobBackend {
    fn list_jobs(&self, job_type: Option<&JobType>) -> Result<Vec<Job>>;
    fn last_session(&self, job: &Job) -> Result<Option<Session>>;
    fn enable(&self, job: &Job) -> Result<()>;
    fn disable(&self, job: &Job) -> Result<()>;
    /// Returns the finished session when `options.wait` is set.
    fn start(&self, job: &Job, options: &StartOptions) -> Result<Option<Session>>;
}
