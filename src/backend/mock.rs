use std::cell::RefCell;
use std::collections::HashMap;

use crate::backend::{JobBackend, StartOptions};
use crate::error::{BackendError, Result};
use crate::job::{Job, Session};
use crate::types::JobType;

/// In-memory backend recording every mutating call.
#[derive(Debug, Default)]
pub struct MockBackend {
    pub jobs: RefCell<Vec<Job>>,
    pub sessions: HashMap<String, Session>,
    pub calls: RefCell<Vec<String>>,
    pub failing: Option<String>,
}

impl MockBackend {
    pub fn new(jobs: Vec<Job>) -> Self {
        MockBackend {
            jobs: RefCell::new(jobs),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn set_enabled(&self, job: &Job, enabled: bool) -> Result<()> {
        let action = if enabled { "enable" } else { "disable" };
        self.check_failure(action, job)?;
        self.calls.borrow_mut().push(format!("{} {}", action, job.name));
        for stored in self.jobs.borrow_mut().iter_mut() {
            if stored.id == job.id {
                stored.enabled = enabled;
            }
        }
        Ok(())
    }

    fn check_failure(&self, operation: &str, job: &Job) -> Result<()> {
        if self.failing.as_deref() == Some(job.name.as_str()) {
            return Err(BackendError::Failed {
                operation: operation.to_string(),
                code: 1,
                stderr: format!("job {} is locked", job.name),
            }
            .into());
        }
        Ok(())
    }
}

impl JobBackend for MockBackend {
    fn list_jobs(&self, job_type: Option<&JobType>) -> Result<Vec<Job>> {
        Ok(self
            .jobs
            .borrow()
            .iter()
            .filter(|job| job_type.map_or(true, |t| &job.job_type == t))
            .cloned()
            .collect())
    }

    fn last_session(&self, job: &Job) -> Result<Option<Session>> {
        self.check_failure("last session", job)?;
        Ok(self.sessions.get(&job.name).cloned())
    }

    fn enable(&self, job: &Job) -> Result<()> {
        self.set_enabled(job, true)
    }

    fn disable(&self, job: &Job) -> Result<()> {
        self.set_enabled(job, false)
    }

    fn start(&self, job: &Job, options: &StartOptions) -> Result<Option<Session>> {
        self.check_failure("start", job)?;
        let mut call = format!("start {}", job.name);
        if options.full {
            call.push_str(" full");
        }
        if options.retry {
            call.push_str(" retry");
        }
        self.calls.borrow_mut().push(call);
        if options.wait {
            Ok(self.sessions.get(&job.name).cloned())
        } else {
            Ok(None)
        }
    }
}

pub fn job(name: &str, job_type: JobType, enabled: bool) -> Job {
    Job {
        id: format!("id-{}", name.to_lowercase().replace(' ', "-")),
        name: name.to_string(),
        job_type,
        description: String::new(),
        enabled,
        schedule: crate::job::Schedule::Manual,
        next_run: None,
    }
}
