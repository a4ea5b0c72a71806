use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, SelectionError};
use crate::job::Job;
use crate::types::JobType;

/// Filters chosen on the command line. Every active filter must match for a
/// job to be selected.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub job_type: Option<JobType>,
    pub names: Vec<String>,
    pub list_file: Option<PathBuf>,
    pub all: bool,
}

#[derive(Debug, Clone)]
pub struct Selected {
    pub jobs: Vec<Job>,
    /// Names from the list file that no job carries.
    pub missing: Vec<String>,
}

impl Selection {
    pub fn is_filtered(&self) -> bool {
        self.job_type.is_some() || !self.names.is_empty() || self.list_file.is_some()
    }

    /// Mutating commands must not touch every job by accident.
    pub fn require_scope(&self, action: &str) -> Result<()> {
        if !self.is_filtered() && !self.all {
            return Err(SelectionError::Unfiltered(action.to_string()).into());
        }
        Ok(())
    }

    pub fn apply(&self, jobs: Vec<Job>) -> Result<Selected> {
        let listed = match &self.list_file {
            Some(path) => Some(load_list_file(path)?),
            None => None,
        };
        let listed_lower: Option<HashSet<String>> = listed
            .as_ref()
            .map(|names| names.iter().map(|n| n.to_lowercase()).collect());

        let missing = match &listed {
            Some(names) => names
                .iter()
                .filter(|name| {
                    let name = name.to_lowercase();
                    !jobs.iter().any(|job| job.name.to_lowercase() == name)
                })
                .cloned()
                .collect(),
            None => Vec::new(),
        };

        let total = jobs.len();
        let selected: Vec<Job> = jobs
            .into_iter()
            .filter(|job| match &self.job_type {
                Some(job_type) => &job.job_type == job_type,
                None => true,
            })
            .filter(|job| match &listed_lower {
                Some(names) => names.contains(&job.name.to_lowercase()),
                None => true,
            })
            .filter(|job| {
                self.names.is_empty() || self.names.iter().any(|p| wildcard_match(p, &job.name))
            })
            .collect();
        debug!(total, selected = selected.len(), "applied job selection");

        if selected.is_empty() {
            return Err(SelectionError::NoMatch.into());
        }
        Ok(Selected {
            jobs: selected,
            missing,
        })
    }
}

pub fn load_list_file(path: &Path) -> Result<Vec<String>> {
    let contents = fs::read_to_string(path)
        .map_err(|e| SelectionError::ListFile(path.display().to_string(), e.to_string()))?;
    let mut seen = HashSet::new();
    let mut names = Vec::new();
    for line in contents.lines() {
        let name = line.trim();
        if name.is_empty() || name.starts_with('#') {
            continue;
        }
        if seen.insert(name.to_lowercase()) {
            names.push(name.to_string());
        }
    }
    Ok(names)
}

/// Case-insensitive match supporting `*` and `?`.
pub fn wildcard_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.to_lowercase().chars().collect();
    let t: Vec<char> = text.to_lowercase().chars().collect();
    let (mut pi, mut ti) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;
    while ti < t.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == t[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == '*' {
            backtrack = Some((pi, ti));
            pi += 1;
        } else if let Some((star, matched)) = backtrack {
            pi = star + 1;
            ti = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }
    while pi < p.len() && p[pi] == '*' {
        pi += 1;
    }
    pi == p.len()
}
