use std::io::{self, BufRead, Write};

use crate::error::{SelectionError, VbrError};
use crate::job::Job;
use crate::util::prompt::confirm;

pub mod list;
pub mod run;
pub mod state;

pub const EXIT_JOB_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;
pub const EXIT_NO_MATCH: i32 = 3;
pub const EXIT_DECLINED: i32 = 4;
pub const EXIT_JOB_WARNING: i32 = 5;

pub fn exit_code(err: &VbrError) -> i32 {
    match err {
        VbrError::Selection(SelectionError::NoMatch) => EXIT_NO_MATCH,
        VbrError::Selection(SelectionError::Declined) => EXIT_DECLINED,
        _ => EXIT_ERROR,
    }
}

pub fn exit_for_error(err: &VbrError) -> ! {
    println!("{}", err);
    std::process::exit(exit_code(err));
}

fn report_missing<W: Write>(out: &mut W, missing: &[String]) -> io::Result<()> {
    for name in missing {
        writeln!(out, "job not found: {}", name)?;
    }
    Ok(())
}

/// Lists what is about to change and asks before anything is touched.
fn confirm_jobs<R: BufRead, W: Write>(
    verb: &str,
    jobs: &[Job],
    assume_yes: bool,
    input: &mut R,
    out: &mut W,
) -> crate::error::Result<()> {
    writeln!(out, "jobs to {}:", verb.to_ascii_lowercase())?;
    for job in jobs {
        writeln!(out, "  {} ({})", job.name, job.job_type)?;
    }
    if assume_yes {
        return Ok(());
    }
    if !confirm(&format!("{} {} job(s)?", verb, jobs.len()), input, out)? {
        return Err(SelectionError::Declined.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackendError;

    #[test]
    fn exit_codes() {
        assert_eq!(exit_code(&SelectionError::NoMatch.into()), 3);
        assert_eq!(exit_code(&SelectionError::Declined.into()), 4);
        assert_eq!(
            exit_code(&SelectionError::Unfiltered("disable".to_string()).into()),
            2
        );
        let backend = BackendError::Output {
            operation: "list jobs".to_string(),
            reason: "no output".to_string(),
        };
        assert_eq!(exit_code(&backend.into()), 2);
    }
}
