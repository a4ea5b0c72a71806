use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::job::select::Selection;
use crate::types::JobType;

#[derive(Parser, Debug)]
#[command(
    name = "vbrjobs",
    version,
    about = "List, enable/disable and run backup server jobs"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[arg(long, global = true)]
    pub dry_run: bool,
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
    /// Answer yes to confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Show jobs with their schedule and last session
    List(ListArgs),
    /// Show, enable or disable jobs
    State(StateArgs),
    /// Start jobs
    Run(RunArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct SelectArgs {
    /// backup, replication, backup-copy, surebackup, tape, agent or file-share
    #[arg(long = "type", value_name = "TYPE")]
    pub job_type: Option<JobType>,
    /// Job name; `*` and `?` wildcards allowed
    #[arg(long = "name", value_name = "PATTERN")]
    pub names: Vec<String>,
    /// File with one job name per line
    #[arg(long, value_name = "PATH")]
    pub list_file: Option<PathBuf>,
}

impl SelectArgs {
    pub fn selection(self, all: bool) -> Selection {
        Selection {
            job_type: self.job_type,
            names: self.names,
            list_file: self.list_file,
            all,
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    #[command(flatten)]
    pub select: SelectArgs,
    /// Export to CSV instead of printing a table
    #[arg(long, value_name = "PATH")]
    pub csv: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct StateArgs {
    #[command(flatten)]
    pub select: SelectArgs,
    /// Allow changing every job when no filter is given
    #[arg(long)]
    pub all: bool,
    #[command(flatten)]
    pub action: StateFlags,
}

#[derive(Args, Debug, Clone, Default)]
#[group(required = false, multiple = false)]
pub struct StateFlags {
    #[arg(long)]
    pub status: bool,
    #[arg(long)]
    pub enable: bool,
    #[arg(long)]
    pub disable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateAction {
    Status,
    Enable,
    Disable,
}

impl StateFlags {
    pub fn action(&self) -> StateAction {
        if self.enable {
            StateAction::Enable
        } else if self.disable {
            StateAction::Disable
        } else {
            StateAction::Status
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    #[command(flatten)]
    pub select: SelectArgs,
    /// Allow starting every job when no filter is given
    #[arg(long)]
    pub all: bool,
    /// Run an active full backup
    #[arg(long, conflicts_with = "retry")]
    pub full: bool,
    /// Retry only failed objects
    #[arg(long)]
    pub retry: bool,
    /// Start asynchronously and do not wait for the session
    #[arg(long)]
    pub no_wait: bool,
    /// Append one line per started job to this file
    #[arg(long, value_name = "PATH")]
    pub log: Option<PathBuf>,
}
