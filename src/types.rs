use std::fmt;
use std::str::FromStr;

/// Job kind as seen by the operator. Vendor type names fold into a handful of
/// families; unknown names are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JobType {
    Backup,
    Replication,
    BackupCopy,
    SureBackup,
    Tape,
    Agent,
    FileShare,
    Other(String),
}

impl JobType {
    pub fn classify(vendor: &str) -> JobType {
        match vendor.trim().to_ascii_lowercase().as_str() {
            "backup" => JobType::Backup,
            "replica" => JobType::Replication,
            "backupsync" | "copy" | "simplebackupcopypolicy" | "simplebackupcopyworker"
            | "nasbackupcopy" => JobType::BackupCopy,
            "surebackup" => JobType::SureBackup,
            "vmtapebackup" | "filetapebackup" | "backuptotape" => JobType::Tape,
            "endpointbackup" | "epagentbackup" | "epagentpolicy" => JobType::Agent,
            "nasbackup" => JobType::FileShare,
            _ => JobType::Other(vendor.trim().to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            JobType::Backup => "Backup",
            JobType::Replication => "Replication",
            JobType::BackupCopy => "Backup Copy",
            JobType::SureBackup => "SureBackup",
            JobType::Tape => "Tape",
            JobType::Agent => "Agent",
            JobType::FileShare => "File Share",
            JobType::Other(name) => name,
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for JobType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "backup" => Ok(JobType::Backup),
            "replication" | "replica" => Ok(JobType::Replication),
            "backup-copy" | "copy" => Ok(JobType::BackupCopy),
            "surebackup" | "verification" => Ok(JobType::SureBackup),
            "tape" => Ok(JobType::Tape),
            "agent" => Ok(JobType::Agent),
            "file-share" | "nas" => Ok(JobType::FileShare),
            _ => Err(format!(
                "invalid job type {}; expected backup, replication, backup-copy, surebackup, tape, agent, or file-share",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionResult {
    Success,
    Warning,
    Failed,
    None,
}

impl SessionResult {
    pub fn parse(value: &str) -> SessionResult {
        match value.trim().to_ascii_lowercase().as_str() {
            "success" => SessionResult::Success,
            "warning" => SessionResult::Warning,
            "failed" => SessionResult::Failed,
            _ => SessionResult::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionResult::Success => "Success",
            SessionResult::Warning => "Warning",
            SessionResult::Failed => "Failed",
            SessionResult::None => "None",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Working,
    Starting,
    Stopping,
    Stopped,
    Idle,
    Other(String),
}

impl SessionState {
    pub fn parse(value: &str) -> SessionState {
        match value.trim().to_ascii_lowercase().as_str() {
            "working" => SessionState::Working,
            "starting" => SessionState::Starting,
            "stopping" => SessionState::Stopping,
            "stopped" => SessionState::Stopped,
            "idle" => SessionState::Idle,
            _ => SessionState::Other(value.trim().to_string()),
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(
            self,
            SessionState::Working | SessionState::Starting | SessionState::Stopping
        )
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunMode {
    pub dry_run: bool,
    pub assume_yes: bool,
}
