use std::process::Command;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::backend::{JobBackend, StartOptions};
use crate::config::model::BackendConfig;
use crate::error::{BackendError, Result};
use crate::job::schedule::{DailyKind, MonthlyDay, PeriodUnit, ScheduleOptions};
use crate::job::{Job, Schedule, Session};
use crate::types::{JobType, SessionResult, SessionState};
use crate::util::command::run_captured;

/// Helpers shared by every generated script. Times leave PowerShell as UTC
/// ISO-8601; the vendor's "never" (year 1900) becomes null.
const HELPERS: &str = r#"
function Format-VbrTime($t) {
    if ($null -eq $t -or $t.Year -lt 1971) { return $null }
    return $t.ToUniversalTime().ToString('yyyy-MM-ddTHH:mm:ssZ')
}
function ConvertTo-VbrSession($s) {
    if ($null -eq $s) { return $null }
    return [pscustomobject]@{
        result = [string]$s.Result
        state = [string]$s.State
        start = Format-VbrTime $s.CreationTime
        end = Format-VbrTime $s.EndTime
    }
}
function Get-VbrTarget($id, $kind) {
    if ($kind -eq 'SureBackup') { $job = Get-VBRSureBackupJob -Id $id }
    else { $job = Get-VBRJob | Where-Object { $_.Id.ToString() -eq $id } | Select-Object -First 1 }
    if ($null -eq $job) { throw "job $id not found" }
    return $job
}
"#;

const LIST_JOBS: &str = r#"
$all = @(Get-VBRJob)
$items = @()
foreach ($job in $all) {
    $s = $job.ScheduleOptions
    $prev = $null
    if ($s.OptionsScheduleAfterJob.IsEnabled) {
        $prev = ($all | Where-Object { $_.Id -eq $job.PreviousJobIdInScheduleChain } | Select-Object -First 1).Name
    }
    $items += [pscustomobject]@{
        id = $job.Id.ToString()
        name = $job.Name
        jobType = [string]$job.JobType
        description = [string]$job.Description
        enabled = [bool]$job.IsScheduleEnabled
        nextRun = [string]$s.NextRun
        schedule = [pscustomobject]@{
            runManually = [bool]$job.Options.JobOptions.RunManually
            afterJob = $prev
            continuous = [bool]$s.OptionsContinuous.Enabled
            periodicEnabled = [bool]$s.OptionsPeriodically.Enabled
            periodicKind = [string]$s.OptionsPeriodically.Kind
            periodicPeriod = [int]$s.OptionsPeriodically.FullPeriod
            monthlyEnabled = [bool]$s.OptionsMonthly.Enabled
            monthlyTime = $s.OptionsMonthly.TimeLocal.ToString('HH:mm')
            monthlyDayNumber = [string]$s.OptionsMonthly.DayNumberInMonth
            monthlyDayOfWeek = [string]$s.OptionsMonthly.DayOfWeek
            monthlyDayOfMonth = [string]$s.OptionsMonthly.DayOfMonth
            monthlyMonths = @($s.OptionsMonthly.Months | ForEach-Object { [string]$_ })
            dailyEnabled = [bool]$s.OptionsDaily.Enabled
            dailyKind = [string]$s.OptionsDaily.Kind
            dailyTime = $s.OptionsDaily.TimeLocal.ToString('HH:mm')
            dailyDays = @($s.OptionsDaily.Days | ForEach-Object { [string]$_ })
        }
    }
}
if (Get-Command Get-VBRSureBackupJob -ErrorAction SilentlyContinue) {
    foreach ($job in @(Get-VBRSureBackupJob)) {
        $items += [pscustomobject]@{
            id = $job.Id.ToString()
            name = $job.Name
            jobType = 'SureBackup'
            description = [string]$job.Description
            enabled = [bool]$job.IsEnabled
            nextRun = [string]$job.NextRun
            schedule = [pscustomobject]@{ runManually = -not [bool]$job.ScheduleEnabled }
        }
    }
}
ConvertTo-Json -InputObject @($items) -Depth 5 -Compress
"#;

pub struct PowerShellBackend {
    config: BackendConfig,
}

impl PowerShellBackend {
    pub fn new(config: BackendConfig) -> Self {
        PowerShellBackend { config }
    }

    /// Loads the vendor module and opens the server connection.
    fn preamble(&self) -> String {
        let mut script = String::new();
        script.push_str("$ErrorActionPreference = 'Stop'\n");
        script.push_str("$ProgressPreference = 'SilentlyContinue'\n");
        script.push_str(&format!(
            "Import-Module {} -WarningAction SilentlyContinue -ErrorAction SilentlyContinue\n",
            ps_quote(&self.config.module)
        ));
        script.push_str(
            "if (-not (Get-Command Get-VBRJob -ErrorAction SilentlyContinue)) { Add-PSSnapin VeeamPSSnapin }\n",
        );
        if let Some(server) = &self.config.server {
            script.push_str(&format!(
                "Connect-VBRServer -Server {} -Port {}\n",
                ps_quote(server),
                self.config.port
            ));
        }
        script.push_str(HELPERS);
        script
    }

    pub fn script(&self, body: &str) -> String {
        format!("{}{}", self.preamble(), body)
    }

    fn invoke(&self, operation: &str, body: &str) -> Result<String> {
        let mut cmd = Command::new(&self.config.powershell);
        cmd.arg("-NoProfile")
            .arg("-NonInteractive")
            .arg("-ExecutionPolicy")
            .arg("Bypass")
            .arg("-Command")
            .arg(self.script(body));
        debug!(operation, "invoking backup server automation");
        let output = run_captured(&mut cmd)?;
        if output.code != 0 {
            return Err(BackendError::Failed {
                operation: operation.to_string(),
                code: output.code,
                stderr: output.stderr,
            }
            .into());
        }
        if !output.stderr.is_empty() {
            warn!(operation, stderr = %output.stderr, "backend wrote to stderr");
        }
        Ok(output.stdout)
    }

    fn invoke_json<T: DeserializeOwned>(&self, operation: &str, body: &str) -> Result<T> {
        let stdout = self.invoke(operation, body)?;
        parse_json(operation, &stdout)
    }
}

impl JobBackend for PowerShellBackend {
    fn list_jobs(&self, job_type: Option<&JobType>) -> Result<Vec<Job>> {
        let raw: Vec<RawJob> = self.invoke_json("list jobs", LIST_JOBS)?;
        let jobs: Vec<Job> = raw
            .into_iter()
            .map(RawJob::into_job)
            .filter(|job| job_type.map_or(true, |t| &job.job_type == t))
            .collect();
        debug!(count = jobs.len(), "listed jobs");
        Ok(jobs)
    }

    fn last_session(&self, job: &Job) -> Result<Option<Session>> {
        let body = if job.job_type == JobType::SureBackup {
            format!(
                "{}\n$session = Get-VBRSureBackupSession | Where-Object {{ $_.JobId -eq $job.Id }} | Sort-Object CreationTime -Descending | Select-Object -First 1\n{}",
                target(job),
                EMIT_SESSION
            )
        } else {
            format!(
                "{}\n$session = $job.FindLastSession()\n{}",
                target(job),
                EMIT_SESSION
            )
        };
        let raw: Option<RawSession> = self.invoke_json("last session", &body)?;
        raw.map(|s| s.into_session("last session")).transpose()
    }

    fn enable(&self, job: &Job) -> Result<()> {
        let cmdlet = if job.job_type == JobType::SureBackup {
            "Enable-VBRSureBackupJob"
        } else {
            "Enable-VBRJob"
        };
        let body = format!("{}\n{} -Job $job | Out-Null\n", target(job), cmdlet);
        self.invoke("enable job", &body)?;
        Ok(())
    }

    fn disable(&self, job: &Job) -> Result<()> {
        let cmdlet = if job.job_type == JobType::SureBackup {
            "Disable-VBRSureBackupJob"
        } else {
            "Disable-VBRJob"
        };
        let body = format!("{}\n{} -Job $job | Out-Null\n", target(job), cmdlet);
        self.invoke("disable job", &body)?;
        Ok(())
    }

    fn start(&self, job: &Job, options: &StartOptions) -> Result<Option<Session>> {
        let body = start_body(job, options);
        if !options.wait {
            self.invoke("start job", &body)?;
            return Ok(None);
        }
        let raw: Option<RawSession> = self.invoke_json("start job", &body)?;
        raw.map(|s| s.into_session("start job")).transpose()
    }
}

const EMIT_SESSION: &str =
    "ConvertTo-Json -InputObject (ConvertTo-VbrSession $session) -Depth 3 -Compress\n";

fn target(job: &Job) -> String {
    let kind = if job.job_type == JobType::SureBackup {
        "SureBackup"
    } else {
        "Job"
    };
    format!("$job = Get-VbrTarget {} {}", ps_quote(&job.id), ps_quote(kind))
}

fn start_body(job: &Job, options: &StartOptions) -> String {
    let mut body = target(job);
    body.push('\n');
    if job.job_type == JobType::SureBackup {
        if options.full || options.retry {
            warn!(job = %job.name, "full/retry do not apply to SureBackup jobs; ignoring");
        }
        body.push_str("$null = Start-VBRSureBackupJob -Job $job");
    } else {
        body.push_str("$null = Start-VBRJob -Job $job");
        if options.full {
            body.push_str(" -FullBackup");
        }
        if options.retry {
            body.push_str(" -RetryBackup");
        }
    }
    if !options.wait {
        body.push_str(" -RunAsync\n");
        return body;
    }
    body.push('\n');
    if job.job_type == JobType::SureBackup {
        body.push_str("$session = Get-VBRSureBackupSession | Where-Object { $_.JobId -eq $job.Id } | Sort-Object CreationTime -Descending | Select-Object -First 1\n");
    } else {
        body.push_str("$session = $job.FindLastSession()\n");
    }
    body.push_str(EMIT_SESSION);
    body
}

/// Single-quoted PowerShell literal; embedded quotes are doubled.
pub fn ps_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Parses the last non-empty stdout line; module banners and warnings may
/// precede it.
pub fn parse_json<T: DeserializeOwned>(operation: &str, stdout: &str) -> Result<T> {
    let line = stdout
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .ok_or_else(|| BackendError::Output {
            operation: operation.to_string(),
            reason: "no output".to_string(),
        })?;
    serde_json::from_str(line).map_err(|e| {
        BackendError::Output {
            operation: operation.to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawJob {
    id: String,
    name: String,
    job_type: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    enabled: bool,
    #[serde(default)]
    next_run: Option<String>,
    #[serde(default)]
    schedule: RawSchedule,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawSchedule {
    run_manually: bool,
    after_job: Option<String>,
    continuous: bool,
    periodic_enabled: bool,
    periodic_kind: Option<String>,
    periodic_period: u32,
    monthly_enabled: bool,
    monthly_time: Option<String>,
    monthly_day_number: Option<String>,
    monthly_day_of_week: Option<String>,
    monthly_day_of_month: Option<String>,
    monthly_months: Vec<String>,
    daily_enabled: bool,
    daily_kind: Option<String>,
    daily_time: Option<String>,
    daily_days: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawSession {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    start: Option<DateTime<Utc>>,
    #[serde(default)]
    end: Option<DateTime<Utc>>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl RawJob {
    fn into_job(self) -> Job {
        Job {
            id: self.id,
            name: self.name,
            job_type: JobType::classify(&self.job_type),
            description: self.description.unwrap_or_default(),
            enabled: self.enabled,
            schedule: Schedule::from_options(&self.schedule.into_options()),
            next_run: non_empty(self.next_run),
        }
    }
}

impl RawSchedule {
    fn into_options(self) -> ScheduleOptions {
        let periodic = if self.periodic_enabled && self.periodic_period > 0 {
            let hours = self
                .periodic_kind
                .as_deref()
                .map_or(false, |k| k.eq_ignore_ascii_case("hours"));
            // The vendor reports the period in minutes regardless of kind.
            if hours && self.periodic_period % 60 == 0 {
                Some((self.periodic_period / 60, PeriodUnit::Hours))
            } else {
                Some((self.periodic_period, PeriodUnit::Minutes))
            }
        } else {
            None
        };

        let monthly = if self.monthly_enabled {
            let time = self.monthly_time.unwrap_or_default();
            let ordinal = non_empty(self.monthly_day_number).unwrap_or_default();
            let day = if ordinal.eq_ignore_ascii_case("onday") {
                let digits: String = self
                    .monthly_day_of_month
                    .unwrap_or_default()
                    .chars()
                    .filter(|c| c.is_ascii_digit())
                    .collect();
                MonthlyDay::OnDay(digits.parse().unwrap_or(1))
            } else {
                MonthlyDay::Weekday {
                    ordinal,
                    weekday: self.monthly_day_of_week.unwrap_or_default(),
                }
            };
            Some((time, day, self.monthly_months))
        } else {
            None
        };

        let daily = if self.daily_enabled {
            let kind = match self.daily_kind.as_deref().map(str::to_ascii_lowercase).as_deref() {
                Some("weekdays") => DailyKind::WeekDays,
                Some("selecteddays") => DailyKind::SelectedDays(self.daily_days),
                _ => DailyKind::Everyday,
            };
            Some((self.daily_time.unwrap_or_default(), kind))
        } else {
            None
        };

        ScheduleOptions {
            run_manually: self.run_manually,
            after_job: non_empty(self.after_job),
            continuous: self.continuous,
            periodic,
            monthly,
            daily,
        }
    }
}

impl RawSession {
    fn into_session(self, operation: &str) -> Result<Session> {
        let start = self.start.ok_or_else(|| BackendError::Output {
            operation: operation.to_string(),
            reason: "session has no start time".to_string(),
        })?;
        // An end before the start means the session is still running.
        let end = self.end.filter(|end| *end >= start);
        Ok(Session {
            result: SessionResult::parse(self.result.as_deref().unwrap_or_default()),
            state: SessionState::parse(self.state.as_deref().unwrap_or_default()),
            start,
            end,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VbrError;
    use chrono::TimeZone;

    fn backend(server: Option<&str>) -> PowerShellBackend {
        PowerShellBackend::new(BackendConfig {
            powershell: "powershell.exe".to_string(),
            module: "Veeam.Backup.PowerShell".to_string(),
            server: server.map(str::to_string),
            port: 9392,
        })
    }

    fn job(name: &str, job_type: JobType) -> Job {
        Job {
            id: "6c1b1e2a-0000-4000-8000-000000000001".to_string(),
            name: name.to_string(),
            job_type,
            description: String::new(),
            enabled: true,
            schedule: Schedule::Manual,
            next_run: None,
        }
    }

    #[test]
    fn quoting_doubles_single_quotes() {
        assert_eq!(ps_quote("O'Brien's job"), "'O''Brien''s job'");
    }

    #[test]
    fn preamble_connects_only_with_server() {
        assert!(!backend(None).script("").contains("Connect-VBRServer"));
        let script = backend(Some("vbr01")).script("");
        assert!(script.contains("Connect-VBRServer -Server 'vbr01' -Port 9392"));
    }

    #[test]
    fn start_body_flags() {
        let options = StartOptions {
            full: true,
            retry: false,
            wait: false,
        };
        let body = start_body(&job("Nightly", JobType::Backup), &options);
        assert!(body.contains("Start-VBRJob -Job $job -FullBackup -RunAsync"));
        assert!(!body.contains("FindLastSession"));

        let waited = start_body(
            &job("Verify", JobType::SureBackup),
            &StartOptions {
                wait: true,
                ..Default::default()
            },
        );
        assert!(waited.contains("Start-VBRSureBackupJob -Job $job\n"));
        assert!(waited.contains("ConvertTo-VbrSession"));
    }

    #[test]
    fn parses_job_listing() {
        let stdout = r#"WARNING: module banner
[{"id":"a","name":"SQL Nightly","jobType":"Backup","description":"db","enabled":true,"nextRun":"02.03.2026 22:00:00","schedule":{"runManually":false,"afterJob":null,"continuous":false,"periodicEnabled":false,"periodicKind":"Hours","periodicPeriod":0,"monthlyEnabled":false,"monthlyTime":"22:00","monthlyDayNumber":"Fourth","monthlyDayOfWeek":"Saturday","monthlyDayOfMonth":"1","monthlyMonths":[],"dailyEnabled":true,"dailyKind":"SelectedDays","dailyTime":"22:00","dailyDays":["Monday","Friday"]}},{"id":"b","name":"Verify","jobType":"SureBackup","description":"","enabled":false,"nextRun":"","schedule":{"runManually":true}}]
"#;
        let raw: Vec<RawJob> = parse_json("list jobs", stdout).expect("parse");
        let jobs: Vec<Job> = raw.into_iter().map(RawJob::into_job).collect();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].job_type, JobType::Backup);
        assert_eq!(jobs[0].schedule.describe(), "Daily at 22:00 on Mon, Fri");
        assert_eq!(jobs[0].next_run.as_deref(), Some("02.03.2026 22:00:00"));
        assert_eq!(jobs[1].job_type, JobType::SureBackup);
        assert_eq!(jobs[1].schedule, Schedule::Manual);
        assert!(jobs[1].next_run.is_none());
    }

    #[test]
    fn periodic_minutes_fold_into_hours() {
        let raw = RawSchedule {
            periodic_enabled: true,
            periodic_kind: Some("Hours".to_string()),
            periodic_period: 240,
            ..Default::default()
        };
        assert_eq!(
            Schedule::from_options(&raw.into_options()).describe(),
            "Every 4 hours"
        );
    }

    #[test]
    fn monthly_on_day_reads_digits() {
        let raw = RawSchedule {
            monthly_enabled: true,
            monthly_time: Some("03:00".to_string()),
            monthly_day_number: Some("OnDay".to_string()),
            monthly_day_of_month: Some("15".to_string()),
            ..Default::default()
        };
        assert_eq!(
            Schedule::from_options(&raw.into_options()).describe(),
            "Monthly at 03:00 on day 15"
        );
    }

    #[test]
    fn parses_session_and_null() {
        let raw: Option<RawSession> = parse_json(
            "last session",
            r#"{"result":"Warning","state":"Stopped","start":"2026-03-01T22:00:00Z","end":"2026-03-01T22:30:00Z"}"#,
        )
        .expect("parse");
        let session = raw.unwrap().into_session("last session").expect("session");
        assert_eq!(session.result, SessionResult::Warning);
        assert_eq!(session.start, Utc.with_ymd_and_hms(2026, 3, 1, 22, 0, 0).unwrap());

        let none: Option<RawSession> = parse_json("last session", "null\n").expect("parse");
        assert!(none.is_none());
    }

    #[test]
    fn inverted_end_means_still_running() {
        let raw: Option<RawSession> = parse_json(
            "last session",
            r#"{"result":"None","state":"Working","start":"2026-03-01T22:00:00Z","end":"2026-02-28T22:30:00Z"}"#,
        )
        .expect("parse");
        let session = raw.unwrap().into_session("last session").expect("session");
        assert!(session.end.is_none());
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 22, 5, 0).unwrap();
        assert_eq!(session.duration(now), Some(chrono::Duration::minutes(5)));
    }

    #[test]
    fn empty_output_is_an_error() {
        let err = parse_json::<Vec<RawJob>>("list jobs", "\n\n").unwrap_err();
        assert!(matches!(err, VbrError::Backend(BackendError::Output { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn invoke_reports_exit_code_and_stderr() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let shell = dir.path().join("fake-powershell");
        std::fs::write(&shell, "#!/bin/sh\necho 'Connect-VBRServer: access denied' >&2\nexit 1\n")
            .expect("write");
        std::fs::set_permissions(&shell, std::fs::Permissions::from_mode(0o755)).expect("chmod");

        let backend = PowerShellBackend::new(BackendConfig {
            powershell: shell.to_string_lossy().to_string(),
            module: "Veeam.Backup.PowerShell".to_string(),
            server: None,
            port: 9392,
        });
        let err = backend.list_jobs(None).unwrap_err();
        match err {
            VbrError::Backend(BackendError::Failed { code, stderr, .. }) => {
                assert_eq!(code, 1);
                assert!(stderr.contains("access denied"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn invoke_parses_fake_listing() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let shell = dir.path().join("fake-powershell");
        std::fs::write(
            &shell,
            "#!/bin/sh\necho '[{\"id\":\"a\",\"name\":\"Copy\",\"jobType\":\"BackupSync\",\"enabled\":true},{\"id\":\"b\",\"name\":\"Main\",\"jobType\":\"Backup\",\"enabled\":true}]'\n",
        )
        .expect("write");
        std::fs::set_permissions(&shell, std::fs::Permissions::from_mode(0o755)).expect("chmod");

        let backend = PowerShellBackend::new(BackendConfig {
            powershell: shell.to_string_lossy().to_string(),
            module: "Veeam.Backup.PowerShell".to_string(),
            server: None,
            port: 9392,
        });
        let copies = backend.list_jobs(Some(&JobType::BackupCopy)).expect("list");
        assert_eq!(copies.len(), 1);
        assert_eq!(copies[0].name, "Copy");
    }
}
