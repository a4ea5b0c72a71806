use std::process::Command;

use tracing::debug;

use crate::error::{BackendError, Result};

#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

pub fn describe_command(cmd: &Command) -> String {
    let program = cmd.get_program().to_string_lossy();
    let args: Vec<String> = cmd
        .get_args()
        .map(|a| a.to_string_lossy().to_string())
        .collect();
    format!("{} {}", program, args.join(" "))
}

pub fn run_captured(cmd: &mut Command) -> Result<CommandOutput> {
    debug!(command = %describe_command(cmd), "running");
    let output = cmd.output().map_err(|e| BackendError::Spawn {
        program: cmd.get_program().to_string_lossy().to_string(),
        reason: e.to_string(),
    })?;
    Ok(CommandOutput {
        code: output.status.code().unwrap_or(1),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    })
}
