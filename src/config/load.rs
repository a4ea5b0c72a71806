use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use chrono::format::{Item, StrftimeItems};
use tracing::debug;

use crate::config::model::{BackendConfig, Config, RuntimeConfig};
use crate::error::{ConfigError, Result};

pub const CONFIG_FILE: &str = "/etc/vbrjobs.yaml";

const DEFAULT_POWERSHELL: &str = "powershell.exe";
const DEFAULT_MODULE: &str = "Veeam.Backup.PowerShell";
const DEFAULT_PORT: u16 = 9392;
const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Loads `path`, or the default config file when none is given. Only the
/// default file may be absent.
pub fn load_config(path: Option<&Path>) -> Result<RuntimeConfig> {
    let (path, explicit) = match path {
        Some(path) => (path, true),
        None => (Path::new(CONFIG_FILE), false),
    };
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound && !explicit => {
            debug!(path = %path.display(), "no config file; using defaults");
            return parse_runtime(Config::default());
        }
        Err(e) => {
            return Err(ConfigError::Read(path.display().to_string(), e.to_string()).into())
        }
    };
    let cfg = parse_config(&contents)?;
    debug!(path = %path.display(), "loaded config");
    parse_runtime(cfg)
}

pub fn parse_config(contents: &str) -> Result<Config> {
    if contents.trim().is_empty() {
        return Ok(Config::default());
    }
    let cfg: Config =
        serde_yaml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
    Ok(cfg)
}

fn parse_runtime(cfg: Config) -> Result<RuntimeConfig> {
    let powershell = cfg
        .powershell
        .unwrap_or_else(|| DEFAULT_POWERSHELL.to_string());
    if powershell.trim().is_empty() {
        return Err(ConfigError::Invalid("powershell executable is empty".to_string()).into());
    }
    let module = cfg.module.unwrap_or_else(|| DEFAULT_MODULE.to_string());
    if module.trim().is_empty() {
        return Err(ConfigError::Invalid("module name is empty".to_string()).into());
    }
    let port = cfg.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(ConfigError::Invalid("port must be non-zero".to_string()).into());
    }
    let server = cfg.server.filter(|s| !s.trim().is_empty());

    let csv_delimiter = match cfg.csv_delimiter.as_deref() {
        None => b',',
        Some(value) => {
            let bytes = value.as_bytes();
            if bytes.len() != 1 || !bytes[0].is_ascii() {
                return Err(ConfigError::Invalid(format!(
                    "csvDelimiter {:?} must be a single ASCII character",
                    value
                ))
                .into());
            }
            bytes[0]
        }
    };

    let time_format = cfg
        .time_format
        .unwrap_or_else(|| DEFAULT_TIME_FORMAT.to_string());
    if StrftimeItems::new(&time_format).any(|item| matches!(item, Item::Error)) {
        return Err(ConfigError::Invalid(format!(
            "timeFormat {:?} is not a valid strftime format",
            time_format
        ))
        .into());
    }

    Ok(RuntimeConfig {
        backend: BackendConfig {
            powershell,
            module,
            server,
            port,
        },
        log_file: cfg.log_file.filter(|s| !s.trim().is_empty()),
        csv_delimiter,
        time_format,
    })
}
