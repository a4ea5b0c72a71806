use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub powershell: Option<String>,
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub server: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default, rename = "logFile")]
    pub log_file: Option<String>,
    #[serde(default, rename = "csvDelimiter")]
    pub csv_delimiter: Option<String>,
    #[serde(default, rename = "timeFormat")]
    pub time_format: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub powershell: String,
    pub module: String,
    pub server: Option<String>,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub backend: BackendConfig,
    pub log_file: Option<String>,
    pub csv_delimiter: u8,
    pub time_format: String,
}
