//! Core configuration types.
//! - Config holds runtime settings with sensible defaults.
//! - LogLevel represents verbosity with simple parsing helpers.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use super::{
    FORCE_REMOVE_RETRIES_DEFAULT, SHELL_ESCALATED_TIMEOUT_MS_DEFAULT, SHELL_TIMEOUT_MS_DEFAULT,
};

/// Program-defined verbosity levels exposed to users/config.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Only errors
    Quiet,
    /// Informational output (default)
    #[default]
    Normal,
    /// More info (like verbose)
    Info,
    /// Debug/trace
    Debug,
}

impl LogLevel {
    /// Parse common string names into our LogLevel (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "quiet" | "error" | "none" => Some(LogLevel::Quiet),
            "normal" => Some(LogLevel::Normal),
            "info" | "verbose" | "detailed" => Some(LogLevel::Info),
            "debug" | "trace" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        f.write_str(s)
    }
}

impl FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid log level: '{s}'"))
    }
}

/// Runtime configuration for the file-operation engines.
#[derive(Debug, Clone)]
pub struct Config {
    /// Console verbosity
    pub log_level: LogLevel,
    /// Optional path to a log file
    pub log_file: Option<PathBuf>,
    /// Default source folder for "grab the last N files" transfers
    pub downloads_dir: Option<PathBuf>,
    /// Copy timestamps and permissions onto transferred files
    pub preserve_timestamps: bool,
    /// Timeout for the first shell deletion fallback
    pub shell_timeout: Duration,
    /// Timeout for the second, more forceful shell deletion fallback
    pub shell_escalated_timeout: Duration,
    /// Extra attempts made by the force-remove strategy
    pub force_remove_retries: u32,
    /// Command name → filename template
    pub templates: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Normal,
            log_file: None,
            downloads_dir: dirs::download_dir(),
            preserve_timestamps: true,
            shell_timeout: Duration::from_millis(SHELL_TIMEOUT_MS_DEFAULT),
            shell_escalated_timeout: Duration::from_millis(SHELL_ESCALATED_TIMEOUT_MS_DEFAULT),
            force_remove_retries: FORCE_REMOVE_RETRIES_DEFAULT,
            templates: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Add or replace a command → template mapping (builder style).
    pub fn with_template(mut self, command: impl Into<String>, template: impl Into<String>) -> Self {
        self.templates.insert(command.into(), template.into());
        self
    }
}
