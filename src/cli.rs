//! CLI definition and parsing.
//! Defines Args and provides parse() for command-line handling.
//!
//! Notes:
//! - --debug is a shorthand for --log-level debug.
//! - --json switches command output (not logs) to JSON on stdout; logs always
//!   go to stderr.

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueHint};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::types::{Config, LogLevel};

/// File operations for the desktop file shell, scriptable from the command line.
/// CLI flags override config values (which are loaded from XML if present).
#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Resilient file operations: list, delete, mkdir, rename, transfer",
    arg_required_else_help = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Enable debug logging (equivalent to `--log-level debug`).
    #[arg(
        short = 'd',
        long,
        global = true,
        help = "Enable debug logging (shorthand for --log-level debug)"
    )]
    pub debug: bool,

    /// Set log level. One of: quiet, normal, info, debug.
    #[arg(long, global = true, help = "Set log level: quiet, normal, info, debug")]
    pub log_level: Option<String>,

    /// Print command results as JSON on stdout.
    #[arg(long, global = true, help = "Print results as JSON")]
    pub json: bool,

    /// Emit logs in structured JSON (stderr and log file).
    #[arg(long, global = true, help = "Emit logs in structured JSON")]
    pub json_logs: bool,

    /// Print where filedesk looks for its config file, then exit.
    #[arg(long, help = "Print the config file location and exit")]
    pub print_config: bool,

    /// Write a commented template config at the config location, then exit.
    #[arg(long, help = "Write a template config file and exit")]
    pub init_config: bool,

    /// Override the first shell delete fallback timeout.
    #[arg(long, global = true, value_name = "MS")]
    pub shell_timeout_ms: Option<u64>,

    /// Override the escalated shell delete fallback timeout.
    #[arg(long, global = true, value_name = "MS")]
    pub shell_escalated_timeout_ms: Option<u64>,

    /// Do not copy timestamps and permissions onto transferred files.
    #[arg(long, global = true)]
    pub no_preserve_timestamps: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List a folder: folders first, then files, by name.
    List {
        #[arg(value_hint = ValueHint::DirPath)]
        dir: PathBuf,
        /// Show only the N most recently modified files.
        #[arg(long, value_name = "N")]
        recent: Option<usize>,
    },
    /// Delete files or folders, escalating past locks where possible.
    Delete {
        #[arg(required = true, value_hint = ValueHint::AnyPath)]
        paths: Vec<PathBuf>,
    },
    /// Create a folder and any missing parents.
    Mkdir {
        #[arg(value_hint = ValueHint::DirPath)]
        path: PathBuf,
    },
    /// Rename or move a single item. Never replaces an existing one.
    Rename {
        #[arg(value_hint = ValueHint::AnyPath)]
        from: PathBuf,
        #[arg(value_hint = ValueHint::AnyPath)]
        to: PathBuf,
    },
    /// Move files into a folder (copy, verify, remove original).
    Transfer {
        /// Files to move, in order. The first may be renamed.
        #[arg(value_hint = ValueHint::FilePath, required_unless_present = "last")]
        sources: Vec<PathBuf>,
        /// Destination folder.
        #[arg(long, short = 't', value_hint = ValueHint::DirPath)]
        to: PathBuf,
        /// New name for the first file; its extension is kept.
        #[arg(long)]
        rename: Option<String>,
        /// Name the first file from this command's configured template.
        #[arg(long)]
        command: Option<String>,
        /// Check every file without changing anything.
        #[arg(long)]
        preview: bool,
        /// Take the N most recently modified files from --from (or the
        /// configured downloads folder), newest first.
        #[arg(long, value_name = "N", conflicts_with = "sources")]
        last: Option<usize>,
        /// Folder used by --last.
        #[arg(long, value_hint = ValueHint::DirPath, requires = "last")]
        from: Option<PathBuf>,
        /// Date used for {date} in templates (YYYY-MM-DD); defaults to today.
        #[arg(long, value_name = "YYYY-MM-DD")]
        date: Option<NaiveDate>,
    },
}

impl Args {
    /// Effective log level derived from flags.
    /// Precedence: --debug > --log-level value > None (use config default).
    pub fn effective_log_level(&self) -> Option<LogLevel> {
        if self.debug {
            return Some(LogLevel::Debug);
        }
        self.log_level.as_deref().and_then(LogLevel::parse)
    }

    /// Apply CLI overrides to a loaded Config (in-place). No-ops for unset flags.
    pub fn apply_overrides(&self, cfg: &mut Config) {
        if let Some(level) = self.effective_log_level() {
            cfg.log_level = level;
        }
        if let Some(ms) = self.shell_timeout_ms {
            cfg.shell_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.shell_escalated_timeout_ms {
            cfg.shell_escalated_timeout = Duration::from_millis(ms);
        }
        if self.no_preserve_timestamps {
            cfg.preserve_timestamps = false;
        }
    }
}

pub fn parse() -> Args {
    Args::parse()
}
