//! Config module.
//! Provides configuration types, default paths, XML loading, validation,
//! and the read-only command → filename template lookup.

pub mod paths;
pub mod templates;
pub mod types;
mod validate;
pub mod xml;

pub use paths::{default_config_path, default_log_path, path_has_symlink_ancestor};
pub use templates::TemplateLookup;
pub use types::{Config, LogLevel};
pub use xml::{create_template_config, load_config, load_config_from_xml_path, parse_config_xml};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "FILEDESK_CONFIG";

/// Shell fallback timeouts, in milliseconds.
pub const SHELL_TIMEOUT_MS_DEFAULT: u64 = 1000;
pub const SHELL_ESCALATED_TIMEOUT_MS_DEFAULT: u64 = 1500;
pub const FORCE_REMOVE_RETRIES_DEFAULT: u32 = 3;
