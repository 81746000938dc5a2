//! XML configuration support.
//! - Loads settings from config.xml (quick_xml + serde).
//! - Writes a commented template on request.
//!
//! Notes:
//! - Unknown XML fields are rejected so misconfigurations surface early.
//! - A missing config file is not an error; defaults apply.

use anyhow::{bail, Context, Result};
use quick_xml::de::from_str as from_xml_str;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use super::paths::{default_config_path, path_has_symlink_ancestor};
use super::types::{Config, LogLevel};
use super::{
    FORCE_REMOVE_RETRIES_DEFAULT, SHELL_ESCALATED_TIMEOUT_MS_DEFAULT, SHELL_TIMEOUT_MS_DEFAULT,
};
use crate::platform::write_config_secure_new;

/// Struct mirroring the XML config for deserialization.
#[derive(Debug, Deserialize)]
#[serde(rename = "config")]
#[serde(deny_unknown_fields)]
struct XmlConfig {
    log_level: Option<String>,
    log_file: Option<String>,
    downloads_dir: Option<String>,
    preserve_timestamps: Option<bool>,
    #[serde(default, deserialize_with = "de_u64_trimmed_opt")]
    shell_timeout_ms: Option<u64>,
    #[serde(default, deserialize_with = "de_u64_trimmed_opt")]
    shell_escalated_timeout_ms: Option<u64>,
    #[serde(default, deserialize_with = "de_u64_trimmed_opt")]
    force_remove_retries: Option<u64>,
    templates: Option<XmlTemplates>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct XmlTemplates {
    #[serde(rename = "template", default)]
    entries: Vec<XmlTemplate>,
}

/// `<template command="invoice">Invoice {date}</template>`
#[derive(Debug, Deserialize)]
struct XmlTemplate {
    #[serde(rename = "@command")]
    command: String,
    #[serde(rename = "$text", default)]
    name: String,
}

// Custom deserializer that trims surrounding whitespace for optional u64
fn de_u64_trimmed_opt<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s
            .parse::<u64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid number '{s}'"))),
    }
}

fn non_empty_path(s: Option<&str>) -> Option<PathBuf> {
    s.map(str::trim).filter(|t| !t.is_empty()).map(PathBuf::from)
}

// Map XmlConfig -> Config
fn xml_to_config(parsed: XmlConfig) -> Result<Config> {
    let mut cfg = Config::default();

    if let Some(s) = parsed.log_level.as_deref() {
        cfg.log_level = s.trim().parse::<LogLevel>().map_err(anyhow::Error::msg)?;
    }
    cfg.log_file = non_empty_path(parsed.log_file.as_deref());
    if let Some(dir) = non_empty_path(parsed.downloads_dir.as_deref()) {
        cfg.downloads_dir = Some(dir);
    }
    cfg.preserve_timestamps = parsed.preserve_timestamps.unwrap_or(true);
    cfg.shell_timeout =
        Duration::from_millis(parsed.shell_timeout_ms.unwrap_or(SHELL_TIMEOUT_MS_DEFAULT));
    cfg.shell_escalated_timeout = Duration::from_millis(
        parsed
            .shell_escalated_timeout_ms
            .unwrap_or(SHELL_ESCALATED_TIMEOUT_MS_DEFAULT),
    );
    cfg.force_remove_retries = match parsed.force_remove_retries {
        Some(n) => u32::try_from(n).context("force_remove_retries out of range")?,
        None => FORCE_REMOVE_RETRIES_DEFAULT,
    };

    for t in parsed.templates.map(|t| t.entries).unwrap_or_default() {
        let command = t.command.trim();
        if command.is_empty() {
            bail!("template entry is missing its command attribute");
        }
        cfg.templates.insert(command.to_string(), t.name.trim().to_string());
    }

    Ok(cfg)
}

/// Parse config XML from a string.
pub fn parse_config_xml(contents: &str) -> Result<Config> {
    let parsed: XmlConfig = from_xml_str(contents).context("parse config xml")?;
    let cfg = xml_to_config(parsed)?;
    cfg.validate()?;
    Ok(cfg)
}

/// Load a Config from a specific XML file path.
pub fn load_config_from_xml_path(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("read config xml '{}'", path.display()))?;
    parse_config_xml(&contents).with_context(|| format!("load config '{}'", path.display()))
}

/// Load the active config: `$FILEDESK_CONFIG` or the default path.
/// A missing file yields defaults.
pub fn load_config() -> Result<Config> {
    let path = default_config_path()?;
    if !path.exists() {
        debug!(path = %path.display(), "no config file; using defaults");
        return Ok(Config::default());
    }
    debug!(path = %path.display(), "loading config");
    load_config_from_xml_path(&path)
}

/// Write a commented template config at `path`. Refuses to overwrite, and
/// refuses when an ancestor is a symlink.
pub fn create_template_config(path: &Path) -> Result<()> {
    if path_has_symlink_ancestor(path)? {
        bail!(
            "Refusing to create config: ancestor of {} is a symlink",
            path.display()
        );
    }

    let content = format!(
        "<!--\n  filedesk configuration (XML)\n\n    log_level                   -> quiet | normal | info | debug\n    log_file                    -> path to log file (optional)\n    downloads_dir               -> default source folder for `transfer --last N`\n    preserve_timestamps         -> copy mtime/permissions onto transferred files\n    shell_timeout_ms            -> first shell delete fallback timeout (Windows)\n    shell_escalated_timeout_ms  -> second shell delete fallback timeout (Windows)\n    force_remove_retries        -> retries made by the force-remove step\n    templates                   -> command name to filename; {{date}} and {{stem}} expand\n-->\n<config>\n  <log_level>normal</log_level>\n  <preserve_timestamps>true</preserve_timestamps>\n  <shell_timeout_ms>{}</shell_timeout_ms>\n  <shell_escalated_timeout_ms>{}</shell_escalated_timeout_ms>\n  <force_remove_retries>{}</force_remove_retries>\n  <templates>\n    <template command=\"invoice\">Invoice {{date}}</template>\n  </templates>\n</config>\n",
        SHELL_TIMEOUT_MS_DEFAULT, SHELL_ESCALATED_TIMEOUT_MS_DEFAULT, FORCE_REMOVE_RETRIES_DEFAULT
    );

    write_config_secure_new(path, content.as_bytes())?;
    info!("Created template config at {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parses_full_config() {
        let xml = r#"<config>
  <log_level>debug</log_level>
  <log_file> /tmp/filedesk.log </log_file>
  <preserve_timestamps>false</preserve_timestamps>
  <shell_timeout_ms> 800 </shell_timeout_ms>
  <shell_escalated_timeout_ms>2000</shell_escalated_timeout_ms>
  <force_remove_retries>5</force_remove_retries>
  <templates>
    <template command="invoice">Invoice {date}</template>
    <template command="vat">VAT return {stem}.xlsx</template>
  </templates>
</config>"#;
        let cfg = parse_config_xml(xml).unwrap();
        assert_eq!(cfg.log_level, LogLevel::Debug);
        assert_eq!(cfg.log_file, Some(PathBuf::from("/tmp/filedesk.log")));
        assert!(!cfg.preserve_timestamps);
        assert_eq!(cfg.shell_timeout, Duration::from_millis(800));
        assert_eq!(cfg.shell_escalated_timeout, Duration::from_millis(2000));
        assert_eq!(cfg.force_remove_retries, 5);
        assert_eq!(cfg.templates.get("invoice").map(String::as_str), Some("Invoice {date}"));
        assert_eq!(cfg.templates.len(), 2);
    }

    #[test]
    fn empty_config_uses_defaults() {
        let cfg = parse_config_xml("<config></config>").unwrap();
        assert_eq!(cfg.shell_timeout, Duration::from_millis(SHELL_TIMEOUT_MS_DEFAULT));
        assert!(cfg.preserve_timestamps);
        assert!(cfg.templates.is_empty());
    }

    #[test]
    fn non_numeric_timeout_rejected() {
        let err = parse_config_xml("<config><shell_timeout_ms>soon</shell_timeout_ms></config>")
            .unwrap_err();
        assert!(format!("{err:#}").contains("invalid number 'soon'"), "got: {err:#}");
    }

    #[test]
    fn blank_timeout_uses_default() {
        let cfg = parse_config_xml("<config><shell_timeout_ms>  </shell_timeout_ms></config>").unwrap();
        assert_eq!(cfg.shell_timeout, Duration::from_millis(SHELL_TIMEOUT_MS_DEFAULT));
    }

    #[test]
    fn unknown_field_rejected() {
        let err = parse_config_xml("<config><colour>red</colour></config>").unwrap_err();
        assert!(format!("{err:#}").contains("unknown field"), "got: {err:#}");
    }

    #[test]
    fn template_file_round_trips_through_loader() {
        let td = tempdir().unwrap();
        let path = td.path().join("filedesk").join("config.xml");
        create_template_config(&path).unwrap();
        let cfg = load_config_from_xml_path(&path).unwrap();
        assert_eq!(cfg.templates.get("invoice").map(String::as_str), Some("Invoice {date}"));
        assert!(create_template_config(&path).is_err(), "must not overwrite");
    }
}
