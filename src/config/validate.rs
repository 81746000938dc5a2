//! Config validation logic.
//! Rejects settings the engines cannot honour and warns about odd-but-usable ones.

use anyhow::{bail, Result};
use tracing::{debug, warn};

use super::types::Config;

impl Config {
    /// Validate timeouts and template names.
    pub fn validate(&self) -> Result<()> {
        if self.shell_timeout.is_zero() || self.shell_escalated_timeout.is_zero() {
            bail!("shell fallback timeouts must be greater than zero");
        }
        if self.shell_escalated_timeout < self.shell_timeout {
            warn!(
                primary = ?self.shell_timeout,
                escalated = ?self.shell_escalated_timeout,
                "escalated shell timeout is shorter than the primary one"
            );
        }

        for (command, template) in &self.templates {
            if template.trim().is_empty() {
                bail!("template for command '{command}' is empty");
            }
            if template.contains(['/', '\\']) {
                bail!("template for command '{command}' contains a path separator: '{template}'");
            }
        }

        if let Some(dir) = &self.downloads_dir {
            if !dir.is_dir() {
                warn!(path = %dir.display(), "downloads_dir does not exist or is not a directory");
            }
        }

        debug!(templates = self.templates.len(), "config validated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn zero_timeout_rejected() {
        let cfg = Config {
            shell_timeout: Duration::ZERO,
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn template_with_separator_rejected() {
        let cfg = Config::default().with_template("invoice", "../escape");
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("path separator"));
    }

    #[test]
    fn default_config_is_valid() {
        Config::default().validate().unwrap();
    }
}
