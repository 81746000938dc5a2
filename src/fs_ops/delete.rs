//! Deletion engine.
//!
//! Strategies run in a fixed order and stop at the first success:
//!
//! 1. `DirectRemove`: unlink / recursive remove.
//! 2. `PermissionReset` (files): clear read-only, unlink again.
//! 3. `ForceRemoveApi`: clear read-only across the tree, remove with retries.
//! 4. `PlatformShellFallback` (files, only after lock-type failures): the
//!    configured OS utilities, each under a hard timeout.
//!
//! Only `FileInUse`, `FileBusy` and `DirectoryNotEmpty` escalate. Any other
//! failure is terminal at the step that produced it.

use serde::Serialize;
use std::fmt;
use std::io;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::backend::{FileSystem, RealFs};
use crate::config::{Config, FORCE_REMOVE_RETRIES_DEFAULT};
use crate::errors::{ErrorKind, FsOpError};
use crate::platform::{default_fallbacks, FallbackStep};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DeleteStrategy {
    DirectRemove,
    PermissionReset,
    ForceRemoveApi,
    PlatformShellFallback,
}

impl DeleteStrategy {
    /// Escalation order.
    pub const LADDER: [DeleteStrategy; 4] = [
        DeleteStrategy::DirectRemove,
        DeleteStrategy::PermissionReset,
        DeleteStrategy::ForceRemoveApi,
        DeleteStrategy::PlatformShellFallback,
    ];
}

impl fmt::Display for DeleteStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeleteStrategy::DirectRemove => "direct-remove",
            DeleteStrategy::PermissionReset => "permission-reset",
            DeleteStrategy::ForceRemoveApi => "force-remove",
            DeleteStrategy::PlatformShellFallback => "shell-fallback",
        })
    }
}

/// One rung tried; `error` is `None` when it succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StrategyAttempt {
    pub strategy: DeleteStrategy,
    pub error: Option<ErrorKind>,
}

/// Result of one `delete` call. Built fresh per call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletionOutcome {
    pub succeeded: bool,
    /// The strategy that succeeded, or the last one attempted.
    pub strategy_used: DeleteStrategy,
    pub failure_reason: Option<ErrorKind>,
    pub hint: Option<String>,
    pub attempts: Vec<StrategyAttempt>,
}

impl DeletionOutcome {
    fn success(strategy: DeleteStrategy, attempts: Vec<StrategyAttempt>) -> Self {
        Self {
            succeeded: true,
            strategy_used: strategy,
            failure_reason: None,
            hint: None,
            attempts,
        }
    }

    fn failure(strategy: DeleteStrategy, kind: ErrorKind, attempts: Vec<StrategyAttempt>) -> Self {
        Self {
            succeeded: false,
            strategy_used: strategy,
            failure_reason: Some(kind),
            hint: Some(kind.hint().to_string()),
            attempts,
        }
    }

    /// True when the path did not exist to begin with.
    pub fn already_absent(&self) -> bool {
        self.failure_reason == Some(ErrorKind::NotFound)
    }

    /// Convert to a typed error for callers that want `?`.
    pub fn into_result(self, path: &Path) -> Result<Self, FsOpError> {
        match self.failure_reason {
            None => Ok(self),
            Some(kind) => Err(FsOpError::new(kind, path)),
        }
    }
}

/// Escalating deleter. Holds no state between calls.
#[derive(Clone)]
pub struct DeletionEngine {
    fs: Arc<dyn FileSystem>,
    fallbacks: Vec<FallbackStep>,
    force_retries: u32,
}

impl fmt::Debug for DeletionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeletionEngine")
            .field("fallbacks", &self.fallbacks)
            .field("force_retries", &self.force_retries)
            .finish_non_exhaustive()
    }
}

impl Default for DeletionEngine {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl DeletionEngine {
    /// Real filesystem, platform default fallbacks, timeouts from `cfg`.
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            fs: Arc::new(RealFs),
            fallbacks: default_fallbacks(cfg.shell_timeout, cfg.shell_escalated_timeout),
            force_retries: cfg.force_remove_retries,
        }
    }

    /// Custom filesystem and fallbacks (tests, embedding).
    pub fn new(fs: Arc<dyn FileSystem>, fallbacks: Vec<FallbackStep>) -> Self {
        Self {
            fs,
            fallbacks,
            force_retries: FORCE_REMOVE_RETRIES_DEFAULT,
        }
    }

    pub fn with_force_retries(mut self, retries: u32) -> Self {
        self.force_retries = retries;
        self
    }

    pub(crate) fn filesystem(&self) -> &Arc<dyn FileSystem> {
        &self.fs
    }

    /// Delete `path`. Never panics on a missing path: that is reported as
    /// `failure_reason = NotFound` without running any strategy. A target
    /// that cannot be stat'ed is `AccessDenied`, also with no strategy run.
    pub fn delete(&self, path: &Path) -> DeletionOutcome {
        let report = self.fs.probe(path);
        if !report.exists {
            // An unreadable target is a permission problem, not a lock.
            let kind = match report.error {
                Some(_) => ErrorKind::AccessDenied,
                None => ErrorKind::NotFound,
            };
            debug!(path = %path.display(), %kind, "nothing to delete");
            return DeletionOutcome::failure(DeleteStrategy::DirectRemove, kind, Vec::new());
        }
        let is_dir = report.is_directory;

        let mut attempts: Vec<StrategyAttempt> = Vec::new();
        for strategy in DeleteStrategy::LADDER {
            if !self.applies(strategy, is_dir, &attempts) {
                continue;
            }
            match self.run(strategy, path, is_dir, &attempts) {
                Ok(()) => {
                    attempts.push(StrategyAttempt { strategy, error: None });
                    info!(path = %path.display(), %strategy, "deleted");
                    return DeletionOutcome::success(strategy, attempts);
                }
                Err(kind) => {
                    attempts.push(StrategyAttempt { strategy, error: Some(kind) });
                    if !kind.is_transient() {
                        warn!(path = %path.display(), %strategy, %kind, "delete failed; not retrying");
                        return DeletionOutcome::failure(strategy, kind, attempts);
                    }
                    debug!(path = %path.display(), %strategy, %kind, "transient failure; escalating");
                }
            }
        }

        let (strategy, kind) = attempts
            .last()
            .map(|a| (a.strategy, a.error.unwrap_or(ErrorKind::Unknown)))
            .unwrap_or((DeleteStrategy::DirectRemove, ErrorKind::Unknown));
        warn!(path = %path.display(), %kind, tried = attempts.len(), "all delete strategies exhausted");
        DeletionOutcome::failure(strategy, kind, attempts)
    }

    fn applies(&self, strategy: DeleteStrategy, is_dir: bool, attempts: &[StrategyAttempt]) -> bool {
        match strategy {
            DeleteStrategy::DirectRemove | DeleteStrategy::ForceRemoveApi => true,
            DeleteStrategy::PermissionReset => !is_dir,
            DeleteStrategy::PlatformShellFallback => {
                !is_dir
                    && !self.fallbacks.is_empty()
                    && attempts.iter().all(|a| {
                        matches!(a.error, Some(ErrorKind::FileInUse | ErrorKind::FileBusy))
                    })
            }
        }
    }

    fn run(
        &self,
        strategy: DeleteStrategy,
        path: &Path,
        is_dir: bool,
        attempts: &[StrategyAttempt],
    ) -> Result<(), ErrorKind> {
        let res = match strategy {
            DeleteStrategy::DirectRemove => {
                if is_dir {
                    self.fs.remove_dir_all(path)
                } else {
                    self.fs.remove_file(path)
                }
            }
            DeleteStrategy::PermissionReset => self.reset_and_remove(path),
            DeleteStrategy::ForceRemoveApi => self.fs.force_remove(path, is_dir, self.force_retries),
            DeleteStrategy::PlatformShellFallback => return self.run_shell(path, attempts),
        };
        match res {
            Ok(()) => Ok(()),
            Err(e) => {
                let kind = ErrorKind::from_io(&e);
                // Someone else finished the job between rungs.
                if kind == ErrorKind::NotFound && strategy != DeleteStrategy::DirectRemove {
                    return Ok(());
                }
                debug!(path = %path.display(), %strategy, error = %e, "strategy failed");
                Err(kind)
            }
        }
    }

    /// Clear read-only and unlink. If the unlink still fails the original
    /// permissions are put back.
    fn reset_and_remove(&self, path: &Path) -> io::Result<()> {
        let saved = self.fs.permissions(path).ok();
        self.fs.make_writable(path)?;
        let res = self.fs.remove_file(path);
        if res.as_ref().is_err_and(|e| e.kind() != io::ErrorKind::NotFound) {
            if let Some(perms) = saved {
                if let Err(e) = self.fs.set_permissions(path, perms) {
                    warn!(path = %path.display(), error = %e, "could not restore permissions");
                }
            }
        }
        res
    }

    /// Shell output is opaque, so a failed shell stage reports the lock
    /// condition seen by the earlier rungs.
    fn run_shell(&self, path: &Path, attempts: &[StrategyAttempt]) -> Result<(), ErrorKind> {
        let prior = attempts
            .last()
            .and_then(|a| a.error)
            .unwrap_or(ErrorKind::FileInUse);
        for step in &self.fallbacks {
            match step.fallback.force_delete(path, step.timeout) {
                Ok(()) if !self.fs.probe(path).exists => return Ok(()),
                Ok(()) => {
                    debug!(path = %path.display(), fallback = step.fallback.name(), "fallback exited cleanly but path remains");
                }
                Err(e) => {
                    debug!(path = %path.display(), fallback = step.fallback.name(), error = %e, "fallback failed");
                }
            }
        }
        Err(prior)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn deletes_plain_file_directly() {
        let dir = assert_fs::TempDir::new().unwrap();
        let f = dir.child("draft.docx");
        f.write_str("x").unwrap();
        let out = DeletionEngine::default().delete(f.path());
        assert!(out.succeeded);
        assert_eq!(out.strategy_used, DeleteStrategy::DirectRemove);
        assert_eq!(out.attempts.len(), 1);
        assert!(!f.path().exists());
    }

    #[test]
    fn deletes_directory_tree() {
        let dir = assert_fs::TempDir::new().unwrap();
        let tree = dir.child("2025");
        tree.child("q4").create_dir_all().unwrap();
        tree.child("q4/vat.xlsx").write_str("x").unwrap();
        let out = DeletionEngine::default().delete(tree.path());
        assert!(out.succeeded);
        assert!(!tree.path().exists());
    }

    #[test]
    fn repeat_delete_reports_not_found() {
        let dir = assert_fs::TempDir::new().unwrap();
        let f = dir.child("once.pdf");
        f.touch().unwrap();
        let engine = DeletionEngine::default();
        assert!(engine.delete(f.path()).succeeded);
        let again = engine.delete(f.path());
        assert!(!again.succeeded);
        assert!(again.already_absent());
        assert!(again.attempts.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_parent_is_access_denied() {
        use std::os::unix::fs::PermissionsExt;
        let dir = assert_fs::TempDir::new().unwrap();
        let sealed = dir.child("sealed");
        let f = sealed.child("minutes.pdf");
        f.write_str("x").unwrap();
        std::fs::set_permissions(sealed.path(), std::fs::Permissions::from_mode(0o000)).unwrap();

        let engine = DeletionEngine::default();
        let stat_denied = engine.filesystem().probe(f.path()).error.is_some();
        let out = engine.delete(f.path());
        std::fs::set_permissions(sealed.path(), std::fs::Permissions::from_mode(0o755)).unwrap();

        // Root can stat through a 0o000 folder; nothing to check then.
        if stat_denied {
            assert!(!out.succeeded);
            assert_eq!(out.failure_reason, Some(ErrorKind::AccessDenied));
            assert!(out.attempts.is_empty());
            assert!(f.path().exists());
        }
    }

    #[cfg(unix)]
    #[test]
    fn readonly_file_in_writable_dir_is_removed() {
        use std::os::unix::fs::PermissionsExt;
        let dir = assert_fs::TempDir::new().unwrap();
        let f = dir.child("signed.pdf");
        f.write_str("x").unwrap();
        std::fs::set_permissions(f.path(), std::fs::Permissions::from_mode(0o444)).unwrap();
        let out = DeletionEngine::default().delete(f.path());
        assert!(out.succeeded);
        assert!(!f.path().exists());
    }
}
