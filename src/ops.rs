//! `FileOps`: the operation surface callers use.
//!
//! Wires configuration, the engines and the change notifier together.
//! Every mutating call that succeeds fires the notifier for the directories
//! it touched.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::Config;
use crate::errors::{ErrorKind, FsOpError};
use crate::fs_ops::{
    self, build_plan, probe, DeletionEngine, PathEntry, TransferEngine, TransferOptions,
    TransferPlan, TransferResult,
};
use crate::notify::ChangeNotifier;

#[derive(Debug, Clone)]
pub struct FileOps {
    config: Config,
    deleter: DeletionEngine,
    transfers: TransferEngine,
    notifier: ChangeNotifier,
}

impl Default for FileOps {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl FileOps {
    /// Real filesystem engines configured from `config`; no listener.
    pub fn new(config: Config) -> Self {
        let deleter = DeletionEngine::from_config(&config);
        Self::with_deleter(config, deleter)
    }

    /// Use `deleter` for deletes and for removing transfer originals.
    pub fn with_deleter(config: Config, deleter: DeletionEngine) -> Self {
        let transfers = TransferEngine::new(deleter.clone(), config.preserve_timestamps);
        Self {
            config,
            deleter,
            transfers,
            notifier: ChangeNotifier::silent(),
        }
    }

    pub fn with_notifier(mut self, notifier: ChangeNotifier) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn list_directory(&self, path: &Path) -> Result<Vec<PathEntry>, FsOpError> {
        fs_ops::list(path)
    }

    /// Newest `count` files in `dir`.
    pub fn recent_files(&self, dir: &Path, count: usize) -> Result<Vec<PathEntry>, FsOpError> {
        fs_ops::recent_files(dir, count)
    }

    /// Delete a file or directory tree. A path that is already gone is not
    /// an error.
    pub fn delete_item(&self, path: &Path) -> Result<(), FsOpError> {
        let outcome = self.deleter.delete(path);
        if outcome.already_absent() {
            debug!(path = %path.display(), "delete: already absent");
            return Ok(());
        }
        outcome.into_result(path)?;
        self.notify_parent(path);
        Ok(())
    }

    /// Create `path` and any missing parents. An existing directory is
    /// returned as is; an existing file is `DestinationExists`.
    pub fn create_directory(&self, path: &Path) -> Result<PathEntry, FsOpError> {
        let report = probe(path);
        if report.exists && !report.is_directory {
            return Err(FsOpError::new(ErrorKind::DestinationExists, path));
        }
        if !report.exists {
            fs::create_dir_all(path).map_err(|e| FsOpError::from_io(path, e))?;
            info!(path = %path.display(), "created directory");
            self.notify_parent(path);
        }
        PathEntry::stat(path)
    }

    /// Rename or move `old` to `new`. Never replaces an existing entry.
    pub fn rename_item(&self, old: &Path, new: &Path) -> Result<(), FsOpError> {
        if !probe(old).exists {
            return Err(FsOpError::new(ErrorKind::NotFound, old));
        }
        if probe(new).exists {
            return Err(FsOpError::new(ErrorKind::DestinationExists, new));
        }
        let new_parent = parent_of(new);
        if !new_parent.is_dir() {
            return Err(FsOpError::new(ErrorKind::DirectoryNotFound, new_parent));
        }
        fs::rename(old, new).map_err(|e| {
            // Collisions belong to the destination, everything else to the source.
            match ErrorKind::from_io(&e) {
                kind @ (ErrorKind::DestinationExists | ErrorKind::DirectoryNotEmpty) => {
                    FsOpError::with_source(kind, new, e)
                }
                kind => FsOpError::with_source(kind, old, e),
            }
        })?;
        info!(from = %old.display(), to = %new.display(), "renamed");

        let from_dir = parent_of(old);
        let to_dir = parent_of(new);
        self.notifier.notify(&from_dir, &[old.to_path_buf(), new.to_path_buf()]);
        if to_dir != from_dir {
            self.notifier.notify(&to_dir, &[new.to_path_buf()]);
        }
        Ok(())
    }

    /// Destination names only; nothing on disk is checked or touched.
    pub fn build_transfer_preview(&self, options: &TransferOptions) -> Result<Vec<TransferPlan>, FsOpError> {
        build_plan(options, &self.config)
    }

    /// Plan and run a batch. Only planning errors are returned as `Err`;
    /// per-file failures are reported in the result.
    pub fn execute_transfer(&self, options: &TransferOptions) -> Result<TransferResult, FsOpError> {
        let plans = build_plan(options, &self.config)?;
        let result = self.transfers.execute(&plans, options.preview);
        if !result.preview {
            for status in result.succeeded() {
                self.notifier.notify(&parent_of(&status.source), std::slice::from_ref(&status.source));
                self.notifier
                    .notify(&parent_of(&status.destination), std::slice::from_ref(&status.destination));
            }
        }
        info!(summary = %result.summary(), "transfer batch finished");
        Ok(result)
    }

    fn notify_parent(&self, path: &Path) {
        self.notifier.notify(&parent_of(path), &[path.to_path_buf()]);
    }
}

fn parent_of(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn create_directory_is_idempotent() {
        let dir = assert_fs::TempDir::new().unwrap();
        let target = dir.child("2026/q1");
        let ops = FileOps::default();
        let first = ops.create_directory(target.path()).unwrap();
        let second = ops.create_directory(target.path()).unwrap();
        assert!(first.is_dir());
        assert_eq!(first.absolute_path, second.absolute_path);
    }

    #[test]
    fn create_directory_over_file_fails() {
        let dir = assert_fs::TempDir::new().unwrap();
        let f = dir.child("taken");
        f.touch().unwrap();
        let err = FileOps::default().create_directory(f.path()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DestinationExists);
    }

    #[test]
    fn rename_refuses_existing_target() {
        let dir = assert_fs::TempDir::new().unwrap();
        let a = dir.child("a.pdf");
        let b = dir.child("b.pdf");
        a.write_str("a").unwrap();
        b.write_str("b").unwrap();
        let err = FileOps::default().rename_item(a.path(), b.path()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DestinationExists);
        assert_eq!(fs::read_to_string(b.path()).unwrap(), "b");
    }

    #[test]
    fn rename_missing_source_is_not_found() {
        let dir = assert_fs::TempDir::new().unwrap();
        let err = FileOps::default()
            .rename_item(dir.child("nope").path(), dir.child("x").path())
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[test]
    fn delete_missing_is_ok() {
        let dir = assert_fs::TempDir::new().unwrap();
        FileOps::default().delete_item(dir.child("gone.pdf").path()).unwrap();
    }

    #[test]
    fn rename_into_missing_folder_names_the_folder() {
        let dir = assert_fs::TempDir::new().unwrap();
        let src = dir.child("a.pdf");
        src.write_str("a").unwrap();
        let missing = dir.child("nope");

        let err = FileOps::default()
            .rename_item(src.path(), missing.child("b.pdf").path())
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::DirectoryNotFound);
        assert_eq!(err.path, missing.path());
        assert!(src.path().exists());
    }

    #[test]
    fn parent_of_bare_name_is_current_dir() {
        assert_eq!(parent_of(Path::new("a.pdf")), PathBuf::from("."));
        assert_eq!(parent_of(Path::new("/docs/a.pdf")), PathBuf::from("/docs"));
    }
}
