//! Filesystem seam used by the deletion and transfer engines.
//!
//! `RealFs` talks to the OS. Tests substitute their own implementation to
//! script failures (busy files, read-only attributes) that are hard to
//! provoke on a developer machine.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing::trace;
use walkdir::WalkDir;

use super::probe::{probe, ProbeReport};
use crate::errors::ErrorKind;
use crate::platform;

/// Linear backoff step between force-remove retries.
pub const FORCE_REMOVE_BACKOFF: Duration = Duration::from_millis(100);

/// Primitive operations the engines are built from.
pub trait FileSystem: Send + Sync {
    fn probe(&self, path: &Path) -> ProbeReport {
        probe(path)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()>;

    fn remove_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Clear read-only protection on a single entry.
    fn make_writable(&self, path: &Path) -> io::Result<()>;

    fn permissions(&self, path: &Path) -> io::Result<fs::Permissions> {
        fs::symlink_metadata(path).map(|m| m.permissions())
    }

    fn set_permissions(&self, path: &Path, perms: fs::Permissions) -> io::Result<()> {
        fs::set_permissions(path, perms)
    }

    /// Forceful removal: clears read-only protection (across the tree for
    /// directories), treats "already gone" as success, and retries transient
    /// failures `retries` more times with a linear backoff. Protection that
    /// was cleared is put back when the removal finally fails.
    fn force_remove(&self, path: &Path, is_dir: bool, retries: u32) -> io::Result<()>;
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealFs;

impl FileSystem for RealFs {
    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir_all(path)
    }

    fn make_writable(&self, path: &Path) -> io::Result<()> {
        platform::make_writable(path)
    }

    fn force_remove(&self, path: &Path, is_dir: bool, retries: u32) -> io::Result<()> {
        let saved = snapshot_permissions(path, is_dir);
        let mut attempt = 0u32;
        loop {
            clear_readonly(path, is_dir);
            let res = if is_dir {
                fs::remove_dir_all(path)
            } else {
                fs::remove_file(path)
            };
            match res {
                Ok(()) => return Ok(()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
                Err(e) if attempt < retries && ErrorKind::from_io(&e).is_transient() => {
                    attempt += 1;
                    trace!(path = %path.display(), attempt, error = %e, "force remove retry");
                    thread::sleep(FORCE_REMOVE_BACKOFF * attempt);
                }
                Err(e) => {
                    restore_permissions(&saved);
                    return Err(e);
                }
            }
        }
    }
}

/// Permissions of `path` and, for directories, of every entry below it.
/// Symlinks are skipped since setting their mode would touch the target.
fn snapshot_permissions(path: &Path, is_dir: bool) -> Vec<(PathBuf, fs::Permissions)> {
    if !is_dir {
        return fs::symlink_metadata(path)
            .map(|m| vec![(path.to_path_buf(), m.permissions())])
            .unwrap_or_default();
    }
    WalkDir::new(path)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| !entry.path_is_symlink())
        .filter_map(|entry| {
            let perms = entry.metadata().ok()?.permissions();
            Some((entry.into_path(), perms))
        })
        .collect()
}

/// Deepest entries first. Entries already removed are skipped silently.
fn restore_permissions(saved: &[(PathBuf, fs::Permissions)]) {
    for (path, perms) in saved.iter().rev() {
        if let Err(e) = fs::set_permissions(path, perms.clone()) {
            trace!(path = %path.display(), error = %e, "permissions not restored");
        }
    }
}

/// Best-effort: failures here surface as the removal error that follows.
fn clear_readonly(path: &Path, is_dir: bool) {
    if !is_dir {
        let _ = platform::make_writable(path);
        return;
    }
    for entry in WalkDir::new(path)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
    {
        let _ = platform::make_writable(entry.path());
    }
}
