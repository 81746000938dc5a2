//! Directory listing.
//!
//! Two error tiers:
//! - root: if the directory itself cannot be opened the whole call fails
//!   with `DirectoryNotFound` or `AccessDenied`;
//! - entry: a child whose iteration or stat fails (locked, vanished,
//!   permission-denied) is logged and skipped, so one bad file never hides
//!   the rest of the folder.
//!
//! Every call is a fresh listing; nothing is cached.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use std::fs::{self, Metadata};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};

use crate::errors::{ErrorKind, FsOpError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

/// Immutable snapshot of one filesystem entry at listing time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathEntry {
    pub name: String,
    pub absolute_path: PathBuf,
    pub kind: EntryKind,
    pub size_bytes: u64,
    pub modified_at: DateTime<Utc>,
    /// `Some` iff `kind == File`; extensionless files carry an empty string.
    pub extension: Option<String>,
}

impl PathEntry {
    /// Build from already-fetched metadata. `None` for entries that are
    /// neither files nor directories (sockets, fifos, devices).
    pub fn from_metadata(absolute_path: PathBuf, meta: &Metadata) -> Option<Self> {
        let kind = if meta.is_dir() {
            EntryKind::Directory
        } else if meta.is_file() {
            EntryKind::File
        } else {
            return None;
        };
        let name = absolute_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| absolute_path.display().to_string());
        let extension = match kind {
            EntryKind::File => Some(
                Path::new(&name)
                    .extension()
                    .map(|e| e.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            ),
            EntryKind::Directory => None,
        };
        let modified_at = meta
            .modified()
            .unwrap_or(SystemTime::UNIX_EPOCH)
            .into();
        Some(Self {
            name,
            absolute_path,
            kind,
            size_bytes: if kind == EntryKind::File { meta.len() } else { 0 },
            modified_at,
            extension,
        })
    }

    /// Stat a single path (following links) into an entry.
    pub fn stat(path: &Path) -> Result<Self, FsOpError> {
        let meta = fs::metadata(path).map_err(|e| FsOpError::from_io(path, e))?;
        let absolute = dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        Self::from_metadata(absolute, &meta).ok_or_else(|| FsOpError::new(ErrorKind::Unknown, path))
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// List `dir` using the real filesystem stat.
pub fn list(dir: &Path) -> Result<Vec<PathEntry>, FsOpError> {
    list_with(dir, |p| fs::metadata(p))
}

/// List `dir`, statting each child through `stat`.
pub fn list_with<F>(dir: &Path, stat: F) -> Result<Vec<PathEntry>, FsOpError>
where
    F: Fn(&Path) -> io::Result<Metadata>,
{
    let reader = fs::read_dir(dir).map_err(|e| root_error(dir, e))?;
    let base = dunce::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());

    let mut entries = Vec::new();
    let mut skipped = 0usize;
    for item in reader {
        let item = match item {
            Ok(i) => i,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "skipping unreadable directory entry");
                skipped += 1;
                continue;
            }
        };
        let path = base.join(item.file_name());
        let meta = match stat(&path) {
            Ok(m) => m,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping entry: stat failed");
                skipped += 1;
                continue;
            }
        };
        match PathEntry::from_metadata(path, &meta) {
            Some(entry) => entries.push(entry),
            None => debug!(name = ?item.file_name(), "skipping special file"),
        }
    }

    entries.sort_by(directories_first);
    debug!(dir = %dir.display(), count = entries.len(), skipped, "listed directory");
    Ok(entries)
}

/// Newest `count` files in `dir` (directories excluded), newest first.
pub fn recent_files(dir: &Path, count: usize) -> Result<Vec<PathEntry>, FsOpError> {
    let mut files: Vec<_> = list(dir)?.into_iter().filter(|e| !e.is_dir()).collect();
    files.sort_by(|a, b| b.modified_at.cmp(&a.modified_at).then_with(|| a.name.cmp(&b.name)));
    files.truncate(count);
    Ok(files)
}

fn root_error(dir: &Path, e: io::Error) -> FsOpError {
    let kind = match e.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory => ErrorKind::DirectoryNotFound,
        _ => ErrorKind::AccessDenied,
    };
    FsOpError::with_source(kind, dir, e)
}

fn directories_first(a: &PathEntry, b: &PathEntry) -> Ordering {
    b.is_dir()
        .cmp(&a.is_dir())
        .then_with(|| fold(&a.name).cmp(&fold(&b.name)))
        .then_with(|| a.name.cmp(&b.name))
}

fn fold(name: &str) -> String {
    name.to_lowercase()
}
