//! Typed error definitions for filedesk.
//!
//! `ErrorKind` is the small, user-facing taxonomy every engine reports in.
//! `FsOpError` pairs a kind with the path it concerns and the underlying
//! `io::Error`, and renders the remediation hint the end user sees.

use serde::Serialize;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure classes surfaced by the file-operation engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    DirectoryNotFound,
    /// Structurally denied (read-only mount, write-protected media). Never retried.
    AccessDenied,
    /// Permission denied while deleting; on Windows this is what a handle held
    /// by another program looks like.
    FileInUse,
    FileBusy,
    DirectoryNotEmpty,
    DestinationExists,
    CopyVerificationFailed,
    InsufficientSpace,
    InvalidName,
    /// A transfer source that is a folder rather than a file.
    NotAFile,
    Unknown,
}

impl ErrorKind {
    /// Transient kinds drive the deletion escalation ladder; everything else
    /// is terminal on first sight.
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            ErrorKind::FileInUse | ErrorKind::FileBusy | ErrorKind::DirectoryNotEmpty
        )
    }

    /// Human-readable remediation text shown to the end user.
    pub fn hint(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "the item no longer exists; refresh the folder view",
            ErrorKind::DirectoryNotFound => "the folder does not exist or is not a folder",
            ErrorKind::AccessDenied => {
                "access denied; the location is read-only or you lack permission"
            }
            ErrorKind::FileInUse => {
                "the file is likely open in another application; close it and try again"
            }
            ErrorKind::FileBusy => {
                "the file is busy (antivirus scan or sync in progress); wait a moment and try again"
            }
            ErrorKind::DirectoryNotEmpty => {
                "the folder still contains files that are in use; close them and try again"
            }
            ErrorKind::DestinationExists => {
                "a file with that name already exists at the destination; pick another name"
            }
            ErrorKind::CopyVerificationFailed => {
                "the copy could not be verified at the destination; the original was kept"
            }
            ErrorKind::InsufficientSpace => "not enough free space at the destination",
            ErrorKind::InvalidName => "the requested name is not a valid file name",
            ErrorKind::NotAFile => "only files can be transferred; select files rather than a folder",
            ErrorKind::Unknown => "an unexpected filesystem error occurred",
        }
    }

    /// Classify an `io::Error` into the taxonomy.
    ///
    /// Raw OS codes are checked first (platform specific), then the portable
    /// `io::ErrorKind`.
    pub fn from_io(e: &io::Error) -> Self {
        if let Some(kind) = e.raw_os_error().and_then(crate::platform::classify_os_code) {
            return kind;
        }
        match e.kind() {
            io::ErrorKind::NotFound => ErrorKind::NotFound,
            io::ErrorKind::PermissionDenied => ErrorKind::FileInUse,
            io::ErrorKind::ResourceBusy => ErrorKind::FileBusy,
            io::ErrorKind::DirectoryNotEmpty => ErrorKind::DirectoryNotEmpty,
            io::ErrorKind::ReadOnlyFilesystem => ErrorKind::AccessDenied,
            io::ErrorKind::AlreadyExists => ErrorKind::DestinationExists,
            io::ErrorKind::StorageFull => ErrorKind::InsufficientSpace,
            _ => ErrorKind::Unknown,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::DirectoryNotFound => "directory_not_found",
            ErrorKind::AccessDenied => "access_denied",
            ErrorKind::FileInUse => "file_in_use",
            ErrorKind::FileBusy => "file_busy",
            ErrorKind::DirectoryNotEmpty => "directory_not_empty",
            ErrorKind::DestinationExists => "destination_exists",
            ErrorKind::CopyVerificationFailed => "copy_verification_failed",
            ErrorKind::InsufficientSpace => "insufficient_space",
            ErrorKind::InvalidName => "invalid_name",
            ErrorKind::NotAFile => "not_a_file",
            ErrorKind::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// A failed file operation: what went wrong, where, and why.
#[derive(Debug, Error)]
#[error("{}: {}{}", .kind.hint(), .path.display(), cleanup_suffix(.cleanup.as_ref()))]
pub struct FsOpError {
    pub kind: ErrorKind,
    pub path: PathBuf,
    #[source]
    pub source: Option<io::Error>,
    /// Set when rolling back a partial transfer failed as well.
    pub cleanup: Option<io::Error>,
}

fn cleanup_suffix(cleanup: Option<&io::Error>) -> String {
    cleanup
        .map(|e| format!(" (cleanup of the partial copy also failed: {e})"))
        .unwrap_or_default()
}

impl FsOpError {
    pub fn new(kind: ErrorKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
            source: None,
            cleanup: None,
        }
    }

    /// Build from an `io::Error`, classifying it.
    pub fn from_io(path: &Path, e: io::Error) -> Self {
        Self {
            kind: ErrorKind::from_io(&e),
            path: path.to_path_buf(),
            source: Some(e),
            cleanup: None,
        }
    }

    /// Build with an explicit kind, keeping the `io::Error` as the source.
    pub fn with_source(kind: ErrorKind, path: &Path, e: io::Error) -> Self {
        Self {
            kind,
            path: path.to_path_buf(),
            source: Some(e),
            cleanup: None,
        }
    }

    pub fn hint(&self) -> &'static str {
        self.kind.hint()
    }

    /// Stable numeric code for logs and scripts.
    pub fn code(&self) -> i32 {
        match self.kind {
            ErrorKind::NotFound => 2,
            ErrorKind::DirectoryNotFound => 3,
            ErrorKind::AccessDenied => 13,
            ErrorKind::FileInUse => 32,
            ErrorKind::FileBusy => 16,
            ErrorKind::DirectoryNotEmpty => 39,
            ErrorKind::DestinationExists => 17,
            ErrorKind::CopyVerificationFailed => 70,
            ErrorKind::InsufficientSpace => 28,
            ErrorKind::InvalidName => 22,
            ErrorKind::NotAFile => 21,
            ErrorKind::Unknown => 1,
        }
    }
}
