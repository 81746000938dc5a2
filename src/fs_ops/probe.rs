//! Path probing.
//! Classifies a path as missing / file / directory / inaccessible with a
//! single `symlink_metadata` call plus a cheap readability check. Expected
//! conditions never fail: "not found" is a normal report, and unexpected
//! stat errors are carried in `error` instead of being propagated.

use serde::Serialize;
use std::fs;
use std::io;
use std::path::Path;

use crate::errors::ErrorKind;

/// Snapshot of what a path currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ProbeReport {
    pub exists: bool,
    pub is_directory: bool,
    /// Regular files and symlinks (a link is deleted as itself, never followed).
    pub is_file: bool,
    pub is_symlink: bool,
    pub readable: bool,
    pub error: Option<ErrorKind>,
}

impl ProbeReport {
    fn missing() -> Self {
        Self::default()
    }
}

/// Stat `path` without following a final symlink.
pub fn probe(path: &Path) -> ProbeReport {
    let meta = match fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return ProbeReport::missing(),
        // A path through a regular file ("file.txt/child") cannot exist either.
        Err(e) if e.kind() == io::ErrorKind::NotADirectory => return ProbeReport::missing(),
        Err(e) => {
            return ProbeReport {
                error: Some(ErrorKind::from_io(&e)),
                ..ProbeReport::missing()
            };
        }
    };

    let ft = meta.file_type();
    let is_symlink = ft.is_symlink();
    let is_directory = ft.is_dir();
    let is_file = ft.is_file() || is_symlink;

    let readable = if is_directory {
        fs::read_dir(path).is_ok()
    } else if is_symlink {
        true
    } else {
        fs::File::open(path).is_ok()
    };

    ProbeReport {
        exists: true,
        is_directory,
        is_file,
        is_symlink,
        readable,
        error: None,
    }
}
