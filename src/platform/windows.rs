//! Windows implementations of platform helpers (best-effort, minimal ACL awareness).
//!
//! Notes:
//! - Windows lacks POSIX mode semantics; "writable" means clearing FILE_ATTRIBUTE_READONLY.
//! - Config writes are done via temp + rename to be atomic.

use anyhow::{bail, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::os::windows::ffi::OsStrExt;
use std::path::Path;

use windows_sys::Win32::Foundation::{
    ERROR_ACCESS_DENIED, ERROR_DIR_NOT_EMPTY, ERROR_DISK_FULL, ERROR_FILE_EXISTS,
    ERROR_FILE_NOT_FOUND, ERROR_LOCK_VIOLATION, ERROR_PATH_NOT_FOUND, ERROR_SHARING_VIOLATION,
    ERROR_WRITE_PROTECT,
};
use windows_sys::Win32::Storage::FileSystem::{SetFileAttributesW, FILE_ATTRIBUTE_NORMAL};

use crate::errors::ErrorKind;

/// Map a raw Win32 error code to the error taxonomy.
pub fn classify_os_code(code: i32) -> Option<ErrorKind> {
    match code as u32 {
        ERROR_FILE_NOT_FOUND | ERROR_PATH_NOT_FOUND => Some(ErrorKind::NotFound),
        ERROR_ACCESS_DENIED => Some(ErrorKind::FileInUse),
        ERROR_SHARING_VIOLATION | ERROR_LOCK_VIOLATION => Some(ErrorKind::FileBusy),
        ERROR_DIR_NOT_EMPTY => Some(ErrorKind::DirectoryNotEmpty),
        ERROR_WRITE_PROTECT => Some(ErrorKind::AccessDenied),
        ERROR_FILE_EXISTS => Some(ErrorKind::DestinationExists),
        ERROR_DISK_FULL => Some(ErrorKind::InsufficientSpace),
        _ => None,
    }
}

/// Reset attributes to FILE_ATTRIBUTE_NORMAL (clears READONLY/HIDDEN/SYSTEM).
pub fn make_writable(path: &Path) -> io::Result<()> {
    let wide: Vec<u16> = path.as_os_str().encode_wide().chain(Some(0)).collect();
    let ok = unsafe { SetFileAttributesW(wide.as_ptr(), FILE_ATTRIBUTE_NORMAL) };
    if ok == 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Open log file for appending (no symlink defense available via std on Windows).
pub fn open_log_file_secure_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Write a new config file atomically (create_new) using a temp file + rename.
pub fn write_config_secure_new(path: &Path, contents: &[u8]) -> Result<()> {
    if path.exists() {
        bail!("Config file already exists: {}", path.display());
    }
    let parent = path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "config path has no parent"))?;
    fs::create_dir_all(parent)?;

    let tmp = super::tmp_sibling_name(path);
    let mut f = OpenOptions::new().write(true).create_new(true).open(&tmp)?;
    f.write_all(contents)?;
    f.sync_all()?;
    drop(f);
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}
