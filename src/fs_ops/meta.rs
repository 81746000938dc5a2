//! Metadata preservation for transferred files.
//! Copies timestamps (atime, mtime) and permissions from source to destination.
//! Best-effort: failures are logged and ignored so a finished copy is never
//! turned into a failed transfer.

use filetime::{set_file_times, FileTime};
use std::fs;
use std::path::Path;
use tracing::{trace, warn};

pub(super) fn preserve_metadata(dest: &Path, src_meta: &fs::Metadata) {
    let mt = FileTime::from_last_modification_time(src_meta);
    let at = FileTime::from_last_access_time(src_meta);
    match set_file_times(dest, at, mt) {
        Ok(()) => trace!(path = %dest.display(), "set atime/mtime on destination"),
        Err(e) => warn!(path = %dest.display(), error = %e, "failed to set atime/mtime on destination"),
    }

    if let Err(e) = fs::set_permissions(dest, src_meta.permissions()) {
        warn!(path = %dest.display(), error = %e, "failed to copy permissions to destination");
    }
}
