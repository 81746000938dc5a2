//! Free-space precondition for transfers.

use std::path::Path;
use tracing::{debug, warn};

use crate::errors::{ErrorKind, FsOpError};

/// Headroom kept free beyond the file itself.
const CUSHION: u64 = 4 * 1024 * 1024;

pub(super) fn format_bytes(n: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;
    let f = n as f64;
    if f >= GB {
        format!("{:.1} GiB", f / GB)
    } else if f >= MB {
        format!("{:.1} MiB", f / MB)
    } else if f >= KB {
        format!("{:.1} KiB", f / KB)
    } else {
        format!("{} B", n)
    }
}

/// Fail with `InsufficientSpace` when `dst_dir` cannot hold `required` bytes.
///
/// If the volume cannot be queried the check is skipped; the copy itself
/// will then surface `StorageFull` if it runs out.
pub(super) fn ensure_space_for_copy(dst_dir: &Path, required: u64) -> Result<(), FsOpError> {
    let free = match fs2::available_space(dst_dir) {
        Ok(free) => free,
        Err(e) => {
            warn!(dir = %dst_dir.display(), error = %e, "could not query free space; continuing");
            return Ok(());
        }
    };
    if free < required.saturating_add(CUSHION) {
        debug!(
            dir = %dst_dir.display(),
            need = %format_bytes(required),
            free = %format_bytes(free),
            "not enough free space"
        );
        return Err(FsOpError::new(ErrorKind::InsufficientSpace, dst_dir));
    }
    Ok(())
}
