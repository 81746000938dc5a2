//! Platform-specific helpers.
//! This module hides OS differences (Unix/Windows) behind a uniform API so
//! the engines can remain platform-agnostic: OS error-code classification,
//! clearing read-only bits, secure log/config file creation, and the
//! last-resort shell deletion fallbacks.

mod shell;
#[cfg(unix)]
mod unix;
#[cfg(not(unix))]
mod windows;

pub use shell::{
    default_fallbacks, run_with_timeout, FallbackStep, PlatformFallback, ShellFallback,
};

#[cfg(unix)]
pub use unix::{
    classify_os_code, make_writable, open_log_file_secure_append, write_config_secure_new,
};

#[cfg(not(unix))]
pub use windows::{
    classify_os_code, make_writable, open_log_file_secure_append, write_config_secure_new,
};

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Unique hidden sibling name for atomic config writes.
/// Pattern: .filedesk.tmp.<pid>.<nanos>.<seq>
pub(crate) fn tmp_sibling_name(target: &Path) -> PathBuf {
    let pid = std::process::id();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    let name = format!(".filedesk.tmp.{pid}.{nanos}.{seq}");
    target.parent().unwrap_or_else(|| Path::new(".")).join(name)
}
