//! Destination filename derivation.
//!
//! A requested name (explicit rename or expanded template) only supplies the
//! stem: the extension always comes from the source file, and any extension
//! typed into the request is dropped. Names are checked for path separators
//! and characters Windows refuses, then fitted to the filename length limit
//! by shortening the stem.

use serde::Serialize;
use std::ffi::{OsStr, OsString};
use std::path::Path;

/// Where a planned destination name came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NameSource {
    Explicit,
    TemplateMapping,
    Original,
}

// Conservative filename limits (platform-specific and approximate).
#[cfg(windows)]
const MAX_FILENAME_LEN: usize = 240; // leave headroom for legacy MAX_PATH
#[cfg(not(windows))]
const MAX_FILENAME_LEN: usize = 255;

const FORBIDDEN: [char; 9] = ['/', '\\', '<', '>', ':', '"', '|', '?', '*'];

/// Combine the stem of `requested` with the extension of `source`.
/// Returns `None` when `requested` is not usable as a file name.
pub fn name_with_source_extension(source: &Path, requested: &str) -> Option<OsString> {
    let requested = requested.trim();
    if requested.is_empty()
        || requested == "."
        || requested == ".."
        || requested.contains(FORBIDDEN)
        || requested.chars().any(char::is_control)
    {
        return None;
    }

    let stem = Path::new(requested)
        .file_stem()
        .and_then(OsStr::to_str)
        .map(str::trim_end)
        .filter(|s| !s.is_empty())?;

    fit_name(stem, source.extension())
}

/// Truncate the stem if needed so `stem + ["." + ext]` fits within the limit.
/// `None` when not even one character of the stem fits.
fn fit_name(stem: &str, ext: Option<&OsStr>) -> Option<OsString> {
    let overhead = ext.map(|e| 1 + e.len()).unwrap_or(0);
    let budget = MAX_FILENAME_LEN.saturating_sub(overhead);

    let mut cut = stem.len().min(budget);
    while !stem.is_char_boundary(cut) {
        cut -= 1;
    }
    if cut == 0 {
        return None;
    }

    let mut name = OsString::from(&stem[..cut]);
    if let Some(e) = ext {
        name.push(".");
        name.push(e);
    }
    Some(name)
}
