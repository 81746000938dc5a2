//! Transfer engine: move files into a destination folder as
//! copy → verify → delete original, rolling back the copy when the original
//! cannot be removed.
//!
//! Planning (`build_plan`) is pure and decides every destination name up
//! front; `TransferEngine::execute` then walks the plans in order, each file
//! independent of the others.

use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::delete::DeletionEngine;
use super::io_copy::copy_new;
use super::meta::preserve_metadata;
use super::naming::{name_with_source_extension, NameSource};
use super::space::ensure_space_for_copy;
use crate::config::templates::expand_template;
use crate::config::{Config, TemplateLookup};
use crate::errors::{ErrorKind, FsOpError};

/// What to transfer and how to name it.
#[derive(Debug, Clone, Default)]
pub struct TransferOptions {
    pub sources: Vec<PathBuf>,
    pub destination_dir: PathBuf,
    /// New name for the first source (stem only; its extension is kept).
    pub explicit_rename: Option<String>,
    /// Command whose filename template names the first source.
    pub command: Option<String>,
    /// Check preconditions only; touch nothing.
    pub preview: bool,
    /// Date substituted for `{date}`; today when unset.
    pub reference_date: Option<NaiveDate>,
}

impl TransferOptions {
    pub fn new(sources: Vec<PathBuf>, destination_dir: impl Into<PathBuf>) -> Self {
        Self {
            sources,
            destination_dir: destination_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_rename(mut self, name: impl Into<String>) -> Self {
        self.explicit_rename = Some(name.into());
        self
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn preview(mut self, preview: bool) -> Self {
        self.preview = preview;
        self
    }

    pub fn on_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }
}

/// One planned source → destination pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferPlan {
    pub source_path: PathBuf,
    pub destination_path: PathBuf,
    pub destination_name_source: NameSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TransferOutcome {
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDetail {
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileStatus {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub outcome: TransferOutcome,
    pub error_detail: Option<ErrorDetail>,
}

impl FileStatus {
    pub fn is_success(&self) -> bool {
        self.outcome == TransferOutcome::Success
    }
}

/// Per-file statuses for one batch, in plan order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransferResult {
    pub per_file_status: Vec<FileStatus>,
    pub preview: bool,
}

impl TransferResult {
    pub fn succeeded(&self) -> impl Iterator<Item = &FileStatus> {
        self.per_file_status.iter().filter(|s| s.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &FileStatus> {
        self.per_file_status.iter().filter(|s| !s.is_success())
    }

    pub fn all_succeeded(&self) -> bool {
        self.per_file_status.iter().all(FileStatus::is_success)
    }

    /// "3 transferred, 1 failed: a.pdf: <reason>"
    pub fn summary(&self) -> String {
        let verb = if self.preview { "ready" } else { "transferred" };
        let ok = self.succeeded().count();
        let failed: Vec<String> = self
            .failed()
            .map(|s| {
                let name = s
                    .source
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| s.source.display().to_string());
                let reason = s
                    .error_detail
                    .as_ref()
                    .map(|d| d.message.as_str())
                    .unwrap_or("unknown error");
                format!("{name}: {reason}")
            })
            .collect();
        if failed.is_empty() {
            format!("{ok} {verb}")
        } else {
            format!("{ok} {verb}, {} failed: {}", failed.len(), failed.join("; "))
        }
    }
}

/// Decide every destination path. No filesystem access.
///
/// Only the first source can be renamed: an explicit rename wins over a
/// command template, which wins over the original name. Later sources
/// always keep their names.
pub fn build_plan<T>(options: &TransferOptions, templates: &T) -> Result<Vec<TransferPlan>, FsOpError>
where
    T: TemplateLookup + ?Sized,
{
    let date = options
        .reference_date
        .unwrap_or_else(|| Local::now().date_naive());

    let mut plans = Vec::with_capacity(options.sources.len());
    for (idx, source) in options.sources.iter().enumerate() {
        let original = source
            .file_name()
            .ok_or_else(|| FsOpError::new(ErrorKind::InvalidName, source.as_path()))?;
        let (name, name_source) = if idx == 0 {
            first_name(source, original, options, templates, date)?
        } else {
            (original.to_os_string(), NameSource::Original)
        };
        plans.push(TransferPlan {
            source_path: source.clone(),
            destination_path: options.destination_dir.join(name),
            destination_name_source: name_source,
        });
    }
    Ok(plans)
}

fn first_name<T>(
    source: &Path,
    original: &OsStr,
    options: &TransferOptions,
    templates: &T,
    date: NaiveDate,
) -> Result<(OsString, NameSource), FsOpError>
where
    T: TemplateLookup + ?Sized,
{
    let invalid = || FsOpError::new(ErrorKind::InvalidName, source);

    if let Some(rename) = options
        .explicit_rename
        .as_deref()
        .filter(|r| !r.trim().is_empty())
    {
        let name = name_with_source_extension(source, rename).ok_or_else(invalid)?;
        return Ok((name, NameSource::Explicit));
    }

    if let Some(template) = options
        .command
        .as_deref()
        .and_then(|c| templates.template_for(c))
    {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let expanded = expand_template(template, &stem, date);
        let name = name_with_source_extension(source, &expanded).ok_or_else(invalid)?;
        return Ok((name, NameSource::TemplateMapping));
    }

    Ok((original.to_os_string(), NameSource::Original))
}

/// Executes transfer plans. Holds no per-batch state.
#[derive(Debug, Clone)]
pub struct TransferEngine {
    deleter: DeletionEngine,
    preserve_timestamps: bool,
}

impl Default for TransferEngine {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl TransferEngine {
    pub fn from_config(cfg: &Config) -> Self {
        Self::new(DeletionEngine::from_config(cfg), cfg.preserve_timestamps)
    }

    /// Originals are removed through `deleter`, ladder included.
    pub fn new(deleter: DeletionEngine, preserve_timestamps: bool) -> Self {
        Self {
            deleter,
            preserve_timestamps,
        }
    }

    /// Run every plan in order. A failure never stops the batch.
    pub fn execute(&self, plans: &[TransferPlan], preview: bool) -> TransferResult {
        let per_file_status = plans
            .iter()
            .map(|plan| {
                let res = if preview {
                    self.check_preconditions(plan).map(|_| ())
                } else {
                    self.transfer_one(plan)
                };
                match res {
                    Ok(()) => FileStatus {
                        source: plan.source_path.clone(),
                        destination: plan.destination_path.clone(),
                        outcome: TransferOutcome::Success,
                        error_detail: None,
                    },
                    Err(e) => {
                        warn!(
                            src = %plan.source_path.display(),
                            dst = %plan.destination_path.display(),
                            kind = %e.kind,
                            "transfer failed"
                        );
                        FileStatus {
                            source: plan.source_path.clone(),
                            destination: plan.destination_path.clone(),
                            outcome: TransferOutcome::Failure,
                            error_detail: Some(ErrorDetail {
                                kind: e.kind,
                                message: e.to_string(),
                            }),
                        }
                    }
                }
            })
            .collect();
        TransferResult {
            per_file_status,
            preview,
        }
    }

    /// Step 1. Returns the source metadata for the later steps.
    fn check_preconditions(&self, plan: &TransferPlan) -> Result<fs::Metadata, FsOpError> {
        let backend = self.deleter.filesystem();
        let src = plan.source_path.as_path();
        let dst = plan.destination_path.as_path();
        let dst_dir = dst.parent().unwrap_or_else(|| Path::new("."));

        if !backend.probe(dst_dir).is_directory {
            return Err(FsOpError::new(ErrorKind::DirectoryNotFound, dst_dir));
        }
        let report = backend.probe(src);
        if !report.exists {
            return Err(FsOpError::new(report.error.unwrap_or(ErrorKind::NotFound), src));
        }
        if report.is_directory {
            return Err(FsOpError::new(ErrorKind::NotAFile, src));
        }
        if backend.probe(dst).exists {
            return Err(FsOpError::new(ErrorKind::DestinationExists, dst));
        }
        let meta = fs::metadata(src).map_err(|e| FsOpError::from_io(src, e))?;
        ensure_space_for_copy(dst_dir, meta.len())?;
        Ok(meta)
    }

    fn transfer_one(&self, plan: &TransferPlan) -> Result<(), FsOpError> {
        let src = plan.source_path.as_path();
        let dst = plan.destination_path.as_path();
        let src_meta = self.check_preconditions(plan)?;

        debug!(src = %src.display(), dst = %dst.display(), "copying");
        let copied = copy_new(src, dst).map_err(|e| FsOpError::from_io(dst, e))?;

        let dst_len = fs::metadata(dst).map(|m| m.len()).ok();
        if dst_len != Some(src_meta.len()) || copied != src_meta.len() {
            warn!(
                dst = %dst.display(),
                expected = src_meta.len(),
                copied,
                found = ?dst_len,
                "copy verification failed"
            );
            return Err(self.rolled_back(FsOpError::new(ErrorKind::CopyVerificationFailed, dst), dst));
        }

        if self.preserve_timestamps {
            preserve_metadata(dst, &src_meta);
        }

        let outcome = self.deleter.delete(src);
        if !outcome.succeeded && !outcome.already_absent() {
            let kind = outcome.failure_reason.unwrap_or(ErrorKind::Unknown);
            warn!(src = %src.display(), %kind, "could not remove original; rolling back copy");
            return Err(self.rolled_back(FsOpError::new(kind, src), dst));
        }
        if outcome.already_absent() {
            debug!(src = %src.display(), "original vanished after copy; keeping destination");
        }

        info!(src = %src.display(), dst = %dst.display(), bytes = copied, "transferred");
        Ok(())
    }

    /// Remove the copy at `dst` and attach any cleanup failure to `err`.
    fn rolled_back(&self, mut err: FsOpError, dst: &Path) -> FsOpError {
        let outcome = self.deleter.delete(dst);
        if !outcome.succeeded && !outcome.already_absent() {
            let kind = outcome.failure_reason.unwrap_or(ErrorKind::Unknown);
            warn!(dst = %dst.display(), %kind, "rollback of destination failed");
            err.cleanup = Some(io::Error::other(format!("{}: {}", kind.hint(), dst.display())));
        }
        err
    }
}
