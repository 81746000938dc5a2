//! File-operation engines: probe, listing, deletion ladder, transfers.

mod backend;
mod delete;
mod enumerate;
mod io_copy;
mod meta;
mod naming;
mod probe;
mod space;
mod transfer;

pub use backend::{FileSystem, RealFs, FORCE_REMOVE_BACKOFF};
pub use delete::{DeleteStrategy, DeletionEngine, DeletionOutcome, StrategyAttempt};
pub use enumerate::{list, list_with, recent_files, EntryKind, PathEntry};
pub use naming::{name_with_source_extension, NameSource};
pub use probe::{probe, ProbeReport};
pub use transfer::{
    build_plan, ErrorDetail, FileStatus, TransferEngine, TransferOptions, TransferOutcome,
    TransferPlan, TransferResult,
};
