//! Core library for `filedesk`.
//!
//! A resilient file-operations engine for a desktop file shell: directory
//! listing that tolerates unreadable entries, deletion through an escalating
//! strategy ladder, and copy-verify-delete transfers with rollback and
//! deterministic destination naming.
//!
//! Most callers only need [`FileOps`]; the engines are public for embedding
//! and testing.

pub mod cli;
pub mod config;
pub mod errors;
pub mod fs_ops;
pub mod notify;
pub mod ops;
pub mod output;
pub mod platform;

pub use config::{
    default_config_path, default_log_path, load_config, path_has_symlink_ancestor, Config,
    LogLevel, TemplateLookup,
};
pub use errors::{ErrorKind, FsOpError};
pub use fs_ops::{
    DeleteStrategy, DeletionEngine, DeletionOutcome, FileSystem, PathEntry, RealFs,
    TransferEngine, TransferOptions, TransferPlan, TransferResult,
};
pub use notify::{ChangeEvent, ChangeNotifier, ChangeSink, TracingSink};
pub use ops::FileOps;

/// Convenient prelude for library consumers.
pub mod prelude {
    pub use crate::{
        ChangeNotifier, Config, DeletionEngine, ErrorKind, FileOps, FsOpError, PathEntry,
        TransferOptions, TransferResult,
    };
}
