use filedesk::fs_ops::{DeleteStrategy, DeletionEngine, FileSystem, ProbeReport};
use filedesk::platform::{FallbackStep, PlatformFallback};
use filedesk::ErrorKind;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Filesystem whose removals fail with scripted errors.
#[derive(Default)]
struct ScriptedFs {
    is_dir: bool,
    remove_err: Option<io::ErrorKind>,
    force_err: Option<io::ErrorKind>,
    stat_err: Option<ErrorKind>,
    gone: AtomicBool,
    calls: Mutex<Vec<&'static str>>,
}

impl ScriptedFs {
    fn log(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn outcome(&self, err: Option<io::ErrorKind>) -> io::Result<()> {
        match err {
            Some(kind) => Err(io::Error::from(kind)),
            None => {
                self.gone.store(true, Ordering::SeqCst);
                Ok(())
            }
        }
    }
}

impl FileSystem for ScriptedFs {
    fn probe(&self, _path: &Path) -> ProbeReport {
        if let Some(kind) = self.stat_err {
            return ProbeReport {
                error: Some(kind),
                ..ProbeReport::default()
            };
        }
        if self.gone.load(Ordering::SeqCst) {
            return ProbeReport::default();
        }
        ProbeReport {
            exists: true,
            is_directory: self.is_dir,
            is_file: !self.is_dir,
            readable: true,
            ..ProbeReport::default()
        }
    }

    fn remove_file(&self, _path: &Path) -> io::Result<()> {
        self.log("remove_file");
        self.outcome(self.remove_err)
    }

    fn remove_dir_all(&self, _path: &Path) -> io::Result<()> {
        self.log("remove_dir_all");
        self.outcome(self.remove_err)
    }

    fn make_writable(&self, _path: &Path) -> io::Result<()> {
        self.log("make_writable");
        Ok(())
    }

    fn force_remove(&self, _path: &Path, _is_dir: bool, _retries: u32) -> io::Result<()> {
        self.log("force_remove");
        self.outcome(self.force_err)
    }
}

/// Shell stand-in that counts invocations and optionally removes the target.
struct CountingFallback {
    runs: AtomicUsize,
    removes: Option<Arc<ScriptedFs>>,
}

impl PlatformFallback for CountingFallback {
    fn name(&self) -> &str {
        "counting"
    }

    fn force_delete(&self, _path: &Path, _timeout: Duration) -> io::Result<()> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        if let Some(fs) = &self.removes {
            fs.gone.store(true, Ordering::SeqCst);
        }
        Ok(())
    }
}

fn engine_with(fs: Arc<ScriptedFs>, removes: bool) -> (DeletionEngine, Arc<CountingFallback>) {
    let fallback = Arc::new(CountingFallback {
        runs: AtomicUsize::new(0),
        removes: removes.then(|| Arc::clone(&fs)),
    });
    let steps = vec![FallbackStep {
        fallback: fallback.clone(),
        timeout: Duration::from_millis(50),
    }];
    (DeletionEngine::new(fs, steps).with_force_retries(0), fallback)
}

fn strategies(out: &filedesk::DeletionOutcome) -> Vec<DeleteStrategy> {
    out.attempts.iter().map(|a| a.strategy).collect()
}

#[test]
fn busy_file_escalates_to_force_remove_without_shell() {
    let fs = Arc::new(ScriptedFs {
        remove_err: Some(io::ErrorKind::ResourceBusy),
        ..ScriptedFs::default()
    });
    let (engine, fallback) = engine_with(fs.clone(), false);

    let out = engine.delete(Path::new("/docs/locked.xlsx"));

    assert!(out.succeeded);
    assert_eq!(out.strategy_used, DeleteStrategy::ForceRemoveApi);
    assert_eq!(
        strategies(&out),
        [
            DeleteStrategy::DirectRemove,
            DeleteStrategy::PermissionReset,
            DeleteStrategy::ForceRemoveApi
        ]
    );
    assert_eq!(out.attempts[0].error, Some(ErrorKind::FileBusy));
    assert_eq!(out.attempts[2].error, None);
    assert_eq!(fallback.runs.load(Ordering::SeqCst), 0);
    assert_eq!(
        fs.calls(),
        ["remove_file", "make_writable", "remove_file", "force_remove"]
    );
}

#[test]
fn shell_fallback_runs_last_for_locked_file() {
    let fs = Arc::new(ScriptedFs {
        remove_err: Some(io::ErrorKind::PermissionDenied),
        force_err: Some(io::ErrorKind::PermissionDenied),
        ..ScriptedFs::default()
    });
    let (engine, fallback) = engine_with(fs.clone(), true);

    let out = engine.delete(Path::new("/docs/open-in-excel.xlsx"));

    assert!(out.succeeded);
    assert_eq!(out.strategy_used, DeleteStrategy::PlatformShellFallback);
    assert_eq!(strategies(&out), DeleteStrategy::LADDER);
    assert_eq!(fallback.runs.load(Ordering::SeqCst), 1);
}

#[test]
fn shell_that_leaves_file_behind_reports_lock() {
    let fs = Arc::new(ScriptedFs {
        remove_err: Some(io::ErrorKind::ResourceBusy),
        force_err: Some(io::ErrorKind::ResourceBusy),
        ..ScriptedFs::default()
    });
    let (engine, fallback) = engine_with(fs, false);

    let out = engine.delete(Path::new("/docs/scanning.pdf"));

    assert!(!out.succeeded);
    assert_eq!(out.failure_reason, Some(ErrorKind::FileBusy));
    assert_eq!(out.strategy_used, DeleteStrategy::PlatformShellFallback);
    assert!(out.hint.as_deref().unwrap().contains("busy"));
    assert_eq!(fallback.runs.load(Ordering::SeqCst), 1);
}

#[test]
fn non_transient_failure_stops_at_first_step() {
    let fs = Arc::new(ScriptedFs {
        remove_err: Some(io::ErrorKind::ReadOnlyFilesystem),
        ..ScriptedFs::default()
    });
    let (engine, fallback) = engine_with(fs.clone(), true);

    let out = engine.delete(Path::new("/media/cdrom/readme.txt"));

    assert!(!out.succeeded);
    assert_eq!(out.failure_reason, Some(ErrorKind::AccessDenied));
    assert_eq!(out.strategy_used, DeleteStrategy::DirectRemove);
    assert_eq!(out.attempts.len(), 1);
    assert_eq!(fs.calls(), ["remove_file"]);
    assert_eq!(fallback.runs.load(Ordering::SeqCst), 0);
}

#[test]
fn non_empty_directory_skips_file_only_steps() {
    let fs = Arc::new(ScriptedFs {
        is_dir: true,
        remove_err: Some(io::ErrorKind::DirectoryNotEmpty),
        force_err: Some(io::ErrorKind::DirectoryNotEmpty),
        ..ScriptedFs::default()
    });
    let (engine, fallback) = engine_with(fs.clone(), true);

    let out = engine.delete(Path::new("/docs/2025"));

    assert!(!out.succeeded);
    assert_eq!(out.failure_reason, Some(ErrorKind::DirectoryNotEmpty));
    assert_eq!(
        strategies(&out),
        [DeleteStrategy::DirectRemove, DeleteStrategy::ForceRemoveApi]
    );
    assert_eq!(fs.calls(), ["remove_dir_all", "force_remove"]);
    assert_eq!(fallback.runs.load(Ordering::SeqCst), 0);
}

#[test]
fn missing_path_runs_no_strategy() {
    let fs = Arc::new(ScriptedFs::default());
    fs.gone.store(true, Ordering::SeqCst);
    let (engine, _) = engine_with(fs.clone(), false);

    let out = engine.delete(Path::new("/docs/already-gone.pdf"));

    assert!(!out.succeeded);
    assert!(out.already_absent());
    assert!(out.attempts.is_empty());
    assert!(fs.calls().is_empty());
}

#[test]
fn file_vanishing_before_unlink_is_already_absent() {
    let fs = Arc::new(ScriptedFs {
        remove_err: Some(io::ErrorKind::NotFound),
        ..ScriptedFs::default()
    });
    let (engine, fallback) = engine_with(fs.clone(), true);

    let out = engine.delete(Path::new("/docs/moved-away.pdf"));

    assert!(!out.succeeded);
    assert!(out.already_absent());
    assert_eq!(strategies(&out), [DeleteStrategy::DirectRemove]);
    assert_eq!(out.strategy_used, DeleteStrategy::DirectRemove);
    assert_eq!(fs.calls(), ["remove_file"]);
    assert_eq!(fallback.runs.load(Ordering::SeqCst), 0);
}

#[test]
fn unstatable_target_is_access_denied() {
    let fs = Arc::new(ScriptedFs {
        stat_err: Some(ErrorKind::FileInUse),
        ..ScriptedFs::default()
    });
    let (engine, fallback) = engine_with(fs.clone(), true);

    let out = engine.delete(Path::new("/private/payroll.csv"));

    assert!(!out.succeeded);
    assert_eq!(out.failure_reason, Some(ErrorKind::AccessDenied));
    assert!(!out.already_absent());
    assert!(out.attempts.is_empty());
    assert!(fs.calls().is_empty());
    assert_eq!(fallback.runs.load(Ordering::SeqCst), 0);
}

#[test]
fn second_delete_of_real_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let f = dir.path().join("invoice.pdf");
    std::fs::write(&f, b"x").unwrap();
    let engine = DeletionEngine::default();

    assert!(engine.delete(&f).succeeded);
    let again = engine.delete(&f);
    assert_eq!(again.failure_reason, Some(ErrorKind::NotFound));
    assert!(!f.exists());
}
