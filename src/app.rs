//! Application orchestrator.
//! Loads config, applies CLI overrides, initializes logging and dispatches
//! the subcommand to the `FileOps` facade.

use anyhow::{anyhow, bail, Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error};

use filedesk::cli::{Args, Command};
use filedesk::config::{create_template_config, CONFIG_ENV};
use filedesk::output as out;
use filedesk::{default_config_path, load_config, ChangeNotifier, FileOps, FsOpError, TracingSink, TransferOptions};

use crate::logging::init_tracing;

#[derive(Serialize)]
struct DeleteReport<'a> {
    path: &'a Path,
    deleted: bool,
    error: Option<ErrorReport>,
}

#[derive(Serialize)]
struct ErrorReport {
    kind: String,
    code: i32,
    hint: &'static str,
}

impl From<&FsOpError> for ErrorReport {
    fn from(e: &FsOpError) -> Self {
        Self {
            kind: e.kind.to_string(),
            code: e.code(),
            hint: e.hint(),
        }
    }
}

/// Run the CLI application.
pub fn run(args: Args) -> Result<()> {
    // Handled before logging init
    if args.print_config {
        return print_config();
    }
    if args.init_config {
        let path = default_config_path()?;
        create_template_config(&path)?;
        out::print_success(&format!("template config written to {}", path.display()));
        return Ok(());
    }

    let mut cfg = load_config()?;
    args.apply_overrides(&mut cfg);

    let _guard = init_tracing(&cfg.log_level, cfg.log_file.as_deref(), args.json_logs)
        .inspect_err(|e| out::print_error(&format!("Failed to initialize logging: {e}")))?;

    debug!(?args, "starting filedesk");

    let Some(command) = args.command.clone() else {
        bail!("no command given; see --help");
    };

    let ops = FileOps::new(cfg).with_notifier(ChangeNotifier::new(Arc::new(TracingSink)));
    let result = dispatch(&ops, command, args.json);
    if let Err(e) = &result {
        match e.downcast_ref::<FsOpError>() {
            Some(fe) => error!(code = fe.code(), kind = %fe.kind, path = %fe.path.display(), "operation failed"),
            None => error!(error = %e, "operation failed"),
        }
    }
    result
}

fn print_config() -> Result<()> {
    if let Ok(p) = std::env::var(CONFIG_ENV) {
        out::print_info(&format!("Using {CONFIG_ENV} (explicit):\n  {p}"));
        return Ok(());
    }
    let p = default_config_path()?;
    out::print_info(&format!("Default filedesk config path:\n  {}", p.display()));
    if p.exists() {
        out::print_info("A config file already exists at that location.");
    } else {
        out::print_info("No config file exists there yet; run with --init-config to create one.");
    }
    Ok(())
}

fn dispatch(ops: &FileOps, command: Command, json: bool) -> Result<()> {
    match command {
        Command::List { dir, recent } => {
            let entries = match recent {
                Some(n) => ops.recent_files(&dir, n)?,
                None => ops.list_directory(&dir)?,
            };
            if json {
                out::print_json(&entries)?;
            } else {
                out::print_entries(&entries);
            }
            Ok(())
        }
        Command::Delete { paths } => delete_all(ops, &paths, json),
        Command::Mkdir { path } => {
            let entry = ops.create_directory(&path)?;
            if json {
                out::print_json(&entry)?;
            } else {
                out::print_success(&format!("{}", entry.absolute_path.display()));
            }
            Ok(())
        }
        Command::Rename { from, to } => {
            ops.rename_item(&from, &to)?;
            if json {
                out::print_json(&serde_json::json!({ "from": from, "to": to }))?;
            } else {
                out::print_success(&format!("{} -> {}", from.display(), to.display()));
            }
            Ok(())
        }
        Command::Transfer {
            sources,
            to,
            rename,
            command,
            preview,
            last,
            from,
            date,
        } => {
            let sources = match last {
                Some(n) => last_files(ops, from, n)?,
                None => sources,
            };
            let options = TransferOptions {
                sources,
                destination_dir: to,
                explicit_rename: rename,
                command,
                preview,
                reference_date: date,
            };
            let result = ops.execute_transfer(&options)?;
            if json {
                out::print_json(&result)?;
            } else {
                out::print_transfer(&result);
            }
            if result.all_succeeded() {
                Ok(())
            } else {
                Err(anyhow!(result.summary()))
            }
        }
    }
}

/// Every path is attempted; the command fails if any of them did.
fn delete_all(ops: &FileOps, paths: &[PathBuf], json: bool) -> Result<()> {
    let mut reports = Vec::with_capacity(paths.len());
    let mut failed = 0usize;
    for p in paths {
        match ops.delete_item(p) {
            Ok(()) => {
                if !json {
                    out::print_success(&format!("deleted {}", p.display()));
                }
                reports.push(DeleteReport { path: p, deleted: true, error: None });
            }
            Err(e) => {
                failed += 1;
                if !json {
                    out::print_error(&e.to_string());
                }
                reports.push(DeleteReport {
                    path: p,
                    deleted: false,
                    error: Some(ErrorReport::from(&e)),
                });
            }
        }
    }
    if json {
        out::print_json(&reports)?;
    }
    if failed > 0 {
        bail!("{failed} of {} item(s) could not be deleted", paths.len());
    }
    Ok(())
}

fn last_files(ops: &FileOps, from: Option<PathBuf>, n: usize) -> Result<Vec<PathBuf>> {
    let dir = from
        .or_else(|| ops.config().downloads_dir.clone())
        .context("no folder for --last: pass --from or set downloads_dir in the config")?;
    let files = ops.recent_files(&dir, n)?;
    Ok(files.into_iter().map(|e| e.absolute_path).collect())
}
