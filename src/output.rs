use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use serde::Serialize;

use crate::fs_ops::{PathEntry, TransferOutcome, TransferResult};

/// Small wrapper around stdout/stderr printing to provide consistent, colored
/// user-facing messages. Colors are enabled only when output is a TTY.
fn is_tty() -> bool {
    atty::is(atty::Stream::Stdout)
}

pub fn print_info(msg: &str) {
    if is_tty() {
        println!("{} {}", "info:".cyan().bold(), msg);
    } else {
        println!("info: {}", msg);
    }
}

pub fn print_warn(msg: &str) {
    if is_tty() {
        eprintln!("{} {}", "warn:".yellow().bold(), msg);
    } else {
        eprintln!("warn: {}", msg);
    }
}

pub fn print_error(msg: &str) {
    if is_tty() {
        eprintln!("{} {}", "error:".red().bold(), msg);
    } else {
        eprintln!("error: {}", msg);
    }
}

pub fn print_success(msg: &str) {
    if is_tty() {
        println!("{} {}", "ok:".green().bold(), msg);
    } else {
        println!("ok: {}", msg);
    }
}

/// Print a plain user-facing line (no prefix). Use this for primary outputs
/// that users may script against.
pub fn print_user(msg: &str) {
    println!("{}", msg);
}

/// Pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value).context("serialize output as JSON")?;
    println!("{s}");
    Ok(())
}

/// One listing line: `<kind> <size> <modified> <name>`.
pub fn format_entry(entry: &PathEntry) -> String {
    let modified = entry
        .modified_at
        .with_timezone(&chrono::Local)
        .format("%Y-%m-%d %H:%M");
    if entry.is_dir() {
        format!("d {:>10} {} {}/", "-", modified, entry.name)
    } else {
        format!("- {:>10} {} {}", entry.size_bytes, modified, entry.name)
    }
}

pub fn print_entries(entries: &[PathEntry]) {
    for e in entries {
        if is_tty() && e.is_dir() {
            println!("{}", format_entry(e).blue().bold());
        } else {
            print_user(&format_entry(e));
        }
    }
}

/// Per-file lines followed by the batch summary.
pub fn print_transfer(result: &TransferResult) {
    let arrow = if result.preview { "=>" } else { "->" };
    for s in &result.per_file_status {
        match (s.outcome, &s.error_detail) {
            (TransferOutcome::Success, _) => print_user(&format!(
                "{} {} {}",
                s.source.display(),
                arrow,
                s.destination.display()
            )),
            (TransferOutcome::Failure, detail) => print_error(&format!(
                "{}: {}",
                s.source.display(),
                detail.as_ref().map(|d| d.message.as_str()).unwrap_or("failed")
            )),
        }
    }
    if result.all_succeeded() {
        print_success(&result.summary());
    } else {
        print_warn(&result.summary());
    }
}
