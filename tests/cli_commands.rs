use assert_cmd::cargo;
use assert_fs::prelude::*;
use filetime::{set_file_mtime, FileTime};
use serde_json::Value;
use std::path::Path;
use std::process::{Command, Output};

/// Run the binary against an empty config so the developer's own settings
/// never leak into the test.
fn filedesk(cfg_dir: &Path, args: &[&str]) -> Output {
    let me = cargo::cargo_bin!("filedesk");
    Command::new(me)
        .env("FILEDESK_CONFIG", cfg_dir.join("absent.xml"))
        .args(args)
        .output()
        .expect("spawn binary")
}

fn json(out: &Output) -> Value {
    serde_json::from_slice(&out.stdout).unwrap_or_else(|e| {
        panic!(
            "stdout is not JSON ({e}): {}",
            String::from_utf8_lossy(&out.stdout)
        )
    })
}

fn s(p: &Path) -> &str {
    p.to_str().unwrap()
}

#[test]
fn print_config_succeeds() {
    let td = assert_fs::TempDir::new().unwrap();
    let out = filedesk(td.path(), &["--print-config"]);
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).contains("absent.xml"));
}

#[test]
fn list_json_has_entry_fields() {
    let td = assert_fs::TempDir::new().unwrap();
    let docs = td.child("docs");
    docs.child("budget.xlsx").write_str("1234").unwrap();
    docs.child("old").create_dir_all().unwrap();

    let out = filedesk(td.path(), &["list", s(docs.path()), "--json"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let v = json(&out);
    let entries = v.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["name"], "old");
    assert_eq!(entries[0]["kind"], "directory");
    assert!(entries[0]["extension"].is_null());
    assert_eq!(entries[1]["name"], "budget.xlsx");
    assert_eq!(entries[1]["size_bytes"], 4);
    assert_eq!(entries[1]["extension"], "xlsx");
}

#[test]
fn list_missing_folder_fails_with_hint() {
    let td = assert_fs::TempDir::new().unwrap();
    let out = filedesk(td.path(), &["list", s(td.child("nowhere").path())]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("does not exist"));
}

#[test]
fn mkdir_rename_delete_round_trip() {
    let td = assert_fs::TempDir::new().unwrap();
    let made = td.child("clients/acme");
    let moved = td.child("clients/acme-ltd");

    let out = filedesk(td.path(), &["mkdir", s(made.path()), "--json"]);
    assert!(out.status.success());
    assert_eq!(json(&out)["kind"], "directory");

    let out = filedesk(td.path(), &["rename", s(made.path()), s(moved.path())]);
    assert!(out.status.success());
    assert!(moved.path().is_dir());

    let out = filedesk(td.path(), &["delete", s(moved.path()), "--json"]);
    assert!(out.status.success());
    assert_eq!(json(&out)[0]["deleted"], true);
    assert!(!moved.path().exists());
}

#[test]
fn delete_of_missing_item_succeeds() {
    let td = assert_fs::TempDir::new().unwrap();
    let out = filedesk(td.path(), &["delete", s(td.child("gone.pdf").path())]);
    assert!(out.status.success());
}

#[test]
fn rename_onto_existing_fails() {
    let td = assert_fs::TempDir::new().unwrap();
    td.child("a.pdf").write_str("a").unwrap();
    td.child("b.pdf").write_str("b").unwrap();
    let out = filedesk(
        td.path(),
        &["rename", s(td.child("a.pdf").path()), s(td.child("b.pdf").path())],
    );
    assert!(!out.status.success());
    assert_eq!(std::fs::read_to_string(td.child("b.pdf").path()).unwrap(), "b");
}

#[test]
fn transfer_renames_first_file_only() {
    let td = assert_fs::TempDir::new().unwrap();
    let a = td.child("in/scan-001.pdf");
    let b = td.child("in/scan-002.pdf");
    a.write_str("a").unwrap();
    b.write_str("b").unwrap();
    let out_dir = td.child("out");
    out_dir.create_dir_all().unwrap();

    let out = filedesk(
        td.path(),
        &[
            "transfer",
            s(a.path()),
            s(b.path()),
            "--to",
            s(out_dir.path()),
            "--rename",
            "contract.docx",
            "--json",
        ],
    );
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let v = json(&out);
    assert_eq!(v["preview"], false);
    assert_eq!(v["per_file_status"][0]["outcome"], "Success");
    assert!(out_dir.child("contract.pdf").path().exists());
    assert!(out_dir.child("scan-002.pdf").path().exists());
    assert!(!a.path().exists());
    assert!(!b.path().exists());
}

#[test]
fn transfer_failure_exits_nonzero_but_reports_every_file() {
    let td = assert_fs::TempDir::new().unwrap();
    let a = td.child("in/a.pdf");
    let b = td.child("in/b.pdf");
    a.write_str("a").unwrap();
    b.write_str("b").unwrap();
    td.child("out/a.pdf").write_str("existing").unwrap();

    let out = filedesk(
        td.path(),
        &["transfer", s(a.path()), s(b.path()), "--to", s(td.child("out").path()), "--json"],
    );
    assert!(!out.status.success());

    let v = json(&out);
    assert_eq!(v["per_file_status"][0]["outcome"], "Failure");
    assert_eq!(v["per_file_status"][0]["error_detail"]["kind"], "destination_exists");
    assert_eq!(v["per_file_status"][1]["outcome"], "Success");
    assert!(a.path().exists());
}

#[test]
fn transfer_last_n_preview_moves_nothing() {
    let td = assert_fs::TempDir::new().unwrap();
    let inbox = td.child("Downloads");
    for (name, secs) in [("old.pdf", 100), ("newest.pdf", 300), ("middle.pdf", 200)] {
        let f = inbox.child(name);
        f.write_str(name).unwrap();
        set_file_mtime(f.path(), FileTime::from_unix_time(1_700_000_000 + secs, 0)).unwrap();
    }
    let out_dir = td.child("work");
    out_dir.create_dir_all().unwrap();

    let out = filedesk(
        td.path(),
        &[
            "transfer",
            "--last",
            "2",
            "--from",
            s(inbox.path()),
            "--to",
            s(out_dir.path()),
            "--preview",
            "--json",
        ],
    );
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let v = json(&out);
    let statuses = v["per_file_status"].as_array().unwrap();
    assert_eq!(statuses.len(), 2);
    assert!(statuses[0]["source"].as_str().unwrap().ends_with("newest.pdf"));
    assert!(statuses[1]["source"].as_str().unwrap().ends_with("middle.pdf"));
    assert_eq!(v["preview"], true);
    assert!(inbox.child("newest.pdf").path().exists());
    assert!(!out_dir.child("newest.pdf").path().exists());
}
