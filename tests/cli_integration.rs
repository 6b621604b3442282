//! Integration tests for the KekVault CLI.
//!
//! These tests exercise the binary end-to-end using `assert_cmd`. Each
//! test runs in its own temp directory with master keys supplied through
//! the environment, the way a deployment would supply them.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use predicates::prelude::*;

/// Helper: get a Command pointing at the kekvault binary, with no key
/// configuration inherited from the caller's environment.
fn kekvault() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("kekvault").expect("binary should exist");
    cmd.env_remove("MASTER_KEKS_JSON")
        .env_remove("MASTER_KEK_B64")
        .env_remove("MASTER_KEK_PRIMARY_ID")
        .env_remove("KEKVAULT_DB")
        .env_remove("KEKVAULT_ACTOR")
        .env_remove("RUST_LOG");
    cmd
}

fn key(byte: u8) -> String {
    BASE64.encode([byte; 32])
}

/// A command running in `dir` with one legacy master key.
fn keyed(dir: &TempDir) -> Command {
    let mut cmd = kekvault();
    cmd.current_dir(dir.path())
        .env("MASTER_KEK_B64", key(0x21))
        .env("KEKVAULT_ACTOR", "ci");
    cmd
}

#[test]
fn help_flag_shows_usage() {
    kekvault()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("envelope encryption"))
        .stdout(predicate::str::contains("write"))
        .stdout(predicate::str::contains("read"))
        .stdout(predicate::str::contains("history"))
        .stdout(predicate::str::contains("rotate"))
        .stdout(predicate::str::contains("audit"));
}

#[test]
fn version_flag_shows_version() {
    kekvault()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("kekvault"));
}

#[test]
fn no_args_shows_help() {
    kekvault()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn missing_master_key_fails_before_touching_storage() {
    let tmp = TempDir::new().unwrap();

    kekvault()
        .current_dir(tmp.path())
        .args(["write", "db/password", "x", "--actor", "ci"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("MASTER_KEKS_JSON"));

    tmp.child("kekvault.db").assert(predicate::path::missing());
}

#[test]
fn write_then_read_roundtrip() {
    let tmp = TempDir::new().unwrap();

    keyed(&tmp)
        .args(["write", "db/password", "s3cret"])
        .assert()
        .success()
        .stdout(predicate::str::contains("version 1"));

    keyed(&tmp)
        .args(["write", "db/password"])
        .write_stdin("rotated\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("version 2"));

    keyed(&tmp)
        .args(["read", "db/password"])
        .assert()
        .success()
        .stdout("rotated\n");

    keyed(&tmp)
        .args(["read", "db/password", "--version", "1"])
        .assert()
        .success()
        .stdout("s3cret\n");

    tmp.child("kekvault.db").assert(predicate::path::exists());
}

#[test]
fn piped_value_keeps_trailing_whitespace() {
    let tmp = TempDir::new().unwrap();

    keyed(&tmp)
        .args(["write", "spaced"])
        .write_stdin("pass \t\n")
        .assert()
        .success();

    keyed(&tmp)
        .args(["read", "spaced"])
        .assert()
        .success()
        .stdout("pass \t\n");

    // A value ending in a newline comes back with it, plus the one `read` adds.
    keyed(&tmp)
        .args(["write", "multiline"])
        .write_stdin("line one\nline two\n\n")
        .assert()
        .success();

    keyed(&tmp)
        .args(["read", "multiline"])
        .assert()
        .success()
        .stdout("line one\nline two\n\n");
}

#[test]
fn read_with_wrong_master_key_fails() {
    let tmp = TempDir::new().unwrap();

    keyed(&tmp).args(["write", "k", "v"]).assert().success();

    // Same id ("primary"), different key material.
    keyed(&tmp)
        .env("MASTER_KEK_B64", key(0x99))
        .args(["read", "k"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Authentication failed"));
}

#[test]
fn read_missing_secret_fails() {
    let tmp = TempDir::new().unwrap();

    keyed(&tmp)
        .args(["read", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope"));
}

#[test]
fn history_and_list_need_no_keys() {
    let tmp = TempDir::new().unwrap();
    keyed(&tmp).args(["write", "alpha", "1"]).assert().success();
    keyed(&tmp).args(["write", "alpha", "2"]).assert().success();

    kekvault()
        .current_dir(tmp.path())
        .args(["history", "alpha"])
        .assert()
        .success()
        .stdout(predicate::str::contains("alpha: 2 versions"));

    kekvault()
        .current_dir(tmp.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("alpha"));
}

#[test]
fn rotate_moves_rows_to_new_primary() {
    let tmp = TempDir::new().unwrap();
    let old_only = format!(r#"[{{"id":"old","key":"{}"}}]"#, key(1));
    let both = format!(
        r#"[{{"id":"old","key":"{}"}},{{"id":"new","key":"{}"}}]"#,
        key(1),
        key(2)
    );

    keyed(&tmp)
        .env("MASTER_KEKS_JSON", &old_only)
        .args(["write", "svc", "value"])
        .assert()
        .success();

    keyed(&tmp)
        .env("MASTER_KEKS_JSON", &both)
        .env("MASTER_KEK_PRIMARY_ID", "new")
        .arg("rotate")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 of 1 row(s) re-wrapped under 'new'"));

    // "old" can now be retired.
    keyed(&tmp)
        .env("MASTER_KEKS_JSON", format!(r#"[{{"id":"new","key":"{}"}}]"#, key(2)))
        .args(["read", "svc"])
        .assert()
        .success()
        .stdout("value\n");

    kekvault()
        .current_dir(tmp.path())
        .args(["history", "svc"])
        .assert()
        .success()
        .stdout(predicate::str::contains("new"));
}

#[test]
fn audit_lists_reads_and_writes() {
    let tmp = TempDir::new().unwrap();
    keyed(&tmp).args(["write", "audited", "v"]).assert().success();
    keyed(&tmp)
        .env("KEKVAULT_ACTOR", "reader-7")
        .args(["read", "audited"])
        .assert()
        .success();

    kekvault()
        .current_dir(tmp.path())
        .args(["audit", "--since", "1h"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 audit entries"))
        .stdout(predicate::str::contains("reader-7"));

    kekvault()
        .current_dir(tmp.path())
        .args(["prune-audit", "--days", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 0"));
}

#[test]
fn db_flag_and_settings_file_choose_the_database() {
    let tmp = TempDir::new().unwrap();
    tmp.child(".kekvault.toml")
        .write_str("db_path = \"from-settings.db\"\n")
        .unwrap();

    keyed(&tmp).args(["write", "a", "1"]).assert().success();
    tmp.child("from-settings.db").assert(predicate::path::exists());

    keyed(&tmp)
        .args(["--db", "explicit.db", "write", "b", "1"])
        .assert()
        .success();
    tmp.child("explicit.db").assert(predicate::path::exists());
}

#[test]
fn completions_generate_for_bash() {
    kekvault()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("kekvault"));
}
