use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

fn create_test_files(dir: impl AsRef<Path>, files: &[(&str, &str)]) -> Result<()> {
    for (name, content) in files {
        let path = dir.as_ref().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
    }
    Ok(())
}

/// A command isolated from any user or working-directory configuration
fn logsift(sandbox: &TempDir) -> Result<Command> {
    let mut cmd = Command::cargo_bin("logsift-cli")?;
    cmd.current_dir(sandbox.path())
        .env("HOME", sandbox.path())
        .env("XDG_CONFIG_HOME", sandbox.path().join(".config"))
        .env_remove("RUST_LOG");
    Ok(cmd)
}

#[test]
fn test_search_prints_matches() -> Result<()> {
    let sandbox = tempdir()?;
    let logs = sandbox.path().join("logs");
    create_test_files(
        &logs,
        &[
            ("zimbra.log", "2024 ERROR: timeout reached\n2024 ERROR: disk full\n"),
            ("zimbra.log.1.gz", "2024 ERROR: timeout reached\n"),
        ],
    )?;

    logsift(&sandbox)?
        .args(["search", "--no-color", "--no-progress", "-c", "-zimbra", "-d"])
        .arg(&logs)
        .args(["error", "and", "timeout"])
        .assert()
        .success()
        .stdout(predicate::str::contains("zimbra.log - Line 1] 2024 ERROR: timeout reached"))
        .stdout(predicate::str::contains("disk full").not())
        .stdout(predicate::str::contains(".gz").not())
        .stderr(predicate::str::contains("Search completed."));
    Ok(())
}

#[test]
fn test_no_matches_exit_code() -> Result<()> {
    let sandbox = tempdir()?;
    create_test_files(sandbox.path(), &[("mailbox.log", "all quiet\n")])?;

    logsift(&sandbox)?
        .args(["search", "--no-color", "-c", "mailbox", "-d", "."])
        .args(["needle", "or", "haystack"])
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains(
            "No matches found for keywords: needle or haystack.",
        ));
    Ok(())
}

#[test]
fn test_no_files_exit_code() -> Result<()> {
    let sandbox = tempdir()?;
    create_test_files(sandbox.path(), &[("mailbox.log", "anything\n")])?;

    logsift(&sandbox)?
        .args(["search", "-c", "audit", "-d", ".", "anything"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "No log files found for category 'audit'",
        ));
    Ok(())
}

#[test]
fn test_unknown_category_is_fatal() -> Result<()> {
    let sandbox = tempdir()?;

    logsift(&sandbox)?
        .args(["search", "-c", "-syslog", "-d", ".", "root"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Unknown category '-syslog'"))
        .stderr(predicate::str::contains("zimbra"));
    Ok(())
}

#[test]
fn test_missing_directory_is_fatal() -> Result<()> {
    let sandbox = tempdir()?;

    logsift(&sandbox)?
        .args(["search", "-d", "does-not-exist", "root"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("does-not-exist"))
        .stderr(predicate::str::contains("does not exist"));
    Ok(())
}

#[test]
fn test_query_of_only_operators_is_fatal() -> Result<()> {
    let sandbox = tempdir()?;
    create_test_files(sandbox.path(), &[("audit.log", "or and\n")])?;

    logsift(&sandbox)?
        .args(["search", "-d", ".", "and", "or"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No keywords"));
    Ok(())
}

#[test]
fn test_raw_query_keeps_phrases() -> Result<()> {
    let sandbox = tempdir()?;
    create_test_files(
        sandbox.path(),
        &[("audit.log", "login failed for root\nfailed to login\n")],
    )?;

    logsift(&sandbox)?
        .args(["search", "--no-color", "-d", ".", "--raw", r#""login failed""#])
        .assert()
        .success()
        .stdout(predicate::str::contains("Line 1] login failed for root"))
        .stdout(predicate::str::contains("Line 2").not());
    Ok(())
}

#[test]
fn test_json_output() -> Result<()> {
    let sandbox = tempdir()?;
    create_test_files(sandbox.path(), &[("ip_block.list", "blocked 10.0.0.1\n")])?;

    logsift(&sandbox)?
        .args(["search", "--json", "-c", "ip", "-d", ".", "BLOCKED"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""line_number":1"#))
        .stdout(predicate::str::contains(r#""line_text":"blocked 10.0.0.1""#));
    Ok(())
}

#[test]
fn test_output_file_gets_plain_lines() -> Result<()> {
    let sandbox = tempdir()?;
    create_test_files(
        sandbox.path(),
        &[("fail2ban.log", "Ban 10.0.0.1\nUnban 10.0.0.1\n")],
    )?;
    let saved = sandbox.path().join("results.txt");

    logsift(&sandbox)?
        .args(["search", "-c", "fail2ban", "-d", ".", "-o"])
        .arg(&saved)
        .arg("unban")
        .assert()
        .success();

    let content = fs::read_to_string(&saved)?;
    assert_eq!(content.lines().count(), 1);
    assert!(content.contains(" - Line 2] Unban 10.0.0.1"));
    assert!(!content.contains('\u{1b}'));
    Ok(())
}

#[test]
fn test_unreadable_file_reported_inline() -> Result<()> {
    let sandbox = tempdir()?;
    create_test_files(sandbox.path(), &[("mailbox.log.1", "login ok\n")])?;
    fs::write(sandbox.path().join("mailbox.log"), b"login \xff\n")?;

    logsift(&sandbox)?
        .args(["search", "--no-color", "-c", "mailbox", "-d", ".", "login"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mailbox.log.1 - Line 1] login ok"))
        .stderr(predicate::str::contains("Invalid UTF-8"));

    logsift(&sandbox)?
        .args(["search", "--no-color", "-c", "mailbox", "-d", ".", "--encoding", "lossy", "login"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mailbox.log - Line 1]"));
    Ok(())
}

#[test]
fn test_flat_mode_and_config_file() -> Result<()> {
    let sandbox = tempdir()?;
    create_test_files(
        sandbox.path(),
        &[
            ("logs/access.log", "GET /index\n"),
            ("logs/old/access.log.1", "GET /index\n"),
        ],
    )?;
    let config = sandbox.path().join("logsift.yaml");
    fs::write(
        &config,
        "root_path: logs\ncategories:\n  nginx: [\"access.log\"]\n",
    )?;

    logsift(&sandbox)?
        .args(["search", "--no-color", "-c", "nginx", "--config"])
        .arg(&config)
        .arg("get")
        .assert()
        .success()
        .stderr(predicate::str::contains("Found 2 matches in 2 files"));

    logsift(&sandbox)?
        .args(["search", "--no-color", "-c", "nginx", "--flat", "--config"])
        .arg(&config)
        .arg("get")
        .assert()
        .success()
        .stderr(predicate::str::contains("Found 1 matches in 1 files"));
    Ok(())
}

#[test]
fn test_categories_lists_builtin_set() -> Result<()> {
    let sandbox = tempdir()?;

    logsift(&sandbox)?
        .arg("categories")
        .assert()
        .success()
        .stdout(predicate::str::contains("Bruteforce"))
        .stdout(predicate::str::contains("fail2ban.log"))
        .stdout(predicate::str::contains("all"));
    Ok(())
}
