//! Command line tests

use std::fs;
use std::io::Write;
use std::process::{Command, Stdio};

use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn masker() -> Command {
    Command::new(env!("CARGO_BIN_EXE_sqldump-masker"))
}

#[test]
fn test_masks_file_to_file() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.sql");
    let output = dir.path().join("out.sql");
    fs::write(
        &input,
        "SET x = 1;\nINSERT INTO t (a,b) VALUES ('John Doe','abc');\n",
    )
    .unwrap();

    let status = masker()
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .arg("--policy")
        .arg("0=mask")
        .status()
        .unwrap();

    assert!(status.success());
    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        "SET x = 1;\nINSERT INTO t (a,b) VALUES\n('Joh*****','abc');\n"
    );
}

#[test]
fn test_reads_stdin_and_writes_stdout() {
    let mut child = masker()
        .args(&["--policy", "1=id16", "--seed", "7"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"INSERT INTO t (a,b) VALUES (NULL,'x');")
        .unwrap();
    let out = child.wait_with_output().unwrap();

    assert!(out.status.success());
    let text = String::from_utf8(out.stdout).unwrap();
    let id = text
        .strip_prefix("INSERT INTO t (a,b) VALUES\n(NULL,'")
        .and_then(|rest| rest.strip_suffix("');"))
        .unwrap();
    assert_eq!(id.len(), 16);
    assert!(id.bytes().all(|b| b.is_ascii_digit()));
}

#[test]
fn test_rejects_invalid_policy() {
    let out = masker()
        .args(&["--policy", "0=scramble"])
        .stdin(Stdio::null())
        .output()
        .unwrap();

    assert!(!out.status.success());
    let stderr = String::from_utf8(out.stderr).unwrap();
    assert!(stderr.contains("scramble"), "unexpected stderr: {}", stderr);
}

#[test]
fn test_policy_and_preset_conflict() {
    let out = masker()
        .args(&["--policy", "0=mask", "--preset", "individu"])
        .stdin(Stdio::null())
        .output()
        .unwrap();

    assert!(!out.status.success());
}
