#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn notes_cmd(root: &Path) -> Command {
    let mut cmd = Command::new(cargo_bin("stickynotes"));
    cmd.env_remove("RUST_LOG")
        .env("NO_COLOR", "1")
        .env("DATA_DIR", root.join("data"))
        .env("CONFIG_DIR", root.join("config"))
        .env("STICKYNOTES_KDF_MEMORY_KIB", "64")
        .env("STICKYNOTES_KDF_ITERATIONS", "1");
    cmd
}

fn first_id(root: &Path) -> String {
    let out = notes_cmd(root).args(["list", "--json"]).output().unwrap();
    let notes: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    notes[0]["id"].as_str().unwrap().to_string()
}

#[test]
fn test_cli_create_save_show_delete() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    notes_cmd(root)
        .args(["create", "Groceries"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created note"));

    let id = first_id(root);

    notes_cmd(root)
        .args(["save", &id])
        .write_stdin("milk\neggs\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("rev 2"));

    notes_cmd(root)
        .args(["show", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Groceries"))
        .stdout(predicate::str::contains("milk"));

    notes_cmd(root).args(["delete", &id]).assert().success();
    notes_cmd(root)
        .args(["list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No notes found."));

    notes_cmd(root)
        .args(["list", "--deleted", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"deleted\": true"));
}

#[test]
fn test_cli_encryption_flow() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    notes_cmd(root).args(["create", "Secret"]).assert().success();
    let id = first_id(root);
    notes_cmd(root)
        .args(["save", &id, "launch codes"])
        .assert()
        .success();

    notes_cmd(root)
        .args(["encrypt", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No encryption key configured"));

    notes_cmd(root)
        .args(["encryption", "set", "pw"])
        .assert()
        .success();
    assert!(root.join("config").join("encryption.json").exists());

    notes_cmd(root)
        .args(["encrypt", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("encrypted"));

    let content_file = fs::read_dir(root.join("data").join("notes"))
        .unwrap()
        .map(|e| e.unwrap().path())
        .find(|p| p.extension().is_some_and(|e| e == "md"))
        .unwrap();
    assert!(!fs::read_to_string(content_file).unwrap().contains("launch"));

    notes_cmd(root)
        .args(["encryption", "disable", "wrong"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Passphrase is incorrect"));

    notes_cmd(root)
        .args(["encryption", "disable", "pw"])
        .assert()
        .success()
        .stdout(predicate::str::contains("decrypted 1 notes"));

    notes_cmd(root)
        .args(["show", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("launch codes"));
}

#[test]
fn test_cli_unknown_note_exits_with_error() {
    let temp = TempDir::new().unwrap();
    notes_cmd(temp.path())
        .args(["show", "deadbeef"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: Note not found: deadbeef"));
}

#[test]
fn test_cli_import_and_journal() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    let src = root.join("incoming");
    fs::create_dir_all(&src).unwrap();
    fs::write(src.join("Recipe.md"), "# Bread").unwrap();
    fs::write(src.join("photo.png"), "x").unwrap();

    notes_cmd(root)
        .arg("import")
        .arg(src.join("Recipe.md"))
        .arg(src.join("photo.png"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported Recipe"))
        .stdout(predicate::str::contains("photo.png: Unsupported file type"));

    notes_cmd(root)
        .args(["journal", "today", "2024-05-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created journal entry"));
    notes_cmd(root)
        .args(["journal", "today", "2024-05-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Found journal entry"));
    notes_cmd(root)
        .args(["journal", "digest", "2024", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("# 2024-05-01 Wednesday"));
}
