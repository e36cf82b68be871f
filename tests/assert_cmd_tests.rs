//! Integration tests for CLI execution using `assert_cmd`.
//!
//! These tests invoke the compiled binary against a copy of the project in
//! `tests/data/generic` and check what each subcommand writes.

use anyhow::{Context, Result, ensure};
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::{TempDir, tempdir};

const PROJECT: &str = "tests/data/generic";

/// Copy the sample project into a fresh temporary directory.
fn project() -> Result<TempDir> {
    let temp = tempdir().context("create temp dir for project")?;
    copy_dir(Path::new(PROJECT), temp.path())?;
    Ok(temp)
}

fn copy_dir(from: &Path, to: &Path) -> Result<()> {
    fs::create_dir_all(to).with_context(|| format!("create {}", to.display()))?;
    for entry in fs::read_dir(from).with_context(|| format!("read {}", from.display()))? {
        let entry = entry?;
        let target = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)
                .with_context(|| format!("copy {}", entry.path().display()))?;
        }
    }
    Ok(())
}

fn boardsmith() -> Result<Command> {
    Command::cargo_bin("boardsmith").context("locate boardsmith binary")
}

#[test]
fn resolve_prints_composition_json() -> Result<()> {
    let temp = project()?;
    let output = boardsmith()?
        .current_dir(temp.path())
        .output()
        .context("run boardsmith")?;
    ensure!(output.status.success(), "resolve should succeed");

    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).context("parse resolve output")?;
    let units: Vec<&str> = json["units"]
        .as_array()
        .context("units array")?
        .iter()
        .filter_map(|u| u["name"].as_str())
        .collect();
    ensure!(units == ["crypto", "firmware"], "unexpected order {units:?}");
    let bt = &json["board"]["settings"]["CONFIG_BT_ENABLED"];
    ensure!(bt["value"] == "y", "later fragment should win: {bt}");
    ensure!(bt["origin"] == "boards/sdkconfig.ble", "origin: {bt}");
    ensure!(
        json["fingerprint"].as_str().is_some_and(|f| f.len() == 64),
        "fingerprint should be a SHA-256 hex digest"
    );
    Ok(())
}

#[test]
fn resolve_writes_output_relative_to_directory() -> Result<()> {
    let temp = project()?;
    boardsmith()?
        .arg("-C")
        .arg(temp.path())
        .args(["resolve", "--output", "composition.json"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
    ensure!(
        temp.path().join("composition.json").exists(),
        "resolve --output should write inside the -C directory"
    );
    Ok(())
}

#[test]
fn cmake_subcommand_writes_snippet() -> Result<()> {
    let temp = project()?;
    let out = temp.path().join("board.cmake");
    boardsmith()?
        .current_dir(temp.path())
        .arg("cmake")
        .arg(&out)
        .assert()
        .success();
    let snippet = fs::read_to_string(&out).context("read snippet")?;
    ensure!(
        snippet.contains("add_library(crypto INTERFACE)"),
        "missing crypto target: {snippet}"
    );
    ensure!(
        snippet.contains("target_link_libraries(firmware INTERFACE crypto)"),
        "missing link: {snippet}"
    );
    ensure!(
        snippet.contains("set(BOARD_FEATURE_BUSES \"i2c;spi\")"),
        "missing feature set: {snippet}"
    );
    let crypto = snippet.find("add_library(crypto").context("crypto")?;
    let firmware = snippet.find("add_library(firmware").context("firmware")?;
    ensure!(crypto < firmware, "dependency should precede consumer");
    Ok(())
}

#[test]
fn sdkconfig_streams_to_stdout_when_dash() -> Result<()> {
    let temp = project()?;
    boardsmith()?
        .current_dir(temp.path())
        .args(["sdkconfig", "-"])
        .assert()
        .success()
        .stdout(concat!(
            "# Generated by boardsmith. Do not edit.\n",
            "CONFIG_BT_ENABLED=y\n",
            "CONFIG_LOG_DEFAULT_LEVEL=3\n",
            "CONFIG_PARTITION_TABLE_CUSTOM_FILENAME=\"partitions.csv\"\n",
            "CONFIG_BT_NIMBLE_ENABLED=y\n",
            "# CONFIG_BT_BLUEDROID_ENABLED is not set\n",
        ));
    ensure!(
        !temp.path().join("-").exists(),
        "sdkconfig - should not create a file named '-'"
    );
    Ok(())
}

#[test]
fn check_reports_summary() -> Result<()> {
    let temp = project()?;
    boardsmith()?
        .current_dir(temp.path())
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "ok: 2 unit(s), 1 link(s), 5 setting(s), fingerprint ",
        ));
    Ok(())
}

#[test]
fn missing_fragments_are_reported_together() -> Result<()> {
    let temp = project()?;
    fs::remove_file(temp.path().join("boards/sdkconfig.base"))?;
    fs::remove_file(temp.path().join("boards/sdkconfig.ble"))?;
    boardsmith()?
        .current_dir(temp.path())
        .arg("check")
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(
            predicate::str::contains("boards/sdkconfig.base")
                .and(predicate::str::contains("boards/sdkconfig.ble")),
        );
    Ok(())
}

#[test]
fn cyclic_links_fail_with_diagnostic() -> Result<()> {
    let temp = project()?;
    let boardfile = temp.path().join("Boardfile");
    let mut text = fs::read_to_string(&boardfile)?;
    text = text.replace(
        "links:\n",
        "links:\n  - consumer: crypto\n    dependency: firmware\n",
    );
    fs::write(&boardfile, text)?;
    boardsmith()?
        .current_dir(temp.path())
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("crypto -> firmware -> crypto"));
    Ok(())
}

#[test]
fn malformed_boardfile_points_at_source() -> Result<()> {
    let temp = project()?;
    fs::write(
        temp.path().join("Boardfile"),
        "boardsmith_version: \"1.0.0\"\nboard:\n\tid: 3\n",
    )?;
    boardsmith()?
        .current_dir(temp.path())
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Boardfile"));
    Ok(())
}
