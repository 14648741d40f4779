//! Integration tests for the embalign CLI

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to get the path to a test fixture
fn fixture_path(name: &str) -> String {
    format!("tests/fixtures/{}", name)
}

fn embalign() -> Command {
    Command::cargo_bin("embalign").unwrap()
}

#[test]
fn test_align_source_and_target_files() {
    embalign()
        .arg("align")
        .arg("-s")
        .arg(fixture_path("src.txt"))
        .arg("-t")
        .arg(fixture_path("tgt.txt"))
        .arg("-q")
        .assert()
        .success()
        .stdout("0-0 1-1 2-2 3-3\n0-0 1-1 2-2 3-3 4-4\n");
}

#[test]
fn test_align_parallel_file() {
    embalign()
        .arg("align")
        .arg("-p")
        .arg(fixture_path("pairs.txt"))
        .arg("--token-type")
        .arg("word")
        .arg("-m")
        .arg("inter")
        .arg("-q")
        .assert()
        .success()
        .stdout("0-0 1-1 2-2 3-3\n0-0 1-1 2-2 3-3 4-4\n");
}

#[test]
fn test_every_mode_runs() {
    for mode in ["direct", "span-iter", "span-freq", "span-bidir"] {
        embalign()
            .arg("align")
            .arg("-p")
            .arg(fixture_path("pairs.txt"))
            .arg("--mode")
            .arg(mode)
            .arg("-q")
            .assert()
            .success()
            .stdout(predicate::str::is_match(r"^([0-9]+-[0-9]+( [0-9]+-[0-9]+)*)?\n").unwrap());
    }
}

#[test]
fn test_json_output() {
    embalign()
        .arg("align")
        .arg("-p")
        .arg(fixture_path("pairs.txt"))
        .arg("-f")
        .arg("json")
        .arg("-q")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"alignments\""))
        .stdout(predicate::str::contains("\"metadata\""))
        .stdout(predicate::str::contains("\"scores\""))
        .stdout(predicate::str::contains("\"provider\": \"hashing\""));
}

#[test]
fn test_all_methods_output() {
    embalign()
        .arg("align")
        .arg("-p")
        .arg(fixture_path("pairs.txt"))
        .arg("-m")
        .arg("fra")
        .arg("--all-methods")
        .arg("-q")
        .assert()
        .success()
        .stdout(predicate::str::contains("0\tfwd\t"))
        .stdout(predicate::str::contains("0\trev\t"))
        .stdout(predicate::str::contains("1\tinter\t"));
}

#[test]
fn test_output_to_file() {
    let temp_dir = TempDir::new().unwrap();
    let output_file = temp_dir.path().join("links.txt");

    embalign()
        .arg("align")
        .arg("-p")
        .arg(fixture_path("pairs.txt"))
        .arg("-o")
        .arg(&output_file)
        .arg("-q")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let content = fs::read_to_string(&output_file).unwrap();
    assert_eq!(content.lines().count(), 2);
    assert!(content.starts_with("0-0 1-1 2-2 3-3"));
}

#[test]
fn test_precomputed_embeddings() {
    let temp_dir = TempDir::new().unwrap();
    let embeddings = temp_dir.path().join("vectors.jsonl");
    let pairs = temp_dir.path().join("pairs.txt");
    fs::write(
        &embeddings,
        concat!(
            r#"{"sentence": "ja nein", "subwords": [["ja"], ["nein"]], "vectors": [[0.0, 1.0], [1.0, 0.0]]}"#,
            "\n",
            r#"{"sentence": "no yes", "subwords": [["no"], ["yes"]], "vectors": [[1.0, 0.1], [0.1, 1.0]]}"#,
            "\n",
        ),
    )
    .unwrap();
    fs::write(&pairs, "ja nein ||| no yes\n").unwrap();

    embalign()
        .arg("align")
        .arg("-p")
        .arg(&pairs)
        .arg("--embeddings")
        .arg(&embeddings)
        .arg("-q")
        .assert()
        .success()
        .stdout("0-1 1-0\n");
}

#[test]
fn test_length_mismatch_fails() {
    embalign()
        .arg("align")
        .arg("-s")
        .arg(fixture_path("src.txt"))
        .arg("-t")
        .arg(fixture_path("short.txt"))
        .arg("-q")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Processing error"));
}

#[test]
fn test_missing_file_fails() {
    embalign()
        .arg("align")
        .arg("-p")
        .arg("tests/fixtures/does-not-exist.txt")
        .arg("-q")
        .assert()
        .failure()
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn test_invalid_ratio_fails() {
    embalign()
        .arg("align")
        .arg("-p")
        .arg(fixture_path("pairs.txt"))
        .arg("--distortion")
        .arg("1.5")
        .arg("-q")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn test_config_file_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("embalign.toml");

    embalign()
        .arg("generate-config")
        .arg("-o")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("generated successfully"));

    embalign()
        .arg("validate")
        .arg("-c")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"));

    embalign()
        .arg("align")
        .arg("-p")
        .arg(fixture_path("pairs.txt"))
        .arg("-c")
        .arg(&config)
        .arg("-q")
        .assert()
        .success()
        .stdout(predicate::str::contains("0-0 1-1 2-2 3-3"));
}

#[test]
fn test_validate_rejects_bad_config() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("bad.toml");
    fs::write(&config, "[alignment]\nmode = \"sideways\"\n").unwrap();

    embalign()
        .arg("validate")
        .arg("-c")
        .arg(&config)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Configuration is invalid"));
}

#[test]
fn test_list_commands() {
    embalign()
        .arg("list")
        .arg("methods")
        .assert()
        .success()
        .stdout(predicate::str::contains("itermax"))
        .stdout(predicate::str::contains("mwmf"));

    embalign()
        .arg("list")
        .arg("modes")
        .assert()
        .success()
        .stdout(predicate::str::contains("span-freq"));

    embalign()
        .arg("list")
        .arg("formats")
        .assert()
        .success()
        .stdout(predicate::str::contains("json"));
}

#[test]
fn test_help_and_version() {
    embalign()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("align"));

    embalign()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("embalign"));
}
