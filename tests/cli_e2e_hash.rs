//! End-to-end tests for the `hash` command.
//!
//! These tests invoke the actual CLI binary against temporary workspaces.

mod common;
use common::prelude::*;

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_hash_help() {
    cargo_bin_cmd!("graphsmith")
        .args(["hash", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Print the cache hashes"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_hash_prints_cacheable_targets_only() {
    let fixture = TestFixture::new().with_shop();

    fixture
        .command()
        .arg("hash")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"(?m)^Core  [0-9a-f]{32}$").unwrap())
        .stdout(predicate::str::contains("App ").not());
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_hash_is_stable_across_runs() {
    let fixture = TestFixture::new().with_shop();
    assert_eq!(fixture.target_hash("Core"), fixture.target_hash("Core"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_hash_changes_with_source_content() {
    let fixture = TestFixture::new().with_shop();
    let before = fixture.target_hash("Core");

    fixture
        .child("Core/Sources/Core.swift")
        .write_str("public struct Core { let id = 1 }\n")
        .unwrap();
    assert_ne!(before, fixture.target_hash("Core"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_hash_changes_with_additional_strings() {
    let fixture = TestFixture::new().with_shop();
    let before = fixture.target_hash("Core");

    fixture
        .child(".graphsmith.yaml")
        .write_str("hashing:\n  additional_strings: [toolchain-6.0]\n")
        .unwrap();
    assert_ne!(before, fixture.target_hash("Core"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_hash_json_output() {
    let fixture = TestFixture::new().with_shop();

    fixture
        .command()
        .args(["hash", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"Core\""))
        .stdout(predicate::str::contains("\"project\""));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_hash_missing_source_fails() {
    let fixture = TestFixture::new()
        .with_manifest(manifests::SHOP)
        .with_file("App/Sources/App.swift", "import Core\n");

    fixture
        .command()
        .arg("hash")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Core.swift"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_hash_missing_manifest_fails() {
    let fixture = TestFixture::new();

    fixture
        .command()
        .arg("hash")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load manifest"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_hash_invalid_config_reports_hint() {
    let fixture = TestFixture::new()
        .with_shop()
        .with_config("hashng:\n  additional_strings: []\n");

    fixture
        .command()
        .arg("hash")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown field"))
        .stderr(predicate::str::contains("hint"));
}
