//! End-to-end tests for the `graph` command.
//!
//! `graph` is read-only; these tests check its tree and JSON renderings.

mod common;
use common::prelude::*;

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_graph_help() {
    cargo_bin_cmd!("graphsmith")
        .args(["graph", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--depth"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_graph_tree_shows_dependencies() {
    let fixture = TestFixture::new().with_shop();

    fixture
        .command()
        .arg("graph")
        .assert()
        .success()
        .stdout(predicate::str::contains("Shop"))
        .stdout(predicate::str::contains("App [app]"))
        .stdout(predicate::str::contains("Core [framework]"))
        .stdout(predicate::str::contains("Logging (package)"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_graph_depth_zero_shows_roots_only() {
    let fixture = TestFixture::new().with_shop();

    fixture
        .command()
        .args(["graph", "--depth", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("App [app]"))
        .stdout(predicate::str::contains("Core [framework]").not());
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_graph_json_output() {
    let fixture = TestFixture::new().with_shop();

    let output = fixture.command().args(["graph", "--json"]).output().unwrap();
    assert!(output.status.success());
    let graph: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(graph["name"], "Shop");
    assert!(graph["dependencies"].is_array());
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_graph_uses_configured_derived_directory() {
    let fixture = TestFixture::new()
        .with_shop()
        .with_config("generation:\n  derived_directory: Generated\n");

    let output = fixture.command().args(["graph", "--json"]).output().unwrap();
    assert!(output.status.success());
    let graph: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let derived: Vec<&str> = graph["projects"]
        .as_object()
        .unwrap()
        .values()
        .filter_map(|project| project["derived_directory"].as_str())
        .collect();
    assert_eq!(derived.len(), 2);
    assert!(derived.iter().all(|path| path.ends_with("Generated")));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_graph_does_not_write_files() {
    let fixture = TestFixture::new().with_shop();

    fixture.command().arg("graph").assert().success();
    fixture.child("App/Derived").assert(predicate::path::missing());
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_graph_cycle_fails() {
    let fixture = TestFixture::new().with_manifest(manifests::CYCLE);

    fixture
        .command()
        .arg("graph")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cycle detected"));
}
