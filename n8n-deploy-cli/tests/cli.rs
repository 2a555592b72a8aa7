//! Integration tests for the n8n-deploy commands.

mod common;

use common::{TestEnv, TWO_ENVIRONMENTS};
use predicates::prelude::*;

// ============================================================================
// synth
// ============================================================================

#[test]
fn test_synth_prints_plan_json() {
    let env = TestEnv::with_config(TWO_ENVIRONMENTS);
    let output = env
        .command()
        .args(["synth", "--env", "production"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(plan["environment"], "production");
    let stacks: Vec<&str> = plan["stacks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|stack| stack["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        stacks,
        vec![
            "n8n-production-network",
            "n8n-production-storage",
            "n8n-production-database",
            "n8n-production-compute",
            "n8n-production-access",
        ]
    );
}

#[test]
fn test_synth_writes_output_file() {
    let env = TestEnv::with_example();
    env.command()
        .args(["synth", "-e", "dev", "-t", "minimal", "-o", "out/dev.json"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Synthesized 4 stacks"));

    let written = std::fs::read_to_string(env.path().join("out/dev.json")).unwrap();
    let plan: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(plan["project"], "n8n-serverless");
}

#[test]
fn test_synth_without_env_lists_environments() {
    let env = TestEnv::with_config(TWO_ENVIRONMENTS);
    env.command()
        .arg("synth")
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Available environments:"))
        .stderr(predicate::str::contains("dev"))
        .stderr(predicate::str::contains("production"));
}

#[test]
fn test_synth_with_override() {
    let env = TestEnv::with_config(TWO_ENVIRONMENTS);
    let output = env
        .command()
        .args(["synth", "--env", "dev", "--set", "database={type: postgres}"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(plan["stacks"]
        .as_array()
        .unwrap()
        .iter()
        .any(|stack| stack["component"] == "database"));
}

// ============================================================================
// show
// ============================================================================

#[test]
fn test_show_scopes_to_environment() {
    let env = TestEnv::with_config(TWO_ENVIRONMENTS);
    env.command()
        .args(["show", "--env", "dev"])
        .assert()
        .success()
        .stdout(predicate::str::contains("dev:"))
        .stdout(predicate::str::contains("production:").not());
}

#[test]
fn test_show_json_applies_stack_type() {
    let env = TestEnv::with_example();
    let output = env
        .command()
        .args(["show", "--env", "dev", "--stack-type", "minimal", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let config: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        config["environments"]["dev"]["settings"]["features"]["components"][0],
        "fargate"
    );
}

// ============================================================================
// inspection
// ============================================================================

#[test]
fn test_list_environments() {
    let env = TestEnv::with_config(TWO_ENVIRONMENTS);
    env.command()
        .arg("list-environments")
        .assert()
        .success()
        .stdout("dev\nproduction\n");
}

#[test]
fn test_list_stack_types_long() {
    let env = TestEnv::with_example();
    env.command()
        .args(["list-stack-types", "--long"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("minimal\t"))
        .stdout(predicate::str::contains("standard\t"));
}

#[test]
fn test_validate_example() {
    let env = TestEnv::with_example();
    env.command()
        .args(["validate", "--resolve"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"));
}

#[test]
fn test_config_found_from_subdirectory() {
    let env = TestEnv::with_config(TWO_ENVIRONMENTS);
    let nested = env.path().join("infra");
    std::fs::create_dir_all(&nested).unwrap();

    env.command()
        .current_dir(&nested)
        .arg("list-environments")
        .assert()
        .success()
        .stdout(predicate::str::contains("production"));
}

#[test]
fn test_config_from_environment_variable() {
    let env = TestEnv::new();
    let path = env.write_file("deploy/custom.yaml", TWO_ENVIRONMENTS);
    env.command()
        .env("N8N_DEPLOY_CONFIG", &path)
        .arg("list-environments")
        .assert()
        .success()
        .stdout(predicate::str::contains("dev"));
}

// ============================================================================
// init and completions
// ============================================================================

#[test]
fn test_init_writes_example_and_refuses_overwrite() {
    let env = TestEnv::new();
    env.command().arg("init").assert().success();
    assert!(env.path().join("system.yaml.example").is_file());

    env.command()
        .arg("init")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--force"));

    env.command().args(["init", "--force"]).assert().success();
}

#[test]
fn test_init_dry_run_prints_example() {
    let env = TestEnv::new();
    env.command()
        .args(["init", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("environments:"));
    assert!(!env.path().join("system.yaml.example").exists());
}

#[test]
fn test_completions_bash() {
    let env = TestEnv::new();
    env.command()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("n8n-deploy"));
}
