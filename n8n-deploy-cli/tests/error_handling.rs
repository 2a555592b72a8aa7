//! Exit codes and error messages of the CLI.

mod common;

use common::{TestEnv, TWO_ENVIRONMENTS};
use predicates::prelude::*;

#[test]
fn test_missing_config_exit_code() {
    let env = TestEnv::new();
    env.command()
        .arg("validate")
        .assert()
        .code(2)
        .stderr(predicate::str::starts_with("Error: "))
        .stderr(predicate::str::contains("system.yaml"));
}

#[test]
fn test_parse_error_exit_code() {
    let env = TestEnv::with_config("global: [unclosed\n");
    env.command()
        .arg("validate")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("invalid YAML"));
}

#[test]
fn test_invalid_cpu_memory_exit_code() {
    let env = TestEnv::with_config(
        r#"
global: { project_name: n8n, organization: acme }
environments:
  dev:
    account: "1"
    region: us-east-1
    settings:
      fargate: { cpu: 256, memory: 4096 }
"#,
    );
    env.command()
        .arg("validate")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("environments.dev.settings.fargate.memory"));
}

#[test]
fn test_unknown_environment_exit_code() {
    let env = TestEnv::with_config(TWO_ENVIRONMENTS);
    env.command()
        .args(["synth", "--env", "staging"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("available: dev, production"));
}

#[test]
fn test_unknown_stack_type_exit_code() {
    let env = TestEnv::with_config(TWO_ENVIRONMENTS);
    env.command()
        .args(["synth", "--env", "dev", "--stack-type", "enterprise"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("available: minimal"));
}

#[test]
fn test_malformed_override_exit_code() {
    let env = TestEnv::with_config(TWO_ENVIRONMENTS);
    env.command()
        .args(["show", "--env", "dev", "--set", "scaling"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Invalid arguments"));
}

#[test]
fn test_missing_prerequisite_exit_code() {
    let env = TestEnv::with_config(
        r#"
global: { project_name: n8n, organization: acme }
environments:
  dev:
    account: "1"
    region: us-east-1
    settings:
      features: { components: [compute] }
"#,
    );
    env.command()
        .args(["synth", "--env", "dev"])
        .assert()
        .code(6)
        .stderr(predicate::str::contains("compute stack requires network stack"));
}
