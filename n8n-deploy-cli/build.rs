//! Build script for n8n-deploy-cli.
//!
//! This script generates the man page at build time using clap_mangen.
//! The generated man page is placed in OUT_DIR for inclusion in release builds.
//!
//! The command structure is rebuilt here because build scripts cannot depend
//! on the crate being built.

use clap::{Arg, Command};
use clap_mangen::Man;
use std::fs;
use std::path::PathBuf;

/// Build the CLI command structure for man page generation.
///
/// Keep this structure synchronized with src/cli.rs.
fn build_cli() -> Command {
    let env_arg = || {
        Arg::new("env")
            .long("env")
            .short('e')
            .value_name("ENV")
            .help("Environment to resolve")
    };
    let stack_type_arg = || {
        Arg::new("stack-type")
            .long("stack-type")
            .short('t')
            .value_name("TYPE")
            .help("Stack-type preset to apply")
    };
    let set_arg = || {
        Arg::new("set")
            .long("set")
            .value_name("KEY=VALUE")
            .action(clap::ArgAction::Append)
            .help("Override a setting (value parsed as YAML)")
    };

    Command::new("n8n-deploy")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Synthesize n8n deployment plans from system.yaml")
        .long_about(
            "Resolve one environment of an n8n system.yaml through its stack-type preset, \
             defaults and overrides, and synthesize its deployment plan",
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .help("Enable verbose output")
                .global(true)
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .help("Suppress non-essential output")
                .global(true)
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("Configuration document (searched for in parent directories)")
                .value_name("PATH")
                .global(true)
                .default_value("system.yaml")
                .env("N8N_DEPLOY_CONFIG"),
        )
        .subcommands(vec![
            Command::new("synth")
                .about("Compose one environment and emit its resource plan")
                .long_about("Resolve an environment and write its resource plan as JSON")
                .args([
                    env_arg(),
                    stack_type_arg(),
                    set_arg(),
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .value_name("PATH")
                        .help("Write the plan to a file instead of stdout"),
                ]),
            Command::new("show")
                .about("Print the resolved configuration of one environment")
                .long_about("Print an environment after presets, defaults and overrides")
                .args([
                    env_arg(),
                    stack_type_arg(),
                    set_arg(),
                    Arg::new("format")
                        .long("format")
                        .value_parser(["yaml", "json"])
                        .default_value("yaml")
                        .help("Output format"),
                ]),
            Command::new("validate")
                .about("Validate the configuration document")
                .long_about("Parse and validate the configuration document")
                .arg(
                    Arg::new("resolve")
                        .long("resolve")
                        .action(clap::ArgAction::SetTrue)
                        .help("Also resolve every environment"),
                ),
            Command::new("list-environments")
                .about("List the environments of the document")
                .long_about("Print the environments defined by the configuration document"),
            Command::new("list-stack-types")
                .about("List the stack-type presets of the document")
                .long_about("Print the stack-type presets defined by the configuration document"),
            Command::new("init")
                .about("Write an example configuration document")
                .long_about("Write the bundled example system.yaml to disk"),
            Command::new("completions")
                .about("Generate shell completion scripts")
                .long_about("Generate shell completion scripts for bash, zsh, fish, or PowerShell"),
        ])
}

fn main() {
    // Generate man pages at build time
    let out_dir = PathBuf::from(std::env::var("OUT_DIR").unwrap());
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir).unwrap();

    let app = build_cli();
    let man = Man::new(app);
    let mut buffer = Vec::new();
    man.render(&mut buffer).unwrap();

    fs::write(man_dir.join("n8n-deploy.1"), buffer).unwrap();

    println!("cargo:rerun-if-changed=src/cli.rs");
    println!("cargo:rerun-if-changed=src/commands/");
}
