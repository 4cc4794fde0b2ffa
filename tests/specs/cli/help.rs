//! CLI help output specs

use crate::prelude::*;

#[test]
fn no_args_shows_usage_and_exits_zero() {
    cli().passes().stdout_has("Usage:");
}

#[test]
fn help_lists_every_command() {
    cli()
        .args(&["--help"])
        .passes()
        .stdout_has("run")
        .stdout_has("show")
        .stdout_has("list")
        .stdout_has("clear-reported")
        .stdout_has("prune")
        .stdout_has("job-types");
}

#[test]
fn run_help_shows_commit_status_flags() {
    cli()
        .args(&["run", "--help"])
        .passes()
        .stdout_has("--github-owner")
        .stdout_has("--github-sha")
        .stdout_has("--github-context");
}

#[test]
fn version_shows_version() {
    cli().args(&["--version"]).passes().stdout_has("0.2");
}

#[test]
fn job_types_lists_command_table() {
    let temp = Project::empty();
    temp.cli()
        .args(&["job-types"])
        .passes()
        .stdout_has("fetch-all")
        .stdout_has("status-publish-production")
        .stdout_has("bun scripts/notion-fetch/index.ts");
}

#[test]
fn job_types_json_has_one_entry_per_type() {
    let temp = Project::empty();
    let out = temp.cli().args(&["job-types", "-o", "json"]).passes();
    let types = out.json();
    assert_eq!(types.as_array().map(Vec::len), Some(8));
    assert_eq!(types[0]["job_type"], "fetch");
    assert_eq!(types[0]["mutates_content"], true);
}
