// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn one_row_per_job_type() {
    let rows = rows();
    assert_eq!(rows.len(), JobType::ALL.len());
    assert!(rows.iter().zip(JobType::ALL).all(|(row, t)| row.job_type == t));
}

#[test]
fn rows_render_command_and_lock_requirement() {
    let mut out = Vec::new();
    format_rows(&mut out, &rows());
    let text = String::from_utf8(out).unwrap();

    let fetch = text.lines().find(|l| l.starts_with("fetch ")).unwrap();
    assert!(fetch.contains("5m"));
    assert!(fetch.contains(" yes "));
    assert!(fetch.ends_with("bun scripts/notion-fetch/index.ts"));

    let count = text.lines().find(|l| l.starts_with("count-pages ")).unwrap();
    assert!(count.contains(" no "));
}

#[test]
fn json_row_uses_kebab_case_type() {
    let json = serde_json::to_value(&rows()[1]).unwrap();
    assert_eq!(json["job_type"], "fetch-all");
    assert_eq!(json["timeout_ms"], 3_600_000);
    assert_eq!(json["mutates_content"], true);
}
