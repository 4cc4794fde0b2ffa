// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

fn force_color() {
    std::env::set_var("COLOR", "1");
    std::env::remove_var("NO_COLOR");
}

#[test]
#[serial]
fn styles_returns_plain_when_no_color() {
    std::env::set_var("NO_COLOR", "1");
    std::env::remove_var("COLOR");

    let debug = format!("{:?}", styles());
    assert_eq!(debug, format!("{:?}", Styles::plain()));
}

#[test]
#[serial]
fn styles_returns_styled_when_color_forced() {
    force_color();

    let debug = format!("{:?}", styles());
    assert_ne!(debug, format!("{:?}", Styles::plain()));
}

#[test]
#[serial]
fn no_color_wins_over_forced_color() {
    std::env::set_var("NO_COLOR", "1");
    std::env::set_var("COLOR", "1");

    assert!(!should_colorize());
    assert_eq!(header("Job:"), "Job:");

    std::env::remove_var("NO_COLOR");
    std::env::remove_var("COLOR");
}

#[test]
#[serial]
fn header_wraps_text_in_ansi_codes() {
    force_color();

    let result = header("Job:");
    assert_eq!(result, "\x1b[38;5;74mJob:\x1b[0m");

    std::env::remove_var("COLOR");
}

#[test]
#[serial]
fn status_is_colored_by_outcome() {
    force_color();

    let cases = [
        (JobStatus::Completed, codes::COMPLETED),
        (JobStatus::Failed, codes::FAILED),
        (JobStatus::Pending, codes::ACTIVE),
        (JobStatus::Running, codes::ACTIVE),
    ];
    for (job_status, code) in cases {
        let result = status(job_status);
        assert!(result.starts_with(&format!("\x1b[38;5;{code}m")), "got {result:?}");
        assert!(result.contains(&job_status.to_string()));
    }

    std::env::remove_var("COLOR");
}
