// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use camino_tempfile::tempdir;
use color_eyre::eyre::{Result, ensure};
use pretty_assertions::assert_eq;
use skip_adapter::{
    adapter::TestCaseAdapter,
    host::LocalContext,
    reporter::{JunitSink, LineReporter},
    summary::RunSummary,
};

#[tokio::test]
async fn junit_report_shows_skip_requests_as_skipped() -> Result<()> {
    test_init();

    let adapter = TestCaseAdapter::default();
    let sink = JunitSink::new("redis_tests");
    let cx = LocalContext::new();

    let mut total = RunSummary::default();
    for test_case in [
        passing("redis_tests::keys::get"),
        skip_by_error("redis_tests::keys::expire", "no server configured"),
        failing("redis_tests::keys::set", "connection reset"),
    ] {
        total.aggregate(&adapter.execute(&host(), &test_case, &sink, &cx).await?);
    }
    assert_eq!((total.total, total.failed, total.skipped), (3, 1, 1));

    let dir = tempdir()?;
    let path = dir.path().join("junit.xml");
    sink.write_to("skip-adapter", &path)?;

    let xml = std::fs::read_to_string(&path)?;
    ensure!(xml.contains("<skipped"), "skip request is skipped: {xml}");
    ensure!(
        xml.contains(r#"message="no server configured""#),
        "skip reason is the message: {xml}"
    );
    ensure!(
        xml.contains(r#"message="connection reset""#),
        "failure is kept: {xml}"
    );
    Ok(())
}

#[tokio::test]
async fn line_reporter_prints_skip_requests_as_skip() -> Result<()> {
    test_init();

    let adapter = TestCaseAdapter::default();
    let reporter = LineReporter::new(Vec::new());
    let cx = LocalContext::new();

    adapter
        .execute(
            &host(),
            &skip_by_error("redis_tests::keys::expire", "no server configured"),
            &reporter,
            &cx,
        )
        .await?;
    adapter
        .execute(
            &host(),
            &failing("redis_tests::keys::set", "connection reset"),
            &reporter,
            &cx,
        )
        .await?;

    let output = String::from_utf8(reporter.finish()?)?;
    let lines: Vec<_> = output.lines().collect();
    ensure!(lines.len() == 3, "two status lines and one message: {output}");
    ensure!(
        lines[0].trim_start().starts_with("SKIP")
            && lines[0].ends_with("redis_tests::keys::expire: no server configured"),
        "skip line: {}",
        lines[0]
    );
    ensure!(
        lines[1].trim_start().starts_with("FAIL"),
        "fail line: {}",
        lines[1]
    );
    assert_eq!(lines[2].trim(), "error: connection reset");
    Ok(())
}
