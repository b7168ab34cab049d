// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use camino_tempfile::tempdir;
use color_eyre::eyre::{Result, ensure};
use futures::future::join_all;
use indoc::indoc;
use pretty_assertions::assert_eq;
use skip_adapter::{
    adapter::TestCaseAdapter,
    config::AdapterConfig,
    display_name::DisplayNameFormatter,
    host::{ERROR_KIND, LocalContext, LocalHost, cancel_pair},
    message::ResultMessage,
    sink::{ChannelSink, RecordingSink},
    skip::SKIP_SENTINEL,
    summary::RunSummary,
};
use tokio::sync::mpsc;

/// The counters of a summary, without the time.
fn counters(summary: &RunSummary) -> (usize, usize, usize, usize) {
    (
        summary.total,
        summary.failed,
        summary.skipped,
        summary.not_run,
    )
}

#[tokio::test]
async fn skip_request_is_reported_and_counted_as_skip() -> Result<()> {
    test_init();

    let adapter = TestCaseAdapter::default();
    let sink = RecordingSink::new();
    let test_case = skip_by_error("redis_tests::keys::expire", "no server configured");

    let summary = adapter
        .execute(&host(), &test_case, &sink, &LocalContext::new())
        .await?;
    assert_eq!(counters(&summary), (1, 0, 1, 0));
    assert!(summary.is_success());
    assert_eq!(summary.passed(), 0);

    let kinds: Vec<_> = sink.messages().iter().map(|m| m.kind_name()).collect();
    assert_eq!(kinds, ["starting", "skipped", "finished"]);
    match &sink.messages()[1] {
        ResultMessage::Skipped { test, reason } => {
            assert_eq!(test.unique_id(), "redis_tests::keys::expire");
            assert_eq!(reason, "no server configured");
        }
        other => panic!("expected a skip, found {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn skip_request_matches_native_skip() -> Result<()> {
    test_init();

    let adapter = TestCaseAdapter::default();
    let requested = adapter
        .execute(
            &host(),
            &skip_by_error("redis_tests::keys::expire", "no server configured"),
            &RecordingSink::new(),
            &LocalContext::new(),
        )
        .await?;
    let native = adapter
        .execute(
            &host(),
            &passing("redis_tests::keys::expire").skip("no server configured"),
            &RecordingSink::new(),
            &LocalContext::new(),
        )
        .await?;

    assert_eq!(counters(&requested), counters(&native));
    Ok(())
}

#[tokio::test]
async fn panic_raised_skip_request() -> Result<()> {
    test_init();

    let sink = RecordingSink::new();
    let summary = TestCaseAdapter::default()
        .execute(
            &host(),
            &skip_by_panic("redis_tests::streams::xadd", "streams unsupported"),
            &sink,
            &LocalContext::new(),
        )
        .await?;

    assert_eq!(counters(&summary), (1, 0, 1, 0));
    ensure!(
        sink.messages().contains(&ResultMessage::Skipped {
            test: host().test_ref(&passing("redis_tests::streams::xadd")),
            reason: "streams unsupported".to_owned(),
        }),
        "skip reason carried over from the panic payload"
    );
    Ok(())
}

#[tokio::test]
async fn missing_config_skips() -> Result<()> {
    test_init();

    let adapter = TestCaseAdapter::default();
    let sink = RecordingSink::new();
    let cx = LocalContext::new();

    let mut total = RunSummary::default();
    total.aggregate(
        &adapter
            .execute(&host(), &needs_config("a", None), &sink, &cx)
            .await?,
    );
    total.aggregate(
        &adapter
            .execute(&host(), &needs_config("b", Some("")), &sink, &cx)
            .await?,
    );
    total.aggregate(
        &adapter
            .execute(&host(), &needs_config("c", Some("localhost:6379")), &sink, &cx)
            .await?,
    );

    assert_eq!(counters(&total), (3, 0, 2, 0));
    assert_eq!(total.passed(), 1);
    Ok(())
}

#[tokio::test]
async fn ordinary_failure_is_unchanged() -> Result<()> {
    test_init();

    let sink = RecordingSink::new();
    let summary = TestCaseAdapter::default()
        .execute(
            &host(),
            &failing("redis_tests::keys::set", "connection reset"),
            &sink,
            &LocalContext::new(),
        )
        .await?;

    assert_eq!(counters(&summary), (1, 1, 0, 0));
    assert!(!summary.is_success());
    ensure!(
        sink.messages()
            .iter()
            .any(|m| m.is_failure_of_kind(ERROR_KIND)),
        "failure is forwarded as-is"
    );
    Ok(())
}

#[tokio::test]
async fn concurrent_executions_keep_separate_counts() -> Result<()> {
    test_init();

    let adapter = TestCaseAdapter::default();
    let host = host();
    let sink = RecordingSink::new();
    let cx = LocalContext::new();

    let test_cases: Vec<_> = (0..24)
        .map(|i| {
            let name = format!("redis_tests::concurrent::t{i}");
            match i % 3 {
                0 => skip_by_error(&name, "skipped"),
                1 => failing(&name, "failed"),
                _ => passing(&name),
            }
        })
        .collect();

    let summaries = join_all(
        test_cases
            .iter()
            .map(|test_case| adapter.execute(&host, test_case, &sink, &cx)),
    )
    .await;

    let mut total = RunSummary::default();
    for summary in summaries {
        let summary = summary?;
        ensure!(
            summary.failed + summary.skipped <= 1,
            "each execution reconciles only its own messages"
        );
        total.aggregate(&summary);
    }
    assert_eq!(counters(&total), (24, 8, 8, 0));
    assert_eq!(sink.len(), 24 * 3);
    Ok(())
}

#[tokio::test]
async fn channel_sink_forwards_and_stops() -> Result<()> {
    test_init();

    let adapter = TestCaseAdapter::default();
    let (sender, mut receiver) = mpsc::unbounded_channel();
    let sink = ChannelSink::new(sender);

    let summary = adapter
        .execute(
            &host(),
            &skip_by_error("redis_tests::keys::expire", "no server configured"),
            &sink,
            &LocalContext::new(),
        )
        .await?;
    assert_eq!(counters(&summary), (1, 0, 1, 0));

    let mut kinds = Vec::new();
    while let Ok(message) = receiver.try_recv() {
        kinds.push(message.kind_name());
    }
    assert_eq!(kinds, ["starting", "skipped", "finished"]);

    // With the consumer gone, the test is stopped before its body runs.
    drop(receiver);
    let summary = adapter
        .execute(
            &host(),
            &passing("redis_tests::keys::get"),
            &sink,
            &LocalContext::new(),
        )
        .await?;
    assert_eq!(counters(&summary), (1, 1, 0, 0));
    Ok(())
}

#[tokio::test]
async fn host_and_adapter_sentinels_must_agree() -> Result<()> {
    test_init();

    // The adapter listens for a custom sentinel, but the host reports the built-in one.
    let adapter = TestCaseAdapter::new(AdapterConfig::new(
        "SkipTestException",
        DisplayNameFormatter::none(),
    ));
    let sink = RecordingSink::new();
    let summary = adapter
        .execute(
            &host(),
            &skip_by_error("redis_tests::keys::expire", "no server configured"),
            &sink,
            &LocalContext::new(),
        )
        .await?;

    assert_eq!(counters(&summary), (1, 1, 0, 0));
    ensure!(
        sink.messages()
            .iter()
            .any(|m| m.is_failure_of_kind(SKIP_SENTINEL)),
        "unrecognized sentinel is forwarded as a failure"
    );
    Ok(())
}

#[tokio::test]
async fn canceled_runs_do_not_start() -> Result<()> {
    test_init();

    let (handle, signal) = cancel_pair();
    let cx = LocalContext::with_cancel(signal);
    handle.cancel();

    let sink = RecordingSink::new();
    let summary = TestCaseAdapter::default()
        .execute(
            &host(),
            &skip_by_error("redis_tests::keys::expire", "no server configured"),
            &sink,
            &cx,
        )
        .await?;
    assert_eq!(counters(&summary), (0, 0, 0, 1));
    ensure!(sink.is_empty(), "nothing is posted for a canceled run");
    Ok(())
}

#[tokio::test]
async fn config_drives_sentinel_and_display_names() -> Result<()> {
    test_init();

    let workspace_root = tempdir()?;
    let config_dir = workspace_root.path().join(".config");
    std::fs::create_dir_all(&config_dir)?;
    std::fs::write(
        config_dir.join("skip-adapter.toml"),
        indoc! {r#"
            [skip]
            sentinel = "SkipTestException"

            [display-name]
            strip-prefix = "redis_tests::"
        "#},
    )?;

    let config = AdapterConfig::from_sources(workspace_root.path(), None)?;
    let host = LocalHost::from_config(&config);
    let adapter = TestCaseAdapter::new(config);
    let sink = RecordingSink::new();

    let summary = adapter
        .execute(
            &host,
            &skip_by_error("redis_tests::keys::expire", "no server configured"),
            &sink,
            &LocalContext::new(),
        )
        .await?;
    assert_eq!(counters(&summary), (1, 0, 1, 0));

    let messages = sink.messages();
    assert_eq!(
        messages[1],
        ResultMessage::Skipped {
            test: host.test_ref(&passing("redis_tests::keys::expire")),
            reason: "no server configured".to_owned(),
        }
    );
    assert_eq!(messages[0].test().display_name(), "keys::expire");
    assert_eq!(messages[0].test().unique_id(), "redis_tests::keys::expire");
    Ok(())
}
