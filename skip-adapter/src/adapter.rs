// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Running a single test case through the reclassifying pipeline.
//!
//! The main structure in this module is [`TestCaseAdapter`]. Hosts plug into it by implementing
//! [`TestHost`].

use crate::{
    bus::ReclassifyingBus,
    config::AdapterConfig,
    errors::ExecuteError,
    sink::MessageSink,
    summary::{RunSummary, reconcile},
};
use std::future::Future;
use tracing::{debug, instrument};

/// The host test runtime's own routine for executing a test case.
///
/// The adapter does not know how tests are run: it hands the host a sink to report through, and
/// expects a summary back.
pub trait TestHost {
    /// The host's descriptor for a test case.
    type TestCase: ?Sized;

    /// Whatever else the host needs to run a test body: constructor arguments, a cancellation
    /// signal, diagnostics. Opaque to the adapter.
    type Context: ?Sized;

    /// The error returned if the host could not execute the test case at all.
    type Error;

    /// Returns a name for `test_case`, used in logs.
    fn describe<'a>(&self, test_case: &'a Self::TestCase) -> Option<&'a str> {
        let _ = test_case;
        None
    }

    /// Runs `test_case`, posting every result message to `sink`.
    ///
    /// Every message about the test case must go through `sink`.
    fn run_test_case(
        &self,
        test_case: &Self::TestCase,
        sink: &dyn MessageSink,
        cx: &Self::Context,
    ) -> impl Future<Output = Result<RunSummary, Self::Error>> + Send;
}

/// Runs test cases so that skip requests are reported, and counted, as skips.
///
/// The adapter holds no state across executions: every call to [`execute`](Self::execute) gets
/// its own [`ReclassifyingBus`] and counter, so any number of executions may be in flight at
/// once.
#[derive(Clone, Debug, Default)]
pub struct TestCaseAdapter {
    config: AdapterConfig,
}

impl TestCaseAdapter {
    /// Creates a new adapter.
    pub fn new(config: AdapterConfig) -> Self {
        Self { config }
    }

    /// Returns the config this adapter was created with.
    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// Returns the display form of a fully-qualified test name.
    pub fn display_name<'a>(&self, qualified_name: &'a str) -> &'a str {
        self.config.display_name().format(qualified_name)
    }

    /// Executes `test_case` on `host`, reporting through `sink`.
    ///
    /// The host sees a [`ReclassifyingBus`] wrapping `sink` instead of `sink` itself. Once the
    /// host returns, its summary is corrected for every failure the bus turned into a skip.
    #[instrument(
        level = "debug",
        skip_all,
        fields(test = host.describe(test_case)),
    )]
    pub async fn execute<H, S>(
        &self,
        host: &H,
        test_case: &H::TestCase,
        sink: &S,
        cx: &H::Context,
    ) -> Result<RunSummary, ExecuteError<H::Error>>
    where
        H: TestHost + ?Sized,
        S: MessageSink + ?Sized,
    {
        let bus = ReclassifyingBus::new(sink, self.config.sentinel());
        let summary = host
            .run_test_case(test_case, &bus, cx)
            .await
            .map_err(ExecuteError::Host)?;

        let reclassified = bus.reclassified_count();
        let summary = reconcile(summary, reclassified)?;
        debug!(
            reclassified,
            total = summary.total,
            failed = summary.failed,
            skipped = summary.skipped,
            "test case finished"
        );
        Ok(summary)
    }
}
