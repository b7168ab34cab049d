// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! An in-process [`TestHost`] that runs async test bodies directly.
//!
//! [`LocalHost`] is the smallest host that behaves like a real one: it reports a `Starting`
//! message, exactly one outcome, then `Finished`, and returns a [`RunSummary`] that counts the
//! outcome. Like most hosts it has no idea what a skip request is, so a test body asking to be
//! skipped is reported as a failure whose kind is the host's sentinel ([`SKIP_SENTINEL`] unless
//! configured otherwise). Running it through a
//! [`TestCaseAdapter`](crate::adapter::TestCaseAdapter) with the same sentinel fixes that up.

use crate::{
    adapter::TestHost,
    config::AdapterConfig,
    display_name::DisplayNameFormatter,
    message::{ResultMessage, TestRef},
    sink::MessageSink,
    skip::{SKIP_SENTINEL, SkipRequested},
    summary::RunSummary,
};
use debug_ignore::DebugIgnore;
use futures::{FutureExt, future::BoxFuture};
use smol_str::SmolStr;
use std::{
    any::Any, convert::Infallible, error::Error, future::Future, panic::AssertUnwindSafe,
    sync::Arc, time::Instant,
};
use tokio::sync::watch;
use tracing::debug;

/// Failure kind reported for test bodies that return an error.
pub const ERROR_KIND: &str = "error";

/// Failure kind reported for test bodies that panic.
pub const PANIC_KIND: &str = "panic";

/// Failure kind reported for test bodies interrupted by cancellation.
pub const CANCELED_KIND: &str = "canceled";

/// The error type test bodies may fail with.
pub type BodyError = Box<dyn Error + Send + Sync + 'static>;

type TestBody = Arc<dyn Fn() -> BoxFuture<'static, Result<(), BodyError>> + Send + Sync>;

/// A test case runnable by [`LocalHost`].
#[derive(Clone, Debug)]
pub struct LocalTestCase {
    qualified_name: SmolStr,
    skip_reason: Option<String>,
    body: DebugIgnore<TestBody>,
}

impl LocalTestCase {
    /// Creates a new test case with the given fully-qualified name and body.
    ///
    /// The body is called once per execution.
    pub fn new<F, Fut, E>(qualified_name: impl Into<SmolStr>, body: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Into<BodyError>,
    {
        let body: TestBody = Arc::new(move || {
            body()
                .map(|result| result.map_err(Into::<BodyError>::into))
                .boxed()
        });
        Self {
            qualified_name: qualified_name.into(),
            skip_reason: None,
            body: DebugIgnore(body),
        }
    }

    /// Marks this test case as skipped without running it.
    pub fn skip(mut self, reason: impl Into<String>) -> Self {
        self.skip_reason = Some(reason.into());
        self
    }

    /// Returns the fully-qualified name of this test case.
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    /// Returns the reason this test case is skipped up front, if it is.
    pub fn skip_reason(&self) -> Option<&str> {
        self.skip_reason.as_deref()
    }
}

/// Creates a linked pair of cancellation handle and signal.
pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (sender, receiver) = watch::channel(false);
    (
        CancelHandle { sender },
        CancelSignal {
            receiver: Some(receiver),
        },
    )
}

/// Requests cancellation of every execution holding the paired [`CancelSignal`].
#[derive(Debug)]
pub struct CancelHandle {
    sender: watch::Sender<bool>,
}

impl CancelHandle {
    /// Cancels the run.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }
}

/// Observes cancellation requested through a [`CancelHandle`].
#[derive(Clone, Debug, Default)]
pub struct CancelSignal {
    receiver: Option<watch::Receiver<bool>>,
}

impl CancelSignal {
    /// Returns a signal that is never canceled.
    pub fn never() -> Self {
        Self { receiver: None }
    }

    /// Returns true if cancellation has been requested.
    pub fn is_canceled(&self) -> bool {
        self.receiver
            .as_ref()
            .is_some_and(|receiver| *receiver.borrow())
    }

    /// Completes once cancellation has been requested.
    ///
    /// Never completes if the handle was dropped without canceling.
    pub async fn canceled(&self) {
        if let Some(receiver) = &self.receiver {
            let mut receiver = receiver.clone();
            let canceled = receiver.wait_for(|canceled| *canceled).await.is_ok();
            if canceled {
                return;
            }
        }
        std::future::pending::<()>().await
    }
}

/// Per-execution context for [`LocalHost`].
#[derive(Clone, Debug, Default)]
pub struct LocalContext {
    cancel: CancelSignal,
}

impl LocalContext {
    /// Creates a context that is never canceled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context that observes `cancel`.
    pub fn with_cancel(cancel: CancelSignal) -> Self {
        Self { cancel }
    }

    /// Returns the cancellation signal for this context.
    pub fn cancel_signal(&self) -> &CancelSignal {
        &self.cancel
    }
}

/// Runs [`LocalTestCase`]s in the current task.
#[derive(Clone, Debug)]
pub struct LocalHost {
    display_name: DisplayNameFormatter,
    sentinel: SmolStr,
}

impl LocalHost {
    /// Creates a new host that names tests with `display_name` and reports skip requests with
    /// [`SKIP_SENTINEL`].
    pub fn new(display_name: DisplayNameFormatter) -> Self {
        Self {
            display_name,
            sentinel: SmolStr::new_static(SKIP_SENTINEL),
        }
    }

    /// Creates a new host that names tests and reports skip requests the way `config` says.
    ///
    /// A [`TestCaseAdapter`](crate::adapter::TestCaseAdapter) built from the same config
    /// recognizes every skip request this host reports.
    pub fn from_config(config: &AdapterConfig) -> Self {
        Self {
            display_name: config.display_name().clone(),
            sentinel: config.sentinel().into(),
        }
    }

    /// Returns the failure kind this host reports skip requests with.
    pub fn sentinel(&self) -> &str {
        &self.sentinel
    }

    /// Returns the reference this host reports `test_case` under.
    pub fn test_ref(&self, test_case: &LocalTestCase) -> TestRef {
        TestRef::new(
            test_case.qualified_name.clone(),
            self.display_name.format(&test_case.qualified_name),
        )
    }

    async fn run_body(&self, test_case: &LocalTestCase, cx: &LocalContext) -> Outcome {
        if let Some(reason) = &test_case.skip_reason {
            return Outcome::Skipped(reason.clone());
        }

        let body = AssertUnwindSafe((test_case.body)()).catch_unwind();
        tokio::select! {
            biased;
            () = cx.cancel.canceled() => Outcome::canceled("test canceled while running"),
            result = body => match result {
                Ok(Ok(())) => Outcome::Passed,
                Ok(Err(error)) => Outcome::from_error(error, &self.sentinel),
                Err(payload) => Outcome::from_panic(payload, &self.sentinel),
            },
        }
    }
}

impl Default for LocalHost {
    fn default() -> Self {
        Self::new(DisplayNameFormatter::none())
    }
}

impl TestHost for LocalHost {
    type TestCase = LocalTestCase;
    type Context = LocalContext;
    type Error = Infallible;

    fn describe<'a>(&self, test_case: &'a LocalTestCase) -> Option<&'a str> {
        Some(test_case.qualified_name())
    }

    async fn run_test_case(
        &self,
        test_case: &LocalTestCase,
        sink: &dyn MessageSink,
        cx: &LocalContext,
    ) -> Result<RunSummary, Infallible> {
        let test = self.test_ref(test_case);
        if cx.cancel.is_canceled() {
            debug!(test = %test, "run canceled before test started");
            return Ok(RunSummary {
                not_run: 1,
                ..RunSummary::default()
            });
        }

        let start = Instant::now();
        // Once `Starting` has been posted the test counts as run, even if the sink asks to stop.
        let stopped = sink
            .post(ResultMessage::Starting { test: test.clone() })
            .is_stop();
        let outcome = if stopped {
            debug!(test = %test, "sink requested stop after test started");
            Outcome::canceled("sink requested stop before the test body ran")
        } else {
            self.run_body(test_case, cx).await
        };

        let mut summary = RunSummary {
            total: 1,
            ..RunSummary::default()
        };
        let message = match outcome {
            Outcome::Passed => ResultMessage::Passed { test: test.clone() },
            Outcome::Failed { kind, messages } => {
                summary.failed = 1;
                ResultMessage::Failed {
                    test: test.clone(),
                    exception_kind: kind,
                    messages,
                }
            }
            Outcome::Skipped(reason) => {
                summary.skipped = 1;
                ResultMessage::Skipped {
                    test: test.clone(),
                    reason,
                }
            }
        };
        summary.time = start.elapsed();

        if stopped {
            return Ok(summary);
        }
        if sink.post(message).is_stop() {
            debug!(test = %test, "sink requested stop after outcome");
            return Ok(summary);
        }
        let _ = sink.post(ResultMessage::Finished {
            test,
            elapsed: summary.time,
        });
        Ok(summary)
    }
}

#[derive(Debug)]
enum Outcome {
    Passed,
    Failed {
        kind: String,
        messages: Vec<String>,
    },
    Skipped(String),
}

impl Outcome {
    fn canceled(message: &str) -> Self {
        Self::Failed {
            kind: CANCELED_KIND.to_owned(),
            messages: vec![message.to_owned()],
        }
    }

    fn from_error(error: BodyError, sentinel: &str) -> Self {
        if let Some(request) = error.downcast_ref::<SkipRequested>() {
            return Self::skip_requested(request, sentinel);
        }
        let mut messages = Vec::new();
        let mut current: Option<&(dyn Error + 'static)> = Some(&*error);
        while let Some(error) = current {
            messages.push(error.to_string());
            current = error.source();
        }
        Self::Failed {
            kind: ERROR_KIND.to_owned(),
            messages,
        }
    }

    fn from_panic(payload: Box<dyn Any + Send>, sentinel: &str) -> Self {
        if let Some(request) = payload.downcast_ref::<SkipRequested>() {
            return Self::skip_requested(request, sentinel);
        }
        let message = if let Some(message) = payload.downcast_ref::<&'static str>() {
            (*message).to_owned()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "(unknown panic payload)".to_owned()
        };
        Self::Failed {
            kind: PANIC_KIND.to_owned(),
            messages: vec![message],
        }
    }

    fn skip_requested(request: &SkipRequested, sentinel: &str) -> Self {
        Self::Failed {
            kind: sentinel.to_owned(),
            messages: vec![request.reason().to_owned()],
        }
    }
}
