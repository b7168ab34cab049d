// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Result messages reported while a test case executes.
//!
//! Messages are produced by a [`TestHost`](crate::adapter::TestHost) and consumed by a
//! [`MessageSink`](crate::sink::MessageSink).

use smol_str::SmolStr;
use std::{fmt, time::Duration};

/// Identity of the test instance a [`ResultMessage`] concerns.
///
/// The adapter treats this as opaque: it is copied verbatim from a failure into the skip that
/// replaces it.
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct TestRef {
    unique_id: SmolStr,
    display_name: SmolStr,
}

impl TestRef {
    /// Creates a new test reference.
    pub fn new(unique_id: impl Into<SmolStr>, display_name: impl Into<SmolStr>) -> Self {
        Self {
            unique_id: unique_id.into(),
            display_name: display_name.into(),
        }
    }

    /// Returns the host-assigned unique identifier for this test.
    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    /// Returns the name shown to users for this test.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

impl fmt::Display for TestRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name)
    }
}

/// One reported outcome or event for a test during execution.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum ResultMessage {
    /// The test started running.
    Starting {
        /// The test that started.
        test: TestRef,
    },

    /// The test passed.
    Passed {
        /// The test that passed.
        test: TestRef,
    },

    /// The test failed.
    Failed {
        /// The test that failed.
        test: TestRef,

        /// Identifies what kind of failure this was, e.g. an error type name.
        ///
        /// A failure whose kind matches the configured skip sentinel is a request to skip.
        exception_kind: String,

        /// Failure messages, outermost first.
        messages: Vec<String>,
    },

    /// The test was skipped.
    Skipped {
        /// The test that was skipped.
        test: TestRef,

        /// Why the test was skipped.
        reason: String,
    },

    /// The test produced output.
    Output {
        /// The test that produced output.
        test: TestRef,

        /// The output text.
        output: String,
    },

    /// The test finished, whatever the outcome.
    Finished {
        /// The test that finished.
        test: TestRef,

        /// How long the test took to run.
        elapsed: Duration,
    },
}

impl ResultMessage {
    /// Returns the test this message is about.
    pub fn test(&self) -> &TestRef {
        match self {
            Self::Starting { test }
            | Self::Passed { test }
            | Self::Failed { test, .. }
            | Self::Skipped { test, .. }
            | Self::Output { test, .. }
            | Self::Finished { test, .. } => test,
        }
    }

    /// Returns a short, stable name for the kind of message.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Starting { .. } => "starting",
            Self::Passed { .. } => "passed",
            Self::Failed { .. } => "failed",
            Self::Skipped { .. } => "skipped",
            Self::Output { .. } => "output",
            Self::Finished { .. } => "finished",
        }
    }

    /// Returns true if this is a failure carrying the given sentinel kind.
    pub fn is_failure_of_kind(&self, kind: &str) -> bool {
        matches!(self, Self::Failed { exception_kind, .. } if exception_kind == kind)
    }
}
