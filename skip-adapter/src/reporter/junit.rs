// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    errors::WriteReportError,
    message::{ResultMessage, TestRef},
    sink::{MessageSink, SinkFlow},
};
use camino::Utf8Path;
use debug_ignore::DebugIgnore;
use indexmap::IndexMap;
use quick_junit::{NonSuccessKind, Report, TestCase, TestCaseStatus, TestSuite};
use smol_str::SmolStr;
use std::{
    collections::VecDeque,
    fs::File,
    sync::{Mutex, MutexGuard},
    time::Duration,
};

static NO_OUTCOME_TYPE: &str = "no-outcome";
static NO_OUTCOME_MESSAGE: &str = "test finished without reporting an outcome";

/// Collects result messages into a JUnit test suite.
///
/// A test case is added to the suite when its `Finished` message arrives. Reclassified skip
/// requests appear as `<skipped>` elements with the skip reason as message.
///
/// Several executions of the same test may be in flight at once. Each `Starting` opens a new
/// pending case, an outcome fills the oldest case without one, and `Finished` completes the
/// oldest case that has an outcome.
#[derive(Debug)]
pub struct JunitSink {
    suite_name: SmolStr,
    state: Mutex<JunitState>,
}

#[derive(Debug)]
struct JunitState {
    test_suite: TestSuite,
    pending: DebugIgnore<IndexMap<TestRef, VecDeque<PendingCase>>>,
}

#[derive(Debug, Default)]
struct PendingCase {
    status: Option<TestCaseStatus>,
    output: String,
}

impl JunitSink {
    /// Creates a new sink collecting into a test suite called `suite_name`.
    pub fn new(suite_name: impl Into<SmolStr>) -> Self {
        let suite_name = suite_name.into();
        Self {
            state: Mutex::new(JunitState {
                test_suite: TestSuite::new(suite_name.as_str()),
                pending: DebugIgnore(IndexMap::new()),
            }),
            suite_name,
        }
    }

    /// Returns the name of the test suite being collected.
    pub fn suite_name(&self) -> &str {
        &self.suite_name
    }

    /// Completes the suite and wraps it in a report called `report_name`.
    ///
    /// Tests that never sent `Finished` are included without a time.
    pub fn finish(self, report_name: &str) -> Report {
        let mut state = self
            .state
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let pending = std::mem::take(&mut *state.pending);
        for (test, cases) in pending {
            for case in cases {
                state.add_test_case(&self.suite_name, &test, case, None);
            }
        }

        let mut report = Report::new(report_name);
        report.add_test_suite(state.test_suite);
        report
    }

    /// Completes the suite and writes the report to `path`, creating parent directories as
    /// needed.
    pub fn write_to(self, report_name: &str, path: &Utf8Path) -> Result<(), WriteReportError> {
        let report = self.finish(report_name);

        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|error| WriteReportError::Fs {
                file: dir.to_path_buf(),
                error,
            })?;
        }
        let f = File::create(path).map_err(|error| WriteReportError::Fs {
            file: path.to_path_buf(),
            error,
        })?;
        report
            .serialize(f)
            .map_err(|error| WriteReportError::Junit {
                file: path.to_path_buf(),
                error,
            })
    }

    fn lock(&self) -> MutexGuard<'_, JunitState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl MessageSink for JunitSink {
    fn post(&self, message: ResultMessage) -> SinkFlow {
        let mut state = self.lock();
        match message {
            ResultMessage::Starting { test } => {
                state
                    .pending
                    .entry(test)
                    .or_default()
                    .push_back(PendingCase::default());
            }
            ResultMessage::Passed { test } => {
                state.set_status(test, TestCaseStatus::success());
            }
            ResultMessage::Failed {
                test,
                exception_kind,
                messages,
            } => {
                let mut status = TestCaseStatus::non_success(NonSuccessKind::Failure);
                status.set_type(exception_kind);
                if let Some(first) = messages.first() {
                    status.set_message(first.as_str());
                }
                if messages.len() > 1 {
                    status.set_description(messages.join("\n"));
                }
                state.set_status(test, status);
            }
            ResultMessage::Skipped { test, reason } => {
                let mut status = TestCaseStatus::skipped();
                if !reason.is_empty() {
                    status.set_message(reason);
                }
                state.set_status(test, status);
            }
            ResultMessage::Output { test, output } => {
                let cases = state.pending.entry(test).or_default();
                match cases.iter_mut().find(|case| case.status.is_none()) {
                    Some(case) => case.output.push_str(&output),
                    None => cases.push_back(PendingCase {
                        status: None,
                        output,
                    }),
                }
            }
            ResultMessage::Finished { test, elapsed } => {
                let case = state.take_case(&test);
                state.add_test_case(&self.suite_name, &test, case, Some(elapsed));
            }
        }
        SinkFlow::Continue
    }
}

impl JunitState {
    fn set_status(&mut self, test: TestRef, status: TestCaseStatus) {
        let cases = self.pending.entry(test).or_default();
        match cases.iter_mut().find(|case| case.status.is_none()) {
            Some(case) => case.status = Some(status),
            None => cases.push_back(PendingCase {
                status: Some(status),
                output: String::new(),
            }),
        }
    }

    fn take_case(&mut self, test: &TestRef) -> PendingCase {
        let Some(cases) = self.pending.get_mut(test) else {
            return PendingCase::default();
        };
        let index = cases
            .iter()
            .position(|case| case.status.is_some())
            .unwrap_or(0);
        let case = cases.remove(index).unwrap_or_default();
        if cases.is_empty() {
            self.pending.shift_remove(test);
        }
        case
    }

    fn add_test_case(
        &mut self,
        suite_name: &str,
        test: &TestRef,
        case: PendingCase,
        elapsed: Option<Duration>,
    ) {
        let status = case.status.unwrap_or_else(|| {
            let mut status = TestCaseStatus::non_success(NonSuccessKind::Error);
            status
                .set_type(NO_OUTCOME_TYPE)
                .set_message(NO_OUTCOME_MESSAGE);
            status
        });

        let mut testcase = TestCase::new(test.display_name(), status);
        testcase.set_classname(suite_name);
        if let Some(elapsed) = elapsed {
            testcase.set_time(elapsed);
        }
        if !case.output.is_empty() {
            testcase.set_system_out(case.output);
        }
        self.test_suite.add_test_case(testcase);
    }
}
