// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    errors::WriteReportError,
    message::{ResultMessage, TestRef},
    sink::{MessageSink, SinkFlow},
};
use indexmap::IndexMap;
use owo_colors::{OwoColorize, Style};
use std::{
    collections::VecDeque,
    fmt,
    io::{self, Write},
    sync::{Mutex, MutexGuard},
    time::Duration,
};

/// Prints one status line per test outcome.
///
/// Outcomes are held back until the test's `Finished` message arrives, so that the line can
/// carry the elapsed time. Outcomes that never see a `Finished` are printed by
/// [`finish`](Self::finish).
///
/// Several executions of the same test may be in flight at once. Their outcomes are queued per
/// test, and each `Finished` prints the oldest one.
///
/// The first write error is remembered: from then on every post returns [`SinkFlow::Stop`], and
/// `finish` returns the error.
#[derive(Debug)]
pub struct LineReporter<W> {
    state: Mutex<LineState<W>>,
    styles: Styles,
}

impl<W: Write + Send> LineReporter<W> {
    /// Creates a new reporter writing to `writer`, without colors.
    pub fn new(writer: W) -> Self {
        Self {
            state: Mutex::new(LineState {
                writer,
                pending: IndexMap::new(),
                error: None,
            }),
            styles: Styles::default(),
        }
    }

    /// Colorizes output.
    pub fn colorize(&mut self) {
        self.styles.colorize();
    }

    /// Prints any outcomes still waiting for a `Finished` message, flushes the writer and returns
    /// it.
    pub fn finish(self) -> Result<W, WriteReportError> {
        let mut state = self
            .state
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(error) = state.error.take() {
            return Err(WriteReportError::Io(error));
        }

        let pending = std::mem::take(&mut state.pending);
        for (test, outcomes) in &pending {
            for outcome in outcomes {
                state.write_outcome(&self.styles, test, outcome, None)?;
            }
        }
        state.writer.flush()?;
        Ok(state.writer)
    }

    fn lock(&self) -> MutexGuard<'_, LineState<W>> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<W: Write + Send> MessageSink for LineReporter<W> {
    fn post(&self, message: ResultMessage) -> SinkFlow {
        let mut state = self.lock();
        if state.error.is_some() {
            return SinkFlow::Stop;
        }

        let res = match message {
            ResultMessage::Passed { test } => {
                state.push_outcome(test, Outcome::Pass);
                Ok(())
            }
            ResultMessage::Failed {
                test,
                exception_kind,
                messages,
            } => {
                state.push_outcome(
                    test,
                    Outcome::Fail {
                        exception_kind,
                        messages,
                    },
                );
                Ok(())
            }
            ResultMessage::Skipped { test, reason } => {
                state.push_outcome(test, Outcome::Skip { reason });
                Ok(())
            }
            ResultMessage::Finished { test, elapsed } => match state.take_outcome(&test) {
                Some(outcome) => state.write_outcome(&self.styles, &test, &outcome, Some(elapsed)),
                None => Ok(()),
            },
            ResultMessage::Starting { .. } | ResultMessage::Output { .. } => Ok(()),
        };

        match res {
            Ok(()) => SinkFlow::Continue,
            Err(error) => {
                state.error = Some(error);
                SinkFlow::Stop
            }
        }
    }
}

#[derive(Debug)]
struct LineState<W> {
    writer: W,
    pending: IndexMap<TestRef, VecDeque<Outcome>>,
    error: Option<io::Error>,
}

impl<W: Write> LineState<W> {
    fn push_outcome(&mut self, test: TestRef, outcome: Outcome) {
        self.pending.entry(test).or_default().push_back(outcome);
    }

    fn take_outcome(&mut self, test: &TestRef) -> Option<Outcome> {
        let outcomes = self.pending.get_mut(test)?;
        let outcome = outcomes.pop_front();
        if outcomes.is_empty() {
            self.pending.shift_remove(test);
        }
        outcome
    }

    fn write_outcome(
        &mut self,
        styles: &Styles,
        test: &TestRef,
        outcome: &Outcome,
        elapsed: Option<Duration>,
    ) -> io::Result<()> {
        let writer = &mut self.writer;
        match outcome {
            Outcome::Pass => {
                writeln!(
                    writer,
                    "{:>12} {}{}",
                    "PASS".style(styles.pass),
                    DisplayBracketedDuration(elapsed),
                    test,
                )?;
            }
            Outcome::Skip { reason } => {
                write!(
                    writer,
                    "{:>12} {}{}",
                    "SKIP".style(styles.skip),
                    DisplayBracketedDuration(elapsed),
                    test,
                )?;
                if reason.is_empty() {
                    writeln!(writer)?;
                } else {
                    writeln!(writer, ": {reason}")?;
                }
            }
            Outcome::Fail {
                exception_kind,
                messages,
            } => {
                writeln!(
                    writer,
                    "{:>12} {}{}",
                    "FAIL".style(styles.fail),
                    DisplayBracketedDuration(elapsed),
                    test,
                )?;
                let mut messages = messages.iter();
                match messages.next() {
                    Some(first) => writeln!(
                        writer,
                        "{:>12} {}: {first}",
                        "",
                        exception_kind.style(styles.fail_output)
                    )?,
                    None => writeln!(
                        writer,
                        "{:>12} {}",
                        "",
                        exception_kind.style(styles.fail_output)
                    )?,
                }
                for message in messages {
                    writeln!(writer, "{:>12} caused by: {message}", "")?;
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug)]
enum Outcome {
    Pass,
    Fail {
        exception_kind: String,
        messages: Vec<String>,
    },
    Skip {
        reason: String,
    },
}

struct DisplayBracketedDuration(Option<Duration>);

impl fmt::Display for DisplayBracketedDuration {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0 {
            // * > means right-align.
            // * 8 is the number of characters to pad to.
            // * .3 means print three digits after the decimal point.
            Some(duration) => write!(f, "[{:>8.3?}s] ", duration.as_secs_f64()),
            None => write!(f, "[{:>9}] ", ""),
        }
    }
}

#[derive(Debug, Default)]
struct Styles {
    pass: Style,
    fail: Style,
    fail_output: Style,
    skip: Style,
}

impl Styles {
    fn colorize(&mut self) {
        self.pass = Style::new().green().bold();
        self.fail = Style::new().red().bold();
        self.fail_output = Style::new().red();
        self.skip = Style::new().yellow().bold();
    }
}
