// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by the skip adapter.

use camino::{Utf8Path, Utf8PathBuf};
use config::ConfigError;
use std::{error, fmt, io};
use thiserror::Error;

/// An error that occurred while parsing the adapter config.
#[derive(Debug)]
#[non_exhaustive]
pub struct ConfigParseError {
    config_file: Utf8PathBuf,
    kind: ConfigParseErrorKind,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: impl Into<Utf8PathBuf>, kind: ConfigParseErrorKind) -> Self {
        Self {
            config_file: config_file.into(),
            kind,
        }
    }

    /// Returns the config file for this error.
    pub fn config_file(&self) -> &Utf8Path {
        &self.config_file
    }

    /// Returns the kind of error this is.
    pub fn kind(&self) -> &ConfigParseErrorKind {
        &self.kind
    }
}

impl fmt::Display for ConfigParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse skip-adapter config at `{}`", self.config_file)
    }
}

impl error::Error for ConfigParseError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        Some(&self.kind)
    }
}

/// The kind of error that occurred while parsing a config.
///
/// Returned by [`ConfigParseError::kind`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigParseErrorKind {
    /// An error occurred while building the config.
    #[error(transparent)]
    BuildError(Box<ConfigError>),

    /// An error occurred while deserializing the config.
    #[error(transparent)]
    DeserializeError(Box<serde_path_to_error::Error<ConfigError>>),

    /// The configured skip sentinel was empty, or had leading or trailing whitespace.
    #[error("skip.sentinel must be non-empty with no leading or trailing whitespace")]
    InvalidSentinel,
}

/// The reclassification count exceeded the number of failures the host reported.
///
/// Every reclassified message was, before being rewritten, a failure the host
/// counted. Seeing more reclassifications than failures means the host and the
/// adapter disagree about what happened during the run.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error(
    "internal consistency violation: {reclassified} failures were reclassified as skips, \
     but the host only reported {failed} failed"
)]
pub struct ReconcileError {
    reclassified: usize,
    failed: usize,
}

impl ReconcileError {
    pub(crate) fn new(reclassified: usize, failed: usize) -> Self {
        Self {
            reclassified,
            failed,
        }
    }

    /// Returns the number of messages the bus reclassified.
    pub fn reclassified(&self) -> usize {
        self.reclassified
    }

    /// Returns the failed count the host reported.
    pub fn failed(&self) -> usize {
        self.failed
    }
}

/// An error returned by [`TestCaseAdapter::execute`](crate::adapter::TestCaseAdapter::execute).
#[derive(Debug, Error)]
pub enum ExecuteError<E> {
    /// The host failed to execute the test case.
    #[error("host failed to execute test case")]
    Host(#[source] E),

    /// The host's summary could not be reconciled with the reclassified messages.
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

/// An error that occurred while writing out a report.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WriteReportError {
    /// An error occurred while writing to the output.
    #[error("error writing to output")]
    Io(#[from] io::Error),

    /// An error occurred while serializing a JUnit report.
    #[error("error serializing JUnit report to `{file}`")]
    Junit {
        /// The output file.
        file: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: quick_junit::SerializeError,
    },

    /// An error occurred while creating or writing a file.
    #[error("error writing to `{file}`")]
    Fs {
        /// The file being written to.
        file: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: io::Error,
    },
}
