// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Requesting a skip from inside a running test.
//!
//! Hosts without a native way to skip at run time see a skip request as an ordinary failure
//! whose kind is [`SKIP_SENTINEL`]. The [`ReclassifyingBus`](crate::bus::ReclassifyingBus) turns
//! those failures back into skips.
//!
//! Test bodies either return the error:
//!
//! ```
//! use skip_adapter::skip::{self, SkipRequested};
//!
//! fn needs_server(address: Option<&str>) -> Result<(), SkipRequested> {
//!     let address = skip::if_no_config("server", address)?;
//!     assert!(!address.is_empty());
//!     Ok(())
//! }
//!
//! assert!(needs_server(None).is_err());
//! ```
//!
//! or, where returning an error is awkward, raise it as a panic payload with
//! [`SkipRequested::raise`].

use std::{error, fmt};

/// The default failure kind that marks a skip request.
pub const SKIP_SENTINEL: &str = "skip-requested";

/// A request, made by a running test, to be reported as skipped.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SkipRequested {
    reason: String,
}

impl SkipRequested {
    /// Creates a new skip request.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// Returns why the test asked to be skipped.
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Unwinds the current test with this request as the panic payload.
    pub fn raise(self) -> ! {
        std::panic::panic_any(self)
    }
}

impl fmt::Display for SkipRequested {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

impl error::Error for SkipRequested {}

/// Returns a skip request with the given reason.
pub fn inconclusive(reason: impl Into<String>) -> SkipRequested {
    SkipRequested::new(reason)
}

/// Requests a skip unless `condition` holds.
pub fn unless(condition: bool, reason: impl Into<String>) -> Result<(), SkipRequested> {
    if condition {
        Ok(())
    } else {
        Err(SkipRequested::new(reason))
    }
}

/// Requests a skip if a configuration property is unset or empty, and returns it otherwise.
pub fn if_no_config<'a>(property: &str, value: Option<&'a str>) -> Result<&'a str, SkipRequested> {
    match value {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(SkipRequested::new(format!(
            "config property `{property}` is not set, skipping test"
        ))),
    }
}

/// Requests a skip if the system under test lacks a feature.
pub fn if_missing_feature(feature: &str, available: bool) -> Result<(), SkipRequested> {
    unless(
        available,
        format!("feature `{feature}` is not available, skipping test"),
    )
}
