// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shortening of fully-qualified test names for display.

use smol_str::SmolStr;

/// Strips a namespace-style prefix from qualified test names.
///
/// Only a true leading prefix is removed: if the prefix text happens to occur
/// again further into the name, that occurrence is kept. A name that consists
/// of nothing but the prefix is returned unchanged, since display names are
/// never empty.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DisplayNameFormatter {
    prefix: Option<SmolStr>,
}

impl DisplayNameFormatter {
    /// Creates a new formatter that strips `prefix`.
    ///
    /// An empty prefix is treated the same as no prefix.
    pub fn new(prefix: Option<impl Into<SmolStr>>) -> Self {
        let prefix = prefix.map(Into::into).filter(|prefix| !prefix.is_empty());
        Self { prefix }
    }

    /// Creates a formatter that returns every name unchanged.
    pub fn none() -> Self {
        Self { prefix: None }
    }

    /// Returns the prefix stripped by this formatter, if any.
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Returns the display form of `qualified_name`.
    pub fn format<'a>(&self, qualified_name: &'a str) -> &'a str {
        let Some(prefix) = &self.prefix else {
            return qualified_name;
        };
        match qualified_name.strip_prefix(prefix.as_str()) {
            Some(rest) if !rest.is_empty() => rest,
            _ => qualified_name,
        }
    }
}
