// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sinks that turn result messages into human-readable lines or JUnit XML.
//!
//! Both reporters are ordinary [`MessageSink`](crate::sink::MessageSink)s, so they can sit
//! directly behind a [`ReclassifyingBus`](crate::bus::ReclassifyingBus): a reclassified skip
//! request shows up as `SKIP` and as `<skipped>` respectively.

mod junit;
mod line;

pub use junit::JunitSink;
pub use line::LineReporter;
