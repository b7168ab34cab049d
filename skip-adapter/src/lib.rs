// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Dynamic skip support for test hosts that have no first-class notion of a
//! run-time skip.
//!
//! Test bodies signal "skip me" by failing with a well-known sentinel (see
//! [`skip`]). A [`TestCaseAdapter`](adapter::TestCaseAdapter) sits between the
//! host's result channel and its summary:
//!
//! 1. every result message flows through a
//!    [`ReclassifyingBus`](bus::ReclassifyingBus), which rewrites sentinel
//!    failures into skipped messages and counts them;
//! 2. once the host returns its [`RunSummary`](summary::RunSummary), the
//!    counters are [reconciled](summary::reconcile) so that failed and skipped
//!    totals agree with what was reported.
//!
//! Display names can additionally be shortened with a
//! [`DisplayNameFormatter`](display_name::DisplayNameFormatter).

pub mod adapter;
pub mod bus;
pub mod config;
pub mod display_name;
pub mod errors;
pub mod host;
pub mod message;
pub mod reporter;
pub mod sink;
pub mod skip;
pub mod summary;
