// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The reclassifying message bus.
//!
//! The main structure in this module is [`ReclassifyingBus`].

use crate::{
    message::ResultMessage,
    sink::{MessageSink, SinkFlow},
};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

/// Wraps a downstream [`MessageSink`], rewriting skip requests into skips.
///
/// A [`ResultMessage::Failed`] whose `exception_kind` equals the sentinel is replaced by a
/// [`ResultMessage::Skipped`] for the same test, with the first failure message as the reason.
/// Everything else is forwarded untouched. Each inbound message produces exactly one outbound
/// message, and the downstream sink's [`SinkFlow`] is always what `post` returns.
///
/// One bus is created per test-case execution. It may be posted to from several threads at
/// once.
#[derive(Debug)]
pub struct ReclassifyingBus<'a, S: ?Sized> {
    inner: &'a S,
    sentinel: &'a str,
    reclassified: AtomicUsize,
}

impl<'a, S: MessageSink + ?Sized> ReclassifyingBus<'a, S> {
    /// Creates a new bus forwarding to `inner`, treating failures of kind `sentinel` as skips.
    pub fn new(inner: &'a S, sentinel: &'a str) -> Self {
        Self {
            inner,
            sentinel,
            reclassified: AtomicUsize::new(0),
        }
    }

    /// Returns the sentinel failure kind this bus watches for.
    pub fn sentinel(&self) -> &str {
        self.sentinel
    }

    /// Returns the number of failures rewritten into skips so far.
    pub fn reclassified_count(&self) -> usize {
        self.reclassified.load(Ordering::Acquire)
    }

    fn reclassify(&self, message: ResultMessage) -> ResultMessage {
        match message {
            ResultMessage::Failed {
                test,
                exception_kind,
                messages,
            } if exception_kind == self.sentinel => {
                self.reclassified.fetch_add(1, Ordering::AcqRel);
                let reason = messages.into_iter().next().unwrap_or_default();
                debug!(test = %test, reason = %reason, "reclassifying skip request as skipped");
                ResultMessage::Skipped { test, reason }
            }
            other => other,
        }
    }
}

impl<S: MessageSink + ?Sized> MessageSink for ReclassifyingBus<'_, S> {
    fn post(&self, message: ResultMessage) -> SinkFlow {
        let message = self.reclassify(message);
        self.inner.post(message)
    }
}
