// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Destinations for [`ResultMessage`]s.

use crate::message::ResultMessage;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc::UnboundedSender;

/// What a sink wants the producer to do after a message was posted.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[must_use]
pub enum SinkFlow {
    /// Keep going.
    Continue,

    /// The consumer requested early termination.
    Stop,
}

impl SinkFlow {
    /// Returns true if the consumer requested early termination.
    pub fn is_stop(self) -> bool {
        matches!(self, Self::Stop)
    }
}

/// A channel through which result messages flow towards final aggregation.
///
/// `post` takes `&self`: a test body that spawns its own threads or tasks may report through the
/// same sink concurrently. Disposal is handled by `Drop`.
pub trait MessageSink: Send + Sync {
    /// Delivers a message. Each call is processed synchronously before returning.
    fn post(&self, message: ResultMessage) -> SinkFlow;
}

impl<S: MessageSink + ?Sized> MessageSink for &S {
    fn post(&self, message: ResultMessage) -> SinkFlow {
        (**self).post(message)
    }
}

impl<S: MessageSink + ?Sized> MessageSink for Box<S> {
    fn post(&self, message: ResultMessage) -> SinkFlow {
        (**self).post(message)
    }
}

impl<S: MessageSink + ?Sized> MessageSink for Arc<S> {
    fn post(&self, message: ResultMessage) -> SinkFlow {
        (**self).post(message)
    }
}

/// A sink that keeps every message it receives, in order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<ResultMessage>>,
    stop_after: Option<usize>,
}

impl RecordingSink {
    /// Creates a new, empty recording sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a recording sink that asks for termination once it holds `count` messages.
    pub fn stop_after(count: usize) -> Self {
        Self {
            messages: Mutex::default(),
            stop_after: Some(count),
        }
    }

    /// Returns a copy of the messages received so far.
    pub fn messages(&self) -> Vec<ResultMessage> {
        self.lock().clone()
    }

    /// Returns the messages received, consuming the sink.
    pub fn into_messages(self) -> Vec<ResultMessage> {
        self.messages
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns the number of messages received so far.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if no messages have been received.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ResultMessage>> {
        // A panicking test body must not take reporting down with it.
        self.messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl MessageSink for RecordingSink {
    fn post(&self, message: ResultMessage) -> SinkFlow {
        let mut messages = self.lock();
        messages.push(message);
        match self.stop_after {
            Some(limit) if messages.len() >= limit => SinkFlow::Stop,
            _ => SinkFlow::Continue,
        }
    }
}

/// A sink that forwards messages into an unbounded tokio channel.
///
/// Once the receiving half has been dropped, every post returns [`SinkFlow::Stop`].
#[derive(Clone, Debug)]
pub struct ChannelSink {
    sender: UnboundedSender<ResultMessage>,
}

impl ChannelSink {
    /// Creates a new channel sink.
    pub fn new(sender: UnboundedSender<ResultMessage>) -> Self {
        Self { sender }
    }
}

impl MessageSink for ChannelSink {
    fn post(&self, message: ResultMessage) -> SinkFlow {
        match self.sender.send(message) {
            Ok(()) => SinkFlow::Continue,
            Err(_) => SinkFlow::Stop,
        }
    }
}
