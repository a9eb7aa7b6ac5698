/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::sync::Arc;

use crate::{StreamMetricsMessage, StreamMetricsResponse};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamStatus {
    Ok,
    Cancelled,
    DeadlineExceeded,
    Unavailable,
    Internal,
}

impl StreamStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            StreamStatus::Ok => "ok",
            StreamStatus::Cancelled => "cancelled",
            StreamStatus::DeadlineExceeded => "deadline exceeded",
            StreamStatus::Unavailable => "unavailable",
            StreamStatus::Internal => "internal",
        }
    }
}

impl fmt::Display for StreamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events of an established stream, delivered by the transport.
///
/// The methods may be called from any thread, and `on_remote_close` may be
/// called from inside [`MetricsServiceClient::start`] or
/// [`MetricsStream::send_message`].
pub trait StreamCallbacks: Send + Sync {
    fn on_receive_message(&self, response: Option<StreamMetricsResponse>);

    fn on_remote_close(&self, status: StreamStatus, message: &str);
}

/// The sending half of a stream. Dropping it resets the stream.
pub trait MetricsStream: Send {
    fn send_message(&mut self, message: &StreamMetricsMessage, end_stream: bool);
}

pub trait MetricsServiceClient: Send + Sync {
    /// Open a new stream, or return `None` if it can not be created at all.
    fn start(&self, callbacks: Arc<dyn StreamCallbacks>) -> Option<Box<dyn MetricsStream>>;
}

pub trait MetricsServiceClientFactory {
    fn create(&self) -> Box<dyn MetricsServiceClient>;
}
