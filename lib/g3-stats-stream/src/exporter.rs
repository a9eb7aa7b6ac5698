/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::{
    LocalInfo, MetricsServiceClient, MetricsServiceClientFactory, MetricsStream,
    StreamCallbacks, StreamMetricsMessage, StreamMetricsResponse, StreamStatus,
};

/// The drop warning is logged at most once in each 64s slice.
pub(crate) fn drop_report_slice(elapsed: Duration) -> u64 {
    elapsed.as_secs() >> 6
}

pub trait MetricsStreamer: Send + Sync {
    /// Deliver the batch, on a best effort basis.
    fn send(&self, message: &mut StreamMetricsMessage);
}

#[derive(Default)]
struct StreamState {
    generation: u64,
    stream: Option<(u64, Box<dyn MetricsStream>)>,
}

#[derive(Default)]
struct StreamShared {
    state: Mutex<StreamState>,
    // the newest stream generation that has been closed by the remote end
    last_closed: AtomicU64,
}

impl StreamShared {
    fn discard_closed(&self, state: &mut StreamState) {
        let last_closed = self.last_closed.load(Ordering::Acquire);
        if let Some((generation, _)) = &state.stream
            && *generation <= last_closed
        {
            debug!("metrics service stream {generation} discarded");
            state.stream = None;
        }
    }
}

/// Callback target of a single stream.
///
/// Events are bound to the generation of the stream, so a late close of an
/// old stream has no effect on the current one.
struct StreamWatcher {
    shared: Weak<StreamShared>,
    generation: u64,
}

impl StreamCallbacks for StreamWatcher {
    fn on_receive_message(&self, response: Option<StreamMetricsResponse>) {
        if let Some(rsp) = response
            && let Some(detail) = rsp.detail
        {
            debug!(
                "metrics service stream {}: response received: {detail}",
                self.generation
            );
        }
    }

    fn on_remote_close(&self, status: StreamStatus, message: &str) {
        info!(
            "metrics service stream {} closed by remote: {status} {message}",
            self.generation
        );
        let Some(shared) = self.shared.upgrade() else {
            return;
        };
        shared.last_closed.fetch_max(self.generation, Ordering::AcqRel);
        // the lock is held if we are called from inside start or send,
        // and then the sender will do the cleanup itself
        if let Ok(mut state) = shared.state.try_lock() {
            shared.discard_closed(&mut state);
        }
    }
}

/// Send batches over a lazily created stream.
///
/// A new stream is started on the first send after creation or after the
/// previous stream has been closed by the remote end. There is no backoff,
/// batches sent while there is no usable stream are dropped.
pub struct StreamingExporter {
    client: Box<dyn MetricsServiceClient>,
    local_info: Arc<dyn LocalInfo>,
    shared: Arc<StreamShared>,

    create_instant: Instant,
    last_drop_report: AtomicU64,
}

impl StreamingExporter {
    pub fn new(factory: &dyn MetricsServiceClientFactory, local_info: Arc<dyn LocalInfo>) -> Self {
        StreamingExporter {
            client: factory.create(),
            local_info,
            shared: Arc::new(StreamShared::default()),
            create_instant: Instant::now(),
            last_drop_report: AtomicU64::new(u64::MAX),
        }
    }

    pub fn is_connected(&self) -> bool {
        let mut state = self.shared.state.lock().unwrap();
        self.shared.discard_closed(&mut state);
        state.stream.is_some()
    }

    fn start_stream(&self, state: &mut StreamState) {
        state.generation += 1;
        let generation = state.generation;
        let watcher = Arc::new(StreamWatcher {
            shared: Arc::downgrade(&self.shared),
            generation,
        });
        match self.client.start(watcher) {
            Some(stream) => {
                state.stream = Some((generation, stream));
                // the close event may have been reported before start returns
                self.shared.discard_closed(state);
                if state.stream.is_some() {
                    debug!("metrics service stream {generation} started");
                }
            }
            None => debug!("metrics service stream {generation} failed to start"),
        }
    }

    fn report_drop(&self, count: usize) {
        debug!("metrics service stream not connected, {count} metrics dropped");
        let time_slice = drop_report_slice(self.create_instant.elapsed());
        if self.last_drop_report.swap(time_slice, Ordering::Relaxed) != time_slice {
            warn!("metrics service stream is not connected, metrics will be dropped");
        }
    }
}

impl MetricsStreamer for StreamingExporter {
    fn send(&self, message: &mut StreamMetricsMessage) {
        let mut state = self.shared.state.lock().unwrap();
        self.shared.discard_closed(&mut state);
        if state.stream.is_none() {
            self.start_stream(&mut state);
        }

        message.set_identifier(self.local_info.node());
        if let Some((_, stream)) = state.stream.as_mut() {
            stream.send_message(message, false);
        } else {
            self.report_drop(message.len());
        }
    }
}
