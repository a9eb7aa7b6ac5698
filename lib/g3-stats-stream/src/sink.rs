/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;

use chrono::Utc;
use log::debug;

use g3_stats_tag::TagProducer;

use crate::{MetricEntry, MetricKind, MetricsStreamer, StreamMetricsMessage};

pub trait Metric {
    fn name(&self) -> &str;
}

/// A point in time view of the stats storage.
pub trait MetricsSnapshot {
    /// Visit all counters with the delta since the last snapshot.
    fn for_each_counter(&self, f: &mut dyn FnMut(&dyn Metric, u64));

    /// Visit all gauges with their current value.
    fn for_each_gauge(&self, f: &mut dyn FnMut(&dyn Metric, u64));
}

/// Collect the metrics of each flush cycle into one message.
pub struct MetricsServiceSink {
    streamer: Arc<dyn MetricsStreamer>,
    tag_producer: Arc<TagProducer>,
    message: StreamMetricsMessage,
}

impl MetricsServiceSink {
    pub fn new(streamer: Arc<dyn MetricsStreamer>, tag_producer: Arc<TagProducer>) -> Self {
        MetricsServiceSink {
            streamer,
            tag_producer,
            message: StreamMetricsMessage::default(),
        }
    }

    /// Use the new producer from the next flush cycle.
    pub fn set_tag_producer(&mut self, tag_producer: Arc<TagProducer>) {
        self.tag_producer = tag_producer;
    }

    pub fn begin_flush(&mut self) -> FlushBatch<'_> {
        self.message.clear();
        FlushBatch {
            timestamp_ms: Utc::now().timestamp_millis(),
            sink: self,
            ended: false,
        }
    }

    /// Run a whole flush cycle over the snapshot.
    pub fn flush(&mut self, snapshot: &dyn MetricsSnapshot) {
        let mut batch = self.begin_flush();
        snapshot.for_each_counter(&mut |metric: &dyn Metric, delta| {
            batch.flush_counter(metric, delta)
        });
        snapshot.for_each_gauge(&mut |metric: &dyn Metric, value| batch.flush_gauge(metric, value));
        batch.end_flush();
    }
}

/// An open flush cycle.
///
/// It holds the sink mutably, so there can be only one open cycle at a time.
/// If dropped without calling [`FlushBatch::end_flush`], all collected
/// metrics are discarded.
pub struct FlushBatch<'a> {
    sink: &'a mut MetricsServiceSink,
    timestamp_ms: i64,
    ended: bool,
}

impl FlushBatch<'_> {
    pub fn flush_counter(&mut self, metric: &dyn Metric, delta: u64) {
        self.add_entry(metric, MetricKind::Counter, delta);
    }

    pub fn flush_gauge(&mut self, metric: &dyn Metric, value: u64) {
        self.add_entry(metric, MetricKind::Gauge, value);
    }

    fn add_entry(&mut self, metric: &dyn Metric, kind: MetricKind, value: u64) {
        let mut tags = Vec::new();
        let name = self
            .sink
            .tag_producer
            .produce_tags(metric.name(), &mut tags)
            .into_owned();
        self.sink.message.push(MetricEntry {
            name,
            kind,
            value,
            tags,
            timestamp_ms: self.timestamp_ms,
        });
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sink.message.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sink.message.is_empty()
    }

    /// Hand the collected metrics to the streamer. An empty batch is not sent.
    pub fn end_flush(mut self) {
        self.ended = true;
        if !self.sink.message.is_empty() {
            self.sink.streamer.send(&mut self.sink.message);
        }
    }
}

impl Drop for FlushBatch<'_> {
    fn drop(&mut self) {
        if !self.ended && !self.sink.message.is_empty() {
            debug!(
                "flush cycle not ended, {} metrics discarded",
                self.sink.message.len()
            );
        }
        self.sink.message.clear();
    }
}
