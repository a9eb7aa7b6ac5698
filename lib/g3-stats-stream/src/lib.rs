/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

pub mod version;

mod identity;
pub use identity::{LocalInfo, NodeIdentity, StaticLocalInfo, check_local_info};

mod message;
pub use message::{MetricEntry, MetricKind, StreamMetricsMessage, StreamMetricsResponse};

mod transport;
pub use transport::{
    MetricsServiceClient, MetricsServiceClientFactory, MetricsStream, StreamCallbacks,
    StreamStatus,
};

mod exporter;
pub use exporter::{MetricsStreamer, StreamingExporter};

mod sink;
pub use sink::{FlushBatch, Metric, MetricsServiceSink, MetricsSnapshot};

mod config;
pub use config::MetricsServiceConfig;

mod tcp;
pub use tcp::{TcpMetricsServiceClient, TcpMetricsServiceClientFactory};
