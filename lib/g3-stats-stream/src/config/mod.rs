/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroUsize;
use std::time::Duration;

use crate::{NodeIdentity, StaticLocalInfo};

#[cfg(feature = "yaml")]
mod yaml;

const DEFAULT_QUEUE_SIZE: NonZeroUsize = NonZeroUsize::new(64).unwrap();

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetricsServiceConfig {
    pub(crate) collector: SocketAddr,
    pub(crate) connect_timeout: Duration,
    pub(crate) queue_size: NonZeroUsize,
    pub(crate) service_cluster: String,
    pub(crate) service_node: String,
    pub(crate) zone: String,
}

impl Default for MetricsServiceConfig {
    fn default() -> Self {
        MetricsServiceConfig {
            collector: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 9901),
            connect_timeout: Duration::from_secs(5),
            queue_size: DEFAULT_QUEUE_SIZE,
            service_cluster: String::new(),
            service_node: String::new(),
            zone: String::new(),
        }
    }
}

impl MetricsServiceConfig {
    pub fn set_collector(&mut self, addr: SocketAddr) {
        self.collector = addr;
    }

    pub fn set_connect_timeout(&mut self, timeout: Duration) {
        self.connect_timeout = timeout;
    }

    pub fn set_queue_size(&mut self, size: NonZeroUsize) {
        self.queue_size = size;
    }

    pub fn set_service_cluster(&mut self, cluster: &str) {
        self.service_cluster = cluster.to_string();
    }

    pub fn set_service_node(&mut self, node: &str) {
        self.service_node = node.to_string();
    }

    pub fn set_zone(&mut self, zone: &str) {
        self.zone = zone.to_string();
    }

    #[inline]
    pub fn collector(&self) -> SocketAddr {
        self.collector
    }

    pub fn local_info(&self) -> StaticLocalInfo {
        let identity =
            NodeIdentity::new(&self.service_cluster, &self.service_node).with_zone(&self.zone);
        StaticLocalInfo::new(identity)
    }

    pub fn check(&self) -> anyhow::Result<()> {
        crate::check_local_info("metrics service", &self.local_info())
    }
}
