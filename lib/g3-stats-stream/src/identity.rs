/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use anyhow::anyhow;
use serde_json::{Map, Value};

/// Identity of the local process, sent as the header of each metrics message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeIdentity {
    pub cluster: String,
    pub node: String,
    pub zone: String,
    pub build_version: String,
}

impl NodeIdentity {
    pub fn new(cluster: &str, node: &str) -> Self {
        NodeIdentity {
            cluster: cluster.to_string(),
            node: node.to_string(),
            zone: String::new(),
            build_version: crate::version::version(),
        }
    }

    pub fn with_zone(mut self, zone: &str) -> Self {
        self.zone = zone.to_string();
        self
    }

    pub(crate) fn to_json(&self) -> Value {
        let mut map = Map::with_capacity(4);
        map.insert("cluster".to_string(), Value::String(self.cluster.clone()));
        map.insert("node".to_string(), Value::String(self.node.clone()));
        if !self.zone.is_empty() {
            map.insert("zone".to_string(), Value::String(self.zone.clone()));
        }
        map.insert(
            "build_version".to_string(),
            Value::String(self.build_version.clone()),
        );
        Value::Object(map)
    }
}

pub trait LocalInfo: Send + Sync {
    fn node(&self) -> NodeIdentity;

    fn cluster_name(&self) -> &str;

    fn node_name(&self) -> &str;

    fn zone_name(&self) -> &str {
        ""
    }
}

/// A local identity that never changes.
#[derive(Clone, Debug)]
pub struct StaticLocalInfo {
    identity: NodeIdentity,
}

impl StaticLocalInfo {
    pub fn new(identity: NodeIdentity) -> Self {
        StaticLocalInfo { identity }
    }
}

impl LocalInfo for StaticLocalInfo {
    fn node(&self) -> NodeIdentity {
        self.identity.clone()
    }

    fn cluster_name(&self) -> &str {
        &self.identity.cluster
    }

    fn node_name(&self) -> &str {
        &self.identity.node
    }

    fn zone_name(&self) -> &str {
        &self.identity.zone
    }
}

/// Check that the local identity is complete enough to talk to a collector.
pub fn check_local_info(error_prefix: &str, local_info: &dyn LocalInfo) -> anyhow::Result<()> {
    if local_info.cluster_name().is_empty() || local_info.node_name().is_empty() {
        return Err(anyhow!(
            "{error_prefix}: setting service cluster and service node is required"
        ));
    }
    Ok(())
}
