/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;

use anyhow::anyhow;
use serde_json::{Map, Number, Value};

use g3_stats_tag::Tag;

use crate::NodeIdentity;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
}

impl MetricKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observed metric within a flush cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetricEntry {
    pub name: String,
    pub kind: MetricKind,
    pub value: u64,
    pub tags: Vec<Tag>,
    pub timestamp_ms: i64,
}

impl MetricEntry {
    fn to_json(&self) -> Value {
        let mut map = Map::with_capacity(5);
        map.insert("name".to_string(), Value::String(self.name.clone()));
        map.insert(
            "type".to_string(),
            Value::String(self.kind.as_str().to_string()),
        );
        map.insert("value".to_string(), Value::Number(self.value.into()));
        map.insert(
            "timestamp_ms".to_string(),
            Value::Number(Number::from(self.timestamp_ms)),
        );
        let mut tag_map = Map::with_capacity(self.tags.len());
        for tag in &self.tags {
            tag_map.insert(tag.name.clone(), Value::String(tag.value.clone()));
        }
        map.insert("tags".to_string(), Value::Object(tag_map));
        Value::Object(map)
    }
}

/// The batch sent to the collector for each flush cycle.
#[derive(Clone, Debug, Default)]
pub struct StreamMetricsMessage {
    identifier: Option<NodeIdentity>,
    entries: Vec<MetricEntry>,
}

impl StreamMetricsMessage {
    pub fn with_capacity(capacity: usize) -> Self {
        StreamMetricsMessage {
            identifier: None,
            entries: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn identifier(&self) -> Option<&NodeIdentity> {
        self.identifier.as_ref()
    }

    pub fn set_identifier(&mut self, identity: NodeIdentity) {
        self.identifier = Some(identity);
    }

    pub fn push(&mut self, entry: MetricEntry) {
        self.entries.push(entry);
    }

    #[inline]
    pub fn entries(&self) -> &[MetricEntry] {
        &self.entries
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.identifier = None;
        self.entries.clear();
    }

    pub fn to_json(&self) -> Value {
        let mut map = Map::with_capacity(2);
        if let Some(identifier) = &self.identifier {
            map.insert("identifier".to_string(), identifier.to_json());
        }
        let metrics = self.entries.iter().map(|e| e.to_json()).collect();
        map.insert("metrics".to_string(), Value::Array(metrics));
        Value::Object(map)
    }

    /// Append the message as a single line JSON object, without the newline.
    pub fn encode_json(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.to_json().to_string().as_bytes());
    }
}

/// A response from the collector. It carries nothing the sender acts upon.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StreamMetricsResponse {
    pub detail: Option<String>,
}

impl StreamMetricsResponse {
    pub fn decode_json(data: &[u8]) -> anyhow::Result<Self> {
        if data.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(StreamMetricsResponse::default());
        }
        let v: Value = serde_json::from_slice(data)
            .map_err(|e| anyhow!("invalid json response: {e}"))?;
        let Value::Object(map) = v else {
            return Err(anyhow!("json response should be an object"));
        };
        let detail = match map.get("detail") {
            Some(Value::String(s)) => Some(s.to_string()),
            Some(Value::Null) | None => None,
            Some(_) => return Err(anyhow!("invalid value type for key detail")),
        };
        Ok(StreamMetricsResponse { detail })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, kind: MetricKind, value: u64) -> MetricEntry {
        MetricEntry {
            name: name.to_string(),
            kind,
            value,
            tags: vec![Tag::new("cluster_name", "ratings")],
            timestamp_ms: 1_700_000_000_000,
        }
    }

    #[test]
    fn encode() {
        let mut msg = StreamMetricsMessage::default();
        msg.push(entry("cluster.upstream_rq", MetricKind::Counter, 3));
        msg.push(entry("cluster.membership_total", MetricKind::Gauge, 5));
        msg.set_identifier(NodeIdentity::new("proxy", "proxy-1"));

        let mut buf = Vec::new();
        msg.encode_json(&mut buf);
        assert!(!buf.contains(&b'\n'));

        let v: Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(v["identifier"]["node"], "proxy-1");
        let metrics = v["metrics"].as_array().unwrap();
        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics[0]["name"], "cluster.upstream_rq");
        assert_eq!(metrics[0]["type"], "counter");
        assert_eq!(metrics[0]["value"], 3);
        assert_eq!(metrics[0]["tags"]["cluster_name"], "ratings");
        assert_eq!(metrics[1]["type"], "gauge");
        assert_eq!(metrics[1]["timestamp_ms"], 1_700_000_000_000i64);
    }

    #[test]
    fn encode_appends() {
        let mut msg = StreamMetricsMessage::default();
        msg.push(entry("cluster.upstream_rq", MetricKind::Counter, 1));

        let mut buf = b"{}\n".to_vec();
        msg.encode_json(&mut buf);
        msg.encode_json(&mut buf);
        let lines: Vec<&[u8]> = buf.split(|b| *b == b'\n').collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], b"{}");
        // two objects back to back, nothing lost in between
        let mut values = serde_json::Deserializer::from_slice(lines[1]).into_iter::<Value>();
        for _ in 0..2 {
            let v = values.next().unwrap().unwrap();
            assert_eq!(v["metrics"][0]["value"], 1);
        }
        assert!(values.next().is_none());
    }

    #[test]
    fn encode_without_identifier() {
        let msg = StreamMetricsMessage::with_capacity(4);
        assert!(msg.is_empty());
        let v = msg.to_json();
        assert!(v.get("identifier").is_none());
        assert_eq!(v["metrics"].as_array().map(|a| a.len()), Some(0));
    }

    #[test]
    fn clear() {
        let mut msg = StreamMetricsMessage::default();
        msg.push(entry("a", MetricKind::Counter, 1));
        msg.set_identifier(NodeIdentity::new("proxy", "proxy-1"));
        assert_eq!(msg.len(), 1);
        msg.clear();
        assert!(msg.is_empty());
        assert!(msg.identifier().is_none());
    }

    #[test]
    fn decode_response() {
        let rsp = StreamMetricsResponse::decode_json(b"").unwrap();
        assert_eq!(rsp, StreamMetricsResponse::default());

        let rsp = StreamMetricsResponse::decode_json(b"{}").unwrap();
        assert!(rsp.detail.is_none());

        let rsp = StreamMetricsResponse::decode_json(br#"{"detail":"ok"}"#).unwrap();
        assert_eq!(rsp.detail.as_deref(), Some("ok"));

        assert!(StreamMetricsResponse::decode_json(b"[1]").is_err());
        assert!(StreamMetricsResponse::decode_json(b"{").is_err());
        assert!(StreamMetricsResponse::decode_json(br#"{"detail":1}"#).is_err());
    }
}
