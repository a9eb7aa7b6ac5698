/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;
use std::time::Instant;

use log::{debug, warn};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::exporter::drop_report_slice;
use crate::{
    MetricsServiceClient, MetricsServiceClientFactory, MetricsServiceConfig, MetricsStream,
    StreamCallbacks, StreamMetricsMessage, StreamMetricsResponse, StreamStatus,
};

/// Create clients that stream newline delimited JSON over plain TCP.
pub struct TcpMetricsServiceClientFactory {
    config: Arc<MetricsServiceConfig>,
    handle: Handle,
}

impl TcpMetricsServiceClientFactory {
    pub fn new(config: MetricsServiceConfig, handle: Handle) -> Self {
        TcpMetricsServiceClientFactory {
            config: Arc::new(config),
            handle,
        }
    }
}

impl MetricsServiceClientFactory for TcpMetricsServiceClientFactory {
    fn create(&self) -> Box<dyn MetricsServiceClient> {
        Box::new(TcpMetricsServiceClient {
            config: self.config.clone(),
            handle: self.handle.clone(),
        })
    }
}

pub struct TcpMetricsServiceClient {
    config: Arc<MetricsServiceConfig>,
    handle: Handle,
}

impl MetricsServiceClient for TcpMetricsServiceClient {
    fn start(&self, callbacks: Arc<dyn StreamCallbacks>) -> Option<Box<dyn MetricsStream>> {
        let (sender, receiver) = mpsc::channel(self.config.queue_size.get());
        let runtime = TcpStreamRuntime {
            config: self.config.clone(),
            callbacks,
            receiver,
        };
        self.handle.spawn(runtime.into_running());
        Some(Box::new(TcpMetricsStream {
            sender: Some(sender),
            write_buf: Vec::with_capacity(2048),
            create_instant: Instant::now(),
            last_drop_report: u64::MAX,
        }))
    }
}

struct TcpMetricsStream {
    sender: Option<mpsc::Sender<Vec<u8>>>,
    write_buf: Vec<u8>,

    create_instant: Instant,
    last_drop_report: u64,
}

impl TcpMetricsStream {
    fn report_drop(&mut self, reason: &str) {
        let time_slice = drop_report_slice(self.create_instant.elapsed());
        if self.last_drop_report != time_slice {
            warn!("metrics message dropped: {reason}");
            self.last_drop_report = time_slice;
        }
    }
}

impl MetricsStream for TcpMetricsStream {
    fn send_message(&mut self, message: &StreamMetricsMessage, end_stream: bool) {
        let Some(sender) = &self.sender else {
            debug!("metrics message sent after end of stream");
            return;
        };

        self.write_buf.clear();
        message.encode_json(&mut self.write_buf);
        self.write_buf.push(b'\n');
        match sender.try_send(self.write_buf.clone()) {
            Ok(_) => {}
            Err(mpsc::error::TrySendError::Full(_)) => self.report_drop("send queue is full"),
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("metrics message dropped as the stream is closed")
            }
        }

        if end_stream {
            self.sender = None;
        }
    }
}

const READ_BUFFER_SIZE: usize = 4096;
const MAX_RESPONSE_LINE_SIZE: usize = 64 * 1024;

/// Split the response bytes into lines.
///
/// A line longer than [`MAX_RESPONSE_LINE_SIZE`] is dropped and reported as
/// `None` once its end is seen.
#[derive(Default)]
struct ResponseLines {
    partial: Vec<u8>,
    oversized: bool,
}

impl ResponseLines {
    fn feed<F>(&mut self, mut data: &[u8], mut on_line: F)
    where
        F: FnMut(Option<&[u8]>),
    {
        while let Some(p) = data.iter().position(|b| *b == b'\n') {
            let line = &data[..p];
            data = &data[p + 1..];

            if self.oversized || self.partial.len() + line.len() > MAX_RESPONSE_LINE_SIZE {
                on_line(None);
            } else if self.partial.is_empty() {
                on_line(Some(line));
            } else {
                self.partial.extend_from_slice(line);
                on_line(Some(&self.partial));
            }
            self.partial.clear();
            self.oversized = false;
        }

        if self.oversized {
            return;
        }
        if self.partial.len() + data.len() > MAX_RESPONSE_LINE_SIZE {
            self.partial.clear();
            self.oversized = true;
        } else {
            self.partial.extend_from_slice(data);
        }
    }
}

struct TcpStreamRuntime {
    config: Arc<MetricsServiceConfig>,
    callbacks: Arc<dyn StreamCallbacks>,
    receiver: mpsc::Receiver<Vec<u8>>,
}

impl TcpStreamRuntime {
    async fn into_running(mut self) {
        let addr = self.config.collector;
        let stream = match tokio::time::timeout(
            self.config.connect_timeout,
            TcpStream::connect(addr),
        )
        .await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                self.callbacks.on_remote_close(
                    StreamStatus::Unavailable,
                    &format!("failed to connect to {addr}: {e}"),
                );
                return;
            }
            Err(_) => {
                self.callbacks.on_remote_close(
                    StreamStatus::DeadlineExceeded,
                    &format!("timed out connecting to {addr}"),
                );
                return;
            }
        };
        debug!("metrics service stream connected to {addr}");

        let (mut reader, mut writer) = stream.into_split();
        let mut read_buf = vec![0u8; READ_BUFFER_SIZE];
        let mut lines = ResponseLines::default();

        loop {
            tokio::select! {
                biased;

                r = reader.read(&mut read_buf) => {
                    match r {
                        Ok(0) => {
                            self.callbacks.on_remote_close(
                                StreamStatus::Unavailable,
                                "connection closed by peer",
                            );
                            break;
                        }
                        Ok(n) => lines.feed(&read_buf[..n], |line| self.handle_response(line)),
                        Err(e) => {
                            self.callbacks.on_remote_close(
                                StreamStatus::Unavailable,
                                &format!("read failed: {e}"),
                            );
                            break;
                        }
                    }
                }
                r = self.receiver.recv() => {
                    let Some(frame) = r else {
                        // closed locally, no need to notify
                        let _ = writer.shutdown().await;
                        break;
                    };
                    if let Err(e) = writer.write_all(&frame).await {
                        self.callbacks.on_remote_close(
                            StreamStatus::Internal,
                            &format!("write failed: {e}"),
                        );
                        break;
                    }
                }
            }
        }
    }

    fn handle_response(&self, line: Option<&[u8]>) {
        let Some(line) = line else {
            debug!(
                "too long response line from metrics collector {}",
                self.config.collector
            );
            self.callbacks.on_receive_message(None);
            return;
        };
        match StreamMetricsResponse::decode_json(line) {
            Ok(rsp) => self.callbacks.on_receive_message(Some(rsp)),
            Err(e) => {
                debug!(
                    "invalid response from metrics collector {}: {e}",
                    self.config.collector
                );
                self.callbacks.on_receive_message(None);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use serde_json::Value;
    use tokio::io::{AsyncBufReadExt, BufReader};
    use tokio::net::TcpListener;

    use crate::{MetricEntry, MetricKind, MetricsStreamer, StreamingExporter};

    enum Event {
        Message(Option<StreamMetricsResponse>),
        Close(StreamStatus),
    }

    struct ChannelCallbacks {
        sender: mpsc::UnboundedSender<Event>,
    }

    impl StreamCallbacks for ChannelCallbacks {
        fn on_receive_message(&self, response: Option<StreamMetricsResponse>) {
            let _ = self.sender.send(Event::Message(response));
        }

        fn on_remote_close(&self, status: StreamStatus, _message: &str) {
            let _ = self.sender.send(Event::Close(status));
        }
    }

    fn config(addr: std::net::SocketAddr) -> MetricsServiceConfig {
        let mut config = MetricsServiceConfig::default();
        config.set_collector(addr);
        config.set_connect_timeout(Duration::from_secs(2));
        config.set_service_cluster("proxy");
        config.set_service_node("proxy-1");
        config
    }

    fn message(count: usize) -> StreamMetricsMessage {
        let mut msg = StreamMetricsMessage::default();
        for i in 0..count {
            msg.push(MetricEntry {
                name: format!("test_gauge_{i}"),
                kind: MetricKind::Gauge,
                value: i as u64,
                tags: Vec::new(),
                timestamp_ms: 0,
            });
        }
        msg
    }

    async fn read_frame(lines: &mut tokio::io::Lines<BufReader<TcpStream>>) -> Value {
        let line = tokio::time::timeout(Duration::from_secs(5), lines.next_line())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        serde_json::from_str(&line).unwrap()
    }

    #[tokio::test]
    async fn stream_flow() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let factory = TcpMetricsServiceClientFactory::new(
            config(listener.local_addr().unwrap()),
            Handle::current(),
        );
        let client = factory.create();

        let (sender, mut events) = mpsc::unbounded_channel();
        let mut stream = client
            .start(Arc::new(ChannelCallbacks { sender }))
            .unwrap();
        stream.send_message(&message(2), false);

        let (conn, _) = listener.accept().await.unwrap();
        let (reader, mut writer) = conn.into_split();
        let mut lines = BufReader::new(reader).lines();

        let line = tokio::time::timeout(Duration::from_secs(5), lines.next_line())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        let v: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(v["metrics"].as_array().map(|a| a.len()), Some(2));

        writer.write_all(b"{\"detail\":\"ok\"}\n").await.unwrap();
        match events.recv().await.unwrap() {
            Event::Message(Some(rsp)) => assert_eq!(rsp.detail.as_deref(), Some("ok")),
            _ => panic!("expected a response"),
        }

        drop(writer);
        drop(lines);
        match events.recv().await.unwrap() {
            Event::Close(status) => assert_eq!(status, StreamStatus::Unavailable),
            _ => panic!("expected a close event"),
        }
    }

    fn feed_all(lines: &mut ResponseLines, data: &[u8]) -> Vec<Option<Vec<u8>>> {
        let mut out = Vec::new();
        lines.feed(data, |line| out.push(line.map(|l| l.to_vec())));
        out
    }

    #[test]
    fn response_lines_split() {
        let mut lines = ResponseLines::default();
        assert!(feed_all(&mut lines, b"{\"detail\"").is_empty());
        let out = feed_all(&mut lines, b":\"a\"}\n{}\n{");
        assert_eq!(
            out,
            vec![Some(b"{\"detail\":\"a\"}".to_vec()), Some(b"{}".to_vec())]
        );
        let out = feed_all(&mut lines, b"}\n");
        assert_eq!(out, vec![Some(b"{}".to_vec())]);
    }

    #[test]
    fn response_lines_oversized() {
        let mut lines = ResponseLines::default();
        let long = vec![b'a'; MAX_RESPONSE_LINE_SIZE];
        assert!(feed_all(&mut lines, &long).is_empty());
        assert!(feed_all(&mut lines, b"aaaa").is_empty());
        let out = feed_all(&mut lines, b"aa\n{}\n");
        assert_eq!(out, vec![None, Some(b"{}".to_vec())]);

        // a line of exactly the max size is still accepted
        let mut data = vec![b' '; MAX_RESPONSE_LINE_SIZE - 2];
        data.extend_from_slice(b"{}\n");
        let out = feed_all(&mut lines, &data[..10]);
        assert!(out.is_empty());
        let out = feed_all(&mut lines, &data[10..]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].as_ref().map(|l| l.len()), Some(MAX_RESPONSE_LINE_SIZE));
    }

    #[tokio::test]
    async fn undecodable_responses() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let client = TcpMetricsServiceClient {
            config: Arc::new(config(listener.local_addr().unwrap())),
            handle: Handle::current(),
        };
        let (sender, mut events) = mpsc::unbounded_channel();
        let _stream = client
            .start(Arc::new(ChannelCallbacks { sender }))
            .unwrap();

        let (mut conn, _) = listener.accept().await.unwrap();
        conn.write_all(b"\xff\xfe\n").await.unwrap();
        conn.write_all(&vec![b'x'; MAX_RESPONSE_LINE_SIZE + 1]).await.unwrap();
        conn.write_all(b"\n{\"detail\":\"ok\"}\n").await.unwrap();

        for _ in 0..2 {
            let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
                .await
                .unwrap()
                .unwrap();
            assert!(matches!(event, Event::Message(None)));
        }
        // the stream is still usable
        let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .unwrap()
            .unwrap();
        match event {
            Event::Message(Some(rsp)) => assert_eq!(rsp.detail.as_deref(), Some("ok")),
            _ => panic!("expected a response"),
        }
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn connect_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = TcpMetricsServiceClient {
            config: Arc::new(config(addr)),
            handle: Handle::current(),
        };
        let (sender, mut events) = mpsc::unbounded_channel();
        let mut stream = client
            .start(Arc::new(ChannelCallbacks { sender }))
            .unwrap();
        stream.send_message(&message(1), false);

        let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(
            event,
            Event::Close(StreamStatus::Unavailable | StreamStatus::DeadlineExceeded)
        ));
    }

    #[tokio::test]
    async fn end_of_stream() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let client = TcpMetricsServiceClient {
            config: Arc::new(config(listener.local_addr().unwrap())),
            handle: Handle::current(),
        };
        let (sender, mut events) = mpsc::unbounded_channel();
        let mut stream = client
            .start(Arc::new(ChannelCallbacks { sender }))
            .unwrap();
        stream.send_message(&message(1), true);
        // ignored after the end of stream
        stream.send_message(&message(3), false);

        let (conn, _) = listener.accept().await.unwrap();
        let mut conn = BufReader::new(conn);
        let mut line = String::new();
        conn.read_line(&mut line).await.unwrap();
        let v: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(v["metrics"].as_array().map(|a| a.len()), Some(1));

        // the client shuts down its side after the last frame
        line.clear();
        let n = conn.read_line(&mut line).await.unwrap();
        assert_eq!(n, 0);
        drop(stream);

        // no close event is reported for a local close
        assert!(
            tokio::time::timeout(Duration::from_millis(100), events.recv())
                .await
                .map(|e| e.is_none())
                .unwrap_or(true)
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn exporter_reconnect() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let config = config(listener.local_addr().unwrap());
        let local_info = Arc::new(config.local_info());
        let factory = TcpMetricsServiceClientFactory::new(config, Handle::current());
        let exporter = StreamingExporter::new(&factory, local_info);

        exporter.send(&mut message(2));
        assert!(exporter.is_connected());

        let (conn, _) = listener.accept().await.unwrap();
        let mut lines = BufReader::new(conn).lines();
        let v = read_frame(&mut lines).await;
        assert_eq!(v["identifier"]["node"], "proxy-1");
        assert_eq!(v["metrics"].as_array().map(|a| a.len()), Some(2));

        // the collector goes away
        drop(lines);
        for _ in 0..50 {
            if !exporter.is_connected() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(!exporter.is_connected());

        // the next batch opens a new stream
        exporter.send(&mut message(1));
        let (conn, _) = listener.accept().await.unwrap();
        let mut lines = BufReader::new(conn).lines();
        let v = read_frame(&mut lines).await;
        assert_eq!(v["metrics"].as_array().map(|a| a.len()), Some(1));
        assert!(exporter.is_connected());
    }
}
