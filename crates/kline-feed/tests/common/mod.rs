/*
[INPUT]:  Scripted Socket.IO server behavior for tests
[OUTPUT]: In-process websocket Socket.IO server, event helpers, fixtures
[POS]:    Test infrastructure - shared across kline-feed integration tests
[UPDATE]: When adding new server behaviors or fixtures
*/

//! Common test utilities for kline-feed tests

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use kline_feed::{FeedConfig, FeedEvent, Subscription, TransportKind};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

pub const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

pub const KLINE_BATCH: &str = r#"42["kline_data",[[1000,"1","2","0.5","100.5","3"],[2000,"1","2","0.5","101.0","3"]]]"#;

/// How the server answers the namespace CONNECT
#[derive(Debug, Clone)]
pub enum NamespaceReply {
    Accept,
    Reject(String),
}

#[derive(Debug, Clone)]
pub enum ServerStep {
    Send(String),
    /// Close the websocket
    Close,
    /// Keep reading until the client goes away
    Hold,
}

#[derive(Debug, Clone)]
pub struct ServerScript {
    /// Sent in the open packet
    pub ping_interval_ms: u64,
    pub ping_timeout_ms: u64,
    /// Sent instead of the open packet when set
    pub open_frame: Option<String>,
    /// Frames sent after the client's CONNECT but before the ack
    pub pre_ack: Vec<String>,
    pub reply: NamespaceReply,
    pub steps: Vec<ServerStep>,
}

impl ServerScript {
    pub fn accept(steps: Vec<ServerStep>) -> Self {
        Self {
            ping_interval_ms: 25_000,
            ping_timeout_ms: 20_000,
            open_frame: None,
            pre_ack: Vec::new(),
            reply: NamespaceReply::Accept,
            steps,
        }
    }

    pub fn reject(message: &str) -> Self {
        Self {
            reply: NamespaceReply::Reject(message.to_string()),
            ..Self::accept(Vec::new())
        }
    }

    pub fn with_heartbeat(mut self, ping_interval_ms: u64, ping_timeout_ms: u64) -> Self {
        self.ping_interval_ms = ping_interval_ms;
        self.ping_timeout_ms = ping_timeout_ms;
        self
    }

    fn open_packet(&self, conn_id: usize) -> String {
        match &self.open_frame {
            Some(frame) => frame.clone(),
            None => format!(
                r#"0{{"sid":"sid-{conn_id}","upgrades":[],"pingInterval":{},"pingTimeout":{},"maxPayload":1000000}}"#,
                self.ping_interval_ms, self.ping_timeout_ms
            ),
        }
    }
}

pub struct MockSocketIoServer {
    pub addr: SocketAddr,
    pub connections: Arc<AtomicUsize>,
    /// Every text frame received from any client
    pub received: mpsc::UnboundedReceiver<String>,
}

impl MockSocketIoServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Wait until a frame equal to `expected` arrives
    pub async fn expect_frame(&mut self, expected: &str) {
        let wait = async {
            while let Some(frame) = self.received.recv().await {
                if frame == expected {
                    return;
                }
            }
            panic!("server channel closed before {expected:?}");
        };
        tokio::time::timeout(EVENT_TIMEOUT, wait)
            .await
            .unwrap_or_else(|_| panic!("timed out waiting for frame {expected:?}"));
    }
}

/// Start a websocket Socket.IO server that runs `script` for every connection.
pub async fn start_ws_server(script: ServerScript) -> MockSocketIoServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock server");
    let addr = listener.local_addr().expect("local addr");
    let connections = Arc::new(AtomicUsize::new(0));
    let (received_tx, received) = mpsc::unbounded_channel();

    let counter = connections.clone();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let conn_id = counter.fetch_add(1, Ordering::SeqCst) + 1;
            let script = script.clone();
            let received_tx = received_tx.clone();
            tokio::spawn(async move {
                let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else {
                    return;
                };
                let open = script.open_packet(conn_id);
                if ws.send(Message::Text(open.into())).await.is_err() {
                    return;
                }

                // Wait for the namespace CONNECT.
                loop {
                    match ws.next().await {
                        Some(Ok(Message::Text(text))) => {
                            let text = text.to_string();
                            let _ = received_tx.send(text.clone());
                            if text == "40" {
                                break;
                            }
                        }
                        Some(Ok(_)) => {}
                        _ => return,
                    }
                }

                for frame in &script.pre_ack {
                    let _ = ws.send(Message::Text(frame.clone().into())).await;
                }

                let reply = match &script.reply {
                    NamespaceReply::Accept => format!(r#"40{{"sid":"io-{conn_id}"}}"#),
                    NamespaceReply::Reject(message) => {
                        format!(r#"44{{"message":"{message}"}}"#)
                    }
                };
                if ws.send(Message::Text(reply.into())).await.is_err() {
                    return;
                }

                for step in &script.steps {
                    match step {
                        ServerStep::Send(frame) => {
                            if ws.send(Message::Text(frame.clone().into())).await.is_err() {
                                return;
                            }
                        }
                        ServerStep::Close => {
                            let _ = ws.close(None).await;
                            return;
                        }
                        ServerStep::Hold => {
                            while let Some(Ok(message)) = ws.next().await {
                                if let Message::Text(text) = message {
                                    let _ = received_tx.send(text.to_string());
                                }
                            }
                            return;
                        }
                    }
                }
            });
        }
    });

    MockSocketIoServer {
        addr,
        connections,
        received,
    }
}

/// Fast-reconnect config for tests
pub fn test_config(url: &str, transports: Vec<TransportKind>) -> FeedConfig {
    FeedConfig {
        transports,
        reconnection_delay_ms: 20,
        connect_timeout_ms: 2_000,
        ..FeedConfig::with_url(url)
    }
}

/// Address with nothing listening on it
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    addr
}

pub async fn next_event(sub: &mut Subscription<FeedEvent>) -> FeedEvent {
    tokio::time::timeout(EVENT_TIMEOUT, sub.recv())
        .await
        .expect("timed out waiting for feed event")
        .expect("feed event channel closed")
}
