/*
[INPUT]:  Server base URL, Engine.IO path, transport preference
[OUTPUT]: Open Session (handshake + packet channels) over websocket or polling
[POS]:    Transport layer - Engine.IO sessions
[UPDATE]: When adding transports or changing session plumbing
*/

pub mod polling;
pub mod websocket;

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use url::Url;

use crate::error::{FeedError, Result};
use crate::protocol::{ENGINE_IO_VERSION, EnginePacket, Handshake};

pub(crate) const CHANNEL_CAPACITY: usize = 256;
const CLOSE_GRACE: Duration = Duration::from_secs(2);
const PARSE_FAIL_LOG_LIMIT: usize = 3;
const RAW_LOG_MAX_BYTES: usize = 1024;

static PARSE_FAIL_LOG_COUNT: AtomicUsize = AtomicUsize::new(0);

/// Engine.IO transports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Websocket,
    Polling,
}

impl TransportKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransportKind::Websocket => "websocket",
            TransportKind::Polling => "polling",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An open Engine.IO session.
///
/// Inbound items are packets, or one error right before the channel closes.
/// Dropping the session aborts the transport task.
#[derive(Debug)]
pub struct Session {
    kind: TransportKind,
    handshake: Handshake,
    incoming: mpsc::Receiver<Result<EnginePacket>>,
    outgoing: mpsc::Sender<EnginePacket>,
    task: JoinHandle<()>,
}

impl Session {
    pub(crate) fn new(
        kind: TransportKind,
        handshake: Handshake,
        incoming: mpsc::Receiver<Result<EnginePacket>>,
        outgoing: mpsc::Sender<EnginePacket>,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            kind,
            handshake,
            incoming,
            outgoing,
            task,
        }
    }

    pub fn kind(&self) -> TransportKind {
        self.kind
    }

    pub fn handshake(&self) -> &Handshake {
        &self.handshake
    }

    /// Next inbound packet; `None` once the transport has closed
    pub async fn recv(&mut self) -> Option<Result<EnginePacket>> {
        self.incoming.recv().await
    }

    pub async fn send(&self, packet: EnginePacket) -> Result<()> {
        self.outgoing
            .send(packet)
            .await
            .map_err(|_| FeedError::TransportClosed)
    }

    /// Send an Engine.IO close and give the transport a moment to flush it.
    pub async fn close(mut self) {
        let _ = self.outgoing.send(EnginePacket::Close).await;
        if tokio::time::timeout(CLOSE_GRACE, &mut self.task).await.is_err() {
            debug!(transport = %self.kind, "transport did not finish closing in time");
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Open a session over `kind`, completing the Engine.IO handshake.
pub async fn open(
    kind: TransportKind,
    base: &Url,
    path: &str,
    http: &reqwest::Client,
) -> Result<Session> {
    let session = match kind {
        TransportKind::Websocket => websocket::open(base, path).await?,
        TransportKind::Polling => polling::open(http, base, path).await?,
    };
    info!(
        transport = %kind,
        sid = %session.handshake.sid,
        ping_interval_ms = session.handshake.ping_interval,
        ping_timeout_ms = session.handshake.ping_timeout,
        "engine.io session opened"
    );
    Ok(session)
}

/// `{base}{path}?EIO=4&transport=...[&sid=...]`, with a ws/wss scheme for websocket.
pub fn endpoint_url(
    base: &Url,
    path: &str,
    kind: TransportKind,
    sid: Option<&str>,
) -> Result<Url> {
    let mut url = base.clone();
    url.set_path(path);
    url.set_query(None);
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("EIO", ENGINE_IO_VERSION);
        query.append_pair("transport", kind.as_str());
        if let Some(sid) = sid {
            query.append_pair("sid", sid);
        }
    }

    let scheme = match (kind, base.scheme()) {
        (TransportKind::Websocket, "http" | "ws") => "ws",
        (TransportKind::Websocket, "https" | "wss") => "wss",
        (TransportKind::Polling, "http" | "ws") => "http",
        (TransportKind::Polling, "https" | "wss") => "https",
        (_, other) => {
            return Err(FeedError::Config(format!("unsupported url scheme: {other}")));
        }
    };
    if url.scheme() != scheme && url.set_scheme(scheme).is_err() {
        return Err(FeedError::Config(format!(
            "cannot switch {} to {scheme}",
            base.scheme()
        )));
    }
    Ok(url)
}

pub(crate) fn log_parse_fail_once(err: &FeedError, raw: &str) {
    let count = PARSE_FAIL_LOG_COUNT.fetch_add(1, Ordering::Relaxed);
    if count < PARSE_FAIL_LOG_LIMIT {
        info!(
            sample_index = count + 1,
            sample_limit = PARSE_FAIL_LOG_LIMIT,
            error = %err,
            bytes = raw.len(),
            "engine packet parse failed"
        );
        let preview = truncate_for_log(raw, RAW_LOG_MAX_BYTES);
        debug!(
            sample_index = count + 1,
            sample_limit = PARSE_FAIL_LOG_LIMIT,
            error = %err,
            bytes = raw.len(),
            message = %preview,
            "engine packet parse failed"
        );
    }
}

pub(crate) fn truncate_for_log(value: &str, max_len: usize) -> String {
    if value.len() <= max_len {
        return value.to_string();
    }
    let mut cut = max_len;
    while !value.is_char_boundary(cut) {
        cut -= 1;
    }
    let mut out = String::with_capacity(cut + 3);
    out.push_str(&value[..cut]);
    out.push_str("...");
    out
}
