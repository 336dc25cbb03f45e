/*
[INPUT]:  FeedConfig (address, transports, reconnect policy)
[OUTPUT]: Connect / ConnectError / Disconnect / Data events via Dispatcher, status via watch
[POS]:    Client layer - connection lifecycle and reconnect loop
[UPDATE]: When changing lifecycle events, reconnect policy, or shutdown semantics
*/

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::FeedConfig;
use crate::dispatch::{Dispatcher, Subscription};
use crate::error::{FeedError, Result};
use crate::protocol::{DEFAULT_NAMESPACE, EnginePacket, SocketPacket};
use crate::source::FeedSource;
use crate::transport::{self, Session, log_parse_fail_once};
use crate::types::{CandleRecord, ConnectionStatus, DisconnectReason, FeedEvent};

const BATCH_SAMPLE_LIMIT: usize = 3;
const UNHANDLED_EVENT_LOG_LIMIT: usize = 5;

static BATCH_SAMPLE_COUNT: AtomicUsize = AtomicUsize::new(0);
static UNHANDLED_EVENT_LOG_COUNT: AtomicUsize = AtomicUsize::new(0);

/// Socket.IO client for the candle feed.
///
/// Created once at startup and handed to the page by reference. The worker
/// task starts on [`FeedSource::connect`] and stops on [`FeedSource::close`]
/// or drop.
#[derive(Debug)]
pub struct FeedClient {
    config: FeedConfig,
    base_url: Url,
    http: reqwest::Client,
    events: Dispatcher<FeedEvent>,
    status: watch::Sender<ConnectionStatus>,
    worker: Mutex<WorkerSlot>,
}

#[derive(Debug, Default)]
struct WorkerSlot {
    shutdown: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl WorkerSlot {
    fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl FeedClient {
    pub fn new(config: FeedConfig) -> Result<Self> {
        let base_url = config.validate()?;
        let http = reqwest::Client::builder()
            .cookie_store(config.with_credentials)
            .connect_timeout(config.connect_timeout())
            .build()?;
        let (status, _rx) = watch::channel(ConnectionStatus::Disconnected);

        Ok(Self {
            config,
            base_url,
            http,
            events: Dispatcher::new(),
            status,
            worker: Mutex::new(WorkerSlot::default()),
        })
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Whether a worker task is currently running
    pub fn is_active(&self) -> bool {
        self.slot().is_running()
    }

    /// Subscribe to the client's own view of the connection status.
    pub fn status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.subscribe()
    }

    /// Wait for the worker to exit (after close, give-up, or server disconnect).
    pub async fn join(&mut self) {
        let handle = self
            .worker
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .handle
            .take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    fn slot(&self) -> MutexGuard<'_, WorkerSlot> {
        self.worker.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl FeedSource for FeedClient {
    fn subscribe(&self) -> Subscription<FeedEvent> {
        self.events.subscribe()
    }

    /// Start the connection worker. No-op while one is already running.
    fn connect(&self) {
        let mut slot = self.slot();
        if slot.is_running() {
            return;
        }

        if tokio::runtime::Handle::try_current().is_err() {
            warn!("FeedClient::connect called without Tokio runtime; worker not started");
            return;
        }

        if slot.shutdown.is_cancelled() {
            slot.shutdown = CancellationToken::new();
        }

        let worker = FeedWorker {
            config: self.config.clone(),
            base_url: self.base_url.clone(),
            http: self.http.clone(),
            events: self.events.clone(),
            status: self.status.clone(),
            shutdown: slot.shutdown.clone(),
        };
        info!(url = %self.base_url, event = %self.config.event, "starting feed worker");
        slot.handle = Some(tokio::spawn(worker.run()));
    }

    fn close(&self) {
        let slot = self.slot();
        if !slot.shutdown.is_cancelled() {
            info!("closing feed connection");
            slot.shutdown.cancel();
        }
    }
}

impl Drop for FeedClient {
    fn drop(&mut self) {
        self.slot().shutdown.cancel();
    }
}

struct FeedWorker {
    config: FeedConfig,
    base_url: Url,
    http: reqwest::Client,
    events: Dispatcher<FeedEvent>,
    status: watch::Sender<ConnectionStatus>,
    shutdown: CancellationToken,
}

impl FeedWorker {
    async fn run(self) {
        let mut attempts: u32 = 0;

        loop {
            let connected = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                result = self.connect_once() => result,
            };

            match connected {
                Ok((mut session, buffered)) => {
                    attempts = 0;
                    info!(transport = %session.kind(), "feed connected");
                    self.publish(FeedEvent::Connect);

                    let mut reason = None;
                    for packet in buffered {
                        reason = self.handle_socket_packet(packet);
                        if reason.is_some() {
                            break;
                        }
                    }
                    let reason = match reason {
                        Some(reason) => reason,
                        None => self.stream_loop(&mut session).await,
                    };

                    if reason == DisconnectReason::IoClientDisconnect {
                        let disconnect = SocketPacket::Disconnect {
                            namespace: DEFAULT_NAMESPACE.to_string(),
                        };
                        let _ = session.send(EnginePacket::Message(disconnect.encode())).await;
                        session.close().await;
                    } else {
                        drop(session);
                    }

                    info!(reason = %reason, "feed disconnected");
                    self.publish(FeedEvent::Disconnect(reason));

                    if !reason.should_reconnect() {
                        break;
                    }
                }
                Err(err) => {
                    warn!(attempt = attempts, error = %err, "feed connect failed");
                    let retryable = err.is_retryable();
                    self.publish(FeedEvent::ConnectError(Arc::new(err)));
                    if !retryable {
                        warn!("feed connect error is not retryable; giving up");
                        break;
                    }
                }
            }

            if !self.config.reconnection || attempts >= self.config.reconnection_attempts {
                warn!(
                    attempts,
                    max_attempts = self.config.reconnection_attempts,
                    "feed gave up reconnecting"
                );
                break;
            }

            attempts += 1;
            let delay = self.config.reconnection_delay();
            info!(attempt = attempts, ?delay, "feed reconnecting");
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        debug!("feed worker finished");
    }

    fn publish(&self, event: FeedEvent) {
        self.status.send_modify(|status| *status = status.apply(&event));
        self.events.emit(event);
    }

    async fn connect_once(&self) -> Result<(Session, Vec<SocketPacket>)> {
        let timeout = self.config.connect_timeout();
        match tokio::time::timeout(timeout, self.open_any()).await {
            Ok(result) => result,
            Err(_) => Err(FeedError::Timeout {
                duration_ms: self.config.connect_timeout_ms,
            }),
        }
    }

    /// Try each configured transport in order.
    async fn open_any(&self) -> Result<(Session, Vec<SocketPacket>)> {
        let mut failures = Vec::new();
        let mut last_err = None;

        for kind in &self.config.transports {
            match self.open_namespace(*kind).await {
                Ok(opened) => return Ok(opened),
                Err(err @ FeedError::ConnectRejected { .. }) => return Err(err),
                Err(err) => {
                    debug!(transport = %kind, error = %err, "transport failed");
                    failures.push(format!("{kind}: {err}"));
                    last_err = Some(err);
                }
            }
        }

        match last_err {
            Some(err) if failures.len() == 1 => Err(err),
            _ => Err(FeedError::NoTransport {
                tried: failures.join("; "),
            }),
        }
    }

    /// Open a transport and join the default namespace.
    ///
    /// Events that arrive before the CONNECT ack are returned so they can be
    /// delivered right after `Connect`.
    async fn open_namespace(
        &self,
        kind: transport::TransportKind,
    ) -> Result<(Session, Vec<SocketPacket>)> {
        let mut session =
            transport::open(kind, &self.base_url, &self.config.path, &self.http).await?;
        session
            .send(EnginePacket::Message(SocketPacket::connect().encode()))
            .await?;

        let mut buffered = Vec::new();
        loop {
            match session.recv().await {
                Some(Ok(EnginePacket::Message(body))) => match SocketPacket::decode(&body)? {
                    SocketPacket::Connect { namespace, .. } if namespace == DEFAULT_NAMESPACE => {
                        return Ok((session, buffered));
                    }
                    SocketPacket::ConnectError { message, .. } => {
                        return Err(FeedError::ConnectRejected { message });
                    }
                    packet @ SocketPacket::Event { .. } => buffered.push(packet),
                    other => debug!(?other, "ignoring packet before namespace connect"),
                },
                Some(Ok(EnginePacket::Ping(data))) => {
                    session.send(EnginePacket::Pong(data)).await?;
                }
                Some(Ok(EnginePacket::Close)) | None => return Err(FeedError::TransportClosed),
                Some(Ok(_)) => {}
                Some(Err(err)) => return Err(err),
            }
        }
    }

    async fn stream_loop(&self, session: &mut Session) -> DisconnectReason {
        let deadline = Duration::from_millis(session.handshake().heartbeat_deadline_ms());

        loop {
            let next = tokio::select! {
                _ = self.shutdown.cancelled() => return DisconnectReason::IoClientDisconnect,
                next = tokio::time::timeout(deadline, session.recv()) => next,
            };

            match next {
                Err(_) => {
                    warn!(deadline_ms = deadline.as_millis() as u64, "no heartbeat from feed server");
                    return DisconnectReason::PingTimeout;
                }
                Ok(None) => return DisconnectReason::TransportClose,
                Ok(Some(Err(err))) => {
                    warn!(error = %err, "feed transport error");
                    return DisconnectReason::TransportError;
                }
                Ok(Some(Ok(packet))) => match packet {
                    EnginePacket::Ping(data) => {
                        if session.send(EnginePacket::Pong(data)).await.is_err() {
                            return DisconnectReason::TransportClose;
                        }
                    }
                    EnginePacket::Close => return DisconnectReason::TransportClose,
                    EnginePacket::Message(body) => match SocketPacket::decode(&body) {
                        Ok(packet) => {
                            if let Some(reason) = self.handle_socket_packet(packet) {
                                return reason;
                            }
                        }
                        Err(err) => log_parse_fail_once(&err, &body),
                    },
                    EnginePacket::Open(_)
                    | EnginePacket::Pong(_)
                    | EnginePacket::Upgrade
                    | EnginePacket::Noop => {}
                },
            }
        }
    }

    /// Returns a reason when the packet ends the session.
    fn handle_socket_packet(&self, packet: SocketPacket) -> Option<DisconnectReason> {
        match packet {
            SocketPacket::Event {
                namespace,
                name,
                args,
                ..
            } if namespace == DEFAULT_NAMESPACE => {
                if name == self.config.event {
                    match candles_from_args(args) {
                        Some(candles) => {
                            log_batch_sample_once(&candles);
                            self.publish(FeedEvent::Data(candles));
                        }
                        None => warn!(event = %name, "event payload is not a candle array"),
                    }
                } else {
                    log_unhandled_event_once(&name);
                }
                None
            }
            SocketPacket::Disconnect { namespace } if namespace == DEFAULT_NAMESPACE => {
                Some(DisconnectReason::IoServerDisconnect)
            }
            other => {
                debug!(?other, "ignoring socket packet");
                None
            }
        }
    }
}

/// First event argument as a candle batch. Non-array entries become empty
/// records so the batch keeps its length; consumers skip them.
fn candles_from_args(args: Vec<Value>) -> Option<Vec<CandleRecord>> {
    let Some(Value::Array(items)) = args.into_iter().next() else {
        return None;
    };
    Some(
        items
            .into_iter()
            .map(|item| match item {
                Value::Array(fields) => CandleRecord::new(fields),
                _ => CandleRecord::default(),
            })
            .collect(),
    )
}

fn log_batch_sample_once(candles: &[CandleRecord]) {
    let count = BATCH_SAMPLE_COUNT.fetch_add(1, Ordering::Relaxed);
    if count >= BATCH_SAMPLE_LIMIT {
        debug!(candles = candles.len(), "received kline batch");
        return;
    }
    info!(
        sample_index = count + 1,
        sample_limit = BATCH_SAMPLE_LIMIT,
        candles = candles.len(),
        "received kline batch"
    );
}

fn log_unhandled_event_once(name: &str) {
    let count = UNHANDLED_EVENT_LOG_COUNT.fetch_add(1, Ordering::Relaxed);
    if count < UNHANDLED_EVENT_LOG_LIMIT {
        info!(
            sample_index = count + 1,
            sample_limit = UNHANDLED_EVENT_LOG_LIMIT,
            event = name,
            "feed event not subscribed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn candles_from_args_keeps_batch_length() {
        let args = vec![json!([[1000, "1", "1", "1", "100.5"], "oops", [2000]])];
        let candles = candles_from_args(args).unwrap();
        assert_eq!(candles.len(), 3);
        assert_eq!(candles[0].close(), Some(100.5));
        assert!(candles[1].is_empty());
        assert_eq!(candles[2].open_time_ms(), Some(2000.0));
    }

    #[test]
    fn candles_from_args_rejects_non_array() {
        assert!(candles_from_args(vec![json!({"data": []})]).is_none());
        assert!(candles_from_args(Vec::new()).is_none());
    }

    #[test]
    fn client_rejects_invalid_config() {
        let err = FeedClient::new(FeedConfig::with_url("mailto:someone@example.com")).unwrap_err();
        assert!(matches!(err, FeedError::Config(_)));
    }

    #[test]
    fn connect_without_runtime_is_noop() {
        let client = FeedClient::new(FeedConfig::default()).unwrap();
        client.connect();
        assert!(!client.is_active());
        assert_eq!(*client.status().borrow(), ConnectionStatus::Disconnected);
    }
}
