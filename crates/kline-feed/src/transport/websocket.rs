/*
[INPUT]:  ws:// or wss:// Engine.IO endpoint
[OUTPUT]: Session driven by a background read/write task
[POS]:    Transport layer - websocket transport
[UPDATE]: When changing websocket framing or close handling
*/

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info};
use url::Url;

use super::{CHANNEL_CAPACITY, Session, TransportKind, endpoint_url, log_parse_fail_once};
use crate::error::{FeedError, Result};
use crate::protocol::EnginePacket;

pub(crate) async fn open(base: &Url, path: &str) -> Result<Session> {
    let url = endpoint_url(base, path, TransportKind::Websocket, None)?;
    info!(url = %url, "connecting websocket transport");

    let (ws_stream, _response) = connect_async(url.as_str()).await?;
    let (mut write, mut read) = ws_stream.split();

    let handshake = loop {
        match read.next().await {
            Some(Ok(WsMessage::Text(text))) => match EnginePacket::decode(text.as_str())? {
                EnginePacket::Open(handshake) => break handshake,
                other => {
                    return Err(FeedError::Protocol(format!(
                        "expected open packet, got {other:?}"
                    )));
                }
            },
            Some(Ok(WsMessage::Ping(_))) | Some(Ok(WsMessage::Pong(_))) => continue,
            Some(Ok(WsMessage::Close(_))) | None => return Err(FeedError::TransportClosed),
            Some(Ok(other)) => {
                return Err(FeedError::Protocol(format!(
                    "expected text open packet, got {other:?}"
                )));
            }
            Some(Err(err)) => return Err(err.into()),
        }
    };

    let (incoming_tx, incoming_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let (outgoing_tx, mut outgoing_rx) = mpsc::channel::<EnginePacket>(CHANNEL_CAPACITY);

    let task = tokio::spawn(async move {
        loop {
            tokio::select! {
                outbound = outgoing_rx.recv() => {
                    match outbound {
                        Some(packet) => {
                            let closing = matches!(packet, EnginePacket::Close);
                            if write.send(WsMessage::Text(packet.encode().into())).await.is_err() {
                                break;
                            }
                            if closing {
                                let _ = write.send(WsMessage::Close(None)).await;
                                break;
                            }
                        }
                        None => {
                            let _ = write.send(WsMessage::Close(None)).await;
                            break;
                        }
                    }
                }
                incoming = read.next() => {
                    match incoming {
                        Some(Ok(WsMessage::Text(text))) => {
                            match EnginePacket::decode(text.as_str()) {
                                Ok(packet) => {
                                    if incoming_tx.send(Ok(packet)).await.is_err() {
                                        break;
                                    }
                                }
                                Err(err) => log_parse_fail_once(&err, text.as_str()),
                            }
                        }
                        Some(Ok(WsMessage::Close(_))) => {
                            let _ = write.send(WsMessage::Close(None)).await;
                            break;
                        }
                        Some(Ok(WsMessage::Ping(_))) | Some(Ok(WsMessage::Pong(_))) => {}
                        Some(Ok(WsMessage::Binary(bytes))) => {
                            debug!(bytes = bytes.len(), "ignoring binary websocket frame");
                        }
                        Some(Ok(WsMessage::Frame(_))) => {}
                        Some(Err(err)) => {
                            let _ = incoming_tx.send(Err(err.into())).await;
                            break;
                        }
                        None => break,
                    }
                }
            }
        }
        debug!("websocket transport task finished");
    });

    Ok(Session::new(
        TransportKind::Websocket,
        handshake,
        incoming_rx,
        outgoing_tx,
        task,
    ))
}
