/*
[INPUT]:  http:// or https:// Engine.IO endpoint, shared reqwest client
[OUTPUT]: Session driven by a long-poll loop
[POS]:    Transport layer - HTTP long-polling fallback
[UPDATE]: When changing polling request handling
*/

use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tokio::sync::mpsc;
use tracing::{debug, info};
use url::Url;

use super::{CHANNEL_CAPACITY, Session, TransportKind, endpoint_url};
use crate::error::{FeedError, Result};
use crate::protocol::{EnginePacket, decode_payload, encode_payload};

const POLLING_CONTENT_TYPE: &str = "text/plain;charset=UTF-8";

pub(crate) async fn open(http: &Client, base: &Url, path: &str) -> Result<Session> {
    let url = endpoint_url(base, path, TransportKind::Polling, None)?;
    info!(url = %url, "connecting polling transport");

    let mut packets = fetch(http.clone(), url).await?.into_iter();
    let handshake = match packets.next() {
        Some(EnginePacket::Open(handshake)) => handshake,
        Some(other) => {
            return Err(FeedError::Protocol(format!(
                "expected open packet, got {other:?}"
            )));
        }
        None => return Err(FeedError::Protocol("empty handshake response".to_string())),
    };
    let leftovers: Vec<EnginePacket> = packets.collect();

    let session_url = endpoint_url(base, path, TransportKind::Polling, Some(&handshake.sid))?;
    let (incoming_tx, incoming_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let (outgoing_tx, outgoing_rx) = mpsc::channel(CHANNEL_CAPACITY);

    let task = tokio::spawn(run(
        http.clone(),
        session_url,
        leftovers,
        incoming_tx,
        outgoing_rx,
    ));

    Ok(Session::new(
        TransportKind::Polling,
        handshake,
        incoming_rx,
        outgoing_tx,
        task,
    ))
}

async fn run(
    http: Client,
    url: Url,
    leftovers: Vec<EnginePacket>,
    incoming_tx: mpsc::Sender<Result<EnginePacket>>,
    mut outgoing_rx: mpsc::Receiver<EnginePacket>,
) {
    for packet in leftovers {
        if incoming_tx.send(Ok(packet)).await.is_err() {
            return;
        }
    }

    let mut poll = Box::pin(fetch(http.clone(), url.clone()));

    loop {
        tokio::select! {
            outbound = outgoing_rx.recv() => {
                match outbound {
                    Some(packet) => {
                        let mut batch = vec![packet];
                        while let Ok(more) = outgoing_rx.try_recv() {
                            batch.push(more);
                        }
                        let closing = batch.iter().any(|packet| matches!(packet, EnginePacket::Close));
                        if let Err(err) = post(&http, &url, &batch).await {
                            let _ = incoming_tx.send(Err(err)).await;
                            break;
                        }
                        if closing {
                            break;
                        }
                    }
                    None => {
                        let _ = post(&http, &url, &[EnginePacket::Close]).await;
                        break;
                    }
                }
            }
            polled = &mut poll => {
                match polled {
                    Ok(packets) => {
                        let mut closed = false;
                        for packet in packets {
                            closed |= matches!(packet, EnginePacket::Close);
                            if incoming_tx.send(Ok(packet)).await.is_err() {
                                return;
                            }
                        }
                        if closed {
                            break;
                        }
                        poll = Box::pin(fetch(http.clone(), url.clone()));
                    }
                    Err(err) => {
                        let _ = incoming_tx.send(Err(err)).await;
                        break;
                    }
                }
            }
        }
    }
    debug!("polling transport task finished");
}

async fn fetch(http: Client, url: Url) -> Result<Vec<EnginePacket>> {
    let body = http
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    decode_payload(&body)
}

async fn post(http: &Client, url: &Url, packets: &[EnginePacket]) -> Result<()> {
    http.post(url.clone())
        .header(CONTENT_TYPE, POLLING_CONTENT_TYPE)
        .body(encode_payload(packets))
        .send()
        .await?
        .error_for_status()?;
    Ok(())
}
