/*
[INPUT]:  Feed URL (first argument, default http://localhost:5000)
[OUTPUT]: Lifecycle events and candle batches printed to stdout
[POS]:    Examples - subscribing to a kline feed without a UI
[UPDATE]: When FeedClient or FeedEvent changes
*/

use kline_feed::*;

/// Example: print every event from a live feed until Ctrl-C
#[tokio::main]
async fn main() {
    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "http://localhost:5000".to_string());

    let mut client = match FeedClient::new(FeedConfig::with_url(url.clone())) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Failed to create client: {}", e);
            return;
        }
    };
    let mut events = client.subscribe();
    client.connect();
    println!("Connecting to {url} (Ctrl-C to stop)");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Some(FeedEvent::Data(candles)) => {
                    let last_close = candles.last().and_then(CandleRecord::close);
                    println!("{} candles, last close {:?}", candles.len(), last_close);
                }
                Some(event) => println!("{}", event.name()),
                None => break,
            },
        }
    }

    client.close();
    client.join().await;
}
