// 9.2: websocket transport for the feed adapters. one task per stream, reconnecting forever
// with capped exponential backoff. parsed events go to the engine over the feed channel.

use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::time::sleep;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::price_feed::{forward, FeedAdapter, FeedError, FeedSender};

const BASE_RECONNECT_DELAY: Duration = Duration::from_secs(1);
const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(30);

fn reconnect_delay(attempt: u32) -> Duration {
    (BASE_RECONNECT_DELAY * 2u32.saturating_pow(attempt)).min(MAX_RECONNECT_DELAY)
}

/// Stream one adapter until the receiving side of `tx` is dropped.
pub async fn run_stream<A: FeedAdapter>(adapter: A, tx: FeedSender) {
    let mut attempt: u32 = 0;

    loop {
        tracing::info!(feed = adapter.name(), url = adapter.stream_url(), "connecting");

        match connect_async(adapter.stream_url()).await {
            Ok((ws_stream, _response)) => {
                tracing::info!(feed = adapter.name(), "connected");
                attempt = 0;

                let (mut write, mut read) = ws_stream.split();

                while let Some(msg) = read.next().await {
                    match msg {
                        Ok(Message::Text(text)) => match forward(&adapter, text.as_str(), &tx) {
                            Ok(_) => {}
                            Err(FeedError::ChannelClosed) => {
                                tracing::info!(feed = adapter.name(), "receiver dropped, stopping");
                                return;
                            }
                            // one bad message never kills the stream
                            Err(e) => tracing::warn!(feed = adapter.name(), error = %e, "dropping message"),
                        },
                        Ok(Message::Ping(data)) => {
                            if let Err(e) = write.send(Message::Pong(data)).await {
                                tracing::warn!(error = %e, "failed to send pong");
                                break;
                            }
                        }
                        Ok(Message::Close(_)) => {
                            tracing::warn!(feed = adapter.name(), "server sent close frame");
                            break;
                        }
                        Ok(_) => {}
                        Err(e) => {
                            tracing::error!(feed = adapter.name(), error = %e, "read error");
                            break;
                        }
                    }
                }
            }
            Err(e) => {
                tracing::error!(feed = adapter.name(), error = %e, "connection failed");
            }
        }

        if tx.is_closed() {
            return;
        }

        let delay = reconnect_delay(attempt);
        attempt = attempt.saturating_add(1);
        tracing::info!(feed = adapter.name(), delay_secs = delay.as_secs(), attempt, "reconnecting");
        sleep(delay).await;
    }
}
