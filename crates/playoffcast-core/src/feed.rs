// Live-event feed client.
//
// Maintains a persistent WebSocket connection to the score/injury/weather
// feed and forwards raw text frames to the consumer. When the connection
// drops (or cannot be opened) it reconnects with capped exponential backoff,
// forever, until the consumer goes away.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::Stream;
use futures_util::StreamExt;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{debug, info, warn};

/// Events emitted by the feed client to the consumer.
#[derive(Debug, PartialEq)]
pub enum FeedEvent {
    /// A connection to the feed has been established.
    Connected { endpoint: String },
    /// The current connection ended.
    Disconnected,
    /// A reconnect attempt is scheduled.
    Reconnecting { attempt: u32, delay: Duration },
    /// A text frame was received (raw JSON string).
    Message(String),
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        source: tungstenite::Error,
    },
}

/// A stream of raw WebSocket frames.
pub type MessageStream =
    Pin<Box<dyn Stream<Item = Result<Message, tungstenite::Error>> + Send>>;

/// Opens a connection to the live feed.
///
/// Abstracted so the reconnect loop can be driven by in-memory streams.
#[async_trait]
pub trait FeedConnector: Send + Sync {
    async fn connect(&self) -> Result<MessageStream, FeedError>;

    fn endpoint(&self) -> &str;
}

/// Connects to a `ws://` or `wss://` URL.
pub struct TungsteniteConnector {
    url: String,
}

impl TungsteniteConnector {
    pub fn new(url: impl Into<String>) -> Self {
        TungsteniteConnector { url: url.into() }
    }
}

#[async_trait]
impl FeedConnector for TungsteniteConnector {
    async fn connect(&self) -> Result<MessageStream, FeedError> {
        let (ws_stream, _response) = tokio_tungstenite::connect_async(self.url.as_str())
            .await
            .map_err(|source| FeedError::Connect {
                endpoint: self.url.clone(),
                source,
            })?;
        // The feed is receive-only; the write half is dropped.
        let (_write, read) = ws_stream.split();
        Ok(Box::pin(read))
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}

// ---------------------------------------------------------------------------
// Backoff
// ---------------------------------------------------------------------------

/// Capped exponential backoff: `base * 2^(attempt - 1)`, never above `cap`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub base: Duration,
    pub cap: Duration,
}

impl Backoff {
    pub fn new(base: Duration, cap: Duration) -> Self {
        Backoff { base, cap }
    }

    /// Delay before reconnect attempt `attempt` (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(20);
        self.base.saturating_mul(1u32 << exponent).min(self.cap)
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Backoff::new(Duration::from_millis(500), Duration::from_secs(30))
    }
}

// ---------------------------------------------------------------------------
// Connection loop
// ---------------------------------------------------------------------------

/// Run the feed client, forwarding events through `tx`.
///
/// Returns only when `tx` is closed (receiver dropped). Connection failures
/// are logged and retried with backoff; the attempt counter resets after
/// every successful connection.
pub async fn run<C>(connector: &C, backoff: Backoff, tx: mpsc::Sender<FeedEvent>)
where
    C: FeedConnector + ?Sized,
{
    let endpoint = connector.endpoint().to_string();
    let mut attempt: u32 = 0;

    loop {
        match connector.connect().await {
            Ok(stream) => {
                info!("Connected to live feed at {endpoint}");
                attempt = 0;
                if tx
                    .send(FeedEvent::Connected {
                        endpoint: endpoint.clone(),
                    })
                    .await
                    .is_err()
                {
                    return;
                }
                if process_message_stream(stream, &tx, &endpoint).await.is_err() {
                    return;
                }
                if tx.send(FeedEvent::Disconnected).await.is_err() {
                    return;
                }
            }
            Err(e) => {
                warn!("Live feed connection failed: {e}");
            }
        }

        attempt = attempt.saturating_add(1);
        let delay = backoff.delay(attempt);
        debug!("Reconnecting to {endpoint} in {delay:?} (attempt {attempt})");
        if tx
            .send(FeedEvent::Reconnecting { attempt, delay })
            .await
            .is_err()
        {
            return;
        }
        tokio::time::sleep(delay).await;
    }
}

/// Process raw WebSocket [`Message`] items from any [`Stream`], forwarding
/// text payloads through `tx`. Returns `Err(())` if the channel is closed
/// (receiver dropped), signalling the caller to stop.
pub async fn process_message_stream<St>(
    mut stream: St,
    tx: &mpsc::Sender<FeedEvent>,
    endpoint: &str,
) -> Result<(), ()>
where
    St: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    while let Some(msg_result) = stream.next().await {
        match msg_result {
            Ok(Message::Text(text)) => {
                if tx.send(FeedEvent::Message(text.to_string())).await.is_err() {
                    return Err(());
                }
            }
            Ok(Message::Close(_)) => {
                info!("Feed {endpoint} sent close frame");
                break;
            }
            Err(e) => {
                warn!("WebSocket error from {endpoint}: {e}");
                break;
            }
            _ => {
                // Ignore Binary, Ping, Pong, Frame variants.
            }
        }
    }
    Ok(())
}
