//! Page-side messaging glue.
//!
//! What a page does once the worker is active: open the message
//! channel, query the current backend address, and keep listening for
//! broadcasts so it stays in sync with updates made from other pages.

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::protocol::{PageMessage, WorkerMessage};

type ClientError = Box<dyn std::error::Error + Send + Sync>;

/// One page's connection to the worker.
pub struct WorkerClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WorkerClient {
    /// Connects to the worker's message channel and immediately
    /// queries the current backend address, as a page does on
    /// becoming active.
    pub async fn connect(url: &str) -> Result<Self, ClientError> {
        let (stream, _) = connect_async(url).await?;
        let mut client = Self { stream };
        client.query_server().await?;
        Ok(client)
    }

    /// Asks the worker to broadcast the current backend address
    /// without changing it.
    pub async fn query_server(&mut self) -> Result<(), ClientError> {
        self.send(&PageMessage::ServerUpdate { server: None }).await
    }

    /// Asks the worker to switch to `server`. The confirmation
    /// arrives as a broadcast to every page, this one included.
    pub async fn set_server(&mut self, server: &str) -> Result<(), ClientError> {
        self.send(&PageMessage::ServerUpdate {
            server: Some(server.to_string()),
        })
        .await
    }

    async fn send(&mut self, message: &PageMessage) -> Result<(), ClientError> {
        let json = serde_json::to_string(message)?;
        self.stream.send(Message::Text(json)).await?;
        Ok(())
    }

    /// Waits for the next broadcast and returns the address it
    /// carries, or `None` once the connection closes.
    pub async fn next_update(&mut self) -> Option<String> {
        while let Some(frame) = self.stream.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    match serde_json::from_str::<WorkerMessage>(&text) {
                        Ok(WorkerMessage::ServerUpdate { server }) => return Some(server),
                        Err(e) => tracing::debug!(?e, "ignoring unrecognized worker message"),
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(?e, "worker connection errored");
                    return None;
                }
            }
        }
        None
    }
}
