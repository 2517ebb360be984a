use tokio::sync::mpsc;

use crate::protocol::{ClientFrame, ProtocolError, ServerEvent};
use crate::transport::{ClientTransport, EventSink, FrameSource, Received};

/// Server end of an in-process connection: reading half.
pub struct InMemorySource {
    rx: mpsc::UnboundedReceiver<Received>,
}

/// Server end of an in-process connection: writing half.
pub struct InMemorySink {
    tx: mpsc::UnboundedSender<ServerEvent>,
}

/// Client end of an in-process connection. Dropping it closes the
/// connection.
pub struct InMemoryClient {
    tx: mpsc::UnboundedSender<Received>,
    rx: mpsc::UnboundedReceiver<ServerEvent>,
}

pub struct InMemoryTransport;

impl InMemoryTransport {
    /// Create a connected server/client pair.
    pub fn pair() -> (InMemorySource, InMemorySink, InMemoryClient) {
        let (frame_tx, frame_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        (
            InMemorySource { rx: frame_rx },
            InMemorySink { tx: event_tx },
            InMemoryClient {
                tx: frame_tx,
                rx: event_rx,
            },
        )
    }
}

impl InMemoryClient {
    /// Deliver a frame the server will treat as undecodable.
    pub fn send_malformed(&mut self, reason: &str) -> anyhow::Result<()> {
        self.tx
            .send(Received::Malformed(ProtocolError::Undecodable(reason.to_string())))
            .map_err(|_| anyhow::anyhow!("Channel closed"))
    }

    /// Next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<ServerEvent> {
        self.rx.try_recv().ok()
    }
}

#[async_trait::async_trait]
impl FrameSource for InMemorySource {
    async fn recv(&mut self) -> anyhow::Result<Received> {
        self.rx
            .recv()
            .await
            .ok_or_else(|| anyhow::anyhow!("Channel closed"))
    }
}

#[async_trait::async_trait]
impl EventSink for InMemorySink {
    async fn send(&mut self, event: &ServerEvent) -> anyhow::Result<()> {
        self.tx
            .send(event.clone())
            .map_err(|_| anyhow::anyhow!("Channel closed"))
    }
}

#[async_trait::async_trait]
impl ClientTransport for InMemoryClient {
    async fn send(&mut self, frame: &ClientFrame) -> anyhow::Result<()> {
        self.tx
            .send(Received::Frame(frame.clone()))
            .map_err(|_| anyhow::anyhow!("Channel closed"))
    }

    async fn recv(&mut self) -> anyhow::Result<ServerEvent> {
        self.rx
            .recv()
            .await
            .ok_or_else(|| anyhow::anyhow!("Channel closed"))
    }
}
