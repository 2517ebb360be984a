use crate::protocol::{ClientFrame, ProtocolError, ServerEvent};

/// One inbound frame as seen by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Received {
    Frame(ClientFrame),
    /// The frame arrived intact but its payload did not decode.
    Malformed(ProtocolError),
}

/// Server-side reading half of a client connection. An error means the
/// connection is gone.
#[async_trait::async_trait]
pub trait FrameSource: Send {
    async fn recv(&mut self) -> anyhow::Result<Received>;
}

/// Server-side writing half of a client connection.
#[async_trait::async_trait]
pub trait EventSink: Send {
    async fn send(&mut self, event: &ServerEvent) -> anyhow::Result<()>;
}

/// Client end of a connection, used by bots and tests.
#[async_trait::async_trait]
pub trait ClientTransport: Send {
    async fn send(&mut self, frame: &ClientFrame) -> anyhow::Result<()>;
    async fn recv(&mut self) -> anyhow::Result<ServerEvent>;
}

pub mod in_memory;
pub mod tcp;
