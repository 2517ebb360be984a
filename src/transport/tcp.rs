//! Length-prefixed frames over TCP: a `u32` big-endian length followed by
//! the payload in the configured codec.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::time::{timeout, Duration};

use crate::config::ServerConfig;
use crate::protocol::{ClientFrame, Codec, ProtocolError, ServerEvent};
use crate::transport::{ClientTransport, EventSink, FrameSource, Received};

/// Framing settings shared by both halves of a connection.
#[derive(Debug, Clone, Copy)]
pub struct FrameConfig {
    pub codec: Codec,
    pub io_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_frame_size: u32,
}

impl Default for FrameConfig {
    fn default() -> Self {
        FrameConfig::from(&ServerConfig::default())
    }
}

impl From<&ServerConfig> for FrameConfig {
    fn from(config: &ServerConfig) -> Self {
        Self {
            codec: config.codec,
            io_timeout: config.io_timeout,
            idle_timeout: config.idle_timeout,
            max_frame_size: config.max_frame_size,
        }
    }
}

fn map_io(e: std::io::Error) -> anyhow::Error {
    match e.kind() {
        std::io::ErrorKind::UnexpectedEof => anyhow::anyhow!("Connection closed by peer"),
        std::io::ErrorKind::ConnectionReset | std::io::ErrorKind::BrokenPipe => {
            anyhow::anyhow!("Connection reset by peer")
        }
        _ => anyhow::anyhow!("I/O error: {}", e),
    }
}

async fn read_len<R: AsyncRead + Unpin>(reader: &mut R, max: u32) -> anyhow::Result<u32> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await.map_err(map_io)?;
    let len = u32::from_be_bytes(len_buf);
    if len > max {
        return Err(anyhow::anyhow!("Frame too large: {} bytes (max: {})", len, max));
    }
    if len == 0 {
        return Err(anyhow::anyhow!("Invalid frame length: 0"));
    }
    Ok(len)
}

async fn read_body<R: AsyncRead + Unpin>(reader: &mut R, len: u32) -> anyhow::Result<Vec<u8>> {
    let mut buf = vec![0u8; len as usize];
    reader.read_exact(&mut buf).await.map_err(map_io)?;
    Ok(buf)
}

async fn write_frame<W: AsyncWrite + Unpin>(
    writer: &mut W,
    data: &[u8],
    max: u32,
) -> anyhow::Result<()> {
    if data.len() as u64 > max as u64 {
        return Err(anyhow::anyhow!(
            "Frame too large: {} bytes (max: {})",
            data.len(),
            max
        ));
    }
    writer
        .write_all(&(data.len() as u32).to_be_bytes())
        .await
        .map_err(map_io)?;
    writer.write_all(data).await.map_err(map_io)?;
    writer.flush().await.map_err(map_io)?;
    Ok(())
}

/// Read one frame: the header may take up to `idle`, the body up to `io`.
async fn read_frame<R: AsyncRead + Unpin>(
    reader: &mut R,
    config: &FrameConfig,
) -> anyhow::Result<Vec<u8>> {
    let len = timeout(config.idle_timeout, read_len(reader, config.max_frame_size))
        .await
        .map_err(|_| anyhow::anyhow!("Connection idle for {:?}", config.idle_timeout))??;
    timeout(config.io_timeout, read_body(reader, len))
        .await
        .map_err(|_| anyhow::anyhow!("Receive timeout after {:?}", config.io_timeout))?
}

pub struct TcpReceiver {
    reader: OwnedReadHalf,
    config: FrameConfig,
}

pub struct TcpSender {
    writer: OwnedWriteHalf,
    config: FrameConfig,
}

/// Split an accepted stream into server-side halves.
pub fn split(stream: TcpStream, config: FrameConfig) -> (TcpReceiver, TcpSender) {
    let (reader, writer) = stream.into_split();
    (
        TcpReceiver { reader, config },
        TcpSender { writer, config },
    )
}

#[async_trait::async_trait]
impl FrameSource for TcpReceiver {
    async fn recv(&mut self) -> anyhow::Result<Received> {
        let bytes = read_frame(&mut self.reader, &self.config).await?;
        Ok(match self.config.codec.decode::<ClientFrame>(&bytes) {
            Ok(frame) => Received::Frame(frame),
            Err(e) => Received::Malformed(ProtocolError::Undecodable(e.to_string())),
        })
    }
}

#[async_trait::async_trait]
impl EventSink for TcpSender {
    async fn send(&mut self, event: &ServerEvent) -> anyhow::Result<()> {
        let data = self.config.codec.encode(event)?;
        timeout(
            self.config.io_timeout,
            write_frame(&mut self.writer, &data, self.config.max_frame_size),
        )
        .await
        .map_err(|_| anyhow::anyhow!("Send timeout after {:?}", self.config.io_timeout))?
    }
}

/// Client side of a TCP connection to the match server.
pub struct TcpClient {
    stream: TcpStream,
    config: FrameConfig,
}

impl TcpClient {
    pub async fn connect<A: ToSocketAddrs>(addr: A, codec: Codec) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self {
            stream,
            config: FrameConfig {
                codec,
                ..FrameConfig::default()
            },
        })
    }

    /// Send raw payload bytes inside a well-formed frame.
    pub async fn send_raw(&mut self, payload: &[u8]) -> anyhow::Result<()> {
        write_frame(&mut self.stream, payload, self.config.max_frame_size).await
    }
}

#[async_trait::async_trait]
impl ClientTransport for TcpClient {
    async fn send(&mut self, frame: &ClientFrame) -> anyhow::Result<()> {
        let data = self.config.codec.encode(frame)?;
        self.send_raw(&data).await
    }

    async fn recv(&mut self) -> anyhow::Result<ServerEvent> {
        let bytes = read_frame(&mut self.stream, &self.config).await?;
        self.config.codec.decode(&bytes)
    }
}
