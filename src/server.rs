use std::sync::Arc;

use log::{info, warn};
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::gateway::{serve_connection, Gateway};
use crate::transport::tcp::{self, FrameConfig};

/// Accept connections on an already bound listener until the task is
/// cancelled.
pub async fn run(listener: TcpListener, config: ServerConfig) -> anyhow::Result<()> {
    let gateway = Arc::new(Gateway::new(config.seed));
    let frames = FrameConfig::from(&config);
    info!(
        "listening on {} ({} frames, max {} bytes)",
        listener.local_addr()?,
        frames.codec,
        frames.max_frame_size
    );
    loop {
        let (stream, addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!("accept failed: {}", e);
                continue;
            }
        };
        info!("client connected from {}", addr);
        let (source, sink) = tcp::split(stream, frames);
        tokio::spawn(serve_connection(gateway.clone(), source, sink));
    }
}

/// Bind `config.bind` and serve.
pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&config.bind).await?;
    run(listener, config).await
}
