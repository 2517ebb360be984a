use std::sync::Arc;

use broadside::transport::in_memory::InMemoryTransport;
use broadside::transport::{ClientTransport, EventSink, FrameSource, Received};
use broadside::{
    serve_connection, ClientFrame, Gateway, PlayerSlot, ProtocolError, ServerEvent,
};
use tokio::time::{timeout, Duration};

const WAIT: Duration = Duration::from_secs(5);

#[tokio::test(flavor = "multi_thread")]
async fn test_pair_carries_frames_and_events() -> anyhow::Result<()> {
    let (mut source, mut sink, mut client) = InMemoryTransport::pair();

    client.send(&ClientFrame::join("alice")).await?;
    client.send_malformed("bad bytes")?;
    assert_eq!(
        source.recv().await?,
        Received::Frame(ClientFrame::join("alice"))
    );
    assert_eq!(
        source.recv().await?,
        Received::Malformed(ProtocolError::Undecodable("bad bytes".to_string()))
    );

    assert!(client.try_recv().is_none());
    sink.send(&ServerEvent::RematchReady {}).await?;
    assert_eq!(client.recv().await?, ServerEvent::RematchReady {});

    drop(client);
    assert!(source.recv().await.is_err());
    assert!(sink.send(&ServerEvent::RematchReady {}).await.is_err());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_served_connections_play_through_gateway() -> anyhow::Result<()> {
    let gateway = Arc::new(Gateway::new(Some(21)));
    let (source1, sink1, mut alice) = InMemoryTransport::pair();
    let (source2, sink2, mut bob) = InMemoryTransport::pair();
    let conn1 = tokio::spawn(serve_connection(gateway.clone(), source1, sink1));
    let conn2 = tokio::spawn(serve_connection(gateway.clone(), source2, sink2));

    alice.send(&ClientFrame::join("alice")).await?;
    assert_eq!(
        timeout(WAIT, alice.recv()).await??,
        ServerEvent::Joined {
            slot: PlayerSlot::P1
        }
    );
    alice.send_malformed("noise")?;
    bob.send(&ClientFrame::join("bob")).await?;
    assert_eq!(
        timeout(WAIT, bob.recv()).await??,
        ServerEvent::Joined {
            slot: PlayerSlot::P2
        }
    );
    assert_eq!(gateway.sessions().connected().await, 2);

    drop(alice);
    conn1.await?;
    assert_eq!(gateway.sessions().connected().await, 1);
    assert_eq!(gateway.matches().len().await, 1);

    drop(bob);
    conn2.await?;
    assert!(gateway.matches().is_empty().await);
    assert!(gateway.sessions().is_empty().await);
    Ok(())
}
