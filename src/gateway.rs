//! Translates inbound client frames into match operations and routes the
//! resulting events back to the players bound to that match.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::mpsc;

use crate::game::{ClientIdentity, Match, MatchEvent, Outbound, PlayerSlot, Recipient};
use crate::protocol::{Command, ServerEvent};
use crate::registry::{MatchId, MatchRegistry};
use crate::session::{ClientHandle, ConnectionId, Seat, SessionDirectory};
use crate::transport::{EventSink, FrameSource, Received};

pub struct Gateway {
    sessions: SessionDirectory,
    matches: MatchRegistry,
    next_conn: AtomicU64,
}

impl Gateway {
    /// `seed` fixes the first-turn coin flips of every match.
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            sessions: SessionDirectory::new(),
            matches: MatchRegistry::new(seed),
            next_conn: AtomicU64::new(0),
        }
    }

    pub fn sessions(&self) -> &SessionDirectory {
        &self.sessions
    }

    pub fn matches(&self) -> &MatchRegistry {
        &self.matches
    }

    /// Register a new connection; events for it arrive on the receiver.
    pub fn connect(&self) -> (ClientHandle, mpsc::UnboundedReceiver<ServerEvent>) {
        let id = ConnectionId(self.next_conn.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::unbounded_channel();
        (ClientHandle::new(id, tx), rx)
    }

    /// Handle one inbound frame from `handle`'s connection.
    pub async fn dispatch(&self, handle: &ClientHandle, received: Received) {
        let frame = match received {
            Received::Frame(frame) => frame,
            Received::Malformed(e) => {
                warn!("{}: dropping malformed frame: {}", handle.id(), e);
                return;
            }
        };
        match Command::try_from(frame) {
            Ok(command) => self.execute(handle, command).await,
            Err(e) => warn!("{}: dropping frame: {}", handle.id(), e),
        }
    }

    /// Run a validated command.
    pub async fn execute(&self, handle: &ClientHandle, command: Command) {
        match command {
            Command::Join { identity, match_id } => self.join(handle, identity, match_id).await,
            Command::PlaceShips { identity, ships } => {
                self.with_match(handle, &identity, |m| m.submit_placement(&identity, &ships))
                    .await
            }
            Command::Fire { identity, index } => {
                self.with_match(handle, &identity, |m| m.fire(&identity, index))
                    .await
            }
            Command::Rematch { identity } => {
                self.with_match(handle, &identity, |m| m.rematch(&identity))
                    .await
            }
        }
    }

    async fn join(&self, handle: &ClientHandle, identity: ClientIdentity, match_id: Option<MatchId>) {
        if let Some(old) = self.sessions.bind(&identity, handle.clone()).await {
            info!("{}: {} supersedes {}", handle.id(), identity, old.id());
        }

        if let Some(seat) = self.sessions.seat_of(&identity).await {
            if match_id.as_ref().is_some_and(|id| *id != seat.match_id) {
                debug!("{} is already seated in {}", identity, seat.match_id);
            }
            if let Some(mut m) = self.matches.lock(&seat.match_id).await {
                match m.join(&identity) {
                    Ok(out) => {
                        self.deliver(&m, handle, out).await;
                        return;
                    }
                    Err(e) => warn!("{}: rejoin of {} failed: {}", handle.id(), identity, e),
                }
            }
            self.sessions.release(&identity).await;
        }

        let joined = match &match_id {
            Some(id) => self.matches.join_named(id, &identity).await,
            None => self.matches.join_lobby(&identity).await,
        };
        match joined {
            Ok(joined) => {
                info!("{}: {} joined {} as {}", handle.id(), identity, joined.match_id, joined.slot);
                self.sessions
                    .assign(
                        &identity,
                        Seat {
                            match_id: joined.match_id,
                            slot: joined.slot,
                        },
                    )
                    .await;
                for out in joined.events {
                    handle.send(out.event.into());
                }
            }
            Err(e) => {
                debug!("{}: join of {} rejected: {}", handle.id(), identity, e);
                handle.send(ServerEvent::join_rejected(&e));
                self.sessions.unbind(&identity, handle.id()).await;
            }
        }
    }

    /// Run `action` on the match `identity` is seated in, if the request
    /// comes from the identity's current connection.
    async fn with_match<F>(&self, handle: &ClientHandle, identity: &ClientIdentity, action: F)
    where
        F: FnOnce(&mut Match) -> Vec<Outbound> + Send,
    {
        if !self.sessions.is_current(identity, handle.id()).await {
            debug!("{}: ignoring action for unbound identity {}", handle.id(), identity);
            return;
        }
        let Some(seat) = self.sessions.seat_of(identity).await else {
            debug!("{}: {} has no match", handle.id(), identity);
            return;
        };
        let Some(mut m) = self.matches.lock(&seat.match_id).await else {
            debug!("{}: match {} is gone", handle.id(), seat.match_id);
            return;
        };

        let out = action(&mut m);
        for o in &out {
            match &o.event {
                MatchEvent::BattleStart { active_slot } => {
                    info!("{}: battle started, {} fires first", seat.match_id, active_slot)
                }
                MatchEvent::Hit {
                    winner: Some(winner),
                    ..
                } => info!("{}: {} won", seat.match_id, winner),
                _ => {}
            }
        }
        self.deliver(&m, handle, out).await;
    }

    /// Send events to the sender or to every live connection of the match.
    async fn deliver(&self, m: &Match, sender: &ClientHandle, out: Vec<Outbound>) {
        for o in out {
            let event = ServerEvent::from(o.event);
            match o.to {
                Recipient::Sender => {
                    sender.send(event);
                }
                Recipient::Both => {
                    for slot in PlayerSlot::ALL {
                        let Some(identity) = m.identity(slot) else {
                            continue;
                        };
                        if let Some(h) = self.sessions.handle_of(identity).await {
                            h.send(event.clone());
                        }
                    }
                }
            }
        }
    }

    /// Tear down everything bound to a closed connection. Seats survive so the
    /// identities can rejoin; a match with nobody left online is removed.
    pub async fn disconnect(&self, handle: &ClientHandle) {
        let released = self.sessions.unbind_connection(handle.id()).await;
        for identity in released {
            let Some(seat) = self.sessions.seat_of(&identity).await else {
                continue;
            };
            let Some(mut m) = self.matches.lock(&seat.match_id).await else {
                self.sessions.release(&identity).await;
                continue;
            };
            // A reconnect may have rebound the identity in the meantime.
            if self.sessions.handle_of(&identity).await.is_some() {
                continue;
            }
            let vacant = m.disconnect(&identity);
            drop(m);
            info!("{}: {} left {}", handle.id(), identity, seat.match_id);
            if vacant {
                if let Some(identities) = self.matches.remove_if_vacant(&seat.match_id).await {
                    for id in identities {
                        self.sessions.release(&id).await;
                    }
                }
            }
        }
    }
}

/// Drive one connection until its source closes.
pub async fn serve_connection<S, K>(gateway: Arc<Gateway>, mut source: S, mut sink: K)
where
    S: FrameSource,
    K: EventSink + 'static,
{
    let (handle, mut outbox) = gateway.connect();
    let conn = handle.id();
    info!("{} connected", conn);

    let writer = tokio::spawn(async move {
        while let Some(event) = outbox.recv().await {
            if let Err(e) = sink.send(&event).await {
                warn!("{}: send failed: {}", conn, e);
                break;
            }
        }
    });

    loop {
        match source.recv().await {
            Ok(received) => gateway.dispatch(&handle, received).await,
            Err(e) => {
                info!("{} closed: {}", conn, e);
                break;
            }
        }
    }

    gateway.disconnect(&handle).await;
    drop(handle);
    let _ = writer.await;
}
