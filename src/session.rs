//! Directory of client identities, their live transport handles and the
//! match seat each identity holds.

use std::collections::HashMap;
use std::fmt;

use log::debug;
use tokio::sync::{mpsc, RwLock};

use crate::game::{ClientIdentity, PlayerSlot};
use crate::protocol::ServerEvent;
use crate::registry::MatchId;

/// Identifier of one transport connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Sending half of a live connection.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    id: ConnectionId,
    outbox: mpsc::UnboundedSender<ServerEvent>,
}

impl ClientHandle {
    pub fn new(id: ConnectionId, outbox: mpsc::UnboundedSender<ServerEvent>) -> Self {
        Self { id, outbox }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queue `event` for delivery. Returns `false` if the connection is gone.
    pub fn send(&self, event: ServerEvent) -> bool {
        self.outbox.send(event).is_ok()
    }
}

/// Where an identity plays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seat {
    pub match_id: MatchId,
    pub slot: PlayerSlot,
}

#[derive(Debug, Default)]
struct Entry {
    handle: Option<ClientHandle>,
    seat: Option<Seat>,
}

impl Entry {
    fn is_empty(&self) -> bool {
        self.handle.is_none() && self.seat.is_none()
    }
}

#[derive(Default)]
pub struct SessionDirectory {
    entries: RwLock<HashMap<ClientIdentity, Entry>>,
}

impl SessionDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `identity` to `handle`. A handle bound earlier on another
    /// connection is superseded and returned.
    pub async fn bind(&self, identity: &ClientIdentity, handle: ClientHandle) -> Option<ClientHandle> {
        let conn = handle.id;
        let mut entries = self.entries.write().await;
        let entry = entries.entry(identity.clone()).or_default();
        match entry.handle.replace(handle) {
            Some(old) if old.id != conn => {
                debug!("{} moved from {} to a new connection", identity, old.id);
                Some(old)
            }
            _ => None,
        }
    }

    /// Remove the binding of `identity` if `conn` is still its current
    /// connection. Returns `true` when a binding was removed.
    pub async fn unbind(&self, identity: &ClientIdentity, conn: ConnectionId) -> bool {
        let mut entries = self.entries.write().await;
        let Some(entry) = entries.get_mut(identity) else {
            return false;
        };
        if entry.handle.as_ref().map(|h| h.id) != Some(conn) {
            return false;
        }
        entry.handle = None;
        if entry.is_empty() {
            entries.remove(identity);
        }
        true
    }

    /// Unbind every identity whose current connection is `conn`.
    pub async fn unbind_connection(&self, conn: ConnectionId) -> Vec<ClientIdentity> {
        let mut entries = self.entries.write().await;
        let mut released = Vec::new();
        for (identity, entry) in entries.iter_mut() {
            if entry.handle.as_ref().map(|h| h.id) == Some(conn) {
                entry.handle = None;
                released.push(identity.clone());
            }
        }
        entries.retain(|_, e| !e.is_empty());
        released.sort();
        released
    }

    /// `true` if `conn` is the current connection of `identity`.
    pub async fn is_current(&self, identity: &ClientIdentity, conn: ConnectionId) -> bool {
        self.entries
            .read()
            .await
            .get(identity)
            .and_then(|e| e.handle.as_ref())
            .is_some_and(|h| h.id == conn)
    }

    pub async fn handle_of(&self, identity: &ClientIdentity) -> Option<ClientHandle> {
        self.entries
            .read()
            .await
            .get(identity)
            .and_then(|e| e.handle.clone())
    }

    /// Record the match seat of `identity`.
    pub async fn assign(&self, identity: &ClientIdentity, seat: Seat) {
        let mut entries = self.entries.write().await;
        entries.entry(identity.clone()).or_default().seat = Some(seat);
    }

    pub async fn seat_of(&self, identity: &ClientIdentity) -> Option<Seat> {
        self.entries
            .read()
            .await
            .get(identity)
            .and_then(|e| e.seat.clone())
    }

    /// Forget the seat of `identity`, dropping the entry if nothing is left.
    pub async fn release(&self, identity: &ClientIdentity) {
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get_mut(identity) {
            entry.seat = None;
            if entry.is_empty() {
                entries.remove(identity);
            }
        }
    }

    /// Number of identities with a live connection.
    pub async fn connected(&self) -> usize {
        self.entries
            .read()
            .await
            .values()
            .filter(|e| e.handle.is_some())
            .count()
    }

    /// Number of identities known to the directory.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
