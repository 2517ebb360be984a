//! Keyed table of live matches.
//!
//! Each match sits behind its own async mutex so actions within one match are
//! serialized while different matches proceed independently. Lock order is
//! lobby, then match, then table; the gateway never takes the lobby while
//! holding a match.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::{debug, info};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::common::MatchError;
use crate::game::{ClientIdentity, Match, Outbound, PlayerSlot};

/// Key of a match in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MatchId(String);

impl MatchId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub type SharedMatch = Arc<Mutex<Match>>;

/// Result of a successful join.
#[derive(Debug)]
pub struct Joined {
    pub match_id: MatchId,
    pub slot: PlayerSlot,
    pub events: Vec<Outbound>,
}

pub struct MatchRegistry {
    matches: RwLock<HashMap<MatchId, SharedMatch>>,
    /// Auto-paired match still waiting for its second player.
    lobby: Mutex<Option<MatchId>>,
    next_seq: AtomicU64,
    seed: Option<u64>,
}

impl MatchRegistry {
    /// `seed` fixes the coin flips of every match created by this registry.
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            matches: RwLock::new(HashMap::new()),
            lobby: Mutex::new(None),
            next_seq: AtomicU64::new(0),
            seed,
        }
    }

    fn new_match(&self, seq: u64) -> Match {
        let rng = match self.seed {
            Some(s) => SmallRng::seed_from_u64(s.wrapping_add(seq)),
            None => SmallRng::from_rng(&mut rand::rng()),
        };
        Match::new(rng)
    }

    /// Number of live matches.
    pub async fn len(&self) -> usize {
        self.matches.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.matches.read().await.is_empty()
    }

    pub async fn get(&self, id: &MatchId) -> Option<SharedMatch> {
        self.matches.read().await.get(id).cloned()
    }

    /// `true` while the table still maps `id` to this very match.
    async fn is_registered(&self, id: &MatchId, shared: &SharedMatch) -> bool {
        self.matches
            .read()
            .await
            .get(id)
            .is_some_and(|m| Arc::ptr_eq(m, shared))
    }

    /// Lock the match registered under `id`. `None` if there is none, or if
    /// it was removed while waiting for the lock.
    pub async fn lock(&self, id: &MatchId) -> Option<OwnedMutexGuard<Match>> {
        let shared = self.get(id).await?;
        let guard = shared.clone().lock_owned().await;
        if !self.is_registered(id, &shared).await {
            debug!("match {} was removed while waiting for it", id);
            return None;
        }
        Some(guard)
    }

    async fn get_or_create(&self, id: &MatchId) -> SharedMatch {
        let mut matches = self.matches.write().await;
        if let Some(m) = matches.get(id) {
            return m.clone();
        }
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let m = Arc::new(Mutex::new(self.new_match(seq)));
        matches.insert(id.clone(), m.clone());
        info!("created match {}", id);
        m
    }

    /// Open a lobby match under the first free `match-N` id. Named matches
    /// may already hold such ids.
    async fn create(&self) -> (MatchId, SharedMatch) {
        let mut matches = self.matches.write().await;
        let (id, seq) = loop {
            let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
            let id = MatchId::new(format!("match-{}", seq));
            if !matches.contains_key(&id) {
                break (id, seq);
            }
        };
        let m = Arc::new(Mutex::new(self.new_match(seq)));
        matches.insert(id.clone(), m.clone());
        info!("created match {}", id);
        (id, m)
    }

    /// Join the named match, creating it if needed.
    pub async fn join_named(
        &self,
        id: &MatchId,
        identity: &ClientIdentity,
    ) -> Result<Joined, MatchError> {
        let mut m = loop {
            let shared = self.get_or_create(id).await;
            let guard = shared.clone().lock_owned().await;
            // Teardown may have removed the match while we waited.
            if self.is_registered(id, &shared).await {
                break guard;
            }
            debug!("match {} went away during join of {}, retrying", id, identity);
        };
        let events = m.join(identity)?;
        let slot = m.slot_of(identity).ok_or(MatchError::MatchFull)?;
        Ok(Joined {
            match_id: id.clone(),
            slot,
            events,
        })
    }

    /// Pair `identity` with whoever is waiting in the lobby, or open a new
    /// match and wait there.
    pub async fn join_lobby(&self, identity: &ClientIdentity) -> Result<Joined, MatchError> {
        let mut lobby = self.lobby.lock().await;
        if let Some(id) = lobby.clone() {
            if let Some(shared) = self.get(&id).await {
                let mut m = shared.lock().await;
                if let Ok(events) = m.join(identity) {
                    if !m.has_vacancy() {
                        *lobby = None;
                    }
                    let slot = m.slot_of(identity).ok_or(MatchError::MatchFull)?;
                    return Ok(Joined {
                        match_id: id,
                        slot,
                        events,
                    });
                }
            }
        }

        let (id, shared) = self.create().await;
        let mut m = shared.lock().await;
        let events = m.join(identity)?;
        let slot = m.slot_of(identity).ok_or(MatchError::MatchFull)?;
        *lobby = Some(id.clone());
        Ok(Joined {
            match_id: id,
            slot,
            events,
        })
    }

    /// Drop the match if nobody is connected to it any more. Returns the
    /// identities that were bound to it.
    pub async fn remove_if_vacant(&self, id: &MatchId) -> Option<Vec<ClientIdentity>> {
        let mut lobby = self.lobby.lock().await;
        let shared = self.get(id).await?;
        let m = shared.lock().await;
        if !m.is_vacant() {
            return None;
        }
        let identities = PlayerSlot::ALL
            .into_iter()
            .filter_map(|s| m.identity(s).cloned())
            .collect();
        self.matches.write().await.remove(id);
        if lobby.as_ref() == Some(id) {
            *lobby = None;
        }
        info!("removed match {}", id);
        Some(identities)
    }
}
