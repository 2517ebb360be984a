use std::sync::Arc;

use broadside::registry::MatchRegistry;
use broadside::{
    ClientHandle, ClientIdentity, ConnectionId, MatchError, MatchId, PlayerSlot, Seat,
    ServerEvent, SessionDirectory,
};
use tokio::sync::mpsc;

fn handle(n: u64) -> (ClientHandle, mpsc::UnboundedReceiver<ServerEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ClientHandle::new(ConnectionId(n), tx), rx)
}

fn seat(id: &str, slot: PlayerSlot) -> Seat {
    Seat {
        match_id: MatchId::new(id),
        slot,
    }
}

#[tokio::test]
async fn test_bind_and_lookup() {
    let dir = SessionDirectory::new();
    let alice = ClientIdentity::from("alice");
    let (h, mut rx) = handle(1);

    assert!(dir.bind(&alice, h).await.is_none());
    assert!(dir.is_current(&alice, ConnectionId(1)).await);
    assert!(!dir.is_current(&alice, ConnectionId(2)).await);
    assert_eq!(dir.connected().await, 1);

    let bound = dir.handle_of(&alice).await.unwrap();
    assert_eq!(bound.id(), ConnectionId(1));
    assert!(bound.send(ServerEvent::RematchReady {}));
    assert_eq!(rx.try_recv().unwrap(), ServerEvent::RematchReady {});
}

#[tokio::test]
async fn test_rebind_supersedes_old_connection() {
    let dir = SessionDirectory::new();
    let alice = ClientIdentity::from("alice");
    let (first, _rx1) = handle(1);
    let (second, _rx2) = handle(2);

    dir.bind(&alice, first).await;
    let old = dir.bind(&alice, second).await.unwrap();
    assert_eq!(old.id(), ConnectionId(1));
    assert!(dir.is_current(&alice, ConnectionId(2)).await);

    // Same connection binding again is not a supersede.
    let (again, _rx3) = handle(2);
    assert!(dir.bind(&alice, again).await.is_none());
    assert_eq!(dir.len().await, 1);
}

#[tokio::test]
async fn test_unbind_only_current_connection() {
    let dir = SessionDirectory::new();
    let alice = ClientIdentity::from("alice");
    let (first, _rx1) = handle(1);
    let (second, _rx2) = handle(2);
    dir.bind(&alice, first).await;
    dir.bind(&alice, second).await;

    assert!(!dir.unbind(&alice, ConnectionId(1)).await);
    assert!(dir.is_current(&alice, ConnectionId(2)).await);
    assert!(dir.unbind(&alice, ConnectionId(2)).await);
    assert!(dir.handle_of(&alice).await.is_none());
    assert!(dir.is_empty().await);
    assert!(!dir.unbind(&ClientIdentity::from("nobody"), ConnectionId(2)).await);
}

#[tokio::test]
async fn test_unbind_connection_releases_all_its_identities() {
    let dir = SessionDirectory::new();
    let (h1, _rx1) = handle(1);
    let (h2, _rx2) = handle(2);
    dir.bind(&ClientIdentity::from("b"), h1.clone()).await;
    dir.bind(&ClientIdentity::from("a"), h1).await;
    dir.bind(&ClientIdentity::from("c"), h2).await;

    let released = dir.unbind_connection(ConnectionId(1)).await;
    assert_eq!(
        released,
        vec![ClientIdentity::from("a"), ClientIdentity::from("b")]
    );
    assert_eq!(dir.connected().await, 1);
    assert!(dir.unbind_connection(ConnectionId(1)).await.is_empty());
}

#[tokio::test]
async fn test_seat_survives_disconnect() {
    let dir = SessionDirectory::new();
    let alice = ClientIdentity::from("alice");
    let (h, _rx) = handle(1);
    dir.bind(&alice, h).await;
    dir.assign(&alice, seat("m", PlayerSlot::P2)).await;

    dir.unbind(&alice, ConnectionId(1)).await;
    assert_eq!(dir.seat_of(&alice).await, Some(seat("m", PlayerSlot::P2)));
    assert_eq!(dir.len().await, 1);
    assert_eq!(dir.connected().await, 0);

    dir.release(&alice).await;
    assert_eq!(dir.seat_of(&alice).await, None);
    assert!(dir.is_empty().await);
}

#[tokio::test]
async fn test_closed_handle_reports_failure() {
    let (h, rx) = handle(1);
    drop(rx);
    assert!(!h.send(ServerEvent::RematchReady {}));
}

#[tokio::test]
async fn test_registry_lobby_pairs_in_arrival_order() {
    let registry = MatchRegistry::new(Some(1));
    let a = registry.join_lobby(&ClientIdentity::from("a")).await.unwrap();
    let b = registry.join_lobby(&ClientIdentity::from("b")).await.unwrap();
    let c = registry.join_lobby(&ClientIdentity::from("c")).await.unwrap();

    assert_eq!(a.match_id, b.match_id);
    assert_eq!((a.slot, b.slot), (PlayerSlot::P1, PlayerSlot::P2));
    assert_ne!(c.match_id, a.match_id);
    assert_eq!(c.slot, PlayerSlot::P1);
    assert_eq!(registry.len().await, 2);
}

#[tokio::test]
async fn test_registry_named_match_full() {
    let registry = MatchRegistry::new(None);
    let id = MatchId::new("room");
    registry.join_named(&id, &ClientIdentity::from("a")).await.unwrap();
    registry.join_named(&id, &ClientIdentity::from("b")).await.unwrap();
    let err = registry
        .join_named(&id, &ClientIdentity::from("c"))
        .await
        .unwrap_err();
    assert_eq!(err, MatchError::MatchFull);

    // Rejoining keeps the slot.
    let again = registry.join_named(&id, &ClientIdentity::from("b")).await.unwrap();
    assert_eq!(again.slot, PlayerSlot::P2);
    assert_eq!(registry.len().await, 1);
}

#[tokio::test]
async fn test_registry_removes_only_vacant_matches() {
    let registry = MatchRegistry::new(None);
    let id = MatchId::new("room");
    let (a, b) = (ClientIdentity::from("a"), ClientIdentity::from("b"));
    registry.join_named(&id, &a).await.unwrap();
    registry.join_named(&id, &b).await.unwrap();

    assert!(registry.remove_if_vacant(&id).await.is_none());

    let shared = registry.get(&id).await.unwrap();
    {
        let mut m = shared.lock().await;
        m.disconnect(&a);
        m.disconnect(&b);
    }
    let released = registry.remove_if_vacant(&id).await.unwrap();
    assert_eq!(released, vec![a, b]);
    assert!(registry.is_empty().await);
    assert!(registry.get(&id).await.is_none());
}

#[tokio::test]
async fn test_registry_lobby_skips_removed_match() {
    let registry = MatchRegistry::new(None);
    let a = ClientIdentity::from("a");
    let first = registry.join_lobby(&a).await.unwrap();
    registry
        .get(&first.match_id)
        .await
        .unwrap()
        .lock()
        .await
        .disconnect(&a);
    registry.remove_if_vacant(&first.match_id).await.unwrap();

    let next = registry.join_lobby(&ClientIdentity::from("b")).await.unwrap();
    assert_ne!(next.match_id, first.match_id);
    assert_eq!(next.slot, PlayerSlot::P1);
}

#[tokio::test]
async fn test_registry_lobby_avoids_client_named_ids() {
    let registry = MatchRegistry::new(None);
    // The first named match consumes sequence 0, so the lobby would next
    // generate "match-1".
    let taken = MatchId::new("match-1");
    let (a, b) = (ClientIdentity::from("a"), ClientIdentity::from("b"));
    registry.join_named(&taken, &a).await.unwrap();
    registry.join_named(&taken, &b).await.unwrap();

    let c = registry.join_lobby(&ClientIdentity::from("c")).await.unwrap();
    assert_ne!(c.match_id, taken);
    assert_eq!(c.slot, PlayerSlot::P1);
    assert_eq!(registry.len().await, 2);

    let m = registry.lock(&taken).await.unwrap();
    assert_eq!(m.slot_of(&a), Some(PlayerSlot::P1));
    assert_eq!(m.slot_of(&b), Some(PlayerSlot::P2));
    drop(m);

    let d = registry.join_lobby(&ClientIdentity::from("d")).await.unwrap();
    assert_eq!(d.match_id, c.match_id);
    assert_eq!(d.slot, PlayerSlot::P2);
}

#[tokio::test]
async fn test_registry_lock_misses_removed_match() {
    let registry = MatchRegistry::new(None);
    let id = MatchId::new("room");
    let a = ClientIdentity::from("a");
    registry.join_named(&id, &a).await.unwrap();

    let stale = registry.get(&id).await.unwrap();
    registry.lock(&id).await.unwrap().disconnect(&a);
    registry.remove_if_vacant(&id).await.unwrap();

    assert!(registry.lock(&id).await.is_none());
    // A handle taken before removal still points at the dropped match.
    assert!(stale.lock().await.slot_of(&a).is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_registry_join_survives_concurrent_teardown() {
    let registry = Arc::new(MatchRegistry::new(Some(3)));
    let id = MatchId::new("contested");

    for round in 0..200 {
        let a = ClientIdentity::from(format!("a{}", round).as_str());
        let b = ClientIdentity::from(format!("b{}", round).as_str());
        registry.join_named(&id, &a).await.unwrap();

        let teardown = {
            let (registry, id, a) = (registry.clone(), id.clone(), a.clone());
            tokio::spawn(async move {
                let vacant = match registry.lock(&id).await {
                    Some(mut m) => m.disconnect(&a),
                    None => false,
                };
                if vacant {
                    registry.remove_if_vacant(&id).await;
                }
            })
        };
        let join = {
            let (registry, id, b) = (registry.clone(), id.clone(), b.clone());
            tokio::spawn(async move { registry.join_named(&id, &b).await })
        };
        teardown.await.unwrap();
        let joined = join.await.unwrap().unwrap();

        // Whichever side won, b sits in the match the table hands out.
        let mut m = registry
            .lock(&id)
            .await
            .unwrap_or_else(|| panic!("round {}: b joined a removed match", round));
        assert_eq!(m.slot_of(&b), Some(joined.slot), "round {}", round);

        m.disconnect(&a);
        m.disconnect(&b);
        drop(m);
        registry.remove_if_vacant(&id).await.unwrap();
        assert!(registry.is_empty().await);
    }
}
