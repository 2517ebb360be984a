//! Bot clients and a self-contained bot-vs-bot match.

use std::sync::Arc;

use log::debug;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::config::CELL_COUNT;
use crate::game::PlayerSlot;
use crate::gateway::{serve_connection, Gateway};
use crate::player::{AiPlayer, Player};
use crate::protocol::{ClientFrame, ServerEvent};
use crate::transport::in_memory::InMemoryTransport;
use crate::transport::ClientTransport;

/// What one bot saw of its match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BotReport {
    pub identity: String,
    pub slot: Option<PlayerSlot>,
    pub shots: usize,
    pub hits: usize,
    pub winner: Option<PlayerSlot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimReport {
    pub player1: BotReport,
    pub player2: BotReport,
    pub winner: Option<PlayerSlot>,
}

async fn fire<T, P>(
    transport: &mut T,
    identity: &str,
    player: &mut P,
    rng: &mut SmallRng,
    report: &mut BotReport,
) -> anyhow::Result<()>
where
    T: ClientTransport + ?Sized,
    P: Player + ?Sized,
{
    if report.shots > CELL_COUNT * 2 {
        return Err(anyhow::anyhow!("{} exceeded its shot budget", identity));
    }
    let index = player.select_target(rng);
    report.shots += 1;
    transport.send(&ClientFrame::fire(identity, index)).await
}

/// Play one match through `transport` until it finishes.
pub async fn run_bot<T, P>(
    transport: &mut T,
    identity: &str,
    match_id: Option<&str>,
    player: &mut P,
    rng: &mut SmallRng,
) -> anyhow::Result<BotReport>
where
    T: ClientTransport + ?Sized,
    P: Player + ?Sized,
{
    let mut report = BotReport {
        identity: identity.to_string(),
        slot: None,
        shots: 0,
        hits: 0,
        winner: None,
    };
    let join = match match_id {
        Some(id) => ClientFrame::join_match(identity, id),
        None => ClientFrame::join(identity),
    };
    transport.send(&join).await?;

    loop {
        let event = transport.recv().await?;
        debug!("{} <- {:?}", identity, event);
        match event {
            ServerEvent::Joined { slot } => {
                report.slot = Some(slot);
                let fleet = player
                    .place_ships(rng)
                    .map_err(|e| anyhow::anyhow!(e))?;
                transport
                    .send(&ClientFrame::place_ships(identity, &fleet))
                    .await?;
            }
            ServerEvent::JoinRejected { reason } => {
                return Err(anyhow::anyhow!("join rejected: {}", reason));
            }
            ServerEvent::PlacementRejected { reason } => {
                return Err(anyhow::anyhow!("placement rejected: {}", reason));
            }
            ServerEvent::MatchAborted { reason } => {
                return Err(anyhow::anyhow!("match aborted: {}", reason));
            }
            ServerEvent::BattleStart { active_slot } => {
                if report.slot == Some(active_slot) {
                    fire(transport, identity, player, rng, &mut report).await?;
                }
            }
            ServerEvent::Hit {
                index,
                target_slot,
                winner,
            } => {
                let ours = report.slot != Some(target_slot);
                if ours {
                    report.hits += 1;
                    player.handle_shot_result(index as usize, true);
                }
                if winner.is_some() {
                    report.winner = winner;
                    return Ok(report);
                }
                if ours {
                    fire(transport, identity, player, rng, &mut report).await?;
                }
            }
            ServerEvent::Miss { index, next_turn } => {
                if report.slot == Some(next_turn) {
                    fire(transport, identity, player, rng, &mut report).await?;
                } else {
                    player.handle_shot_result(index as usize, false);
                }
            }
            ServerEvent::WaitForOpponent {}
            | ServerEvent::BoardState { .. }
            | ServerEvent::RematchReady {} => {}
        }
    }
}

/// Run two `AiPlayer` bots against an in-process gateway.
pub async fn run_local_match(seed1: u64, seed2: u64) -> anyhow::Result<SimReport> {
    let gateway = Arc::new(Gateway::new(Some(seed1 ^ seed2.rotate_left(32))));

    let (source1, sink1, mut client1) = InMemoryTransport::pair();
    let (source2, sink2, mut client2) = InMemoryTransport::pair();
    let conn1 = tokio::spawn(serve_connection(gateway.clone(), source1, sink1));
    let conn2 = tokio::spawn(serve_connection(gateway.clone(), source2, sink2));

    let bot1 = async move {
        let mut rng = SmallRng::seed_from_u64(seed1);
        let mut player = AiPlayer::new();
        let report = run_bot(&mut client1, "bot-1", Some("local"), &mut player, &mut rng).await;
        drop(client1);
        report
    };
    let bot2 = async move {
        let mut rng = SmallRng::seed_from_u64(seed2);
        let mut player = AiPlayer::new();
        let report = run_bot(&mut client2, "bot-2", Some("local"), &mut player, &mut rng).await;
        drop(client2);
        report
    };

    let (player1, player2) = tokio::try_join!(bot1, bot2)?;
    let _ = tokio::join!(conn1, conn2);

    let winner = player1.winner;
    Ok(SimReport {
        player1,
        player2,
        winner,
    })
}
