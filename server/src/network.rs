//! UDP transport and the per-tick authority loop.
//!
//! Four concurrent tasks, same shape as the original server: a receiver that
//! decodes batches off the socket, a sender that writes encoded batches back
//! out, a timeout checker, and the main loop that owns the simulation and
//! runs `tokio::select!` over the other three.

use crate::client_manager::{within_valid_window, PeerTable};
use crate::drift::compute_adjustment;
use crate::game::ServerGame;
use log::{debug, error, info, warn};
use shared::collections::PlayerMap;
use shared::packet::{
    Auth, ClientBatch, ClientPacket, Dropped, Greeting, Hitscan, Nade, PeerAuth, PeerGreeting,
    PeerDisconnected, PlayerKill, PlayerSpawn, ServerBatch, ServerPacket, Sound as SoundPacket,
    Step as StepPacket,
};
use shared::{Input, Map, PlayerId};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, RwLock};
use tokio::time::interval;

const CLIENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Messages sent from network tasks to the main loop.
#[derive(Debug)]
pub enum ServerMessage {
    BatchReceived { batch: ClientBatch, addr: SocketAddr },
    PeerTimedOut { id: PlayerId },
}

/// Messages sent from the main loop to the network sender task.
#[derive(Debug)]
pub enum GameMessage {
    Send { addr: SocketAddr, bytes: Vec<u8> },
}

/// Orchestrates the UDP socket, the peer table and the authoritative
/// simulation.
pub struct Server {
    socket: Arc<UdpSocket>,
    peers: Arc<RwLock<PeerTable>>,
    server_game: ServerGame,
    tick_duration: Duration,

    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    game_tx: mpsc::UnboundedSender<GameMessage>,
    game_rx: mpsc::UnboundedReceiver<GameMessage>,
}

impl Server {
    pub async fn new(
        addr: &str,
        tick_duration: Duration,
        max_clients: usize,
        seed: u64,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!("server listening on {addr}");

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (game_tx, game_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket,
            peers: Arc::new(RwLock::new(PeerTable::new(max_clients))),
            server_game: ServerGame::new(Map::default_arena(), seed),
            tick_duration,
            server_tx,
            server_rx,
            game_tx,
            game_rx,
        })
    }

    async fn spawn_network_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; 2048];
            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => match ClientBatch::decode(&buffer[0..len]) {
                        Ok(batch) => {
                            if server_tx.send(ServerMessage::BatchReceived { batch, addr }).is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("dropping malformed batch from {addr}: {e}"),
                    },
                    Err(e) => {
                        error!("error receiving datagram: {e}");
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    async fn spawn_network_sender(&mut self) {
        let socket = Arc::clone(&self.socket);
        let mut game_rx = std::mem::replace(&mut self.game_rx, mpsc::unbounded_channel().1);

        tokio::spawn(async move {
            while let Some(GameMessage::Send { addr, bytes }) = game_rx.recv().await {
                if let Err(e) = socket.send_to(&bytes, addr).await {
                    error!("failed to send batch to {addr}: {e}");
                }
            }
        });
    }

    async fn spawn_timeout_checker(&self) {
        let peers = Arc::clone(&self.peers);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(1));
            loop {
                ticker.tick().await;
                let timed_out = peers.write().await.check_timeouts(CLIENT_TIMEOUT);
                for id in timed_out {
                    if server_tx.send(ServerMessage::PeerTimedOut { id }).is_err() {
                        break;
                    }
                }
            }
        });
    }

    /// Handles one decoded batch: new-connection handshake, or input
    /// queueing against an existing peer.
    async fn handle_batch(&mut self, batch: ClientBatch, addr: SocketAddr) {
        let existing = self.peers.read().await.find_by_addr(addr);

        let id = match existing {
            Some(id) => id,
            None => match self.accept_new_peer(addr).await {
                Some(id) => id,
                None => {
                    warn!("rejected connection from {addr}: server full");
                    return;
                }
            },
        };

        let mut dropped_ticks = Vec::new();
        {
            let mut peers = self.peers.write().await;
            let Some(peer) = peers.get_mut(id) else { return };
            peer.last_acked_iteration = batch.header.adjustment_iteration;

            for packet in &batch.packets {
                let ClientPacket::Update(update) = packet;
                peer.note_client_sim_tick(update.sim_tick);
                if within_valid_window(update.sim_tick, self.server_game.sim_tick) {
                    peer.queue_input(update.sim_tick, update.input);
                } else {
                    dropped_ticks.push(update.sim_tick);
                }
            }
        }

        for sim_tick in dropped_ticks {
            self.queue_packet(addr, ServerPacket::Dropped(Dropped { sim_tick })).await;
        }
    }

    /// Allocates a player, registers the peer, and brings the joiner up to
    /// date with everyone already in the arena.
    async fn accept_new_peer(&mut self, addr: SocketAddr) -> Option<PlayerId> {
        let id = self.server_game.add_player();
        let accepted = self.peers.write().await.add(id, addr);
        if !accepted {
            self.server_game.remove_player(id);
            return None;
        }

        self.queue_packet(
            addr,
            ServerPacket::Greeting(Greeting { initial_net_tick: self.server_game.sim_tick, id }),
        )
        .await;

        let others: Vec<(PlayerId, SocketAddr)> =
            self.peers.read().await.addrs().filter(|(pid, _)| *pid != id).collect();
        for (_, other_addr) in &others {
            self.queue_packet(*other_addr, ServerPacket::PeerGreeting(PeerGreeting { id }))
                .await;
        }

        let existing_ids: Vec<PlayerId> =
            self.server_game.game.players.iter().map(|(pid, _)| pid).filter(|pid| *pid != id).collect();
        for pid in existing_ids {
            self.queue_packet(addr, ServerPacket::PeerGreeting(PeerGreeting { id: pid }))
                .await;
        }

        Some(id)
    }

    async fn queue_packet(&self, addr: SocketAddr, packet: ServerPacket) {
        let batch = ServerBatch::new(0, 0, vec![packet]);
        match batch.encode() {
            Ok(bytes) => {
                let _ = self.game_tx.send(GameMessage::Send { addr, bytes });
            }
            Err(e) => error!("failed to encode ad-hoc packet for {addr}: {e}"),
        }
    }

    fn remove_peer(&mut self, id: PlayerId) {
        self.server_game.remove_player(id);
    }

    /// Runs exactly one simulation tick and ships the resulting batches.
    /// `NET_PER_SIM == 1` in this implementation, so every sim tick is also
    /// a network tick: inputs are collected, the authoritative step runs,
    /// deaths and respawns resolve, and every peer gets a batch.
    async fn run_tick(&mut self, dt: f32) {
        let peer_ids: Vec<PlayerId> = self.peers.read().await.ids().collect();

        let mut inputs = PlayerMap::with_capacity(peer_ids.len().max(1));
        {
            let mut peers = self.peers.write().await;
            for id in &peer_ids {
                if let Some(peer) = peers.get_mut(*id) {
                    if let Some(pending) = peer.pop_due_input(self.server_game.sim_tick) {
                        inputs.insert(*id, pending.input);
                    } else {
                        inputs.insert(*id, Input::default());
                    }
                }
            }
        }

        let respawned = self.server_game.tick(&inputs, dt);

        let mut pending_out: HashMap<PlayerId, Vec<ServerPacket>> =
            peer_ids.iter().map(|id| (*id, Vec::new())).collect();

        let sim_tick = self.server_game.sim_tick;
        for id in &peer_ids {
            let Some(player) = self.server_game.game.players.get(*id) else { continue };
            for &recipient in &peer_ids {
                let packet = if recipient == *id {
                    ServerPacket::Auth(Auth { player: *player, sim_tick })
                } else {
                    ServerPacket::PeerAuth(PeerAuth { player: *player, sim_tick })
                };
                if let Some(out) = pending_out.get_mut(&recipient) {
                    out.push(packet);
                }
            }
        }

        for player in &respawned {
            for recipient in &peer_ids {
                if let Some(out) = pending_out.get_mut(recipient) {
                    out.push(ServerPacket::PlayerSpawn(PlayerSpawn { player: *player }));
                }
            }
        }

        for hitscan in self.server_game.game.new_hitscans.iter().copied() {
            for recipient in peer_ids.iter().filter(|id| **id != hitscan.source) {
                if let Some(out) = pending_out.get_mut(recipient) {
                    out.push(ServerPacket::Hitscan(Hitscan { hitscan }));
                }
            }
        }
        for nade in self.server_game.game.new_nades.iter().copied() {
            for recipient in peer_ids.iter().filter(|id| **id != nade.source) {
                if let Some(out) = pending_out.get_mut(recipient) {
                    out.push(ServerPacket::Nade(Nade { nade }));
                }
            }
        }
        for sound in self.server_game.game.sounds.iter().copied() {
            for recipient in peer_ids.iter().filter(|id| **id != sound.player_id) {
                if let Some(out) = pending_out.get_mut(recipient) {
                    out.push(ServerPacket::Sound(SoundPacket { sound }));
                }
            }
        }
        for step in self.server_game.game.new_steps.iter().copied() {
            for recipient in peer_ids.iter().filter(|id| **id != step.player_id) {
                if let Some(out) = pending_out.get_mut(recipient) {
                    out.push(ServerPacket::Step(StepPacket { step }));
                }
            }
        }

        let damages: Vec<_> = self.server_game.game.damages.iter().copied().collect();
        for damage in damages {
            let dead = self
                .server_game
                .game
                .players
                .get(damage.player_id)
                .map(|p| !p.is_alive())
                .unwrap_or(false);
            if dead && !self.server_game.is_respawn_pending(damage.player_id) {
                self.server_game.schedule_respawn(damage.player_id);
                for recipient in pending_out.values_mut() {
                    recipient.push(ServerPacket::PlayerKill(PlayerKill { player_id: damage.player_id }));
                }
            }
        }

        {
            let mut peers = self.peers.write().await;
            for id in &peer_ids {
                let Some(peer) = peers.get_mut(*id) else { continue };
                let adjustment = peer.last_client_sim_tick.and_then(|client_sim_tick| {
                    compute_adjustment(
                        sim_tick,
                        client_sim_tick,
                        peer.last_sent_iteration,
                        peer.last_acked_iteration,
                    )
                });
                let (adjustment, iteration) = match adjustment {
                    Some(a) => {
                        peer.last_sent_iteration = peer.last_sent_iteration.wrapping_add(1);
                        (a, peer.last_sent_iteration)
                    }
                    None => (0, peer.last_sent_iteration),
                };

                let Some(packets) = pending_out.remove(id) else { continue };
                let batch = ServerBatch::new(adjustment, iteration, packets);
                match batch.encode() {
                    Ok(bytes) => {
                        let _ = self.game_tx.send(GameMessage::Send { addr: peer.addr, bytes });
                    }
                    Err(e) => error!("failed to encode batch for peer {id}: {e}"),
                }
            }
        }
    }

    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.spawn_network_receiver().await;
        self.spawn_network_sender().await;
        self.spawn_timeout_checker().await;

        let mut tick_interval = interval(self.tick_duration);
        let dt = self.tick_duration.as_secs_f32();

        info!("server started");

        loop {
            tokio::select! {
                message = self.server_rx.recv() => {
                    match message {
                        Some(ServerMessage::BatchReceived { batch, addr }) => {
                            self.handle_batch(batch, addr).await;
                        }
                        Some(ServerMessage::PeerTimedOut { id }) => {
                            self.remove_peer(id);
                            let peer_ids: Vec<PlayerId> = self.peers.read().await.ids().collect();
                            for recipient in peer_ids {
                                let packet = ServerPacket::PeerDisconnected(PeerDisconnected { player_id: id });
                                let addr = self.peers.read().await.get(recipient).map(|p| p.addr);
                                if let Some(addr) = addr {
                                    self.queue_packet(addr, packet).await;
                                }
                            }
                        }
                        None => {
                            info!("server shutting down");
                            break;
                        }
                    }
                },

                _ = tick_interval.tick() => {
                    self.run_tick(dt).await;
                    if self.server_game.sim_tick % 60 == 0 {
                        let peer_count = self.peers.read().await.len();
                        debug!("sim_tick {}: {} peers", self.server_game.sim_tick, peer_count);
                    }
                },
            }
        }

        Ok(())
    }
}
