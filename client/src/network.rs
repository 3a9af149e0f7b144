//! Client-side network transport and the per-frame scheduling loop.
//!
//! Same transport shape as the original client: a non-blocking `std`
//! `UdpSocket` polled from inside the macroquad frame loop (no async runtime
//! on the socket itself), with artificial-latency queues for both directions
//! so `--fake-ping` can exercise the drift controller without a real network.
//!
//! Tick pacing is accumulator-driven rather than sleep-based: macroquad's
//! frame loop is vsync-paced, so the server's drift `adjustment` nudges
//! `tick_accumulator` directly instead of the reference implementation's
//! literal "sleep once more" / "skip N sleeps" behavior.

use crate::game::ClientGame;
use crate::input::InputManager;
use crate::network_graph::NetworkGraph;
use crate::remote::{active_tick, RemotePeers};
use crate::rendering::{RenderConfig, Renderer, VisualEffects};
use log::{debug, error, info, warn};
use macroquad::prelude::*;
use shared::packet::{
    Auth, ClientBatch, ClientPacket, ClientUpdate, Greeting, ServerBatch, ServerPacket,
};
use shared::projectile::Sound;
use shared::{Input, Map, FPS};
use std::collections::VecDeque;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::{Duration, Instant};

const DT: f32 = 1.0 / FPS as f32;

/// Orchestrates the UDP socket, prediction/reconciliation, remote-peer
/// buffering and rendering for one connection to the server.
pub struct Client {
    socket: UdpSocket,
    server_addr: SocketAddr,
    connected: bool,
    local_player_id: Option<shared::PlayerId>,

    map: Map,
    client_game: Option<ClientGame>,
    remote_peers: RemotePeers,
    effects: VisualEffects,

    input_manager: InputManager,
    renderer: Renderer,
    network_graph: NetworkGraph,

    /// The adjustment iteration we last absorbed; echoed on every outgoing
    /// batch until the server stamps a new one.
    ack_iteration: u8,
    tick_accumulator: f32,

    real_ping_ms: u64,
    fake_ping_ms: u64,
    last_packet_received: Instant,
    connection_timeout: Duration,

    outgoing_packets: VecDeque<(Vec<u8>, Instant)>,
    incoming_packets: VecDeque<(ServerBatch, Instant, Instant)>,

    /// `(sim_tick, sent_at)` for ticks we've transmitted, oldest first - an
    /// `Auth` packet echoing one of these ticks gives a direct RTT sample.
    sent_ticks: VecDeque<(u64, Instant)>,
}

impl Client {
    pub async fn new(
        server_addr: &str,
        fake_ping_ms: u64,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.set_nonblocking(true)?;
        let server_addr = Self::resolve_address(server_addr)?;
        let renderer = Renderer::new()?;

        Ok(Client {
            socket,
            server_addr,
            connected: false,
            local_player_id: None,
            map: Map::default_arena(),
            client_game: None,
            remote_peers: RemotePeers::new(),
            effects: VisualEffects::new(),
            input_manager: InputManager::new(),
            renderer,
            network_graph: NetworkGraph::new(),
            ack_iteration: 0,
            tick_accumulator: 0.0,
            real_ping_ms: 0,
            fake_ping_ms,
            last_packet_received: Instant::now(),
            connection_timeout: Duration::from_secs(5),
            outgoing_packets: VecDeque::new(),
            incoming_packets: VecDeque::new(),
            sent_ticks: VecDeque::new(),
        })
    }

    /// Resolves a server address string, accepting either a literal
    /// `ip:port` or a `host:port` pair DNS can look up.
    fn resolve_address(addr_str: &str) -> Result<SocketAddr, Box<dyn std::error::Error>> {
        if let Ok(addr) = addr_str.parse::<SocketAddr>() {
            return Ok(addr);
        }
        addr_str
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| format!("failed to resolve address: {addr_str}").into())
    }

    /// Sends the registration batch that causes the server to allocate us a
    /// player; the wire protocol has no separate handshake packet type, the
    /// server's `accept_new_peer` fires on the first batch it sees from an
    /// unknown address.
    fn connect(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        info!("connecting to {}", self.server_addr);
        let batch = ClientBatch::new(
            0,
            0,
            vec![ClientPacket::Update(ClientUpdate { sim_tick: 0, input: Input::default() })],
        );
        let data = batch.encode()?;
        self.socket.send_to(&data, self.server_addr)?;
        self.network_graph.record_packet_sent();
        Ok(())
    }

    pub fn reconnect(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        info!("attempting to reconnect");
        self.connected = false;
        self.local_player_id = None;
        self.client_game = None;
        self.remote_peers = RemotePeers::new();
        self.effects = VisualEffects::new();
        self.ack_iteration = 0;
        self.tick_accumulator = 0.0;
        self.last_packet_received = Instant::now();
        self.outgoing_packets.clear();
        self.incoming_packets.clear();
        self.sent_ticks.clear();
        self.connect()
    }

    fn check_connection_health(&mut self) {
        if self.connected && self.last_packet_received.elapsed() > self.connection_timeout {
            warn!("connection timeout detected, marking as disconnected");
            self.connected = false;
            self.local_player_id = None;
            self.client_game = None;
        }
    }

    fn process_outgoing_packets(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let now = Instant::now();
        loop {
            let due = match self.outgoing_packets.front() {
                Some((_, send_time)) => *send_time <= now,
                None => false,
            };
            if !due {
                break;
            }
            let (data, _) = self.outgoing_packets.pop_front().unwrap();
            self.socket.send_to(&data, self.server_addr)?;
        }
        Ok(())
    }

    fn process_incoming_packets(&mut self) {
        let now = Instant::now();
        loop {
            let due = match self.incoming_packets.front() {
                Some((_, process_time, _)) => *process_time <= now,
                None => false,
            };
            if !due {
                break;
            }
            let (batch, _, receive_time) = self.incoming_packets.pop_front().unwrap();
            self.handle_batch(batch, receive_time);
        }
    }

    /// Measures round-trip time from the `Auth` packet that echoes
    /// `sim_tick`, dropping any older unacknowledged entries along the way.
    fn record_rtt_sample(&mut self, sim_tick: u64, now: Instant) {
        let mut measured = None;
        loop {
            let front_tick = match self.sent_ticks.front() {
                Some((tick, _)) => *tick,
                None => break,
            };
            if front_tick > sim_tick {
                break;
            }
            let (tick, sent_at) = self.sent_ticks.pop_front().unwrap();
            if tick == sim_tick {
                measured = Some(sent_at);
            }
        }
        if let Some(sent_at) = measured {
            let rtt_ms = now.duration_since(sent_at).as_secs_f32() * 1000.0;
            self.real_ping_ms = rtt_ms.round() as u64;
            self.network_graph.record_packet_received(rtt_ms);
        }
    }

    /// Nudges the fixed-timestep accumulator instead of sleeping: a positive
    /// adjustment schedules extra ticks this frame, a negative one withholds
    /// one by pulling time back out of the accumulator.
    fn absorb_adjustment(&mut self, adjustment: i8) {
        if adjustment > 0 {
            self.tick_accumulator += adjustment as f32 * DT;
            debug!("drift correction: catching up {adjustment} tick(s)");
        } else if adjustment < 0 {
            self.tick_accumulator = (self.tick_accumulator - (-adjustment) as f32 * DT).max(0.0);
            debug!("drift correction: withholding {} tick(s)", -adjustment);
        }
    }

    fn handle_greeting(&mut self, greeting: Greeting) {
        info!("connected as player {}", greeting.id);
        self.local_player_id = Some(greeting.id);
        self.client_game =
            Some(ClientGame::new(self.map.clone(), greeting.id, greeting.initial_net_tick));
        self.remote_peers = RemotePeers::new();
        self.tick_accumulator = 0.0;
    }

    fn handle_auth(&mut self, auth: Auth, receive_time: Instant) {
        self.record_rtt_sample(auth.sim_tick, receive_time);
        if let Some(cg) = self.client_game.as_mut() {
            cg.reconcile(auth.player, auth.sim_tick, DT);
        }
    }

    fn handle_batch(&mut self, batch: ServerBatch, receive_time: Instant) {
        self.last_packet_received = receive_time;
        self.connected = true;

        if batch.header.adjustment != 0 && batch.header.adjustment_iteration != self.ack_iteration
        {
            self.absorb_adjustment(batch.header.adjustment);
            self.ack_iteration = batch.header.adjustment_iteration;
        }

        for packet in batch.packets {
            match packet {
                ServerPacket::Greeting(g) => self.handle_greeting(g),
                ServerPacket::PeerGreeting(p) => info!("peer {} joined", p.id),
                ServerPacket::Dropped(d) => {
                    debug!("server dropped our update for tick {}", d.sim_tick)
                }
                ServerPacket::Auth(a) => self.handle_auth(a, receive_time),
                ServerPacket::PeerAuth(p) => {
                    self.remote_peers.push(p.player.id, p.sim_tick, p.player);
                }
                ServerPacket::PeerDisconnected(p) => {
                    self.remote_peers.remove(p.player_id);
                    if let Some(cg) = self.client_game.as_mut() {
                        cg.remove_player(p.player_id);
                    }
                }
                ServerPacket::PlayerKill(k) => info!("player {} died", k.player_id),
                ServerPacket::PlayerSpawn(s) => {
                    if let Some(cg) = self.client_game.as_mut() {
                        cg.set_player(s.player);
                    }
                }
                ServerPacket::Hitscan(h) => {
                    self.effects.add_hitscan(h.hitscan.pos, h.hitscan.impact)
                }
                ServerPacket::Nade(n) => self.effects.add_nade_launch(n.nade.start_pos),
                ServerPacket::Sound(s) => {
                    if s.sound.sound == Sound::NadeExplosion {
                        self.effects.add_explosion(s.sound.pos);
                    }
                }
                ServerPacket::Step(st) => self.effects.add_step(st.step.pos),
            }
        }
    }

    fn send_update(&mut self, sim_tick: u64, input: Input) -> Result<(), Box<dyn std::error::Error>> {
        let packet = ClientPacket::Update(ClientUpdate { sim_tick, input });
        let batch = ClientBatch::new(sim_tick, self.ack_iteration, vec![packet]);
        let data = batch.encode()?;

        self.sent_ticks.push_back((sim_tick, Instant::now()));
        while self.sent_ticks.len() > 256 {
            self.sent_ticks.pop_front();
        }

        if self.fake_ping_ms > 0 {
            let delay_ms = self.fake_ping_ms / 2;
            let send_time = Instant::now() + Duration::from_millis(delay_ms);
            self.outgoing_packets.push_back((data, send_time));
        } else {
            self.socket.send_to(&data, self.server_addr)?;
        }
        self.network_graph.record_packet_sent();
        Ok(())
    }

    /// Predicts one tick locally, releases any remote-peer snapshots now due,
    /// and ships the input that drove the prediction.
    fn run_one_tick(&mut self, input: Input) -> Result<(), Box<dyn std::error::Error>> {
        if !self.connected || self.client_game.is_none() {
            return Ok(());
        }

        let sim_tick = self.client_game.as_ref().unwrap().sim_tick;
        self.client_game.as_mut().unwrap().predict(input, DT);
        let active = active_tick(self.client_game.as_ref().unwrap().sim_tick);

        let due = self.remote_peers.drain_due(active);
        let client_game = self.client_game.as_mut().unwrap();
        for (_, player) in due {
            client_game.set_player(player);
        }

        self.send_update(sim_tick, input)
    }

    fn render_frame(&mut self) {
        let players: Vec<_> = self
            .client_game
            .as_ref()
            .map(|cg| cg.game.players.iter().map(|(_, p)| *p).collect())
            .unwrap_or_default();

        let config = RenderConfig {
            local_player_id: self.local_player_id,
            connected: self.connected,
            ping_ms: self.real_ping_ms,
            fake_ping_ms: self.fake_ping_ms,
        };

        self.renderer.render(&self.map, &players, &self.effects, config);
        self.network_graph.render();
    }

    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if let Err(e) = self.connect() {
            error!("failed to connect: {e}");
        }

        let mut last_tick = Instant::now();
        let mut buffer = [0u8; 2048];

        loop {
            if let Err(e) = self.process_outgoing_packets() {
                error!("error flushing outgoing packets: {e}");
            }

            match self.socket.recv_from(&mut buffer) {
                Ok((len, _)) => {
                    let receive_time = Instant::now();
                    match ServerBatch::decode(&buffer[..len]) {
                        Ok(batch) => {
                            if self.fake_ping_ms > 0 {
                                let delay_ms = self.fake_ping_ms / 2;
                                let process_time = receive_time + Duration::from_millis(delay_ms);
                                self.incoming_packets.push_back((batch, process_time, receive_time));
                            } else {
                                self.handle_batch(batch, receive_time);
                            }
                        }
                        Err(e) => warn!("dropping malformed batch: {e}"),
                    }
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {}
                Err(e) => error!("error receiving packet: {e}"),
            }

            self.process_incoming_packets();
            self.check_connection_health();

            if is_key_pressed(KeyCode::G) {
                self.network_graph.toggle_visibility();
            }
            if is_key_pressed(KeyCode::R) {
                if let Err(e) = self.reconnect() {
                    error!("failed to reconnect: {e}");
                }
            }

            let elapsed = last_tick.elapsed();
            last_tick = Instant::now();
            self.tick_accumulator += elapsed.as_secs_f32();

            let current_input = self.input_manager.sample();

            while self.tick_accumulator >= DT {
                self.tick_accumulator -= DT;
                if let Err(e) = self.run_one_tick(current_input) {
                    error!("error running tick: {e}");
                }
            }

            self.effects.tick(get_frame_time());
            self.render_frame();

            next_frame().await;

            if is_quit_requested() || current_input.quit {
                break;
            }
        }

        Ok(())
    }
}
