//! Client-side implementation of the networked arena: input capture,
//! client-side prediction and server reconciliation, remote-peer snapshot
//! buffering, and rendering.
//!
//! ## Module organization
//!
//! - [`game`] - [`game::ClientGame`], the local predicted copy of the arena.
//!   Applies input immediately (prediction), then rolls back and replays
//!   recorded inputs against authoritative snapshots as they arrive
//!   (reconciliation), using the exact step function the server runs.
//! - [`remote`] - [`remote::RemotePeers`], a bounded-delay snapshot buffer
//!   per remote player. Remote players are never predicted, just displayed
//!   once their snapshot's render clock catches up.
//! - [`input`] - samples the full input bitset from keyboard and mouse state
//!   every tick.
//! - [`network`] - [`network::Client`], the UDP transport and per-frame
//!   scheduling loop tying prediction, remote buffering and rendering
//!   together, including the client side of the drift-adjustment handshake.
//! - [`network_graph`] - a toggleable ping/loss/jitter overlay, independent
//!   of the rest of the netcode.
//! - [`rendering`] - draws the tile arena, players and fading event markers,
//!   plus the connection status overlay.
//!
//! The client runs the identical deterministic simulation step the server
//! does (see `shared::sim::Game::step`), so prediction and replay never
//! drift from authority for reasons other than genuinely divergent input.

pub mod game;
pub mod input;
pub mod network;
pub mod network_graph;
pub mod remote;
pub mod rendering;
