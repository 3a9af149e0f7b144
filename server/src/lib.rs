//! # Game Server Library
//!
//! Authoritative server for the tile-arena shooter: owns the canonical
//! `shared::Game`, applies validated client inputs in tick order, and
//! broadcasts batched updates back to every connected peer.
//!
//! ## Module Organization
//!
//! - [`client_manager`] — per-peer connection state and input log
//!   (`PeerTable`, `Peer`, the tick acceptance window).
//! - [`drift`] — the adjustment handshake that keeps a client's `net_tick`
//!   inside the server's acceptance window.
//! - [`respawn`] — death-to-respawn timers and seeded spawn tile/hue
//!   selection.
//! - [`game`] — [`game::ServerGame`], the authoritative wrapper around
//!   `shared::Game` plus id allocation and respawn bookkeeping.
//! - [`network`] — UDP transport, the `tokio::select!` main loop, and the
//!   per-tick authority algorithm that ties the above together.
//!
//! ## Architecture
//!
//! Single-threaded simulation: `ServerGame` is owned outright by the main
//! loop and never crosses a lock. `tokio` tasks only move bytes between the
//! socket and channels; the `PeerTable` is the one piece of state shared
//! with the timeout-checking task, behind an `RwLock`.

pub mod client_manager;
pub mod drift;
pub mod game;
pub mod network;
pub mod respawn;
