//! Performance sanity checks for the hot paths of the simulation: collision
//! primitives, a full tick across many players, wire-format encoding, and
//! sorting a backlog of pending inputs. These are budget assertions, not
//! micro-benchmarks - they exist to catch an accidental O(n^2) or an
//! allocation-per-tick regression, not to track nanosecond-level timing.

use shared::collections::PlayerMap;
use shared::collision::{circle_vs_circle, Circle};
use shared::packet::{PeerAuth, ServerBatch, ServerPacket};
use shared::{Game, Input, Map, PlayerId, Vec2, FPS, PLAYER_RADIUS};
use std::time::Instant;

fn pid(n: u64) -> PlayerId {
    PlayerId::new(n).unwrap()
}

#[test]
fn benchmark_circle_collision_check() {
    let a = Circle { pos: Vec2::new(5.0, 5.0), radius: PLAYER_RADIUS };
    let b = Circle { pos: Vec2::new(5.4, 5.0), radius: PLAYER_RADIUS };

    let iterations = 200_000;
    let start = Instant::now();
    for _ in 0..iterations {
        let _ = circle_vs_circle(a, b);
    }
    let duration = start.elapsed();

    println!(
        "circle_vs_circle: {iterations} iterations in {duration:?} ({:.2} ns/iter)",
        duration.as_nanos() as f64 / iterations as f64
    );
    assert!(duration.as_millis() < 200);
}

/// A full tick with a near-full arena of players, all moving and half of
/// them sniping, run for a full second's worth of ticks.
#[test]
fn benchmark_full_tick_with_many_players() {
    let mut game = Game::new(Map::default_arena());
    let player_count = 64;
    for i in 0..player_count {
        let x = 2.0 + (i % 20) as f32;
        let y = 2.0 + (i / 20) as f32;
        game.spawn_player(pid(i as u64 + 1), Vec2::new(x, y), i as f32 / player_count as f32);
    }

    let mut inputs = PlayerMap::with_capacity(player_count);
    for i in 0..player_count {
        let input = Input {
            look: Vec2::new(1.0, 0.0),
            move_right: true,
            shoot_pressed: i % 2 == 0,
            ..Default::default()
        };
        inputs.insert(pid(i as u64 + 1), input);
    }

    let dt = 1.0 / FPS as f32;
    let ticks = FPS as usize;
    let start = Instant::now();
    for _ in 0..ticks {
        game.step(&inputs, dt);
    }
    let duration = start.elapsed();

    println!(
        "full tick: {player_count} players x {ticks} ticks in {duration:?} ({:.2} us/tick)",
        duration.as_micros() as f64 / ticks as f64
    );
    assert!(duration.as_millis() < 2000);
}

/// A broadcast-sized batch (every peer's `PeerAuth`) encoded and decoded
/// repeatedly, representing the per-tick cost of shipping state to one
/// connected client in a full arena.
#[test]
fn benchmark_broadcast_batch_serialization() {
    let mut players = Vec::new();
    for i in 0..64u64 {
        players.push(shared::Player::new(pid(i + 1), Vec2::new(i as f32, 0.0), 0.0));
    }
    let packets: Vec<ServerPacket> = players
        .into_iter()
        .map(|player| ServerPacket::PeerAuth(PeerAuth { player, sim_tick: 12345 }))
        .collect();
    let batch = ServerBatch::new(0, 0, packets);

    let iterations = 10_000;
    let start = Instant::now();
    for _ in 0..iterations {
        let bytes = batch.encode().unwrap();
        let _decoded = ServerBatch::decode(&bytes).unwrap();
    }
    let duration = start.elapsed();

    println!(
        "batch serialization: {iterations} iterations in {duration:?} ({:.2} us/iter)",
        duration.as_micros() as f64 / iterations as f64
    );
    assert!(duration.as_millis() < 2000);
}

/// Sorting a burst of backlogged inputs by tick, as the server's per-peer
/// input log effectively does when a client catches up after a stall.
#[test]
fn stress_test_sorting_a_backlog_of_pending_ticks() {
    let mut ticks: Vec<u64> = (0..2000).map(|i| (i * 2654435761u64) % 5000).collect();

    let start = Instant::now();
    ticks.sort_unstable();
    let duration = start.elapsed();

    for window in ticks.windows(2) {
        assert!(window[0] <= window[1]);
    }

    println!("sorted {} pending ticks in {duration:?}", ticks.len());
    assert!(duration.as_millis() < 100);
}
