//! End-to-end tests that exercise the real UDP transport between a live
//! `server::network::Server` and a bare client-side socket speaking the wire
//! protocol directly (`shared::packet`), plus `client::network::Client`'s own
//! address resolution against real DNS/parsing. Unit tests elsewhere already
//! cover packet roundtrips and simulation-step semantics in isolation; these
//! tests validate that the pieces still agree once real sockets and real
//! timing are involved.

use shared::packet::{ClientBatch, ClientPacket, ClientUpdate, ServerBatch, ServerPacket};
use shared::{Input, Vec2};
use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

fn send_update(socket: &UdpSocket, addr: SocketAddr, net_tick: u64, input: Input) {
    let batch = ClientBatch::new(
        net_tick,
        0,
        vec![ClientPacket::Update(ClientUpdate { sim_tick: net_tick, input })],
    );
    let bytes = batch.encode().unwrap();
    socket.send_to(&bytes, addr).unwrap();
}

/// Reads one batch with a short timeout, returning `None` on timeout rather
/// than panicking - real UDP delivery has jitter even on localhost.
fn recv_batch(socket: &UdpSocket, timeout: Duration) -> Option<ServerBatch> {
    socket.set_read_timeout(Some(timeout)).unwrap();
    let mut buf = [0u8; 2048];
    match socket.recv_from(&mut buf) {
        Ok((len, _)) => ServerBatch::decode(&buf[..len]).ok(),
        Err(_) => None,
    }
}

/// Drains batches until `pred` matches one of the packets inside, or
/// `attempts` timeouts pass.
fn wait_for(
    socket: &UdpSocket,
    attempts: u32,
    mut pred: impl FnMut(&ServerPacket) -> bool,
) -> Option<ServerPacket> {
    for _ in 0..attempts {
        let Some(batch) = recv_batch(socket, Duration::from_millis(200)) else { continue };
        if let Some(found) = batch.packets.into_iter().find(|p| pred(p)) {
            return Some(found);
        }
    }
    None
}

#[tokio::test]
async fn join_handshake_assigns_a_player_id_over_real_udp() {
    let addr: SocketAddr = "127.0.0.1:48391".parse().unwrap();
    let mut server =
        server::network::Server::new(&addr.to_string(), Duration::from_millis(10), 8, 1)
            .await
            .unwrap();
    tokio::spawn(async move {
        let _ = server.run().await;
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    let client_socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    send_update(&client_socket, addr, 0, Input::default());

    let greeting = wait_for(&client_socket, 20, |p| matches!(p, ServerPacket::Greeting(_)));
    let Some(ServerPacket::Greeting(greeting)) = greeting else {
        panic!("did not receive a Greeting within the attempt budget");
    };
    assert!(greeting.id.get() > 0);
}

#[tokio::test]
async fn movement_input_advances_the_authoritative_position_over_the_wire() {
    let addr: SocketAddr = "127.0.0.1:48392".parse().unwrap();
    let mut server =
        server::network::Server::new(&addr.to_string(), Duration::from_millis(10), 8, 1)
            .await
            .unwrap();
    tokio::spawn(async move {
        let _ = server.run().await;
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    let client_socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    send_update(&client_socket, addr, 0, Input::default());

    let greeting = wait_for(&client_socket, 20, |p| matches!(p, ServerPacket::Greeting(_)));
    let Some(ServerPacket::Greeting(greeting)) = greeting else {
        panic!("did not receive a Greeting within the attempt budget");
    };
    let my_id = greeting.id;

    let move_input = Input { look: Vec2::new(1.0, 0.0), move_right: true, ..Default::default() };
    let mut first_x = None;
    let mut last_x = None;

    for tick in greeting.initial_net_tick..greeting.initial_net_tick + 60 {
        send_update(&client_socket, addr, tick, move_input);
        if let Some(ServerPacket::Auth(auth)) =
            wait_for(&client_socket, 3, |p| matches!(p, ServerPacket::Auth(a) if a.player.id == my_id))
        {
            first_x.get_or_insert(auth.player.pos.x);
            last_x = Some(auth.player.pos.x);
        }
    }

    let first_x = first_x.expect("should have received at least one Auth packet for our own id");
    let last_x = last_x.unwrap();
    assert!(
        last_x > first_x,
        "expected authoritative x position to advance under sustained movement input, first={first_x} last={last_x}"
    );
}

#[tokio::test]
async fn stale_update_outside_the_valid_tick_window_is_reported_as_dropped() {
    let addr: SocketAddr = "127.0.0.1:48393".parse().unwrap();
    let mut server =
        server::network::Server::new(&addr.to_string(), Duration::from_millis(5), 8, 1)
            .await
            .unwrap();
    tokio::spawn(async move {
        let _ = server.run().await;
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    let client_socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    send_update(&client_socket, addr, 0, Input::default());
    wait_for(&client_socket, 20, |p| matches!(p, ServerPacket::Greeting(_)))
        .expect("should have connected");

    // Give the authority loop enough real ticks to move `sim_tick` well past
    // our claimed tick, then submit an update far outside VALID_TICK_WINDOW.
    tokio::time::sleep(Duration::from_millis(300)).await;
    send_update(&client_socket, addr, 0, Input::default());

    let dropped = wait_for(&client_socket, 20, |p| matches!(p, ServerPacket::Dropped(_)));
    assert!(
        matches!(dropped, Some(ServerPacket::Dropped(_))),
        "expected a Dropped reply for a tick far outside the acceptance window"
    );
}

#[cfg(test)]
mod address_resolution_tests {
    use client::network::Client;

    #[tokio::test]
    async fn creates_a_client_for_ipv4_and_ipv6_literals() {
        assert!(Client::new("127.0.0.1:8080", 0).await.is_ok());
        assert!(Client::new("[::1]:8080", 0).await.is_ok());
    }

    #[tokio::test]
    async fn creates_a_client_for_a_resolvable_domain_name() {
        assert!(Client::new("localhost:8080", 0).await.is_ok());
    }

    #[tokio::test]
    async fn rejects_unparseable_or_unresolvable_addresses() {
        assert!(Client::new("not-an-address", 0).await.is_err());
        assert!(Client::new("definitely-nonexistent-domain-12345.invalid:8080", 0)
            .await
            .is_err());
    }
}
