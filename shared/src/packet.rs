//! Wire protocol: batch headers and the packet payloads carried inside them.
//!
//! Every batch is `bincode`-encoded directly from these types; there is no
//! separate framing layer beyond the batch headers themselves (see the
//! transport module in each binary for how a batch is delimited on the wire).

use crate::ids::PlayerId;
use crate::input::Input;
use crate::player::Player;
use crate::projectile::{GrenadeProjectile, HitscanProjectile, SpatialSound, StepEvent};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServerBatchHeader {
    pub num_packets: u16,
    pub adjustment: i8,
    pub adjustment_iteration: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClientBatchHeader {
    pub net_tick: u64,
    pub num_packets: u16,
    pub adjustment_iteration: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Greeting {
    pub initial_net_tick: u64,
    pub id: PlayerId,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeerGreeting {
    pub id: PlayerId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSpawn {
    pub player: Player,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Auth {
    pub player: Player,
    pub sim_tick: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerAuth {
    pub player: Player,
    pub sim_tick: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerKill {
    pub player_id: PlayerId,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeerDisconnected {
    pub player_id: PlayerId,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hitscan {
    pub hitscan: HitscanProjectile,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Nade {
    pub nade: GrenadeProjectile,
}

/// Reply to a client batch whose `net_tick` fell outside the server's valid
/// window: carries back the tick that was rejected so the client can log it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dropped {
    pub sim_tick: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sound {
    pub sound: SpatialSound,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub step: StepEvent,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClientUpdate {
    pub sim_tick: u64,
    pub input: Input,
}

/// A single server-to-client packet. `bincode` encodes the discriminant as
/// a `u32` tag ahead of the variant payload, matching the fixed 4-byte
/// packet header the wire format specifies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ServerPacket {
    Greeting(Greeting),
    PeerGreeting(PeerGreeting),
    Dropped(Dropped),
    Auth(Auth),
    PeerAuth(PeerAuth),
    PeerDisconnected(PeerDisconnected),
    PlayerKill(PlayerKill),
    PlayerSpawn(PlayerSpawn),
    Hitscan(Hitscan),
    Nade(Nade),
    Sound(Sound),
    Step(Step),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ClientPacket {
    Update(ClientUpdate),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerBatch {
    pub header: ServerBatchHeader,
    pub packets: Vec<ServerPacket>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientBatch {
    pub header: ClientBatchHeader,
    pub packets: Vec<ClientPacket>,
}

impl ServerBatch {
    pub fn new(adjustment: i8, adjustment_iteration: u8, packets: Vec<ServerPacket>) -> Self {
        ServerBatch {
            header: ServerBatchHeader {
                num_packets: packets.len() as u16,
                adjustment,
                adjustment_iteration,
            },
            packets,
        }
    }

    pub fn encode(&self) -> bincode::Result<Vec<u8>> {
        bincode::serialize(self)
    }

    pub fn decode(bytes: &[u8]) -> bincode::Result<Self> {
        bincode::deserialize(bytes)
    }
}

impl ClientBatch {
    pub fn new(net_tick: u64, adjustment_iteration: u8, packets: Vec<ClientPacket>) -> Self {
        ClientBatch {
            header: ClientBatchHeader {
                net_tick,
                num_packets: packets.len() as u16,
                adjustment_iteration,
            },
            packets,
        }
    }

    pub fn encode(&self) -> bincode::Result<Vec<u8>> {
        bincode::serialize(self)
    }

    pub fn decode(bytes: &[u8]) -> bincode::Result<Self> {
        bincode::deserialize(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vec2::Vec2;

    fn pid(n: u64) -> PlayerId {
        PlayerId::new(n).unwrap()
    }

    #[test]
    fn client_batch_roundtrips_through_bincode() {
        let batch = ClientBatch::new(
            7,
            2,
            vec![ClientPacket::Update(ClientUpdate {
                sim_tick: 7,
                input: Input { look: Vec2::new(1.0, 0.0), ..Default::default() },
            })],
        );
        let bytes = batch.encode().unwrap();
        let decoded = ClientBatch::decode(&bytes).unwrap();
        assert_eq!(batch, decoded);
    }

    #[test]
    fn server_batch_roundtrips_through_bincode() {
        let batch = ServerBatch::new(
            -1,
            3,
            vec![
                ServerPacket::Greeting(Greeting { initial_net_tick: 5, id: pid(1) }),
                ServerPacket::Dropped(Dropped { sim_tick: 9 }),
            ],
        );
        let bytes = batch.encode().unwrap();
        let decoded = ServerBatch::decode(&bytes).unwrap();
        assert_eq!(batch, decoded);
        assert_eq!(decoded.header.num_packets, 2);
    }
}
