//! Packet definitions for the vanilla (1.12) protocol.
//!
//! Tables are grouped the way the opcode space is used: `queries` covers the
//! name/time/item lookup round-trips, `world` the session-level traffic.
//! Shared enum tables live in `shared`.

mod queries;
mod shared;
mod world;

use crate::decode::PacketDefinition;

/// All vanilla definitions, in table order.
pub fn definitions() -> impl Iterator<Item = &'static PacketDefinition> {
    queries::DEFINITIONS.iter().chain(world::DEFINITIONS.iter())
}
