//! Session-level world packets: keepalive, login state, world states.

use crate::decode::{ArrayCount, Direction, FieldDef, PacketDefinition, PrimitiveType};

static TUTORIAL_FLAG_FIELDS: [FieldDef; 1] =
    [FieldDef::primitive("flags", PrimitiveType::U32)];

static WORLD_STATE_FIELDS: [FieldDef; 2] = [
    FieldDef::primitive("state", PrimitiveType::U32),
    FieldDef::primitive("value", PrimitiveType::U32),
];

pub(super) static DEFINITIONS: [PacketDefinition; 5] = [
    PacketDefinition::new(
        0x01dc,
        "CMSG_PING",
        Direction::ClientToServer,
        &[
            FieldDef::primitive("sequence", PrimitiveType::U32),
            FieldDef::primitive("latency", PrimitiveType::U32),
        ],
    ),
    PacketDefinition::new(
        0x01dd,
        "SMSG_PONG",
        Direction::ServerToClient,
        &[FieldDef::primitive("sequence", PrimitiveType::U32)],
    ),
    PacketDefinition::new(
        0x0042,
        "SMSG_LOGIN_SETTIMESPEED",
        Direction::ServerToClient,
        &[
            FieldDef::primitive("game_time", PrimitiveType::U32),
            FieldDef::primitive("game_speed", PrimitiveType::F32),
        ],
    ),
    // The client stores eight fixed tutorial flag words.
    PacketDefinition::new(
        0x00fd,
        "SMSG_TUTORIAL_FLAGS",
        Direction::ServerToClient,
        &[FieldDef::array(
            "tutorial_flags",
            "TutorialFlag",
            &TUTORIAL_FLAG_FIELDS,
            ArrayCount::Fixed(8),
        )],
    ),
    PacketDefinition::new(
        0x02c2,
        "SMSG_INIT_WORLD_STATES",
        Direction::ServerToClient,
        &[
            FieldDef::primitive("map", PrimitiveType::U32),
            FieldDef::primitive("zone", PrimitiveType::U32),
            FieldDef::primitive("count", PrimitiveType::U16),
            FieldDef::array(
                "states",
                "WorldState",
                &WORLD_STATE_FIELDS,
                ArrayCount::FieldRef("count"),
            ),
        ],
    ),
];
