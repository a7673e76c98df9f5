//! Enum tables shared across vanilla packet definitions.
//!
//! Entries mirror the 1.12 client database. Gaps are real: class ids 6 and
//! 10 were never shipped, and raw values outside a table decode with no
//! symbol rather than failing.

use crate::decode::{EnumTable, IntWidth};

pub static RACE: EnumTable = EnumTable::new(
    "Race",
    IntWidth::U32,
    &[
        (1, "Human"),
        (2, "Orc"),
        (3, "Dwarf"),
        (4, "NightElf"),
        (5, "Undead"),
        (6, "Tauren"),
        (7, "Gnome"),
        (8, "Troll"),
    ],
);

pub static GENDER: EnumTable = EnumTable::new(
    "Gender",
    IntWidth::U32,
    &[(0, "Male"), (1, "Female"), (2, "None")],
);

pub static CLASS: EnumTable = EnumTable::new(
    "Class",
    IntWidth::U32,
    &[
        (1, "Warrior"),
        (2, "Paladin"),
        (3, "Hunter"),
        (4, "Rogue"),
        (5, "Priest"),
        (7, "Shaman"),
        (8, "Mage"),
        (9, "Warlock"),
        (11, "Druid"),
    ],
);

pub static QUEST_GIVER_STATUS: EnumTable = EnumTable::new(
    "QuestGiverStatus",
    IntWidth::U32,
    &[
        (0, "None"),
        (1, "Unavailable"),
        (2, "Chat"),
        (3, "Incomplete"),
        (4, "RewardRep"),
        (5, "Available"),
        (6, "RewardOld"),
        (7, "Reward"),
    ],
);
