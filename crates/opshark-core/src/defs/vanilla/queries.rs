//! Name, time, and information query packets.

use crate::decode::{
    Cursor, DecodeError, Direction, Field, FieldDef, PacketDefinition, PrimitiveType, Value,
    decode_fields, read_primitive_field,
};

use super::shared::{CLASS, GENDER, QUEST_GIVER_STATUS, RACE};

const ITEM_STAT_COUNT: usize = 10;
const ITEM_DAMAGE_COUNT: usize = 5;
const ITEM_SPELL_COUNT: usize = 5;

/// Sentinel the server answer reduces to when the queried item id is unknown.
const ITEM_NOT_FOUND: &str = "Item not found";

static ITEM_STAT_FIELDS: [FieldDef; 2] = [
    FieldDef::primitive("stat_type", PrimitiveType::U32),
    FieldDef::primitive("value", PrimitiveType::I32),
];

static ITEM_DAMAGE_FIELDS: [FieldDef; 3] = [
    FieldDef::primitive("damage_minimum", PrimitiveType::F32),
    FieldDef::primitive("damage_maximum", PrimitiveType::F32),
    FieldDef::primitive("school", PrimitiveType::U32),
];

static ITEM_SPELL_FIELDS: [FieldDef; 6] = [
    FieldDef::primitive("spell", PrimitiveType::U32),
    FieldDef::primitive("spell_trigger", PrimitiveType::U32),
    FieldDef::primitive("spell_charges", PrimitiveType::I32),
    FieldDef::primitive("spell_cooldown", PrimitiveType::I32),
    FieldDef::primitive("spell_category", PrimitiveType::U32),
    FieldDef::primitive("spell_category_cooldown", PrimitiveType::I32),
];

/// Decodes the variable tail of `SMSG_ITEM_QUERY_SINGLE_RESPONSE`.
///
/// An empty tail means the item does not exist; the server sends only the
/// queried id back. Otherwise the full item template follows, with three
/// repeated blocks (stats, damages, spells) between the scalar runs.
fn read_item_query_data(cursor: &mut Cursor<'_>) -> Result<Value, DecodeError> {
    if cursor.is_empty() {
        return Ok(Value::string(ITEM_NOT_FOUND));
    }

    let mut fields = Vec::new();
    fields.push(read_primitive_field(
        cursor,
        "class_and_sub_class",
        PrimitiveType::U32,
    )?);
    for name in ["name1", "name2", "name3", "name4"] {
        fields.push(read_primitive_field(cursor, name, PrimitiveType::CString)?);
    }
    for name in [
        "display_id",
        "quality",
        "flags",
        "buy_price",
        "sell_price",
        "inventory_type",
        "allowed_class",
        "allowed_race",
        "item_level",
        "required_level",
        "required_skill",
        "required_skill_rank",
        "required_spell",
        "required_honor_rank",
        "required_city_rank",
        "required_faction",
        "required_faction_rank",
        "max_count",
        "stackable",
        "container_slots",
    ] {
        fields.push(read_primitive_field(cursor, name, PrimitiveType::U32)?);
    }

    fields.push(read_struct_array(
        cursor,
        "stats",
        "Stat",
        &ITEM_STAT_FIELDS,
        ITEM_STAT_COUNT,
    )?);
    fields.push(read_struct_array(
        cursor,
        "damages",
        "Damage",
        &ITEM_DAMAGE_FIELDS,
        ITEM_DAMAGE_COUNT,
    )?);

    for name in [
        "armor",
        "holy_resistance",
        "fire_resistance",
        "nature_resistance",
        "frost_resistance",
        "shadow_resistance",
        "arcane_resistance",
    ] {
        fields.push(read_primitive_field(cursor, name, PrimitiveType::I32)?);
    }

    fields.push(read_primitive_field(cursor, "delay", PrimitiveType::U32)?);
    fields.push(read_primitive_field(cursor, "ammo_type", PrimitiveType::U32)?);
    fields.push(read_primitive_field(
        cursor,
        "ranged_range_modification",
        PrimitiveType::F32,
    )?);

    fields.push(read_struct_array(
        cursor,
        "spells",
        "Spell",
        &ITEM_SPELL_FIELDS,
        ITEM_SPELL_COUNT,
    )?);

    fields.push(read_primitive_field(cursor, "bonding", PrimitiveType::U32)?);
    fields.push(read_primitive_field(
        cursor,
        "description",
        PrimitiveType::CString,
    )?);
    for name in [
        "page_text",
        "language",
        "page_text_material",
        "start_quest",
        "lock_id",
        "material",
        "sheathe_type",
        "random_property",
        "block",
        "item_set",
        "max_durability",
        "area",
        "map",
        "bag_family",
    ] {
        fields.push(read_primitive_field(cursor, name, PrimitiveType::U32)?);
    }

    Ok(Value::Struct { fields })
}

/// Reads `count` repetitions of `element` as one provenance-stamped array
/// field. Mirrors what the interpreter does for declarative arrays so custom
/// sections report identical structure.
fn read_struct_array(
    cursor: &mut Cursor<'_>,
    name: &'static str,
    element_type: &'static str,
    element: &'static [FieldDef],
    count: usize,
) -> Result<Field, DecodeError> {
    let offset = cursor.position();
    let mut items = Vec::with_capacity(count);
    for _ in 0..count {
        let fields = decode_fields(element, cursor).map_err(|source| DecodeError::Field {
            field: name,
            offset,
            source: Box::new(source),
        })?;
        items.push(Value::Struct { fields });
    }
    Ok(Field::new(
        name,
        format!("{element_type}[]"),
        Value::Array {
            items,
            element_type: element_type.to_string(),
        },
        offset,
        cursor.position() - offset,
    ))
}

pub(super) static DEFINITIONS: [PacketDefinition; 8] = [
    PacketDefinition::new(
        0x0050,
        "CMSG_NAME_QUERY",
        Direction::ClientToServer,
        &[FieldDef::primitive("guid", PrimitiveType::Guid)],
    ),
    PacketDefinition::new(
        0x0051,
        "SMSG_NAME_QUERY_RESPONSE",
        Direction::ServerToClient,
        &[
            FieldDef::primitive("guid", PrimitiveType::Guid),
            FieldDef::primitive("character_name", PrimitiveType::CString),
            FieldDef::primitive("realm_name", PrimitiveType::CString),
            FieldDef::enumerated("race", &RACE),
            FieldDef::enumerated("gender", &GENDER),
            FieldDef::enumerated("class", &CLASS),
        ],
    ),
    PacketDefinition::new(
        0x01ce,
        "CMSG_QUERY_TIME",
        Direction::ClientToServer,
        &[],
    ),
    PacketDefinition::new(
        0x01cf,
        "SMSG_QUERY_TIME_RESPONSE",
        Direction::ServerToClient,
        &[FieldDef::primitive("timestamp", PrimitiveType::U32)],
    ),
    PacketDefinition::new(
        0x0182,
        "CMSG_QUESTGIVER_STATUS_QUERY",
        Direction::ClientToServer,
        &[FieldDef::primitive("guid", PrimitiveType::Guid)],
    ),
    PacketDefinition::new(
        0x0183,
        "SMSG_QUESTGIVER_STATUS",
        Direction::ServerToClient,
        &[
            FieldDef::primitive("guid", PrimitiveType::Guid),
            FieldDef::enumerated("status", &QUEST_GIVER_STATUS),
        ],
    ),
    PacketDefinition::new(
        0x0056,
        "CMSG_ITEM_QUERY_SINGLE",
        Direction::ClientToServer,
        &[
            FieldDef::primitive("item", PrimitiveType::U32),
            FieldDef::primitive("guid", PrimitiveType::Guid),
        ],
    ),
    PacketDefinition::new(
        0x0058,
        "SMSG_ITEM_QUERY_SINGLE_RESPONSE",
        Direction::ServerToClient,
        &[
            FieldDef::primitive("item", PrimitiveType::U32),
            FieldDef::custom("item_data", "ItemQueryData", read_item_query_data),
        ],
    ),
];
