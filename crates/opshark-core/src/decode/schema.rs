use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::cursor::Cursor;
use super::error::DecodeError;
use super::value::Value;

/// Fixed-layout primitive field types.
///
/// All multi-byte primitives are little-endian on the wire. `Guid` is a
/// 64-bit identifier rendered as a hex string to avoid `f64` precision loss;
/// `CString` is NUL-terminated and has no fixed size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveType {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
    Guid,
    CString,
}

impl PrimitiveType {
    pub const fn type_name(self) -> &'static str {
        match self {
            PrimitiveType::U8 => "u8",
            PrimitiveType::I8 => "i8",
            PrimitiveType::U16 => "u16",
            PrimitiveType::I16 => "i16",
            PrimitiveType::U32 => "u32",
            PrimitiveType::I32 => "i32",
            PrimitiveType::U64 => "u64",
            PrimitiveType::I64 => "i64",
            PrimitiveType::F32 => "f32",
            PrimitiveType::F64 => "f64",
            PrimitiveType::Guid => "Guid",
            PrimitiveType::CString => "CString",
        }
    }

    /// Wire size in bytes, or `None` for variable-length types.
    pub const fn fixed_size(self) -> Option<usize> {
        match self {
            PrimitiveType::U8 | PrimitiveType::I8 => Some(1),
            PrimitiveType::U16 | PrimitiveType::I16 => Some(2),
            PrimitiveType::U32 | PrimitiveType::I32 | PrimitiveType::F32 => Some(4),
            PrimitiveType::U64
            | PrimitiveType::I64
            | PrimitiveType::F64
            | PrimitiveType::Guid => Some(8),
            PrimitiveType::CString => None,
        }
    }
}

/// Wire width of an enumerated field's raw integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntWidth {
    U8,
    U16,
    U32,
}

impl IntWidth {
    pub const fn size(self) -> usize {
        match self {
            IntWidth::U8 => 1,
            IntWidth::U16 => 2,
            IntWidth::U32 => 4,
        }
    }
}

/// Symbol table for an enumerated field.
///
/// Lookups are open-ended: a raw value with no entry decodes fine and simply
/// carries no symbol. Tables are declared as `static` data next to the packet
/// definitions that use them.
///
/// # Examples
/// ```
/// use opshark_core::{EnumTable, IntWidth};
///
/// static GENDER: EnumTable =
///     EnumTable::new("Gender", IntWidth::U32, &[(0, "Male"), (1, "Female")]);
/// assert_eq!(GENDER.symbol(1), Some("Female"));
/// assert_eq!(GENDER.symbol(9), None);
/// ```
#[derive(Debug)]
pub struct EnumTable {
    pub name: &'static str,
    pub width: IntWidth,
    pub entries: &'static [(u64, &'static str)],
}

impl EnumTable {
    #[must_use]
    pub const fn new(
        name: &'static str,
        width: IntWidth,
        entries: &'static [(u64, &'static str)],
    ) -> Self {
        Self {
            name,
            width,
            entries,
        }
    }

    pub fn symbol(&self, raw: u64) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(value, _)| *value == raw)
            .map(|(_, symbol)| *symbol)
    }
}

/// How an array field's element count is determined.
#[derive(Debug, Clone, Copy)]
pub enum ArrayCount {
    /// Count fixed by the definition.
    Fixed(usize),
    /// Count read from an earlier field at the same nesting level.
    FieldRef(&'static str),
}

/// Decoder hook for payload sections a declarative field list cannot express.
///
/// The hook borrows the cursor mid-packet: whatever it consumes is the
/// field's extent, and any bytes it leaves behind remain for the fields
/// after it.
pub type CustomDecodeFn = fn(&mut Cursor<'_>) -> Result<Value, DecodeError>;

/// The decoding rule for one field.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// Fixed-layout scalar or NUL-terminated string.
    Primitive(PrimitiveType),
    /// Raw integer matched against a symbol table.
    Enum(&'static EnumTable),
    /// Repeated struct block with a fixed or field-referenced count.
    Array {
        element_type: &'static str,
        element: &'static [FieldDef],
        count: ArrayCount,
    },
    /// Hand-written decoder spliced into the field sequence.
    Custom {
        type_name: &'static str,
        decode: CustomDecodeFn,
    },
}

/// A named field inside a packet definition or array element.
#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldDef {
    #[must_use]
    pub const fn primitive(name: &'static str, ty: PrimitiveType) -> Self {
        Self {
            name,
            kind: FieldKind::Primitive(ty),
        }
    }

    #[must_use]
    pub const fn enumerated(name: &'static str, table: &'static EnumTable) -> Self {
        Self {
            name,
            kind: FieldKind::Enum(table),
        }
    }

    #[must_use]
    pub const fn array(
        name: &'static str,
        element_type: &'static str,
        element: &'static [FieldDef],
        count: ArrayCount,
    ) -> Self {
        Self {
            name,
            kind: FieldKind::Array {
                element_type,
                element,
                count,
            },
        }
    }

    #[must_use]
    pub const fn custom(
        name: &'static str,
        type_name: &'static str,
        decode: CustomDecodeFn,
    ) -> Self {
        Self {
            name,
            kind: FieldKind::Custom { type_name, decode },
        }
    }
}

/// A packet's wire identity plus its ordered field list.
#[derive(Debug, Clone, Copy)]
pub struct PacketDefinition {
    pub opcode: u16,
    pub name: &'static str,
    pub direction: Direction,
    pub fields: &'static [FieldDef],
}

impl PacketDefinition {
    #[must_use]
    pub const fn new(
        opcode: u16,
        name: &'static str,
        direction: Direction,
        fields: &'static [FieldDef],
    ) -> Self {
        Self {
            opcode,
            name,
            direction,
            fields,
        }
    }
}

/// Direction a packet travels in, part of its registry identity.
///
/// The same opcode number can mean different packets in each direction.
/// Serialized with the conventional CMSG/SMSG labels.
///
/// # Examples
/// ```
/// use opshark_core::Direction;
///
/// let direction: Direction = "smsg".parse()?;
/// assert_eq!(direction, Direction::ServerToClient);
/// assert_eq!(direction.to_string(), "SMSG");
/// # Ok::<(), opshark_core::ParseDirectionError>(())
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Direction {
    #[serde(rename = "CMSG")]
    ClientToServer,
    #[serde(rename = "SMSG")]
    ServerToClient,
}

impl Direction {
    pub const fn as_str(self) -> &'static str {
        match self {
            Direction::ClientToServer => "CMSG",
            Direction::ServerToClient => "SMSG",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown direction `{value}`: expected CMSG or SMSG")]
pub struct ParseDirectionError {
    pub value: String,
}

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("CMSG") {
            Ok(Direction::ClientToServer)
        } else if s.eq_ignore_ascii_case("SMSG") {
            Ok(Direction::ServerToClient)
        } else {
            Err(ParseDirectionError {
                value: s.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_sizes_match_wire_layout() {
        assert_eq!(PrimitiveType::U8.fixed_size(), Some(1));
        assert_eq!(PrimitiveType::I16.fixed_size(), Some(2));
        assert_eq!(PrimitiveType::F32.fixed_size(), Some(4));
        assert_eq!(PrimitiveType::Guid.fixed_size(), Some(8));
        assert_eq!(PrimitiveType::CString.fixed_size(), None);
    }

    #[test]
    fn enum_table_lookup_hit_and_miss() {
        static TABLE: EnumTable =
            EnumTable::new("Race", IntWidth::U32, &[(1, "Human"), (2, "Orc")]);
        assert_eq!(TABLE.symbol(2), Some("Orc"));
        assert_eq!(TABLE.symbol(6), None);
        assert_eq!(TABLE.width.size(), 4);
    }

    #[test]
    fn field_def_constructors_build_expected_kinds() {
        let field = FieldDef::primitive("guid", PrimitiveType::Guid);
        assert!(matches!(
            field.kind,
            FieldKind::Primitive(PrimitiveType::Guid)
        ));

        static ELEMENT: [FieldDef; 1] = [FieldDef::primitive("flags", PrimitiveType::U32)];
        let field = FieldDef::array("pages", "Page", &ELEMENT, ArrayCount::Fixed(8));
        match field.kind {
            FieldKind::Array {
                element_type,
                element,
                count,
            } => {
                assert_eq!(element_type, "Page");
                assert_eq!(element.len(), 1);
                assert!(matches!(count, ArrayCount::Fixed(8)));
            }
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn direction_parses_case_insensitively() {
        assert_eq!(
            "cmsg".parse::<Direction>().unwrap(),
            Direction::ClientToServer
        );
        assert_eq!(
            "SMSG".parse::<Direction>().unwrap(),
            Direction::ServerToClient
        );
        let err = "server".parse::<Direction>().unwrap_err();
        assert!(err.to_string().contains("expected CMSG or SMSG"));
    }

    #[test]
    fn direction_orders_client_before_server() {
        assert!(Direction::ClientToServer < Direction::ServerToClient);
    }

    #[test]
    fn direction_serializes_as_wire_label() {
        let json = serde_json::to_string(&Direction::ServerToClient).expect("json");
        assert_eq!(json, "\"SMSG\"");
        let back: Direction = serde_json::from_str("\"CMSG\"").expect("parse");
        assert_eq!(back, Direction::ClientToServer);
    }
}
