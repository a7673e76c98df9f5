use serde::Serialize;

use super::cursor::Cursor;
use super::error::DecodeError;
use super::schema::{ArrayCount, FieldDef, FieldKind, IntWidth, PacketDefinition, PrimitiveType};
use super::value::{Field, Value};

/// A fully decoded packet: the value tree plus what the decode left behind.
///
/// `trailing_bytes` counts payload bytes after the last defined field. Extra
/// bytes are a warning, not an error; captures of evolving protocols contain
/// them routinely and the decoded prefix is still valid.
#[derive(Debug, Clone, Serialize)]
pub struct DecodedPacket {
    pub opcode: u16,
    pub name: &'static str,
    pub direction: super::schema::Direction,
    pub root: Value,
    pub trailing_bytes: usize,
}

/// Decodes one packet payload against its definition.
///
/// The cursor is left where the last field finished, so the caller can
/// inspect trailing bytes directly if it wants more than the count.
///
/// # Examples
/// ```
/// use opshark_core::{
///     Cursor, Direction, FieldDef, PacketDefinition, PrimitiveType, decode_packet,
/// };
///
/// static PONG: PacketDefinition = PacketDefinition::new(
///     0x01dd,
///     "SMSG_PONG",
///     Direction::ServerToClient,
///     &[FieldDef::primitive("sequence", PrimitiveType::U32)],
/// );
///
/// let mut cursor = Cursor::new(&[0x0a, 0x00, 0x00, 0x00]);
/// let packet = decode_packet(&PONG, &mut cursor)?;
/// assert_eq!(
///     packet.root.field("sequence").unwrap().value.as_number(),
///     Some(10.0)
/// );
/// assert_eq!(packet.trailing_bytes, 0);
/// # Ok::<(), opshark_core::DecodeError>(())
/// ```
pub fn decode_packet(
    def: &PacketDefinition,
    cursor: &mut Cursor<'_>,
) -> Result<DecodedPacket, DecodeError> {
    let fields = decode_fields(def.fields, cursor)?;
    Ok(DecodedPacket {
        opcode: def.opcode,
        name: def.name,
        direction: def.direction,
        root: Value::Struct { fields },
        trailing_bytes: cursor.remaining(),
    })
}

/// Decodes an ordered field list, wrapping errors with the failing field's
/// name and offset.
///
/// Fields decode strictly in definition order; count-by-reference arrays may
/// only look backwards at fields already decoded at the same level.
pub fn decode_fields(
    defs: &[FieldDef],
    cursor: &mut Cursor<'_>,
) -> Result<Vec<Field>, DecodeError> {
    let mut fields: Vec<Field> = Vec::with_capacity(defs.len());
    for def in defs {
        let offset = cursor.position();
        let field = decode_field(def, &fields, cursor).map_err(|source| DecodeError::Field {
            field: def.name,
            offset,
            source: Box::new(source),
        })?;
        fields.push(field);
    }
    Ok(fields)
}

/// Reads one primitive as a provenance-stamped [`Field`].
///
/// This is the building block custom decoders share with the interpreter:
/// offsets and sizes inside a hand-written section stay exact because the
/// same read path produces them.
///
/// # Examples
/// ```
/// use opshark_core::{Cursor, PrimitiveType, read_primitive_field};
///
/// let mut cursor = Cursor::new(b"Hakkar\0");
/// let field = read_primitive_field(&mut cursor, "boss", PrimitiveType::CString)?;
/// assert_eq!(field.value.as_str(), Some("Hakkar"));
/// assert_eq!((field.offset, field.size), (0, 7));
/// # Ok::<(), opshark_core::DecodeError>(())
/// ```
pub fn read_primitive_field(
    cursor: &mut Cursor<'_>,
    name: &'static str,
    ty: PrimitiveType,
) -> Result<Field, DecodeError> {
    let offset = cursor.position();
    match read_primitive(ty, cursor) {
        Ok(value) => Ok(Field::new(
            name,
            ty.type_name(),
            value,
            offset,
            cursor.position() - offset,
        )),
        Err(source) => Err(DecodeError::Field {
            field: name,
            offset,
            source: Box::new(source),
        }),
    }
}

fn decode_field(
    def: &FieldDef,
    decoded: &[Field],
    cursor: &mut Cursor<'_>,
) -> Result<Field, DecodeError> {
    let offset = cursor.position();
    match def.kind {
        FieldKind::Primitive(ty) => {
            let value = read_primitive(ty, cursor)?;
            Ok(Field::new(
                def.name,
                ty.type_name(),
                value,
                offset,
                cursor.position() - offset,
            ))
        }
        FieldKind::Enum(table) => {
            let raw = read_enum_raw(table.width, cursor)?;
            let mut field = Field::new(
                def.name,
                table.name,
                Value::number(raw as f64),
                offset,
                cursor.position() - offset,
            );
            field.symbol = table.symbol(raw).map(str::to_string);
            Ok(field)
        }
        FieldKind::Array {
            element_type,
            element,
            count,
        } => {
            let count = resolve_count(def.name, count, decoded)?;
            // Reject impossible counts before allocating: `count` elements
            // need at least `count * min_element_size` payload bytes.
            let needed = count.saturating_mul(min_element_size(element).max(1));
            if needed > cursor.remaining() {
                return Err(DecodeError::TruncatedBuffer {
                    offset,
                    needed,
                    available: cursor.remaining(),
                });
            }
            let mut items = Vec::with_capacity(count);
            for _ in 0..count {
                items.push(Value::Struct {
                    fields: decode_fields(element, cursor)?,
                });
            }
            Ok(Field::new(
                def.name,
                format!("{element_type}[]"),
                Value::Array {
                    items,
                    element_type: element_type.to_string(),
                },
                offset,
                cursor.position() - offset,
            ))
        }
        FieldKind::Custom { type_name, decode } => {
            let value = decode(cursor)?;
            Ok(Field::new(
                def.name,
                type_name,
                value,
                offset,
                cursor.position() - offset,
            ))
        }
    }
}

fn read_primitive(ty: PrimitiveType, cursor: &mut Cursor<'_>) -> Result<Value, DecodeError> {
    let value = match ty {
        PrimitiveType::U8 => Value::number(f64::from(cursor.read_u8()?)),
        PrimitiveType::I8 => Value::number(f64::from(cursor.read_i8()?)),
        PrimitiveType::U16 => Value::number(f64::from(cursor.read_u16()?)),
        PrimitiveType::I16 => Value::number(f64::from(cursor.read_i16()?)),
        PrimitiveType::U32 => Value::number(f64::from(cursor.read_u32()?)),
        PrimitiveType::I32 => Value::number(f64::from(cursor.read_i32()?)),
        PrimitiveType::U64 => Value::number(cursor.read_u64()? as f64),
        PrimitiveType::I64 => Value::number(cursor.read_i64()? as f64),
        PrimitiveType::F32 => Value::number(f64::from(cursor.read_f32()?)),
        PrimitiveType::F64 => Value::number(cursor.read_f64()?),
        // 64-bit ids exceed f64's exact integer range; keep them lossless.
        PrimitiveType::Guid => Value::string(format!("0x{:016x}", cursor.read_u64()?)),
        PrimitiveType::CString => Value::string(cursor.read_cstring()?),
    };
    Ok(value)
}

fn read_enum_raw(width: IntWidth, cursor: &mut Cursor<'_>) -> Result<u64, DecodeError> {
    Ok(match width {
        IntWidth::U8 => u64::from(cursor.read_u8()?),
        IntWidth::U16 => u64::from(cursor.read_u16()?),
        IntWidth::U32 => u64::from(cursor.read_u32()?),
    })
}

fn resolve_count(
    field: &'static str,
    count: ArrayCount,
    decoded: &[Field],
) -> Result<usize, DecodeError> {
    match count {
        ArrayCount::Fixed(count) => Ok(count),
        ArrayCount::FieldRef(count_field) => {
            let referenced = decoded
                .iter()
                .rev()
                .find(|field| field.name == count_field)
                .ok_or(DecodeError::UnknownCountField { field, count_field })?;
            let raw = referenced
                .value
                .as_number()
                .ok_or(DecodeError::InvalidCountField { field, count_field })?;
            if !raw.is_finite() || raw < 0.0 || raw.fract() != 0.0 || raw > f64::from(u32::MAX) {
                return Err(DecodeError::InvalidCountField { field, count_field });
            }
            Ok(raw as usize)
        }
    }
}

/// Lower bound on the bytes one array element consumes.
fn min_element_size(defs: &[FieldDef]) -> usize {
    defs.iter()
        .map(|def| match def.kind {
            // A CString is at least its terminator.
            FieldKind::Primitive(ty) => ty.fixed_size().unwrap_or(1),
            FieldKind::Enum(table) => table.width.size(),
            FieldKind::Array { element, count, .. } => match count {
                ArrayCount::Fixed(n) => n.saturating_mul(min_element_size(element)),
                ArrayCount::FieldRef(_) => 0,
            },
            FieldKind::Custom { .. } => 0,
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::schema::{Direction, EnumTable};

    static POWER: EnumTable = EnumTable::new(
        "Power",
        IntWidth::U8,
        &[(0, "Mana"), (1, "Rage"), (3, "Energy")],
    );

    static POINT_FIELDS: [FieldDef; 2] = [
        FieldDef::primitive("x", PrimitiveType::U16),
        FieldDef::primitive("y", PrimitiveType::U16),
    ];

    #[test]
    fn primitive_fields_carry_offsets_and_sizes() {
        let defs = [
            FieldDef::primitive("id", PrimitiveType::U32),
            FieldDef::primitive("label", PrimitiveType::CString),
            FieldDef::primitive("ratio", PrimitiveType::F32),
        ];
        let mut payload = Vec::new();
        payload.extend_from_slice(&7u32.to_le_bytes());
        payload.extend_from_slice(b"ok\0");
        payload.extend_from_slice(&0.5f32.to_le_bytes());

        let mut cursor = Cursor::new(&payload);
        let fields = decode_fields(&defs, &mut cursor).unwrap();
        assert_eq!(fields[0].value.as_number(), Some(7.0));
        assert_eq!((fields[0].offset, fields[0].size), (0, 4));
        assert_eq!(fields[1].value.as_str(), Some("ok"));
        assert_eq!((fields[1].offset, fields[1].size), (4, 3));
        assert_eq!(fields[2].value.as_number(), Some(0.5));
        assert_eq!((fields[2].offset, fields[2].size), (7, 4));
        assert!(cursor.is_empty());
    }

    #[test]
    fn enum_field_attaches_symbol_on_hit() {
        let defs = [FieldDef::enumerated("power", &POWER)];
        let mut cursor = Cursor::new(&[0x01]);
        let fields = decode_fields(&defs, &mut cursor).unwrap();
        assert_eq!(fields[0].value.as_number(), Some(1.0));
        assert_eq!(fields[0].symbol.as_deref(), Some("Rage"));
        assert_eq!(fields[0].type_name, "Power");
    }

    #[test]
    fn enum_field_keeps_raw_value_on_miss() {
        let defs = [FieldDef::enumerated("power", &POWER)];
        let mut cursor = Cursor::new(&[0x07]);
        let fields = decode_fields(&defs, &mut cursor).unwrap();
        assert_eq!(fields[0].value.as_number(), Some(7.0));
        assert!(fields[0].symbol.is_none());
    }

    #[test]
    fn fixed_array_decodes_each_element() {
        let defs = [FieldDef::array(
            "points",
            "Point",
            &POINT_FIELDS,
            ArrayCount::Fixed(2),
        )];
        let payload = [0x01, 0x00, 0x02, 0x00, 0x03, 0x00, 0x04, 0x00];
        let mut cursor = Cursor::new(&payload);
        let fields = decode_fields(&defs, &mut cursor).unwrap();

        let field = &fields[0];
        assert_eq!(field.type_name, "Point[]");
        assert_eq!((field.offset, field.size), (0, 8));
        let items = field.value.as_array().unwrap();
        assert_eq!(items.len(), 2);
        let second = items[1].as_struct().unwrap();
        assert_eq!(second[0].value.as_number(), Some(3.0));
        // Element offsets are absolute payload offsets.
        assert_eq!(second[0].offset, 4);
    }

    #[test]
    fn field_ref_count_reads_earlier_field() {
        let defs = [
            FieldDef::primitive("count", PrimitiveType::U16),
            FieldDef::array("points", "Point", &POINT_FIELDS, ArrayCount::FieldRef("count")),
        ];
        let payload = [0x01, 0x00, 0x0a, 0x00, 0x0b, 0x00];
        let mut cursor = Cursor::new(&payload);
        let fields = decode_fields(&defs, &mut cursor).unwrap();
        assert_eq!(fields[1].value.as_array().unwrap().len(), 1);
        assert!(cursor.is_empty());
    }

    #[test]
    fn zero_count_yields_empty_array() {
        let defs = [
            FieldDef::primitive("count", PrimitiveType::U16),
            FieldDef::array("points", "Point", &POINT_FIELDS, ArrayCount::FieldRef("count")),
        ];
        let payload = [0x00, 0x00];
        let mut cursor = Cursor::new(&payload);
        let fields = decode_fields(&defs, &mut cursor).unwrap();
        let field = &fields[1];
        assert!(field.value.as_array().unwrap().is_empty());
        assert_eq!(field.size, 0);
    }

    #[test]
    fn unknown_count_field_is_rejected() {
        let defs = [FieldDef::array(
            "points",
            "Point",
            &POINT_FIELDS,
            ArrayCount::FieldRef("missing"),
        )];
        let mut cursor = Cursor::new(&[0x00]);
        let err = decode_fields(&defs, &mut cursor).unwrap_err();
        assert!(matches!(
            err.root_cause(),
            DecodeError::UnknownCountField {
                field: "points",
                count_field: "missing",
            }
        ));
    }

    #[test]
    fn non_numeric_count_field_is_rejected() {
        let defs = [
            FieldDef::primitive("count", PrimitiveType::CString),
            FieldDef::array("points", "Point", &POINT_FIELDS, ArrayCount::FieldRef("count")),
        ];
        let payload = b"2\0";
        let mut cursor = Cursor::new(payload);
        let err = decode_fields(&defs, &mut cursor).unwrap_err();
        assert!(matches!(
            err.root_cause(),
            DecodeError::InvalidCountField {
                field: "points",
                count_field: "count",
            }
        ));
    }

    #[test]
    fn oversized_count_fails_before_decoding_elements() {
        let defs = [
            FieldDef::primitive("count", PrimitiveType::U16),
            FieldDef::array("points", "Point", &POINT_FIELDS, ArrayCount::FieldRef("count")),
        ];
        // Count claims 0xffff elements with two bytes of payload left.
        let payload = [0xff, 0xff, 0x01, 0x00];
        let mut cursor = Cursor::new(&payload);
        let err = decode_fields(&defs, &mut cursor).unwrap_err();
        match err.root_cause() {
            DecodeError::TruncatedBuffer {
                needed, available, ..
            } => {
                assert_eq!(*needed, 0xffff * 4);
                assert_eq!(*available, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn custom_decoder_extent_is_measured() {
        fn read_pair(cursor: &mut Cursor<'_>) -> Result<Value, DecodeError> {
            let first = read_primitive_field(cursor, "first", PrimitiveType::U8)?;
            let second = read_primitive_field(cursor, "second", PrimitiveType::U8)?;
            Ok(Value::Struct {
                fields: vec![first, second],
            })
        }

        let defs = [
            FieldDef::primitive("lead", PrimitiveType::U8),
            FieldDef::custom("pair", "Pair", read_pair),
        ];
        let mut cursor = Cursor::new(&[0xaa, 0x01, 0x02, 0xbb]);
        let fields = decode_fields(&defs, &mut cursor).unwrap();
        let pair = &fields[1];
        assert_eq!(pair.type_name, "Pair");
        assert_eq!((pair.offset, pair.size), (1, 2));
        let inner = pair.value.as_struct().unwrap();
        assert_eq!(inner[1].offset, 2);
        assert_eq!(cursor.remaining(), 1);
    }

    #[test]
    fn errors_name_the_failing_field_path() {
        static LABEL_FIELDS: [FieldDef; 1] =
            [FieldDef::primitive("label", PrimitiveType::CString)];
        let defs = [
            FieldDef::primitive("count", PrimitiveType::U16),
            FieldDef::array("labels", "Label", &LABEL_FIELDS, ArrayCount::FieldRef("count")),
        ];
        // Two labels promised, second one never terminated.
        let payload = b"\x02\x00hello\0AB";
        let mut cursor = Cursor::new(payload);
        let err = decode_fields(&defs, &mut cursor).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("field `labels` at offset 2"));
        assert!(msg.contains("field `label` at offset 8"));
        assert!(matches!(
            err.root_cause(),
            DecodeError::UnterminatedString { offset: 8 }
        ));
    }

    #[test]
    fn decode_packet_counts_trailing_bytes() {
        static PING: PacketDefinition = PacketDefinition::new(
            0x01dc,
            "CMSG_PING",
            Direction::ClientToServer,
            &[FieldDef::primitive("sequence", PrimitiveType::U32)],
        );
        let mut cursor = Cursor::new(&[0x0a, 0x00, 0x00, 0x00, 0xde, 0xad]);
        let packet = decode_packet(&PING, &mut cursor).unwrap();
        assert_eq!(packet.trailing_bytes, 2);
        assert_eq!(packet.name, "CMSG_PING");
        assert_eq!(packet.direction, Direction::ClientToServer);
    }

    #[test]
    fn empty_definition_decodes_to_empty_struct() {
        static EMPTY: PacketDefinition = PacketDefinition::new(
            0x01ce,
            "CMSG_QUERY_TIME",
            Direction::ClientToServer,
            &[],
        );
        let mut cursor = Cursor::new(&[]);
        let packet = decode_packet(&EMPTY, &mut cursor).unwrap();
        assert_eq!(packet.root.as_struct().unwrap().len(), 0);
        assert_eq!(packet.trailing_bytes, 0);
    }

    #[test]
    fn min_element_size_accounts_for_nested_fixed_arrays() {
        static INNER: [FieldDef; 1] = [FieldDef::primitive("v", PrimitiveType::U32)];
        static OUTER: [FieldDef; 2] = [
            FieldDef::primitive("tag", PrimitiveType::U8),
            FieldDef::array("inner", "Inner", &INNER, ArrayCount::Fixed(3)),
        ];
        assert_eq!(min_element_size(&OUTER), 1 + 3 * 4);
    }
}
