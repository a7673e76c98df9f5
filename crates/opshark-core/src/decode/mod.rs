mod cursor;
mod error;
mod interpreter;
mod schema;
mod value;

pub use cursor::Cursor;
pub use error::DecodeError;
pub use interpreter::{DecodedPacket, decode_fields, decode_packet, read_primitive_field};
pub use schema::{
    ArrayCount, CustomDecodeFn, Direction, EnumTable, FieldDef, FieldKind, IntWidth,
    PacketDefinition, ParseDirectionError, PrimitiveType,
};
pub use value::{Field, Value};
