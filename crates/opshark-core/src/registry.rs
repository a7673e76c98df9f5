use std::collections::HashMap;

use thiserror::Error;

use crate::decode::{Direction, PacketDefinition};
use crate::defs;

/// Errors raised while building a [`PacketRegistry`].
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error(
        "duplicate definition for {direction} opcode 0x{opcode:04x}: `{existing}` vs `{incoming}`"
    )]
    Duplicate {
        opcode: u16,
        direction: Direction,
        existing: &'static str,
        incoming: &'static str,
    },
}

/// Lookup table from `(opcode, direction)` to a packet definition.
///
/// The same opcode number can be a different packet in each direction, so
/// direction is part of the key. Construction rejects duplicate keys; after
/// that the registry is read-only and freely shareable.
///
/// # Examples
/// ```
/// use opshark_core::{Direction, PacketRegistry};
///
/// let registry = PacketRegistry::vanilla()?;
/// let def = registry
///     .get(0x0050, Direction::ClientToServer)
///     .expect("name query");
/// assert_eq!(def.name, "CMSG_NAME_QUERY");
/// # Ok::<(), opshark_core::RegistryError>(())
/// ```
#[derive(Debug)]
pub struct PacketRegistry {
    by_key: HashMap<(u16, Direction), &'static PacketDefinition>,
}

impl PacketRegistry {
    /// Builds a registry from definition tables.
    pub fn from_definitions<I>(definitions: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = &'static PacketDefinition>,
    {
        let mut by_key: HashMap<(u16, Direction), &'static PacketDefinition> = HashMap::new();
        for def in definitions {
            if let Some(existing) = by_key.insert((def.opcode, def.direction), def) {
                return Err(RegistryError::Duplicate {
                    opcode: def.opcode,
                    direction: def.direction,
                    existing: existing.name,
                    incoming: def.name,
                });
            }
        }
        Ok(Self { by_key })
    }

    /// Registry preloaded with the vanilla protocol tables.
    pub fn vanilla() -> Result<Self, RegistryError> {
        Self::from_definitions(defs::vanilla::definitions())
    }

    pub fn get(&self, opcode: u16, direction: Direction) -> Option<&'static PacketDefinition> {
        self.by_key.get(&(opcode, direction)).copied()
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    /// Registered definitions in a stable `(direction, opcode)` order.
    ///
    /// The backing map has no deterministic iteration order, so entries are
    /// sorted the same way report opcode summaries are.
    pub fn definitions(&self) -> impl Iterator<Item = &'static PacketDefinition> {
        let mut entries: Vec<_> = self.by_key.values().copied().collect();
        entries.sort_by_key(|def| (def.direction, def.opcode));
        entries.into_iter()
    }
}
