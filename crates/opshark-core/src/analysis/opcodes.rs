use std::collections::HashMap;

use crate::decode::Direction;
use crate::source::PacketRecord;
use crate::{DecodeStatus, OpcodeSummary, PacketReport};

#[derive(Debug, Hash, PartialEq, Eq)]
pub(crate) struct OpcodeKey {
    pub direction: Direction,
    pub opcode: u16,
}

#[derive(Debug, Default, Clone)]
pub(crate) struct OpcodeStats {
    pub name: Option<String>,
    pub packets: u64,
    pub bytes: u64,
    pub decoded: u64,
    pub failed: u64,
    pub unknown: u64,
    pub trailing_warnings: u64,
}

pub(crate) fn add_opcode_stats(
    stats: &mut HashMap<OpcodeKey, OpcodeStats>,
    record: &PacketRecord,
    report: &PacketReport,
) {
    let key = OpcodeKey {
        direction: record.direction,
        opcode: record.opcode,
    };
    let entry = stats.entry(key).or_default();
    entry.packets += 1;
    entry.bytes += record.payload.len() as u64;
    if entry.name.is_none() {
        entry.name.clone_from(&report.name);
    }
    match report.status {
        DecodeStatus::Decoded => entry.decoded += 1,
        DecodeStatus::Failed => entry.failed += 1,
        DecodeStatus::UnknownOpcode => entry.unknown += 1,
    }
    if report.trailing_bytes.is_some() {
        entry.trailing_warnings += 1;
    }
}

pub(crate) fn build_opcode_summaries(
    stats: HashMap<OpcodeKey, OpcodeStats>,
) -> Vec<OpcodeSummary> {
    let mut opcodes: Vec<OpcodeSummary> = stats
        .into_iter()
        .map(|(key, stats)| OpcodeSummary {
            direction: key.direction,
            opcode: key.opcode,
            name: stats.name,
            packets: stats.packets,
            bytes: stats.bytes,
            decoded: stats.decoded,
            failed: stats.failed,
            unknown: stats.unknown,
            trailing_warnings: stats.trailing_warnings,
        })
        .collect();

    opcodes.sort_by(|a, b| {
        a.direction
            .cmp(&b.direction)
            .then_with(|| a.opcode.cmp(&b.opcode))
    });
    opcodes
}
