use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::decode::{Cursor, decode_packet};
use crate::registry::{PacketRegistry, RegistryError};
use crate::source::{DumpFileSource, PacketRecord, PacketSource, SourceError};
use crate::{
    CaptureSummary, DEFAULT_GENERATED_AT, DecodeStatus, PacketReport, Report, make_stub_report,
};

mod opcodes;

use opcodes::{OpcodeKey, OpcodeStats, add_opcode_stats, build_opcode_summaries};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
}

/// Analyzes a dump file with the vanilla registry.
pub fn analyze_dump_file(path: &Path) -> Result<Report, AnalysisError> {
    let registry = PacketRegistry::vanilla()?;
    let source = DumpFileSource::open(path)?;
    analyze_source(path, source, &registry)
}

/// Replays a packet source through the registry and interpreter into a
/// deterministic report: packets in capture order, opcode summaries sorted.
pub fn analyze_source<S: PacketSource>(
    path: &Path,
    mut source: S,
    registry: &PacketRegistry,
) -> Result<Report, AnalysisError> {
    let mut packets_total = 0u64;
    let mut first_ts = None;
    let mut last_ts = None;
    let mut opcode_stats: HashMap<OpcodeKey, OpcodeStats> = HashMap::new();
    let mut packets: Vec<PacketReport> = Vec::new();

    while let Some(record) = source.next_record()? {
        packets_total += 1;
        update_ts_bounds(&mut first_ts, &mut last_ts, record.ts);
        let packet = decode_record(&record, packets.len() as u64, registry);
        add_opcode_stats(&mut opcode_stats, &record, &packet);
        packets.push(packet);
    }

    let mut report = make_stub_report(&path.display().to_string(), path.metadata()?.len());
    report.capture_summary = Some(CaptureSummary {
        packets_total,
        time_start: ts_to_rfc3339(first_ts),
        time_end: ts_to_rfc3339(last_ts),
    });
    report.generated_at = report
        .capture_summary
        .as_ref()
        .and_then(|summary| summary.time_end.clone().or(summary.time_start.clone()))
        .unwrap_or_else(|| DEFAULT_GENERATED_AT.to_string());
    report.opcodes = build_opcode_summaries(opcode_stats);
    report.packets = packets;
    Ok(report)
}

fn decode_record(record: &PacketRecord, index: u64, registry: &PacketRegistry) -> PacketReport {
    let base = PacketReport {
        index,
        ts: record.ts,
        direction: record.direction,
        opcode: record.opcode,
        name: None,
        payload_bytes: record.payload.len() as u64,
        status: DecodeStatus::UnknownOpcode,
        root: None,
        trailing_bytes: None,
        error: None,
    };

    let Some(def) = registry.get(record.opcode, record.direction) else {
        return base;
    };

    let mut cursor = Cursor::new(&record.payload);
    match decode_packet(def, &mut cursor) {
        Ok(decoded) => PacketReport {
            name: Some(def.name.to_string()),
            status: DecodeStatus::Decoded,
            root: Some(decoded.root),
            trailing_bytes: (decoded.trailing_bytes > 0).then_some(decoded.trailing_bytes as u64),
            ..base
        },
        Err(err) => PacketReport {
            name: Some(def.name.to_string()),
            status: DecodeStatus::Failed,
            error: Some(err.to_string()),
            ..base
        },
    }
}

fn update_ts_bounds(first: &mut Option<f64>, last: &mut Option<f64>, ts: Option<f64>) {
    let ts = match ts {
        Some(ts) => ts,
        None => return,
    };
    match first {
        None => *first = Some(ts),
        Some(existing) => {
            if ts < *existing {
                *first = Some(ts);
            }
        }
    }
    match last {
        None => *last = Some(ts),
        Some(existing) => {
            if ts > *existing {
                *last = Some(ts);
            }
        }
    }
}

fn ts_to_rfc3339(ts: Option<f64>) -> Option<String> {
    let ts = ts?;
    let nanos = (ts * 1_000_000_000.0) as i128;
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .ok()
        .and_then(|dt| dt.format(&Rfc3339).ok())
}
