//! OpShark core library for post-mortem game-protocol analysis.
//!
//! This crate implements the offline decode pipeline used by the CLI:
//! packet sources feed the analysis layer, which resolves each record
//! against the opcode registry, runs the schema interpreter over the
//! payload, and aggregates results into a deterministic report. Decoding is
//! byte-oriented and side-effect free; all I/O is isolated in `source`
//! modules. Wire truth lives in `defs` tables so the interpreter stays
//! generic across protocol revisions.
//!
//! Invariants:
//! - Report outputs are deterministic and stable across runs.
//! - Every decoded field carries its absolute payload offset and byte size.
//! - Trailing payload bytes are surfaced as warnings, never errors.
//!
//! Version française (résumé) :
//! Cette crate fournit le cœur d'analyse hors ligne : sources -> registre
//! d'opcodes -> interprète de schémas -> rapport déterministe. Les E/S
//! restent dans `source`, la vérité du protocole dans les tables `defs`.
//! Garanties : ordre stable du rapport, provenance octet par octet de
//! chaque champ, octets résiduels signalés sans faire échouer le décodage.
//!
//! # Examples
//! ```no_run
//! use std::path::Path;
//!
//! use opshark_core::analyze_dump_file;
//!
//! let report = analyze_dump_file(Path::new("session.pdump"))?;
//! println!("report version: {}", report.report_version);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use serde::{Deserialize, Serialize};

mod analysis;
mod decode;
mod defs;
mod registry;
mod source;

pub use analysis::{AnalysisError, analyze_dump_file, analyze_source};
pub use decode::{
    ArrayCount, Cursor, CustomDecodeFn, DecodeError, DecodedPacket, Direction, EnumTable, Field,
    FieldDef, FieldKind, IntWidth, PacketDefinition, ParseDirectionError, PrimitiveType, Value,
    decode_fields, decode_packet, read_primitive_field,
};
pub use registry::{PacketRegistry, RegistryError};
pub use source::{DumpFileSource, PacketRecord, PacketSource, SourceError};

/// Current report schema version.
pub const REPORT_VERSION: u32 = 1;
/// Default timestamp used when no capture time is available.
pub const DEFAULT_GENERATED_AT: &str = "1970-01-01T00:00:00Z";

/// Aggregated analysis report with deterministic ordering.
///
/// # Examples
/// ```
/// use opshark_core::make_stub_report;
///
/// let report = make_stub_report("session.pdump", 123);
/// assert_eq!(report.report_version, opshark_core::REPORT_VERSION);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Report schema version (not the binary version).
    pub report_version: u32,
    /// Tool identification metadata.
    pub tool: ToolInfo,
    /// RFC3339 timestamp representing the report generation time.
    pub generated_at: String,

    /// Input capture metadata.
    pub input: InputInfo,

    /// Optional capture summary (may be empty when unavailable).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture_summary: Option<CaptureSummary>,
    /// Per-packet decode results in capture order.
    pub packets: Vec<PacketReport>,
    /// Per-opcode summaries in stable order.
    pub opcodes: Vec<OpcodeSummary>,
}

/// Tool metadata embedded in reports.
///
/// # Examples
/// ```
/// use opshark_core::ToolInfo;
///
/// let tool = ToolInfo {
///     name: "opshark".to_string(),
///     version: "0.1.0".to_string(),
/// };
/// assert_eq!(tool.name, "opshark");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    /// Tool name (e.g., "opshark").
    pub name: String,
    /// Tool version (semver).
    pub version: String,
}

/// Input capture metadata embedded in reports.
///
/// # Examples
/// ```
/// use opshark_core::InputInfo;
///
/// let input = InputInfo {
///     path: "session.pdump".to_string(),
///     bytes: 1024,
/// };
/// assert_eq!(input.bytes, 1024);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputInfo {
    /// Input path as provided to the analyzer.
    pub path: String,
    /// Input size in bytes.
    pub bytes: u64,
}

/// Basic capture summary (timestamps may be absent).
///
/// # Examples
/// ```
/// use opshark_core::CaptureSummary;
///
/// let summary = CaptureSummary {
///     packets_total: 10,
///     time_start: None,
///     time_end: None,
/// };
/// assert_eq!(summary.packets_total, 10);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureSummary {
    /// Total packet count observed in the capture.
    pub packets_total: u64,
    /// RFC3339 timestamp of the first packet (if known).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_start: Option<String>,
    /// RFC3339 timestamp of the last packet (if known).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_end: Option<String>,
}

/// Decode outcome for a single packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeStatus {
    /// Every defined field decoded.
    Decoded,
    /// No definition registered for the `(opcode, direction)` pair.
    UnknownOpcode,
    /// A defined field failed to decode; see `error`.
    Failed,
}

/// Per-packet decode result.
///
/// # Examples
/// ```
/// use opshark_core::{DecodeStatus, Direction, PacketReport};
///
/// let packet = PacketReport {
///     index: 0,
///     ts: None,
///     direction: Direction::ClientToServer,
///     opcode: 0x01dc,
///     name: Some("CMSG_PING".to_string()),
///     payload_bytes: 8,
///     status: DecodeStatus::Decoded,
///     root: None,
///     trailing_bytes: None,
///     error: None,
/// };
/// assert_eq!(packet.status, DecodeStatus::Decoded);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacketReport {
    /// Zero-based position in the capture.
    pub index: u64,
    /// Capture timestamp in epoch seconds, when recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ts: Option<f64>,
    pub direction: Direction,
    pub opcode: u16,
    /// Definition name, when the opcode is registered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Payload size in bytes.
    pub payload_bytes: u64,
    pub status: DecodeStatus,
    /// Decoded value tree (present only when `status` is `decoded`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<Value>,
    /// Bytes left after the last defined field, when any (a warning).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trailing_bytes: Option<u64>,
    /// Decode error chain (present only when `status` is `failed`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Per-opcode aggregate over one capture.
///
/// # Examples
/// ```
/// use opshark_core::{Direction, OpcodeSummary};
///
/// let summary = OpcodeSummary {
///     direction: Direction::ServerToClient,
///     opcode: 0x0051,
///     name: Some("SMSG_NAME_QUERY_RESPONSE".to_string()),
///     packets: 2,
///     bytes: 56,
///     decoded: 2,
///     failed: 0,
///     unknown: 0,
///     trailing_warnings: 0,
/// };
/// assert_eq!(summary.packets, 2);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpcodeSummary {
    pub direction: Direction,
    pub opcode: u16,
    /// Definition name, when the opcode is registered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Packets observed for this `(direction, opcode)` key.
    pub packets: u64,
    /// Payload bytes observed.
    pub bytes: u64,
    /// Packets that decoded fully.
    pub decoded: u64,
    /// Packets whose decode failed.
    pub failed: u64,
    /// Packets with no registered definition.
    pub unknown: u64,
    /// Decoded packets that left trailing bytes behind.
    pub trailing_warnings: u64,
}

/// Build a stub report with base fields filled and empty aggregates.
///
/// # Examples
/// ```
/// use opshark_core::make_stub_report;
///
/// let report = make_stub_report("session.pdump", 123);
/// assert_eq!(report.report_version, opshark_core::REPORT_VERSION);
/// assert!(report.packets.is_empty());
/// ```
pub fn make_stub_report(input_path: &str, input_bytes: u64) -> Report {
    Report {
        report_version: REPORT_VERSION,
        tool: ToolInfo {
            name: "opshark".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        generated_at: DEFAULT_GENERATED_AT.to_string(),
        input: InputInfo {
            path: input_path.to_string(),
            bytes: input_bytes,
        },
        capture_summary: None,
        packets: vec![],
        opcodes: vec![],
    }
}
