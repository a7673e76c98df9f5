mod dump;

pub use dump::DumpFileSource;

use thiserror::Error;

use crate::decode::Direction;

/// One captured packet, with transport and crypto layers already stripped.
#[derive(Debug, Clone)]
pub struct PacketRecord {
    /// Capture timestamp in epoch seconds, when the dump recorded one.
    pub ts: Option<f64>,
    pub direction: Direction,
    pub opcode: u16,
    pub payload: Vec<u8>,
}

/// Anything that can yield packet records in capture order.
pub trait PacketSource {
    fn next_record(&mut self) -> Result<Option<PacketRecord>, SourceError>;
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("dump parse error at line {line}: {message}")]
    Dump { line: usize, message: String },
}
