//! Line-oriented packet dump reader.
//!
//! A dump line is `[ts] DIR OPCODE PAYLOAD`: an optional finite epoch-seconds
//! timestamp, CMSG or SMSG, the opcode as `0x`-hex or decimal, and the
//! payload as contiguous hex (`-` for an empty payload). Blank lines and
//! `#` comments are skipped. Anything else aborts the run with the line
//! number; a dump that cannot be trusted line-by-line is not worth decoding.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

use super::{PacketRecord, PacketSource, SourceError};
use crate::decode::Direction;

pub struct DumpFileSource {
    lines: Lines<BufReader<File>>,
    line_no: usize,
}

impl DumpFileSource {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let file = File::open(path)?;
        Ok(Self {
            lines: BufReader::new(file).lines(),
            line_no: 0,
        })
    }
}

impl PacketSource for DumpFileSource {
    fn next_record(&mut self) -> Result<Option<PacketRecord>, SourceError> {
        loop {
            let line = match self.lines.next() {
                Some(line) => line?,
                None => return Ok(None),
            };
            self.line_no += 1;
            if let Some(record) = parse_record(&line, self.line_no)? {
                return Ok(Some(record));
            }
        }
    }
}

/// Parses one dump line; `Ok(None)` for blank lines and comments.
pub(crate) fn parse_record(
    line: &str,
    line_no: usize,
) -> Result<Option<PacketRecord>, SourceError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut tokens = line.split_whitespace();
    let first = match tokens.next() {
        Some(token) => token,
        None => return Ok(None),
    };

    let (ts, direction_token) = match first.parse::<f64>() {
        Ok(ts) if !ts.is_finite() => {
            return Err(malformed(line_no, format!("non-finite timestamp `{first}`")));
        }
        Ok(ts) => {
            let direction = tokens
                .next()
                .ok_or_else(|| malformed(line_no, "missing direction after timestamp"))?;
            (Some(ts), direction)
        }
        Err(_) => (None, first),
    };

    let direction: Direction = direction_token
        .parse()
        .map_err(|err| malformed(line_no, err))?;

    let opcode_token = tokens
        .next()
        .ok_or_else(|| malformed(line_no, "missing opcode"))?;
    let opcode = parse_opcode(opcode_token, line_no)?;

    let payload_token = tokens
        .next()
        .ok_or_else(|| malformed(line_no, "missing payload"))?;
    let payload = parse_payload(payload_token, line_no)?;

    if tokens.next().is_some() {
        return Err(malformed(line_no, "unexpected trailing tokens"));
    }

    Ok(Some(PacketRecord {
        ts,
        direction,
        opcode,
        payload,
    }))
}

fn parse_opcode(token: &str, line_no: usize) -> Result<u16, SourceError> {
    let parsed = if let Some(hex) = token.strip_prefix("0x").or_else(|| token.strip_prefix("0X"))
    {
        u16::from_str_radix(hex, 16)
    } else {
        token.parse::<u16>()
    };
    parsed.map_err(|_| malformed(line_no, format!("invalid opcode `{token}`")))
}

fn parse_payload(token: &str, line_no: usize) -> Result<Vec<u8>, SourceError> {
    if token == "-" {
        return Ok(Vec::new());
    }
    if token.len() % 2 != 0 {
        return Err(malformed(
            line_no,
            format!("odd-length hex payload ({} chars)", token.len()),
        ));
    }
    let mut payload = Vec::with_capacity(token.len() / 2);
    for pair in token.as_bytes().chunks_exact(2) {
        match (hex_nibble(pair[0]), hex_nibble(pair[1])) {
            (Some(hi), Some(lo)) => payload.push((hi << 4) | lo),
            _ => {
                return Err(malformed(
                    line_no,
                    format!("invalid hex payload `{token}`"),
                ));
            }
        }
    }
    Ok(payload)
}

fn hex_nibble(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

fn malformed(line: usize, message: impl ToString) -> SourceError {
    SourceError::Dump {
        line,
        message: message.to_string(),
    }
}
