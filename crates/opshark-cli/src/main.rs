use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glob::glob;
use opshark_core::{Cursor, Direction, PacketRegistry, Report, analyze_dump_file, decode_packet};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (commit ",
    env!("OPSHARK_BUILD_COMMIT"),
    ", ",
    env!("OPSHARK_BUILD_DATE"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "opshark")]
#[command(version, long_version = LONG_VERSION)]
#[command(
    about = "Offline-first decoder for vanilla world-protocol packet dumps (CMSG / SMSG).",
    long_about = None,
    after_help = "Examples:\n  opshark dump analyse session.pdump -o report.json\n  opshark dump analyze session.pdump --stdout --pretty\n  opshark decode SMSG 0x01CF 00010203"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Operations on packet dump files (offline-first).
    Dump {
        #[command(subcommand)]
        command: DumpCommands,
    },
    /// Decode one payload against a registered opcode and print the value tree.
    Decode {
        /// Packet direction (CMSG or SMSG)
        direction: Direction,

        /// Opcode as 0x-prefixed hex or decimal
        opcode: String,

        /// Payload as contiguous hex; omit or pass `-` for an empty payload
        payload: Option<String>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
}

#[derive(Subcommand, Debug)]
enum DumpCommands {
    /// Analyse a dump file and generate a versioned JSON report.
    #[command(alias = "analyze")]
    #[command(
        after_help = "Examples:\n  opshark dump analyse session.pdump -o report.json\n  opshark dump analyze session.pdump --report report.json\n  opshark dump analyse session.pdump --stdout --pretty"
    )]
    Analyse {
        /// Path to a .pdump or .txt dump file
        input: PathBuf,

        /// Output report path (JSON)
        #[arg(short = 'o', long, required_unless_present = "stdout")]
        report: Option<PathBuf>,

        /// Write JSON report to stdout
        #[arg(long, conflicts_with = "report")]
        stdout: bool,

        /// Pretty-print JSON output
        #[arg(long, conflicts_with = "compact")]
        pretty: bool,

        /// Compact JSON output (default)
        #[arg(long)]
        compact: bool,

        /// Suppress non-error output
        #[arg(long)]
        quiet: bool,

        /// Exit with a non-zero code if any packet failed or left trailing bytes
        #[arg(long)]
        strict: bool,

        /// List decode failures after analysis
        #[arg(long)]
        list_failures: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Dump { command } => match command {
            DumpCommands::Analyse {
                input,
                report,
                stdout,
                pretty,
                compact,
                quiet,
                strict,
                list_failures,
            } => cmd_dump_analyse(
                input,
                report,
                stdout,
                pretty,
                compact,
                quiet,
                strict,
                list_failures,
            ),
        },
        Commands::Decode {
            direction,
            opcode,
            payload,
            pretty,
        } => cmd_decode(direction, &opcode, payload.as_deref(), pretty),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(err.to_string(), None)
    }
}

fn cmd_dump_analyse(
    input: PathBuf,
    report: Option<PathBuf>,
    stdout: bool,
    pretty: bool,
    compact: bool,
    quiet: bool,
    strict: bool,
    list_failures: bool,
) -> Result<(), CliError> {
    let resolved_input = resolve_input_path(&input)?;
    validate_input_file(&resolved_input)?;
    let input_abs = fs::canonicalize(&resolved_input)
        .with_context(|| format!("Failed to resolve input path: {}", resolved_input.display()))?;
    let report = if stdout {
        None
    } else {
        Some(report.ok_or_else(|| {
            CliError::new(
                "missing output path",
                Some("use -o/--report or --stdout".to_string()),
            )
        })?)
    };

    if let Some(report_path) = report.as_ref() {
        if report_targets_input(report_path, &input_abs)? {
            return Err(CliError::new(
                format!(
                    "report path must differ from input: {}",
                    report_path.display()
                ),
                Some("choose a different output path".to_string()),
            ));
        }
    }

    let meta = fs::metadata(&resolved_input)
        .with_context(|| format!("Failed to read input file: {}", resolved_input.display()))?;

    if !meta.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some("use a .pdump or .txt dump file".to_string()),
        ));
    }

    // Keep the full error chain visible: a malformed line must surface its
    // line number on stderr, not a generic failure.
    let rep = analyze_dump_file(&resolved_input)
        .map_err(|err| CliError::new(format!("dump analysis failed: {err}"), None))?;
    let json = serialize_json(&rep, pretty, compact)?;

    if stdout {
        print!("{}", json);
        if list_failures && !quiet {
            print_failures(&rep);
        }
        if strict && has_failures(&rep) {
            return Err(CliError::new(
                "decode failures detected",
                Some("use --list-failures to inspect".to_string()),
            ));
        }
        return Ok(());
    }

    let report = report.expect("report required when not using stdout");
    if let Some(parent) = report.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }
    }

    fs::write(&report, json)
        .with_context(|| format!("Failed to write report: {}", report.display()))?;

    if list_failures && !quiet {
        print_failures(&rep);
    }
    if !quiet {
        eprintln!("OK: report written -> {}", report.display());
    }
    if strict && has_failures(&rep) {
        return Err(CliError::new(
            "decode failures detected",
            Some("use --list-failures to inspect".to_string()),
        ));
    }
    Ok(())
}

fn cmd_decode(
    direction: Direction,
    opcode: &str,
    payload: Option<&str>,
    pretty: bool,
) -> Result<(), CliError> {
    let opcode = parse_opcode(opcode)?;
    let payload = match payload {
        None | Some("-") => Vec::new(),
        Some(hex) => parse_hex_payload(hex)?,
    };

    let registry = PacketRegistry::vanilla().context("registry construction failed")?;
    let def = registry.get(opcode, direction).ok_or_else(|| {
        CliError::new(
            format!("no definition for {direction} 0x{opcode:04x}"),
            Some("definitions cover the vanilla query and world opcodes".to_string()),
        )
    })?;

    let mut cursor = Cursor::new(&payload);
    let decoded = decode_packet(def, &mut cursor).map_err(|err| {
        CliError::new(
            format!("decode failed for {}: {err}", def.name),
            Some("the payload may be truncated or from a different protocol build".to_string()),
        )
    })?;

    let json = serialize_json(&decoded, pretty, false)?;
    println!("{}", json);
    if decoded.trailing_bytes > 0 {
        eprintln!(
            "warning: {} trailing byte(s) after the last field",
            decoded.trailing_bytes
        );
    }
    Ok(())
}

fn serialize_json<T: serde::Serialize>(
    value: &T,
    pretty: bool,
    compact: bool,
) -> Result<String, CliError> {
    if pretty && compact {
        return Err(CliError::new(
            "cannot use --pretty and --compact together",
            Some("choose one output format".to_string()),
        ));
    }
    if pretty {
        serde_json::to_string_pretty(value)
            .context("JSON serialization failed")
            .map_err(Into::into)
    } else {
        serde_json::to_string(value)
            .context("JSON serialization failed")
            .map_err(Into::into)
    }
}

fn has_failures(rep: &Report) -> bool {
    rep.opcodes
        .iter()
        .any(|summary| summary.failed > 0 || summary.trailing_warnings > 0)
}

fn print_failures(rep: &Report) {
    // Summaries arrive sorted by direction then opcode.
    eprintln!("Decode failures:");
    for summary in &rep.opcodes {
        if summary.failed == 0 && summary.trailing_warnings == 0 {
            continue;
        }
        let name = summary.name.as_deref().unwrap_or("?");
        eprintln!(
            "  {} 0x{:04x} {} (failed {}, trailing {})",
            summary.direction, summary.opcode, name, summary.failed, summary.trailing_warnings
        );
    }
}

fn parse_opcode(token: &str) -> Result<u16, CliError> {
    let parsed = if let Some(hex) = token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
        u16::from_str_radix(hex, 16)
    } else {
        token.parse::<u16>()
    };
    parsed.map_err(|_| {
        CliError::new(
            format!("invalid opcode `{token}`"),
            Some("use 0x-prefixed hex or decimal, e.g. 0x01CF".to_string()),
        )
    })
}

fn parse_hex_payload(token: &str) -> Result<Vec<u8>, CliError> {
    if token.len() % 2 != 0 {
        return Err(CliError::new(
            format!("odd-length hex payload ({} chars)", token.len()),
            Some("payloads are whole bytes, two hex digits each".to_string()),
        ));
    }
    let mut payload = Vec::with_capacity(token.len() / 2);
    for pair in token.as_bytes().chunks_exact(2) {
        match (hex_nibble(pair[0]), hex_nibble(pair[1])) {
            (Some(hi), Some(lo)) => payload.push((hi << 4) | lo),
            _ => {
                return Err(CliError::new(
                    format!("invalid hex payload `{token}`"),
                    Some("use contiguous hex digits, e.g. 0a000000".to_string()),
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

/// True when writing the report would overwrite the input file.
fn report_targets_input(
    report_path: &std::path::Path,
    input_abs: &std::path::Path,
) -> Result<bool, CliError> {
    let parent = match report_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => std::path::Path::new("."),
    };
    let Ok(report_dir) = fs::canonicalize(parent) else {
        // Parent does not exist yet; it will be created, so no clash.
        return Ok(false);
    };
    let file_name = report_path
        .file_name()
        .ok_or_else(|| CliError::new("invalid report path", None))?;
    Ok(report_dir.join(file_name) == input_abs)
}

fn validate_input_file(input: &PathBuf) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("use a .pdump or .txt dump file".to_string()),
        ));
    }
    let ext = input
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    if ext != "pdump" && ext != "txt" {
        return Err(CliError::new(
            format!("unsupported input format '{}'", input.display()),
            Some("expected a .pdump or .txt dump file".to_string()),
        ));
    }
    Ok(())
}

fn resolve_input_path(input: &PathBuf) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.clone());
    }

    let mut matches = Vec::new();
    let paths = glob(&pattern).map_err(|err| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    for entry in paths {
        let path = entry.map_err(|err| {
            CliError::new(
                format!("invalid input pattern '{}'", pattern),
                Some(format!("pattern error: {}", err)),
            )
        })?;
        if path.is_file() {
            matches.push(path);
        }
    }

    if matches.is_empty() {
        return Err(CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern; expected .pdump or .txt".to_string()),
        ));
    }
    if matches.len() > 1 {
        let listed = matches
            .iter()
            .take(3)
            .map(|path| path.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let ellipsis = if matches.len() > 3 { ", ..." } else { "" };
        return Err(CliError::new(
            format!(
                "multiple files match pattern '{}' ({} matches); matches: {listed}{ellipsis}",
                pattern,
                matches.len()
            ),
            Some("pass a single dump file, or run once per file".to_string()),
        ));
    }

    Ok(matches.remove(0))
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
