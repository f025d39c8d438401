//! CLI argument definitions using clap derive macros.

use clap::{Parser, ValueEnum};

use earliest_core::{DEFAULT_CHUNK_SIZE, DEFAULT_MARKER, FailurePolicy, MAX_CHUNK_SIZE};

/// Download a directory listing, keep only the files whose marker comes first.
///
/// Every file named by the listing is downloaded concurrently. Files whose
/// marker byte occurs later than the earliest one seen (or not at all) are
/// cancelled and removed; ties at the earliest offset are all kept.
#[derive(Parser, Debug)]
#[command(name = "earliest")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// URL of the directory listing page
    #[arg(long, default_value = "http://localhost:8080")]
    pub url: String,

    /// Destination directory (created if missing)
    #[arg(long, default_value = "dst")]
    pub dst: std::path::PathBuf,

    /// Marker byte: a single ASCII character or a hex byte such as 0x41
    #[arg(short, long, default_value_t = DEFAULT_MARKER as char, value_parser = parse_marker)]
    pub marker: char,

    /// Bytes per chunk; smaller chunks cancel losers sooner
    #[arg(short = 'k', long, default_value_t = DEFAULT_CHUNK_SIZE, value_parser = parse_chunk_size)]
    pub chunk_size: usize,

    /// What a failed download does to the rest of the run
    #[arg(long, value_enum, default_value_t = OnError::Abort)]
    pub on_error: OnError,
}

/// CLI spelling of [`FailurePolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OnError {
    /// Cancel everything, remove every file, exit with an error
    Abort,
    /// Drop the failing file and let the others finish
    Disqualify,
}

impl From<OnError> for FailurePolicy {
    fn from(value: OnError) -> Self {
        match value {
            OnError::Abort => Self::Abort,
            OnError::Disqualify => Self::Disqualify,
        }
    }
}

impl Args {
    /// The marker as the byte the scanner looks for.
    #[must_use]
    pub fn marker_byte(&self) -> u8 {
        // parse_marker only admits ASCII
        u8::try_from(self.marker).unwrap_or(DEFAULT_MARKER)
    }
}

fn parse_marker(value: &str) -> Result<char, String> {
    if let Some(hex) = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        let byte = u8::from_str_radix(hex, 16).map_err(|e| format!("invalid hex byte: {e}"))?;
        if !byte.is_ascii() {
            return Err(format!("marker 0x{byte:02x} is not ASCII"));
        }
        return Ok(char::from(byte));
    }

    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => Ok(c),
        (Some(_), None) => Err("marker must be an ASCII character".to_string()),
        _ => Err("marker must be exactly one character or 0xNN".to_string()),
    }
}

fn parse_chunk_size(value: &str) -> Result<usize, String> {
    let size: usize = value
        .parse()
        .map_err(|e| format!("invalid chunk size: {e}"))?;
    if size == 0 || size > MAX_CHUNK_SIZE {
        return Err(format!("chunk size must be between 1 and {MAX_CHUNK_SIZE}"));
    }
    Ok(size)
}
