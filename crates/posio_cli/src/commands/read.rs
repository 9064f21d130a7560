//! Read command implementation.

use super::{open_backend, CommandError, OpenMode};
use posio::{IoStrategy, PositionalIo};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// What to read.
#[derive(Debug, Clone)]
pub struct ReadRequest {
    /// Offset, or distance back from the end with `from_end`.
    pub offset: u64,
    /// Requested length, `None` for everything to the end.
    pub length: Option<u64>,
    /// Interpret `offset` relative to the end.
    pub from_end: bool,
    /// Print a hex dump in text mode.
    pub hex: bool,
}

/// Read command result.
#[derive(Debug, Serialize)]
pub struct ReadResult {
    /// File path.
    pub path: String,
    /// Strategy used for the read.
    pub strategy: String,
    /// Requested offset.
    pub offset: u64,
    /// Whether the offset counts back from the end.
    pub from_end: bool,
    /// Requested length.
    pub length: Option<u64>,
    /// Bytes returned, or `None` if there was no data at the offset.
    pub bytes_read: Option<usize>,
    /// Returned bytes, hex-encoded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    /// Cursor position after the read.
    pub cursor: u64,
}

/// Runs the read command.
pub fn run(
    path: &Path,
    request: &ReadRequest,
    emulated: bool,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let (result, bytes) = execute(path, request, emulated)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => match bytes {
            None => println!("no data"),
            Some(bytes) if request.hex => print!("{}", hex_dump(&bytes)),
            Some(bytes) => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(&bytes)?;
                stdout.flush()?;
            }
        },
    }

    Ok(())
}

/// Performs the read, returning the result record and the raw bytes.
pub fn execute(
    path: &Path,
    request: &ReadRequest,
    emulated: bool,
) -> Result<(ReadResult, Option<Vec<u8>>), CommandError> {
    let mode = OpenMode {
        write: false,
        create: false,
        emulated,
    };
    let backend = open_backend(path, mode)?;

    let bytes = if request.from_end {
        backend.read_from_end(request.offset, request.length)?
    } else {
        backend.read_at(request.offset, request.length)?
    };

    let result = ReadResult {
        path: path.display().to_string(),
        strategy: strategy_name(backend.strategy()).to_string(),
        offset: request.offset,
        from_end: request.from_end,
        length: request.length,
        bytes_read: bytes.as_ref().map(Vec::len),
        data: bytes.as_deref().map(hex::encode),
        cursor: backend.stream_position()?,
    };
    Ok((result, bytes))
}

/// Lower-case name of a strategy for output.
pub fn strategy_name(strategy: IoStrategy) -> &'static str {
    match strategy {
        IoStrategy::Auto => "auto",
        IoStrategy::Native => "native",
        IoStrategy::Emulated => "emulated",
    }
}

/// Sixteen bytes per line, prefixed with the line's offset.
fn hex_dump(bytes: &[u8]) -> String {
    let mut out = String::new();
    for (i, line) in bytes.chunks(16).enumerate() {
        let ascii: String = line
            .iter()
            .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
            .collect();
        out.push_str(&format!("{:08x}  {:<32}  {}\n", i * 16, hex::encode(line), ascii));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn request(offset: u64, length: Option<u64>, from_end: bool) -> ReadRequest {
        ReadRequest {
            offset,
            length,
            from_end,
            hex: false,
        }
    }

    #[test]
    fn read_reports_bytes_and_leaves_cursor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        fs::write(&path, b"hello world").unwrap();

        let (result, bytes) = execute(&path, &request(6, Some(5), false), false).unwrap();
        assert_eq!(bytes.unwrap(), b"world");
        assert_eq!(result.bytes_read, Some(5));
        assert_eq!(result.data.as_deref(), Some("776f726c64"));
        assert_eq!(result.cursor, 0);
    }

    #[test]
    fn read_past_end_is_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        fs::write(&path, b"abc").unwrap();

        let (result, bytes) = execute(&path, &request(3, None, false), true).unwrap();
        assert!(bytes.is_none());
        assert_eq!(result.bytes_read, None);
        assert_eq!(result.strategy, "emulated");
    }

    #[test]
    fn read_from_end_takes_tail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        fs::write(&path, b"abcdef").unwrap();

        let (_, bytes) = execute(&path, &request(2, None, true), false).unwrap();
        assert_eq!(bytes.unwrap(), b"ef");
        assert!(execute(&path, &request(7, None, true), false).is_err());
    }

    #[test]
    fn hex_dump_layout() {
        let dump = hex_dump(b"AB\0");
        assert!(dump.starts_with("00000000  41420"));
        assert!(dump.trim_end().ends_with("AB."));
    }
}
