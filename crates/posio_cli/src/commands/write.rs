//! Write command implementation.

use super::read::strategy_name;
use super::{format_size, open_backend, CommandError, OpenMode};
use posio::PositionalIo;
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// Write command result.
#[derive(Debug, Serialize)]
pub struct WriteResult {
    /// File path.
    pub path: String,
    /// Strategy used for the write.
    pub strategy: String,
    /// Write offset.
    pub offset: u64,
    /// Bytes written.
    pub written: usize,
    /// File size before the write.
    pub previous_size: u64,
    /// File size after the write.
    pub size: u64,
}

/// Decodes the payload from `--data` or `--hex`.
pub fn payload(data: Option<&str>, hex: Option<&str>) -> Result<Vec<u8>, CommandError> {
    match (data, hex) {
        (Some(text), None) => Ok(text.as_bytes().to_vec()),
        (None, Some(encoded)) => {
            let encoded: String = encoded.split_whitespace().collect();
            Ok(hex::decode(encoded)?)
        }
        _ => Err(CommandError::MissingPayload),
    }
}

/// Runs the write command.
pub fn run(
    path: &Path,
    offset: u64,
    bytes: &[u8],
    create: bool,
    emulated: bool,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let result = execute(path, offset, bytes, create, emulated)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            println!("Wrote {} bytes at offset {}", result.written, result.offset);
            println!(
                "Size: {} -> {} bytes",
                format_size(result.previous_size),
                format_size(result.size)
            );
        }
    }

    Ok(())
}

/// Performs the write.
pub fn execute(
    path: &Path,
    offset: u64,
    bytes: &[u8],
    create: bool,
    emulated: bool,
) -> Result<WriteResult, CommandError> {
    let mode = OpenMode {
        write: true,
        create,
        emulated,
    };
    let backend = open_backend(path, mode)?;

    let previous_size = backend.size()?;
    let written = backend.write_at(offset, bytes)?;
    backend.get_ref().sync_data().map_err(posio::PosError::from)?;
    let size = backend.size()?;

    if size > previous_size && offset > previous_size {
        info!(gap = offset - previous_size, "zero-filled gap before write");
    }

    Ok(WriteResult {
        path: path.display().to_string(),
        strategy: strategy_name(backend.strategy()).to_string(),
        offset,
        written,
        previous_size,
        size,
    })
}
