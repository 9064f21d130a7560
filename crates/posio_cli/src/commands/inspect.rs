//! Inspect command implementation.

use super::read::strategy_name;
use super::{format_size, open_backend, CommandError, OpenMode};
use posio::{IoStrategy, PositionalIo};
use serde::Serialize;
use std::path::Path;

/// File inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// File path.
    pub path: String,
    /// File size in bytes.
    pub size: u64,
    /// Strategy the handle resolved to.
    pub strategy: String,
    /// Whether native positional syscalls exist on this platform.
    pub native_available: bool,
    /// Chunk size used by reads to the end.
    pub read_chunk_size: usize,
    /// Cursor position of the freshly opened handle.
    pub cursor: u64,
}

/// Runs the inspect command.
pub fn run(path: &Path, emulated: bool, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let result = execute(path, emulated)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

/// Collects the inspection result.
pub fn execute(path: &Path, emulated: bool) -> Result<InspectResult, CommandError> {
    let mode = OpenMode {
        write: false,
        create: false,
        emulated,
    };
    let backend = open_backend(path, mode)?;

    Ok(InspectResult {
        path: path.display().to_string(),
        size: backend.size()?,
        strategy: strategy_name(backend.strategy()).to_string(),
        native_available: IoStrategy::native_available(),
        read_chunk_size: backend.config().read_chunk_size,
        cursor: backend.stream_position()?,
    })
}

fn print_text_output(result: &InspectResult) {
    println!("posio File Inspection");
    println!("=====================");
    println!();
    println!("Path: {}", result.path);
    println!();
    println!("Handle:");
    println!("  Size:       {} bytes", format_size(result.size));
    println!("  Strategy:   {}", result.strategy);
    println!(
        "  Native:     {}",
        if result.native_available {
            "available"
        } else {
            "unavailable"
        }
    );
    println!("  Read chunk: {} bytes", format_size(result.read_chunk_size as u64));
    println!("  Cursor:     {}", result.cursor);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn inspect_reports_size_and_strategy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        fs::write(&path, vec![7u8; 4096]).unwrap();

        let result = execute(&path, true).unwrap();
        assert_eq!(result.size, 4096);
        assert_eq!(result.strategy, "emulated");
        assert_eq!(result.cursor, 0);
        assert_eq!(result.read_chunk_size, posio::DEFAULT_READ_CHUNK_SIZE);
    }

    #[test]
    fn inspect_auto_resolves_to_platform_strategy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        fs::write(&path, b"").unwrap();

        let result = execute(&path, false).unwrap();
        let expected = if cfg!(unix) { "native" } else { "emulated" };
        assert_eq!(result.strategy, expected);
    }

    #[test]
    fn inspect_json_has_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        fs::write(&path, b"xyz").unwrap();

        let json = serde_json::to_value(execute(&path, false).unwrap()).unwrap();
        assert_eq!(json["size"], 3);
        assert!(json["native_available"].is_boolean());
    }
}
