//! CLI command implementations.

pub mod inspect;
pub mod read;
pub mod write;

use posio::{FileBackend, FileConfig, IoStrategy, PosError};
use std::fs::OpenOptions;
use std::path::Path;

/// Errors reported by the CLI itself.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// The file could not be opened.
    #[error("cannot open {path}: {source}")]
    Open {
        /// File path.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A positional operation failed.
    #[error(transparent)]
    Posio(#[from] PosError),

    /// The `--hex` payload is not valid hex.
    #[error("invalid hex payload: {0}")]
    Hex(#[from] hex::FromHexError),

    /// Neither or both payload flags were given.
    #[error("exactly one of --data or --hex is required")]
    MissingPayload,
}

/// How a command opens its file.
#[derive(Debug, Clone, Copy)]
pub struct OpenMode {
    /// Open for writing too.
    pub write: bool,
    /// Create the file if missing.
    pub create: bool,
    /// Force the locked seek/restore strategy.
    pub emulated: bool,
}

/// Opens `path` and wraps it in a [`FileBackend`].
pub fn open_backend(path: &Path, mode: OpenMode) -> Result<FileBackend, CommandError> {
    let file = OpenOptions::new()
        .read(true)
        .write(mode.write)
        .create(mode.write && mode.create)
        .open(path)
        .map_err(|source| CommandError::Open {
            path: path.display().to_string(),
            source,
        })?;

    let strategy = if mode.emulated {
        IoStrategy::Emulated
    } else {
        IoStrategy::Auto
    };
    Ok(FileBackend::with_config(
        file,
        FileConfig::new().strategy(strategy),
    )?)
}

/// Formats a byte count for humans.
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{}", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
