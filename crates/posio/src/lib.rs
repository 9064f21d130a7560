//! # posio
//!
//! Positional reads and writes (`pread`/`pwrite` semantics) for open files
//! and in-memory byte streams.
//!
//! A positional operation names its byte offset explicitly and never moves
//! the handle's ordinary cursor, so many threads can share one handle
//! without a seek/read race.
//!
//! ## Design Principles
//!
//! - One contract, [`PositionalIo`], with identical edge-case behaviour on
//!   every backend
//! - "No data at this offset" is `Ok(None)`, never an empty buffer
//! - Writing past the end zero-fills the gap
//! - The core never opens or closes files; it adopts handles the caller owns
//!
//! ## Available Backends
//!
//! - [`FileBackend`] - native `pread`/`pwrite`, or a locked seek/restore fallback
//! - [`InMemoryBackend`] - growable byte buffer with the same semantics
//!
//! ## Example
//!
//! ```rust
//! use posio::{InMemoryBackend, PositionalIo};
//!
//! let stream = InMemoryBackend::with_data(b"hello world".to_vec());
//! assert_eq!(stream.read_at(6, None).unwrap().unwrap(), b"world");
//! assert_eq!(stream.read_at(11, None).unwrap(), None);
//! assert_eq!(stream.read_at(11, Some(0)).unwrap(), Some(Vec::new()));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod config;
mod error;
mod file;
mod memory;

pub use backend::{PositionalIo, ReadPlan, MAX_OFFSET};
pub use config::{FileConfig, IoStrategy, DEFAULT_READ_CHUNK_SIZE};
pub use error::{PosError, PosResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
