//! File-based positional backend.

use crate::backend::{check_write_range, drain_to, fill_at, PositionalIo};
use crate::config::{FileConfig, IoStrategy};
use crate::error::{PosError, PosResult};
use parking_lot::{Mutex, MutexGuard};
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use tracing::{debug, trace, warn};

/// Positional access to an open file.
///
/// The backend adopts a file the caller has already opened and never
/// closes or reopens it; [`into_inner`](Self::into_inner) hands it back.
///
/// # Strategies
///
/// - [`IoStrategy::Native`] maps each call onto `pread`/`pwrite`, which
///   are atomic and leave the cursor alone.
/// - [`IoStrategy::Emulated`] takes a lock owned by this handle, saves the
///   cursor, seeks, does the I/O and seeks back. The cursor is restored
///   even when the I/O fails. The backend's own [`Read`], [`Write`] and
///   [`Seek`] impls take the same lock, so sequential users never observe
///   the transient seek. Other handles to the same file (including
///   duplicated descriptors) are not covered by the lock.
///
/// On Linux, `pwrite` on a file opened with `O_APPEND` appends regardless
/// of the offset. Open files without append mode for positional writes.
///
/// # Example
///
/// ```no_run
/// use posio::{FileBackend, PositionalIo};
/// use std::fs::OpenOptions;
///
/// let file = OpenOptions::new().read(true).write(true).open("data.bin").unwrap();
/// let backend = FileBackend::new(file).unwrap();
/// backend.write_at(4096, b"header").unwrap();
/// let head = backend.read_at(4096, Some(6)).unwrap();
/// assert_eq!(head.as_deref(), Some(&b"header"[..]));
/// ```
#[derive(Debug)]
pub struct FileBackend {
    file: File,
    strategy: IoStrategy,
    config: FileConfig,
    /// Serializes cursor use in emulated mode.
    lock: Mutex<()>,
}

impl FileBackend {
    /// Wraps an open file using the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured strategy is unavailable.
    pub fn new(file: File) -> PosResult<Self> {
        Self::with_config(file, FileConfig::default())
    }

    /// Wraps an open file using the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PosError::Unsupported`] if [`IoStrategy::Native`] is requested
    /// on a platform without positional syscalls.
    pub fn with_config(file: File, config: FileConfig) -> PosResult<Self> {
        let strategy = config.strategy.resolve().ok_or(PosError::Unsupported {
            strategy: config.strategy,
        })?;
        debug!(requested = ?config.strategy, ?strategy, "file backend strategy selected");

        Ok(Self {
            file,
            strategy,
            config,
            lock: Mutex::new(()),
        })
    }

    /// Returns the resolved strategy (never [`IoStrategy::Auto`]).
    #[must_use]
    pub fn strategy(&self) -> IoStrategy {
        self.strategy
    }

    /// Returns the configuration this backend was created with.
    #[must_use]
    pub fn config(&self) -> &FileConfig {
        &self.config
    }

    /// Returns the underlying file.
    #[must_use]
    pub fn get_ref(&self) -> &File {
        &self.file
    }

    /// Consumes the backend, returning the underlying file.
    #[must_use]
    pub fn into_inner(self) -> File {
        self.file
    }

    /// Returns the ordinary cursor position.
    ///
    /// # Errors
    ///
    /// Returns an error if the OS cannot report the position.
    pub fn stream_position(&self) -> PosResult<u64> {
        let _guard = self.sequential_guard();
        Ok((&self.file).stream_position()?)
    }

    fn sequential_guard(&self) -> Option<MutexGuard<'_, ()>> {
        (self.strategy == IoStrategy::Emulated).then(|| self.lock.lock())
    }

    #[cfg(unix)]
    fn native_read(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        std::os::unix::fs::FileExt::read_at(&self.file, buf, offset)
    }

    #[cfg(unix)]
    fn native_write(&self, buf: &[u8], offset: u64) -> io::Result<usize> {
        std::os::unix::fs::FileExt::write_at(&self.file, buf, offset)
    }

    // Construction refuses Native here, so these only guard against misuse.
    #[cfg(not(unix))]
    fn native_read(&self, _buf: &mut [u8], _offset: u64) -> io::Result<usize> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "no positional read syscall on this platform",
        ))
    }

    #[cfg(not(unix))]
    fn native_write(&self, _buf: &[u8], _offset: u64) -> io::Result<usize> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "no positional write syscall on this platform",
        ))
    }

    /// Runs `op` with the cursor saved beforehand and restored afterwards.
    fn emulated<R>(&self, op: impl FnOnce(&File) -> PosResult<R>) -> PosResult<R> {
        let _guard = self.lock.lock();
        let mut file = &self.file;

        let saved = file.stream_position()?;
        let result = op(&self.file);
        let restored = file.seek(SeekFrom::Start(saved));
        finish_restore(saved, result, restored)
    }

    /// Zero-byte read, so a handle not open for reading still fails.
    fn empty_read(&self) -> io::Result<usize> {
        match self.strategy {
            IoStrategy::Emulated => (&self.file).read(&mut []),
            _ => self.native_read(&mut [], 0),
        }
    }

    /// Zero-byte write, so a handle not open for writing still fails.
    fn empty_write(&self) -> io::Result<usize> {
        match self.strategy {
            IoStrategy::Emulated => (&self.file).write(&[]),
            _ => self.native_write(&[], 0),
        }
    }
}

/// Combines the I/O outcome with the cursor restore. An I/O error wins over
/// a restore error.
fn finish_restore<R>(saved: u64, result: PosResult<R>, restored: io::Result<u64>) -> PosResult<R> {
    match (result, restored) {
        (Ok(value), Ok(_)) => Ok(value),
        (Ok(_), Err(e)) => {
            warn!(saved, error = %e, "failed to restore file cursor");
            Err(e.into())
        }
        (Err(e), Ok(_)) => Err(e),
        (Err(e), Err(restore)) => {
            warn!(saved, error = %restore, "failed to restore file cursor after I/O error");
            Err(e)
        }
    }
}

fn seek_read(mut file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    file.seek(SeekFrom::Start(offset))?;
    file.read(buf)
}

fn seek_write(mut file: &File, buf: &[u8], offset: u64) -> io::Result<usize> {
    file.seek(SeekFrom::Start(offset))?;
    file.write(buf)
}

impl PositionalIo for FileBackend {
    fn read_at_into(
        &self,
        offset: u64,
        length: Option<u64>,
        dest: &mut Vec<u8>,
    ) -> PosResult<Option<usize>> {
        if length == Some(0) {
            dest.clear();
            self.empty_read()?;
            return Ok(Some(0));
        }

        let chunk = self.config.read_chunk_size;
        let read = match self.strategy {
            IoStrategy::Emulated => self.emulated(|file| {
                Ok(fill_at(
                    |buf, pos| seek_read(file, buf, pos),
                    offset,
                    length,
                    chunk,
                    dest,
                )?)
            })?,
            _ => fill_at(
                |buf, pos| self.native_read(buf, pos),
                offset,
                length,
                chunk,
                dest,
            )?,
        };

        trace!(offset, ?length, read, strategy = ?self.strategy, "file read_at");
        Ok((read > 0).then_some(read))
    }

    fn write_at(&self, offset: u64, data: &[u8]) -> PosResult<usize> {
        check_write_range(offset, data.len())?;
        if data.is_empty() {
            self.empty_write()?;
            return Ok(0);
        }

        let written = match self.strategy {
            IoStrategy::Emulated => self.emulated(|file| {
                drain_to(|buf, pos| seek_write(file, buf, pos), offset, data)
            })?,
            _ => drain_to(|buf, pos| self.native_write(buf, pos), offset, data)?,
        };

        trace!(offset, written, strategy = ?self.strategy, "file write_at");
        Ok(written)
    }

    fn size(&self) -> PosResult<u64> {
        Ok(self.file.metadata()?.len())
    }
}

impl Read for &FileBackend {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let _guard = self.sequential_guard();
        (&self.file).read(buf)
    }
}

impl Write for &FileBackend {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let _guard = self.sequential_guard();
        (&self.file).write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        (&self.file).flush()
    }
}

impl Seek for &FileBackend {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let _guard = self.sequential_guard();
        (&self.file).seek(pos)
    }
}

impl Read for FileBackend {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (&*self).read(buf)
    }
}

impl Write for FileBackend {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (&*self).write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        (&*self).flush()
    }
}

impl Seek for FileBackend {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        (&*self).seek(pos)
    }
}
