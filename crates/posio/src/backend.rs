//! Positional I/O contract and the normalization shared by every backend.

use crate::error::{PosError, PosResult};
use std::io;
use std::sync::Arc;

/// Largest offset (and write end) any backend accepts.
///
/// This is the range of the OS `off_t`. No store can be longer, so reads
/// starting past it find no data, and writes ending past it are rejected.
pub const MAX_OFFSET: u64 = i64::MAX as u64;

/// Positional reads and writes against a byte store.
///
/// A positional operation names its offset explicitly and never reads or
/// moves the handle's ordinary cursor. Each call is atomic with respect to
/// other calls on the same handle; no ordering is promised between calls
/// issued concurrently.
///
/// # Read policy
///
/// | `length`     | offset < size                  | offset >= size |
/// |--------------|--------------------------------|----------------|
/// | `Some(0)`    | empty                          | empty          |
/// | `Some(n)`    | up to `n` bytes (short is ok)  | no data        |
/// | `None`       | everything to the end          | no data        |
///
/// "No data" is `Ok(None)`, distinct from an empty `Ok(Some(..))`.
///
/// # Write policy
///
/// Writing past the end grows the store; the gap reads back as zeros. The
/// size afterwards is `max(old_size, offset + data.len())`.
///
/// # Implementors
///
/// - [`super::InMemoryBackend`] - growable byte buffer
/// - [`super::FileBackend`] - open file, native or emulated
pub trait PositionalIo: Send + Sync {
    /// Reads at `offset` into `dest`, replacing its contents.
    ///
    /// Returns `Some(n)` with `dest.len() == n`, or `None` (and an empty
    /// `dest`) when no data is available at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or is closed for reading.
    fn read_at_into(
        &self,
        offset: u64,
        length: Option<u64>,
        dest: &mut Vec<u8>,
    ) -> PosResult<Option<usize>>;

    /// Reads at `offset` into a freshly allocated buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or is closed for reading.
    fn read_at(&self, offset: u64, length: Option<u64>) -> PosResult<Option<Vec<u8>>> {
        let mut buf = Vec::new();
        Ok(self.read_at_into(offset, length, &mut buf)?.map(|_| buf))
    }

    /// Writes all of `data` at `offset`, returning the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails, is closed for writing, accepts
    /// fewer bytes than requested, or `offset + data.len()` exceeds
    /// [`MAX_OFFSET`].
    fn write_at(&self, offset: u64, data: &[u8]) -> PosResult<usize>;

    /// Returns the current size of the store in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn size(&self) -> PosResult<u64>;

    /// Reads starting `back` bytes before the end of the store.
    ///
    /// `back == 0` addresses the end itself, so only `Some(0)` yields data
    /// (an empty buffer).
    ///
    /// # Errors
    ///
    /// Returns [`PosError::InvalidArgument`] if `back` exceeds the size.
    fn read_from_end(&self, back: u64, length: Option<u64>) -> PosResult<Option<Vec<u8>>> {
        let offset = resolve_from_end(back, self.size()?)?;
        self.read_at(offset, length)
    }
}

impl<T: PositionalIo + ?Sized> PositionalIo for Arc<T> {
    fn read_at_into(
        &self,
        offset: u64,
        length: Option<u64>,
        dest: &mut Vec<u8>,
    ) -> PosResult<Option<usize>> {
        (**self).read_at_into(offset, length, dest)
    }

    fn read_at(&self, offset: u64, length: Option<u64>) -> PosResult<Option<Vec<u8>>> {
        (**self).read_at(offset, length)
    }

    fn write_at(&self, offset: u64, data: &[u8]) -> PosResult<usize> {
        (**self).write_at(offset, data)
    }

    fn size(&self) -> PosResult<u64> {
        (**self).size()
    }

    fn read_from_end(&self, back: u64, length: Option<u64>) -> PosResult<Option<Vec<u8>>> {
        (**self).read_from_end(back, length)
    }
}

/// What a read should return, for stores whose size is known up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadPlan {
    /// Zero bytes were requested.
    Empty,
    /// Nothing is available at the offset.
    NoData,
    /// Copy `start..end` of the store.
    Range {
        /// First byte to copy.
        start: usize,
        /// One past the last byte to copy.
        end: usize,
    },
}

impl ReadPlan {
    /// Plans a read of `length` bytes at `offset` from a store of `size` bytes.
    #[must_use]
    pub fn new(offset: u64, length: Option<u64>, size: usize) -> Self {
        if length == Some(0) {
            return Self::Empty;
        }

        let size = size as u64;
        if offset >= size {
            return Self::NoData;
        }

        let available = size - offset;
        let len = length.map_or(available, |n| n.min(available));
        // Both bounds are <= size, which came from a usize.
        let start = offset as usize;
        Self::Range {
            start,
            end: start + len as usize,
        }
    }
}

/// Resolves an offset given as a distance back from the end of the store.
pub(crate) fn resolve_from_end(back: u64, size: u64) -> PosResult<u64> {
    size.checked_sub(back).ok_or_else(|| {
        PosError::invalid_argument(format!(
            "offset {back} bytes before end precedes start of data (size {size})"
        ))
    })
}

/// Checks that a write of `len` bytes at `offset` stays addressable.
pub(crate) fn check_write_range(offset: u64, len: usize) -> PosResult<u64> {
    match offset.checked_add(len as u64) {
        Some(end) if end <= MAX_OFFSET => Ok(end),
        _ => Err(PosError::invalid_argument(format!(
            "write of {len} bytes at offset {offset} exceeds maximum offset {MAX_OFFSET}"
        ))),
    }
}

/// Fills `dest` from a store whose size is not known up front.
///
/// `read` performs one positional read into the slice at the given
/// absolute offset. Reading stops at a zero-byte read or once `length`
/// bytes have arrived; `dest` never grows more than `chunk` bytes past what
/// has actually been read.
pub(crate) fn fill_at<F>(
    mut read: F,
    offset: u64,
    length: Option<u64>,
    chunk: usize,
    dest: &mut Vec<u8>,
) -> io::Result<usize>
where
    F: FnMut(&mut [u8], u64) -> io::Result<usize>,
{
    dest.clear();
    let want = length.unwrap_or(u64::MAX);
    let mut filled = 0usize;

    while (filled as u64) < want {
        let pos = match offset.checked_add(filled as u64) {
            Some(pos) if pos < MAX_OFFSET => pos,
            _ => break,
        };
        let step = (want - filled as u64).min(chunk as u64) as usize;
        dest.resize(filled + step, 0);

        match read(&mut dest[filled..], pos) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => {
                dest.clear();
                return Err(e);
            }
        }
    }

    dest.truncate(filled);
    Ok(filled)
}

/// Writes all of `data` at `offset` through a single-call positional writer.
///
/// A zero-byte write from the store is a [`PosError::ShortWrite`]. Running
/// out of space after some bytes landed returns the partial count.
pub(crate) fn drain_to<F>(mut write: F, offset: u64, data: &[u8]) -> PosResult<usize>
where
    F: FnMut(&[u8], u64) -> io::Result<usize>,
{
    let mut written = 0usize;

    while written < data.len() {
        match write(&data[written..], offset + written as u64) {
            Ok(0) => {
                return Err(PosError::ShortWrite {
                    requested: data.len(),
                    written,
                })
            }
            Ok(n) => written += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) if written > 0 && is_out_of_space(&e) => break,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(written)
}

fn is_out_of_space(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::StorageFull | io::ErrorKind::FileTooLarge
    )
}
