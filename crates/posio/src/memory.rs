//! In-memory positional backend.

use crate::backend::{check_write_range, resolve_from_end, PositionalIo, ReadPlan};
use crate::error::{PosError, PosResult};
use parking_lot::{Mutex, RwLock};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::trace;

/// A growable in-memory byte stream with positional access.
///
/// Positional calls hold the buffer lock for the whole copy, so each call
/// is atomic with respect to the others. The stream also has an ordinary
/// cursor, driven through [`Read`], [`Write`] and [`Seek`], which positional
/// calls never touch.
///
/// Either direction can be closed independently with
/// [`close_read`](Self::close_read) and [`close_write`](Self::close_write).
///
/// # Example
///
/// ```rust
/// use posio::{InMemoryBackend, PositionalIo};
///
/// let stream = InMemoryBackend::with_data(b"hello".to_vec());
/// stream.write_at(8, b"!").unwrap();
/// assert_eq!(stream.data(), b"hello\0\0\0!");
/// assert_eq!(stream.read_at(5, None).unwrap().unwrap(), b"\0\0\0!");
/// assert_eq!(stream.read_at(9, None).unwrap(), None);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    data: RwLock<Vec<u8>>,
    /// Lock order: `cursor` before `data`.
    cursor: Mutex<u64>,
    read_closed: AtomicBool,
    write_closed: AtomicBool,
}

impl InMemoryBackend {
    /// Creates a new empty stream.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a stream over existing bytes, with the cursor at zero.
    #[must_use]
    pub fn with_data(data: Vec<u8>) -> Self {
        Self {
            data: RwLock::new(data),
            ..Self::default()
        }
    }

    /// Returns a copy of the stream's contents.
    #[must_use]
    pub fn data(&self) -> Vec<u8> {
        self.data.read().clone()
    }

    /// Consumes the stream, returning its contents.
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.data.into_inner()
    }

    /// Returns the ordinary cursor position.
    #[must_use]
    pub fn position(&self) -> u64 {
        *self.cursor.lock()
    }

    /// Closes the stream for reading. Later reads fail with [`PosError::NotReadable`].
    pub fn close_read(&self) {
        self.read_closed.store(true, Ordering::Release);
    }

    /// Closes the stream for writing. Later writes fail with [`PosError::NotWritable`].
    pub fn close_write(&self) {
        self.write_closed.store(true, Ordering::Release);
    }

    /// Returns `true` unless the stream was closed for reading.
    #[must_use]
    pub fn is_readable(&self) -> bool {
        !self.read_closed.load(Ordering::Acquire)
    }

    /// Returns `true` unless the stream was closed for writing.
    #[must_use]
    pub fn is_writable(&self) -> bool {
        !self.write_closed.load(Ordering::Acquire)
    }

    fn check_readable(&self) -> PosResult<()> {
        if self.is_readable() {
            Ok(())
        } else {
            Err(PosError::NotReadable)
        }
    }

    fn check_writable(&self) -> PosResult<()> {
        if self.is_writable() {
            Ok(())
        } else {
            Err(PosError::NotWritable)
        }
    }

    fn copy_out(data: &[u8], plan: ReadPlan, dest: &mut Vec<u8>) -> Option<usize> {
        dest.clear();
        match plan {
            ReadPlan::Empty => Some(0),
            ReadPlan::NoData => None,
            ReadPlan::Range { start, end } => {
                dest.extend_from_slice(&data[start..end]);
                Some(end - start)
            }
        }
    }

    /// Overwrites `data` at `offset`, growing and zero-filling as needed.
    fn store(&self, offset: u64, data: &[u8]) -> PosResult<usize> {
        let end = check_write_range(offset, data.len())?;
        if data.is_empty() {
            return Ok(0);
        }

        let end = usize::try_from(end).map_err(|_| {
            PosError::invalid_argument(format!("write end {end} exceeds addressable memory"))
        })?;
        // end fits in usize, so offset does too.
        let start = offset as usize;

        let mut buf = self.data.write();
        if end > buf.len() {
            let grow = end - buf.len();
            buf.try_reserve(grow)
                .map_err(|e| io::Error::new(io::ErrorKind::OutOfMemory, e))?;
            buf.resize(end, 0);
        }
        buf[start..end].copy_from_slice(data);

        Ok(data.len())
    }
}

impl PositionalIo for InMemoryBackend {
    fn read_at_into(
        &self,
        offset: u64,
        length: Option<u64>,
        dest: &mut Vec<u8>,
    ) -> PosResult<Option<usize>> {
        self.check_readable()?;

        let data = self.data.read();
        let plan = ReadPlan::new(offset, length, data.len());
        let read = Self::copy_out(&data, plan, dest);

        trace!(offset, ?length, ?read, "memory read_at");
        Ok(read)
    }

    fn write_at(&self, offset: u64, data: &[u8]) -> PosResult<usize> {
        self.check_writable()?;

        let written = self.store(offset, data)?;
        trace!(offset, written, "memory write_at");
        Ok(written)
    }

    fn size(&self) -> PosResult<u64> {
        Ok(self.data.read().len() as u64)
    }

    fn read_from_end(&self, back: u64, length: Option<u64>) -> PosResult<Option<Vec<u8>>> {
        self.check_readable()?;

        // Resolve and copy under one lock so the end cannot move in between.
        let data = self.data.read();
        let offset = resolve_from_end(back, data.len() as u64)?;
        let mut dest = Vec::new();
        Ok(Self::copy_out(&data, ReadPlan::new(offset, length, data.len()), &mut dest).map(|_| dest))
    }
}

fn into_io(err: PosError) -> io::Error {
    match err {
        PosError::Io(e) => e,
        PosError::InvalidArgument { .. } => io::Error::new(io::ErrorKind::InvalidInput, err),
        other => io::Error::new(io::ErrorKind::Other, other),
    }
}

impl Read for &InMemoryBackend {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.check_readable().map_err(into_io)?;

        let mut cursor = self.cursor.lock();
        let data = self.data.read();
        let plan = ReadPlan::new(*cursor, Some(buf.len() as u64), data.len());

        let n = match plan {
            ReadPlan::Empty | ReadPlan::NoData => 0,
            ReadPlan::Range { start, end } => {
                buf[..end - start].copy_from_slice(&data[start..end]);
                end - start
            }
        };
        *cursor += n as u64;
        Ok(n)
    }
}

impl Write for &InMemoryBackend {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.check_writable().map_err(into_io)?;

        let mut cursor = self.cursor.lock();
        let n = self.store(*cursor, buf).map_err(into_io)?;
        *cursor += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for &InMemoryBackend {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let mut cursor = self.cursor.lock();
        let (base, delta) = match pos {
            SeekFrom::Start(n) => {
                *cursor = n;
                return Ok(n);
            }
            SeekFrom::End(delta) => (self.data.read().len() as u64, delta),
            SeekFrom::Current(delta) => (*cursor, delta),
        };

        let target = base.checked_add_signed(delta).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid seek to a negative or overflowing position",
            )
        })?;
        *cursor = target;
        Ok(target)
    }
}

impl Read for InMemoryBackend {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (&*self).read(buf)
    }
}

impl Write for InMemoryBackend {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (&*self).write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for InMemoryBackend {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        (&*self).seek(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MAX_OFFSET;
    use proptest::prelude::*;
    use std::sync::Arc;
    use std::thread;

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 7 % 251) as u8).collect()
    }

    #[test]
    fn memory_new_is_empty() {
        let stream = InMemoryBackend::new();
        assert_eq!(stream.size().unwrap(), 0);
        assert_eq!(stream.read_at(0, None).unwrap(), None);
        assert_eq!(stream.read_at(0, Some(0)).unwrap(), Some(Vec::new()));
    }

    #[test]
    fn memory_zero_length_is_empty_past_end() {
        let stream = InMemoryBackend::with_data(b"hello".to_vec());
        assert_eq!(stream.read_at(5, Some(0)).unwrap(), Some(Vec::new()));
        assert_eq!(stream.read_at(1_000, Some(0)).unwrap(), Some(Vec::new()));
    }

    #[test]
    fn memory_at_end_is_no_data() {
        let stream = InMemoryBackend::with_data(b"hello".to_vec());
        assert_eq!(stream.read_at(5, None).unwrap(), None);
        assert_eq!(stream.read_at(5, Some(1)).unwrap(), None);
        assert_eq!(stream.read_at(5, Some(99_999_999)).unwrap(), None);
        assert_eq!(stream.read_at(u64::MAX, Some(1)).unwrap(), None);
    }

    #[test]
    fn memory_short_read_near_end() {
        let stream = InMemoryBackend::with_data(b"hello world".to_vec());
        assert_eq!(stream.read_at(6, Some(100)).unwrap().unwrap(), b"world");
        assert_eq!(stream.read_at(6, None).unwrap().unwrap(), b"world");
        assert_eq!(stream.read_at(0, Some(5)).unwrap().unwrap(), b"hello");
    }

    #[test]
    fn memory_dest_buffer_is_resized() {
        let stream = InMemoryBackend::with_data(b"hello world".to_vec());
        let mut dest = vec![0xAA; 200];

        assert_eq!(stream.read_at_into(6, Some(3), &mut dest).unwrap(), Some(3));
        assert_eq!(dest, b"wor");

        assert_eq!(stream.read_at_into(0, Some(0), &mut dest).unwrap(), Some(0));
        assert!(dest.is_empty());

        dest.extend_from_slice(b"stale");
        assert_eq!(stream.read_at_into(11, None, &mut dest).unwrap(), None);
        assert!(dest.is_empty());
    }

    #[test]
    fn memory_write_overwrites_in_place() {
        let stream = InMemoryBackend::with_data(b"hello world".to_vec());
        assert_eq!(stream.write_at(0, b"HELLO").unwrap(), 5);
        assert_eq!(stream.data(), b"HELLO world");
        assert_eq!(stream.size().unwrap(), 11);
    }

    #[test]
    fn memory_write_past_end_zero_fills() {
        let stream = InMemoryBackend::with_data(b"abc".to_vec());
        assert_eq!(stream.write_at(6, b"xyz").unwrap(), 3);
        assert_eq!(stream.size().unwrap(), 9);
        assert_eq!(stream.read_at(3, Some(3)).unwrap().unwrap(), [0, 0, 0]);
        assert_eq!(stream.read_at(6, None).unwrap().unwrap(), b"xyz");
    }

    #[test]
    fn memory_empty_write_is_noop() {
        let stream = InMemoryBackend::with_data(b"abc".to_vec());
        assert_eq!(stream.write_at(100, b"").unwrap(), 0);
        assert_eq!(stream.size().unwrap(), 3);
    }

    #[test]
    fn memory_write_beyond_max_offset_fails() {
        let stream = InMemoryBackend::new();
        let result = stream.write_at(MAX_OFFSET, b"x");
        assert!(matches!(result, Err(PosError::InvalidArgument { .. })));
        assert_eq!(stream.size().unwrap(), 0);
    }

    #[test]
    fn memory_read_from_end() {
        let stream = InMemoryBackend::with_data(b"hello world".to_vec());
        assert_eq!(stream.read_from_end(5, None).unwrap().unwrap(), b"world");
        assert_eq!(stream.read_from_end(11, Some(5)).unwrap().unwrap(), b"hello");
        assert_eq!(stream.read_from_end(0, None).unwrap(), None);
        assert!(matches!(
            stream.read_from_end(12, None),
            Err(PosError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn memory_closed_directions_are_rejected() {
        let stream = InMemoryBackend::with_data(b"data".to_vec());

        stream.close_write();
        assert!(!stream.is_writable());
        assert!(matches!(stream.write_at(0, b"x"), Err(PosError::NotWritable)));
        assert!(matches!(stream.write_at(10, b""), Err(PosError::NotWritable)));
        assert_eq!(stream.read_at(0, None).unwrap().unwrap(), b"data");

        stream.close_read();
        assert!(!stream.is_readable());
        assert!(matches!(stream.read_at(0, None), Err(PosError::NotReadable)));
        assert!(matches!(stream.read_at(0, Some(0)), Err(PosError::NotReadable)));
        assert!(matches!(stream.read_from_end(1, None), Err(PosError::NotReadable)));
    }

    #[test]
    fn memory_positional_ops_leave_cursor() {
        let mut stream = InMemoryBackend::with_data(b"hello world".to_vec());
        stream.seek(SeekFrom::Start(3)).unwrap();

        stream.read_at(0, None).unwrap();
        stream.write_at(20, b"tail").unwrap();
        stream.read_from_end(4, None).unwrap();
        assert_eq!(stream.position(), 3);

        let mut buf = [0u8; 4];
        stream.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"lo w");
        assert_eq!(stream.position(), 7);
    }

    #[test]
    fn memory_sequential_write_past_end_zero_fills() {
        let mut stream = InMemoryBackend::with_data(b"ab".to_vec());
        stream.seek(SeekFrom::End(2)).unwrap();
        stream.write_all(b"cd").unwrap();
        assert_eq!(stream.data(), b"ab\0\0cd");
        assert_eq!(stream.position(), 6);
    }

    #[test]
    fn memory_seek_before_start_fails() {
        let mut stream = InMemoryBackend::with_data(b"ab".to_vec());
        assert!(stream.seek(SeekFrom::Current(-1)).is_err());
        assert_eq!(stream.seek(SeekFrom::End(-2)).unwrap(), 0);
    }

    #[test]
    fn memory_concurrent_reads_agree() {
        let content = pattern(64 * 1024);
        let stream = Arc::new(InMemoryBackend::with_data(content.clone()));
        let expected = content[100..200].to_vec();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let stream = Arc::clone(&stream);
                let expected = expected.clone();
                thread::spawn(move || {
                    for _ in 0..500 {
                        assert_eq!(stream.read_at(100, Some(100)).unwrap().unwrap(), expected);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("Thread panicked");
        }
    }

    #[test]
    fn memory_concurrent_writes_are_not_torn() {
        let stream = Arc::new(InMemoryBackend::with_data(vec![0; 4096]));

        let handles: Vec<_> = (1..=4u8)
            .map(|fill| {
                let stream = Arc::clone(&stream);
                thread::spawn(move || {
                    let block = vec![fill; 4096];
                    for _ in 0..200 {
                        stream.write_at(0, &block).unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("Thread panicked");
        }

        let data = stream.data();
        assert!(data.iter().all(|&b| b == data[0]), "write was torn");
    }

    proptest! {
        #[test]
        fn memory_write_then_read_round_trips(
            initial in prop::collection::vec(any::<u8>(), 0..512),
            offset in 0u64..1024,
            data in prop::collection::vec(any::<u8>(), 0..256),
        ) {
            let stream = InMemoryBackend::with_data(initial.clone());
            prop_assert_eq!(stream.write_at(offset, &data).unwrap(), data.len());

            let read = stream.read_at(offset, Some(data.len() as u64)).unwrap();
            if data.is_empty() {
                prop_assert_eq!(read, Some(Vec::new()));
            } else {
                prop_assert_eq!(read, Some(data.clone()));
            }

            let expected_size = if data.is_empty() {
                initial.len() as u64
            } else {
                (initial.len() as u64).max(offset + data.len() as u64)
            };
            prop_assert_eq!(stream.size().unwrap(), expected_size);

            if !data.is_empty() && offset > initial.len() as u64 {
                let gap = stream
                    .read_at(initial.len() as u64, Some(offset - initial.len() as u64))
                    .unwrap()
                    .unwrap();
                prop_assert!(gap.iter().all(|&b| b == 0));
            }
        }

        #[test]
        fn memory_read_matches_slice(
            content in prop::collection::vec(any::<u8>(), 1..512),
            offset in 0u64..600,
            length in prop::option::of(0u64..600),
        ) {
            let stream = InMemoryBackend::with_data(content.clone());
            let read = stream.read_at(offset, length).unwrap();
            let size = content.len() as u64;

            match length {
                Some(0) => prop_assert_eq!(read, Some(Vec::new())),
                _ if offset >= size => prop_assert_eq!(read, None),
                _ => {
                    let end = length.map_or(size, |n| (offset + n).min(size));
                    prop_assert_eq!(read, Some(content[offset as usize..end as usize].to_vec()));
                }
            }
        }
    }
}
