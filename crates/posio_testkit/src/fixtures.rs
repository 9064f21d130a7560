//! Test fixtures and handle helpers.
//!
//! Provides the shuffled source content used by the contract suites and a
//! [`TestHandle`] that wraps any backend kind behind one type.

use posio::{FileBackend, FileConfig, InMemoryBackend, IoStrategy, PosResult, PositionalIo};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Length of [`shuffled_source`]: every byte value, 257 times over.
pub const SOURCE_LEN: usize = 256 * 257;

/// Every byte value `0..=255` repeated 257 times, shuffled with `seed`.
pub fn shuffled_source(seed: u64) -> Vec<u8> {
    let mut bytes: Vec<u8> = (0..257).flat_map(|_| 0..=255u8).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    bytes.shuffle(&mut rng);
    bytes
}

/// Which backend a [`TestHandle`] is built on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// [`InMemoryBackend`].
    Memory,
    /// [`FileBackend`] with the platform's preferred strategy.
    File,
    /// [`FileBackend`] forced to the locked seek/restore strategy.
    EmulatedFile,
}

impl BackendKind {
    /// All kinds, for running a suite against every backend.
    pub const ALL: [Self; 3] = [Self::Memory, Self::File, Self::EmulatedFile];

    fn strategy(self) -> IoStrategy {
        match self {
            Self::EmulatedFile => IoStrategy::Emulated,
            Self::Memory | Self::File => IoStrategy::Auto,
        }
    }
}

/// A file-backed handle in a temporary directory, removed on drop.
pub struct TestFile {
    /// The backend under test.
    pub backend: FileBackend,
    path: PathBuf,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: TempDir,
}

impl TestFile {
    /// Creates a temporary file holding `content`, cursor at zero.
    pub fn new(content: &[u8], strategy: IoStrategy) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("positional.bin");

        let mut file = create_file(&path).expect("Failed to create test file");
        file.write_all(content).expect("Failed to write test content");
        file.flush().expect("Failed to flush test content");
        file.seek(SeekFrom::Start(0)).expect("Failed to rewind test file");

        let backend = FileBackend::with_config(file, FileConfig::new().strategy(strategy))
            .expect("Failed to wrap test file");

        Self {
            backend,
            path,
            _temp_dir: temp_dir,
        }
    }

    /// Returns the path of the temporary file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Opens a second, independent handle on the same file.
    pub fn reopen(&self, strategy: IoStrategy) -> FileBackend {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.path)
            .expect("Failed to reopen test file");
        FileBackend::with_config(file, FileConfig::new().strategy(strategy))
            .expect("Failed to wrap reopened file")
    }
}

impl std::ops::Deref for TestFile {
    type Target = FileBackend;

    fn deref(&self) -> &Self::Target {
        &self.backend
    }
}

fn create_file(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

/// Any backend, plus access to its ordinary cursor.
pub enum TestHandle {
    /// In-memory stream.
    Memory(InMemoryBackend),
    /// Temporary file.
    File(TestFile),
}

impl TestHandle {
    /// Creates a handle of the given kind holding `content`, cursor at zero.
    pub fn new(kind: BackendKind, content: &[u8]) -> Self {
        match kind {
            BackendKind::Memory => Self::Memory(InMemoryBackend::with_data(content.to_vec())),
            BackendKind::File | BackendKind::EmulatedFile => {
                Self::File(TestFile::new(content, kind.strategy()))
            }
        }
    }

    /// Returns the ordinary cursor position.
    pub fn cursor(&self) -> u64 {
        let mut this = self;
        this.stream_position().expect("Failed to query cursor")
    }

    /// Moves the ordinary cursor.
    pub fn set_cursor(&self, pos: u64) {
        let mut this = self;
        this.seek(SeekFrom::Start(pos)).expect("Failed to move cursor");
    }

    /// Reads up to `len` bytes sequentially from the cursor, as `read` would.
    pub fn read_sequential(&self, len: usize) -> Vec<u8> {
        let this = self;
        let mut out = Vec::with_capacity(len.min(1 << 20));
        this.take(len as u64)
            .read_to_end(&mut out)
            .expect("Failed to read sequentially");
        out
    }
}

impl PositionalIo for TestHandle {
    fn read_at_into(
        &self,
        offset: u64,
        length: Option<u64>,
        dest: &mut Vec<u8>,
    ) -> PosResult<Option<usize>> {
        match self {
            Self::Memory(m) => m.read_at_into(offset, length, dest),
            Self::File(f) => f.backend.read_at_into(offset, length, dest),
        }
    }

    fn write_at(&self, offset: u64, data: &[u8]) -> PosResult<usize> {
        match self {
            Self::Memory(m) => m.write_at(offset, data),
            Self::File(f) => f.backend.write_at(offset, data),
        }
    }

    fn size(&self) -> PosResult<u64> {
        match self {
            Self::Memory(m) => m.size(),
            Self::File(f) => f.backend.size(),
        }
    }

    fn read_from_end(&self, back: u64, length: Option<u64>) -> PosResult<Option<Vec<u8>>> {
        match self {
            Self::Memory(m) => m.read_from_end(back, length),
            Self::File(f) => f.backend.read_from_end(back, length),
        }
    }
}

impl Read for &TestHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            TestHandle::Memory(m) => (&*m).read(buf),
            TestHandle::File(f) => (&f.backend).read(buf),
        }
    }
}

impl Seek for &TestHandle {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            TestHandle::Memory(m) => (&*m).seek(pos),
            TestHandle::File(f) => (&f.backend).seek(pos),
        }
    }
}

/// Runs `f` with a handle of each kind holding `content`.
pub fn with_each_backend<F>(content: &[u8], mut f: F)
where
    F: FnMut(BackendKind, &TestHandle),
{
    for kind in BackendKind::ALL {
        let handle = TestHandle::new(kind, content);
        f(kind, &handle);
    }
}
