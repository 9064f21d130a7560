//! File backend configuration.

/// Default chunk size for reads whose length is not given (1 MiB).
pub const DEFAULT_READ_CHUNK_SIZE: usize = 1024 * 1024;

/// How a [`FileBackend`](crate::FileBackend) performs positional I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IoStrategy {
    /// Use the native positional syscalls where the platform has them,
    /// otherwise fall back to [`IoStrategy::Emulated`].
    #[default]
    Auto,
    /// Always use the native positional syscalls (`pread`/`pwrite`).
    Native,
    /// Lock the handle, save the cursor, seek, do the I/O, restore the cursor.
    Emulated,
}

impl IoStrategy {
    /// Returns `true` if the platform provides atomic positional syscalls
    /// that leave the cursor untouched.
    #[must_use]
    pub const fn native_available() -> bool {
        cfg!(unix)
    }

    /// Resolves `Auto` to the concrete strategy for this platform.
    ///
    /// Returns `None` if the strategy cannot be used here.
    #[must_use]
    pub const fn resolve(self) -> Option<Self> {
        match self {
            Self::Auto if Self::native_available() => Some(Self::Native),
            Self::Auto => Some(Self::Emulated),
            Self::Native if Self::native_available() => Some(Self::Native),
            Self::Native => None,
            Self::Emulated => Some(Self::Emulated),
        }
    }
}

/// Configuration for wrapping a file in a [`FileBackend`](crate::FileBackend).
#[derive(Debug, Clone)]
pub struct FileConfig {
    /// Which positional I/O strategy to use.
    pub strategy: IoStrategy,

    /// Largest single read issued while reading to end of file.
    pub read_chunk_size: usize,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            strategy: IoStrategy::Auto,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
        }
    }
}

impl FileConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the positional I/O strategy.
    #[must_use]
    pub const fn strategy(mut self, strategy: IoStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the read chunk size. Zero is treated as one byte.
    #[must_use]
    pub const fn read_chunk_size(mut self, size: usize) -> Self {
        self.read_chunk_size = if size == 0 { 1 } else { size };
        self
    }
}
