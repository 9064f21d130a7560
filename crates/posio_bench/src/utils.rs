//! Benchmark utilities.

use posio::{FileBackend, FileConfig, IoStrategy, PositionalIo};
use rand::Rng;

/// Generate random data of the specified size.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// Generate `count` random offsets below `limit`.
pub fn random_offsets(count: usize, limit: u64) -> Vec<u64> {
    let mut rng = rand::thread_rng();
    (0..count).map(|_| rng.gen_range(0..limit.max(1))).collect()
}

/// Create an anonymous temporary file holding `size` random bytes.
pub fn seeded_file(size: usize, strategy: IoStrategy) -> FileBackend {
    let file = tempfile::tempfile().expect("Failed to create temp file");
    let backend = FileBackend::with_config(file, FileConfig::new().strategy(strategy))
        .expect("Failed to wrap temp file");
    if size > 0 {
        backend
            .write_at(0, &random_data(size))
            .expect("Failed to seed temp file");
    }
    backend
}
