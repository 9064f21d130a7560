//! Stress tests for positional backends.
//!
//! These drive one handle from many threads and count results that differ
//! from what the store held when the call was made.

use posio::PositionalIo;
use std::io::Read;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Operations that returned the expected bytes.
    pub successful_ops: usize,
    /// Operations that failed or returned torn data.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        let total = successful + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            duration,
            ops_per_second,
        }
    }

    /// Prints a summary of the test.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Total operations: {}", self.total_ops);
        println!("Successful: {}", self.successful_ops);
        println!("Failed: {}", self.failed_ops);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ops/sec", self.ops_per_second);
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Operations per thread.
    pub operations: usize,
    /// Number of concurrent threads.
    pub threads: usize,
    /// Bytes per read or write.
    pub block_size: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 1_000,
            threads: 8,
            block_size: 100,
        }
    }
}

#[derive(Default)]
struct Tally {
    successful: AtomicUsize,
    failed: AtomicUsize,
}

impl Tally {
    fn record(&self, ok: bool) {
        let counter = if ok { &self.successful } else { &self.failed };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn finish(&self, start: Instant) -> StressTestResult {
        StressTestResult::new(
            self.successful.load(Ordering::Relaxed),
            self.failed.load(Ordering::Relaxed),
            start.elapsed(),
        )
    }
}

/// Many threads read the same static region; every result must be identical.
///
/// The store must hold at least `offset + block_size` bytes that nobody
/// writes during the run.
pub fn stress_identical_reads<S>(store: Arc<S>, offset: u64, config: &StressConfig) -> StressTestResult
where
    S: PositionalIo + ?Sized + 'static,
{
    let expected = store
        .read_at(offset, Some(config.block_size as u64))
        .ok()
        .flatten();
    let tally = Arc::new(Tally::default());
    let start = Instant::now();

    let handles: Vec<_> = (0..config.threads)
        .map(|_| {
            let store = Arc::clone(&store);
            let tally = Arc::clone(&tally);
            let expected = expected.clone();
            let (ops, len) = (config.operations, config.block_size as u64);

            thread::spawn(move || {
                let mut dest = Vec::new();
                for i in 0..ops {
                    // Alternate between fresh and reused buffers.
                    let ok = if i % 2 == 0 {
                        store.read_at(offset, Some(len)).ok() == Some(expected.clone())
                    } else {
                        match store.read_at_into(offset, Some(len), &mut dest) {
                            Ok(Some(_)) => expected.as_deref() == Some(dest.as_slice()),
                            Ok(None) => expected.is_none(),
                            Err(_) => false,
                        }
                    };
                    tally.record(ok);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    tally.finish(start)
}

/// Each thread owns a stripe of blocks and writes them concurrently; the
/// store must afterwards hold every thread's bytes in its own stripes.
///
/// Block `k` is written by thread `k % threads` at `k * block_size`.
pub fn stress_disjoint_writes<S>(store: Arc<S>, config: &StressConfig) -> StressTestResult
where
    S: PositionalIo + ?Sized + 'static,
{
    let tally = Arc::new(Tally::default());
    let start = Instant::now();
    let block = config.block_size;

    let handles: Vec<_> = (0..config.threads)
        .map(|t| {
            let store = Arc::clone(&store);
            let tally = Arc::clone(&tally);
            let (ops, threads) = (config.operations, config.threads);

            thread::spawn(move || {
                let fill = vec![stripe_byte(t); block];
                for i in 0..ops {
                    let k = i * threads + t;
                    let ok = store.write_at((k * block) as u64, &fill).ok() == Some(block);
                    tally.record(ok);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    let mut result = tally.finish(start);
    let blocks = config.operations * config.threads;
    let content = store.read_at(0, None).ok().flatten().unwrap_or_default();
    if content.len() != blocks * block {
        result.failed_ops += 1;
    }
    for (k, chunk) in content.chunks(block).enumerate() {
        let owner = stripe_byte(k % config.threads);
        if chunk.iter().any(|&b| b != owner) {
            result.failed_ops += 1;
        }
    }
    result
}

fn stripe_byte(thread: usize) -> u8 {
    (thread % 255) as u8 + 1
}

/// Each thread repeatedly writes one block of its own byte at the same
/// offset while others read it back. With atomic calls no read may see a
/// mixture of two threads' bytes.
pub fn stress_overlapping_writes<S>(store: Arc<S>, config: &StressConfig) -> StressTestResult
where
    S: PositionalIo + ?Sized + 'static,
{
    let block = config.block_size;
    let seeded = store.write_at(0, &vec![stripe_byte(0); block]).ok() == Some(block);
    let tally = Arc::new(Tally::default());
    tally.record(seeded);
    let start = Instant::now();

    let handles: Vec<_> = (0..config.threads)
        .map(|t| {
            let store = Arc::clone(&store);
            let tally = Arc::clone(&tally);
            let ops = config.operations;

            thread::spawn(move || {
                let fill = vec![stripe_byte(t); block];
                for _ in 0..ops {
                    let ok = if t % 2 == 0 {
                        store.write_at(0, &fill).ok() == Some(block)
                    } else {
                        match store.read_at(0, Some(block as u64)) {
                            Ok(Some(data)) => {
                                data.len() == block && data.iter().all(|&b| b == data[0])
                            }
                            _ => false,
                        }
                    };
                    tally.record(ok);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    tally.finish(start)
}

/// Positional readers run while the main thread reads the whole store
/// sequentially through its cursor; the sequential copy must be exact.
///
/// Counts one operation per positional read plus one for the final
/// comparison.
pub fn stress_cursor_with_positional<S>(store: Arc<S>, config: &StressConfig) -> StressTestResult
where
    S: PositionalIo + 'static,
    for<'a> &'a S: Read,
{
    let expected = store.read_at(0, None).ok().flatten().unwrap_or_default();
    let size = expected.len().max(1) as u64;
    let tally = Arc::new(Tally::default());
    let start = Instant::now();

    let handles: Vec<_> = (0..config.threads)
        .map(|t| {
            let store = Arc::clone(&store);
            let tally = Arc::clone(&tally);
            let (ops, len) = (config.operations, config.block_size as u64);

            thread::spawn(move || {
                for i in 0..ops as u64 {
                    let offset = (t as u64 * 7919 + i * 104_729) % size;
                    tally.record(store.read_at(offset, Some(len)).is_ok());
                }
            })
        })
        .collect();

    let mut sequential = Vec::with_capacity(expected.len());
    let mut chunk = vec![0u8; config.block_size.max(1)];
    let mut reader = &*store;
    let copied = loop {
        match reader.read(&mut chunk) {
            Ok(0) => break true,
            Ok(n) => sequential.extend_from_slice(&chunk[..n]),
            Err(_) => break false,
        }
    };

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    tally.record(copied && sequential == expected);
    tally.finish(start)
}
