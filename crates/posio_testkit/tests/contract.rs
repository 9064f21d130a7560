//! Contract tests run against every backend.

use posio::{FileBackend, FileConfig, InMemoryBackend, IoStrategy, PositionalIo};
use posio_testkit::prelude::*;
use proptest::prelude::*;
use std::sync::Arc;

const SEED: u64 = 0x5eed_0042;

fn file_backend(content: &[u8], strategy: IoStrategy) -> FileBackend {
    let file = tempfile::tempfile().expect("Failed to create temp file");
    let backend = FileBackend::with_config(file, FileConfig::new().strategy(strategy))
        .expect("Failed to wrap temp file");
    if !content.is_empty() {
        backend.write_at(0, content).expect("Failed to seed temp file");
    }
    backend
}

#[test]
fn read_policy_table() {
    let source = shuffled_source(SEED);
    with_each_backend(&source, |kind, handle| {
        check_read_table(handle, &source, SEED ^ kind as u64);
    });
}

#[test]
fn zero_length_reads_are_empty_everywhere() {
    let source = shuffled_source(SEED);
    with_each_backend(&source, |_, handle| check_zero_length_everywhere(handle));
    with_each_backend(b"", |_, handle| check_zero_length_everywhere(handle));
}

#[test]
fn random_reads_match_seek_and_read() {
    let source = shuffled_source(SEED);
    with_each_backend(&source, |kind, handle| {
        check_random_reads(handle, &source, 256, SEED + kind as u64);
    });
}

#[test]
fn literal_writes_extend_and_zero_fill() {
    let source = shuffled_source(SEED);
    with_each_backend(&source, |_, handle| {
        let mut shadow = ShadowStore::new(source.clone());
        check_literal_writes(handle, &mut shadow);
    });
}

#[test]
fn literal_writes_on_empty_store() {
    with_each_backend(b"", |_, handle| {
        let mut shadow = ShadowStore::default();
        check_literal_writes(handle, &mut shadow);
    });
}

#[test]
fn random_writes_match_model() {
    let source = shuffled_source(SEED);
    with_each_backend(&source, |kind, handle| {
        let mut shadow = ShadowStore::new(source.clone());
        check_random_writes(handle, &mut shadow, 256, SEED * 3 + kind as u64);
    });
}

#[test]
fn positional_calls_leave_cursor_alone() {
    let source = shuffled_source(SEED);
    with_each_backend(&source, |_, handle| check_cursor_isolation(handle));
}

#[test]
fn read_from_end_matches_model() {
    let source = shuffled_source(SEED);
    with_each_backend(&source, |_, handle| {
        check_read_from_end(handle, &ShadowStore::new(source.clone()));
    });
}

#[test]
fn independent_handles_share_file_content() {
    let file = TestFile::new(b"", IoStrategy::Auto);
    let other = file.reopen(IoStrategy::Emulated);

    file.write_at(4, b"left").unwrap();
    other.write_at(0, b"ab").unwrap();

    assert_eq!(file.read_at(0, None).unwrap().unwrap(), b"ab\0\0left");
    assert_eq!(other.size().unwrap(), 8);
}

fn stress_config() -> StressConfig {
    StressConfig {
        operations: 250,
        threads: 8,
        block_size: 128,
    }
}

#[test]
fn stress_identical_reads_all_backends() {
    let source = shuffled_source(SEED);
    let config = stress_config();

    let results = [
        stress_identical_reads(Arc::new(InMemoryBackend::with_data(source.clone())), 1000, &config),
        stress_identical_reads(Arc::new(file_backend(&source, IoStrategy::Auto)), 1000, &config),
        stress_identical_reads(Arc::new(file_backend(&source, IoStrategy::Emulated)), 1000, &config),
    ];
    for (name, result) in ["memory", "file", "emulated file"].iter().zip(&results) {
        result.print_summary(&format!("identical reads: {name}"));
        assert_eq!(result.failed_ops, 0, "{result:?}");
        assert_eq!(result.successful_ops, config.operations * config.threads);
    }
}

#[test]
fn stress_disjoint_writes_all_backends() {
    let config = stress_config();

    let stores: [Arc<dyn PositionalIo>; 3] = [
        Arc::new(InMemoryBackend::new()),
        Arc::new(file_backend(b"", IoStrategy::Auto)),
        Arc::new(file_backend(b"", IoStrategy::Emulated)),
    ];
    for store in stores {
        let result = stress_disjoint_writes(Arc::clone(&store), &config);
        result.print_summary("disjoint writes");
        assert_eq!(result.failed_ops, 0, "{result:?}");
        assert_eq!(
            store.size().unwrap(),
            (config.operations * config.threads * config.block_size) as u64
        );
    }
}

#[test]
fn stress_overlapping_writes_are_not_torn() {
    // Only the locking backends promise whole-call atomicity.
    let config = stress_config();

    let memory = stress_overlapping_writes(Arc::new(InMemoryBackend::new()), &config);
    memory.print_summary("overlapping writes: memory");
    assert_eq!(memory.failed_ops, 0, "{memory:?}");

    let emulated = stress_overlapping_writes(Arc::new(file_backend(b"", IoStrategy::Emulated)), &config);
    emulated.print_summary("overlapping writes: emulated file");
    assert_eq!(emulated.failed_ops, 0, "{emulated:?}");
}

#[test]
fn stress_sequential_reader_with_positional_readers() {
    let source = shuffled_source(SEED);
    let config = stress_config();

    let memory = stress_cursor_with_positional(Arc::new(InMemoryBackend::with_data(source.clone())), &config);
    assert_eq!(memory.failed_ops, 0, "{memory:?}");

    for strategy in [IoStrategy::Auto, IoStrategy::Emulated] {
        let store = Arc::new(file_backend(&source, strategy));
        assert_eq!(store.stream_position().unwrap(), 0);
        let result = stress_cursor_with_positional(store, &config);
        result.print_summary(&format!("sequential with positional: {strategy:?}"));
        assert_eq!(result.failed_ops, 0, "{strategy:?}: {result:?}");
    }
}

proptest! {
    #![proptest_config(PropTestConfig::quick().to_proptest_config())]

    #[test]
    fn file_matches_model(
        initial in content_strategy(256),
        ops in op_sequence_strategy(512, 1, 24),
    ) {
        for strategy in [IoStrategy::Auto, IoStrategy::Emulated] {
            let store = file_backend(&initial, strategy);
            let mut model = ShadowStore::new(initial.clone());

            for op in &ops {
                if let Err(message) = op.check(&store, &mut model) {
                    prop_assert!(false, "{:?}: {}", strategy, message);
                }
            }
            model.assert_matches(&store);
        }
    }
}
