//! Contract suites runnable against any backend.
//!
//! Each `check_*` function panics with a descriptive message on the first
//! deviation, so it can be called straight from a `#[test]`.

use crate::fixtures::TestHandle;
use crate::model::ShadowStore;
use posio::PositionalIo;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::ops::Range;

/// Tail written 100 bytes past the end by [`check_literal_writes`].
pub const LITERAL_TAIL: &[u8] =
    b"guiuydrtfv nm,j;lkjchxdgxehtrjyukli,mnbvgdshbjt\n\r\r\n\0liu;79pfy7kt7lofvol";

/// A read whose outcome is fixed by the policy table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expected {
    /// An empty buffer.
    Empty,
    /// No data at the offset.
    NoData,
    /// These bytes of the source.
    Slice(Range<usize>),
}

/// One row of the read policy table.
#[derive(Debug, Clone)]
pub struct ReadCase {
    /// Read offset.
    pub offset: u64,
    /// Requested length.
    pub length: Option<u64>,
    /// Whether to read into a pre-filled caller buffer.
    pub with_buffer: bool,
    /// Required outcome.
    pub expected: Expected,
    /// What the row checks.
    pub label: &'static str,
}

/// Builds the read policy table for a source of `len` bytes.
pub fn read_cases(len: usize) -> Vec<ReadCase> {
    let end = len as u64;
    let half = len / 2;
    let rows = [
        (0, Some(0), Expected::Empty, "zero length at start is empty"),
        (end, Some(0), Expected::Empty, "zero length at end is empty"),
        (end, None, Expected::NoData, "read to end at end is no data"),
        (end, Some(99_999_999), Expected::NoData, "oversized read at end is no data"),
        (0, None, Expected::Slice(0..len), "full read from start"),
        (0, Some(end), Expected::Slice(0..len), "exact length read from start"),
        (
            half as u64,
            Some(half as u64),
            Expected::Slice(half..half * 2),
            "fixed length read from middle",
        ),
        (
            half as u64,
            Some(end * 4),
            Expected::Slice(half..len),
            "short read from middle",
        ),
    ];

    [false, true]
        .into_iter()
        .flat_map(|with_buffer| {
            rows.iter()
                .cloned()
                .map(move |(offset, length, expected, label)| ReadCase {
                    offset,
                    length,
                    with_buffer,
                    expected,
                    label,
                })
        })
        .collect()
}

fn random_bytes(rng: &mut StdRng, len: usize) -> Vec<u8> {
    (0..len).map(|_| rng.gen()).collect()
}

/// Runs the read policy table against `store`, which must hold `source`.
pub fn check_read_table<S: PositionalIo + ?Sized>(store: &S, source: &[u8], seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);

    for case in read_cases(source.len()) {
        let expected = match &case.expected {
            Expected::Empty => Some(Vec::new()),
            Expected::NoData => None,
            Expected::Slice(range) => Some(source[range.clone()].to_vec()),
        };

        let actual = if case.with_buffer {
            let mut dest = random_bytes(&mut rng, 200);
            let read = store
                .read_at_into(case.offset, case.length, &mut dest)
                .expect("read_at_into failed");
            assert_eq!(read, expected.as_ref().map(Vec::len), "{}: count", case.label);
            assert_eq!(Some(dest.len()), read.or(Some(0)), "{}: stale buffer bytes", case.label);
            read.map(|_| dest)
        } else {
            store
                .read_at(case.offset, case.length)
                .expect("read_at failed")
        };

        assert!(
            actual == expected,
            "{} (offset {}, length {:?}, buffer {})",
            case.label,
            case.offset,
            case.length,
            case.with_buffer
        );
    }
}

/// Checks that `Some(0)` is empty at, past and far past the end.
pub fn check_zero_length_everywhere<S: PositionalIo + ?Sized>(store: &S) {
    let size = store.size().expect("size");
    for offset in [0, size / 2, size, size + 1, size + 1_000_000, u64::MAX] {
        assert_eq!(
            store.read_at(offset, Some(0)).expect("read_at failed"),
            Some(Vec::new()),
            "zero length read at {offset}"
        );
    }
}

/// Compares random positional reads with seek + sequential read.
///
/// `handle` must hold `source`. The cursor must end where the sequential
/// reads left it, proving the positional reads did not move it.
pub fn check_random_reads(handle: &TestHandle, source: &[u8], rounds: usize, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let len = source.len();

    for _ in 0..rounds {
        let size = rng.gen_range(0..len * 2);
        let pos = rng.gen_range(0..len);
        let expected = &source[pos..(pos + size).min(len)];

        handle.set_cursor(pos as u64);
        let sequential = handle.read_sequential(size);
        let positional = handle
            .read_at(pos as u64, Some(size as u64))
            .expect("read_at failed")
            .expect("data is available below the end");
        assert!(sequential == positional, "seek+read mismatch (pos={pos}, size={size})");
        assert!(positional == expected, "source mismatch (pos={pos}, size={size})");
        assert_eq!(handle.cursor(), (pos + sequential.len()) as u64, "cursor moved");

        let mut dest = Vec::new();
        handle
            .read_at_into(pos as u64, Some(size as u64), &mut dest)
            .expect("read_at_into failed");
        assert!(dest == expected, "buffered read mismatch (pos={pos}, size={size})");
    }
}

/// Writes the fixed overwrite/extend scenario and checks the result.
///
/// `shadow` must model `store` on entry and is kept in step.
pub fn check_literal_writes<S: PositionalIo + ?Sized>(store: &S, shadow: &mut ShadowStore) {
    let tail_offset = shadow.len() + 100;
    let writes: [(u64, &[u8]); 3] = [
        (0, b"HERGFDGFHMFDNGF"),
        (10, b"fsdghjljlkjhtgrfegvhjmg"),
        (tail_offset, LITERAL_TAIL),
    ];

    for (offset, data) in writes {
        let old_len = shadow.len();
        assert_eq!(
            store.write_at(offset, data).expect("write_at failed"),
            data.len(),
            "write count at {offset}"
        );
        shadow.write_at(offset, data);
        shadow.assert_matches(store);

        if offset > old_len {
            let gap = store
                .read_at(old_len, Some(offset - old_len))
                .expect("gap read failed")
                .expect("gap is below the end");
            assert_eq!(gap.len() as u64, offset - old_len, "gap length");
            assert!(gap.iter().all(|&b| b == 0), "gap is not zero-filled");
        }
    }

    let full = store
        .read_at(0, None)
        .expect("full read failed")
        .expect("store is not empty");
    assert_eq!(full.len() as u64, tail_offset + LITERAL_TAIL.len() as u64);
}

/// Writes shuffled 256-byte blocks at random offsets up to 16 KiB past the
/// end, checking the whole store against `shadow` after each.
pub fn check_random_writes<S: PositionalIo + ?Sized>(
    store: &S,
    shadow: &mut ShadowStore,
    rounds: usize,
    seed: u64,
) {
    let mut rng = StdRng::seed_from_u64(seed);

    for _ in 0..rounds {
        let pos = rng.gen_range(0..shadow.len() + 16_384);
        let mut block: Vec<u8> = (0..=255u8).collect();
        block.shuffle(&mut rng);

        assert_eq!(store.write_at(pos, &block).expect("write_at failed"), 256);
        shadow.write_at(pos, &block);
        shadow.assert_matches(store);
    }
}

/// Checks that no positional call moves the ordinary cursor.
pub fn check_cursor_isolation(handle: &TestHandle) {
    let size = handle.size().expect("size");
    let start = size / 3;
    handle.set_cursor(start);

    handle.read_at(0, None).expect("read_at failed");
    handle.read_at(size, Some(10)).expect("read_at failed");
    handle.read_at(start + 1, Some(0)).expect("read_at failed");
    handle.write_at(size + 50, b"beyond").expect("write_at failed");
    handle.write_at(start, b"here").expect("write_at failed");
    handle.read_from_end(6, None).expect("read_from_end failed");
    let mut dest = vec![1, 2, 3];
    handle
        .read_at_into(1, Some(5), &mut dest)
        .expect("read_at_into failed");

    assert_eq!(handle.cursor(), start, "positional calls moved the cursor");
    assert_eq!(handle.read_sequential(4), b"here", "sequential read after positional calls");
}

/// Checks [`PositionalIo::read_from_end`] against `shadow`.
pub fn check_read_from_end<S: PositionalIo + ?Sized>(store: &S, shadow: &ShadowStore) {
    let len = shadow.len();
    for (back, length) in [
        (0, None),
        (0, Some(0)),
        (1, None),
        (len / 2, Some(16)),
        (len, None),
        (len, Some(3)),
    ] {
        let expected = shadow.read_from_end(back, length).expect("in range");
        let actual = store.read_from_end(back, length).expect("read_from_end failed");
        assert!(actual == expected, "read_from_end(back={back}, length={length:?})");
    }

    assert!(
        store.read_from_end(len + 1, None).is_err(),
        "reading before the start must fail"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use posio::InMemoryBackend;

    #[test]
    fn read_table_covers_both_buffer_modes() {
        let cases = read_cases(100);
        assert_eq!(cases.len(), 16);
        assert_eq!(cases.iter().filter(|c| c.with_buffer).count(), 8);
    }

    #[test]
    fn read_table_passes_on_memory() {
        let source: Vec<u8> = (0..=255).collect();
        let store = InMemoryBackend::with_data(source.clone());
        check_read_table(&store, &source, 1);
    }

    #[test]
    fn literal_tail_has_expected_length() {
        assert_eq!(LITERAL_TAIL.len(), 71);
    }
}
