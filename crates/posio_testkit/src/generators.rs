//! Property-based test generators using proptest.
//!
//! Provides strategies for offsets, lengths, content and whole sequences of
//! positional operations.

use crate::model::ShadowStore;
use posio::{PosResult, PositionalIo};
use proptest::prelude::*;

/// Strategy for store content.
pub fn content_strategy(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..max_len)
}

/// Strategy for offsets, biased towards small values and the store end.
pub fn offset_strategy(max: u64) -> impl Strategy<Value = u64> {
    prop_oneof![
        4 => 0..max.max(1),
        1 => Just(0u64),
        1 => Just(max),
        1 => max..max.saturating_mul(2).saturating_add(1),
    ]
}

/// Strategy for read lengths, including `None` and `Some(0)`.
pub fn length_strategy(max: u64) -> impl Strategy<Value = Option<u64>> {
    prop_oneof![
        4 => (1..max.max(2)).prop_map(Some),
        1 => Just(Some(0u64)),
        2 => Just(None),
        1 => Just(Some(99_999_999u64)),
    ]
}

/// One positional operation.
#[derive(Debug, Clone)]
pub enum PositionalOp {
    /// `read_at(offset, length)`.
    Read {
        /// Read offset.
        offset: u64,
        /// Requested length.
        length: Option<u64>,
    },
    /// `read_at_into` with a pre-filled buffer.
    ReadInto {
        /// Read offset.
        offset: u64,
        /// Requested length.
        length: Option<u64>,
        /// Initial buffer contents.
        stale: Vec<u8>,
    },
    /// `write_at(offset, data)`.
    Write {
        /// Write offset.
        offset: u64,
        /// Bytes to write.
        data: Vec<u8>,
    },
    /// `read_from_end(back, length)`.
    ReadFromEnd {
        /// Distance back from the end.
        back: u64,
        /// Requested length.
        length: Option<u64>,
    },
}

/// Strategy for a single operation against stores of up to `max_offset` bytes.
pub fn positional_op_strategy(max_offset: u64) -> impl Strategy<Value = PositionalOp> {
    prop_oneof![
        3 => (offset_strategy(max_offset), length_strategy(max_offset))
            .prop_map(|(offset, length)| PositionalOp::Read { offset, length }),
        1 => (
            offset_strategy(max_offset),
            length_strategy(max_offset),
            prop::collection::vec(any::<u8>(), 0..64),
        )
            .prop_map(|(offset, length, stale)| PositionalOp::ReadInto { offset, length, stale }),
        3 => (offset_strategy(max_offset), prop::collection::vec(any::<u8>(), 0..128))
            .prop_map(|(offset, data)| PositionalOp::Write { offset, data }),
        1 => (0..max_offset.max(1), length_strategy(max_offset))
            .prop_map(|(back, length)| PositionalOp::ReadFromEnd { back, length }),
    ]
}

/// Strategy for a sequence of operations.
pub fn op_sequence_strategy(
    max_offset: u64,
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<PositionalOp>> {
    prop::collection::vec(positional_op_strategy(max_offset), min_ops..max_ops)
}

impl PositionalOp {
    /// Applies the operation to `store` and `model`, returning an error
    /// message if their observable results differ.
    pub fn check<S: PositionalIo + ?Sized>(
        &self,
        store: &S,
        model: &mut ShadowStore,
    ) -> Result<(), String> {
        match self {
            Self::Read { offset, length } => {
                let actual = store.read_at(*offset, *length);
                compare(self, actual, model.read_at(*offset, *length))
            }
            Self::ReadInto {
                offset,
                length,
                stale,
            } => {
                let mut dest = stale.clone();
                let expected = model.read_at(*offset, *length);
                let read = store
                    .read_at_into(*offset, *length, &mut dest)
                    .map_err(|e| format!("{self:?}: {e}"))?;
                if read != expected.as_ref().map(Vec::len) {
                    return Err(format!("{self:?}: count {read:?}"));
                }
                if dest != expected.unwrap_or_default() {
                    return Err(format!("{self:?}: buffer holds {} bytes", dest.len()));
                }
                Ok(())
            }
            Self::Write { offset, data } => {
                let written = store
                    .write_at(*offset, data)
                    .map_err(|e| format!("{self:?}: {e}"))?;
                if written != model.write_at(*offset, data) {
                    return Err(format!("{self:?}: wrote {written}"));
                }
                let size = store.size().map_err(|e| format!("{self:?}: {e}"))?;
                if size != model.len() {
                    return Err(format!("{self:?}: size {size}, model {}", model.len()));
                }
                Ok(())
            }
            Self::ReadFromEnd { back, length } => {
                let actual = store.read_from_end(*back, *length);
                match model.read_from_end(*back, *length) {
                    Some(expected) => compare(self, actual, expected),
                    None if actual.is_err() => Ok(()),
                    None => Err(format!("{self:?}: expected an error")),
                }
            }
        }
    }
}

fn compare(
    op: &PositionalOp,
    actual: PosResult<Option<Vec<u8>>>,
    expected: Option<Vec<u8>>,
) -> Result<(), String> {
    match actual {
        Ok(actual) if actual == expected => Ok(()),
        Ok(actual) => Err(format!(
            "{op:?}: got {:?} bytes, expected {:?}",
            actual.map(|v| v.len()),
            expected.map(|v| v.len())
        )),
        Err(e) => Err(format!("{op:?}: {e}")),
    }
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests (file-backed suites).
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
