//! Reference model of the positional contract.
//!
//! [`ShadowStore`] tracks the bytes a handle should hold and answers reads
//! with a straightforward, independently written rendition of the policy.

use posio::PositionalIo;

/// Expected content of a store under test.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShadowStore {
    content: Vec<u8>,
}

impl ShadowStore {
    /// Creates a model holding `content`.
    pub fn new(content: Vec<u8>) -> Self {
        Self { content }
    }

    /// Returns the modelled bytes.
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Returns the modelled size.
    pub fn len(&self) -> u64 {
        self.content.len() as u64
    }

    /// Returns `true` if the model holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Applies a positional write: pad with zeros up to `offset`, then overwrite.
    pub fn write_at(&mut self, offset: u64, data: &[u8]) -> usize {
        if data.is_empty() {
            return 0;
        }
        let offset = usize::try_from(offset).expect("model offset fits in memory");
        if self.content.len() < offset {
            self.content.resize(offset, 0);
        }
        let end = offset + data.len();
        if self.content.len() < end {
            self.content.resize(end, 0);
        }
        self.content[offset..end].copy_from_slice(data);
        data.len()
    }

    /// The result a positional read must produce.
    pub fn read_at(&self, offset: u64, length: Option<u64>) -> Option<Vec<u8>> {
        if length == Some(0) {
            return Some(Vec::new());
        }
        if offset >= self.len() {
            return None;
        }
        let start = offset as usize;
        let end = match length {
            Some(n) => start.saturating_add(n as usize).min(self.content.len()),
            None => self.content.len(),
        };
        Some(self.content[start..end].to_vec())
    }

    /// The result a read `back` bytes before the end must produce, or `None`
    /// if `back` is out of range and the call must fail.
    pub fn read_from_end(&self, back: u64, length: Option<u64>) -> Option<Option<Vec<u8>>> {
        let offset = self.len().checked_sub(back)?;
        Some(self.read_at(offset, length))
    }

    /// Asserts that `store` holds exactly the modelled bytes.
    pub fn assert_matches<S: PositionalIo + ?Sized>(&self, store: &S) {
        assert_eq!(store.size().expect("size"), self.len(), "store size differs from model");
        let actual = store.read_at(0, None).expect("full read");
        if self.is_empty() {
            assert_eq!(actual, None, "empty store must report no data");
        } else {
            assert!(
                actual.as_deref() == Some(self.content()),
                "store content differs from model"
            );
        }
    }
}
