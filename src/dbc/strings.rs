//! String block handling
//!
//! The string block is a run of null-separated strings at the end of a DBC
//! file. Records refer to strings by their byte offset inside the block.
//! Offset 0 is always the empty string, and every following entry starts one
//! byte after the end of the previous one.

use std::collections::{BTreeMap, HashMap};

use crate::error::{Error, Result};

/// Offset to string mapping of a DBC string block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringBlock {
    entries: BTreeMap<u32, String>,
}

impl Default for StringBlock {
    fn default() -> Self {
        Self::new()
    }
}

impl StringBlock {
    /// Block holding only the empty string at offset 0
    pub fn new() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(0, String::new());
        StringBlock { entries }
    }

    /// Split a raw block on null bytes, keeping each piece's byte offset
    pub fn from_bytes(blob: &[u8]) -> Self {
        Self::decode(blob).0
    }

    /// Like [`from_bytes`](Self::from_bytes), also returning the offsets of
    /// pieces that were not valid UTF-8 and got replaced lossily
    pub(crate) fn decode(blob: &[u8]) -> (Self, Vec<u32>) {
        let mut entries = BTreeMap::new();
        let mut lossy = Vec::new();
        let mut offset: u32 = 0;
        for piece in blob.split(|&b| b == 0) {
            let s = match std::str::from_utf8(piece) {
                Ok(s) => s.to_string(),
                Err(_) => {
                    lossy.push(offset);
                    String::from_utf8_lossy(piece).into_owned()
                }
            };
            entries.insert(offset, s);
            offset += piece.len() as u32 + 1;
        }
        (StringBlock { entries }, lossy)
    }

    pub fn get(&self, offset: u32) -> Option<&str> {
        self.entries.get(&offset).map(String::as_str)
    }

    /// Resolve an on-disk (signed) offset
    pub fn resolve(&self, offset: i32) -> Option<&str> {
        u32::try_from(offset).ok().and_then(|o| self.get(o))
    }

    /// Offset of a string; the lowest offset wins for duplicates
    pub fn offset_of(&self, value: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|(_, s)| s.as_str() == value)
            .map(|(&offset, _)| offset)
    }

    /// Reverse lookup table, lowest offset wins for duplicates
    pub(crate) fn offsets(&self) -> HashMap<&str, u32> {
        let mut map = HashMap::with_capacity(self.entries.len());
        for (&offset, s) in &self.entries {
            map.entry(s.as_str()).or_insert(offset);
        }
        map
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in ascending offset order
    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.entries.iter().map(|(&o, s)| (o, s.as_str()))
    }

    /// First offset past the last entry's terminator
    fn next_offset(&self) -> u32 {
        self.entries
            .iter()
            .next_back()
            .map(|(&o, s)| o + s.len() as u32 + 1)
            .unwrap_or(1)
    }

    /// Check that offset 0 is the empty string and offsets are back to back
    pub fn validate(&self) -> Result<()> {
        let mut iter = self.entries.iter();
        match iter.next() {
            Some((0, s)) if s.is_empty() => {}
            Some((&offset, s)) => {
                return Err(Error::InvalidStringBlockOffset(format!(
                    "first offset should always be 0 and be an empty string, found offset {} with '{}'",
                    offset, s
                )))
            }
            None => {
                return Err(Error::InvalidStringBlockOffset(
                    "string block has no entry at offset 0".into(),
                ))
            }
        }
        let mut expected: u32 = 1;
        for (&offset, s) in iter {
            if offset != expected {
                return Err(Error::InvalidStringBlockOffset(format!(
                    "expected next string at offset {}, found offset {} ('{}')",
                    expected, offset, s
                )));
            }
            expected = offset + s.len() as u32 + 1;
        }
        Ok(())
    }

    /// Encode the block: every string joined by a single null byte
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.validate()?;
        let mut blob = Vec::with_capacity(self.next_offset() as usize);
        for (i, s) in self.entries.values().enumerate() {
            if i > 0 {
                blob.push(0);
            }
            blob.extend_from_slice(s.as_bytes());
        }
        Ok(blob)
    }

    #[cfg(test)]
    pub(crate) fn insert_raw(&mut self, offset: u32, value: &str) {
        self.entries.insert(offset, value.to_string());
    }

    /// Start interning a batch of new strings
    ///
    /// The trailing blank placeholder is dropped and reinstated by
    /// [`Interner::finish`] at the new end of the block.
    pub(crate) fn interner(&mut self) -> Interner<'_> {
        let placeholder = self
            .entries
            .iter()
            .next_back()
            .filter(|(offset, s)| **offset != 0 && s.is_empty())
            .map(|(&offset, _)| offset);
        if let Some(offset) = placeholder {
            self.entries.remove(&offset);
        }
        self.entries.entry(0).or_default();
        let lookup = self
            .offsets()
            .into_iter()
            .map(|(s, o)| (s.to_string(), o))
            .collect();
        let next = self.next_offset();
        Interner {
            block: self,
            lookup,
            next,
            added: 0,
        }
    }
}

/// Assigns offsets to strings appended to a [`StringBlock`]
pub(crate) struct Interner<'a> {
    block: &'a mut StringBlock,
    lookup: HashMap<String, u32>,
    next: u32,
    added: usize,
}

impl Interner<'_> {
    /// Offset for `value`, inserting it at the end of the block if new
    pub(crate) fn intern(&mut self, value: &str) -> u32 {
        if value.is_empty() {
            return 0;
        }
        if let Some(&offset) = self.lookup.get(value) {
            return offset;
        }
        let offset = self.next;
        self.block.entries.insert(offset, value.to_string());
        self.lookup.insert(value.to_string(), offset);
        self.next += value.len() as u32 + 1;
        self.added += 1;
        offset
    }

    /// Close the batch, returning the new block size and the number of
    /// strings added
    pub(crate) fn finish(self) -> (u32, usize) {
        self.block.entries.insert(self.next, String::new());
        (self.next, self.added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bytes() {
        let block = StringBlock::from_bytes(b"\0Foo\0Bar\0");
        let entries: Vec<_> = block.iter().collect();
        assert_eq!(entries, vec![(0, ""), (1, "Foo"), (5, "Bar"), (9, "")]);
        assert_eq!(block.resolve(5), Some("Bar"));
        assert_eq!(block.resolve(3), None);
        assert_eq!(block.resolve(-1), None);
    }

    #[test]
    fn test_empty_blob() {
        let block = StringBlock::from_bytes(b"");
        assert_eq!(block.iter().collect::<Vec<_>>(), vec![(0, "")]);
        assert_eq!(block.to_bytes().unwrap(), b"");
    }

    #[test]
    fn test_to_bytes_round_trip() {
        let blob = b"\0Foo\0\0Bar\0";
        let block = StringBlock::from_bytes(blob);
        assert_eq!(block.to_bytes().unwrap(), blob);
    }

    #[test]
    fn test_offset_of_prefers_lowest() {
        let block = StringBlock::from_bytes(b"\0Foo\0Foo\0");
        assert_eq!(block.offset_of("Foo"), Some(1));
        assert_eq!(block.offsets()["Foo"], 1);
        assert_eq!(block.offset_of(""), Some(0));
        assert_eq!(block.offset_of("Baz"), None);
    }

    #[test]
    fn test_validate_rejects_gap() {
        let mut block = StringBlock::from_bytes(b"\0Foo\0");
        block.insert_raw(7, "Bar");
        let err = block.to_bytes().unwrap_err();
        assert!(matches!(err, Error::InvalidStringBlockOffset(_)));
    }

    #[test]
    fn test_validate_rejects_missing_zero() {
        let mut block = StringBlock::new();
        block.entries.clear();
        block.entries.insert(1, "Foo".into());
        assert!(block.validate().is_err());

        let mut block = StringBlock::new();
        block.entries.insert(0, "Foo".into());
        assert!(block.validate().is_err());
    }

    #[test]
    fn test_intern_fresh() {
        let mut block = StringBlock::new();
        let mut interner = block.interner();
        assert_eq!(interner.intern("Foo"), 1);
        assert_eq!(interner.intern("Bar"), 5);
        assert_eq!(interner.intern("Foo"), 1);
        assert_eq!(interner.intern(""), 0);
        let (size, added) = interner.finish();
        assert_eq!((size, added), (9, 2));
        assert_eq!(block.to_bytes().unwrap(), b"\0Foo\0Bar\0");
        assert_eq!(block.to_bytes().unwrap().len() as u32, size);
    }

    #[test]
    fn test_intern_after_decode() {
        let mut block = StringBlock::from_bytes(b"\0Foo\0\0Bar\0");
        let mut interner = block.interner();
        assert_eq!(interner.intern("Bar"), 6);
        assert_eq!(interner.intern("Baz"), 10);
        let (size, _) = interner.finish();
        assert_eq!(size, 14);
        // the blank entry in the middle survives
        assert_eq!(block.get(5), Some(""));
        assert_eq!(block.to_bytes().unwrap(), b"\0Foo\0\0Bar\0Baz\0");
    }

    #[test]
    fn test_intern_without_trailing_null() {
        let mut block = StringBlock::from_bytes(b"\0Foo");
        let mut interner = block.interner();
        assert_eq!(interner.intern("Bar"), 5);
        let (size, _) = interner.finish();
        assert_eq!(size, 9);
        assert_eq!(block.to_bytes().unwrap(), b"\0Foo\0Bar\0");
    }

    #[test]
    fn test_lossy_decode() {
        let (block, lossy) = StringBlock::decode(b"\0\xff\0");
        assert_eq!(lossy, vec![1]);
        assert_eq!(block.get(1), Some("\u{fffd}"));
    }
}
