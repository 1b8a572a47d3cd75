//! Snapshot: an immutable view of a capture buffer's valid prefix.

use super::CaptureState;
use std::char::REPLACEMENT_CHARACTER;
use std::iter::Peekable;
use std::sync::Arc;

/// The bytes `[0, len)` of a capture buffer at one instant.
///
/// Cloning a snapshot is cheap: it shares the underlying pages.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pages: Arc<Vec<Arc<[u8]>>>,
    tail: Arc<[u8]>,
    len: usize,
    state: CaptureState,
}

impl Snapshot {
    pub(super) fn new(pages: Arc<Vec<Arc<[u8]>>>, tail: Arc<[u8]>, state: CaptureState) -> Self {
        let len = pages.iter().map(|p| p.len()).sum::<usize>() + tail.len();
        Self {
            pages,
            tail,
            len,
            state,
        }
    }

    #[cfg(test)]
    pub(super) fn shares_tail_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.tail, &other.tail)
    }

    /// Number of bytes in the snapshot.
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the snapshot holds no bytes.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Buffer state when the snapshot was taken.
    #[inline]
    pub const fn state(&self) -> CaptureState {
        self.state
    }

    /// The snapshot's bytes as contiguous chunks, in order.
    pub fn chunks(&self) -> impl Iterator<Item = &[u8]> {
        self.pages
            .iter()
            .map(|p| &**p)
            .chain(std::iter::once(&*self.tail))
            .filter(|c| !c.is_empty())
    }

    /// Copy the snapshot into one vector.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len);
        for chunk in self.chunks() {
            out.extend_from_slice(chunk);
        }
        out
    }

    /// Decode the snapshot as UTF-8, substituting U+FFFD for invalid or
    /// truncated sequences. Sequences split across chunks decode normally.
    pub fn chars(&self) -> Chars<impl Iterator<Item = u8> + '_> {
        Chars {
            bytes: self.chunks().flat_map(|c| c.iter().copied()).peekable(),
        }
    }

    /// Number of lines, counting a trailing unterminated line.
    pub fn line_count(&self) -> usize {
        let newlines: usize = self
            .chunks()
            .map(|c| c.iter().filter(|&&b| b == b'\n').count())
            .sum();
        let trailing = self
            .chunks()
            .last()
            .and_then(<[u8]>::last)
            .is_some_and(|&b| b != b'\n');
        newlines + usize::from(trailing)
    }
}

/// Lossy UTF-8 decoder over a byte stream.
#[derive(Debug)]
pub struct Chars<I: Iterator<Item = u8>> {
    bytes: Peekable<I>,
}

/// Expected sequence length for a lead byte, or 0 if it cannot start one.
const fn sequence_len(lead: u8) -> usize {
    match lead {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 0,
    }
}

impl<I: Iterator<Item = u8>> Iterator for Chars<I> {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        let lead = self.bytes.next()?;
        let len = sequence_len(lead);
        match len {
            0 => return Some(REPLACEMENT_CHARACTER),
            1 => return Some(char::from(lead)),
            _ => {}
        }

        let mut seq = [lead, 0, 0, 0];
        for slot in seq.iter_mut().take(len).skip(1) {
            match self.bytes.peek() {
                Some(&b) if b & 0xC0 == 0x80 => {
                    *slot = b;
                    self.bytes.next();
                }
                // Leave the offending byte for the next call
                _ => return Some(REPLACEMENT_CHARACTER),
            }
        }

        Some(
            std::str::from_utf8(&seq[..len])
                .ok()
                .and_then(|s| s.chars().next())
                .unwrap_or(REPLACEMENT_CHARACTER),
        )
    }
}
