//! Page store: bytes kept in fixed-size, immutable, shared pages.
//!
//! Appends go to one open page. When it fills it is sealed into an
//! `Arc<[u8]>` and the open page is reused, so the number of allocations
//! tracks the byte count divided by the page size, not the number of
//! writes.

use super::snapshot::Snapshot;
use super::CaptureState;
use std::sync::Arc;

/// Size of one page.
pub(super) const PAGE_SIZE: usize = 64 * 1024;

#[derive(Debug)]
pub(super) struct Pages {
    page_size: usize,
    /// Full pages. Snapshots share the list; a seal after a snapshot copies
    /// the handles, never the bytes.
    sealed: Arc<Vec<Arc<[u8]>>>,
    open: Vec<u8>,
    /// Shared copy of `open`, reused by snapshots until the next append.
    frozen: Option<Arc<[u8]>>,
}

impl Pages {
    /// # Panics
    /// Panics if `page_size` is 0.
    pub(super) fn new(page_size: usize) -> Self {
        assert!(page_size > 0, "page size must be non-zero");
        Self {
            page_size,
            sealed: Arc::default(),
            open: Vec::new(),
            frozen: None,
        }
    }

    pub(super) fn len(&self) -> usize {
        self.sealed.len() * self.page_size + self.open.len()
    }

    /// Pages holding data, the open one included.
    #[cfg(test)]
    pub(super) fn page_count(&self) -> usize {
        self.sealed.len() + usize::from(!self.open.is_empty())
    }

    pub(super) fn extend(&mut self, mut bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        self.frozen = None;
        while !bytes.is_empty() {
            if self.open.capacity() == 0 {
                self.open.reserve_exact(self.page_size);
            }
            let n = (self.page_size - self.open.len()).min(bytes.len());
            self.open.extend_from_slice(&bytes[..n]);
            bytes = &bytes[n..];
            if self.open.len() == self.page_size {
                Arc::make_mut(&mut self.sealed).push(Arc::from(self.open.as_slice()));
                self.open.clear();
            }
        }
    }

    fn page(&self, index: usize) -> &[u8] {
        self.sealed.get(index).map_or(self.open.as_slice(), |page| &**page)
    }

    /// Copy bytes from `offset` into `dst`, returning how many were copied.
    pub(super) fn copy_at(&self, offset: usize, dst: &mut [u8]) -> usize {
        let len = self.len();
        let mut pos = offset;
        let mut copied = 0;
        while copied < dst.len() && pos < len {
            let page = self.page(pos / self.page_size);
            let from = pos % self.page_size;
            let n = (page.len() - from).min(dst.len() - copied);
            dst[copied..copied + n].copy_from_slice(&page[from..from + n]);
            copied += n;
            pos += n;
        }
        copied
    }

    /// A view of every byte stored so far.
    ///
    /// Copies at most one partial page, and only once per append.
    pub(super) fn snapshot(&mut self, state: CaptureState) -> Snapshot {
        let open = &self.open;
        let tail = Arc::clone(self.frozen.get_or_insert_with(|| Arc::from(open.as_slice())));
        Snapshot::new(Arc::clone(&self.sealed), tail, state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages_of(page_size: usize, chunks: &[&[u8]]) -> Pages {
        let mut pages = Pages::new(page_size);
        for chunk in chunks {
            pages.extend(chunk);
        }
        pages
    }

    #[test]
    fn test_single_byte_writes_fill_whole_pages() {
        let mut pages = Pages::new(16);
        let data: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        for byte in &data {
            pages.extend(std::slice::from_ref(byte));
        }

        assert_eq!(pages.len(), data.len());
        assert_eq!(pages.page_count(), data.len().div_ceil(16));
        assert_eq!(pages.snapshot(CaptureState::Complete).to_vec(), data);
    }

    #[test]
    fn test_copy_at_spans_pages() {
        let pages = pages_of(4, &[b"abc", b"de", b"fghij"]);
        let mut dst = [0u8; 4];
        assert_eq!(pages.copy_at(2, &mut dst), 4);
        assert_eq!(&dst, b"cdef");

        let mut dst = [0u8; 10];
        assert_eq!(pages.copy_at(8, &mut dst), 2);
        assert_eq!(&dst[..2], b"ij");

        assert_eq!(pages.copy_at(10, &mut dst), 0);
    }

    #[test]
    fn test_snapshot_reuses_tail_until_next_write() {
        let mut pages = pages_of(8, &[b"0123456789"]);
        let first = pages.snapshot(CaptureState::Collecting);
        let second = pages.snapshot(CaptureState::Collecting);
        assert!(first.shares_tail_with(&second));

        pages.extend(b"ab");
        let third = pages.snapshot(CaptureState::Collecting);
        assert!(!first.shares_tail_with(&third));
        assert_eq!(first.to_vec(), b"0123456789");
        assert_eq!(third.to_vec(), b"0123456789ab");
    }

    #[test]
    fn test_seal_after_snapshot_leaves_snapshot_intact() {
        let mut pages = pages_of(4, &[b"abcdef"]);
        let before = pages.snapshot(CaptureState::Collecting);
        pages.extend(b"ghijkl");
        assert_eq!(before.to_vec(), b"abcdef");
        assert_eq!(pages.snapshot(CaptureState::Complete).to_vec(), b"abcdefghijkl");
    }
}
