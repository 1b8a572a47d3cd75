//! Capture buffers: bounded, append-only byte stores.
//!
//! A [`CaptureBuffer`] is filled by exactly one producer (its
//! [`CaptureWriter`]) while any number of threads observe it through
//! [`Snapshot`]s or [`ReplayReader`]s.
//!
//! # Storage
//!
//! Bytes are kept in fixed-size pages (64 KiB, or the capacity if smaller).
//! Full pages are sealed into immutable, reference-counted slices; only the
//! last page is still being written. The pages and the completion state live
//! behind a single mutex, so a reader always sees a count whose bytes have
//! been fully committed. Taking a snapshot shares the sealed pages and copies
//! at most the partial last one.
//!
//! ```text
//!  writer ──read()──▶ [page 0][page 1][page 2][open ...]      len ──▶ capacity
//!                        ▲        ▲
//!          Snapshot ─────┘        └───── ReplayReader cursor
//! ```

mod pages;
mod reader;
mod snapshot;

pub use reader::{ReadStatus, ReplayReader};
pub use snapshot::{Chars, Snapshot};

use crate::wake::Notifier;
use pages::{Pages, PAGE_SIZE};
use std::io::{self, Read};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Default capacity of a capture buffer (40 MiB).
pub const DEFAULT_CAPACITY: usize = 40 * 1024 * 1024;

/// Largest single read issued against a source.
const READ_CHUNK: usize = 64 * 1024;

/// Collection state of a capture buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureState {
    /// The producer is still running.
    #[default]
    Collecting,
    /// The source reached end-of-stream (or failed).
    Complete,
    /// Capacity was reached; remaining source data is ignored.
    Full,
}

impl CaptureState {
    /// Whether no further bytes will ever be appended.
    #[inline]
    pub const fn is_finished(self) -> bool {
        !matches!(self, Self::Collecting)
    }
}

#[derive(Debug)]
struct Inner {
    pages: Pages,
    state: CaptureState,
}

/// Fixed-capacity, append-only byte store shared between one writer and
/// many readers.
#[derive(Debug)]
pub struct CaptureBuffer {
    capacity: usize,
    inner: Mutex<Inner>,
    /// Signalled on every commit and on completion.
    grown: Condvar,
    notifier: Notifier,
}

impl CaptureBuffer {
    /// Create an empty buffer and the writer that owns its producer side.
    ///
    /// A zero capacity yields a buffer that is `Full` from the start.
    pub fn create(capacity: usize, notifier: Notifier) -> (CaptureWriter, Arc<Self>) {
        Self::create_paged(capacity, PAGE_SIZE.min(capacity).max(1), notifier)
    }

    fn create_paged(
        capacity: usize,
        page_size: usize,
        notifier: Notifier,
    ) -> (CaptureWriter, Arc<Self>) {
        let state = if capacity == 0 {
            CaptureState::Full
        } else {
            CaptureState::Collecting
        };
        let buffer = Arc::new(Self {
            capacity,
            inner: Mutex::new(Inner {
                pages: Pages::new(page_size),
                state,
            }),
            grown: Condvar::new(),
            notifier,
        });
        let writer = CaptureWriter {
            buffer: Arc::clone(&buffer),
        };
        (writer, buffer)
    }

    /// Maximum number of bytes this buffer will ever hold.
    #[inline]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of valid bytes written so far.
    pub fn len(&self) -> usize {
        self.lock().pages.len()
    }

    /// Whether no bytes have been written yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current collection state.
    pub fn state(&self) -> CaptureState {
        self.lock().state
    }

    /// A consistent view of `[0, len)` at the instant of the call.
    pub fn snapshot(&self) -> Snapshot {
        let mut inner = self.lock();
        let state = inner.state;
        inner.pages.snapshot(state)
    }

    /// Stop collecting: bytes committed after this call are discarded.
    ///
    /// Used when the consumer has lost interest, so stray producers that
    /// outlive it cannot keep filling the buffer.
    pub(crate) fn close(&self) {
        self.finish(CaptureState::Complete);
    }

    /// A reader over this buffer starting at offset 0.
    pub fn new_reader(self: &Arc<Self>) -> ReplayReader {
        ReplayReader::new(Arc::downgrade(self))
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy bytes starting at `offset` into `dst`.
    ///
    /// Returns the number copied together with the count and state observed
    /// under the same lock.
    fn read_at(&self, offset: usize, dst: &mut [u8]) -> (usize, usize, CaptureState) {
        let inner = self.lock();
        let copied = inner.pages.copy_at(offset, dst);
        (copied, inner.pages.len(), inner.state)
    }

    /// Block until the buffer holds more than `seen` bytes, finishes, or the
    /// timeout elapses. Returns `true` unless the timeout elapsed.
    fn wait_for_growth(&self, seen: usize, timeout: Duration) -> bool {
        let inner = self.lock();
        let (inner, _) = self
            .grown
            .wait_timeout_while(inner, timeout, |i| {
                i.pages.len() <= seen && !i.state.is_finished()
            })
            .unwrap_or_else(PoisonError::into_inner);
        inner.pages.len() > seen || inner.state.is_finished()
    }

    /// Block until the buffer is finished or the timeout elapses.
    ///
    /// Returns whether the buffer is finished.
    pub fn wait_finished(&self, timeout: Duration) -> bool {
        let inner = self.lock();
        let (inner, _) = self
            .grown
            .wait_timeout_while(inner, timeout, |i| !i.state.is_finished())
            .unwrap_or_else(PoisonError::into_inner);
        inner.state.is_finished()
    }

    fn remaining(&self) -> usize {
        self.capacity - self.lock().pages.len()
    }

    /// Append one chunk, clamped to the remaining capacity.
    fn commit(&self, chunk: &[u8]) -> CaptureState {
        let state = {
            let mut inner = self.lock();
            if inner.state.is_finished() {
                return inner.state;
            }
            let take = chunk.len().min(self.capacity - inner.pages.len());
            inner.pages.extend(&chunk[..take]);
            if inner.pages.len() == self.capacity {
                inner.state = CaptureState::Full;
            }
            inner.state
        };
        self.grown.notify_all();
        self.notifier.notify();
        state
    }

    fn finish(&self, state: CaptureState) -> CaptureState {
        let state = {
            let mut inner = self.lock();
            if !inner.state.is_finished() {
                inner.state = state;
            }
            inner.state
        };
        self.grown.notify_all();
        self.notifier.notify();
        state
    }
}

/// The single producer handle of a [`CaptureBuffer`].
///
/// Dropping the writer marks a still-collecting buffer as complete, so
/// readers never wait on a producer that no longer exists.
#[derive(Debug)]
pub struct CaptureWriter {
    buffer: Arc<CaptureBuffer>,
}

impl CaptureWriter {
    /// The buffer this writer fills.
    pub const fn buffer(&self) -> &Arc<CaptureBuffer> {
        &self.buffer
    }

    /// Read `source` into the buffer until end-of-stream, a read error, or
    /// capacity.
    ///
    /// Each chunk is published only after it has been copied in full, and
    /// every publish posts a wake-up. Reaching capacity is not an error: the
    /// buffer becomes [`CaptureState::Full`] and the rest of the source is
    /// left unread.
    ///
    /// # Errors
    ///
    /// Returns the source's read error. The buffer is marked complete first.
    pub fn append<R: Read>(&mut self, mut source: R) -> io::Result<CaptureState> {
        let mut chunk = vec![0u8; READ_CHUNK.min(self.buffer.capacity).max(1)];
        loop {
            let remaining = self.buffer.remaining();
            if remaining == 0 {
                return Ok(self.buffer.finish(CaptureState::Full));
            }
            let want = remaining.min(chunk.len());
            match source.read(&mut chunk[..want]) {
                Ok(0) => return Ok(self.buffer.finish(CaptureState::Complete)),
                Ok(n) => {
                    let state = self.buffer.commit(&chunk[..n]);
                    if state.is_finished() {
                        return Ok(state);
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    self.buffer.finish(CaptureState::Complete);
                    return Err(e);
                }
            }
        }
    }

    /// Append literal bytes, truncated at capacity.
    pub fn push(&mut self, bytes: &[u8]) -> CaptureState {
        self.buffer.commit(bytes)
    }

    /// Mark the buffer complete.
    pub fn finish(self) -> CaptureState {
        self.buffer.finish(CaptureState::Complete)
    }
}

impl Drop for CaptureWriter {
    fn drop(&mut self) {
        self.buffer.finish(CaptureState::Complete);
    }
}
