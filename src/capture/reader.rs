//! Replayable reader: a from-the-start cursor over a capture buffer.

use super::CaptureBuffer;
use std::io::{self, Read};
use std::sync::Weak;
use std::time::Duration;

/// How long a blocking [`Read`] waits between checks of its source.
const WAIT_SLICE: Duration = Duration::from_millis(50);

/// Outcome of a non-blocking read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    /// This many bytes were copied.
    Ready(usize),
    /// Caught up with a producer that is still collecting.
    Pending,
    /// The source is finished and every byte has been delivered.
    Exhausted,
}

/// Cursor-based reader over a [`CaptureBuffer`].
///
/// Always starts at offset 0, however much of the buffer has already been
/// written. Holds only a weak reference: a reader whose buffer has been
/// released reports [`ReadStatus::Exhausted`].
#[derive(Debug)]
pub struct ReplayReader {
    source: Weak<CaptureBuffer>,
    cursor: usize,
}

impl ReplayReader {
    pub(super) const fn new(source: Weak<CaptureBuffer>) -> Self {
        Self { source, cursor: 0 }
    }

    /// Bytes delivered so far.
    #[inline]
    pub const fn position(&self) -> usize {
        self.cursor
    }

    /// Copy whatever is available past the cursor without blocking.
    pub fn try_read(&mut self, buf: &mut [u8]) -> ReadStatus {
        let Some(source) = self.source.upgrade() else {
            return ReadStatus::Exhausted;
        };
        if buf.is_empty() {
            return ReadStatus::Ready(0);
        }

        let (n, len, state) = source.read_at(self.cursor, buf);
        self.cursor += n;
        if n > 0 {
            ReadStatus::Ready(n)
        } else if state.is_finished() && self.cursor >= len {
            ReadStatus::Exhausted
        } else {
            ReadStatus::Pending
        }
    }

    /// Wait up to `timeout` for bytes past the cursor.
    ///
    /// Returns `true` if a subsequent [`try_read`](Self::try_read) will not
    /// report `Pending`.
    pub fn wait(&self, timeout: Duration) -> bool {
        self.source
            .upgrade()
            .is_none_or(|source| source.wait_for_growth(self.cursor, timeout))
    }
}

/// Blocking adapter: waits while `Pending`, and returns `Ok(0)` only once
/// the source is exhausted.
impl Read for ReplayReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            match self.try_read(buf) {
                ReadStatus::Ready(n) => return Ok(n),
                ReadStatus::Exhausted => return Ok(0),
                ReadStatus::Pending => {
                    self.wait(WAIT_SLICE);
                }
            }
        }
    }
}
