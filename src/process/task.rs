//! Completion record for a supervised subprocess.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, PoisonError};
use std::time::Duration;

/// Lifecycle of an invocation's process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// The shell is running (or not yet reaped).
    Running,
    /// The shell exited on its own; `None` if killed by a signal.
    Exited(Option<i32>),
    /// The invocation was canceled and its process group killed.
    Canceled,
    /// The shell could not be started.
    FailedToStart,
}

impl TaskStatus {
    /// Whether the process is gone.
    #[inline]
    pub const fn is_finished(self) -> bool {
        !matches!(self, Self::Running)
    }
}

#[derive(Debug)]
pub(super) struct Task {
    canceled: AtomicBool,
    status: Mutex<TaskStatus>,
    done: Condvar,
}

impl Task {
    pub(super) const fn new(status: TaskStatus) -> Self {
        Self {
            canceled: AtomicBool::new(false),
            status: Mutex::new(status),
            done: Condvar::new(),
        }
    }

    pub(super) fn status(&self) -> TaskStatus {
        *self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(super) fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::Acquire)
    }

    /// Returns `true` only for the first call.
    pub(super) fn mark_canceled(&self) -> bool {
        !self.canceled.swap(true, Ordering::AcqRel)
    }

    pub(super) fn finish(&self, status: TaskStatus) {
        *self.status.lock().unwrap_or_else(PoisonError::into_inner) = status;
        self.done.notify_all();
    }

    pub(super) fn wait_timeout(&self, timeout: Duration) -> TaskStatus {
        let guard = self.status.lock().unwrap_or_else(PoisonError::into_inner);
        let (guard, _) = self
            .done
            .wait_timeout_while(guard, timeout, |s| !s.is_finished())
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }
}
