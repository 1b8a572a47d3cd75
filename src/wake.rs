//! Wake-up channel: lets background producers unblock the render loop.
//!
//! Capture buffers post a [`Wake`] whenever they commit bytes or finish.
//! The channel holds at most one pending wake, so a burst of appends
//! collapses into a single redraw.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

/// A coalesced "something changed" signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wake;

/// Receiving half, owned by the render loop.
pub type WakeReceiver = Receiver<Wake>;

/// Sending half, cloned into every buffer that should trigger redraws.
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    sender: Option<Sender<Wake>>,
}

/// Create a connected notifier/receiver pair.
pub fn channel() -> (Notifier, WakeReceiver) {
    let (tx, rx) = bounded(1);
    (Notifier { sender: Some(tx) }, rx)
}

impl Notifier {
    /// A notifier that is not connected to any loop.
    pub const fn none() -> Self {
        Self { sender: None }
    }

    /// Post a wake-up. Never blocks.
    ///
    /// Returns `false` only when the receiving loop is gone.
    pub fn notify(&self) -> bool {
        let Some(sender) = &self.sender else {
            return true;
        };
        match sender.try_send(Wake) {
            Ok(()) | Err(TrySendError::Full(_)) => true,
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}
