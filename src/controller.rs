//! Re-execution controller: decides which buffer is on screen.
//!
//! The controller is a two-state machine driven once per loop iteration
//! with the editor's current text:
//!
//! ```text
//!            text != last, non-empty
//!   ┌──────┐ ─────────────────────────▶ ┌──────────────────┐
//!   │ Idle │                            │ Running(inv)     │ ──┐ text != last, non-empty:
//!   └──────┘ ◀───────────────────────── └──────────────────┘ ◀─┘ cancel inv, start new
//!                 text becomes empty
//! ```
//!
//! There is no debounce: every change of the text restarts the command.

use crate::capture::CaptureBuffer;
use crate::process::{Invocation, Spawner};
use std::sync::Arc;
use tracing::debug;

/// Which source the preview is bound to.
#[derive(Debug, Default)]
pub enum ControllerState {
    /// No command; the raw input is shown.
    #[default]
    Idle,
    /// A command is running (or has run) and its output is shown.
    Running(Invocation),
}

/// What a call to [`Controller::sync`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The text did not change.
    Unchanged,
    /// The text became empty; any command was canceled.
    Idle,
    /// A new command was started.
    Started,
}

/// Owns the current invocation and the binding to the active buffer.
#[derive(Debug)]
pub struct Controller {
    input: Arc<CaptureBuffer>,
    spawner: Spawner,
    last_command: String,
    state: ControllerState,
}

impl Controller {
    /// Create an idle controller over the top-level input buffer.
    pub fn new(input: Arc<CaptureBuffer>, spawner: Spawner) -> Self {
        Self {
            input,
            spawner,
            last_command: String::new(),
            state: ControllerState::Idle,
        }
    }

    /// React to the editor's current text.
    ///
    /// On a change the previous invocation is canceled before the next one
    /// is started, so the active buffer never points at stale output.
    pub fn sync(&mut self, command: &str) -> Transition {
        if command == self.last_command {
            return Transition::Unchanged;
        }
        command.clone_into(&mut self.last_command);
        self.cancel_current();

        if command.is_empty() {
            debug!("command cleared, showing input");
            self.state = ControllerState::Idle;
            Transition::Idle
        } else {
            let invocation = self.spawner.start(&self.input, command);
            self.state = ControllerState::Running(invocation);
            Transition::Started
        }
    }

    /// The buffer the renderer should draw.
    pub fn active_buffer(&self) -> &Arc<CaptureBuffer> {
        match &self.state {
            ControllerState::Idle => &self.input,
            ControllerState::Running(invocation) => invocation.output(),
        }
    }

    /// The top-level input buffer.
    pub const fn input(&self) -> &Arc<CaptureBuffer> {
        &self.input
    }

    /// The current invocation, if a command is active.
    pub const fn invocation(&self) -> Option<&Invocation> {
        match &self.state {
            ControllerState::Idle => None,
            ControllerState::Running(invocation) => Some(invocation),
        }
    }

    /// Current state.
    pub const fn state(&self) -> &ControllerState {
        &self.state
    }

    /// The text used for the most recent transition.
    pub fn last_command(&self) -> &str {
        &self.last_command
    }

    /// Cancel any outstanding invocation and return to idle.
    pub fn shutdown(&mut self) {
        self.cancel_current();
        self.state = ControllerState::Idle;
    }

    fn cancel_current(&self) {
        if let ControllerState::Running(invocation) = &self.state {
            invocation.cancel();
        }
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::TaskStatus;
    use crate::wake::Notifier;
    use std::time::Duration;

    const TIMEOUT: Duration = Duration::from_secs(10);

    fn controller(input: &[u8]) -> Controller {
        let (mut writer, buffer) = CaptureBuffer::create(1 << 20, Notifier::none());
        writer.push(input);
        writer.finish();
        Controller::new(buffer, Spawner::new("sh", 1 << 20, Notifier::none()))
    }

    #[test]
    fn test_starts_idle_on_input() {
        let controller = controller(b"data");
        assert!(matches!(controller.state(), ControllerState::Idle));
        assert!(Arc::ptr_eq(controller.active_buffer(), controller.input()));
    }

    #[test]
    fn test_unchanged_text_is_noop() {
        let mut controller = controller(b"data");
        assert_eq!(controller.sync(""), Transition::Unchanged);
        assert_eq!(controller.sync("cat"), Transition::Started);
        let first = Arc::clone(controller.active_buffer());
        assert_eq!(controller.sync("cat"), Transition::Unchanged);
        assert!(Arc::ptr_eq(&first, controller.active_buffer()));
    }

    #[test]
    fn test_change_cancels_previous() {
        let mut controller = controller(b"data");
        controller.sync("sleep 30");
        let old = Arc::clone(controller.active_buffer());

        assert_eq!(controller.sync("cat"), Transition::Started);
        assert!(!Arc::ptr_eq(&old, controller.active_buffer()));
        assert_eq!(controller.last_command(), "cat");

        // Canceling stops the old output collecting at once
        assert!(old.wait_finished(TIMEOUT));
    }

    #[test]
    fn test_typing_restarts_every_keystroke() {
        let mut controller = controller(b"b\na\n");
        let mut outputs = Vec::new();
        for text in ["s", "so", "sor", "sort"] {
            assert_eq!(controller.sync(text), Transition::Started);
            outputs.push(Arc::clone(controller.active_buffer()));
        }

        let current = outputs.pop().unwrap();
        for stale in &outputs {
            assert!(!Arc::ptr_eq(stale, &current));
        }
        assert!(current.wait_finished(TIMEOUT));
        assert_eq!(current.snapshot().to_vec(), b"a\nb\n");
        assert_eq!(
            controller.invocation().unwrap().wait_timeout(TIMEOUT),
            TaskStatus::Exited(Some(0))
        );
    }

    #[test]
    fn test_empty_text_returns_to_input() {
        let mut controller = controller(b"b\na\n");
        controller.sync("sort");
        assert_eq!(controller.sync(""), Transition::Idle);
        assert!(controller.invocation().is_none());
        assert_eq!(controller.active_buffer().snapshot().to_vec(), b"b\na\n");
    }

    #[test]
    fn test_shutdown_cancels() {
        let mut controller = controller(b"");
        controller.sync("sleep 30");
        let output = Arc::clone(controller.active_buffer());
        controller.shutdown();
        assert!(controller.invocation().is_none());
        assert!(output.wait_finished(TIMEOUT));
    }
}
