//! Input Actor: Dedicated thread for polling terminal events.
//!
//! Keeps the main loop free to block on a channel select instead of on the
//! terminal itself, so buffer wake-ups can interrupt the wait. Piped stdin is
//! fine here: crossterm reads keys from the controlling tty.

use super::messages::{InputEvent, KeyCode, KeyModifiers};
use crate::error::{Error, Result};
use crossbeam_channel::{SendTimeoutError, Sender};
use crossterm::event::{self, Event, KeyEventKind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Input actor that polls terminal events.
pub struct InputActor {
    /// Handle to the input thread.
    handle: Option<JoinHandle<()>>,
    /// Flag to signal shutdown.
    shutdown: Arc<AtomicBool>,
}

impl InputActor {
    /// Spawn the input actor thread.
    ///
    /// # Arguments
    ///
    /// * `sender` - Channel to send input events to the main loop.
    /// * `poll_timeout` - How long to wait for events before checking shutdown.
    pub fn spawn(sender: Sender<InputEvent>, poll_timeout: Duration) -> Result<Self> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();

        let handle = thread::Builder::new()
            .name("up-input".to_string())
            .spawn(move || {
                Self::run_loop(&sender, &shutdown_clone, poll_timeout);
            })
            .map_err(|source| Error::Thread {
                name: "up-input",
                source,
            })?;

        Ok(Self {
            handle: Some(handle),
            shutdown,
        })
    }

    /// Signal the input thread to shutdown.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Wait for the input thread to finish.
    pub fn join(mut self) {
        self.shutdown();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    /// Main input polling loop.
    fn run_loop(sender: &Sender<InputEvent>, shutdown: &AtomicBool, poll_timeout: Duration) {
        loop {
            if shutdown.load(Ordering::Relaxed) {
                let _ = sender.try_send(InputEvent::Shutdown);
                break;
            }

            let input_event = match event::poll(poll_timeout) {
                Ok(true) => match event::read() {
                    Ok(event) => convert_event(event),
                    Err(e) => Some(InputEvent::Error(e.to_string())),
                },
                Ok(false) => None,
                Err(e) => Some(InputEvent::Error(e.to_string())),
            };
            if let Some(input_event) = input_event {
                if !forward(sender, input_event, shutdown, poll_timeout) {
                    break;
                }
            }
        }
    }
}

/// Send `event` to the main loop, waiting while the channel is full.
///
/// Returns `false` if the receiver is gone or shutdown was requested while
/// waiting; the event is dropped in both cases.
fn forward(
    sender: &Sender<InputEvent>,
    mut event: InputEvent,
    shutdown: &AtomicBool,
    patience: Duration,
) -> bool {
    loop {
        match sender.send_timeout(event, patience) {
            Ok(()) => return true,
            Err(SendTimeoutError::Disconnected(_)) => return false,
            Err(SendTimeoutError::Timeout(pending)) => {
                if shutdown.load(Ordering::Relaxed) {
                    return false;
                }
                event = pending;
            }
        }
    }
}

impl Drop for InputActor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Convert a crossterm event to our `InputEvent`.
pub(crate) fn convert_event(event: Event) -> Option<InputEvent> {
    match event {
        Event::Key(key_event) => {
            // Only process key press events (not release or repeat)
            if key_event.kind != KeyEventKind::Press {
                return None;
            }
            let code = convert_key_code(key_event.code)?;
            let modifiers = convert_modifiers(key_event.modifiers);
            Some(InputEvent::Key { code, modifiers })
        }
        Event::Resize(width, height) => Some(InputEvent::Resize { width, height }),
        Event::Paste(text) => Some(InputEvent::Paste(text)),
        Event::FocusGained | Event::FocusLost | Event::Mouse(_) => None,
    }
}

/// Convert crossterm `KeyCode` to our `KeyCode`.
fn convert_key_code(code: event::KeyCode) -> Option<KeyCode> {
    Some(match code {
        event::KeyCode::Char(c) => KeyCode::Char(c),
        event::KeyCode::Backspace => KeyCode::Backspace,
        event::KeyCode::Enter => KeyCode::Enter,
        event::KeyCode::Left => KeyCode::Left,
        event::KeyCode::Right => KeyCode::Right,
        event::KeyCode::Up => KeyCode::Up,
        event::KeyCode::Down => KeyCode::Down,
        event::KeyCode::Home => KeyCode::Home,
        event::KeyCode::End => KeyCode::End,
        event::KeyCode::PageUp => KeyCode::PageUp,
        event::KeyCode::PageDown => KeyCode::PageDown,
        event::KeyCode::Tab => KeyCode::Tab,
        event::KeyCode::Delete => KeyCode::Delete,
        event::KeyCode::Esc => KeyCode::Esc,
        _ => return None,
    })
}

/// Convert crossterm `KeyModifiers` to our `KeyModifiers`.
fn convert_modifiers(mods: event::KeyModifiers) -> KeyModifiers {
    KeyModifiers {
        shift: mods.contains(event::KeyModifiers::SHIFT),
        control: mods.contains(event::KeyModifiers::CONTROL),
        alt: mods.contains(event::KeyModifiers::ALT),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;
    use crossterm::event::{KeyEvent, KeyEventState};

    fn key(code: event::KeyCode, modifiers: event::KeyModifiers, kind: KeyEventKind) -> Event {
        Event::Key(KeyEvent {
            code,
            modifiers,
            kind,
            state: KeyEventState::NONE,
        })
    }

    #[test]
    fn test_convert_ctrl_c() {
        let event = key(
            event::KeyCode::Char('c'),
            event::KeyModifiers::CONTROL,
            KeyEventKind::Press,
        );
        let converted = convert_event(event).unwrap();
        assert!(converted.is_quit());
    }

    #[test]
    fn test_release_is_ignored() {
        let event = key(
            event::KeyCode::Char('a'),
            event::KeyModifiers::NONE,
            KeyEventKind::Release,
        );
        assert_eq!(convert_event(event), None);
    }

    #[test]
    fn test_resize_and_paste() {
        assert_eq!(
            convert_event(Event::Resize(120, 40)),
            Some(InputEvent::Resize {
                width: 120,
                height: 40
            })
        );
        assert_eq!(
            convert_event(Event::Paste("grep x".into())),
            Some(InputEvent::Paste("grep x".into()))
        );
        assert_eq!(convert_event(Event::FocusGained), None);
    }

    #[test]
    fn test_forward_gives_up_on_full_channel_at_shutdown() {
        let (sender, receiver) = bounded(1);
        let shutdown = AtomicBool::new(false);
        let patience = Duration::from_millis(5);
        assert!(forward(&sender, InputEvent::Shutdown, &shutdown, patience));

        // The main loop stopped reading but still holds the receiver
        shutdown.store(true, Ordering::Relaxed);
        let resize = InputEvent::Resize { width: 1, height: 1 };
        assert!(!forward(&sender, resize, &shutdown, patience));
        assert_eq!(receiver.try_recv(), Ok(InputEvent::Shutdown));
    }

    #[test]
    fn test_forward_stops_when_receiver_dropped() {
        let (sender, receiver) = bounded(1);
        drop(receiver);
        let shutdown = AtomicBool::new(false);
        assert!(!forward(&sender, InputEvent::Shutdown, &shutdown, Duration::from_millis(5)));
    }
}
