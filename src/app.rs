//! The foreground loop: collect stdin, edit the command, draw the preview.
//!
//! ```text
//!   loop {
//!       controller.sync(command text)      restart the command if it changed
//!       draw                               command line, preview, status bar
//!       select! {
//!           input event  -> edit / scroll / resize / quit
//!           wake-up      -> (redraw)
//!           stdin error  -> abort
//!       }
//!   }
//! ```

use crate::actor::{InputActor, InputEvent};
use crate::capture::{CaptureBuffer, CaptureWriter};
use crate::config::Config;
use crate::controller::{Controller, Transition};
use crate::error::{Error, Result};
use crate::layout::ScreenLayout;
use crate::process::Spawner;
use crate::terminal::{Renderer, TerminalSession};
use crate::wake::{self, Notifier, WakeReceiver};
use crate::widget::{CommandLine, Preview, StatusBar, Widget};
use crossbeam_channel::{bounded, never, select, Receiver, Sender};
use std::io::{self, IsTerminal, Write};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// How long the input thread blocks before rechecking its shutdown flag.
const INPUT_POLL: Duration = Duration::from_millis(50);

/// What the loop should do after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep running.
    Continue,
    /// Leave the loop.
    Quit,
}

/// Everything the loop owns: the controller, the widgets and the renderer.
pub struct App<W: Write> {
    controller: Controller,
    command_line: CommandLine,
    preview: Preview,
    status_bar: StatusBar,
    show_status: bool,
    renderer: Renderer<W>,
}

impl<W: Write> App<W> {
    /// Build the application over an input buffer.
    ///
    /// `notifier` is handed to every output buffer so their growth wakes the
    /// loop; `size` is the terminal's (columns, rows).
    pub fn new(
        config: &Config,
        input: Arc<CaptureBuffer>,
        notifier: Notifier,
        writer: W,
        size: (u16, u16),
    ) -> Self {
        let renderer = Renderer::new(writer, size.0, size.1);
        let (width, height) = renderer.size();
        let layout = ScreenLayout::compute(width, height, config.show_status);
        let spawner = Spawner::from_config(config, notifier);

        Self {
            controller: Controller::new(input, spawner),
            command_line: CommandLine::new(layout.command, config.prompt.clone()),
            preview: Preview::new(layout.preview),
            status_bar: StatusBar::new(layout.status.unwrap_or_default()),
            show_status: config.show_status,
            renderer,
        }
    }

    /// The re-execution controller.
    pub const fn controller(&self) -> &Controller {
        &self.controller
    }

    /// The command editor.
    pub const fn command_line(&self) -> &CommandLine {
        &self.command_line
    }

    /// The preview pane.
    pub const fn preview(&self) -> &Preview {
        &self.preview
    }

    /// The renderer (and through it, everything written so far).
    pub const fn renderer(&self) -> &Renderer<W> {
        &self.renderer
    }

    /// Run the controller against the current command text.
    pub fn sync(&mut self) -> Transition {
        let transition = self.controller.sync(self.command_line.content());
        if transition != Transition::Unchanged {
            self.preview.reset_scroll();
        }
        transition
    }

    /// Dispatch one input event.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Terminal`] when the input thread reports a failure.
    pub fn handle_event(&mut self, event: &InputEvent) -> Result<Flow> {
        if event.is_quit() {
            return Ok(Flow::Quit);
        }
        match event {
            InputEvent::Resize { width, height } => self.resize(*width, *height),
            InputEvent::Shutdown => return Ok(Flow::Quit),
            InputEvent::Error(message) => {
                return Err(Error::Terminal(io::Error::other(message.clone())));
            }
            _ => {
                if !self.command_line.handle_input(event) {
                    self.preview.handle_input(event);
                }
            }
        }
        Ok(Flow::Continue)
    }

    fn resize(&mut self, width: u16, height: u16) {
        self.renderer.resize(width, height);
        let (width, height) = self.renderer.size();
        let layout = ScreenLayout::compute(width, height, self.show_status);
        self.command_line.set_bounds(layout.command);
        self.preview.set_bounds(layout.preview);
        self.status_bar.set_bounds(layout.status.unwrap_or_default());
        debug!(width, height, "resized");
    }

    /// Draw one frame of the active buffer's current snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the terminal fails.
    pub fn draw(&mut self) -> Result<()> {
        let snapshot = self.controller.active_buffer().snapshot();
        let shown_len = snapshot.len();
        self.preview.set_snapshot(snapshot);

        let input = self.controller.input();
        self.status_bar.describe(
            input.len(),
            input.state(),
            shown_len,
            self.controller.invocation().map(crate::process::Invocation::status),
        );

        let grid = self.renderer.frame();
        self.command_line.render(grid);
        self.preview.render(grid);
        self.status_bar.render(grid);
        self.renderer.set_cursor(self.command_line.cursor_position());
        self.renderer.flush()?;
        Ok(())
    }

    /// Cancel any running command.
    pub fn shutdown(&mut self) {
        self.controller.shutdown();
    }
}

/// Run the interactive preview until the user quits.
///
/// # Errors
///
/// - [`Error::InteractiveStdin`] if stdin is a terminal
/// - [`Error::InputRead`] if reading stdin fails
/// - [`Error::Terminal`] / [`Error::Thread`] for setup or drawing failures
pub fn run(config: &Config) -> Result<()> {
    ensure_piped(&io::stdin())?;

    let (notifier, wake_rx) = wake::channel();
    let (writer, input) = CaptureBuffer::create(config.capacity, notifier.clone());
    let (fatal_tx, fatal_rx) = bounded(1);
    let _collector = collect_stdin(writer, fatal_tx)?;

    let session = TerminalSession::enter()?;
    let size = TerminalSession::size()?;
    let (input_tx, input_rx) = bounded(64);
    let input_actor = InputActor::spawn(input_tx, INPUT_POLL)?;
    info!(shell = %config.shell, capacity = config.capacity, "preview started");

    let mut app = App::new(config, input, notifier, io::stdout(), size);
    let result = event_loop(&mut app, &input_rx, &wake_rx, fatal_rx);

    app.shutdown();
    // Unblocks an actor waiting on a full channel
    drop(input_rx);
    input_actor.join();
    session.leave();
    info!(ok = result.is_ok(), "preview finished");
    result
}

/// Refuse an interactive `stdin`: there would be nothing to preview, and the
/// terminal is needed for keys.
fn ensure_piped(stdin: &impl IsTerminal) -> Result<()> {
    if stdin.is_terminal() {
        Err(Error::InteractiveStdin)
    } else {
        Ok(())
    }
}

/// Sync, draw, wait; until a quit event or a fatal error.
fn event_loop<W: Write>(
    app: &mut App<W>,
    input_rx: &Receiver<InputEvent>,
    wake_rx: &WakeReceiver,
    mut fatal_rx: Receiver<io::Error>,
) -> Result<()> {
    loop {
        app.sync();
        app.draw()?;

        let mut collector_done = false;
        select! {
            recv(input_rx) -> event => {
                let Ok(event) = event else {
                    return Ok(());
                };
                if app.handle_event(&event)? == Flow::Quit {
                    return Ok(());
                }
                // Apply queued keystrokes before the next frame
                while let Ok(event) = input_rx.try_recv() {
                    if app.handle_event(&event)? == Flow::Quit {
                        return Ok(());
                    }
                }
            }
            recv(wake_rx) -> _ => {}
            recv(fatal_rx) -> error => match error {
                Ok(error) => return Err(Error::InputRead(error)),
                Err(_) => collector_done = true,
            },
        }
        if collector_done {
            // Clean EOF drops the sender; stop selecting on it
            fatal_rx = never();
        }
    }
}

/// Copy stdin into the input buffer on a background thread.
///
/// A read error is sent on `fatal`; success just drops the sender.
fn collect_stdin(mut writer: CaptureWriter, fatal: Sender<io::Error>) -> Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("up-input-collector".to_string())
        .spawn(move || match writer.append(io::stdin().lock()) {
            Ok(state) => debug!(?state, len = writer.buffer().len(), "stdin collected"),
            Err(error) => {
                warn!(%error, "reading stdin failed");
                let _ = fatal.send(error);
            }
        })
        .map_err(|source| Error::Thread {
            name: "up-input-collector",
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::KeyCode;
    use nix::pty::{openpty, Winsize};
    use nix::sys::termios::Termios;

    fn app(input: &[u8], show_status: bool) -> App<Vec<u8>> {
        let (mut writer, buffer) = CaptureBuffer::create(1 << 20, Notifier::none());
        writer.push(input);
        writer.finish();
        let config = Config {
            shell: "sh".into(),
            show_status,
            ..Config::default()
        };
        App::new(&config, buffer, Notifier::none(), Vec::new(), (40, 6))
    }

    #[test]
    fn test_terminal_stdin_is_rejected() {
        let pty = openpty(None::<&Winsize>, None::<&Termios>).unwrap();
        assert!(matches!(ensure_piped(&pty.slave), Err(Error::InteractiveStdin)));

        let null = std::fs::File::open("/dev/null").unwrap();
        assert!(ensure_piped(&null).is_ok());
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app(b"", true);
        assert_eq!(
            app.handle_event(&InputEvent::key(KeyCode::Esc)).unwrap(),
            Flow::Quit
        );
        assert_eq!(app.handle_event(&InputEvent::Shutdown).unwrap(), Flow::Quit);
        assert_eq!(
            app.handle_event(&InputEvent::key(KeyCode::Char('x'))).unwrap(),
            Flow::Continue
        );
    }

    #[test]
    fn test_input_error_is_fatal() {
        let mut app = app(b"", true);
        let result = app.handle_event(&InputEvent::Error("tty gone".into()));
        assert!(matches!(result, Err(Error::Terminal(_))));
    }

    #[test]
    fn test_resize_relayouts_widgets() {
        let mut app = app(b"", true);
        app.handle_event(&InputEvent::Resize {
            width: 100,
            height: 30,
        })
        .unwrap();
        assert_eq!(app.renderer().size(), (100, 30));
        assert_eq!(app.preview().bounds().height, 28);
        assert_eq!(app.command_line().bounds().width, 100);
    }

    #[test]
    fn test_idle_draw_shows_input() {
        let mut app = app(b"first\nsecond\n", false);
        assert_eq!(app.sync(), Transition::Unchanged);
        app.draw().unwrap();

        let mut parser = vt100::Parser::new(6, 40, 0);
        parser.process(app.renderer().writer());
        let rows: Vec<String> = parser
            .screen()
            .rows(0, 40)
            .map(|row| row.trim_end().to_owned())
            .collect();
        assert_eq!(rows[0], "|");
        assert_eq!(rows[1], "first");
        assert_eq!(rows[2], "second");
    }

    #[test]
    fn test_scroll_resets_on_transition() {
        let text: String = (0..20).map(|i| format!("{i}\n")).collect();
        let mut app = app(text.as_bytes(), true);
        app.draw().unwrap();
        app.handle_event(&InputEvent::key(KeyCode::PageDown)).unwrap();
        assert!(app.preview().scroll() > 0);

        app.handle_event(&InputEvent::key(KeyCode::Char('c'))).unwrap();
        assert_eq!(app.sync(), Transition::Started);
        assert_eq!(app.preview().scroll(), 0);
    }
}
