//! Terminal session: raw mode and the alternate screen for the lifetime of
//! the UI.

use crossterm::{
    cursor,
    event::{DisableBracketedPaste, EnableBracketedPaste},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::io;
use tracing::debug;

/// Puts the terminal into full-screen mode; restores it on drop.
///
/// When stdin is a pipe crossterm reads keys and sets raw mode on the
/// controlling tty instead.
#[derive(Debug)]
pub struct TerminalSession {
    active: bool,
}

impl TerminalSession {
    /// Enter raw mode and the alternate screen.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal refuses either mode. Anything already
    /// switched on is switched back off before returning.
    pub fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let session = Self { active: true };
        execute!(
            io::stdout(),
            EnterAlternateScreen,
            EnableBracketedPaste,
            cursor::Hide
        )?;
        debug!("terminal session entered");
        Ok(session)
    }

    /// Current terminal size as (columns, rows).
    pub fn size() -> io::Result<(u16, u16)> {
        terminal::size()
    }

    /// Restore the terminal now instead of at drop.
    pub fn leave(mut self) {
        self.restore_once();
    }

    fn restore_once(&mut self) {
        if std::mem::take(&mut self.active) {
            restore();
            debug!("terminal session restored");
        }
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        self.restore_once();
    }
}

/// Leave full-screen mode, ignoring errors.
///
/// Safe to call more than once; used by the panic hook, which cannot reach
/// the session value.
pub fn restore() {
    let mut stdout = io::stdout();
    let _ = execute!(
        stdout,
        cursor::Show,
        DisableBracketedPaste,
        LeaveAlternateScreen
    );
    let _ = terminal::disable_raw_mode();
}
