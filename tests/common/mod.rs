//! Shared harness: an `App` drawing into memory, driven by synthetic keys.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;
use upview::{App, CaptureBuffer, Config, InputEvent, KeyCode, KeyModifiers, Notifier};

pub const TIMEOUT: Duration = Duration::from_secs(10);

pub const WIDTH: u16 = 60;
pub const HEIGHT: u16 = 12;

/// An input buffer that has already collected `bytes`.
pub fn finished_input(bytes: &[u8], capacity: usize) -> Arc<CaptureBuffer> {
    let (mut writer, buffer) = CaptureBuffer::create(capacity, Notifier::none());
    writer.push(bytes);
    writer.finish();
    buffer
}

pub struct Harness {
    pub app: App<Vec<u8>>,
}

impl Harness {
    pub fn new(input: &[u8]) -> Self {
        Self::with_config(input, Config { shell: "sh".into(), ..Config::default() })
    }

    pub fn with_config(input: &[u8], config: Config) -> Self {
        let buffer = finished_input(input, config.capacity);
        let app = App::new(&config, buffer, Notifier::none(), Vec::new(), (WIDTH, HEIGHT));
        Self { app }
    }

    pub fn type_text(&mut self, text: &str) {
        for c in text.chars() {
            self.press(KeyCode::Char(c));
        }
    }

    pub fn press(&mut self, code: KeyCode) {
        self.app.handle_event(&InputEvent::key(code)).unwrap();
    }

    pub fn ctrl(&mut self, c: char) {
        let event = InputEvent::Key {
            code: KeyCode::Char(c),
            modifiers: KeyModifiers::CONTROL,
        };
        self.app.handle_event(&event).unwrap();
    }

    /// Sync the controller and wait until the shown buffer stops growing.
    pub fn settle(&mut self) {
        self.app.sync();
        let active = Arc::clone(self.app.controller().active_buffer());
        assert!(active.wait_finished(TIMEOUT), "active buffer never finished");
    }

    /// The bytes of the buffer currently on screen.
    pub fn shown(&self) -> Vec<u8> {
        self.app.controller().active_buffer().snapshot().to_vec()
    }

    /// Draw and return the visible rows, trailing blanks trimmed.
    pub fn screen(&mut self) -> Vec<String> {
        self.app.draw().unwrap();
        let mut parser = vt100::Parser::new(HEIGHT, WIDTH, 0);
        parser.process(self.app.renderer().writer());
        parser
            .screen()
            .rows(0, WIDTH)
            .map(|row| row.trim_end().to_owned())
            .collect()
    }
}
