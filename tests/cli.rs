//! Startup checks of the `up` binary.

use nix::pty::{openpty, Winsize};
use nix::sys::termios::Termios;
use std::process::{Command, Stdio};

#[test]
fn test_refuses_terminal_stdin() {
    let pty = openpty(None::<&Winsize>, None::<&Termios>).unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_up"))
        .stdin(Stdio::from(pty.slave))
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("requires some data piped on standard input"),
        "unexpected stderr: {stderr}"
    );
}

#[test]
fn test_help_lists_flags() {
    let output = Command::new(env!("CARGO_BIN_EXE_up"))
        .arg("--help")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for flag in ["--shell", "--buffer-size", "--prompt", "--log-file", "--no-status"] {
        assert!(stdout.contains(flag), "missing {flag} in: {stdout}");
    }
}
