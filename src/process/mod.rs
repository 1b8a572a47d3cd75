//! Subprocess runner: one shell command fed from a capture buffer.
//!
//! Each [`Invocation`] owns three background threads:
//!
//! ```text
//!                 ┌──────────────┐  stdin   ┌─────────┐  stdout+stderr  ┌──────────────┐
//!  input buffer ─▶│ stdin feeder │ ───────▶ │  shell  │ ──────────────▶ │output collect│─▶ output buffer
//!                 └──────────────┘          └─────────┘                 └──────────────┘
//!                                                ▲
//!                                     ┌──────────┴─┐
//!                                     │ supervisor │ ◀── cancel
//!                                     └────────────┘
//! ```
//!
//! The threads are started before the shell and handed their work once it
//! runs, so a failure to create them never leaves an unsupervised process.
//!
//! Cancellation is fire-and-forget: [`Invocation::cancel`] returns at once,
//! closes the output buffer, and the supervisor kills the process group. A
//! shell that already exited keeps its status; background jobs it left in
//! the group are killed all the same.

mod task;

pub use task::TaskStatus;

use crate::capture::{CaptureBuffer, CaptureWriter, ReadStatus, ReplayReader};
use crate::config::Config;
use crate::wake::Notifier;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use std::io::{self, PipeReader, Write};
use std::os::unix::process::CommandExt;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use task::Task;
use tracing::{debug, warn};

/// How often the supervisor checks whether the shell has exited.
const REAP_INTERVAL: Duration = Duration::from_millis(20);

/// Upper bound on a single wait of the stdin feeder.
const FEED_WAIT: Duration = Duration::from_millis(100);

/// Size of the stdin feeder's copy buffer.
const FEED_CHUNK: usize = 64 * 1024;

/// Starts shell commands against a shared input buffer.
#[derive(Debug, Clone)]
pub struct Spawner {
    shell: String,
    capacity: usize,
    notifier: Notifier,
}

impl Spawner {
    /// Create a spawner that runs `<shell> -c <command>` and gives each
    /// invocation an output buffer of `capacity` bytes.
    pub fn new(shell: impl Into<String>, capacity: usize, notifier: Notifier) -> Self {
        Self {
            shell: shell.into(),
            capacity,
            notifier,
        }
    }

    /// Build a spawner from the application config.
    pub fn from_config(config: &Config, notifier: Notifier) -> Self {
        Self::new(config.shell.clone(), config.capacity, notifier)
    }

    /// The shell interpreter commands are handed to.
    pub fn shell(&self) -> &str {
        &self.shell
    }

    /// Start `command` with a fresh reader over `input` as its stdin.
    ///
    /// Never fails: if the shell or its threads cannot be started, the
    /// error text is written into the invocation's output buffer.
    pub fn start(&self, input: &Arc<CaptureBuffer>, command: &str) -> Invocation {
        let (mut writer, output) = CaptureBuffer::create(self.capacity, self.notifier.clone());
        let (cancel_tx, cancel_rx) = bounded(1);
        let task = Arc::new(Task::new(TaskStatus::Running));

        let launched = Workers::spawn(&task, &output, cancel_rx).and_then(|workers| {
            let (child, pipe) = self.spawn_child(command)?;
            Ok((workers, child, pipe))
        });
        let task = match launched {
            Ok((workers, child, pipe)) => {
                debug!(pid = child.id(), command, "started command");
                workers.run(child, pipe, writer, input.new_reader());
                task
            }
            Err(e) => {
                warn!(shell = %self.shell, command, error = %e, "failed to start command");
                writer.push(format!("up: {e}").as_bytes());
                writer.finish();
                Arc::new(Task::new(TaskStatus::FailedToStart))
            }
        };

        Invocation {
            command: command.to_string(),
            output,
            task,
            cancel: cancel_tx,
        }
    }

    fn spawn_child(&self, command: &str) -> io::Result<(Child, PipeReader)> {
        let (reader, writer) = io::pipe()?;
        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c")
            .arg(command)
            .stdin(Stdio::piped())
            .stdout(writer.try_clone()?)
            .stderr(writer)
            .process_group(0);
        let child = cmd.spawn()?;
        // The parent's copies of the write end must close, or the
        // collector never sees end-of-stream.
        drop(cmd);
        Ok((child, reader))
    }
}

/// The threads of one invocation, parked until the shell is running.
struct Workers {
    output: Sender<(PipeReader, CaptureWriter)>,
    stdin: Sender<(ReplayReader, ChildStdin)>,
    reaper: Sender<Child>,
}

impl Workers {
    fn spawn(task: &Arc<Task>, output: &Arc<CaptureBuffer>, cancel: Receiver<()>) -> io::Result<Self> {
        let collector = spawn_worker("up-output", |job: (PipeReader, CaptureWriter)| {
            let (pipe, mut writer) = job;
            if let Err(e) = writer.append(pipe) {
                warn!(error = %e, "reading command output failed");
            }
        })?;

        let feeder_task = Arc::clone(task);
        let stdin = spawn_worker("up-stdin", move |job: (ReplayReader, ChildStdin)| {
            let (reader, stdin) = job;
            feed(reader, stdin, &feeder_task);
        })?;

        let reaper_task = Arc::clone(task);
        let buffer = Arc::clone(output);
        let reaper = spawn_worker("up-reaper", move |child: Child| {
            supervise(child, &cancel, &buffer, &reaper_task);
        })?;

        Ok(Self {
            output: collector,
            stdin,
            reaper,
        })
    }

    fn run(self, mut child: Child, pipe: PipeReader, writer: CaptureWriter, reader: ReplayReader) {
        // Each worker is parked in recv(), so these sends cannot fail
        let _ = self.output.send((pipe, writer));
        if let Some(stdin) = child.stdin.take() {
            let _ = self.stdin.send((reader, stdin));
        }
        let _ = self.reaper.send(child);
    }
}

/// Start a named thread that runs `work` on the first job sent to it.
///
/// Dropping the returned sender without sending ends the thread.
fn spawn_worker<T: Send + 'static>(
    name: &str,
    work: impl FnOnce(T) + Send + 'static,
) -> io::Result<Sender<T>> {
    let (sender, receiver) = bounded(1);
    thread::Builder::new().name(name.to_string()).spawn(move || {
        if let Ok(job) = receiver.recv() {
            work(job);
        }
    })?;
    Ok(sender)
}

/// One run of a command line against the captured input.
///
/// Dropping an invocation cancels it.
#[derive(Debug)]
pub struct Invocation {
    command: String,
    output: Arc<CaptureBuffer>,
    task: Arc<Task>,
    cancel: Sender<()>,
}

impl Invocation {
    /// The command text this invocation was started with.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// The buffer collecting combined stdout/stderr.
    pub const fn output(&self) -> &Arc<CaptureBuffer> {
        &self.output
    }

    /// Current status of the supervised process.
    pub fn status(&self) -> TaskStatus {
        self.task.status()
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    pub fn is_canceled(&self) -> bool {
        self.task.is_canceled()
    }

    /// Ask the process group to terminate. Idempotent and non-blocking.
    ///
    /// The output buffer stops collecting at once, even if the shell has
    /// already exited and only its background jobs are still writing.
    pub fn cancel(&self) {
        if self.task.mark_canceled() {
            debug!(command = %self.command, "canceling command");
            let _ = self.cancel.try_send(());
            self.output.close();
        }
    }

    /// Wait up to `timeout` for the process to be reaped.
    pub fn wait_timeout(&self, timeout: Duration) -> TaskStatus {
        self.task.wait_timeout(timeout)
    }
}

impl Drop for Invocation {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Copy the replayed input into the child's stdin.
///
/// Dropping `stdin` on return is what delivers end-of-file to the child.
fn feed(mut reader: ReplayReader, mut stdin: ChildStdin, task: &Task) {
    let mut chunk = vec![0u8; FEED_CHUNK];
    while !task.is_canceled() {
        match reader.try_read(&mut chunk) {
            ReadStatus::Ready(n) => {
                if let Err(e) = stdin.write_all(&chunk[..n]) {
                    // Commands that ignore their input close it early
                    debug!(error = %e, fed = reader.position(), "stdin closed by command");
                    return;
                }
            }
            ReadStatus::Pending => {
                reader.wait(FEED_WAIT);
            }
            ReadStatus::Exhausted => return,
        }
    }
}

/// Reap the shell, killing its process group first if canceled.
///
/// After a normal exit the group lives on while background jobs hold the
/// output pipe; a later cancel still kills them.
fn supervise(mut child: Child, cancel: &Receiver<()>, output: &CaptureBuffer, task: &Task) {
    let pid = child.id();
    let status = loop {
        match cancel.recv_timeout(REAP_INTERVAL) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                // Not yet reaped, so the group id cannot have been recycled
                kill_group(pid);
                let _ = child.wait();
                break TaskStatus::Canceled;
            }
            Err(RecvTimeoutError::Timeout) => match child.try_wait() {
                Ok(Some(exit)) => break TaskStatus::Exited(exit.code()),
                Ok(None) => {}
                Err(e) => {
                    warn!(pid, error = %e, "waiting for command failed");
                    break TaskStatus::Exited(None);
                }
            },
        }
    };
    debug!(pid, ?status, "command finished");
    task.finish(status);
    if status == TaskStatus::Canceled {
        return;
    }

    // The group id stays reserved while any member is alive
    while !output.state().is_finished() {
        match cancel.recv_timeout(REAP_INTERVAL) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                kill_group(pid);
                return;
            }
            Err(RecvTimeoutError::Timeout) => {}
        }
    }
    // Canceling closes the output, which can end the wait above first
    if cancel.try_recv().is_ok() {
        kill_group(pid);
    }
}

fn kill_group(pid: u32) {
    let Ok(raw) = i32::try_from(pid) else {
        return;
    };
    if let Err(e) = killpg(Pid::from_raw(raw), Signal::SIGKILL) {
        debug!(pid, error = %e, "killpg failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::CaptureState;

    const TIMEOUT: Duration = Duration::from_secs(10);

    fn input(bytes: &[u8]) -> Arc<CaptureBuffer> {
        let (mut writer, buffer) = CaptureBuffer::create(1 << 20, Notifier::none());
        writer.push(bytes);
        writer.finish();
        buffer
    }

    fn spawner() -> Spawner {
        Spawner::new("sh", 1 << 20, Notifier::none())
    }

    fn run_to_end(spawner: &Spawner, input: &Arc<CaptureBuffer>, command: &str) -> Vec<u8> {
        let invocation = spawner.start(input, command);
        assert!(invocation.output().wait_finished(TIMEOUT), "output never finished");
        invocation.output().snapshot().to_vec()
    }

    #[test]
    fn test_runs_command_on_input() {
        let out = run_to_end(&spawner(), &input(b"b\na\nc\n"), "sort");
        assert_eq!(out, b"a\nb\nc\n");
    }

    #[test]
    fn test_stderr_is_captured() {
        let out = run_to_end(&spawner(), &input(b""), "echo oops 1>&2");
        assert_eq!(out, b"oops\n");
    }

    #[test]
    fn test_nonzero_exit_is_just_output() {
        let invocation = spawner().start(&input(b""), "printf partial; exit 3");
        assert_eq!(invocation.wait_timeout(TIMEOUT), TaskStatus::Exited(Some(3)));
        assert!(invocation.output().wait_finished(TIMEOUT));
        assert_eq!(invocation.output().snapshot().to_vec(), b"partial");
    }

    #[test]
    fn test_launch_failure_becomes_output() {
        let spawner = Spawner::new("/nonexistent/shell-for-up-tests", 1024, Notifier::none());
        let invocation = spawner.start(&input(b"hello"), "cat");

        assert_eq!(invocation.status(), TaskStatus::FailedToStart);
        assert_eq!(invocation.output().state(), CaptureState::Complete);
        let text = String::from_utf8(invocation.output().snapshot().to_vec()).unwrap();
        assert!(text.starts_with("up: "), "unexpected output: {text}");
    }

    #[test]
    fn test_cancel_kills_process_group() {
        let invocation = spawner().start(&input(b""), "sleep 30 | sleep 30");
        invocation.cancel();
        invocation.cancel();

        assert!(invocation.is_canceled());
        assert_eq!(invocation.wait_timeout(TIMEOUT), TaskStatus::Canceled);
        // Canceled output stops collecting without waiting for the pipe
        assert!(invocation.output().wait_finished(TIMEOUT));
    }

    #[test]
    fn test_cancel_after_exit_stops_background_output() {
        let invocation = spawner().start(&input(b""), "(sleep 1; echo late) &");
        assert_eq!(invocation.wait_timeout(TIMEOUT), TaskStatus::Exited(Some(0)));
        assert_eq!(invocation.output().state(), CaptureState::Collecting);

        invocation.cancel();
        assert!(invocation.output().wait_finished(Duration::from_millis(500)));
        thread::sleep(Duration::from_millis(1500));

        assert!(invocation.output().snapshot().is_empty());
        assert_eq!(invocation.status(), TaskStatus::Exited(Some(0)));
    }

    #[test]
    fn test_worker_runs_first_job() {
        let (done_tx, done_rx) = bounded(1);
        let jobs = spawn_worker("up-test", move |n: u32| {
            let _ = done_tx.send(n * 2);
        })
        .unwrap();
        jobs.send(21).unwrap();
        assert_eq!(done_rx.recv_timeout(TIMEOUT), Ok(42));
    }

    #[test]
    fn test_unused_worker_exits() {
        let (done_tx, done_rx) = bounded::<u32>(1);
        let jobs = spawn_worker("up-test", move |n: u32| {
            let _ = done_tx.send(n);
        })
        .unwrap();
        drop(jobs);
        // The closure, and with it the only sender, is dropped on exit
        assert_eq!(done_rx.recv_timeout(TIMEOUT), Err(RecvTimeoutError::Disconnected));
    }

    #[test]
    fn test_reads_input_while_it_grows() {
        let (mut writer, buffer) = CaptureBuffer::create(1 << 20, Notifier::none());
        writer.push(b"first\n");

        let invocation = spawner().start(&buffer, "head -n 1");
        assert!(invocation.output().wait_finished(TIMEOUT));
        assert_eq!(invocation.output().snapshot().to_vec(), b"first\n");

        writer.push(b"second\n");
        assert_eq!(buffer.state(), CaptureState::Collecting);
    }

    #[test]
    fn test_identical_runs_identical_output() {
        let data: String = (0..2000).map(|i| format!("line {}\n", i * 7 % 13)).collect();
        let data = data.into_bytes();
        let input = input(&data);
        let spawner = spawner();
        let first = run_to_end(&spawner, &input, "sort | uniq -c");
        let second = run_to_end(&spawner, &input, "sort | uniq -c");
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }
}
