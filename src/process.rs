//! Runs an external command to completion with a hard timeout, capturing its
//! output. See [`run`].

use std::fmt;
use std::io::{self, Read};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// The captured result of a command that ran to completion.
#[derive(Debug)]
pub struct Output {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

impl Output {
    /// Returns at most the last `n` lines of stdout, ignoring trailing blank
    /// space.
    pub fn stdout_tail(&self, n: usize) -> Vec<&str> {
        let lines: Vec<&str> = self.stdout.trim().lines().collect();
        lines[lines.len().saturating_sub(n)..].to_vec()
    }
}

/// Runs `program` with `args` in `cwd` and waits for it to exit, killing it
/// once `timeout` has passed. Stdout and stderr are drained on their own
/// threads so a chatty child can't block on a full pipe. The timeout also
/// bounds collecting the output: a background process that inherited the
/// pipes can keep them open after the child itself has exited.
pub fn run(program: &str, args: &[String], cwd: &Path, timeout: Duration) -> Result<Output> {
    let start = Instant::now();
    let deadline = start + timeout;
    let mut child = match Command::new(program)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(Error::NotFound(program.to_owned()))
        }
        Err(e) => return Err(Error::Io(e)),
    };
    tracing::debug!(program, pid = child.id(), "spawned");

    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {}
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(Error::Io(e));
            }
        }
        let now = Instant::now();
        if now >= deadline {
            tracing::warn!(program, ?timeout, "timed out; killing");
            let _ = child.kill();
            let _ = child.wait();
            // The reader threads are left detached: grandchildren may still
            // hold the pipes open.
            return Err(Error::TimedOut(timeout));
        }
        thread::sleep(POLL_INTERVAL.min(deadline - now));
    };

    let stdout = collect(&stdout, deadline, timeout)?;
    let stderr = collect(&stderr, deadline, timeout)?;
    let output = Output {
        status,
        stdout,
        stderr,
        elapsed: start.elapsed(),
    };
    tracing::debug!(program, status = %output.status, elapsed = ?output.elapsed, "exited");
    Ok(output)
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Receiver<io::Result<String>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        let result = match pipe {
            Some(mut pipe) => pipe.read_to_end(&mut buf).map(|_| ()),
            None => Ok(()),
        };
        // The receiver is gone if `run` already gave up on this stream.
        let _ = tx.send(result.map(|()| String::from_utf8_lossy(&buf).into_owned()));
    });
    rx
}

fn collect(rx: &Receiver<io::Result<String>>, deadline: Instant, timeout: Duration) -> Result<String> {
    let remaining = deadline.saturating_duration_since(Instant::now());
    match rx.recv_timeout(remaining) {
        Ok(result) => Ok(result?),
        Err(RecvTimeoutError::Timeout) => {
            tracing::warn!(?timeout, "output pipes still open at the deadline");
            Err(Error::TimedOut(timeout))
        }
        Err(RecvTimeoutError::Disconnected) => Err(Error::Io(io::Error::new(
            io::ErrorKind::Other,
            "output reader thread panicked",
        ))),
    }
}

/// Represents the result of a [`run`] operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a command that didn't run to completion.
#[derive(Debug)]
pub enum Error {
    /// Returned when the program isn't installed (or isn't on `PATH`).
    NotFound(String),

    /// Returned when the command ran past its timeout and was killed.
    TimedOut(Duration),

    /// Returned for other I/O errors spawning or waiting on the command.
    Io(io::Error),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::NotFound(program) => write!(f, "command `{}` not found", program),
            Error::TimedOut(timeout) => {
                write!(f, "timed out after {} seconds", timeout.as_secs())
            }
            Error::Io(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::NotFound(_) => None,
            Error::TimedOut(_) => None,
            Error::Io(err) => Some(err),
        }
    }
}

impl From<io::Error> for Error {
    /// Converts a [`io::Error`] into an [`Error`]. It allows us to use the
    /// `?` operator for waiting on the child.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}
