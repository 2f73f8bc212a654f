//! Running a child with its stdout and stderr merged onto one pipe.
//!
//! The parent keeps only the read end. A reader thread drains it while the
//! calling thread waits on the child, so a child that writes more than the
//! pipe can hold never blocks against a parent stuck in `wait`.

use std::io::{self, Read};
use std::os::unix::process::CommandExt;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use wait_timeout::ChildExt;

use crate::error::ShellError;

/// Size of the temporary buffer used when draining the capture pipe.
const PIPE_CHUNK_SIZE: usize = 8192;

/// What a finished child left behind.
#[derive(Debug)]
pub struct Captured {
    /// Combined stdout/stderr, at most `limit` bytes of it.
    pub bytes: Vec<u8>,
    /// The child wrote more than `limit` bytes.
    pub truncated: bool,
    /// `None` when the child was killed after the timeout.
    pub status: Option<ExitStatus>,
}

impl Captured {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// Spawns `command`, captures its merged output and waits for it.
///
/// Stdin is closed. The child leads its own process group so a timeout can
/// take down everything it started, pipelines included. Whatever is still in
/// the group once the child has exited is killed as well.
pub fn run_captured(
    mut command: Command,
    limit: usize,
    timeout: Option<Duration>,
) -> Result<Captured, ShellError> {
    let program = command.get_program().to_string_lossy().into_owned();
    let (reader, writer) = io::pipe()?;

    command
        .stdin(Stdio::null())
        .stdout(writer.try_clone()?)
        .stderr(writer)
        .process_group(0);

    let spawned = command.spawn();
    // The command still owns our copies of the write end; the reader only
    // sees end-of-stream once they are gone.
    drop(command);
    let mut child = spawned.map_err(|err| ShellError::spawn(&program, err))?;
    tracing::info!(program = %program, pid = child.id(), "spawned child");

    let drain = thread::spawn(move || read_capped(reader, limit));

    let pgid = child.id() as libc::pid_t;
    let waited = wait_for_exit(&mut child, timeout);
    if waited.is_err() {
        kill_group(&mut child);
    }
    // Background jobs the child left behind would keep the write end open
    // past any deadline.
    signal_group(pgid);

    let (bytes, truncated) = drain
        .join()
        .map_err(|_| io::Error::other("pipe reader panicked"))??;
    let status = waited?;

    if truncated {
        tracing::warn!(program = %program, limit, "output truncated");
    }

    Ok(Captured {
        bytes,
        truncated,
        status,
    })
}

fn wait_for_exit(child: &mut Child, timeout: Option<Duration>) -> Result<Option<ExitStatus>, ShellError> {
    let Some(timeout) = timeout else {
        return Ok(Some(child.wait()?));
    };

    if let Some(status) = child.wait_timeout(timeout)? {
        return Ok(Some(status));
    }

    tracing::warn!(pid = child.id(), ?timeout, "command timed out; killing process group");
    kill_group(child);
    if let Err(err) = child.wait() {
        tracing::warn!("failed to reap timed-out command: {err}");
    }
    Ok(None)
}

fn kill_group(child: &mut Child) {
    if !signal_group(child.id() as libc::pid_t) {
        if let Err(err) = child.kill() {
            tracing::warn!("failed to kill timed-out command: {err}");
        }
    }
}

/// Sends SIGKILL to every process left in the group. Returns `false` if no
/// process received it.
fn signal_group(pgid: libc::pid_t) -> bool {
    // SAFETY: kill(2) with a negative pid only sends a signal; the group was
    // created for the child by `process_group(0)`.
    let ret = unsafe { libc::kill(-pgid, libc::SIGKILL) };
    if ret == 0 {
        tracing::debug!(pgid, "killed leftover process group members");
    }
    ret == 0
}

/// Reads until end-of-stream, keeping the first `limit` bytes and discarding
/// the rest.
fn read_capped<R: Read>(mut reader: R, limit: usize) -> io::Result<(Vec<u8>, bool)> {
    let mut kept = Vec::new();
    let mut truncated = false;
    let mut chunk = [0_u8; PIPE_CHUNK_SIZE];

    loop {
        let read = match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        };
        let room = limit.saturating_sub(kept.len());
        if read > room {
            truncated = true;
        }
        kept.extend_from_slice(&chunk[..read.min(room)]);
    }

    Ok((kept, truncated))
}
