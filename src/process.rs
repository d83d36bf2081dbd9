use std::ffi::OsStr;
use std::fmt;
use std::io::{self, Read};
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};
use thiserror::Error;
use tracing::{debug, warn};

const CHUNK_SIZE: usize = 8192;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => write!(f, "standard output"),
            Self::Stderr => write!(f, "standard error"),
        }
    }
}

/// Captured output of a finished child process
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionResult {
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    /// Both streams, chunk by chunk, in the order the chunks were received
    pub combined: String,
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("the program '{0}' was not found")]
    ProgramNotFound(String),
    #[error("failed to launch '{program}'")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("{0} was not captured")]
    PipeNotCaptured(Stream),
    #[error("failed to read {stream}")]
    Read {
        stream: Stream,
        #[source]
        source: io::Error,
    },
    #[error("failed to wait for the process")]
    Wait(#[source] io::Error),
}

impl RunError {
    /// The process never started
    pub fn is_launch_error(&self) -> bool {
        matches!(self, Self::ProgramNotFound(_) | Self::Launch { .. })
    }
}

enum Event {
    Chunk(Stream, Vec<u8>),
    Failed(Stream, io::Error),
}

#[derive(Default)]
struct Buffers {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    combined: Vec<u8>,
}

impl Buffers {
    fn append(&mut self, stream: Stream, chunk: &[u8]) {
        match stream {
            Stream::Stdout => self.stdout.extend_from_slice(chunk),
            Stream::Stderr => self.stderr.extend_from_slice(chunk),
        }
        self.combined.extend_from_slice(chunk);
    }
}

/// Run `program` with `args` and capture its output
///
/// Stdout and stderr are read concurrently so that neither pipe can fill up
/// and stall the child. The interleaving in `combined` follows the order in
/// which chunks reach this process, which is best effort: two writes that
/// happen close together on different streams may be observed in either order.
///
/// There is no timeout. A child that never exits blocks the caller.
pub fn run<P, A>(program: P, args: &[A]) -> Result<ExecutionResult, RunError>
where
    P: AsRef<OsStr>,
    A: AsRef<OsStr>,
{
    let program = program.as_ref();
    let program_name = program.to_string_lossy().into_owned();

    let mut cmd = Command::new(program);
    cmd.args(args);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    let mut child = cmd.spawn().map_err(|source| RunError::Launch {
        program: program_name.clone(),
        source,
    })?;
    debug!(program = %program_name, pid = child.id(), "spawned process");

    let stdout = child
        .stdout
        .take()
        .ok_or(RunError::PipeNotCaptured(Stream::Stdout))?;
    let stderr = child
        .stderr
        .take()
        .ok_or(RunError::PipeNotCaptured(Stream::Stderr))?;

    let (sender, receiver) = mpsc::channel();
    let readers = [
        forward(stdout, Stream::Stdout, sender.clone()),
        forward(stderr, Stream::Stderr, sender),
    ];

    // Ends once both readers have hung up
    let mut buffers = Buffers::default();
    let mut read_error = None;
    for event in receiver {
        match event {
            Event::Chunk(stream, chunk) => buffers.append(stream, &chunk),
            Event::Failed(stream, source) => {
                read_error.get_or_insert(RunError::Read { stream, source });
            }
        }
    }

    for reader in readers {
        if reader.join().is_err() {
            warn!(program = %program_name, "output reader thread panicked");
        }
    }

    let exit_status = child.wait().map_err(RunError::Wait)?;
    debug!(program = %program_name, status = %exit_status, "process exited");

    if let Some(err) = read_error {
        return Err(err);
    }

    // Invalid UTF-8 becomes U+FFFD and is compared like any other output
    Ok(ExecutionResult {
        exit_code: exit_status.code(),
        stdout: decode(buffers.stdout),
        stderr: decode(buffers.stderr),
        combined: decode(buffers.combined),
    })
}

fn forward<R>(mut pipe: R, stream: Stream, events: Sender<Event>) -> JoinHandle<()>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut buf = [0u8; CHUNK_SIZE];
        loop {
            match pipe.read(&mut buf) {
                Ok(0) => return,
                Ok(n) => {
                    if events.send(Event::Chunk(stream, buf[..n].to_vec())).is_err() {
                        return;
                    }
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    let _ = events.send(Event::Failed(stream, err));
                    return;
                }
            }
        }
    })
}

fn decode(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes).unwrap_or_else(|err| String::from_utf8_lossy(err.as_bytes()).into_owned())
}
