//! Streaming subprocess output line by line

use std::fmt;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::task::{AbortHandle, JoinHandle};

use crate::logging::{Level, Logger};

/// Callback invoked once per output line
pub type LineCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Time the readers get to drain a killed process tree's pipes
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Where a child's output stream goes when it is not captured
#[derive(Clone, Default)]
pub enum OutputSink {
    /// Share the parent's stream
    #[default]
    Inherit,
    /// Discard
    Null,
    /// Call back on every line
    Lines(LineCallback),
}

impl OutputSink {
    pub fn lines<F>(callback: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        OutputSink::Lines(Arc::new(callback))
    }

    /// Forward every line to `logger` at `level`.
    pub fn logger(logger: Arc<dyn Logger>, level: Level) -> Self {
        Self::lines(move |line| logger.log(level, line))
    }

    pub(crate) fn stdio(&self) -> Stdio {
        match self {
            OutputSink::Inherit => Stdio::inherit(),
            OutputSink::Null => Stdio::null(),
            OutputSink::Lines(_) => Stdio::piped(),
        }
    }
}

impl fmt::Debug for OutputSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputSink::Inherit => f.write_str("Inherit"),
            OutputSink::Null => f.write_str("Null"),
            OutputSink::Lines(_) => f.write_str("Lines(..)"),
        }
    }
}

/// Incremental splitter for `\n`, `\r\n` and bare `\r` terminated lines.
///
/// Carriage-return-only updates (progress bars) become separate lines;
/// terminators are never part of the emitted text.
#[derive(Debug, Default)]
pub struct LineSplitter {
    buffer: Vec<u8>,
    pending_cr: bool,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk, returning every line it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &byte in chunk {
            if self.pending_cr {
                self.pending_cr = false;
                if byte == b'\n' {
                    continue;
                }
            }

            match byte {
                b'\n' => lines.push(self.take()),
                b'\r' => {
                    lines.push(self.take());
                    self.pending_cr = true;
                }
                _ => self.buffer.push(byte),
            }
        }
        lines
    }

    /// The unterminated remainder, if any.
    pub fn finish(&mut self) -> Option<String> {
        self.pending_cr = false;
        if self.buffer.is_empty() {
            None
        } else {
            Some(self.take())
        }
    }

    fn take(&mut self) -> String {
        let line = String::from_utf8_lossy(&self.buffer).into_owned();
        self.buffer.clear();
        line
    }
}

/// Background consumer of one child stream
pub(crate) enum Reader {
    Capture(JoinHandle<Vec<u8>>),
    Forward(JoinHandle<()>),
}

impl Reader {
    /// Capture the whole stream, or forward it line by line to `sink`.
    pub(crate) fn start<R>(pipe: R, capture: bool, sink: &OutputSink) -> Option<Self>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        if capture {
            return Some(Reader::Capture(tokio::spawn(read_to_end(pipe))));
        }

        match sink {
            OutputSink::Lines(callback) => Some(Reader::Forward(tokio::spawn(forward_lines(
                pipe,
                Arc::clone(callback),
            )))),
            OutputSink::Inherit | OutputSink::Null => None,
        }
    }

    pub(crate) fn abort_handle(&self) -> AbortHandle {
        match self {
            Reader::Capture(handle) => handle.abort_handle(),
            Reader::Forward(handle) => handle.abort_handle(),
        }
    }

    /// Wait for the stream to end, returning captured bytes.
    pub(crate) async fn join(self) -> Option<Vec<u8>> {
        match self {
            Reader::Capture(handle) => match handle.await {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    warn!("Output reader failed: {}", e);
                    Some(Vec::new())
                }
            },
            Reader::Forward(handle) => {
                if let Err(e) = handle.await {
                    warn!("Output reader failed: {}", e);
                }
                None
            }
        }
    }

    /// Like [`join`](Self::join), but abort the reader if the stream stays
    /// open past a short grace period (e.g. held by an escaped grandchild).
    pub(crate) async fn drain(self) -> Option<Vec<u8>> {
        match self {
            Reader::Capture(mut handle) => {
                match tokio::time::timeout(DRAIN_GRACE, &mut handle).await {
                    Ok(Ok(bytes)) => Some(bytes),
                    Ok(Err(_)) => Some(Vec::new()),
                    Err(_) => {
                        handle.abort();
                        let _ = handle.await;
                        Some(Vec::new())
                    }
                }
            }
            Reader::Forward(mut handle) => {
                if tokio::time::timeout(DRAIN_GRACE, &mut handle).await.is_err() {
                    handle.abort();
                    let _ = handle.await;
                }
                None
            }
        }
    }
}

async fn read_to_end<R>(mut pipe: R) -> Vec<u8>
where
    R: AsyncRead + Unpin,
{
    let mut bytes = Vec::new();
    if let Err(e) = pipe.read_to_end(&mut bytes).await {
        debug!("Output pipe closed early: {}", e);
    }
    bytes
}

async fn forward_lines<R>(mut pipe: R, callback: LineCallback)
where
    R: AsyncRead + Unpin,
{
    let mut splitter = LineSplitter::new();
    let mut buf = [0u8; 8192];

    loop {
        match pipe.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                for line in splitter.push(&buf[..n]) {
                    callback(&line);
                }
            }
            Err(e) => {
                debug!("Output pipe closed early: {}", e);
                break;
            }
        }
    }

    if let Some(line) = splitter.finish() {
        callback(&line);
    }
}
