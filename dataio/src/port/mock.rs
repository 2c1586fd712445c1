//! Scripted in-memory port used by the unit tests.

use std::collections::VecDeque;
use std::io::{Read, Write};
use std::time::Duration;

use crate::error::Result;
use crate::port::Port;
use crate::protocol::DEFAULT_TIMEOUT;

type Responder = Box<dyn FnMut(&str) -> Vec<u8> + Send>;

/// Mock serial port that answers each carriage-return terminated command.
///
/// Reads and writes are independent: written bytes are split into commands,
/// and every complete command queues the responder's answer for reading.
/// An empty read buffer reports `TimedOut`, like a quiet serial line.
pub(crate) struct MockPort {
    responder: Responder,
    pending: VecDeque<u8>,
    current: Vec<u8>,
    /// Commands received, without the trailing carriage return.
    pub commands: Vec<String>,
    /// Every value passed to `set_timeout`, in order.
    pub timeout_history: Vec<Duration>,
    timeout: Duration,
    /// Fail reads after this many commands have been received.
    pub fail_reads_after: Option<usize>,
    /// Fail every `set_timeout` call.
    pub fail_set_timeout: bool,
    pub closed: bool,
}

impl MockPort {
    /// Port answering each command with `responder(command)`.
    pub fn with_responder<F>(responder: F) -> Self
    where
        F: FnMut(&str) -> Vec<u8> + Send + 'static,
    {
        Self {
            responder: Box::new(responder),
            pending: VecDeque::new(),
            current: Vec::new(),
            commands: Vec::new(),
            timeout_history: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            fail_reads_after: None,
            fail_set_timeout: false,
            closed: false,
        }
    }

    /// Port answering commands with the given responses, in order.
    pub fn scripted(responses: &[&str]) -> Self {
        let mut queue: VecDeque<Vec<u8>> = responses
            .iter()
            .map(|r| r.as_bytes().to_vec())
            .collect();
        Self::with_responder(move |_| queue.pop_front().unwrap_or_default())
    }
}

impl Read for MockPort {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.closed {
            return Err(std::io::Error::new(std::io::ErrorKind::NotConnected, "port closed"));
        }
        if self
            .fail_reads_after
            .is_some_and(|n| self.commands.len() > n)
        {
            return Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "line dropped"));
        }
        if self.pending.is_empty() {
            return Err(std::io::Error::new(std::io::ErrorKind::TimedOut, "no data"));
        }
        let n = buf.len().min(self.pending.len());
        for b in buf.iter_mut().take(n) {
            *b = self.pending.pop_front().unwrap();
        }
        Ok(n)
    }
}

impl Write for MockPort {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if self.closed {
            return Err(std::io::Error::new(std::io::ErrorKind::NotConnected, "port closed"));
        }
        for &byte in buf {
            if byte == b'\r' {
                let command = String::from_utf8_lossy(&self.current).into_owned();
                self.current.clear();
                let response = (self.responder)(&command);
                self.pending.extend(response);
                self.commands.push(command);
            } else {
                self.current.push(byte);
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Port for MockPort {
    fn set_timeout(&mut self, timeout: Duration) -> Result<()> {
        self.timeout_history.push(timeout);
        if self.fail_set_timeout {
            return Err(std::io::Error::other("cannot configure port").into());
        }
        self.timeout = timeout;
        Ok(())
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn clear_buffers(&mut self) -> Result<()> {
        self.pending.clear();
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}
