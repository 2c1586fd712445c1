//! Command/response link to the programmer.
//!
//! The link owns the port and keeps exactly one command in flight. A
//! response ends when the programmer goes quiet for the read timeout, so
//! each command may carry its own timeout; the override is always undone
//! before [`Link::send_command`] returns, whatever the outcome.

use {
    crate::{
        error::{Error, Result},
        port::Port,
        protocol::{COMMAND_TERMINATOR, Command, PROMPT},
    },
    log::{debug, info, trace, warn},
    std::{io::ErrorKind, time::Duration},
};

/// Serial link to a Data I/O programmer.
///
/// Generic over the port type `P`, so the same protocol code runs against a
/// real serial port or a scripted one.
pub struct Link<P: Port> {
    port: Option<P>,
    default_timeout: Duration,
}

impl<P: Port> Link<P> {
    /// Wrap an already opened port.
    ///
    /// The port's current timeout becomes the link's default timeout.
    pub fn new(port: P) -> Self {
        let default_timeout = port.timeout();
        Self {
            port: Some(port),
            default_timeout,
        }
    }

    /// Timeout restored after every per-command override.
    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Whether the link still holds an open port.
    pub fn is_connected(&self) -> bool {
        self.port
            .is_some()
    }

    /// Get a reference to the underlying port, if still open.
    pub fn port(&self) -> Option<&P> {
        self.port
            .as_ref()
    }

    /// Get a mutable reference to the underlying port, if still open.
    pub fn port_mut(&mut self) -> Option<&mut P> {
        self.port
            .as_mut()
    }

    /// Send a typed command with its own timeout.
    pub fn send(&mut self, command: Command) -> Result<String> {
        self.send_command(&command.text(), Some(command.timeout()))
    }

    /// Send `text` followed by a carriage return and collect the answer.
    ///
    /// With `timeout` set, the port's read timeout is overridden for this
    /// call only and set back to the default afterwards, also on error.
    /// The returned text is the decoded response with surrounding
    /// whitespace trimmed.
    pub fn send_command(&mut self, text: &str, timeout: Option<Duration>) -> Result<String> {
        let default_timeout = self.default_timeout;
        let port = self
            .port
            .as_mut()
            .ok_or(Error::NotConnected)?;

        let outcome = match timeout {
            Some(t) => port
                .set_timeout(t)
                .and_then(|()| exchange(port, text)),
            None => exchange(port, text),
        };

        if timeout.is_some() {
            if let Err(e) = port.set_timeout(default_timeout) {
                if outcome.is_ok() {
                    return Err(e);
                }
                warn!("Could not restore timeout after failed command: {e}");
            }
        }

        outcome
    }

    /// Confirm that the far end is a programmer in remote mode.
    ///
    /// The programmer must answer the wake-up sequence with exactly its
    /// prompt. On any other outcome the link is closed, so no block read
    /// can run over an unverified connection.
    pub fn handshake(&mut self) -> Result<()> {
        let Some(port) = self
            .port
            .as_mut()
        else {
            return Err(Error::NotConnected);
        };

        // Drop whatever the programmer printed before we attached
        let outcome = port
            .clear_buffers()
            .and_then(|()| self.send(Command::Handshake));
        let reason = match outcome {
            Ok(response) if response == PROMPT => {
                info!("Connected to Data I/O programmer");
                return Ok(());
            },
            Ok(response) => format!("unexpected response {response:?}"),
            Err(e) => e.to_string(),
        };

        warn!("Handshake failed: {reason}");
        self.close();
        Err(Error::HandshakeFailed(reason))
    }

    /// Release the port. Calling this on a closed link does nothing.
    pub fn close(&mut self) {
        if let Some(mut port) = self
            .port
            .take()
        {
            debug!("Closing {}", port.name());
            if let Err(e) = port.close() {
                warn!("Error while closing {}: {e}", port.name());
            }
        }
    }
}

/// Write one command and read until the line goes quiet.
fn exchange<P: Port>(port: &mut P, text: &str) -> Result<String> {
    if !text.is_ascii() {
        return Err(Error::Protocol(format!(
            "command {text:?} is not 7-bit ASCII"
        )));
    }

    let mut frame = String::with_capacity(text.len() + 1);
    frame.push_str(text);
    frame.push(COMMAND_TERMINATOR);
    port.write_all_bytes(frame.as_bytes())?;
    debug!("Command sent: {text:?}");

    let mut response = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        match port.read(&mut byte) {
            Ok(0) => break,
            Ok(_) => response.push(byte[0]),
            Err(e) if e.kind() == ErrorKind::TimedOut => break,
            Err(e) if e.kind() == ErrorKind::Interrupted => {},
            Err(e) => return Err(Error::Io(e)),
        }
    }
    trace!("Received {} bytes", response.len());

    decode_ascii(response)
}

fn decode_ascii(bytes: Vec<u8>) -> Result<String> {
    if let Some(pos) = bytes
        .iter()
        .position(|b| !b.is_ascii())
    {
        return Err(Error::Protocol(format!(
            "non-ASCII byte 0x{:02X} at offset {pos} in response",
            bytes[pos]
        )));
    }
    let text = String::from_utf8(bytes).map_err(|e| Error::Protocol(e.to_string()))?;
    Ok(text
        .trim()
        .to_string())
}

// Native-specific convenience functions
#[cfg(feature = "native")]
mod native_impl {
    use super::{Link, Result, info};
    use crate::port::{NativePort, SerialConfig};

    impl Link<NativePort> {
        /// Open the configured serial port.
        ///
        /// This does not talk to the programmer; call
        /// [`Link::handshake`] before issuing commands.
        pub fn connect(config: &SerialConfig) -> Result<Self> {
            let port = NativePort::open(config)?;
            info!(
                "Opened {} at {} baud",
                config.port_name, config.baud_rate
            );
            Ok(Self::new(port))
        }
    }
}
