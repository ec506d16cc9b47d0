// Line transports to the ESP300
//
// The controller speaks one ASCII command per line. A bridge only moves lines:
// it writes a command, optionally reads back one reply line, and knows nothing
// about axes or opcodes.

mod serial;
mod tcp;

#[cfg(test)]
pub(crate) mod mock;

pub use serial::SerialPortBridge;
pub use tcp::TcpBridge;

use std::io::{self, BufRead, BufReader, ErrorKind, Read, Write};
use tracing::{debug, warn};

/// Command terminator expected by the controller
pub const COMMAND_TERMINATOR: &str = "\r";

/// Error types for bridge communication
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Timeout waiting for reply to {command:?}")]
    Timeout { command: String },

    #[error("Connection closed by peer while waiting for reply to {command:?}")]
    Closed { command: String },

    #[error("Bridge is not connected")]
    NotConnected,
}

pub type Result<T> = std::result::Result<T, BridgeError>;

/// A line-oriented link to a motion controller.
///
/// Calls block until the line is written and, when `expect_response` is set,
/// until one reply line has been read. Implementations must not reorder lines.
pub trait SerialBridge {
    /// Open the underlying connection
    fn connect(&mut self) -> Result<()>;

    /// Send one command line, returning the trimmed reply (empty when no
    /// reply was requested)
    fn send(&mut self, command: &str, expect_response: bool) -> Result<String>;

    /// Close the connection. Calling this on a closed bridge is a no-op.
    fn disconnect(&mut self) -> Result<()>;
}

impl<B: SerialBridge + ?Sized> SerialBridge for Box<B> {
    fn connect(&mut self) -> Result<()> {
        (**self).connect()
    }

    fn send(&mut self, command: &str, expect_response: bool) -> Result<String> {
        (**self).send(command, expect_response)
    }

    fn disconnect(&mut self) -> Result<()> {
        (**self).disconnect()
    }
}

/// Longest reply line accepted before the link is considered garbled
pub const MAX_REPLY_LEN: usize = 256;

/// Write a terminated command and optionally read one reply line
///
/// Shared by the TCP and serial transports. A read that ends without a newline
/// means the peer hung up; a timed-out read is reported against the command.
pub(crate) fn exchange<S>(
    link: &mut BufReader<S>,
    command: &str,
    expect_response: bool,
) -> Result<String>
where
    S: Read + Write,
{
    let stream = link.get_mut();
    stream.write_all(command.as_bytes())?;
    stream.write_all(COMMAND_TERMINATOR.as_bytes())?;
    stream.flush()?;

    if !expect_response {
        return Ok(String::new());
    }

    let mut line = Vec::new();
    link.by_ref()
        .take(MAX_REPLY_LEN as u64)
        .read_until(b'\n', &mut line)
        .map_err(|e| match e.kind() {
            ErrorKind::TimedOut | ErrorKind::WouldBlock => BridgeError::Timeout {
                command: command.to_string(),
            },
            _ => BridgeError::Io(e),
        })?;

    if line.last() != Some(&b'\n') {
        if line.len() >= MAX_REPLY_LEN {
            return Err(BridgeError::Io(io::Error::new(
                ErrorKind::InvalidData,
                format!("reply to {:?} exceeds {} bytes", command, MAX_REPLY_LEN),
            )));
        }
        return Err(BridgeError::Closed {
            command: command.to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&line).trim().to_string())
}

/// Run one exchange on an open link, dropping the link if it fails
///
/// After a timeout or a broken read the controller may still deliver the
/// pending reply, which would then answer the next query. The link is closed
/// instead, so later sends fail with `NotConnected` until reconnected.
pub(crate) fn send_line<S>(
    link: &mut Option<BufReader<S>>,
    command: &str,
    expect_response: bool,
) -> Result<String>
where
    S: Read + Write,
{
    let stream = link.as_mut().ok_or(BridgeError::NotConnected)?;
    debug!("-> {}", command);
    match exchange(stream, command, expect_response) {
        Ok(reply) => {
            if expect_response {
                debug!("<- {}", reply);
            }
            Ok(reply)
        }
        Err(e) => {
            warn!("Dropping controller link after failed exchange: {}", e);
            *link = None;
            Err(e)
        }
    }
}
