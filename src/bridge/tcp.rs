// TCP link to a network serial bridge sitting in front of the controller

use std::io::{self, BufReader};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;
use tracing::info;

use super::{send_line, BridgeError, Result, SerialBridge};
use crate::config::{CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT};

/// Network serial bridge addressed by host and TCP port
pub struct TcpBridge {
    address: String,
    port: u16,
    read_timeout: Duration,
    stream: Option<BufReader<TcpStream>>,
}

impl TcpBridge {
    /// Create an unconnected bridge with the default read timeout
    pub fn new(address: &str, port: u16) -> Self {
        Self::with_read_timeout(address, port, DEFAULT_READ_TIMEOUT)
    }

    /// Create with a custom read timeout
    ///
    /// Position queries queued behind a `WS` only answer once the motion is
    /// done, so this must cover the longest expected move.
    pub fn with_read_timeout(address: &str, port: u16, read_timeout: Duration) -> Self {
        Self {
            address: address.to_string(),
            port,
            read_timeout,
            stream: None,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn open_stream(&self) -> io::Result<TcpStream> {
        let mut last_err = None;
        for addr in (self.address.as_str(), self.port).to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT) {
                Ok(stream) => {
                    stream.set_read_timeout(Some(self.read_timeout))?;
                    stream.set_nodelay(true)?;
                    return Ok(stream);
                }
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::AddrNotAvailable, "address resolved to nothing")
        }))
    }
}

impl SerialBridge for TcpBridge {
    fn connect(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }
        info!("Connecting to serial bridge at {}", self.endpoint());
        let stream = self.open_stream().map_err(|source| BridgeError::Connect {
            endpoint: self.endpoint(),
            source,
        })?;
        self.stream = Some(BufReader::new(stream));
        Ok(())
    }

    fn send(&mut self, command: &str, expect_response: bool) -> Result<String> {
        send_line(&mut self.stream, command, expect_response)
    }

    fn disconnect(&mut self) -> Result<()> {
        if let Some(stream) = self.stream.take() {
            info!("Disconnecting from serial bridge at {}", self.endpoint());
            match stream.get_ref().shutdown(Shutdown::Both) {
                // Peer already gone; the socket is closed either way
                Err(e) if e.kind() == io::ErrorKind::NotConnected => {}
                other => other?,
            }
        }
        Ok(())
    }
}
