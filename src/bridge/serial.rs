// Direct RS-232 link to the controller
//
// ESP300 factory settings: 19200 baud, 8 data bits, no parity, 1 stop bit,
// RTS/CTS handshake.

use serialport::{self, DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::BufReader;
use std::time::Duration;
use tracing::info;

use super::{send_line, Result, SerialBridge};
use crate::config::{DEFAULT_BAUDRATE, DEFAULT_READ_TIMEOUT};

/// Controller attached to a local serial device
pub struct SerialPortBridge {
    path: String,
    baudrate: u32,
    read_timeout: Duration,
    port: Option<BufReader<Box<dyn SerialPort>>>,
}

impl SerialPortBridge {
    /// Create an unconnected bridge with ESP300 default line settings
    pub fn new(path: &str) -> Self {
        Self::with_settings(path, DEFAULT_BAUDRATE, DEFAULT_READ_TIMEOUT)
    }

    /// Create with custom baudrate and read timeout
    pub fn with_settings(path: &str, baudrate: u32, read_timeout: Duration) -> Self {
        Self {
            path: path.to_string(),
            baudrate,
            read_timeout,
            port: None,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl SerialBridge for SerialPortBridge {
    fn connect(&mut self) -> Result<()> {
        if self.port.is_some() {
            return Ok(());
        }
        info!("Opening controller serial port {} at {} baud", self.path, self.baudrate);
        let port = serialport::new(&self.path, self.baudrate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::Hardware)
            .timeout(self.read_timeout)
            .open()?;
        self.port = Some(BufReader::new(port));
        Ok(())
    }

    fn send(&mut self, command: &str, expect_response: bool) -> Result<String> {
        send_line(&mut self.port, command, expect_response)
    }

    fn disconnect(&mut self) -> Result<()> {
        if self.port.take().is_some() {
            info!("Closed controller serial port {}", self.path);
        }
        Ok(())
    }
}
