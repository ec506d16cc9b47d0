// Recording bridge for tests: logs every line, answers position queries from a
// table and can be told to fail on a given command.

use std::collections::HashMap;

use super::{BridgeError, Result, SerialBridge};

#[derive(Debug, Default)]
pub(crate) struct MockBridge {
    pub connected: bool,
    pub connect_calls: usize,
    pub disconnect_calls: usize,
    pub refuse_connect: bool,
    /// Every line sent, in order
    pub sent: Vec<String>,
    /// Replies keyed by the exact command line
    pub replies: HashMap<String, String>,
    /// Command that fails with an IO error instead of being sent
    pub fail_on: Option<String>,
}

impl MockBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(mut self, command: &str, reply: &str) -> Self {
        self.replies.insert(command.to_string(), reply.to_string());
        self
    }

    pub fn failing_on(mut self, command: &str) -> Self {
        self.fail_on = Some(command.to_string());
        self
    }

    pub fn refusing_connect(mut self) -> Self {
        self.refuse_connect = true;
        self
    }
}

impl SerialBridge for MockBridge {
    fn connect(&mut self) -> Result<()> {
        self.connect_calls += 1;
        if self.refuse_connect {
            return Err(BridgeError::Connect {
                endpoint: "mock:0".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
            });
        }
        self.connected = true;
        Ok(())
    }

    fn send(&mut self, command: &str, expect_response: bool) -> Result<String> {
        if !self.connected {
            return Err(BridgeError::NotConnected);
        }
        if self.fail_on.as_deref() == Some(command) {
            return Err(BridgeError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "bridge dropped",
            )));
        }
        self.sent.push(command.to_string());
        if !expect_response {
            return Ok(String::new());
        }
        self.replies
            .get(command)
            .cloned()
            .ok_or_else(|| BridgeError::Timeout {
                command: command.to_string(),
            })
    }

    fn disconnect(&mut self) -> Result<()> {
        self.disconnect_calls += 1;
        self.connected = false;
        Ok(())
    }
}
