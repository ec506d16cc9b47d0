// Endpoints, timeouts, axis layout and the JSON rig description
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

// Network serial bridge in front of the controllers
pub const DEFAULT_ADDRESS: &str = "169.254.0.9";
pub const DEFAULT_PORT: u16 = 8003;

// Transport timeouts
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
// Long enough for a position query queued behind a full-travel move
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(60);

// ESP300 RS-232 factory baudrate
pub const DEFAULT_BAUDRATE: u32 = 19_200;

// Linear axis numbers on the linear controller
pub const DEFAULT_X_AXIS: u8 = 1;
pub const DEFAULT_Y_AXIS: u8 = 2;
pub const DEFAULT_Z_AXIS: u8 = 3;

// Head axis numbers on the head controller
pub const DEFAULT_B_AXIS: u8 = 1;
pub const DEFAULT_W_AXIS: u8 = 2;

// Travel limits in mm as (left, right)
pub const DEFAULT_X_LIMITS: (f64, f64) = (-355.6, 0.0);
pub const DEFAULT_Y_LIMITS: (f64, f64) = (-355.6, 0.0);
pub const DEFAULT_Z_LIMITS: (f64, f64) = (-101.6, 0.0);

// Linear home velocity magnitude; Y runs it negated
pub const LINEAR_HOME_VELOCITY: f64 = 5.0;

// Smallest addressable linear step in mm
pub const MIN_LINEAR_STEP_MM: f64 = 0.0127;

/// Error types for loading the rig description
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// How to reach one controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub address: String,
    pub port: u16,
    /// Serial device path; when set it is used instead of the network bridge
    pub serial: Option<String>,
    pub read_timeout_ms: u64,
}

impl EndpointConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            port: DEFAULT_PORT,
            serial: None,
            read_timeout_ms: DEFAULT_READ_TIMEOUT.as_millis() as u64,
        }
    }
}

/// Travel limits for one axis in mm
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TravelLimits {
    pub left: f64,
    pub right: f64,
}

impl From<(f64, f64)> for TravelLimits {
    fn from((left, right): (f64, f64)) -> Self {
        Self { left, right }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinearRigConfig {
    pub endpoint: EndpointConfig,
    pub x_axis: u8,
    pub y_axis: u8,
    pub z_axis: u8,
    pub x_limits: TravelLimits,
    pub y_limits: TravelLimits,
    pub z_limits: TravelLimits,
}

impl Default for LinearRigConfig {
    fn default() -> Self {
        Self {
            endpoint: EndpointConfig::default(),
            x_axis: DEFAULT_X_AXIS,
            y_axis: DEFAULT_Y_AXIS,
            z_axis: DEFAULT_Z_AXIS,
            x_limits: DEFAULT_X_LIMITS.into(),
            y_limits: DEFAULT_Y_LIMITS.into(),
            z_limits: DEFAULT_Z_LIMITS.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadRigConfig {
    pub endpoint: EndpointConfig,
    pub b_axis: u8,
    pub w_axis: u8,
}

impl Default for HeadRigConfig {
    fn default() -> Self {
        Self {
            endpoint: EndpointConfig::default(),
            b_axis: DEFAULT_B_AXIS,
            w_axis: DEFAULT_W_AXIS,
        }
    }
}

/// Both controllers of the rig. Every field is optional in the file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigConfig {
    pub linear: LinearRigConfig,
    pub head: HeadRigConfig,
}

impl RigConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_object_gives_rig_defaults() {
        let config = RigConfig::from_json("{}").unwrap();
        assert_eq!(config, RigConfig::default());
        assert_eq!(config.linear.endpoint.address, "169.254.0.9");
        assert_eq!(config.linear.endpoint.port, 8003);
        assert_eq!(config.linear.z_limits, TravelLimits { left: -101.6, right: 0.0 });
        assert_eq!(config.head.w_axis, 2);
    }

    #[test]
    fn test_partial_override_keeps_other_defaults() {
        let config = RigConfig::from_json(
            r#"{
                "head": { "endpoint": { "port": 8004 } },
                "linear": { "y_limits": { "left": -200.0, "right": 5.0 } }
            }"#,
        )
        .unwrap();
        assert_eq!(config.head.endpoint.port, 8004);
        assert_eq!(config.head.endpoint.address, DEFAULT_ADDRESS);
        assert_eq!(config.linear.y_limits, TravelLimits { left: -200.0, right: 5.0 });
        assert_eq!(config.linear.x_limits, TravelLimits::from(DEFAULT_X_LIMITS));
        assert_eq!(config.linear.endpoint.read_timeout(), DEFAULT_READ_TIMEOUT);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"linear": {{"endpoint": {{"serial": "/dev/ttyUSB0"}}}}}}"#).unwrap();

        let config = RigConfig::load(file.path()).unwrap();
        assert_eq!(config.linear.endpoint.serial.as_deref(), Some("/dev/ttyUSB0"));
    }

    #[test]
    fn test_load_reports_parse_and_read_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(
            RigConfig::load(file.path()),
            Err(ConfigError::Parse { .. })
        ));

        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            RigConfig::load(&dir.path().join("missing.json")),
            Err(ConfigError::Read { .. })
        ));
    }
}
