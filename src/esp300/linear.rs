// X/Y/Z linear stages on the linear controller
//
// x: left(-)/right(+), homes positive
// y: forward(-)/back(+), homes negative
// z: down(-)/up(+), homes positive
//
// Homing these stages automatically is unsafe, so `home` only pulses the home
// velocity parameter and never starts a search.

use tracing::info;

use super::group::{AxisGroup, AxisSpec, HomePolicy, Result};
use super::template::AxisConfig;
use crate::bridge::{SerialBridge, TcpBridge};
use crate::config::{
    LinearRigConfig, TravelLimits, DEFAULT_X_AXIS, DEFAULT_X_LIMITS, DEFAULT_Y_AXIS,
    DEFAULT_Y_LIMITS, DEFAULT_Z_AXIS, DEFAULT_Z_LIMITS, LINEAR_HOME_VELOCITY, MIN_LINEAR_STEP_MM,
};

/// Three linear stages sharing one controller
pub struct LinearAxisGroup<B: SerialBridge = TcpBridge> {
    group: AxisGroup<B>,
    x_axis: u8,
    y_axis: u8,
    z_axis: u8,
}

impl LinearAxisGroup<TcpBridge> {
    /// Connect through the network bridge with the default axis layout and
    /// travel limits, then configure the controller
    pub fn connect(address: &str, port: u16) -> Result<Self> {
        Self::new(
            TcpBridge::new(address, port),
            [DEFAULT_X_AXIS, DEFAULT_Y_AXIS, DEFAULT_Z_AXIS],
            [
                DEFAULT_X_LIMITS.into(),
                DEFAULT_Y_LIMITS.into(),
                DEFAULT_Z_LIMITS.into(),
            ],
        )
    }
}

impl<B: SerialBridge> LinearAxisGroup<B> {
    /// Connect, configure X, Y and Z, power them down and save the settings
    ///
    /// `axes` and `limits` are in X, Y, Z order. A failure part-way leaves the
    /// axes configured so far as they are.
    pub fn new(bridge: B, axes: [u8; 3], limits: [TravelLimits; 3]) -> Result<Self> {
        let [x_axis, y_axis, z_axis] = axes;
        let specs = vec![
            linear_spec(x_axis, 'x', limits[0], LINEAR_HOME_VELOCITY),
            linear_spec(y_axis, 'y', limits[1], -LINEAR_HOME_VELOCITY),
            linear_spec(z_axis, 'z', limits[2], LINEAR_HOME_VELOCITY),
        ];

        let mut group = AxisGroup::new(bridge, specs)?;
        group.configure()?;
        group.power_down(None)?;
        group.save_settings()?;
        info!("Linear axes x={} y={} z={} configured", x_axis, y_axis, z_axis);

        Ok(Self {
            group,
            x_axis,
            y_axis,
            z_axis,
        })
    }

    pub fn from_config(bridge: B, config: &LinearRigConfig) -> Result<Self> {
        Self::new(
            bridge,
            [config.x_axis, config.y_axis, config.z_axis],
            [config.x_limits, config.y_limits, config.z_limits],
        )
    }

    pub fn x_axis(&self) -> u8 {
        self.x_axis
    }

    pub fn y_axis(&self) -> u8 {
        self.y_axis
    }

    pub fn z_axis(&self) -> u8 {
        self.z_axis
    }

    /// Smallest distance the stages resolve, in mm
    pub fn min_step(&self) -> f64 {
        MIN_LINEAR_STEP_MM
    }

    /// The underlying ordered group
    pub fn group(&self) -> &AxisGroup<B> {
        &self.group
    }

    pub fn group_mut(&mut self) -> &mut AxisGroup<B> {
        &mut self.group
    }

    /// Send the linear stage template to one axis with new travel limits
    ///
    /// Also the way to recover from a construction that failed part-way.
    pub fn configure_axis(&mut self, axis: u8, limits: impl Into<TravelLimits>) -> Result<()> {
        self.group.reconfigure_axis(axis, AxisConfig::linear(limits))
    }

    pub fn power_down(&mut self, axis: Option<u8>) -> Result<()> {
        self.group.power_down(axis)
    }

    pub fn power_up(&mut self, axis: Option<u8>) -> Result<()> {
        self.group.power_up(axis)
    }

    pub fn save_settings_to_controller(&mut self) -> Result<()> {
        self.group.save_settings()
    }

    pub fn move_relative(&mut self, axis: u8, distance: f64) -> Result<f64> {
        self.group.move_relative(axis, distance)
    }

    /// Move X, then Y, then Z and return their new positions
    pub fn composite_move_relative(&mut self, x: f64, y: f64, z: f64) -> Result<(f64, f64, f64)> {
        Ok((
            self.group.move_relative(self.x_axis, x)?,
            self.group.move_relative(self.y_axis, y)?,
            self.group.move_relative(self.z_axis, z)?,
        ))
    }

    pub fn get_position(&mut self, axis: u8) -> Result<f64> {
        self.group.position(axis)
    }

    /// Live (X, Y, Z) positions
    pub fn get_positions(&mut self) -> Result<(f64, f64, f64)> {
        Ok((
            self.group.position(self.x_axis)?,
            self.group.position(self.y_axis)?,
            self.group.position(self.z_axis)?,
        ))
    }

    /// Pulse the home velocity on one axis; no homing motion is started
    pub fn home(&mut self, axis: u8) -> Result<()> {
        self.group.home(axis)
    }

    pub fn close(&mut self) -> Result<()> {
        self.group.close()
    }
}

fn linear_spec(id: u8, label: char, limits: TravelLimits, home_velocity: f64) -> AxisSpec {
    AxisSpec {
        id,
        label,
        config: Some(AxisConfig::linear(limits)),
        home: HomePolicy::VelocityPulse {
            velocity: home_velocity,
        },
    }
}
