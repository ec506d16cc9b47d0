// B/W tool head axes on the head controller
//
// b: rotation, clockwise(-)/counterclockwise(+)
// w: fine Z, up(-)/down(+)
//
// These axes are configured out-of-band; construction only powers them down.

use super::group::{AxisGroup, AxisSpec, HomePolicy, Result};
use crate::bridge::{SerialBridge, TcpBridge};
use crate::config::{HeadRigConfig, DEFAULT_B_AXIS, DEFAULT_W_AXIS};

/// `OR` mode for the B limit-switch search
pub const B_HOME_SEARCH_MODE: u8 = 3;

pub const W_HOME_REFUSAL: &str = "remove the preamp before homing the W axis";

/// Rotation and fine-Z axes sharing one controller
pub struct HeadAxisGroup<B: SerialBridge = TcpBridge> {
    group: AxisGroup<B>,
    b_axis: u8,
    w_axis: u8,
}

impl HeadAxisGroup<TcpBridge> {
    /// Connect through the network bridge with the default axis layout
    pub fn connect(address: &str, port: u16) -> Result<Self> {
        Self::new(TcpBridge::new(address, port), DEFAULT_B_AXIS, DEFAULT_W_AXIS)
    }
}

impl<B: SerialBridge> HeadAxisGroup<B> {
    /// Connect and power down B then W. Nothing is configured or saved.
    pub fn new(bridge: B, b_axis: u8, w_axis: u8) -> Result<Self> {
        let specs = vec![
            AxisSpec {
                id: b_axis,
                label: 'b',
                config: None,
                home: HomePolicy::SeekSwitch {
                    mode: B_HOME_SEARCH_MODE,
                },
            },
            AxisSpec {
                id: w_axis,
                label: 'w',
                config: None,
                home: HomePolicy::Refuse {
                    reason: W_HOME_REFUSAL,
                },
            },
        ];

        let mut group = AxisGroup::new(bridge, specs)?;
        group.power_down(None)?;

        Ok(Self {
            group,
            b_axis,
            w_axis,
        })
    }

    pub fn from_config(bridge: B, config: &HeadRigConfig) -> Result<Self> {
        Self::new(bridge, config.b_axis, config.w_axis)
    }

    pub fn b_axis(&self) -> u8 {
        self.b_axis
    }

    pub fn w_axis(&self) -> u8 {
        self.w_axis
    }

    pub fn group(&self) -> &AxisGroup<B> {
        &self.group
    }

    pub fn group_mut(&mut self) -> &mut AxisGroup<B> {
        &mut self.group
    }

    /// Head axes carry no template; kept so both groups expose the same calls
    pub fn configure_axis(&mut self, axis: u8) -> Result<()> {
        self.group.configure_axis(axis)
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

    /// Move B, then W, and return their new positions
    pub fn composite_move_relative(&mut self, b: f64, w: f64) -> Result<(f64, f64)> {
        Ok((
            self.group.move_relative(self.b_axis, b)?,
            self.group.move_relative(self.w_axis, w)?,
        ))
    }

    pub fn get_position(&mut self, axis: u8) -> Result<f64> {
        self.group.position(axis)
    }

    /// Live (B, W) positions
    pub fn get_positions(&mut self) -> Result<(f64, f64)> {
        Ok((
            self.group.position(self.b_axis)?,
            self.group.position(self.w_axis)?,
        ))
    }

    /// Home B on its limit switch and wait for it. W is always refused.
    pub fn home(&mut self, axis: u8) -> Result<()> {
        self.group.home(axis)
    }

    pub fn close(&mut self) -> Result<()> {
        self.group.close()
    }
}
