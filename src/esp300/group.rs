// Generic axis group on one ESP300 connection
//
// A group is an ordered list of axes plus their policies. Every multi-axis
// operation walks the list in that order, so the order given at construction
// is the order commands hit the wire.

use tracing::{debug, info, warn};

use super::protocol::{parse_position, Command};
use super::template::AxisConfig;
use crate::bridge::{BridgeError, SerialBridge};

/// Error types for axis group operations
#[derive(Debug, thiserror::Error)]
pub enum AxisError {
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error("Refusing to home axis {label} ({axis}): {reason}")]
    SafetyPrecondition {
        axis: u8,
        label: char,
        reason: &'static str,
    },

    #[error("Axis {0} is not part of this group")]
    UnknownAxis(u8),

    #[error("Invalid axis layout: {0}")]
    InvalidAxisLayout(String),

    #[error("Unparseable position reply from axis {axis}: {reply:?}")]
    MalformedPosition { axis: u8, reply: String },

    #[error("Expected {expected} distances, got {got}")]
    DistanceCount { expected: usize, got: usize },
}

pub type Result<T> = std::result::Result<T, AxisError>;

/// What `home` does for an axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HomePolicy {
    /// Set the home velocity, then reset it to zero. No motion is started.
    VelocityPulse { velocity: f64 },
    /// Seek home on the limit switch with the given `OR` mode and wait
    SeekSwitch { mode: u8 },
    /// Never home from software
    Refuse { reason: &'static str },
}

/// One axis of a group
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisSpec {
    /// Controller axis number, 1-based
    pub id: u8,
    /// Rig name of the axis (x, y, z, b, w)
    pub label: char,
    /// Parameters sent by `configure`; `None` for axes configured out-of-band
    pub config: Option<AxisConfig>,
    pub home: HomePolicy,
}

/// Ordered axes sharing one controller connection
pub struct AxisGroup<B: SerialBridge> {
    bridge: B,
    axes: Vec<AxisSpec>,
}

impl<B: SerialBridge> AxisGroup<B> {
    /// Validate the layout, then connect the bridge
    pub fn new(mut bridge: B, axes: Vec<AxisSpec>) -> Result<Self> {
        validate_layout(&axes)?;
        bridge.connect()?;
        Ok(Self { bridge, axes })
    }

    /// Axes in command order
    pub fn axes(&self) -> &[AxisSpec] {
        &self.axes
    }

    pub fn axis_ids(&self) -> Vec<u8> {
        self.axes.iter().map(|a| a.id).collect()
    }

    /// Look up an axis number by its rig name
    pub fn axis_by_label(&self, label: char) -> Option<u8> {
        let label = label.to_ascii_lowercase();
        self.axes.iter().find(|a| a.label == label).map(|a| a.id)
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    fn spec(&self, axis: u8) -> Result<&AxisSpec> {
        self.axes
            .iter()
            .find(|a| a.id == axis)
            .ok_or(AxisError::UnknownAxis(axis))
    }

    fn send(&mut self, command: Command) -> Result<String> {
        let line = command.to_string();
        Ok(self.bridge.send(&line, command.expects_response())?)
    }

    /// Send the configuration template of every axis that has one, in order
    pub fn configure(&mut self) -> Result<()> {
        for id in self.axis_ids() {
            self.configure_axis(id)?;
        }
        Ok(())
    }

    /// Send one axis' configuration template; a no-op for axes without one
    pub fn configure_axis(&mut self, axis: u8) -> Result<()> {
        let spec = *self.spec(axis)?;
        let Some(config) = spec.config else {
            debug!("Axis {} ({}) has no configuration template", spec.label, axis);
            return Ok(());
        };

        info!(
            "Configuring axis {} ({}) with limits [{}, {}]",
            spec.label, axis, config.limits.left, config.limits.right
        );
        for line in config.commands_for(axis) {
            self.bridge.send(&line, false)?;
        }
        Ok(())
    }

    /// Replace one axis' configuration and send it
    ///
    /// The new parameters are kept, so a later `configure` resends them.
    pub fn reconfigure_axis(&mut self, axis: u8, config: AxisConfig) -> Result<()> {
        let spec = self
            .axes
            .iter_mut()
            .find(|a| a.id == axis)
            .ok_or(AxisError::UnknownAxis(axis))?;
        spec.config = Some(config);
        self.configure_axis(axis)
    }

    /// Power off one axis, or every axis in order
    pub fn power_down(&mut self, axis: Option<u8>) -> Result<()> {
        for id in self.targets(axis)? {
            info!("Powering down axis {}", id);
            self.send(Command::MotorOff(id))?;
        }
        Ok(())
    }

    /// Power on one axis, or every axis in order
    pub fn power_up(&mut self, axis: Option<u8>) -> Result<()> {
        for id in self.targets(axis)? {
            info!("Powering up axis {}", id);
            self.send(Command::MotorOn(id))?;
        }
        Ok(())
    }

    fn targets(&self, axis: Option<u8>) -> Result<Vec<u8>> {
        match axis {
            Some(id) => self.spec(id).map(|s| vec![s.id]),
            None => Ok(self.axis_ids()),
        }
    }

    /// Store the controller settings in non-volatile memory
    pub fn save_settings(&mut self) -> Result<()> {
        info!("Saving controller settings to non-volatile memory");
        self.send(Command::SaveSettings)?;
        Ok(())
    }

    /// Move relative to the current position, wait for the move to end and
    /// return the new position
    pub fn move_relative(&mut self, axis: u8, distance: f64) -> Result<f64> {
        self.spec(axis)?;
        info!("Moving axis {} by {:.4}", axis, distance);
        self.send(Command::MoveRelative(axis, distance))?;
        self.send(Command::WaitStop(axis))?;
        self.position(axis)
    }

    /// Move every axis in order, one after the other
    pub fn composite_move_relative(&mut self, distances: &[f64]) -> Result<Vec<f64>> {
        if distances.len() != self.axes.len() {
            return Err(AxisError::DistanceCount {
                expected: self.axes.len(),
                got: distances.len(),
            });
        }
        let ids = self.axis_ids();
        ids.into_iter()
            .zip(distances.iter().copied())
            .map(|(id, distance)| self.move_relative(id, distance))
            .collect()
    }

    /// Query the live position of one axis
    pub fn position(&mut self, axis: u8) -> Result<f64> {
        self.spec(axis)?;
        let reply = self.send(Command::TellPosition(axis))?;
        parse_position(&reply, axis).ok_or(AxisError::MalformedPosition { axis, reply })
    }

    /// Query the live position of every axis in order
    pub fn positions(&mut self) -> Result<Vec<f64>> {
        self.axis_ids()
            .into_iter()
            .map(|id| self.position(id))
            .collect()
    }

    /// Run the axis' home policy
    ///
    /// A refusing policy fails before anything is sent.
    pub fn home(&mut self, axis: u8) -> Result<()> {
        let spec = *self.spec(axis)?;
        match spec.home {
            HomePolicy::Refuse { reason } => {
                warn!("Refused to home axis {} ({}): {}", spec.label, axis, reason);
                Err(AxisError::SafetyPrecondition {
                    axis,
                    label: spec.label,
                    reason,
                })
            }
            HomePolicy::VelocityPulse { velocity } => {
                info!("Setting then clearing home velocity on axis {} ({})", spec.label, axis);
                self.send(Command::HomeVelocity(axis, velocity))?;
                self.send(Command::HomeVelocity(axis, 0.0))?;
                Ok(())
            }
            HomePolicy::SeekSwitch { mode } => {
                info!("Homing axis {} ({}) on limit switch", spec.label, axis);
                self.send(Command::HomeSearch(axis, mode))?;
                self.send(Command::WaitStop(axis))?;
                Ok(())
            }
        }
    }

    /// Release the connection
    pub fn close(&mut self) -> Result<()> {
        self.bridge.disconnect()?;
        Ok(())
    }
}

impl<B: SerialBridge> Drop for AxisGroup<B> {
    fn drop(&mut self) {
        if let Err(e) = self.bridge.disconnect() {
            warn!("Failed to disconnect axis group on drop: {}", e);
        }
    }
}

fn validate_layout(axes: &[AxisSpec]) -> Result<()> {
    if axes.is_empty() {
        return Err(AxisError::InvalidAxisLayout("no axes".to_string()));
    }
    for (i, spec) in axes.iter().enumerate() {
        if spec.id == 0 {
            return Err(AxisError::InvalidAxisLayout(format!(
                "axis {} has id 0; ids are 1-based",
                spec.label
            )));
        }
        if let Some(other) = axes[..i].iter().find(|a| a.id == spec.id) {
            return Err(AxisError::InvalidAxisLayout(format!(
                "axes {} and {} share id {}",
                other.label, spec.label, spec.id
            )));
        }
    }
    Ok(())
}
