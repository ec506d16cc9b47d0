// Per-axis configuration template for the linear stages
//
// Sent line by line, each prefixed with the axis number, before the axis is
// used. Only the software travel limits vary per axis.

use super::protocol::format_g;
use crate::config::TravelLimits;

/// One line of a configuration template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateLine {
    /// Sent as written
    Fixed(&'static str),
    /// `SL<left limit>`
    LeftLimit,
    /// `SR<right limit>`
    RightLimit,
}

/// Linear stage parameters, in controller order
pub const LINEAR_STAGE_TEMPLATE: &[TemplateLine] = &[
    TemplateLine::Fixed("QM3"),       // motor type: commutated stepper
    TemplateLine::Fixed("QI2.0"),     // max motor current
    TemplateLine::Fixed("QV30.0"),    // motor voltage
    TemplateLine::Fixed("SN2"),       // units: mm
    TemplateLine::Fixed("SU0.0127"),  // encoder resolution
    TemplateLine::Fixed("FR0.0127"),  // full-step resolution
    TemplateLine::Fixed("QS1000"),    // microstep factor
    TemplateLine::Fixed("VU12.7"),    // max velocity
    TemplateLine::Fixed("VA6.35"),    // velocity
    TemplateLine::Fixed("JH6.35"),    // jog high speed
    TemplateLine::Fixed("JW3.175"),   // jog low speed
    TemplateLine::Fixed("OH0.0"),     // home search velocity; zero keeps homing off
    TemplateLine::Fixed("AU6.35"),    // max acceleration
    TemplateLine::Fixed("AC6.35"),    // acceleration
    TemplateLine::Fixed("AG6.35"),    // deceleration
    TemplateLine::Fixed("FE25.3999"), // following error threshold
    TemplateLine::Fixed("TJ1"),       // trajectory mode: trapezoidal
    TemplateLine::Fixed("OM3"),       // home search mode
    TemplateLine::LeftLimit,
    TemplateLine::RightLimit,
    TemplateLine::Fixed("ZA323H"),    // amplifier I/O
    TemplateLine::Fixed("ZB0H"),      // feedback
    TemplateLine::Fixed("ZE3H"),      // E-stop
    TemplateLine::Fixed("ZF2H"),      // following error
    TemplateLine::Fixed("ZH24H"),     // hardware limits
    TemplateLine::Fixed("ZS24H"),     // software limits
    TemplateLine::Fixed("QD"),        // update driver with the above
];

/// Controller parameters for one axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisConfig {
    pub limits: TravelLimits,
    pub template: &'static [TemplateLine],
}

impl AxisConfig {
    /// Linear stage parameters with the given travel limits
    pub fn linear(limits: impl Into<TravelLimits>) -> Self {
        Self {
            limits: limits.into(),
            template: LINEAR_STAGE_TEMPLATE,
        }
    }

    /// Template lines with the limits filled in, without axis prefix
    pub fn lines(&self) -> Vec<String> {
        self.template
            .iter()
            .map(|line| match *line {
                TemplateLine::Fixed(text) => text.to_string(),
                TemplateLine::LeftLimit => format!("SL{}", format_g(self.limits.left)),
                TemplateLine::RightLimit => format!("SR{}", format_g(self.limits.right)),
            })
            .collect()
    }

    /// Wire lines for the given axis
    pub fn commands_for(&self, axis: u8) -> Vec<String> {
        self.lines()
            .into_iter()
            .map(|line| format!("{}{}", axis, line))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MIN_LINEAR_STEP_MM;

    #[test]
    fn test_limits_substituted_with_g_format() {
        let lines = AxisConfig::linear((-355.6, 0.0)).lines();
        assert_eq!(lines.len(), 27);
        assert_eq!(lines[18], "SL-355.6");
        assert_eq!(lines[19], "SR0");
    }

    #[test]
    fn test_other_lines_sent_verbatim() {
        let a = AxisConfig::linear((-355.6, 0.0)).lines();
        let b = AxisConfig::linear((-101.6, 12.5)).lines();
        for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
            if i == 18 || i == 19 {
                continue;
            }
            assert_eq!(x, y, "line {} differs", i);
        }
        assert_eq!(a.first().map(String::as_str), Some("QM3"));
        assert_eq!(a.last().map(String::as_str), Some("QD"));
        assert!(a.contains(&"OH0.0".to_string()));
        assert!(a.contains(&"FE25.3999".to_string()));
        assert!(a.contains(&format!("SU{}", MIN_LINEAR_STEP_MM)));
        assert!(a.contains(&format!("FR{}", MIN_LINEAR_STEP_MM)));
        assert_eq!(b[19], "SR12.5");
    }

    #[test]
    fn test_commands_prefixed_with_axis() {
        let commands = AxisConfig::linear((-101.6, 0.0)).commands_for(3);
        assert_eq!(commands[0], "3QM3");
        assert_eq!(commands[18], "3SL-101.6");
        assert_eq!(commands[26], "3QD");
        assert!(commands.iter().all(|c| c.starts_with('3')));
    }
}
