// ESP300 ASCII command protocol
//
// Line format: <axis><opcode><argument>, e.g. "1PR1.2500".
// A few commands (SM) address the controller and carry no axis prefix.

use std::fmt;

/// Opcodes used by the axis groups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    // Motion and power
    MotorOff,
    MotorOn,
    MoveRelative,
    WaitStop,
    TellPosition,
    HomeVelocity,
    HomeSearch,

    // Controller-level
    SaveSettings,
}

impl Opcode {
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::MotorOff => "MF",
            Opcode::MotorOn => "MO",
            Opcode::MoveRelative => "PR",
            Opcode::WaitStop => "WS",
            Opcode::TellPosition => "TP",
            Opcode::HomeVelocity => "OH",
            Opcode::HomeSearch => "OR",
            Opcode::SaveSettings => "SM",
        }
    }
}

/// One command line ready to go on the wire
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `<n>MF`
    MotorOff(u8),
    /// `<n>MO`
    MotorOn(u8),
    /// `<n>PR<distance>`, four decimals
    MoveRelative(u8, f64),
    /// `<n>WS`
    WaitStop(u8),
    /// `<n>TP`, answered with the current position
    TellPosition(u8),
    /// `<n>OH<velocity>`, `%g` formatted; zero disables homing
    HomeVelocity(u8, f64),
    /// `<n>OR<mode>`
    HomeSearch(u8, u8),
    /// `SM`
    SaveSettings,
}

impl Command {
    pub fn opcode(&self) -> Opcode {
        match self {
            Command::MotorOff(_) => Opcode::MotorOff,
            Command::MotorOn(_) => Opcode::MotorOn,
            Command::MoveRelative(..) => Opcode::MoveRelative,
            Command::WaitStop(_) => Opcode::WaitStop,
            Command::TellPosition(_) => Opcode::TellPosition,
            Command::HomeVelocity(..) => Opcode::HomeVelocity,
            Command::HomeSearch(..) => Opcode::HomeSearch,
            Command::SaveSettings => Opcode::SaveSettings,
        }
    }

    /// Whether the controller answers this command with a line
    pub fn expects_response(&self) -> bool {
        matches!(self, Command::TellPosition(_))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = self.opcode().mnemonic();
        match *self {
            Command::MotorOff(axis)
            | Command::MotorOn(axis)
            | Command::WaitStop(axis)
            | Command::TellPosition(axis) => write!(f, "{}{}", axis, op),
            Command::MoveRelative(axis, distance) => write!(f, "{}{}{:.4}", axis, op, distance),
            Command::HomeVelocity(axis, velocity) => {
                write!(f, "{}{}{}", axis, op, format_g(velocity))
            }
            Command::HomeSearch(axis, mode) => write!(f, "{}{}{}", axis, op, mode),
            Command::SaveSettings => f.write_str(op),
        }
    }
}

/// Significant digits of C's `%g`
const G_PRECISION: i32 = 6;

/// Format a number the way C's `%g` does
///
/// Six significant digits, trailing zeros stripped, exponent form only for
/// very large or very small magnitudes: 0.0 -> "0", -355.6 -> "-355.6",
/// 5.0 -> "5", 1e-5 -> "1e-05".
pub fn format_g(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    // Round to the significant digits first; the exponent after rounding
    // picks the notation
    let sci = format!("{:.*e}", (G_PRECISION - 1) as usize, value);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };

    if exp < -4 || exp >= G_PRECISION {
        let mantissa = strip_fraction_zeros(mantissa);
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exp.abs())
    } else {
        let decimals = (G_PRECISION - 1 - exp) as usize;
        strip_fraction_zeros(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn strip_fraction_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

/// Parse a `TP` reply into a position
///
/// The controller answers with a bare number; some firmware echoes the axis
/// and opcode first (`1TP-12.5`), which is skipped.
pub fn parse_position(reply: &str, axis: u8) -> Option<f64> {
    let reply = reply.trim();
    let echo = format!("{}{}", axis, Opcode::TellPosition.mnemonic());
    let value = reply.strip_prefix(echo.as_str()).unwrap_or(reply).trim();
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_lines() {
        assert_eq!(Command::MotorOff(1).to_string(), "1MF");
        assert_eq!(Command::MotorOn(3).to_string(), "3MO");
        assert_eq!(Command::WaitStop(2).to_string(), "2WS");
        assert_eq!(Command::TellPosition(2).to_string(), "2TP");
        assert_eq!(Command::HomeSearch(1, 3).to_string(), "1OR3");
        assert_eq!(Command::SaveSettings.to_string(), "SM");
    }

    #[test]
    fn test_move_relative_uses_four_decimals() {
        assert_eq!(Command::MoveRelative(1, 1.25).to_string(), "1PR1.2500");
        assert_eq!(Command::MoveRelative(2, 0.0).to_string(), "2PR0.0000");
        assert_eq!(Command::MoveRelative(3, -0.0127).to_string(), "3PR-0.0127");
        assert_eq!(Command::MoveRelative(1, 10.123456).to_string(), "1PR10.1235");
    }

    #[test]
    fn test_home_velocity_uses_g_format() {
        assert_eq!(Command::HomeVelocity(1, 5.0).to_string(), "1OH5");
        assert_eq!(Command::HomeVelocity(2, -5.0).to_string(), "2OH-5");
        assert_eq!(Command::HomeVelocity(3, 0.0).to_string(), "3OH0");
    }

    #[test]
    fn test_only_tell_position_expects_response() {
        assert!(Command::TellPosition(1).expects_response());
        assert!(!Command::WaitStop(1).expects_response());
        assert!(!Command::SaveSettings.expects_response());
    }

    #[test]
    fn test_format_g_matches_c() {
        assert_eq!(format_g(0.0), "0");
        assert_eq!(format_g(-355.6), "-355.6");
        assert_eq!(format_g(-101.6), "-101.6");
        assert_eq!(format_g(25.3999), "25.3999");
        assert_eq!(format_g(0.0127), "0.0127");
        assert_eq!(format_g(1000.0), "1000");
        assert_eq!(format_g(123456.0), "123456");
        assert_eq!(format_g(1234567.0), "1.23457e+06");
        assert_eq!(format_g(0.0001), "0.0001");
        assert_eq!(format_g(0.00001), "1e-05");
        assert_eq!(format_g(1.0 / 3.0), "0.333333");
        // Rounding carries into the next decade
        assert_eq!(format_g(999999.5), "1e+06");
    }

    #[test]
    fn test_parse_position() {
        assert_eq!(parse_position("-12.3456", 1), Some(-12.3456));
        assert_eq!(parse_position(" 0.0000\r", 2), Some(0.0));
        assert_eq!(parse_position("1TP-12.5", 1), Some(-12.5));
        assert_eq!(parse_position("", 1), None);
        assert_eq!(parse_position("ERROR", 1), None);
        assert_eq!(parse_position("inf", 1), None);
    }
}
