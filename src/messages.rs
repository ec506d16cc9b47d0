// Position reports printed by the CLI

use serde::{Deserialize, Serialize};

/// Live position of one axis as last reported by the controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisPosition {
    pub axis: char,
    pub id: u8,
    pub position: f64,
}

/// Positions of several axes, in group order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionReport {
    pub positions: Vec<AxisPosition>,
}

impl PositionReport {
    pub fn push(&mut self, axis: char, id: u8, position: f64) {
        self.positions.push(AxisPosition { axis, id, position });
    }

    /// One `axis = position` line per axis
    pub fn to_text(&self) -> String {
        self.positions
            .iter()
            .map(|p| format!("{} ({}) = {:.4}", p.axis, p.id, p.position))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_text_and_json() {
        let mut report = PositionReport::default();
        report.push('x', 1, -12.5);
        report.push('y', 2, 0.0127);

        assert_eq!(report.to_text(), "x (1) = -12.5000\ny (2) = 0.0127");

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["positions"][0]["axis"], "x");
        assert_eq!(json["positions"][1]["position"], 0.0127);
    }
}
