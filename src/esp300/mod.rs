// ESP300 axis control for the CNC rig
//
// Provides:
// - ASCII command encoding and reply parsing
// - The linear stage configuration template
// - A generic ordered axis group with per-axis home policies
// - Linear (X/Y/Z) and head (B/W) facades over it

mod group;
mod head;
mod linear;
pub mod protocol;
pub mod template;

pub use group::{AxisError, AxisGroup, AxisSpec, HomePolicy};
pub use head::{HeadAxisGroup, B_HOME_SEARCH_MODE, W_HOME_REFUSAL};
pub use linear::LinearAxisGroup;
pub use protocol::{format_g, Command};
pub use template::{AxisConfig, TemplateLine, LINEAR_STAGE_TEMPLATE};
