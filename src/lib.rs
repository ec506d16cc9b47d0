// ESP300 command driver for the CNC positioning rig
//
// - bridge: line transports to the controller (TCP serial bridge, direct RS-232)
// - esp300: wire protocol, axis configuration template and axis groups
// - config: constants and the JSON rig description
// - messages: position reports printed by the CLI

pub mod bridge;
pub mod config;
pub mod esp300;
pub mod messages;
