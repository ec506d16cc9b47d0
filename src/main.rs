use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use esp300_cnc::bridge::{SerialBridge, SerialPortBridge, TcpBridge};
use esp300_cnc::config::{EndpointConfig, RigConfig, DEFAULT_BAUDRATE};
use esp300_cnc::esp300::{AxisGroup, HeadAxisGroup, LinearAxisGroup};
use esp300_cnc::messages::PositionReport;

type Bridge = Box<dyn SerialBridge>;

/// Drive the CNC rig's ESP300 controllers
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// JSON rig description; built-in defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Talk to the controller over this serial device instead of the network bridge
    #[arg(long)]
    serial: Option<String>,

    /// Print positions as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    target: Target,
}

#[derive(Debug, Subcommand)]
enum Target {
    /// X/Y/Z stages (configured and saved on connect)
    Linear {
        #[command(subcommand)]
        op: Op,
    },
    /// B/W head axes
    Head {
        #[command(subcommand)]
        op: Op,
    },
}

#[derive(Debug, Subcommand)]
enum Op {
    /// Power on one axis or all of them
    PowerUp { axis: Option<char> },
    /// Power off one axis or all of them
    PowerDown { axis: Option<char> },
    /// Store controller settings in non-volatile memory
    Save,
    /// Relative move of one axis, in mm (degrees for b)
    Move {
        axis: char,
        #[arg(allow_negative_numbers = true)]
        distance: f64,
    },
    /// Relative move of every axis of the group, in group order
    Compose {
        #[arg(allow_negative_numbers = true, required = true)]
        distances: Vec<f64>,
    },
    /// Report live positions
    Position { axis: Option<char> },
    /// Run the axis' home procedure
    Home { axis: char },
}

fn main() {
    // Setup logging (set RUST_LOG=debug to see every wire line)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &cli.config {
        Some(path) => RigConfig::load(path)?,
        None => RigConfig::default(),
    };

    match cli.target {
        Target::Linear { op } => {
            let bridge = open_bridge(&config.linear.endpoint, cli.serial.as_deref());
            let mut axes = LinearAxisGroup::from_config(bridge, &config.linear)?;
            let result = execute(axes.group_mut(), op, cli.json);
            if let Err(e) = axes.close() {
                warn!("Failed to close linear controller link: {}", e);
            }
            result
        }
        Target::Head { op } => {
            let bridge = open_bridge(&config.head.endpoint, cli.serial.as_deref());
            let mut axes = HeadAxisGroup::from_config(bridge, &config.head)?;
            let result = execute(axes.group_mut(), op, cli.json);
            if let Err(e) = axes.close() {
                warn!("Failed to close head controller link: {}", e);
            }
            result
        }
    }
}

fn open_bridge(endpoint: &EndpointConfig, serial_override: Option<&str>) -> Bridge {
    match serial_override.or(endpoint.serial.as_deref()) {
        Some(path) => Box::new(SerialPortBridge::with_settings(
            path,
            DEFAULT_BAUDRATE,
            endpoint.read_timeout(),
        )),
        None => Box::new(TcpBridge::with_read_timeout(
            &endpoint.address,
            endpoint.port,
            endpoint.read_timeout(),
        )),
    }
}

fn resolve(group: &AxisGroup<Bridge>, label: char) -> Result<u8, Box<dyn std::error::Error>> {
    group
        .axis_by_label(label)
        .ok_or_else(|| format!("no axis named '{}' in this group", label).into())
}

fn resolve_opt(
    group: &AxisGroup<Bridge>,
    label: Option<char>,
) -> Result<Option<u8>, Box<dyn std::error::Error>> {
    label.map(|l| resolve(group, l)).transpose()
}

fn execute(
    group: &mut AxisGroup<Bridge>,
    op: Op,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    match op {
        Op::PowerUp { axis } => {
            let axis = resolve_opt(group, axis)?;
            group.power_up(axis)?;
        }
        Op::PowerDown { axis } => {
            let axis = resolve_opt(group, axis)?;
            group.power_down(axis)?;
        }
        Op::Save => group.save_settings()?,
        Op::Move { axis, distance } => {
            let id = resolve(group, axis)?;
            let position = group.move_relative(id, distance)?;
            let mut report = PositionReport::default();
            report.push(axis, id, position);
            print_report(&report, json)?;
        }
        Op::Compose { distances } => {
            let positions = group.composite_move_relative(&distances)?;
            print_report(&report_for(group, &positions), json)?;
        }
        Op::Position { axis } => {
            let report = match resolve_opt(group, axis)? {
                Some(id) => {
                    let position = group.position(id)?;
                    let mut report = PositionReport::default();
                    report.push(axis.unwrap_or('?'), id, position);
                    report
                }
                None => {
                    let positions = group.positions()?;
                    report_for(group, &positions)
                }
            };
            print_report(&report, json)?;
        }
        Op::Home { axis } => {
            let id = resolve(group, axis)?;
            group.home(id)?;
            info!("Home procedure for axis {} finished", axis);
        }
    }
    Ok(())
}

fn report_for(group: &AxisGroup<Bridge>, positions: &[f64]) -> PositionReport {
    let mut report = PositionReport::default();
    for (spec, &position) in group.axes().iter().zip(positions) {
        report.push(spec.label, spec.id, position);
    }
    report
}

fn print_report(report: &PositionReport, json: bool) -> Result<(), serde_json::Error> {
    if json {
        println!("{}", serde_json::to_string(report)?);
    } else {
        println!("{}", report.to_text());
    }
    Ok(())
}
