//! Aura Lighting Control Tool
//!
//! CLI for listing Aura SMBus controllers and applying colors and effects.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use open_aura_hw::{
    discover_controllers, enumerate_buses, DeviceSet, EffectMode, LedColor, LightingRequest,
    Target,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "auractl")]
#[command(about = "Lighting control for Aura SMBus devices")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every Aura device with its number
    List,
    /// Apply colors and/or an effect
    Set {
        /// Device number to target (applies to all devices if omitted)
        #[arg(short, long)]
        device: Option<u32>,

        /// Comma separated six digit hex colors, e.g. "FF0000,00AAFF".
        /// If there are more LEDs than colors, the last color fills the rest
        #[arg(short, long)]
        color: Option<String>,

        /// Effect: off, static, breathing, flashing, spectrum, rainbow,
        /// spectrum-breathing, chase. Omit to push colors directly
        #[arg(short, long)]
        effect: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let buses = enumerate_buses();
    let mut devices = DeviceSet::new(discover_controllers(&buses));

    match cli.command {
        Commands::List => handle_list(&devices),
        Commands::Set {
            device,
            color,
            effect,
        } => handle_set(&mut devices, device, color.as_deref(), effect.as_deref()),
    }
}

fn handle_list(devices: &DeviceSet) -> Result<()> {
    if devices.is_empty() {
        println!("No Aura devices found");
        return Ok(());
    }
    for (index, controller) in devices.controllers().iter().enumerate() {
        println!(
            "{}: {} ({} LEDs, {:#04x} on {})",
            index,
            controller.name(),
            controller.led_count(),
            controller.address(),
            controller.bus().name()
        );
    }
    Ok(())
}

fn handle_set(
    devices: &mut DeviceSet,
    device: Option<u32>,
    color: Option<&str>,
    effect: Option<&str>,
) -> Result<()> {
    if color.is_none() && effect.is_none() {
        bail!("nothing to do: pass --color and/or --effect");
    }
    if devices.is_empty() {
        bail!("no Aura devices found");
    }

    let colors = color.map(parse_colors).transpose()?.unwrap_or_default();
    let mode = effect
        .map(|name| name.parse::<EffectMode>())
        .transpose()?;
    let target = match device {
        Some(index) => Target::Device(index),
        None => Target::All,
    };

    let request = LightingRequest {
        target,
        colors,
        mode,
    };
    let targeted = match target {
        Target::All => devices.len(),
        Target::Device(_) => 1,
    };
    let failures = devices.apply(&request)?;

    for failure in &failures {
        eprintln!("warning: {failure}");
    }
    let unreachable = failures
        .iter()
        .filter(|e| matches!(e, open_aura_hw::Error::DeviceUnreachable { .. }))
        .count();
    if unreachable == targeted {
        bail!("no device accepted the request");
    }
    println!("Applied to {} device(s)", targeted - unreachable);
    Ok(())
}

/// Parses a comma separated list of six digit hex colors.
fn parse_colors(list: &str) -> Result<Vec<LedColor>> {
    let mut colors = Vec::new();
    for part in list.split(',') {
        let part = part.trim();
        if part.len() != 6 || !part.chars().all(|c| c.is_ascii_hexdigit()) {
            bail!("invalid color {part:?}: expected six hex digits");
        }
        let r = u8::from_str_radix(&part[0..2], 16)?;
        let g = u8::from_str_radix(&part[2..4], 16)?;
        let b = u8::from_str_radix(&part[4..6], 16)?;
        colors.push(LedColor::new(r, g, b));
    }
    Ok(colors)
}
