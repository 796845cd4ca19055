//! Bus enumeration and controller discovery.

use crate::aura::{chip_families, AuraChip, AuraController, EffectMode};
use crate::bus::BusHandle;
use crate::error::Error;
use tracing::{debug, info, warn};

/// SMBus addresses used by Aura controllers.
pub const CANDIDATE_ADDRESSES: [u8; 6] = [0x40, 0x4E, 0x4F, 0x65, 0x66, 0x67];

/// Enumerates the host's SMBus/I2C buses.
///
/// Returns zero or more handles in ascending bus-index order, so device
/// indices reported to callers stay deterministic across runs on an
/// unchanged host. A bus that cannot be opened is logged and omitted.
pub fn enumerate_buses() -> Vec<BusHandle> {
    #[cfg(target_os = "linux")]
    {
        crate::bus::linux::enumerate()
    }
    #[cfg(not(target_os = "linux"))]
    {
        warn!("SMBus enumeration is only supported on Linux");
        Vec::new()
    }
}

/// Scans every bus for Aura-compatible controllers.
///
/// Runs to completion before returning: LED addressing depends on a fully
/// resolved LED count, so no controller is handed out mid-discovery. Negative
/// probes are skipped silently; a candidate that keeps NACKing is given up on
/// after the retry budget and treated as negative, never aborting the scan of
/// the remaining addresses and buses.
pub fn discover_controllers(buses: &[BusHandle]) -> Vec<AuraController> {
    let mut controllers = Vec::new();
    for bus in buses {
        for &address in &CANDIDATE_ADDRESSES {
            if let Some(controller) = probe_address(bus, address) {
                info!(
                    "found {} at {:#04x} on {} ({} LEDs)",
                    controller.name(),
                    address,
                    bus,
                    controller.led_count()
                );
                controllers.push(controller);
            }
        }
    }
    info!("discovery finished: {} controller(s)", controllers.len());
    controllers
}

fn probe_address(bus: &BusHandle, address: u8) -> Option<AuraController> {
    match bus.probe_address(address) {
        Ok(true) => {}
        Ok(false) => return None,
        Err(e) => {
            debug!("presence check at {:#04x} on {} failed: {}", address, bus, e);
            return None;
        }
    }

    for chip in chip_families() {
        match chip.identify(bus, address) {
            Ok(Some(name)) => return init_controller(bus, address, name, chip),
            Ok(None) => continue,
            Err(source) => {
                let err = Error::ProbeTimeout {
                    bus: bus.to_string(),
                    address,
                    source,
                };
                debug!("{err}");
                return None;
            }
        }
    }
    None
}

/// Capability read sequence after a signature match: LED count and current
/// mode, then the controller proxy is built.
fn init_controller(
    bus: &BusHandle,
    address: u8,
    name: String,
    chip: Box<dyn AuraChip>,
) -> Option<AuraController> {
    let led_count = match chip.read_led_count(bus, address) {
        Ok(0) => {
            warn!("{} at {:#04x} reports zero LEDs, skipping", name, address);
            return None;
        }
        Ok(count) => u32::from(count),
        Err(e) => {
            warn!("LED count read failed for {} at {:#04x}: {}", name, address, e);
            return None;
        }
    };

    let mode = chip
        .read_mode(bus, address)
        .ok()
        .and_then(|byte| EffectMode::from_byte(byte).ok())
        .unwrap_or_default();

    Some(AuraController::new(
        bus.clone(),
        address,
        name,
        led_count,
        mode,
        chip,
    ))
}
