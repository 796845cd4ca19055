//! Stateful proxy for one discovered Aura controller.

use super::protocol::{AuraChip, EffectMode};
use crate::bus::{BusHandle, I2cBus};
use crate::color::LedColor;
use crate::error::{Error, Result};
use std::io;
use tracing::debug;

/// One Aura controller bound to a (bus, address) pair.
///
/// Constructed only by a successful probe; `name` and `led_count` are fixed
/// at identification time and never change afterwards.
pub struct AuraController {
    bus: BusHandle,
    address: u8,
    name: String,
    led_count: u32,
    mode: EffectMode,
    direct: bool,
    flag_synced: bool,
    chip: Box<dyn AuraChip>,
}

impl AuraController {
    pub(crate) fn new(
        bus: BusHandle,
        address: u8,
        name: String,
        led_count: u32,
        mode: EffectMode,
        chip: Box<dyn AuraChip>,
    ) -> Self {
        Self {
            bus,
            address,
            name,
            led_count,
            mode,
            direct: false,
            flag_synced: false,
            chip,
        }
    }

    /// Device name read at identification time.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Addressable LED count resolved at identification time.
    pub fn led_count(&self) -> u32 {
        self.led_count
    }

    /// SMBus address of the controller.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// The bus this controller lives on.
    pub fn bus(&self) -> &I2cBus {
        &self.bus
    }

    /// Current animation mode (meaningful only while `direct` is off).
    pub fn mode(&self) -> EffectMode {
        self.mode
    }

    /// Whether writes go through the immediate-pixel path.
    pub fn is_direct(&self) -> bool {
        self.direct
    }

    /// Switches between the direct and effect write paths.
    ///
    /// Pure state change; the device's direct-enable flag is pushed by the
    /// next register write rather than here.
    pub fn set_direct(&mut self, direct: bool) {
        if self.direct != direct {
            self.direct = direct;
            self.flag_synced = false;
        }
    }

    fn sync_direct_flag(&mut self) -> io::Result<()> {
        if !self.flag_synced {
            self.chip
                .write_direct_flag(&self.bus, self.address, self.direct)?;
            self.flag_synced = true;
        }
        Ok(())
    }

    fn check_index(&self, index: u32) -> Result<()> {
        if index >= self.led_count {
            return Err(Error::IndexOutOfRange {
                index,
                limit: self.led_count,
            });
        }
        Ok(())
    }

    /// Writes `color` to the immediate-pixel registers for `index`.
    ///
    /// The pixel is visible on return; a transient bus fault is retried and
    /// only surfaces as [`Error::WriteFailure`] once the budget is spent.
    pub fn set_led_color_direct(&mut self, index: u32, color: LedColor) -> Result<()> {
        self.check_index(index)?;
        self.sync_direct_flag()
            .and_then(|()| self.chip.write_pixel(&self.bus, self.address, index, color))
            .map_err(|source| Error::WriteFailure {
                controller: self.name.clone(),
                index,
                source,
            })?;
        debug!("{}: LED {} <- {} (direct)", self.name, index, color);
        Ok(())
    }

    /// Writes `color` to the effect-baseline registers for `index`; starts
    /// no animation by itself.
    pub fn set_led_color_effect(&mut self, index: u32, color: LedColor) -> Result<()> {
        self.check_index(index)?;
        self.sync_direct_flag()
            .and_then(|()| {
                self.chip
                    .write_effect_baseline(&self.bus, self.address, index, color)
            })
            .map_err(|source| Error::WriteFailure {
                controller: self.name.clone(),
                index,
                source,
            })?;
        debug!("{}: LED {} <- {} (effect baseline)", self.name, index, color);
        Ok(())
    }

    /// Writes the animation-mode register.
    ///
    /// Only valid on the effect path; the dispatcher calls this exactly once
    /// per request, after every baseline color has been written.
    pub fn set_mode(&mut self, mode: EffectMode) -> Result<()> {
        debug_assert!(!self.direct, "mode written while direct is enabled");
        self.sync_direct_flag()
            .and_then(|()| self.chip.write_mode(&self.bus, self.address, mode))
            .map_err(|source| Error::ModeWriteFailure {
                controller: self.name.clone(),
                source,
            })?;
        self.mode = mode;
        debug!("{}: mode <- {}", self.name, mode);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aura::protocol::{AURA_REG_DIRECT, MainboardAura};
    use crate::bus::mock::MockTransport;

    fn controller_at(transport: &MockTransport, addr: u8, led_count: u32) -> AuraController {
        transport.add_aura_device(addr, "AUMA0-E6K5-0106", led_count as u8, 1);
        let bus = crate::bus::I2cBus::new(0, "mock", Box::new(transport.clone()));
        AuraController::new(
            bus,
            addr,
            "AUMA0-E6K5-0106".to_string(),
            led_count,
            EffectMode::Static,
            Box::new(MainboardAura),
        )
    }

    #[test]
    fn test_index_out_of_range() {
        let transport = MockTransport::new();
        let mut controller = controller_at(&transport, 0x4F, 5);
        let err = controller
            .set_led_color_direct(5, LedColor::new(1, 2, 3))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::IndexOutOfRange { index: 5, limit: 5 }
        ));
        assert!(transport.state().writes.is_empty());
    }

    #[test]
    fn test_direct_flag_written_once() {
        let transport = MockTransport::new();
        let mut controller = controller_at(&transport, 0x4F, 5);
        controller.set_direct(true);
        controller
            .set_led_color_direct(0, LedColor::new(1, 2, 3))
            .unwrap();
        controller
            .set_led_color_direct(1, LedColor::new(1, 2, 3))
            .unwrap();

        let state = transport.state();
        let flag_writes = state
            .writes
            .iter()
            .filter(|w| w.reg == AURA_REG_DIRECT)
            .count();
        assert_eq!(flag_writes, 1);
        assert_eq!(state.register(0x4F, AURA_REG_DIRECT), Some(1));
    }

    #[test]
    fn test_write_failure_after_retry_budget() {
        let transport = MockTransport::new();
        let mut controller = controller_at(&transport, 0x4F, 5);
        transport.set_nacks(0x4F, u32::MAX);

        let err = controller
            .set_led_color_direct(0, LedColor::new(255, 0, 0))
            .unwrap_err();
        assert!(matches!(err, Error::WriteFailure { index: 0, .. }));
    }
}
