//! Aura SMBus register protocol.
//!
//! Aura controllers expose a 16-bit register space behind an SMBus command
//! window: the register address is selected by writing it (byte-swapped) as a
//! word to the pointer command, then data moves through the data commands.
//! Each logical register access is therefore a multi-step sequence and runs
//! inside a single bus transaction.

use crate::bus::I2cBus;
use crate::color::LedColor;
use crate::error::{Error, Result};
use std::io;
use std::str::FromStr;

/// SMBus command selecting the 16-bit register address.
pub(crate) const AURA_CMD_REG_PTR: u8 = 0x00;

/// SMBus command writing one byte at the selected register.
pub(crate) const AURA_CMD_WRITE: u8 = 0x01;

/// SMBus command block-writing at the selected register.
pub(crate) const AURA_CMD_BLOCK_WRITE: u8 = 0x03;

/// SMBus command reading one byte at the selected register.
pub(crate) const AURA_CMD_READ: u8 = 0x81;

/// Device name table; ASCII, up to [`DEVICE_NAME_LEN`] bytes.
pub(crate) const AURA_REG_DEVICE_NAME: u16 = 0x1000;

/// Configuration table base.
pub(crate) const AURA_REG_CONFIG_TABLE: u16 = 0x1C00;

/// Offset of the LED count byte within the configuration table.
pub(crate) const AURA_CONFIG_LED_COUNT: u16 = 0x02;

/// Immediate-pixel color block, 3 bytes per LED.
pub(crate) const AURA_REG_COLORS_DIRECT: u16 = 0x8000;

/// Effect-baseline color block, 3 bytes per LED.
pub(crate) const AURA_REG_COLORS_EFFECT: u16 = 0x8010;

/// Direct-enable flag register.
pub(crate) const AURA_REG_DIRECT: u16 = 0x8020;

/// Animation mode register.
pub(crate) const AURA_REG_MODE: u16 = 0x8021;

/// Apply register; writing [`AURA_APPLY_VAL`] latches pending changes.
pub(crate) const AURA_REG_APPLY: u16 = 0x80A0;

pub(crate) const AURA_APPLY_VAL: u8 = 0x01;

/// Length of the device name table.
pub(crate) const DEVICE_NAME_LEN: usize = 16;

/// Device names of Aura-compatible controllers start with this prefix
/// ("AUMA..." on mainboards, "AUDA..." on DRAM modules).
const NAME_SIGNATURE: &str = "AU";

/// Encodes a register address for the pointer command. SMBus sends words
/// low byte first; the controller expects the high byte first.
pub(crate) fn encode_register(reg: u16) -> u16 {
    reg.swap_bytes()
}

/// Device-side animation modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum EffectMode {
    Off = 0,
    #[default]
    Static = 1,
    Breathing = 2,
    Flashing = 3,
    SpectrumCycle = 4,
    Rainbow = 5,
    SpectrumCycleBreathing = 6,
    ChaseFade = 7,
}

impl EffectMode {
    /// Converts a mode register byte to an EffectMode.
    pub fn from_byte(value: u8) -> Result<Self> {
        match value {
            0 => Ok(EffectMode::Off),
            1 => Ok(EffectMode::Static),
            2 => Ok(EffectMode::Breathing),
            3 => Ok(EffectMode::Flashing),
            4 => Ok(EffectMode::SpectrumCycle),
            5 => Ok(EffectMode::Rainbow),
            6 => Ok(EffectMode::SpectrumCycleBreathing),
            7 => Ok(EffectMode::ChaseFade),
            _ => Err(Error::InvalidMode(value)),
        }
    }
}

impl FromStr for EffectMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "off" => Ok(EffectMode::Off),
            "static" => Ok(EffectMode::Static),
            "breathing" => Ok(EffectMode::Breathing),
            "flashing" => Ok(EffectMode::Flashing),
            "spectrum" => Ok(EffectMode::SpectrumCycle),
            "rainbow" => Ok(EffectMode::Rainbow),
            "spectrum-breathing" => Ok(EffectMode::SpectrumCycleBreathing),
            "chase" => Ok(EffectMode::ChaseFade),
            _ => Err(Error::InvalidModeName(s.to_string())),
        }
    }
}

impl std::fmt::Display for EffectMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EffectMode::Off => write!(f, "off"),
            EffectMode::Static => write!(f, "static"),
            EffectMode::Breathing => write!(f, "breathing"),
            EffectMode::Flashing => write!(f, "flashing"),
            EffectMode::SpectrumCycle => write!(f, "spectrum"),
            EffectMode::Rainbow => write!(f, "rainbow"),
            EffectMode::SpectrumCycleBreathing => write!(f, "spectrum-breathing"),
            EffectMode::ChaseFade => write!(f, "chase"),
        }
    }
}

/// Capability interface over one hardware family's register map.
///
/// The probe selects the implementing family at identification time; the
/// controller proxy and the dispatcher stay family-agnostic.
pub trait AuraChip: Send + Sync {
    /// Hardware family name.
    fn family(&self) -> &'static str;

    /// Reads the signature registers at `addr`; returns the device name on a
    /// match, `None` if whatever answered is not this family.
    fn identify(&self, bus: &I2cBus, addr: u8) -> io::Result<Option<String>>;

    /// Reads the addressable LED count.
    fn read_led_count(&self, bus: &I2cBus, addr: u8) -> io::Result<u8>;

    /// Reads the current animation mode byte.
    fn read_mode(&self, bus: &I2cBus, addr: u8) -> io::Result<u8>;

    /// Writes one immediate pixel and latches it so it is visible on return.
    fn write_pixel(&self, bus: &I2cBus, addr: u8, index: u32, color: LedColor) -> io::Result<()>;

    /// Writes one effect-baseline color; starts no animation.
    fn write_effect_baseline(
        &self,
        bus: &I2cBus,
        addr: u8,
        index: u32,
        color: LedColor,
    ) -> io::Result<()>;

    /// Writes the direct-enable flag.
    fn write_direct_flag(&self, bus: &I2cBus, addr: u8, direct: bool) -> io::Result<()>;

    /// Writes the animation mode register and latches it.
    fn write_mode(&self, bus: &I2cBus, addr: u8, mode: EffectMode) -> io::Result<()>;
}

/// All known hardware families, in probe order.
pub(crate) fn chip_families() -> Vec<Box<dyn AuraChip>> {
    vec![Box::new(MainboardAura)]
}

/// The classic mainboard Aura SMBus register map.
pub struct MainboardAura;

impl MainboardAura {
    fn register_read(&self, bus: &I2cBus, addr: u8, reg: u16) -> io::Result<u8> {
        bus.transaction(|t| {
            t.write_word_data(addr, AURA_CMD_REG_PTR, encode_register(reg))?;
            t.read_byte_data(addr, AURA_CMD_READ)
        })
    }

    fn register_write(&self, bus: &I2cBus, addr: u8, reg: u16, value: u8) -> io::Result<()> {
        bus.transaction(|t| {
            t.write_word_data(addr, AURA_CMD_REG_PTR, encode_register(reg))?;
            t.write_byte_data(addr, AURA_CMD_WRITE, value)
        })
    }

    fn register_write_block(
        &self,
        bus: &I2cBus,
        addr: u8,
        reg: u16,
        data: &[u8],
    ) -> io::Result<()> {
        bus.transaction(|t| {
            t.write_word_data(addr, AURA_CMD_REG_PTR, encode_register(reg))?;
            t.write_block_data(addr, AURA_CMD_BLOCK_WRITE, data)
        })
    }
}

impl AuraChip for MainboardAura {
    fn family(&self) -> &'static str {
        "aura-mainboard"
    }

    fn identify(&self, bus: &I2cBus, addr: u8) -> io::Result<Option<String>> {
        let mut name = String::with_capacity(DEVICE_NAME_LEN);
        for i in 0..DEVICE_NAME_LEN {
            let byte = self.register_read(bus, addr, AURA_REG_DEVICE_NAME + i as u16)?;
            if byte == 0 {
                break;
            }
            if !byte.is_ascii_graphic() {
                return Ok(None);
            }
            name.push(char::from(byte));
        }
        if name.starts_with(NAME_SIGNATURE) {
            Ok(Some(name))
        } else {
            Ok(None)
        }
    }

    fn read_led_count(&self, bus: &I2cBus, addr: u8) -> io::Result<u8> {
        self.register_read(bus, addr, AURA_REG_CONFIG_TABLE + AURA_CONFIG_LED_COUNT)
    }

    fn read_mode(&self, bus: &I2cBus, addr: u8) -> io::Result<u8> {
        self.register_read(bus, addr, AURA_REG_MODE)
    }

    fn write_pixel(&self, bus: &I2cBus, addr: u8, index: u32, color: LedColor) -> io::Result<()> {
        let reg = AURA_REG_COLORS_DIRECT + (index as u16) * 3;
        // Mainboard controllers store channels in R, B, G order.
        self.register_write_block(bus, addr, reg, &[color.r, color.b, color.g])?;
        self.register_write(bus, addr, AURA_REG_APPLY, AURA_APPLY_VAL)
    }

    fn write_effect_baseline(
        &self,
        bus: &I2cBus,
        addr: u8,
        index: u32,
        color: LedColor,
    ) -> io::Result<()> {
        let reg = AURA_REG_COLORS_EFFECT + (index as u16) * 3;
        self.register_write_block(bus, addr, reg, &[color.r, color.b, color.g])
    }

    fn write_direct_flag(&self, bus: &I2cBus, addr: u8, direct: bool) -> io::Result<()> {
        self.register_write(bus, addr, AURA_REG_DIRECT, u8::from(direct))
    }

    fn write_mode(&self, bus: &I2cBus, addr: u8, mode: EffectMode) -> io::Result<()> {
        self.register_write(bus, addr, AURA_REG_MODE, mode as u8)?;
        self.register_write(bus, addr, AURA_REG_APPLY, AURA_APPLY_VAL)
    }
}
