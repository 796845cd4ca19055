//! Open Aura Hardware Library
//!
//! Discovers Aura-protocol RGB lighting controllers on the host's SMBus/I2C
//! buses and drives their addressable LEDs, both for direct pixel pushes and
//! for device-side animation effects.

pub mod aura;
pub mod bus;
pub mod color;
pub mod dispatch;
pub mod error;
pub mod probe;

pub use aura::{AuraChip, AuraController, EffectMode, MainboardAura};
pub use bus::{BusHandle, I2cBus, SmbusTransport};
pub use color::LedColor;
pub use dispatch::{DeviceSet, LightingRequest, Target};
pub use error::{Error, Result};
pub use probe::{discover_controllers, enumerate_buses, CANDIDATE_ADDRESSES};
