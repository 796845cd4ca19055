//! Aura controller module.
//!
//! The register protocol for Aura-compatible devices and the stateful
//! controller proxy bound to one (bus, address) pair.

mod device;
pub(crate) mod protocol;

pub use device::AuraController;
pub use protocol::{AuraChip, EffectMode, MainboardAura};

pub(crate) use protocol::chip_families;
