//! Error types for the Open Aura hardware library.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when interacting with the hardware.
///
/// A negative probe (no device at a candidate address) is not an error and
/// never appears here; discovery simply skips the address.
#[derive(Error, Debug)]
pub enum Error {
    /// A bus could not be opened during enumeration. The bus is omitted
    /// from the result; this is a diagnostic, never fatal.
    #[error("could not open bus {path}: {source}")]
    BusOpen { path: String, source: io::Error },

    /// A signature read at a candidate address kept failing after the retry
    /// budget. Treated as a negative probe for discovery purposes.
    #[error("probe of {address:#04x} on {bus} gave up after retries: {source}")]
    ProbeTimeout {
        bus: String,
        address: u8,
        source: io::Error,
    },

    /// A color write exhausted its retry budget. Dispatch to other LEDs and
    /// controllers continues.
    #[error("write to LED {index} on {controller} failed: {source}")]
    WriteFailure {
        controller: String,
        index: u32,
        source: io::Error,
    },

    /// The animation-mode register write exhausted its retry budget.
    #[error("mode write on {controller} failed: {source}")]
    ModeWriteFailure { controller: String, source: io::Error },

    /// Every register access to the device failed; the controller is removed
    /// from the active set and a fresh probe is required to restore it.
    #[error("device {controller} stopped responding")]
    DeviceUnreachable { controller: String },

    /// LED or device index beyond the resolved bounds. Fails the single call
    /// only.
    #[error("index {index} out of range (limit {limit})")]
    IndexOutOfRange { index: u32, limit: u32 },

    /// Unknown effect mode byte read from a device.
    #[error("invalid effect mode byte: {0:#04x}")]
    InvalidMode(u8),

    /// Unrecognized effect name.
    #[error("invalid effect name: {0}")]
    InvalidModeName(String),

    /// Bus I/O error outside the taxonomy above.
    #[error("bus I/O error: {0}")]
    Io(#[from] io::Error),
}
