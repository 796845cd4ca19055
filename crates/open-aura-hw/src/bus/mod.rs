//! SMBus access module.
//!
//! Provides the transport trait, the per-bus handle, and transaction
//! serialization with bounded retries.

#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(test)]
pub(crate) mod mock;

use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

/// Attempts per transaction before the failure is surfaced.
pub const MAX_ATTEMPTS: u32 = 4;

/// Delay before the first retry; doubles on each subsequent retry.
pub const BACKOFF_BASE: Duration = Duration::from_millis(1);

/// Byte/word/block SMBus primitives against one physical bus.
///
/// Transient faults (NACK, arbitration loss, timeout) surface as plain
/// `io::Error`s; the retry policy lives in [`I2cBus`], not here.
pub trait SmbusTransport: Send {
    /// Quick-write presence check at `addr`. `Ok(false)` means nothing
    /// answered, which is the expected outcome for most candidate addresses.
    fn probe(&mut self, addr: u8) -> io::Result<bool>;

    /// Reads one byte from the `command` register of the device at `addr`.
    fn read_byte_data(&mut self, addr: u8, command: u8) -> io::Result<u8>;

    /// Writes one byte to the `command` register of the device at `addr`.
    fn write_byte_data(&mut self, addr: u8, command: u8, value: u8) -> io::Result<()>;

    /// Reads one word from the `command` register of the device at `addr`.
    fn read_word_data(&mut self, addr: u8, command: u8) -> io::Result<u16>;

    /// Writes one word to the `command` register of the device at `addr`.
    fn write_word_data(&mut self, addr: u8, command: u8, value: u16) -> io::Result<()>;

    /// Writes an SMBus block (up to 32 bytes) to the `command` register.
    fn write_block_data(&mut self, addr: u8, command: u8, data: &[u8]) -> io::Result<()>;
}

/// Shared handle to one physical bus.
///
/// Enumeration produces these once at startup; controllers keep clones for
/// the process lifetime.
pub type BusHandle = Arc<I2cBus>;

/// One physical SMBus/I2C bus.
///
/// The transport sits behind a mutex so that all transactions on the bus are
/// serialized; interleaved multi-step sequences from different threads would
/// corrupt the register pointer protocol.
pub struct I2cBus {
    index: u32,
    name: String,
    transport: Mutex<Box<dyn SmbusTransport>>,
}

impl I2cBus {
    /// Wraps a transport into a shareable bus handle.
    pub fn new(index: u32, name: impl Into<String>, transport: Box<dyn SmbusTransport>) -> BusHandle {
        Arc::new(Self {
            index,
            name: name.into(),
            transport: Mutex::new(transport),
        })
    }

    /// Host bus index (ascending across an enumeration result).
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Human-readable adapter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs one logical transaction against the locked transport.
    ///
    /// The lock is held across the whole closure because one logical register
    /// access is a multi-step SMBus sequence that must not interleave with
    /// other traffic on the bus. The closure is re-run from the start on a
    /// transient fault, up to [`MAX_ATTEMPTS`] times with doubling backoff.
    pub fn transaction<T>(
        &self,
        mut f: impl FnMut(&mut dyn SmbusTransport) -> io::Result<T>,
    ) -> io::Result<T> {
        let mut transport = self.transport.lock().unwrap();
        let mut delay = BACKOFF_BASE;
        let mut attempt = 1;
        loop {
            match f(transport.as_mut()) {
                Ok(value) => return Ok(value),
                Err(e) if attempt < MAX_ATTEMPTS => {
                    debug!(
                        "transaction on {} failed (attempt {}/{}): {}",
                        self.name, attempt, MAX_ATTEMPTS, e
                    );
                    std::thread::sleep(delay);
                    delay *= 2;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Single-attempt presence check; an absent device is the common case
    /// and not worth a retry budget.
    pub fn probe_address(&self, addr: u8) -> io::Result<bool> {
        self.transport.lock().unwrap().probe(addr)
    }
}

impl std::fmt::Display for I2cBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "i2c-{} ({})", self.index, self.name)
    }
}
