//! Linux SMBus transport over `/dev/i2c-*` character devices.

use super::{BusHandle, I2cBus, SmbusTransport};
use crate::error::Error;
use i2c_linux::I2c;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Transport backed by one open I2C character device.
pub struct LinuxTransport {
    dev: I2c<File>,
}

impl LinuxTransport {
    /// Opens the I2C character device at `path`.
    pub fn open(path: &Path) -> io::Result<Self> {
        Ok(Self {
            dev: I2c::from_path(path)?,
        })
    }

    fn select(&mut self, addr: u8) -> io::Result<()> {
        self.dev.smbus_set_slave_address(u16::from(addr), false)
    }
}

impl SmbusTransport for LinuxTransport {
    fn probe(&mut self, addr: u8) -> io::Result<bool> {
        self.select(addr)?;
        // An absent device NACKs the receive byte.
        Ok(self.dev.smbus_read_byte().is_ok())
    }

    fn read_byte_data(&mut self, addr: u8, command: u8) -> io::Result<u8> {
        self.select(addr)?;
        self.dev.smbus_read_byte_data(command)
    }

    fn write_byte_data(&mut self, addr: u8, command: u8, value: u8) -> io::Result<()> {
        self.select(addr)?;
        self.dev.smbus_write_byte_data(command, value)
    }

    fn read_word_data(&mut self, addr: u8, command: u8) -> io::Result<u16> {
        self.select(addr)?;
        self.dev.smbus_read_word_data(command)
    }

    fn write_word_data(&mut self, addr: u8, command: u8, value: u16) -> io::Result<()> {
        self.select(addr)?;
        self.dev.smbus_write_word_data(command, value)
    }

    fn write_block_data(&mut self, addr: u8, command: u8, data: &[u8]) -> io::Result<()> {
        self.select(addr)?;
        self.dev.smbus_write_block_data(command, data)
    }
}

/// Enumerates the host's I2C buses, ascending by adapter index.
///
/// A bus that cannot be opened is logged and omitted; the remaining buses are
/// still returned, so one inaccessible adapter never fails enumeration.
pub fn enumerate() -> Vec<BusHandle> {
    let mut nodes = bus_nodes();
    nodes.sort_by_key(|&(index, _)| index);

    let mut buses = Vec::new();
    for (index, path) in nodes {
        match LinuxTransport::open(&path) {
            Ok(transport) => {
                let name =
                    adapter_name(index).unwrap_or_else(|| path.display().to_string());
                debug!("opened {} ({})", path.display(), name);
                buses.push(I2cBus::new(index, name, Box::new(transport)));
            }
            Err(source) => {
                let err = Error::BusOpen {
                    path: path.display().to_string(),
                    source,
                };
                warn!("skipping bus: {err}");
            }
        }
    }
    buses
}

/// Lists `/dev/i2c-N` nodes with their adapter index.
fn bus_nodes() -> Vec<(u32, PathBuf)> {
    let Ok(entries) = std::fs::read_dir("/dev") else {
        return Vec::new();
    };

    entries
        .flatten()
        .filter_map(|entry| {
            let name = entry.file_name();
            let name = name.to_str()?;
            let index = name.strip_prefix("i2c-")?.parse::<u32>().ok()?;
            Some((index, entry.path()))
        })
        .collect()
}

fn adapter_name(index: u32) -> Option<String> {
    std::fs::read_to_string(format!("/sys/class/i2c-adapter/i2c-{index}/name"))
        .ok()
        .map(|s| s.trim().to_string())
}
