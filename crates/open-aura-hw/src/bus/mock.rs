//! In-memory transport simulating the Aura register protocol.
//!
//! Backs the unit tests: devices answer the pointer/data command sequence
//! against a register map, every register write is recorded in order, and a
//! run of NACKs can be injected per address.

use super::SmbusTransport;
use crate::aura::protocol::{
    AURA_CMD_BLOCK_WRITE, AURA_CMD_READ, AURA_CMD_REG_PTR, AURA_CMD_WRITE, AURA_REG_CONFIG_TABLE,
    AURA_CONFIG_LED_COUNT, AURA_REG_DEVICE_NAME, AURA_REG_MODE,
};
use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

/// One recorded register write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RegisterWrite {
    pub addr: u8,
    pub reg: u16,
    pub value: u8,
}

#[derive(Default)]
pub(crate) struct MockDevice {
    regs: HashMap<u16, u8>,
    pointer: u16,
    nacks: u32,
}

#[derive(Default)]
pub(crate) struct MockState {
    devices: HashMap<u8, MockDevice>,
    /// Every register write across the bus, in issue order.
    pub writes: Vec<RegisterWrite>,
}

impl MockState {
    /// Current value of a device register, if it was ever written or seeded.
    pub fn register(&self, addr: u8, reg: u16) -> Option<u8> {
        self.devices.get(&addr)?.regs.get(&reg).copied()
    }

    /// Register writes issued to one device, in order.
    pub fn writes_to(&self, addr: u8) -> Vec<RegisterWrite> {
        self.writes.iter().filter(|w| w.addr == addr).copied().collect()
    }

    fn device(&mut self, addr: u8) -> io::Result<&mut MockDevice> {
        self.devices
            .get_mut(&addr)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no ack from device"))
    }
}

/// Cloneable handle; clones share the same simulated bus state.
#[derive(Clone, Default)]
pub(crate) struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an Aura-style device: name table, LED count in the config
    /// table, and the current mode register.
    pub fn add_aura_device(&self, addr: u8, name: &str, led_count: u8, mode: u8) {
        let mut device = MockDevice::default();
        for (i, byte) in name.bytes().enumerate() {
            device.regs.insert(AURA_REG_DEVICE_NAME + i as u16, byte);
        }
        device
            .regs
            .insert(AURA_REG_CONFIG_TABLE + AURA_CONFIG_LED_COUNT, led_count);
        device.regs.insert(AURA_REG_MODE, mode);
        self.state.lock().unwrap().devices.insert(addr, device);
    }

    /// Makes the next `count` data accesses to `addr` fail; `u32::MAX`
    /// means the device never answers again.
    pub fn set_nacks(&self, addr: u8, count: u32) {
        if let Some(device) = self.state.lock().unwrap().devices.get_mut(&addr) {
            device.nacks = count;
        }
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }
}

fn nack() -> io::Error {
    io::Error::new(io::ErrorKind::TimedOut, "nack")
}

fn check_nacks(device: &mut MockDevice) -> io::Result<()> {
    if device.nacks > 0 {
        if device.nacks != u32::MAX {
            device.nacks -= 1;
        }
        return Err(nack());
    }
    Ok(())
}

impl SmbusTransport for MockTransport {
    fn probe(&mut self, addr: u8) -> io::Result<bool> {
        Ok(self.state.lock().unwrap().devices.contains_key(&addr))
    }

    fn read_byte_data(&mut self, addr: u8, command: u8) -> io::Result<u8> {
        let mut state = self.state.lock().unwrap();
        let device = state.device(addr)?;
        check_nacks(device)?;
        match command {
            AURA_CMD_READ => Ok(device.regs.get(&device.pointer).copied().unwrap_or(0)),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "unsupported read command",
            )),
        }
    }

    fn write_byte_data(&mut self, addr: u8, command: u8, value: u8) -> io::Result<()> {
        let mut state = self.state.lock().unwrap();
        let device = state.device(addr)?;
        check_nacks(device)?;
        match command {
            AURA_CMD_WRITE => {
                let reg = device.pointer;
                device.regs.insert(reg, value);
                state.writes.push(RegisterWrite { addr, reg, value });
                Ok(())
            }
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "unsupported write command",
            )),
        }
    }

    fn read_word_data(&mut self, addr: u8, _command: u8) -> io::Result<u16> {
        let mut state = self.state.lock().unwrap();
        let device = state.device(addr)?;
        check_nacks(device)?;
        Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "unsupported word read",
        ))
    }

    fn write_word_data(&mut self, addr: u8, command: u8, value: u16) -> io::Result<()> {
        let mut state = self.state.lock().unwrap();
        let device = state.device(addr)?;
        check_nacks(device)?;
        match command {
            // The pointer word arrives byte-swapped; undo the encoding.
            AURA_CMD_REG_PTR => {
                device.pointer = value.swap_bytes();
                Ok(())
            }
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "unsupported word command",
            )),
        }
    }

    fn write_block_data(&mut self, addr: u8, command: u8, data: &[u8]) -> io::Result<()> {
        let mut state = self.state.lock().unwrap();
        let device = state.device(addr)?;
        check_nacks(device)?;
        match command {
            AURA_CMD_BLOCK_WRITE => {
                let base = device.pointer;
                for (i, &value) in data.iter().enumerate() {
                    let reg = base + i as u16;
                    device.regs.insert(reg, value);
                }
                for (i, &value) in data.iter().enumerate() {
                    state.writes.push(RegisterWrite {
                        addr,
                        reg: base + i as u16,
                        value,
                    });
                }
                Ok(())
            }
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "unsupported block command",
            )),
        }
    }
}
