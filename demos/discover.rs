//! Discovery walk-through against a simulated PMBus device.
//!
//! Run with `RUST_LOG=debug` to watch the transport strategy and probe
//! decisions as they happen.

use std::collections::HashMap;

use pmbus_probe::bus::{Functionality, SmbusBus};
use pmbus_probe::command::{self, TransferKind};
use pmbus_probe::device::{PmbusDevice, Support};
use pmbus_probe::format::Direction;

#[derive(Debug)]
pub struct SimError;

/// A small fixed-function PSU: a few LINEAR11 telemetry words, one
/// DIRECT-format temperature, VOUT telemetry on a -13 exponent, and the
/// usual inventory strings.
struct SimPsu {
    query: HashMap<u8, u8>,
    words: HashMap<u8, u16>,
}

impl SimPsu {
    fn new() -> Self {
        let mut query = HashMap::new();
        let readable = 0x80 | 0x20; // supported + read, LINEAR
        for code in [
            command::QUERY,
            command::CAPABILITY,
            command::PMBUS_REVISION,
            command::VOUT_MODE,
            command::STATUS_WORD,
            command::MFR_ID,
            command::MFR_MODEL,
            0x88, // read_vin
            0x8b, // read_vout
        ] {
            query.insert(code as u8, readable);
        }
        // read_temperature_1 answers in DIRECT format.
        query.insert(0x8d, 0x80 | 0x20 | (3 << 2));

        let mut words = HashMap::new();
        words.insert(0x88u8, 0xd980); // 384 * 2^-5 = 12.0 V
        words.insert(0x8b, 0x699a); // 27034 * 2^-13 = 3.3 V
        words.insert(0x8d, 420); // m = 10: 42.0 degrees
        words.insert(command::STATUS_WORD as u8, 0x0000);

        Self { query, words }
    }

    fn block(&self, command: u8) -> Option<&'static [u8]> {
        match command {
            0x99 => Some(b"ACME POWER"),
            0x9a => Some(b"SIM-1200"),
            _ => None,
        }
    }
}

impl SmbusBus for SimPsu {
    type Error = SimError;

    fn functionality(&self) -> Functionality {
        Functionality::new()
            .with_quick(true)
            .with_byte_data(true)
            .with_word_data(true)
            .with_proc_call(true)
            .with_read_block(true)
            .with_block_proc_call(true)
    }

    fn quick_write(&mut self) -> Result<(), SimError> {
        Ok(())
    }

    fn send_byte(&mut self, _value: u8) -> Result<(), SimError> {
        Ok(())
    }

    fn read_byte_data(&mut self, command: u8) -> Result<u8, SimError> {
        match command as u16 {
            command::CAPABILITY => Ok(0x30), // 400 kHz, no PEC
            command::PMBUS_REVISION => Ok(0x11),
            command::VOUT_MODE => Ok(0x13), // linear, exponent -13
            _ => self
                .block(command)
                .map(|data| data.len() as u8)
                .ok_or(SimError),
        }
    }

    fn write_byte_data(&mut self, _command: u8, _value: u8) -> Result<(), SimError> {
        Ok(())
    }

    fn read_word_data(&mut self, command: u8) -> Result<u16, SimError> {
        self.words.get(&command).copied().ok_or(SimError)
    }

    fn write_word_data(&mut self, command: u8, value: u16) -> Result<(), SimError> {
        self.words.insert(command, value);
        Ok(())
    }

    fn read_block_data(&mut self, command: u8) -> Result<Vec<u8>, SimError> {
        self.block(command).map(<[u8]>::to_vec).ok_or(SimError)
    }

    fn write_block_data(&mut self, _command: u8, _data: &[u8]) -> Result<(), SimError> {
        Ok(())
    }

    fn proc_call(&mut self, cmd: u8, value: u16) -> Result<u16, SimError> {
        if cmd != command::QUERY as u8 {
            return Err(SimError);
        }
        let target = (value >> 8) as u8;
        let response = self.query.get(&target).copied().unwrap_or(0);
        Ok(((response as u16) << 8) | (value & 0x00ff))
    }

    fn block_proc_call(&mut self, cmd: u8, write: &[u8]) -> Result<Vec<u8>, SimError> {
        // Only the temperature command carries coefficients: m = 10, b = 0, R = 0.
        if cmd == command::COEFFICIENTS as u8 && write == [2, 0x8d, Direction::Read as u8] {
            return Ok(vec![10, 0, 0, 0, 0]);
        }
        Err(SimError)
    }

    fn i2c_transfer(&mut self, _write: &[u8], _read: &mut [u8]) -> Result<(), SimError> {
        Err(SimError)
    }

    fn i2c_write(&mut self, _write: &[u8]) -> Result<(), SimError> {
        Err(SimError)
    }

    fn set_pec(&mut self, _enable: bool) -> Result<(), SimError> {
        Ok(())
    }
}

fn main() {
    env_logger::init();

    let mut dev = PmbusDevice::new(SimPsu::new(), 0x5a);
    dev.scan(true).expect("device did not acknowledge");

    if let Some(revision) = dev.revision() {
        println!("PMBus revision {:#04x}", revision);
    }
    for code in [command::MFR_ID, command::MFR_MODEL] {
        if let Some(text) = dev.read_text(code) {
            println!("{}: {text}", command::lookup(code).unwrap().name);
        }
    }

    dev.discover();
    for descriptor in command::all() {
        if dev.check_support(descriptor.code) != Support::Supported {
            continue;
        }
        let word = match descriptor.transfer {
            TransferKind::ReadWord | TransferKind::Word => {
                match dev.read_word(descriptor.code) {
                    Ok(word) => word,
                    Err(_) => continue,
                }
            }
            _ => continue,
        };
        match dev.decode_word(descriptor.code, word) {
            Some(value) => println!(
                "{:24} {value:10.3} {}",
                descriptor.name, descriptor.unit
            ),
            None => println!("{:24} {word:#06x}", descriptor.name),
        }
    }
}
