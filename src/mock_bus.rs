//! We use this mocking module in unit tests to stand in for an SMBus adapter
//! with a scripted PMBus device behind it.
//!
//! The mock keeps a full transaction log so tests can assert not just on what
//! an operation returned but on the exact wire strategy it used. Scripted
//! register contents are plain maps; the process-call and raw-exchange paths
//! emulate the PMBus wire layouts byte for byte.

use std::collections::HashMap;

use crate::{
    bus::{Functionality, SmbusBus},
    command,
    format::Direction,
};

/// Every bus transaction the device layer issued, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transaction {
    Quick,
    SendByte(u8),
    ReadByte(u8),
    WriteByte(u8, u8),
    ReadWord(u8),
    WriteWord(u8, u16),
    ReadBlock(u8),
    WriteBlock(u8, Vec<u8>),
    /// Word process call: command, request word.
    ProcCall(u8, u16),
    /// Block process call: command, request payload.
    BlockProcCall(u8, Vec<u8>),
    /// Raw exchange: written message, requested read length.
    I2c(Vec<u8>, usize),
    I2cWrite(Vec<u8>),
    Pec(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockBusError {
    /// The device did not acknowledge.
    Nak,
    /// Nothing is scripted for this command.
    NoReply,
}

/// A scripted device behind a fake adapter.
pub struct MockBus {
    funcs: Functionality,
    pub log: Vec<Transaction>,
    bytes: HashMap<u8, u8>,
    words: HashMap<u8, u16>,
    blocks: HashMap<u8, Vec<u8>>,
    /// QUERY response byte per target command. Unscripted targets answer 0,
    /// i.e. "not supported".
    query: HashMap<u8, u8>,
    /// COEFFICIENTS reply bytes, keyed by (target, direction).
    coefficients: HashMap<(u8, u8), [u8; 5]>,
    pub fail_quick: bool,
    pub fail_proc_call: bool,
    /// Answer QUERY without echoing the request count, violating the layout.
    pub bad_query_echo: bool,
}

impl MockBus {
    pub fn new(funcs: Functionality) -> Self {
        Self {
            funcs,
            log: Vec::new(),
            bytes: HashMap::new(),
            words: HashMap::new(),
            blocks: HashMap::new(),
            query: HashMap::new(),
            coefficients: HashMap::new(),
            fail_quick: false,
            fail_proc_call: false,
            bad_query_echo: false,
        }
    }

    pub fn set_byte(&mut self, command: u8, value: u8) {
        self.bytes.insert(command, value);
    }

    pub fn set_word(&mut self, command: u8, value: u16) {
        self.words.insert(command, value);
    }

    pub fn set_block(&mut self, command: u8, data: Vec<u8>) {
        self.blocks.insert(command, data);
    }

    pub fn set_query(&mut self, target: u8, response: u8) {
        self.query.insert(target, response);
    }

    pub fn set_coefficients(&mut self, target: u8, direction: Direction, m: i16, b: i16, r: i8) {
        let m = m.to_le_bytes();
        let b = b.to_le_bytes();
        self.coefficients
            .insert((target, direction as u8), [m[0], m[1], b[0], b[1], r as u8]);
    }

    fn query_reply(&self, request: u16) -> Result<u16, MockBusError> {
        if self.fail_proc_call {
            return Err(MockBusError::Nak);
        }
        let target = (request >> 8) as u8;
        let response = self.query.get(&target).copied().unwrap_or(0);
        let echo = if self.bad_query_echo { 0 } else { request & 0x00ff };
        Ok(((response as u16) << 8) | echo)
    }

    fn coefficients_reply(&self, request: &[u8]) -> Result<[u8; 5], MockBusError> {
        match request {
            [2, target, direction] => self
                .coefficients
                .get(&(*target, *direction))
                .copied()
                .ok_or(MockBusError::NoReply),
            _ => Err(MockBusError::NoReply),
        }
    }
}

impl SmbusBus for MockBus {
    type Error = MockBusError;

    fn functionality(&self) -> Functionality {
        self.funcs
    }

    fn quick_write(&mut self) -> Result<(), MockBusError> {
        self.log.push(Transaction::Quick);
        if self.fail_quick {
            return Err(MockBusError::Nak);
        }
        Ok(())
    }

    fn send_byte(&mut self, value: u8) -> Result<(), MockBusError> {
        self.log.push(Transaction::SendByte(value));
        Ok(())
    }

    fn read_byte_data(&mut self, command: u8) -> Result<u8, MockBusError> {
        self.log.push(Transaction::ReadByte(command));
        if let Some(&value) = self.bytes.get(&command) {
            return Ok(value);
        }
        // A byte read of a block command yields the first reply byte, which is
        // the length prefix.
        if let Some(block) = self.blocks.get(&command) {
            return Ok(block.len() as u8);
        }
        Err(MockBusError::NoReply)
    }

    fn write_byte_data(&mut self, command: u8, value: u8) -> Result<(), MockBusError> {
        self.log.push(Transaction::WriteByte(command, value));
        self.bytes.insert(command, value);
        Ok(())
    }

    fn read_word_data(&mut self, command: u8) -> Result<u16, MockBusError> {
        self.log.push(Transaction::ReadWord(command));
        self.words.get(&command).copied().ok_or(MockBusError::NoReply)
    }

    fn write_word_data(&mut self, command: u8, value: u16) -> Result<(), MockBusError> {
        self.log.push(Transaction::WriteWord(command, value));
        self.words.insert(command, value);
        Ok(())
    }

    fn read_block_data(&mut self, command: u8) -> Result<Vec<u8>, MockBusError> {
        self.log.push(Transaction::ReadBlock(command));
        self.blocks.get(&command).cloned().ok_or(MockBusError::NoReply)
    }

    fn write_block_data(&mut self, command: u8, data: &[u8]) -> Result<(), MockBusError> {
        self.log
            .push(Transaction::WriteBlock(command, data.to_vec()));
        self.blocks.insert(command, data.to_vec());
        Ok(())
    }

    fn proc_call(&mut self, cmd: u8, value: u16) -> Result<u16, MockBusError> {
        self.log.push(Transaction::ProcCall(cmd, value));
        if cmd == command::QUERY as u8 {
            return self.query_reply(value);
        }
        Err(MockBusError::NoReply)
    }

    fn block_proc_call(&mut self, cmd: u8, write: &[u8]) -> Result<Vec<u8>, MockBusError> {
        self.log
            .push(Transaction::BlockProcCall(cmd, write.to_vec()));
        if cmd == command::COEFFICIENTS as u8 {
            return Ok(self.coefficients_reply(write)?.to_vec());
        }
        Err(MockBusError::NoReply)
    }

    fn i2c_transfer(&mut self, write: &[u8], read: &mut [u8]) -> Result<(), MockBusError> {
        self.log
            .push(Transaction::I2c(write.to_vec(), read.len()));
        match write {
            // COEFFICIENTS fallback: [0x30, count, target, direction], six-byte
            // reply of length prefix plus the triple.
            [cmd, rest @ ..] if *cmd == command::COEFFICIENTS as u8 && rest.len() == 3 => {
                let reply = self.coefficients_reply(rest)?;
                if read.len() < 6 {
                    return Err(MockBusError::NoReply);
                }
                read[0] = 5;
                read[1..6].copy_from_slice(&reply);
                Ok(())
            }
            // Block read fallback: lone command byte, reply is length prefix
            // plus payload.
            [cmd] => {
                let block = self.blocks.get(cmd).ok_or(MockBusError::NoReply)?;
                read[0] = block.len() as u8;
                let len = block.len().min(read.len() - 1);
                read[1..1 + len].copy_from_slice(&block[..len]);
                Ok(())
            }
            _ => Err(MockBusError::NoReply),
        }
    }

    fn i2c_write(&mut self, write: &[u8]) -> Result<(), MockBusError> {
        self.log.push(Transaction::I2cWrite(write.to_vec()));
        Ok(())
    }

    fn set_pec(&mut self, enable: bool) -> Result<(), MockBusError> {
        self.log.push(Transaction::Pec(enable));
        Ok(())
    }
}
